//! ee-core: Shared foundation for the EgyptEternal slot client
//!
//! Error type and the `Credits` money type used by every other crate.

pub mod credits;
pub mod error;

pub use credits::*;
pub use error::*;
