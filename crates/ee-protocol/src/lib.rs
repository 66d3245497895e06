//! # ee-protocol: EgyptEternal wire model
//!
//! Plates, acks and requests exchanged with the game server, plus the
//! command codes that frame them. Payloads are JSON with compact keys.
//!
//! ## Architecture
//!
//! ```text
//! symbols   (Symbol, JpType, SpinState, AckType, AwardType, UnlockType, ...)
//!     │
//!     v
//! model     (PlateData, GameInfoAck, SpinAck, BetSettingAck, SpinReq)
//!     │
//!     v
//! command   (u2g / g2u codes, Inbound, Outbound)
//! ```

pub mod command;
pub mod model;
pub mod symbols;

pub use command::*;
pub use model::*;
pub use symbols::*;
