//! # ee-slot: EgyptEternal slot client core
//!
//! Frame-driven state machines for one slot machine: reel spin physics,
//! the reel adapter that lands server boards, the effect/presentation
//! machine for collects, lines and free-game transitions, and the
//! game-flow machine that ties a spin request to its award show.
//!
//! Everything outside the core (audio, animation, widgets, the server
//! link) is reached through the collaborator traits in [`collaborators`]
//! and lent to the machines per call inside [`Services`].
//!
//! ## Architecture
//!
//! ```text
//! GameView (flow)
//!     │
//!     ├── GamePlay ── MainPlay / FreePlay
//!     ├── EffectView ── EffectCore + Sequence steps + JackpotBoard
//!     └── dyn ReelEngine
//!           │
//!           v
//!     ReelAdapter ── SymbolGenerator
//!           │
//!           v
//!     SpinnerEngine ── Track × 5
//! ```

pub mod collaborators;
pub mod config;
pub mod define;
pub mod effect;
pub mod flow;
pub mod gameplay;
pub mod jackpot;
pub mod mock;
pub mod reel;
pub mod sequencer;
pub mod spinner;
pub mod state;
pub mod timer;

pub use collaborators::*;
pub use config::*;
pub use effect::*;
pub use flow::*;
pub use gameplay::*;
pub use jackpot::*;
pub use reel::*;
pub use sequencer::*;
pub use spinner::*;
pub use state::*;
pub use timer::*;
