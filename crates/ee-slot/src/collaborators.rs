//! Collaborator interfaces
//!
//! Everything outside the slot core (audio, rendering, the bet bar, the
//! network session) is reached through the traits in this module. The host
//! bundles one implementation of each into [`Services`] and lends it to the
//! state machines for the duration of a call.
//!
//! ## Architecture
//!
//! ```text
//! GameView ──&mut Services──> EffectView / GamePlay / JackpotBoard
//!                 ├── AudioPlayer      sound keys, BGM
//!                 ├── Presenter        cues + tickets, game events
//!                 ├── WinRoller        run-score roll-up
//!                 ├── BigWinService    big-win declaration
//!                 ├── JackpotDisplay   tier labels and lock skins
//!                 ├── GameBar          bet, spin button, autoplay, currency
//!                 ├── GameService      outbound requests
//!                 └── rng              presentation randomness
//!
//! ReelAdapter ──ReelEngine──> owner
//! ReelAdapter ──EffectSink──> EffectView binding
//! ```

use ee_core::Credits;
use ee_protocol::{CommonSpinAck, Outbound, PlateData, Symbol};
use rand::RngCore;

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle of a playing one-shot sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u64);

pub trait AudioPlayer {
    fn play(&mut self, key: &str) -> SoundHandle;
    fn stop(&mut self, handle: SoundHandle);
    /// Replaces the running background music
    fn play_bgm(&mut self, key: &str);
    fn stop_bgm(&mut self);
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRESENTATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Completion token for a presentation cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CueTicket(pub u64);

impl CueTicket {
    /// Ticket that is already finished, returned for cues with no animation
    pub const DONE: CueTicket = CueTicket(0);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Cubic Bezier flight path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierPath {
    pub from: Point,
    pub control1: Point,
    pub control2: Point,
    pub to: Point,
}

impl BezierPath {
    pub fn point_at(&self, t: f32) -> Point {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            a * self.from.x + b * self.control1.x + c * self.control2.x + d * self.to.x,
            a * self.from.y + b * self.control1.y + c * self.control2.y + d * self.to.y,
        )
    }
}

/// Visual cue requested from the presenter
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// Opening movie; `skip_to` jumps into it (seconds)
    Intro { skip_to: Option<f32> },
    NearWin { column: usize, green_ball: bool },
    ScatterLand { column: usize, row: usize },
    SymbolFly {
        column: usize,
        row: usize,
        channel: usize,
        path: BezierPath,
    },
    /// Panel glow when a collect symbol lands
    PhaseHint { channel: usize },
    PhaseLevelUp { channel: usize, from: u32, to: u32 },
    CharacterLevelUp,
    /// Near-upgrade that fails at `level`
    PhaseFakeUpgrade { channel: usize, level: u32 },
    PhaseWin { channel: usize },
    CharacterWin,
    AddSpins { count: u32 },
    LineHighlight { index: usize, cells: Vec<(usize, usize)> },
    SymbolAward { column: usize, row: usize, symbol: Symbol },
    /// Free game banner; completes when dismissed
    FgDeclare { auto: bool },
    FgDeclareEnd,
    /// Free game result banner; completes when dismissed
    FgCompliment { total: Credits, auto: bool },
    FgComplimentEnd,
    Omen,
    JpLock { slot: usize, locked: bool },
    /// Board swap glow between main and free game
    BoardSwap,
    Background { fg: bool },
    ReelSkin { fg: bool },
}

/// Notifications for the host UI
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    EnterIdle,
    LeaveFeatureToMainIdle,
    LinesOfAKind { bet: Credits, win: Credits },
    LeaveFreeGame,
    /// Free game round labels
    FgRounds { spun: u32, total: u32 },
    /// Switch the reel caption between main and free game
    ReelText { fg: bool },
}

pub trait Presenter {
    /// Start a cue. Unknown cues return [`CueTicket::DONE`].
    fn play(&mut self, cue: Cue) -> CueTicket;
    fn is_done(&self, ticket: CueTicket) -> bool;
    fn stop(&mut self, ticket: CueTicket);
    fn emit(&mut self, event: GameEvent);
    /// The intro already played today on this device
    fn intro_seen_today(&self) -> bool;
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIDGETS
// ═══════════════════════════════════════════════════════════════════════════════

pub trait WinRoller {
    fn start(&mut self, from: Credits, to: Credits);
    fn is_done(&self) -> bool;
    /// Jump to the target value
    fn skip(&mut self);
    fn reset(&mut self);
}

pub trait BigWinService {
    fn declare(&mut self, bet: Credits, win: Credits);
    fn is_done(&self) -> bool;
}

pub trait JackpotDisplay {
    fn set_value(&mut self, slot: usize, value: Credits);
    fn set_rolling(&mut self, slot: usize, rolling: bool);
    /// Locked tiers hide the rolling label and show the static lock label
    fn set_locked(&mut self, slot: usize, locked: bool);
}

/// Spin button face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpinButton {
    Spin,
    Stop,
    StopDisable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoPlay {
    #[default]
    Off,
    Rounds(u32),
    Infinite,
}

impl AutoPlay {
    pub fn is_on(self) -> bool {
        !matches!(self, AutoPlay::Off | AutoPlay::Rounds(0))
    }
}

pub trait GameBar {
    fn bet(&self) -> Credits;
    fn set_bet(&mut self, bet: Credits);
    /// Ascending bet table
    fn bet_table(&self) -> Vec<Credits>;
    fn set_bet_table(&mut self, table: Vec<Credits>);
    /// Balance covers the current bet
    fn can_bet(&self) -> bool;
    fn set_bet_enabled(&mut self, enabled: bool);
    fn is_bet_enabled(&self) -> bool;
    fn spin_button(&self) -> SpinButton;
    fn set_spin_button(&mut self, face: SpinButton);
    /// Player picked the faster reel speed
    fn is_fast_mode(&self) -> bool;
    /// Debug outcome selector forwarded with spin requests
    fn cheat_type(&self) -> u32 {
        0
    }

    fn auto_play(&self) -> AutoPlay;
    fn set_auto_play(&mut self, auto: AutoPlay);
    /// Consume one autoplay round. False when autoplay is off.
    fn take_auto_round(&mut self) -> bool;
    fn stop_auto_play(&mut self) {
        self.set_auto_play(AutoPlay::Off);
    }

    fn debit(&mut self, amount: Credits);
    fn credit(&mut self, amount: Credits);
    fn win(&self) -> Credits;
    fn set_win(&mut self, win: Credits);
    fn reset_win(&mut self) {
        self.set_win(Credits::ZERO);
    }

    fn saved_bet(&self) -> Option<Credits>;
    fn save_bet(&mut self, bet: Credits);
    /// Feature payout summary shown on the bar
    fn feature_game_end(&mut self, bet: Credits, total: Credits);
    /// Bet bar shows the feature-game deviation skin
    fn set_deviation(&mut self, on: bool);
}

pub trait GameService {
    fn send(&mut self, request: Outbound);
    /// Hand the common-layer part of a spin ack back to the platform
    fn submit_common_ack(&mut self, _ack: &CommonSpinAck) {}
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICES
// ═══════════════════════════════════════════════════════════════════════════════

/// Collaborators lent to the state machines per call
pub struct Services {
    pub audio: Box<dyn AudioPlayer>,
    pub presenter: Box<dyn Presenter>,
    pub roller: Box<dyn WinRoller>,
    pub big_win: Box<dyn BigWinService>,
    pub jackpot: Box<dyn JackpotDisplay>,
    pub bar: Box<dyn GameBar>,
    pub service: Box<dyn GameService>,
    pub rng: Box<dyn RngCore>,
}

impl Services {
    /// Random float in `[0, 1)`
    pub fn random_unit(&mut self) -> f32 {
        use rand::Rng;
        self.rng.random::<f32>()
    }

    /// Roll a 0..=100 percentage
    pub fn roll_percent(&mut self, percent: u32) -> bool {
        use rand::Rng;
        percent > 0 && self.rng.random_range(0..100) < percent
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REEL SEAMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Reel presentation hooks driven by spinner events
pub trait EffectSink {
    fn start_near_win(&mut self, column: usize);
    fn stop_near_win(&mut self, column: usize);
    /// Column landed; `hard_stop` when the player slammed the reels
    fn reel_stop_effect(&mut self, column: usize, hard_stop: bool);
    /// Start the main-game omen
    fn show_mg_omen(&mut self);
    fn is_omen_playing(&self) -> bool;
}

/// Sink that ignores everything, for reels driven without presentation
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EffectSink for NullSink {
    fn start_near_win(&mut self, _column: usize) {}
    fn stop_near_win(&mut self, _column: usize) {}
    fn reel_stop_effect(&mut self, _column: usize, _hard_stop: bool) {}
    fn show_mg_omen(&mut self) {}
    fn is_omen_playing(&self) -> bool {
        false
    }
}

/// What the game flow needs from the reels
pub trait ReelEngine {
    /// Show the opening board
    fn init(&mut self, plate: &[Vec<Symbol>]);
    fn spin(&mut self, fast: bool, turbo: bool) -> bool;
    /// Authoritative result with per-column near-win flags
    fn set_final_data(&mut self, data: &PlateData, near_win: &[bool], sink: &mut dyn EffectSink);
    /// Lead-in symbols derived from the final board
    fn set_before_data(&mut self, data: &PlateData);
    fn stop_hard(&mut self, skip_near_win: bool);
    fn force_set_data(&mut self, data: &PlateData);
    fn reset_stop_trigger_time(&mut self);

    fn is_plate_stopped(&self) -> bool;
    fn is_near_winning(&self) -> bool;
    fn is_hard_stop(&self) -> bool;
    fn visible_plate(&self) -> Vec<Vec<Symbol>>;

    /// Arm scatter protection on every column
    fn set_protect_symbol(&mut self);
    /// Refresh loft and base sockets with non-scatter filler
    fn change_outside_symbol(&mut self);
    fn set_game_mode(&mut self, in_fg: bool);
    fn set_bet(&mut self, bet: Credits);
    /// Locked jackpot tiers, MINI..GRAND
    fn set_locked_jp(&mut self, locked: [bool; 5]);

    fn tick(&mut self, dt: f32, sink: &mut dyn EffectSink);
}

/// Reel work queued by presentation sequences, applied by the owner
#[derive(Debug, Clone, PartialEq)]
pub enum ReelRequest {
    ForceSetData(PlateData),
    SetProtectSymbol,
    ChangeOutsideSymbol,
    SetGameMode { in_fg: bool },
}

impl ReelRequest {
    pub fn apply(self, reel: &mut dyn ReelEngine) {
        match self {
            ReelRequest::ForceSetData(data) => reel.force_set_data(&data),
            ReelRequest::SetProtectSymbol => reel.set_protect_symbol(),
            ReelRequest::ChangeOutsideSymbol => reel.change_outside_symbol(),
            ReelRequest::SetGameMode { in_fg } => reel.set_game_mode(in_fg),
        }
    }
}
