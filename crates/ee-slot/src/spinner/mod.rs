//! Spinner Engine
//!
//! Drives N independent tracks through charge → spin → stop → rebound and
//! queues plate/track events for the owner to drain after each tick.
//!
//! ## Architecture
//!
//! ```text
//! SpinnerEngine
//!     ├── plate: StateMachine<PlateState>   Idle → Spinning → GentlyStop|Stopping → Idle
//!     ├── tracks[N]: Track                  per-column socket ring + motion
//!     │       └── StateMachine<TrackState>  WaitToRun → Charging → Spinning → WaitToStop
//!     │                                     → [WaitToNearWin] → [NearWin] → [PreStop]
//!     │                                     → Stopping → Rebound → Idle
//!     └── events: Vec<SpinnerEvent>         drained by the owner
//! ```
//!
//! Filler symbols come from a [`RandomSymbolSource`] passed into `tick`.

pub mod event;
pub mod speed;
pub mod track;

pub use event::*;
pub use speed::*;
pub use track::*;

/// Supplies filler for a column while it scrolls
pub trait RandomSymbolSource {
    /// Next generated cell entering `column` at the top
    fn random_symbol(&mut self, column: usize) -> Cell;

    /// Every cell entering a column, generated or authoritative
    fn symbol_entering(&mut self, _column: usize, _cell: &Cell) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlateState {
    Idle,
    Spinning,
    GentlyStop,
    Stopping,
}

/// Three preset speed profiles selected by `SpeedMode`
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedPresets {
    pub normal: SpeedConfig,
    pub faster: SpeedConfig,
    pub turbo: SpeedConfig,
}

impl SpeedPresets {
    pub fn select(&self, mode: SpeedMode) -> SpeedConfig {
        match mode {
            SpeedMode::Normal => self.normal.clone(),
            SpeedMode::Fast => self.faster.clone(),
            SpeedMode::Turbo => self.turbo.clone(),
        }
    }
}

impl Default for SpeedPresets {
    fn default() -> Self {
        Self {
            normal: SpeedConfig::normal(),
            faster: SpeedConfig::faster(),
            turbo: SpeedConfig::turbo(),
        }
    }
}

pub struct SpinnerEngine {
    layout: TrackLayout,
    presets: SpeedPresets,
    config: SpeedConfig,
    speed_mode: SpeedMode,
    plate: crate::state::StateMachine<PlateState>,
    tracks: Vec<Track>,
    events: Vec<SpinnerEvent>,

    stop_trigger_time: f32,
    fixed_stop_time: Option<f32>,
    is_ready_to_stop: bool,
    trigger_to_stop: bool,
    is_hard_stop: bool,
    is_stop_roughly: bool,
    skip_near_win: bool,
    final_data: Option<Vec<Vec<Cell>>>,
}

impl SpinnerEngine {
    /// Build `columns` tracks showing `plate` (column-major, main rows)
    pub fn new(layout: TrackLayout, plate: &[Vec<Cell>]) -> Self {
        let tracks = (0..plate.len().max(1))
            .map(|c| Track::new(c, layout, plate.get(c).map(Vec::as_slice).unwrap_or(&[])))
            .collect();
        Self {
            layout,
            presets: SpeedPresets::default(),
            config: SpeedConfig::faster(),
            speed_mode: SpeedMode::Fast,
            plate: crate::state::StateMachine::new("Plate", PlateState::Idle),
            tracks,
            events: Vec::new(),
            stop_trigger_time: 0.0,
            fixed_stop_time: None,
            is_ready_to_stop: false,
            trigger_to_stop: false,
            is_hard_stop: false,
            is_stop_roughly: false,
            skip_near_win: false,
            final_data: None,
        }
    }

    pub fn with_presets(mut self, presets: SpeedPresets) -> Self {
        self.presets = presets;
        self
    }

    pub fn set_presets(&mut self, presets: SpeedPresets) {
        self.presets = presets;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════

    pub fn layout(&self) -> TrackLayout {
        self.layout
    }

    pub fn columns(&self) -> usize {
        self.tracks.len()
    }

    pub fn plate_state(&self) -> PlateState {
        self.plate.current()
    }

    pub fn track_state(&self, column: usize) -> Option<TrackState> {
        self.tracks.get(column).map(Track::state)
    }

    pub fn track(&self, column: usize) -> Option<&Track> {
        self.tracks.get(column)
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode
    }

    pub fn speed_config(&self) -> &SpeedConfig {
        &self.config
    }

    pub fn is_hard_stop(&self) -> bool {
        self.is_hard_stop
    }

    pub fn has_final_data(&self) -> bool {
        self.is_ready_to_stop
    }

    /// Every track motionless
    pub fn is_plate_stopped(&self) -> bool {
        self.tracks.iter().all(|t| t.idle)
    }

    /// A track still owes a near-win hold
    pub fn is_near_winning(&self) -> bool {
        self.tracks.iter().any(|t| {
            t.is_near_win
                && matches!(
                    t.state(),
                    TrackState::WaitToStop | TrackState::WaitToNearWin | TrackState::NearWin
                )
        })
    }

    /// Main rows, column-major
    pub fn visible_plate(&self) -> Vec<Vec<Cell>> {
        self.tracks.iter().map(Track::visible).collect()
    }

    pub fn drain_events(&mut self) -> Vec<SpinnerEvent> {
        std::mem::take(&mut self.events)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // COMMANDS
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace the whole board while idle
    pub fn init(&mut self, plate: &[Vec<Cell>]) {
        for (column, track) in self.tracks.iter_mut().enumerate() {
            *track = Track::new(
                column,
                self.layout,
                plate.get(column).map(Vec::as_slice).unwrap_or(&[]),
            );
        }
        self.plate = crate::state::StateMachine::new("Plate", PlateState::Idle);
        self.reset_plate();
    }

    pub fn spin_reel(&mut self, fast: bool, turbo: bool) -> bool {
        let mode = SpeedMode::from_flags(fast, turbo);
        let config = self.presets.select(mode);
        self.start_spin(mode, config)
    }

    /// Spin with a caller-supplied profile
    pub fn spin_reel_with(&mut self, config: SpeedConfig) -> bool {
        self.start_spin(self.speed_mode, config)
    }

    fn start_spin(&mut self, mode: SpeedMode, config: SpeedConfig) -> bool {
        let idle_now = self.plate.is(PlateState::Idle) || self.plate.pending() == Some(PlateState::Idle);
        if !idle_now || !self.is_plate_stopped() {
            log::warn!("[Spinner] spin ignored: plate is {:?}", self.plate.current());
            return false;
        }
        self.speed_mode = mode;
        self.config = config.sanitized();
        self.reset_plate();
        for (index, track) in self.tracks.iter_mut().enumerate() {
            track.reset_status();
            track.idle = false;
            track.delay_to_run = self.config.begin_interval * index as f32;
            track.state.transit(TrackState::WaitToRun);
        }
        self.plate.transit(PlateState::Spinning);
        true
    }

    /// Authoritative board (column-major, main rows) and per-column near-win
    pub fn set_final_data(&mut self, plate: Vec<Vec<Cell>>, near_win: &[bool]) {
        for (column, track) in self.tracks.iter_mut().enumerate() {
            let flag = near_win.get(column).copied().unwrap_or(false);
            track.is_near_win = flag;
            track.near_win_time = if flag { self.config.near_win_time } else { 0.0 };
        }
        self.final_data = Some(plate);
        self.is_ready_to_stop = true;
    }

    /// Lead-in cells fed right before a column lands; they end up in the
    /// base socket
    pub fn set_before_data(&mut self, data: Vec<Vec<Cell>>) {
        for (column, track) in self.tracks.iter_mut().enumerate() {
            track.before = data.get(column).cloned().unwrap_or_default().into();
        }
    }

    /// Trigger the scheduled stop without waiting for the stop trigger time
    pub fn stop_reel(&mut self) {
        if !self.plate.is(PlateState::Idle) {
            self.trigger_to_stop = true;
        }
    }

    /// Quick stop. Near-win holds survive unless `skip_near_win`.
    pub fn stop_hard(&mut self, skip_near_win: bool) {
        if self.plate.is(PlateState::Idle) || self.is_hard_stop {
            return;
        }
        log::debug!("[Spinner] hard stop (skip_near_win={skip_near_win})");
        self.skip_near_win = skip_near_win;
        self.is_hard_stop = true;
        self.trigger_to_stop = true;
        self.is_stop_roughly = self.plate.is(PlateState::GentlyStop)
            || self.plate.pending() == Some(PlateState::GentlyStop);

        let stop_speed = self.stop_speed();
        for track in &mut self.tracks {
            let state = track.state();
            if state == TrackState::WaitToStop {
                track.delay_to_stop = 0.0;
                track.expire_timer();
            }
            if state != TrackState::NearWin && self.is_ready_to_stop {
                track.speed = stop_speed;
            }
            if skip_near_win && track.is_near_win {
                track.is_near_win = false;
                track.delay_to_near_win = 0.0;
                if matches!(
                    state,
                    TrackState::WaitToStop | TrackState::WaitToNearWin | TrackState::NearWin
                ) {
                    track.expire_timer();
                }
            }
        }
    }

    /// Restart the auto-stop countdown while spinning
    pub fn reset_stop_trigger_time(&mut self, secs: Option<f32>) {
        if self.plate.is(PlateState::Spinning) {
            self.stop_trigger_time = secs
                .filter(|s| *s >= 0.0)
                .unwrap_or(self.config.stop_trigger_time);
            self.trigger_to_stop = false;
        }
    }

    /// Show `plate` immediately. Mid-spin this abandons the spin.
    pub fn force_set_data(&mut self, plate: &[Vec<Cell>]) {
        if !self.plate.is(PlateState::Idle) || !self.is_plate_stopped() {
            log::warn!("[Spinner] force_set_data while {:?}, abandoning spin", self.plate.current());
            self.plate.transit(PlateState::Idle);
        }
        for (column, track) in self.tracks.iter_mut().enumerate() {
            let was_idle = track.idle;
            track.snap(plate.get(column).map(Vec::as_slice).unwrap_or(&[]));
            track.idle = true;
            if !was_idle {
                track.state.transit(TrackState::Idle);
            }
        }
    }

    /// Overwrite one socket (hidden sockets included)
    pub fn set_socket(&mut self, column: usize, socket: usize, cell: Cell) {
        if let Some(track) = self.tracks.get_mut(column) {
            track.set_socket(socket, cell);
        }
    }

    fn stop_speed(&self) -> f32 {
        self.config.landing_speed(self.is_hard_stop)
    }

    fn reset_plate(&mut self) {
        self.stop_trigger_time = 0.0;
        self.fixed_stop_time = None;
        self.is_ready_to_stop = false;
        self.trigger_to_stop = false;
        self.is_hard_stop = false;
        self.is_stop_roughly = false;
        self.skip_near_win = false;
        self.final_data = None;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TICK
    // ═══════════════════════════════════════════════════════════════════════

    pub fn tick(&mut self, dt: f32, source: &mut dyn RandomSymbolSource) {
        self.process_plate(dt);
        for index in 0..self.tracks.len() {
            self.process_track(index, dt, source);
        }
    }

    fn process_plate(&mut self, dt: f32) {
        self.plate.update();
        let entering = self.plate.is_entering();
        match self.plate.current() {
            PlateState::Idle => {
                if entering {
                    self.reset_plate();
                    self.events.push(SpinnerEvent::Plate(PlateEvent::EnterIdle));
                }
            }
            PlateState::Spinning => {
                if entering {
                    self.stop_trigger_time = self.config.stop_trigger_time;
                    self.events.push(SpinnerEvent::Plate(PlateEvent::StartSpinning));
                }
                if self.stop_trigger_time > 0.0 {
                    self.stop_trigger_time -= dt;
                } else {
                    self.stop_trigger_time = 0.0;
                    self.trigger_to_stop = true;
                }
                if self.trigger_to_stop && self.is_ready_to_stop {
                    self.schedule_stop();
                }
            }
            PlateState::GentlyStop | PlateState::Stopping => {
                if entering {
                    self.events.push(SpinnerEvent::Plate(PlateEvent::StartStopping));
                } else if self.is_plate_stopped() {
                    self.events.push(SpinnerEvent::Plate(PlateEvent::JustStopped));
                    self.plate.transit(PlateState::Idle);
                } else if self.plate.is(PlateState::GentlyStop) && self.is_stop_roughly {
                    self.schedule_stop();
                }
            }
        }
    }

    /// Per-track stop delays; near-win tracks wait for the holds of the
    /// tracks before them
    fn schedule_stop(&mut self) {
        let mut delay_to_stop = if self.is_hard_stop {
            0.0
        } else {
            self.config.ended_delay
        };
        let mut delay_to_near_win = 0.0;
        let mut prev_stop_time = 0.0;
        let travel = self.layout.socket_height * self.layout.landing_crossings() as f32;
        let stop_speed = self.stop_speed();
        let (_, rebound_time) = self.config.rebound(self.is_hard_stop);

        for track in &mut self.tracks {
            track.delay_to_stop = delay_to_stop;
            track.delay_to_near_win = delay_to_near_win;

            if self.skip_near_win {
                track.is_near_win = false;
            } else if track.is_near_win {
                track.delay_to_near_win += prev_stop_time;
                delay_to_near_win += track.near_win_time + prev_stop_time;
            }

            if !self.is_hard_stop && !track.is_near_win {
                delay_to_stop += self.config.ended_interval;
            }

            let speed = if track.is_near_win {
                self.config.near_win_speed
            } else {
                stop_speed
            };
            prev_stop_time = travel / speed + rebound_time;
        }

        self.plate.transit(if self.is_hard_stop {
            PlateState::Stopping
        } else {
            PlateState::GentlyStop
        });
    }

    fn process_track(&mut self, index: usize, dt: f32, source: &mut dyn RandomSymbolSource) {
        let config = &self.config;
        let stop_speed = config.landing_speed(self.is_hard_stop);
        let track = &mut self.tracks[index];
        let events = &mut self.events;
        let column = track.column;

        track.tick_timer(dt);
        track.state.update();
        let entering = track.state.is_entering();

        let after_wait = |track: &Track| {
            if !track.before.is_empty() {
                TrackState::PreStop
            } else {
                TrackState::Stopping
            }
        };

        match track.state() {
            TrackState::Idle => {
                if entering {
                    track.idle = true;
                    track.reset_status();
                    events.push(SpinnerEvent::track(column, TrackEvent::EnterIdle));
                }
            }
            TrackState::WaitToRun => {
                if entering {
                    track.start_timer(track.delay_to_run);
                    events.push(SpinnerEvent::track(
                        column,
                        TrackEvent::WaitToRun { delay: track.delay_to_run.max(0.0) },
                    ));
                }
                if track.check_timer() {
                    track.state.transit(TrackState::Charging);
                }
            }
            TrackState::Charging => {
                if entering {
                    track.begin_charge(config.charge_dist, config.charge_time);
                    track.start_timer(config.charge_time);
                    events.push(SpinnerEvent::track(
                        column,
                        TrackEvent::StartCharging { time: config.charge_time },
                    ));
                }
                track.advance_charge(dt);
                if track.check_timer() {
                    track.state.transit(TrackState::Spinning);
                }
            }
            TrackState::Spinning => {
                if entering {
                    track.speed = config.move_speed;
                    events.push(SpinnerEvent::track(column, TrackEvent::StartSpinning));
                }
                if self.trigger_to_stop && self.is_ready_to_stop {
                    track.state.transit(TrackState::WaitToStop);
                }
                track.move_by(track.speed * dt, source, events);
            }
            TrackState::WaitToStop => {
                if entering {
                    track.speed = stop_speed;
                    track.start_timer(track.delay_to_stop);
                    events.push(SpinnerEvent::track(
                        column,
                        TrackEvent::WaitToStop { delay: track.delay_to_stop.max(0.0) },
                    ));
                }
                if track.check_timer() {
                    let next = if track.delay_to_near_win > 0.0 {
                        TrackState::WaitToNearWin
                    } else if track.is_near_win {
                        TrackState::NearWin
                    } else {
                        after_wait(track)
                    };
                    track.state.transit(next);
                }
                track.move_by(track.speed * dt, source, events);
            }
            TrackState::WaitToNearWin => {
                if entering {
                    track.start_timer(track.delay_to_near_win);
                    events.push(SpinnerEvent::track(
                        column,
                        TrackEvent::WaitToNearWin { delay: track.delay_to_near_win.max(0.0) },
                    ));
                }
                if track.check_timer() {
                    let next = if track.is_near_win {
                        TrackState::NearWin
                    } else {
                        after_wait(track)
                    };
                    track.state.transit(next);
                }
                track.move_by(track.speed * dt, source, events);
            }
            TrackState::NearWin => {
                if entering {
                    track.speed = config.near_win_speed;
                    track.start_timer(track.near_win_time);
                    events.push(SpinnerEvent::track(
                        column,
                        TrackEvent::StartNearWin { time: track.near_win_time.max(0.0) },
                    ));
                }
                if track.check_timer() {
                    track.state.transit(after_wait(track));
                }
                track.move_by(track.speed * dt, source, events);
            }
            TrackState::PreStop => {
                if entering {
                    events.push(SpinnerEvent::track(column, TrackEvent::PreparingStop));
                }
                track.move_pre_stop(track.speed * dt, source, events);
                if track.before.is_empty() {
                    track.state.transit(TrackState::Stopping);
                }
            }
            TrackState::Stopping => {
                if entering {
                    let rows = self
                        .final_data
                        .as_ref()
                        .and_then(|plate| plate.get(column))
                        .cloned()
                        .unwrap_or_default();
                    let fixed = match config.stop_mode {
                        StopMode::FixedTime if index > 0 && !track.is_near_win => {
                            self.fixed_stop_time
                        }
                        _ => None,
                    };
                    let landing_time = track.begin_landing(
                        &rows,
                        config.rebound(self.is_hard_stop),
                        self.is_hard_stop,
                        fixed,
                    );
                    if config.stop_mode == StopMode::FixedTime && index == 0 {
                        self.fixed_stop_time = Some(landing_time);
                    }
                    events.push(SpinnerEvent::track(
                        column,
                        TrackEvent::StartStopping { landing_time },
                    ));
                } else if self.is_stop_roughly && !track.is_hard_landing() {
                    track.reland_hard(config.hard_stop_speed, config.rebound(true));
                }
                if track.advance_landing(dt, source, events) {
                    events.push(SpinnerEvent::track(column, TrackEvent::ReachBottom));
                    track.state.transit(TrackState::Rebound);
                }
            }
            TrackState::Rebound => {
                if track.advance_rebound(dt) {
                    events.push(SpinnerEvent::track(column, TrackEvent::JustStopped));
                    track.state.transit(TrackState::Idle);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ee_protocol::Symbol;

    struct Filler(Symbol);

    impl RandomSymbolSource for Filler {
        fn random_symbol(&mut self, _column: usize) -> Cell {
            Cell::new(self.0)
        }
    }

    const DT: f32 = 1.0 / 60.0;

    fn board(symbol: Symbol) -> Vec<Vec<Cell>> {
        vec![vec![Cell::new(symbol); 4]; 5]
    }

    fn target() -> Vec<Vec<Cell>> {
        (0..5)
            .map(|c| {
                vec![
                    Cell::new(Symbol::A),
                    Cell::new(if c % 2 == 0 { Symbol::Scatter } else { Symbol::K }),
                    Cell::new(Symbol::Wild),
                    Cell::new(Symbol::Q),
                ]
            })
            .collect()
    }

    fn engine() -> SpinnerEngine {
        SpinnerEngine::new(TrackLayout::new(1, 4, 1, 150.0), &board(Symbol::Ten))
    }

    fn run_until_stopped(engine: &mut SpinnerEngine, filler: &mut Filler) -> Vec<SpinnerEvent> {
        let mut events = Vec::new();
        for _ in 0..2000 {
            engine.tick(DT, filler);
            events.extend(engine.drain_events());
            if engine.is_plate_stopped() && engine.plate_state() == PlateState::Idle {
                break;
            }
        }
        events
    }

    #[test]
    fn test_spin_lands_on_final_data() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        engine.tick(DT, &mut filler);
        assert!(engine.spin_reel(true, false));
        engine.tick(DT, &mut filler);
        engine.set_final_data(target(), &[false; 5]);
        run_until_stopped(&mut engine, &mut filler);
        assert_eq!(engine.visible_plate(), target());
        assert!(engine.is_plate_stopped());
    }

    #[test]
    fn test_reach_bottom_precedes_just_stopped() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        engine.spin_reel(true, false);
        engine.set_final_data(target(), &[false; 5]);
        let events = run_until_stopped(&mut engine, &mut filler);
        for column in 0..5 {
            let reach = events.iter().position(|e| {
                *e == SpinnerEvent::track(column, TrackEvent::ReachBottom)
            });
            let stopped = events.iter().position(|e| {
                *e == SpinnerEvent::track(column, TrackEvent::JustStopped)
            });
            assert!(reach.is_some() && stopped.is_some());
            assert!(reach < stopped);
        }
        assert!(events.contains(&SpinnerEvent::Plate(PlateEvent::JustStopped)));
    }

    #[test]
    fn test_fixed_time_shares_landing_time() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        engine.spin_reel(true, false);
        engine.set_final_data(target(), &[false; 5]);
        let events = run_until_stopped(&mut engine, &mut filler);
        let times: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                SpinnerEvent::Track {
                    event: TrackEvent::StartStopping { landing_time },
                    ..
                } => Some(*landing_time),
                _ => None,
            })
            .collect();
        assert_eq!(times.len(), 5);
        assert!(times.iter().all(|t| (*t - times[0]).abs() < 1e-6));
    }

    #[test]
    fn test_near_win_track_holds() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        engine.spin_reel(true, false);
        engine.set_final_data(target(), &[false, false, false, true, true]);
        let events = run_until_stopped(&mut engine, &mut filler);
        let near_wins: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                SpinnerEvent::Track {
                    column,
                    event: TrackEvent::StartNearWin { .. },
                } => Some(*column),
                _ => None,
            })
            .collect();
        assert_eq!(near_wins, vec![3, 4]);
        assert_eq!(engine.visible_plate(), target());
    }

    #[test]
    fn test_stop_hard_when_idle_is_noop() {
        let mut engine = engine();
        engine.stop_hard(false);
        assert!(!engine.is_hard_stop());
        assert_eq!(engine.plate_state(), PlateState::Idle);
    }

    #[test]
    fn test_stop_hard_keeps_near_win_unless_skipped() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        engine.spin_reel(true, false);
        engine.set_final_data(target(), &[false, false, false, false, true]);
        engine.tick(DT, &mut filler);
        engine.stop_hard(false);
        assert!(engine.is_hard_stop());
        let events = run_until_stopped(&mut engine, &mut filler);
        assert!(events.contains(&SpinnerEvent::track(4, TrackEvent::StartNearWin { time: 1.5 })));

        let mut engine = self::engine();
        engine.spin_reel(true, false);
        engine.set_final_data(target(), &[false, false, false, false, true]);
        engine.tick(DT, &mut filler);
        engine.stop_hard(true);
        let events = run_until_stopped(&mut engine, &mut filler);
        assert!(!events.iter().any(|e| matches!(
            e,
            SpinnerEvent::Track { event: TrackEvent::StartNearWin { .. }, .. }
        )));
        assert_eq!(engine.visible_plate(), target());
    }

    #[test]
    fn test_spin_while_spinning_is_ignored() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        assert!(engine.spin_reel(true, false));
        engine.tick(DT, &mut filler);
        assert!(!engine.spin_reel(true, true));
        assert_eq!(engine.speed_mode(), SpeedMode::Fast);
    }

    #[test]
    fn test_force_set_data_mid_spin_snaps() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        engine.spin_reel(true, false);
        for _ in 0..30 {
            engine.tick(DT, &mut filler);
        }
        engine.force_set_data(&target());
        assert!(engine.is_plate_stopped());
        assert_eq!(engine.visible_plate(), target());
        for _ in 0..5 {
            engine.tick(DT, &mut filler);
        }
        assert_eq!(engine.plate_state(), PlateState::Idle);
        assert_eq!(engine.visible_plate(), target());
    }

    #[test]
    fn test_before_data_lands_in_base_socket() {
        let mut engine = engine();
        let mut filler = Filler(Symbol::J);
        engine.spin_reel(true, false);
        engine.set_before_data(vec![vec![Cell::new(Symbol::Sphinx)]; 5]);
        engine.set_final_data(target(), &[false; 5]);
        run_until_stopped(&mut engine, &mut filler);
        for column in 0..5 {
            let track = engine.track(column).unwrap();
            assert_eq!(track.sockets()[5].symbol, Symbol::Sphinx);
        }
    }
}
