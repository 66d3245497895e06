//! One reel column: socket ring, scroll offset and motion primitives
//!
//! Sockets are stored top to bottom: `loft` hidden sockets, the `main`
//! visible rows, then `base` hidden sockets. The strip scrolls downward, so
//! crossing a socket boundary evicts the bottom cell and feeds a new one in
//! at the top.

use std::collections::VecDeque;

use ee_core::Credits;
use ee_protocol::{CoinValue, JpType, Symbol};

use super::event::{SpinnerEvent, TrackEvent};
use super::RandomSymbolSource;
use crate::state::StateMachine;

/// Remaining distance below which a landing counts as arrived (px)
const LANDING_EPSILON: f32 = 1e-3;

/// Symbol plus coin payload held by a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub symbol: Symbol,
    pub coin: CoinValue,
}

impl Cell {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            coin: CoinValue::default(),
        }
    }

    pub fn with_coin(symbol: Symbol, coin: CoinValue) -> Self {
        Self { symbol, coin }
    }

    pub fn coin_value(&self) -> Credits {
        self.coin.value
    }

    pub fn jp_type(&self) -> JpType {
        self.coin.jp_type
    }
}

impl From<Symbol> for Cell {
    fn from(symbol: Symbol) -> Self {
        Cell::new(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackState {
    Idle,
    WaitToRun,
    Charging,
    Spinning,
    WaitToStop,
    WaitToNearWin,
    NearWin,
    PreStop,
    Stopping,
    Rebound,
}

/// Socket counts and pitch shared by every track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackLayout {
    pub loft: usize,
    pub main: usize,
    pub base: usize,
    pub socket_height: f32,
}

impl TrackLayout {
    pub fn new(loft: usize, main: usize, base: usize, socket_height: f32) -> Self {
        Self {
            loft,
            main: main.max(1),
            base,
            socket_height: socket_height.max(1.0),
        }
    }

    pub fn total(&self) -> usize {
        self.loft + self.main + self.base
    }

    /// Boundaries crossed while landing
    pub fn landing_crossings(&self) -> usize {
        self.main + self.loft
    }

    pub fn total_height(&self) -> f32 {
        self.socket_height * self.total() as f32
    }
}

/// Linear offset interpolation
#[derive(Debug, Clone, Copy)]
struct Tween {
    from: f32,
    to: f32,
    time: f32,
    elapsed: f32,
}

impl Tween {
    fn new(from: f32, to: f32, time: f32) -> Self {
        Self {
            from,
            to,
            time: time.max(0.0),
            elapsed: 0.0,
        }
    }

    fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        if self.is_done() {
            self.to
        } else {
            self.from + (self.to - self.from) * (self.elapsed / self.time)
        }
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.time
    }
}

#[derive(Debug, Clone)]
struct Landing {
    /// Authoritative cells, in the order they enter at the top
    pending: VecDeque<Cell>,
    crossings_left: usize,
    distance_left: f32,
    speed: f32,
    rebound_dist: f32,
    rebound_time: f32,
    hard: bool,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub(super) column: usize,
    pub(super) state: StateMachine<TrackState>,
    layout: TrackLayout,
    sockets: VecDeque<Cell>,
    offset: f32,
    pub(super) speed: f32,
    timer: Option<f32>,
    pub(super) delay_to_run: f32,
    pub(super) delay_to_stop: f32,
    pub(super) delay_to_near_win: f32,
    pub(super) is_near_win: bool,
    pub(super) near_win_time: f32,
    pub(super) before: VecDeque<Cell>,
    pub(super) idle: bool,
    charge: Option<Tween>,
    landing: Option<Landing>,
    rebound: Option<Tween>,
}

impl Track {
    pub fn new(column: usize, layout: TrackLayout, cells: &[Cell]) -> Self {
        let mut track = Self {
            column,
            state: StateMachine::new("Track", TrackState::Idle),
            layout,
            sockets: VecDeque::with_capacity(layout.total()),
            offset: 0.0,
            speed: 0.0,
            timer: None,
            delay_to_run: 0.0,
            delay_to_stop: 0.0,
            delay_to_near_win: 0.0,
            is_near_win: false,
            near_win_time: 0.0,
            before: VecDeque::new(),
            idle: true,
            charge: None,
            landing: None,
            rebound: None,
        };
        track.fill(cells);
        track
    }

    /// Lay out main rows from `cells`; hidden sockets copy the nearest row
    fn fill(&mut self, cells: &[Cell]) {
        let fallback = Cell::new(Symbol::Ten);
        let row = |i: usize| {
            cells
                .get(i)
                .or_else(|| cells.last())
                .copied()
                .unwrap_or(fallback)
        };
        self.sockets.clear();
        for _ in 0..self.layout.loft {
            self.sockets.push_back(row(0));
        }
        for i in 0..self.layout.main {
            self.sockets.push_back(row(i));
        }
        for _ in 0..self.layout.base {
            self.sockets.push_back(row(self.layout.main - 1));
        }
    }

    pub fn state(&self) -> TrackState {
        self.state.current()
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn sockets(&self) -> &VecDeque<Cell> {
        &self.sockets
    }

    /// Main rows, top to bottom
    pub fn visible(&self) -> Vec<Cell> {
        self.sockets
            .iter()
            .skip(self.layout.loft)
            .take(self.layout.main)
            .copied()
            .collect()
    }

    pub fn set_socket(&mut self, socket: usize, cell: Cell) {
        if let Some(slot) = self.sockets.get_mut(socket) {
            *slot = cell;
        }
    }

    pub fn is_hard_landing(&self) -> bool {
        self.landing.as_ref().is_some_and(|l| l.hard)
    }

    pub(super) fn reset_status(&mut self) {
        self.speed = 0.0;
        self.timer = None;
        self.delay_to_run = 0.0;
        self.delay_to_stop = 0.0;
        self.delay_to_near_win = 0.0;
        self.is_near_win = false;
        self.near_win_time = 0.0;
        self.before.clear();
        self.charge = None;
        self.landing = None;
        self.rebound = None;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TIMER
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn start_timer(&mut self, secs: f32) {
        self.timer = Some(secs.max(0.0));
    }

    pub(super) fn expire_timer(&mut self) {
        if self.timer.is_some() {
            self.timer = Some(0.0);
        }
    }

    pub(super) fn tick_timer(&mut self, dt: f32) {
        if let Some(left) = self.timer.as_mut() {
            *left -= dt;
        }
    }

    /// True once when the armed timer has run out
    pub(super) fn check_timer(&mut self) -> bool {
        match self.timer {
            Some(left) if left <= 0.0 => {
                self.timer = None;
                true
            }
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // MOTION
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn begin_charge(&mut self, dist: f32, time: f32) {
        let dist = dist.min(self.layout.socket_height * 0.5);
        let mut tween = Tween::new(self.offset, self.offset - dist, time);
        if tween.time <= 0.0 {
            self.offset = tween.advance(0.0);
        } else {
            self.charge = Some(tween);
        }
    }

    pub(super) fn advance_charge(&mut self, dt: f32) {
        if let Some(tween) = self.charge.as_mut() {
            self.offset = tween.advance(dt);
            if tween.is_done() {
                self.charge = None;
            }
        }
    }

    fn cross(
        &mut self,
        cell: Cell,
        source: &mut dyn RandomSymbolSource,
        events: &mut Vec<SpinnerEvent>,
    ) {
        if let Some(leaving) = self.sockets.pop_back() {
            events.push(SpinnerEvent::track(
                self.column,
                TrackEvent::SymbolLeaving { cell: leaving },
            ));
        }
        self.sockets.push_front(cell);
        source.symbol_entering(self.column, &cell);
        events.push(SpinnerEvent::track(
            self.column,
            TrackEvent::SymbolEntering { cell },
        ));
    }

    /// Free scroll with generated filler
    pub(super) fn move_by(
        &mut self,
        dy: f32,
        source: &mut dyn RandomSymbolSource,
        events: &mut Vec<SpinnerEvent>,
    ) {
        let h = self.layout.socket_height;
        self.offset += dy.min(self.layout.total_height());
        while self.offset >= h {
            self.offset -= h;
            let cell = source.random_symbol(self.column);
            self.cross(cell, source, events);
        }
    }

    /// Scroll that feeds the lead-in cells; never crosses more boundaries
    /// than there are lead-in cells left
    pub(super) fn move_pre_stop(
        &mut self,
        dy: f32,
        source: &mut dyn RandomSymbolSource,
        events: &mut Vec<SpinnerEvent>,
    ) {
        let h = self.layout.socket_height;
        let max_dy = h * self.before.len() as f32;
        self.offset += dy.min(self.layout.total_height()).min(max_dy);
        while self.offset >= h {
            self.offset -= h;
            let cell = match self.before.pop_front() {
                Some(cell) => cell,
                None => source.random_symbol(self.column),
            };
            self.cross(cell, source, events);
        }
    }

    /// Plan the landing onto `final_rows` (top to bottom). Returns the
    /// landing time.
    pub(super) fn begin_landing(
        &mut self,
        final_rows: &[Cell],
        rebound: (f32, f32),
        hard: bool,
        fixed_time: Option<f32>,
    ) -> f32 {
        let h = self.layout.socket_height;
        let main = self.layout.main;
        let crossings = self.layout.landing_crossings();
        let rebound_dist = rebound.0.min(h * 0.9);

        let mut pending = VecDeque::with_capacity(main);
        for k in 0..main {
            if let Some(cell) = final_rows.get(main - 1 - k) {
                pending.push_back(*cell);
            }
        }

        let distance = (h - self.offset) + (crossings as f32 - 1.0) * h + rebound_dist;
        let speed = self.speed.max(super::speed::MINIMUM_SPEED);
        let time = match fixed_time {
            Some(t) if t > 0.0 => t,
            _ => distance / speed,
        };
        self.charge = None;
        self.speed = distance / time.max(f32::EPSILON);
        self.landing = Some(Landing {
            pending,
            crossings_left: crossings,
            distance_left: distance,
            speed: self.speed,
            rebound_dist,
            rebound_time: rebound.1,
            hard,
        });
        time
    }

    /// Switch a landing in flight to the hard-stop profile
    pub(super) fn reland_hard(&mut self, speed: f32, rebound: (f32, f32)) {
        let h = self.layout.socket_height;
        if let Some(landing) = self.landing.as_mut() {
            let rebound_dist = rebound.0.min(h * 0.9);
            landing.distance_left =
                (landing.distance_left - landing.rebound_dist + rebound_dist).max(0.0);
            landing.rebound_dist = rebound_dist;
            landing.rebound_time = rebound.1;
            landing.speed = speed.max(super::speed::MINIMUM_SPEED);
            landing.hard = true;
            self.speed = landing.speed;
        }
    }

    /// Returns true on the tick the final rest position is reached
    pub(super) fn advance_landing(
        &mut self,
        dt: f32,
        source: &mut dyn RandomSymbolSource,
        events: &mut Vec<SpinnerEvent>,
    ) -> bool {
        let h = self.layout.socket_height;
        let Some(mut landing) = self.landing.take() else {
            return false;
        };
        let step = (landing.speed * dt).min(landing.distance_left);
        landing.distance_left -= step;
        self.offset += step;

        let arrived = landing.distance_left <= LANDING_EPSILON;
        while landing.crossings_left > 0 && (self.offset >= h || arrived) {
            self.offset = (self.offset - h).max(0.0);
            landing.crossings_left -= 1;
            let cell = match landing.pending.pop_front() {
                Some(cell) => cell,
                None => source.random_symbol(self.column),
            };
            self.cross(cell, source, events);
        }
        if arrived {
            self.offset = landing.rebound_dist;
            self.rebound = Some(Tween::new(
                landing.rebound_dist,
                0.0,
                landing.rebound_time,
            ));
        }
        self.landing = Some(landing);
        arrived
    }

    /// Returns true once the bounce back to rest has finished
    pub(super) fn advance_rebound(&mut self, dt: f32) -> bool {
        match self.rebound.as_mut() {
            Some(tween) => {
                self.offset = tween.advance(dt);
                if tween.is_done() {
                    self.offset = 0.0;
                    self.rebound = None;
                    self.landing = None;
                    true
                } else {
                    false
                }
            }
            None => {
                self.offset = 0.0;
                true
            }
        }
    }

    /// Drop any motion and show `cells` in the main rows
    pub(super) fn snap(&mut self, cells: &[Cell]) {
        for (row, cell) in cells.iter().take(self.layout.main).enumerate() {
            self.sockets[self.layout.loft + row] = *cell;
        }
        self.offset = 0.0;
        self.reset_status();
    }
}
