//! Effect / presentation state machine
//!
//! Everything the player sees between "reels stopped" and "ready for the
//! next spin": collection flights into the phase panels, level-ups, the win
//! line carousel, run-score and big-win, free-game add-spins and the
//! free-game enter/leave choreography. Multi-step animation chains run as
//! [`Sequence`]s; timers are scheduler handles owned by the view.
//!
//! ## Architecture
//!
//! ```text
//! EffectView
//!     ├── StateMachine<EffectState>
//!     │       IDLE ─> MG_FG_COLLECT ─> MG|FG_SHOW_SYMBOL_LINE_EFFECT ─> [FG_SHOW_ADD_SPINS] ─> IDLE
//!     │       FG_ENTER ─> IDLE
//!     │       FG_LEAVE ─> IDLE
//!     ├── collect[2]     per-channel fly + phase sequence
//!     ├── run_score      roll-up, big win, credit
//!     ├── choreography   add-spins / enter / leave
//!     ├── omen           main-game omen, holds the reel result
//!     └── EffectCore     round data, jackpot board, scheduler, reel requests
//! ```

use ee_core::Credits;
use ee_protocol::{JpType, PhaseType, PlateData, Symbol};
use rand::{Rng, RngCore};

use crate::collaborators::{
    BezierPath, Cue, CueTicket, EffectSink, GameEvent, Point, ReelRequest, Services, SoundHandle,
};
use crate::config::{EffectTiming, SlotConfig};
use crate::define::{
    FG_BASE_ROUND, LINE_TABLE_30, MAIN_COLUMN, MAIN_ROW, MAX_PHASE_LEVEL, audio, fg_init_plate,
    fallback_plate,
};
use crate::jackpot::JackpotBoard;
use crate::sequencer::Sequence;
use crate::state::StateMachine;
use crate::timer::{Scheduler, TimerHandle};

pub type EffectSeq = Sequence<EffectCore, Services>;

const PURPLE: usize = PhaseType::Purple as usize;
const GREEN: usize = PhaseType::Green as usize;

/// Board cell size in presenter units
const CELL_SIZE: f32 = 150.0;

/// Landing point of collection flights per channel
const PHASE_ANCHORS: [Point; 2] = [Point { x: -120.0, y: 150.0 }, Point { x: 870.0, y: 150.0 }];

/// Stop sounds merged in turbo/hard stop, in play order
const STOP_SOUNDS: [&str; 3] = [audio::REEL_STOP, audio::SCATTER_STOP, audio::JP_STOP];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectState {
    Idle,
    MgFgCollect,
    MgShowSymbolLineEffect,
    FgShowSymbolLineEffect,
    FgShowAddSpins,
    FgEnter,
    FgLeave,
}

/// Presentation shadow of one board cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectCell {
    pub symbol: Symbol,
    pub coin_value: Credits,
    pub jp_type: JpType,
    pub is_collect: bool,
}

/// Phase channel a symbol flies into
pub fn collect_channel(symbol: Symbol) -> Option<usize> {
    match symbol {
        Symbol::Scatter => Some(PURPLE),
        s if s.is_coin() => Some(GREEN),
        _ => None,
    }
}

fn cell_point(column: usize, row: usize) -> Point {
    Point::new((column as f32 + 0.5) * CELL_SIZE, (row as f32 + 0.5) * CELL_SIZE)
}

/// Flight path with two perpendicular-offset control points. The second
/// midpoint is drawn from `[0.5, 0.9)` of the way.
pub fn random_bezier(rng: &mut dyn RngCore, from: Point, to: Point) -> BezierPath {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let magnitude = Point::new(dx, dy).length();
    let second: f32 = 0.5 + rng.random::<f32>() * 0.4;
    let r1 = Point::new(from.x + dx * 0.5, from.y + dy * 0.5);
    let r2 = Point::new(from.x + dx * second, from.y + dy * second);
    let k2 = -0.5 * magnitude * 0.01;
    BezierPath {
        from,
        control1: Point::new(r1.x + r1.y * 0.5, r1.y - r1.x * 0.5),
        control2: Point::new(r2.x + r2.y * k2, r2.y - r2.x * k2),
        to,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Round data and presentation bookkeeping, shared with running sequences
pub struct EffectCore {
    pub timing: EffectTiming,
    fake_upgrade_percent: u32,
    pub scheduler: Scheduler,
    pub jackpot: JackpotBoard,

    pub in_fg: bool,
    pub turbo: bool,
    is_show_end: bool,
    is_auto_play: bool,
    skip_show_enter: bool,

    pub phase: [u32; 2],
    pub pre_phase: [u32; 2],
    plate: PlateData,
    cells: Vec<Vec<EffectCell>>,
    reel_stop_sounds: Vec<Vec<&'static str>>,
    collect_count: [usize; 2],
    pub round_win: Credits,
    pub bet: Credits,
    pub has_add_spin: bool,
    pub add_spin_count: u32,
    pub fg_spinned: u32,
    pub total_free_round: u32,
    pub fg_total_win: Credits,
    has_line_awards: bool,
    play_sound_once: bool,
    collect_sound_once: bool,
    is_near_winning: bool,
    first_reel_feature: bool,
    saved_mg_plate: Option<PlateData>,

    near_win_sounds: Vec<Option<SoundHandle>>,
    near_win_cues: Vec<Option<CueTicket>>,
    award_index: Vec<Vec<(usize, usize)>>,
    award_cursor: usize,
    carousel: Option<TimerHandle>,
    highlight_tickets: Vec<CueTicket>,
    fly_tickets: [Vec<CueTicket>; 2],
    phase_tickets: [CueTicket; 2],
    cue_ticket: CueTicket,
    omen_ticket: CueTicket,
    declare_sound: Option<SoundHandle>,

    requests: Vec<ReelRequest>,
    spawned: Vec<EffectSeq>,
    next_state: Option<EffectState>,
}

impl EffectCore {
    pub fn new(config: &SlotConfig) -> Self {
        Self {
            timing: config.timing.clone(),
            fake_upgrade_percent: config.fake_upgrade_percent,
            scheduler: Scheduler::new(),
            jackpot: JackpotBoard::new(config.jp_roll_durations),
            in_fg: false,
            turbo: false,
            is_show_end: true,
            is_auto_play: false,
            skip_show_enter: false,
            phase: [0; 2],
            pre_phase: [0; 2],
            plate: PlateData::default(),
            cells: Vec::new(),
            reel_stop_sounds: Vec::new(),
            collect_count: [0; 2],
            round_win: Credits::ZERO,
            bet: Credits::ZERO,
            has_add_spin: false,
            add_spin_count: 0,
            fg_spinned: 0,
            total_free_round: 0,
            fg_total_win: Credits::ZERO,
            has_line_awards: false,
            play_sound_once: false,
            collect_sound_once: false,
            is_near_winning: false,
            first_reel_feature: false,
            saved_mg_plate: None,
            near_win_sounds: vec![None; MAIN_COLUMN],
            near_win_cues: vec![None; MAIN_COLUMN],
            award_index: Vec::new(),
            award_cursor: 0,
            carousel: None,
            highlight_tickets: Vec::new(),
            fly_tickets: [Vec::new(), Vec::new()],
            phase_tickets: [CueTicket::DONE; 2],
            cue_ticket: CueTicket::DONE,
            omen_ticket: CueTicket::DONE,
            declare_sound: None,
            requests: Vec::new(),
            spawned: Vec::new(),
            next_state: None,
        }
    }

    pub fn plate(&self) -> &PlateData {
        &self.plate
    }

    pub fn cells(&self) -> &[Vec<EffectCell>] {
        &self.cells
    }

    pub fn collect_count(&self, channel: usize) -> usize {
        self.collect_count.get(channel).copied().unwrap_or(0)
    }

    pub fn first_reel_feature(&self) -> bool {
        self.first_reel_feature
    }

    pub fn saved_mg_plate(&self) -> Option<&PlateData> {
        self.saved_mg_plate.as_ref()
    }

    pub fn reel_stop_sounds(&self, column: usize) -> &[&'static str] {
        self.reel_stop_sounds
            .get(column)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ROUND DATA
    // ═══════════════════════════════════════════════════════════════════════

    /// Show `data` as the current board without touching phases or wins
    pub fn set_board(&mut self, data: &PlateData) {
        self.plate = data.clone();
        self.cells = (0..MAIN_COLUMN)
            .map(|column| {
                (0..MAIN_ROW)
                    .filter_map(|row| {
                        let symbol = data.symbol_at(column, row)?;
                        let coin = data.coin_at(column, row);
                        Some(EffectCell {
                            symbol,
                            coin_value: coin.value,
                            jp_type: coin.jp_type,
                            is_collect: collect_channel(symbol).is_some(),
                        })
                    })
                    .collect()
            })
            .collect();
        self.first_reel_feature = data
            .plate
            .first()
            .is_some_and(|rows| rows.contains(&Symbol::Chest));
    }

    /// Board the free game returns to
    pub fn set_mg_plate(&mut self, data: &PlateData) {
        self.set_board(data);
        self.save_mg_plate(data);
    }

    pub fn save_mg_plate(&mut self, data: &PlateData) {
        self.saved_mg_plate = Some(data.clone());
    }

    /// Failed spin: show `data` with nothing to collect or pay
    pub fn apply_fallback(&mut self, data: &PlateData) {
        self.set_board(data);
        self.reel_stop_sounds = vec![vec![audio::REEL_STOP]; MAIN_COLUMN];
        self.collect_count = [0; 2];
        self.pre_phase = self.phase;
        self.round_win = Credits::ZERO;
    }

    /// Take a spin result. Returns the per-column near-win flags.
    ///
    /// A column is near-win once two earlier columns showed a scatter. A
    /// feature symbol on the first reel puts every later column on near-win.
    pub fn apply_result(&mut self, data: &PlateData, bet: Credits) -> Vec<bool> {
        self.set_board(data);

        let mut scatter_columns = 0;
        let mut near_win = vec![false; MAIN_COLUMN];
        self.reel_stop_sounds = Vec::with_capacity(MAIN_COLUMN);
        self.collect_count = [0; 2];
        for (column, flag) in near_win.iter_mut().enumerate() {
            let cells = self.cells.get(column).map(Vec::as_slice).unwrap_or(&[]);
            let has_scatter = cells.iter().any(|c| c.symbol == Symbol::Scatter);
            let has_coin = cells.iter().any(|c| c.symbol.is_coin());
            for cell in cells {
                if let Some(channel) = collect_channel(cell.symbol) {
                    self.collect_count[channel] += 1;
                }
            }

            *flag = if self.first_reel_feature {
                column > 0
            } else {
                scatter_columns >= 2
            };
            if has_scatter {
                scatter_columns += 1;
            }

            self.reel_stop_sounds.push(if has_scatter {
                vec![audio::SCATTER_STOP]
            } else if has_coin {
                vec![audio::JP_STOP]
            } else {
                vec![audio::REEL_STOP]
            });
        }

        self.pre_phase = self.phase;
        for (channel, level) in self.phase.iter_mut().enumerate() {
            *level = data.phase_level(channel);
        }
        self.round_win = data.plate_win;
        self.bet = bet;
        near_win
    }

    pub fn set_phase_level(&mut self, phase: &[u32]) {
        for channel in 0..2 {
            let level = phase.get(channel).copied().unwrap_or(0);
            self.phase[channel] = level;
            self.pre_phase[channel] = level;
        }
    }

    fn reset_round(&mut self, svc: &mut Services) {
        self.clear_all_effect(svc);
        self.has_line_awards = false;
        self.play_sound_once = false;
        self.collect_sound_once = false;
        self.is_near_winning = false;
        self.has_add_spin = false;
        self.add_spin_count = 0;
    }

    /// FG counters back to zero after the payout
    pub fn reset_fg_parameter(&mut self) {
        self.total_free_round = 0;
        self.fg_spinned = 0;
        self.fg_total_win = Credits::ZERO;
    }

    pub fn push_request(&mut self, request: ReelRequest) {
        self.requests.push(request);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // EFFECT HOUSEKEEPING
    // ═══════════════════════════════════════════════════════════════════════

    fn stop_carousel(&mut self, svc: &mut Services) {
        self.scheduler.cancel_slot(&mut self.carousel);
        for ticket in self.highlight_tickets.drain(..) {
            svc.presenter.stop(ticket);
        }
        self.award_index.clear();
        self.award_cursor = 0;
    }

    /// Drop every running symbol effect
    pub fn clear_all_effect(&mut self, svc: &mut Services) {
        self.stop_carousel(svc);
        for tickets in &mut self.fly_tickets {
            tickets.clear();
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // REEL HOOKS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn start_near_win(&mut self, svc: &mut Services, column: usize) {
        if column >= MAIN_COLUMN {
            return;
        }
        self.is_near_winning = true;
        let green_ball = self.first_reel_feature;
        self.near_win_cues[column] = Some(svc.presenter.play(Cue::NearWin { column, green_ball }));
        let key = if green_ball {
            audio::GREEN_BALL_NEAR_WIN
        } else {
            audio::SCATTER_NEAR_WIN
        };
        self.near_win_sounds[column] = Some(svc.audio.play(key));
    }

    pub fn stop_near_win(&mut self, svc: &mut Services, column: usize) {
        let Some(ticket) = self.near_win_cues.get_mut(column).and_then(Option::take) else {
            return;
        };
        svc.presenter.stop(ticket);
        if let Some(handle) = self.near_win_sounds.get_mut(column).and_then(Option::take) {
            svc.audio.stop(handle);
        }
    }

    pub fn reel_stop_effect(&mut self, svc: &mut Services, column: usize, hard_stop: bool) {
        for row in 0..MAIN_ROW {
            if self.plate.symbol_at(column, row) == Some(Symbol::Scatter) {
                svc.presenter.play(Cue::PhaseHint { channel: PURPLE });
                svc.presenter.play(Cue::ScatterLand { column, row });
            }
        }

        if (self.turbo || hard_stop) && !self.is_near_winning {
            if self.play_sound_once {
                return;
            }
            self.play_sound_once = true;
            let remaining: Vec<&str> = self
                .reel_stop_sounds
                .iter()
                .skip(column)
                .flatten()
                .copied()
                .collect();
            for key in STOP_SOUNDS {
                if remaining.contains(&key) {
                    svc.audio.play(key);
                }
            }
        } else {
            match self.reel_stop_sounds.get(column) {
                Some(keys) if !keys.is_empty() => {
                    for key in keys {
                        svc.audio.play(key);
                    }
                }
                _ => {
                    svc.audio.play(audio::REEL_STOP);
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LINE AWARDS
    // ═══════════════════════════════════════════════════════════════════════

    /// LINES_OF_A_KIND once when any line connects all five reels
    fn five_line(&mut self, svc: &mut Services) {
        if self.plate.line_award_list.iter().any(|a| a.conn == 5) {
            let bet = svc.bar.bet();
            svc.presenter.emit(GameEvent::LinesOfAKind {
                bet,
                win: self.plate.plate_win,
            });
        }
    }

    /// Entry 0 holds every winning cell column-major, entry k+1 line k
    pub fn build_award_index(&self) -> Vec<Vec<(usize, usize)>> {
        let mut index = vec![Vec::new()];
        let mut shown = [[false; MAIN_ROW]; MAIN_COLUMN];
        for award in &self.plate.line_award_list {
            let Some(line) = LINE_TABLE_30.get(award.line as usize) else {
                log::warn!("[Effect] award on unknown line {}", award.line);
                index.push(Vec::new());
                continue;
            };
            let conn = (award.conn as usize).min(MAIN_COLUMN);
            let cells: Vec<(usize, usize)> = (0..conn).map(|column| (column, line[column])).collect();
            for &(column, row) in &cells {
                shown[column][row] = true;
            }
            index.push(cells);
        }
        for (column, rows) in shown.iter().enumerate() {
            for (row, hit) in rows.iter().enumerate() {
                if *hit {
                    index[0].push((column, row));
                }
            }
        }
        index
    }

    fn show_symbol_line(&mut self, svc: &mut Services) {
        svc.audio.play(audio::SYMBOL_AWARD);
        self.award_index = self.build_award_index();
        self.award_cursor = 0;
        self.show_next_award(svc);
        let interval = self.timing.line_cycle_interval;
        self.scheduler.cancel_slot(&mut self.carousel);
        self.carousel = Some(self.scheduler.repeat(interval, interval));
    }

    fn show_next_award(&mut self, svc: &mut Services) {
        for ticket in self.highlight_tickets.drain(..) {
            svc.presenter.stop(ticket);
        }
        let Some(cells) = self.award_index.get(self.award_cursor).cloned() else {
            return;
        };
        for &(column, row) in &cells {
            if let Some(symbol) = self.plate.symbol_at(column, row) {
                if symbol.is_special() {
                    let ticket = svc.presenter.play(Cue::SymbolAward { column, row, symbol });
                    self.highlight_tickets.push(ticket);
                }
            }
        }
        let ticket = svc.presenter.play(Cue::LineHighlight {
            index: self.award_cursor,
            cells,
        });
        self.highlight_tickets.push(ticket);
        self.award_cursor = (self.award_cursor + 1) % self.award_index.len();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // FEATURE PIECES
    // ═══════════════════════════════════════════════════════════════════════

    /// Purple panel win; the level drops to zero once the animation ends
    fn play_phase_win(&mut self, svc: &mut Services) {
        svc.audio.play(audio::PHASE_WIN);
        let ticket = svc.presenter.play(Cue::PhaseWin { channel: PURPLE });
        self.spawned.push(
            EffectSeq::new("phase_win_reset")
                .until("phase_win", move |_, svc| svc.presenter.is_done(ticket))
                .call("reset", |core, _| {
                    core.phase[PURPLE] = 0;
                    core.pre_phase[PURPLE] = 0;
                }),
        );
    }

    fn mg_to_feature_action(&mut self, svc: &mut Services) {
        self.jackpot.set_fake_jp_value(svc);
        svc.bar.set_deviation(true);
        svc.bar.reset_win();
        svc.audio.play(audio::RING);
        self.clear_all_effect(svc);
    }

    fn swap_to_fg_board(&mut self, svc: &mut Services) {
        svc.presenter.emit(GameEvent::ReelText { fg: true });
        let board = PlateData {
            plate: fg_init_plate(),
            ..Default::default()
        };
        self.set_board(&board);
        self.requests.push(ReelRequest::SetProtectSymbol);
        self.requests.push(ReelRequest::ChangeOutsideSymbol);
        self.requests.push(ReelRequest::ForceSetData(board));
        svc.presenter.play(Cue::Background { fg: true });
        svc.presenter.emit(GameEvent::FgRounds {
            spun: 0,
            total: FG_BASE_ROUND,
        });
        svc.presenter.play(Cue::ReelSkin { fg: true });
    }

    /// Free game state without the show, for a reconnect into a running FG
    fn apply_fg_enter_state(&mut self, svc: &mut Services) {
        svc.presenter.emit(GameEvent::ReelText { fg: true });
        self.jackpot.set_fake_jp_value(svc);
        svc.bar.set_deviation(true);
        svc.audio.play_bgm(audio::FG_BGM);
        svc.presenter.play(Cue::Background { fg: true });
        svc.presenter.emit(GameEvent::FgRounds {
            spun: self.fg_spinned,
            total: self.total_free_round,
        });
        svc.presenter.play(Cue::ReelSkin { fg: true });
    }

    fn swap_to_mg_board(&mut self, svc: &mut Services) {
        svc.presenter.emit(GameEvent::ReelText { fg: false });
        self.clear_all_effect(svc);
        let board = self.saved_mg_plate.clone().unwrap_or_else(|| PlateData {
            plate: fallback_plate(),
            ..Default::default()
        });
        self.set_board(&board);
        self.requests.push(ReelRequest::SetProtectSymbol);
        self.requests.push(ReelRequest::ChangeOutsideSymbol);
        self.requests.push(ReelRequest::ForceSetData(board));
    }

    fn reset_fg_ani(&mut self, svc: &mut Services) {
        self.jackpot.jp_run(svc);
        svc.presenter.emit(GameEvent::FgRounds {
            spun: 0,
            total: FG_BASE_ROUND,
        });
        svc.presenter.play(Cue::ReelSkin { fg: self.in_fg });
        svc.presenter.play(Cue::Background { fg: self.in_fg });
        svc.bar.set_deviation(false);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SEQUENCES
    // ═══════════════════════════════════════════════════════════════════════

    /// Launch every collection flight of the board
    fn launch_flights(&mut self, svc: &mut Services) {
        let mut launched = false;
        for (column, rows) in self.cells.iter().enumerate() {
            for (row, cell) in rows.iter().enumerate() {
                let Some(channel) = collect_channel(cell.symbol) else {
                    continue;
                };
                let path = random_bezier(
                    svc.rng.as_mut(),
                    cell_point(column, row),
                    PHASE_ANCHORS[channel],
                );
                let ticket = svc.presenter.play(Cue::SymbolFly {
                    column,
                    row,
                    channel,
                    path,
                });
                self.fly_tickets[channel].push(ticket);
                launched = true;
            }
        }
        if launched {
            svc.audio.play(audio::SCATTER_FLY);
        }
    }

    /// Phase animation for one channel, gated on its flights. `None` when
    /// the channel collected nothing.
    fn collect_sequence(&mut self, svc: &mut Services, channel: usize) -> Option<EffectSeq> {
        if self.collect_count[channel] == 0 {
            return None;
        }
        let now = self.phase[channel];
        let pre = self.pre_phase[channel];
        let level_up = now > pre;
        let fake = !level_up && now >= 4 && svc.roll_percent(self.fake_upgrade_percent);

        let fly_total = self.timing.fly_time + self.timing.fly_destroy_time;
        let mut delay = if level_up || fake { fly_total } else { 0.0 };
        if self.in_fg && self.fg_spinned == self.total_free_round {
            delay = fly_total;
        }

        self.spawned.push(
            EffectSeq::new("phase_hint")
                .wait("fly", self.timing.fly_time)
                .call("hint", move |core, svc| {
                    svc.presenter.play(Cue::PhaseHint { channel });
                    if !core.collect_sound_once {
                        core.collect_sound_once = true;
                        svc.audio.play(audio::PHASE_COLLECT);
                    }
                }),
        );

        let mut seq = EffectSeq::new("collect")
            .wait("delay", delay)
            .until("fly", move |core, svc| {
                core.fly_tickets[channel]
                    .iter()
                    .all(|ticket| svc.presenter.is_done(*ticket))
            });

        if level_up && now >= MAX_PHASE_LEVEL {
            for level in pre..MAX_PHASE_LEVEL {
                seq = seq
                    .call("level_up", move |core, svc| {
                        svc.audio.play(audio::phase_level_up(level));
                        core.phase_tickets[channel] = svc.presenter.play(Cue::PhaseLevelUp {
                            channel,
                            from: level,
                            to: level + 1,
                        });
                    })
                    .until("level_up_done", move |core, svc| {
                        svc.presenter.is_done(core.phase_tickets[channel])
                    });
            }
        } else if level_up {
            seq = seq
                .call("level_up", move |core, svc| {
                    svc.audio.play(audio::phase_level_up(pre));
                    core.phase_tickets[channel] = svc.presenter.play(Cue::PhaseLevelUp {
                        channel,
                        from: pre,
                        to: now,
                    });
                    svc.presenter.play(Cue::CharacterLevelUp);
                })
                .until("level_up_done", move |core, svc| {
                    svc.presenter.is_done(core.phase_tickets[channel])
                });
        } else if fake {
            seq = seq
                .call("fake_upgrade", move |core, svc| {
                    svc.audio.play(audio::phase_level_up(now));
                    svc.audio.play(audio::PHASE_UP_FAIL);
                    core.phase_tickets[channel] =
                        svc.presenter.play(Cue::PhaseFakeUpgrade { channel, level: now });
                })
                .until("fake_upgrade_done", move |core, svc| {
                    svc.presenter.is_done(core.phase_tickets[channel])
                });
        }
        Some(seq)
    }

    /// Roll-up, big win, then the credit update (main game only)
    fn run_score_sequence(&self) -> EffectSeq {
        let win = self.round_win;
        let in_fg = self.in_fg;
        let declare = move |_: &mut EffectCore, svc: &mut Services| {
            let bet = svc.bar.bet();
            svc.big_win.declare(bet, win);
        };

        if self.turbo && !in_fg {
            EffectSeq::new("run_score")
                .call("set_win", move |_, svc| svc.bar.set_win(win))
                .wait("turbo_delay", self.timing.turbo_win_delay)
                .call("big_win", declare)
                .until("big_win_done", |_, svc| svc.big_win.is_done())
                .call("credit", move |_, svc| svc.bar.credit(win))
        } else {
            EffectSeq::new("run_score")
                .call("roll", move |_, svc| {
                    let from = svc.bar.win();
                    svc.roller.start(from, from + win);
                })
                .until("roll_done", |_, svc| svc.roller.is_done())
                .call("set_win", move |_, svc| {
                    let target = svc.bar.win() + win;
                    svc.bar.set_win(target);
                })
                .call("big_win", declare)
                .until("big_win_done", |_, svc| svc.big_win.is_done())
                .call("credit", move |_, svc| {
                    if !in_fg {
                        svc.bar.credit(win);
                    }
                })
        }
    }

    fn add_spins_sequence(&self) -> EffectSeq {
        EffectSeq::new("add_spins")
            .call("phase_win", |core, svc| core.play_phase_win(svc))
            .wait("phase_win_lead", self.timing.phase_win_callback)
            .call("character_win", |core, svc| {
                core.cue_ticket = svc.presenter.play(Cue::CharacterWin);
            })
            .until("character_win_done", |core, svc| svc.presenter.is_done(core.cue_ticket))
            .call("add_spins", |core, svc| {
                svc.audio.play(audio::RING);
                core.cue_ticket = svc.presenter.play(Cue::AddSpins {
                    count: core.add_spin_count,
                });
            })
            .until("add_spins_done", |core, svc| svc.presenter.is_done(core.cue_ticket))
            .call("rounds", |core, svc| {
                svc.audio.play(audio::FG_ADD_SPIN);
                svc.presenter.emit(GameEvent::FgRounds {
                    spun: core.fg_spinned,
                    total: core.total_free_round,
                });
            })
            .wait("settle", self.timing.add_spins_settle)
            .call("idle", |core, _| core.next_state = Some(EffectState::Idle))
    }

    fn fg_enter_sequence(&self) -> EffectSeq {
        EffectSeq::new("fg_enter")
            .wait("delay", self.timing.fg_enter_delay)
            .call("feature_action", |core, svc| core.mg_to_feature_action(svc))
            .call("phase_win", |core, svc| core.play_phase_win(svc))
            .wait("phase_win_lead", self.timing.phase_win_callback)
            .call("character_win", |core, svc| {
                core.cue_ticket = svc.presenter.play(Cue::CharacterWin);
            })
            .until("character_win_done", |core, svc| svc.presenter.is_done(core.cue_ticket))
            .call("declare", |core, svc| {
                svc.audio.stop_bgm();
                core.declare_sound = Some(svc.audio.play(audio::FG_DECLARE));
                core.cue_ticket = svc.presenter.play(Cue::FgDeclare {
                    auto: core.is_auto_play,
                });
            })
            .until("dismiss", |core, svc| svc.presenter.is_done(core.cue_ticket))
            .call("board_swap", |core, svc| {
                if let Some(handle) = core.declare_sound.take() {
                    svc.audio.stop(handle);
                }
                core.swap_to_fg_board(svc);
            })
            .call("declare_end", |core, svc| {
                svc.audio.play(audio::FG_DECLARE_END);
                core.cue_ticket = svc.presenter.play(Cue::FgDeclareEnd);
            })
            .until("declare_end_done", |core, svc| svc.presenter.is_done(core.cue_ticket))
            .call("bgm", |core, svc| {
                svc.audio.play_bgm(audio::FG_BGM);
                core.next_state = Some(EffectState::Idle);
            })
    }

    fn fg_leave_sequence(&self) -> EffectSeq {
        let end_sound_delay = self.timing.compliment_end_sound_delay;
        EffectSeq::new("fg_leave")
            .call("compliment", |core, svc| {
                svc.audio.stop_bgm();
                svc.audio.play(audio::FG_COMPLIMENT_START);
                core.cue_ticket = svc.presenter.play(Cue::FgCompliment {
                    total: core.fg_total_win,
                    auto: core.is_auto_play,
                });
                svc.roller.start(Credits::ZERO, core.fg_total_win);
            })
            .until("dismiss", |core, svc| svc.presenter.is_done(core.cue_ticket))
            .call("finish_roll", |_, svc| {
                if !svc.roller.is_done() {
                    svc.roller.skip();
                }
            })
            .wait("compliment_wait", self.timing.compliment_wait)
            .call("compliment_end", move |core, svc| {
                core.cue_ticket = svc.presenter.play(Cue::FgComplimentEnd);
                core.spawned.push(
                    EffectSeq::new("compliment_end_sound")
                        .wait("delay", end_sound_delay)
                        .call("sound", |_, svc| {
                            svc.audio.play(audio::FG_COMPLIMENT_END);
                        }),
                );
                core.reset_fg_ani(svc);
            })
            .wait("board_swap_delay", self.timing.compliment_board_swap)
            .call("board_swap", |core, svc| core.swap_to_mg_board(svc))
            .until("compliment_end_done", |core, svc| svc.presenter.is_done(core.cue_ticket))
            .call("payout", |core, svc| {
                let total = core.fg_total_win;
                log::info!("[Effect] free game total {total}");
                svc.presenter.emit(GameEvent::LeaveFreeGame);
                let bet = svc.bar.bet();
                svc.bar.feature_game_end(bet, total);
                svc.bar.credit(total);
                core.reset_fg_parameter();
                core.next_state = Some(EffectState::Idle);
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW
// ═══════════════════════════════════════════════════════════════════════════════

pub struct EffectView {
    core: EffectCore,
    state: StateMachine<EffectState>,
    settle: Option<TimerHandle>,
    settle_to: EffectState,
    line_decided: bool,
    collect: [Option<EffectSeq>; 2],
    run_score: Option<EffectSeq>,
    choreography: Option<EffectSeq>,
    omen: Option<EffectSeq>,
    background: Vec<EffectSeq>,
    opening: Option<CueTicket>,
}

fn tick_slot(slot: &mut Option<EffectSeq>, core: &mut EffectCore, svc: &mut Services, dt: f32) {
    if let Some(seq) = slot {
        if seq.tick(core, svc, dt).is_done() {
            *slot = None;
        }
    }
}

impl EffectView {
    pub fn new(config: &SlotConfig) -> Self {
        Self {
            core: EffectCore::new(config),
            state: StateMachine::new("Effect", EffectState::Idle),
            settle: None,
            settle_to: EffectState::Idle,
            line_decided: false,
            collect: [None, None],
            run_score: None,
            choreography: None,
            omen: None,
            background: Vec::new(),
            opening: None,
        }
    }

    pub fn core(&self) -> &EffectCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    pub fn state(&self) -> EffectState {
        self.state.current()
    }

    pub fn is_show_end(&self) -> bool {
        self.core.is_show_end
    }

    pub fn is_near_winning(&self) -> bool {
        self.core.is_near_winning
    }

    pub fn set_near_winning(&mut self, near_winning: bool) {
        self.core.is_near_winning = near_winning;
    }

    pub fn has_line_awards(&self) -> bool {
        self.core.has_line_awards
    }

    pub fn is_omen_playing(&self) -> bool {
        self.omen.is_some()
    }

    /// Reel work requested by finished steps
    pub fn take_reel_requests(&mut self) -> Vec<ReelRequest> {
        std::mem::take(&mut self.core.requests)
    }

    pub fn binding<'a>(&'a mut self, svc: &'a mut Services) -> EffectBinding<'a> {
        EffectBinding { effect: self, svc }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ENTRY POINTS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn mg_reset_parameter(&mut self, svc: &mut Services, turbo: bool) {
        self.core.turbo = turbo;
        self.core.reset_round(svc);
    }

    pub fn fg_reset_parameter(&mut self, svc: &mut Services, turbo: bool) {
        self.core.turbo = turbo;
        self.core.reset_round(svc);
    }

    /// Spin start flourish
    pub fn reel_spin_ani(&mut self, svc: &mut Services) {
        svc.presenter.play(Cue::ReelSkin { fg: self.core.in_fg });
        svc.audio.play(audio::REEL_SPIN);
    }

    /// Start the award show of a main-game round
    pub fn mg_show_collect(&mut self, turbo: bool) {
        self.core.is_show_end = false;
        self.core.turbo = turbo;
        self.state.transit(EffectState::MgFgCollect);
    }

    pub fn fg_show_collect(&mut self) {
        self.core.is_show_end = false;
        self.state.transit(EffectState::MgFgCollect);
    }

    /// Back in the main game
    pub fn mg_show_enter(&mut self, svc: &mut Services) {
        svc.presenter.emit(GameEvent::ReelText { fg: false });
        svc.audio.play_bgm(audio::MG_BGM);
    }

    pub fn fg_show_enter(&mut self, svc: &mut Services, auto: bool, skip: bool) {
        self.core.is_auto_play = auto;
        self.core.is_show_end = false;
        self.core.skip_show_enter = skip;
        if self.core.in_fg {
            self.state.transit(EffectState::Idle);
        } else {
            svc.presenter.emit(GameEvent::ReelText { fg: true });
            self.state.transit(EffectState::FgEnter);
        }
    }

    pub fn fg_show_leave(&mut self) {
        self.core.is_show_end = false;
        self.state.transit(EffectState::FgLeave);
    }

    /// Opening movie unless already seen today or resuming a session
    pub fn mg_opening(&mut self, svc: &mut Services, reconnecting: bool) {
        self.opening = None;
        if reconnecting || svc.presenter.intro_seen_today() {
            return;
        }
        self.opening = Some(svc.presenter.play(Cue::Intro { skip_to: None }));
    }

    pub fn skip_intro(&mut self, svc: &mut Services) {
        if let Some(ticket) = self.opening.take() {
            svc.presenter.stop(ticket);
            self.opening = Some(svc.presenter.play(Cue::Intro {
                skip_to: Some(self.core.timing.intro_skip_to),
            }));
        }
    }

    pub fn is_opening_done(&self, svc: &Services) -> bool {
        self.opening.is_none_or(|ticket| svc.presenter.is_done(ticket))
    }

    pub fn show_mg_omen(&mut self, svc: &mut Services) {
        log::info!("[Effect] main game omen");
        svc.audio.play(audio::OMEN);
        self.omen = Some(
            EffectSeq::new("omen")
                .call("start", |core, svc| {
                    core.omen_ticket = svc.presenter.play(Cue::Omen);
                    svc.presenter.play(Cue::CharacterWin);
                })
                .until("omen_done", |core, svc| svc.presenter.is_done(core.omen_ticket)),
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TICK
    // ═══════════════════════════════════════════════════════════════════════

    pub fn tick(&mut self, svc: &mut Services, dt: f32) {
        if self.state.update().is_some() {
            self.core.scheduler.cancel_slot(&mut self.settle);
        }
        let current = self.state.current();
        if self.state.is_entering() {
            self.on_enter(svc, current);
        } else {
            self.on_update(current);
        }

        let core = &mut self.core;
        for slot in &mut self.collect {
            tick_slot(slot, core, svc, dt);
        }
        tick_slot(&mut self.run_score, core, svc, dt);
        tick_slot(&mut self.choreography, core, svc, dt);
        tick_slot(&mut self.omen, core, svc, dt);
        self.background
            .retain_mut(|seq| !seq.tick(core, svc, dt).is_done());
        self.background.append(&mut core.spawned);

        for handle in core.scheduler.advance(dt) {
            if core.carousel == Some(handle) {
                core.show_next_award(svc);
            } else if self.settle == Some(handle) {
                self.settle = None;
                self.state.transit(self.settle_to);
            }
        }
        if let Some(next) = core.next_state.take() {
            self.state.transit(next);
        }
    }

    fn on_enter(&mut self, svc: &mut Services, state: EffectState) {
        log::debug!("[Effect] enter {state:?}");
        match state {
            EffectState::Idle => {
                self.core.is_show_end = true;
            }
            EffectState::MgFgCollect => {
                self.core.launch_flights(svc);
                for channel in [PURPLE, GREEN] {
                    self.collect[channel] = self.core.collect_sequence(svc, channel);
                }
            }
            EffectState::MgShowSymbolLineEffect | EffectState::FgShowSymbolLineEffect => {
                self.line_decided = false;
                if !self.core.round_win.is_zero() {
                    self.core.has_line_awards = true;
                    self.core.five_line(svc);
                    self.core.show_symbol_line(svc);
                    self.run_score = Some(self.core.run_score_sequence());
                }
            }
            EffectState::FgShowAddSpins => {
                self.choreography = Some(self.core.add_spins_sequence());
            }
            EffectState::FgEnter => {
                self.core.in_fg = true;
                self.core.stop_carousel(svc);
                self.core.requests.push(ReelRequest::SetGameMode { in_fg: true });
                if self.core.skip_show_enter {
                    self.core.skip_show_enter = false;
                    self.core.apply_fg_enter_state(svc);
                    self.state.transit(EffectState::Idle);
                } else {
                    self.choreography = Some(self.core.fg_enter_sequence());
                }
            }
            EffectState::FgLeave => {
                self.core.in_fg = false;
                self.core.requests.push(ReelRequest::SetGameMode { in_fg: false });
                self.choreography = Some(self.core.fg_leave_sequence());
            }
        }
    }

    fn on_update(&mut self, state: EffectState) {
        match state {
            EffectState::MgFgCollect => {
                if self.collect.iter().all(Option::is_none) {
                    self.state.transit(if self.core.in_fg {
                        EffectState::FgShowSymbolLineEffect
                    } else {
                        EffectState::MgShowSymbolLineEffect
                    });
                }
            }
            EffectState::MgShowSymbolLineEffect | EffectState::FgShowSymbolLineEffect => {
                if self.line_decided || self.run_score.is_some() {
                    return;
                }
                self.line_decided = true;
                let in_fg_line = state == EffectState::FgShowSymbolLineEffect;
                let after = if in_fg_line && self.core.has_add_spin {
                    EffectState::FgShowAddSpins
                } else {
                    EffectState::Idle
                };
                if self.core.turbo && !self.core.round_win.is_zero() {
                    self.arm_settle(self.core.timing.turbo_settle, after);
                } else if after == EffectState::FgShowAddSpins {
                    self.state.transit(after);
                } else {
                    let delay = if self.core.first_reel_feature {
                        self.core.timing.feature_settle
                    } else {
                        self.core.timing.normal_settle
                    };
                    self.arm_settle(delay, EffectState::Idle);
                }
            }
            _ => {}
        }
    }

    fn arm_settle(&mut self, delay: f32, to: EffectState) {
        self.core.scheduler.cancel_slot(&mut self.settle);
        self.settle_to = to;
        self.settle = Some(self.core.scheduler.once(delay));
    }
}

/// [`EffectSink`] over the view plus the services it needs
pub struct EffectBinding<'a> {
    pub effect: &'a mut EffectView,
    pub svc: &'a mut Services,
}

impl EffectSink for EffectBinding<'_> {
    fn start_near_win(&mut self, column: usize) {
        self.effect.core.start_near_win(self.svc, column);
    }

    fn stop_near_win(&mut self, column: usize) {
        self.effect.core.stop_near_win(self.svc, column);
    }

    fn reel_stop_effect(&mut self, column: usize, hard_stop: bool) {
        self.effect.core.reel_stop_effect(self.svc, column, hard_stop);
    }

    fn show_mg_omen(&mut self) {
        self.effect.show_mg_omen(self.svc);
    }

    fn is_omen_playing(&self) -> bool {
        self.effect.is_omen_playing()
    }
}
