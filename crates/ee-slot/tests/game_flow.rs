//! Game-flow integration tests
//!
//! Drives a full `GameView` over recording collaborators with a scripted
//! server that answers each spin request with the next queued ack:
//! - Boot, manual and auto rounds
//! - Award shows with and without line wins
//! - Spin guard outside IDLE
//! - Free game round trip and reconnect
//! - Jackpot lock replay

use std::collections::VecDeque;

use ee_core::Credits;
use ee_protocol::{
    AckType, BetLockChange, BetLockStatus, BetSettingAck, GameInfoAck, GamePlayType, Inbound,
    LineAward, Outbound, PlateData, SpinAck, SpinState, Symbol, UnlockType,
};
use ee_slot::define::fallback_plate;
use ee_slot::mock::{self, Journal};
use ee_slot::{
    AutoPlay, Cue, EffectState, FlowState, GameEvent, GameView, ReelAdapter, SlotConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const DT: f32 = 1.0 / 60.0;

struct Table {
    game: GameView,
    journal: Journal,
    answered: usize,
    script: VecDeque<Inbound>,
}

impl Table {
    fn new(config: SlotConfig) -> Self {
        let reel = ReelAdapter::with_rng(
            &config,
            &fallback_plate(),
            Box::new(ChaCha8Rng::seed_from_u64(77)),
        );
        let (svc, journal) = mock::services(3);
        journal.borrow_mut().intro_seen = true;
        Self {
            game: GameView::new(&config, svc, Box::new(reel)),
            journal,
            answered: 0,
            script: VecDeque::new(),
        }
    }

    fn quiet() -> Self {
        let mut config = SlotConfig::egypt_eternal();
        config.omen_percent = 0;
        Self::new(config)
    }

    fn boot(&mut self) {
        self.game.init_bind();
        self.game.on_command(&Inbound::GameInfoAck(GameInfoAck {
            bet: Credits(100),
            phase: vec![0, 0],
            ..Default::default()
        }));
        assert!(self.run_until(120, |t| t.game.state() == FlowState::Idle));
    }

    /// One frame, then answer any new spin request
    fn step(&mut self) {
        self.game.main_process(DT);
        let sent = self.journal.borrow().sent.len();
        while self.answered < sent {
            let request = self.journal.borrow().sent[self.answered];
            self.answered += 1;
            if matches!(request, Outbound::GameInfoReq) {
                continue;
            }
            if let Some(ack) = self.script.pop_front() {
                self.game.on_command(&ack);
            }
        }
    }

    fn run_until(&mut self, frames: usize, done: impl Fn(&Table) -> bool) -> bool {
        for _ in 0..frames {
            self.step();
            if done(self) {
                return true;
            }
        }
        false
    }

    fn events(&self, event: &GameEvent) -> usize {
        self.journal.borrow().event_count(|e| e == event)
    }

    fn spin_requests(&self) -> usize {
        self.journal
            .borrow()
            .sent
            .iter()
            .filter(|r| matches!(r, Outbound::SpinReq(_)))
            .count()
    }
}

fn board(columns: [[Symbol; 4]; 5]) -> PlateData {
    PlateData {
        plate: columns.iter().map(|c| c.to_vec()).collect(),
        phase: vec![0, 0],
        ..Default::default()
    }
}

fn filler() -> [[Symbol; 4]; 5] {
    [[Symbol::A, Symbol::K, Symbol::Q, Symbol::J]; 5]
}

fn ack(plate: PlateData) -> SpinAck {
    SpinAck {
        ack_type: AckType::Success,
        jp_info: vec![Credits(1000); 5],
        plate_data: Some(plate),
        common: None,
    }
}

fn five_of_a_kind() -> PlateData {
    let mut data = board([[Symbol::A; 4]; 5]);
    data.line_award_list = vec![LineAward {
        symbol: Symbol::A,
        line: 0,
        conn: 5,
        win: Credits(500),
    }];
    data.award_type_flag = 1 << 1;
    data.plate_win = Credits(500);
    data
}

// ═══════════════════════════════════════════════════════════════════════════════
// AWARD SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_scatter_board_without_lines_skips_roll_up() {
    let mut table = Table::quiet();
    table.boot();
    let mut cols = filler();
    cols[2][1] = Symbol::Scatter;
    table.script.push_back(Inbound::SpinAck(ack(board(cols))));
    assert!(table.game.on_spin_btn_click());
    let mut states = vec![table.game.effect().state()];
    for _ in 0..3000 {
        table.step();
        let state = table.game.effect().state();
        if states.last() != Some(&state) {
            states.push(state);
        }
        if table.events(&GameEvent::EnterIdle) == 2 {
            break;
        }
    }
    assert_eq!(
        states,
        vec![
            EffectState::Idle,
            EffectState::MgFgCollect,
            EffectState::MgShowSymbolLineEffect,
            EffectState::Idle,
        ]
    );
    let rec = table.journal.borrow();
    assert!(rec.roll_starts.is_empty());
    assert!(rec.big_wins.is_empty());
    assert_eq!(rec.bar.balance, Credits(1_000_000 - 100));
}

#[test]
fn test_five_of_a_kind_reported_once_and_paid() {
    let mut table = Table::quiet();
    table.boot();
    table.script.push_back(Inbound::SpinAck(ack(five_of_a_kind())));
    table.game.on_spin_btn_click();
    assert!(table.run_until(3000, |t| t.events(&GameEvent::EnterIdle) == 2));

    let lines = GameEvent::LinesOfAKind {
        bet: Credits(100),
        win: Credits(500),
    };
    assert_eq!(table.events(&lines), 1);
    let rec = table.journal.borrow();
    assert_eq!(rec.roll_starts, vec![(Credits::ZERO, Credits(500))]);
    assert_eq!(rec.bar.win, Credits(500));
    assert_eq!(rec.bar.balance, Credits(1_000_000 - 100 + 500));
    assert!(table.game.effect().has_line_awards());
}

#[test]
fn test_rejected_spin_lands_fallback_board() {
    let mut table = Table::quiet();
    table.boot();
    table.journal.borrow_mut().bar.auto_play = AutoPlay::Rounds(5);
    table.script.push_back(Inbound::SpinAck(SpinAck {
        ack_type: AckType::MoneyAbnormal,
        ..Default::default()
    }));
    table.game.on_spin_btn_click();
    assert!(table.run_until(3000, |t| t.events(&GameEvent::EnterIdle) == 2));
    assert_eq!(table.game.reel().visible_plate(), fallback_plate());
    assert_eq!(table.journal.borrow().bar.auto_play, AutoPlay::Off);
    assert_eq!(table.spin_requests(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPIN GUARD
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_spin_request_in_award_is_rejected() {
    let mut table = Table::quiet();
    table.boot();
    table.journal.borrow_mut().roll_polls = 120;
    table.journal.borrow_mut().bar.auto_play = AutoPlay::Rounds(3);
    table.script.push_back(Inbound::SpinAck(ack(five_of_a_kind())));
    table.script.push_back(Inbound::SpinAck(ack(board(filler()))));
    assert!(table.game.on_spin_btn_click());
    assert!(table.run_until(3000, |t| t.game.state() == FlowState::Award));

    assert!(!table.game.start_spin());
    assert_eq!(table.journal.borrow().bar.auto_play, AutoPlay::Off);
    for _ in 0..600 {
        table.step();
    }
    assert_eq!(table.game.state(), FlowState::Idle);
    assert_eq!(table.spin_requests(), 1);
    assert_eq!(table.journal.borrow().bar.auto_play, AutoPlay::Off);
}

#[test]
fn test_auto_play_chains_main_rounds() {
    let mut table = Table::quiet();
    table.boot();
    table.journal.borrow_mut().bar.auto_play = AutoPlay::Rounds(3);
    for _ in 0..3 {
        table.script.push_back(Inbound::SpinAck(ack(board(filler()))));
    }
    table.game.on_spin_btn_click();
    assert!(table.run_until(9000, |t| t.events(&GameEvent::EnterIdle) == 4));
    for _ in 0..60 {
        table.step();
    }
    assert_eq!(table.spin_requests(), 3);
    let rec = table.journal.borrow();
    assert_eq!(rec.bar.auto_play, AutoPlay::Off);
    assert_eq!(rec.bar.balance, Credits(1_000_000 - 300));
}

// ═══════════════════════════════════════════════════════════════════════════════
// FREE GAME
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_free_game_round_trip() {
    let mut config = SlotConfig::egypt_eternal();
    config.omen_percent = 0;
    config.feature_autoplay_delay = 0.5;
    let mut table = Table::new(config);
    table.boot();
    table.journal.borrow_mut().bar.auto_play = AutoPlay::Rounds(10);

    let mut cols = filler();
    cols[0][0] = Symbol::Scatter;
    cols[2][1] = Symbol::Scatter;
    cols[4][2] = Symbol::Scatter;
    let mut trigger = board(cols);
    trigger.remain_free_round = 3;
    trigger.phase = vec![3, 0];
    trigger.award_type_flag = 1 << 2;
    table.script.push_back(Inbound::SpinAck(ack(trigger)));
    for remain in [2, 1, 0] {
        let mut data = board(filler());
        data.remain_free_round = remain;
        data.plate_win = Credits(100);
        table.script.push_back(Inbound::FreeSpinAck(ack(data)));
    }
    table.script.push_back(Inbound::SpinAck(ack(board(filler()))));

    table.game.on_spin_btn_click();
    let mut purple = table.game.effect().core().phase[0];
    let mut purple_resets = 0;
    let mut saw_free = false;
    let mut auto_in_free = Vec::new();
    for _ in 0..20000 {
        table.step();
        let now = table.game.effect().core().phase[0];
        if purple > 0 && now == 0 {
            purple_resets += 1;
        }
        purple = now;
        if table.game.current_game() == GamePlayType::Free {
            saw_free = true;
            if table.game.state() == FlowState::Spin {
                auto_in_free.push(table.journal.borrow().bar.auto_play);
            }
        } else if saw_free {
            break;
        }
    }
    assert!(saw_free);
    assert!(!auto_in_free.is_empty());
    assert_eq!(table.game.current_game(), GamePlayType::Main);
    assert!(auto_in_free.iter().all(|a| *a == AutoPlay::Infinite));
    assert_eq!(purple_resets, 1);
    {
        let rec = table.journal.borrow();
        let free_requests = rec
            .sent
            .iter()
            .filter(|r| matches!(r, Outbound::FreeSpinReq(_)))
            .count();
        assert_eq!(free_requests, 3);
        assert_eq!(rec.bar.feature_ends, vec![(Credits(100), Credits(300))]);
        assert_eq!(rec.bar.balance, Credits(1_000_000 - 100 + 300));
        assert_eq!(rec.bar.auto_play, AutoPlay::Rounds(9));
        assert_eq!(rec.cue_count(|c| matches!(c, Cue::FgDeclare { auto: true })), 1);
    }

    assert!(table.run_until(600, |t| t.events(&GameEvent::LeaveFeatureToMainIdle) == 1
        && t.spin_requests() == 2));
    for _ in 0..300 {
        table.step();
    }
    assert_eq!(table.events(&GameEvent::LeaveFeatureToMainIdle), 1);
    assert_eq!(table.events(&GameEvent::LeaveFreeGame), 1);
    assert!(!table.game.effect().core().in_fg);
}

#[test]
fn test_reconnect_inside_free_game() {
    let mut table = Table::quiet();
    let mut main = board(filler());
    main.plate[1][1] = Symbol::Scatter;
    let mut last = board(filler());
    last.plate[3][2] = Symbol::Wild;
    last.remain_free_round = 3;
    table.game.on_command(&Inbound::GameInfoAck(GameInfoAck {
        spin_state: SpinState::FgSpin,
        bet: Credits(500),
        phase: vec![2, 1],
        main_plate: Some(main.clone()),
        last_plate: Some(last.clone()),
        fg_spinned: 4,
        current_free_win: Credits(800),
        ..Default::default()
    }));

    assert!(table.game.is_reconnecting());
    assert!(table.game.is_feature_transit_skip());
    let core = table.game.effect().core();
    assert_eq!(core.saved_mg_plate(), Some(&main));
    assert_eq!(core.plate(), &last);
    assert_eq!(core.total_free_round, 3 + 4);
    assert_eq!(core.fg_spinned, 4);
    assert_eq!(core.fg_total_win, Credits(800));
    assert_eq!(table.game.reel().visible_plate(), last.plate);

    assert!(table.run_until(600, |t| t.game.state() == FlowState::Idle
        && t.game.current_game() == GamePlayType::Free));
    assert!(!table.game.is_reconnecting());
    assert!(!table.game.is_feature_transit_skip());
    assert!(table.game.effect().core().in_fg);
    let rec = table.journal.borrow();
    assert_eq!(rec.cue_count(|c| matches!(c, Cue::FgDeclare { .. })), 0);
    assert_eq!(rec.bar.win, Credits(800));
    assert_eq!(rec.bar.bet, Credits(500));
    assert_eq!(rec.bar.auto_play, AutoPlay::Infinite);
    assert!(rec.events.contains(&GameEvent::FgRounds { spun: 4, total: 7 }));
}

// ═══════════════════════════════════════════════════════════════════════════════
// JACKPOT LOCKS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_empty_lock_update_replay_is_idempotent() {
    let mut table = Table::quiet();
    table.boot();
    let lock_grand = BetSettingAck {
        lock_changes: vec![BetLockChange {
            unlock_type: UnlockType::Grand,
            last_status: BetLockStatus::Unlock,
            current_status: BetLockStatus::Lock,
            unlock_level: 0,
        }],
        ..Default::default()
    };
    table.game.on_command(&Inbound::BetSettingAck(lock_grand));
    let locks_before = table.game.effect().core().jackpot.locked();
    assert_eq!(locks_before, [false, false, false, false, true]);
    let cues_before = table
        .journal
        .borrow()
        .cue_count(|c| matches!(c, Cue::JpLock { .. }));

    for _ in 0..2 {
        table
            .game
            .on_command(&Inbound::BetSettingAck(BetSettingAck::default()));
        assert_eq!(table.game.effect().core().jackpot.locked(), locks_before);
    }
    let rec = table.journal.borrow();
    assert_eq!(rec.cue_count(|c| matches!(c, Cue::JpLock { .. })), cues_before);
    assert_eq!(rec.jp_locked, [false, false, false, false, true]);
}
