//! Recording collaborators
//!
//! In-memory implementations of every collaborator trait. Each one writes
//! into a shared [`Record`] so tests can assert on what the core asked for,
//! and the headless driver can replay it as log lines. Cue tickets and
//! roll-ups finish after a configurable number of polls.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ee_core::Credits;
use ee_protocol::{CommonSpinAck, Outbound};
use rand::{RngCore, SeedableRng};
use rand::rngs::StdRng;

use crate::collaborators::{
    AudioPlayer, AutoPlay, BigWinService, Cue, CueTicket, GameBar, GameEvent, GameService,
    JackpotDisplay, Presenter, Services, SoundHandle, SpinButton, WinRoller,
};

/// Shared handle to the record
pub type Journal = Rc<RefCell<Record>>;

/// Bet bar state as last set by the core
#[derive(Debug, Clone, PartialEq)]
pub struct BarState {
    pub bet: Credits,
    pub bet_table: Vec<Credits>,
    pub balance: Credits,
    pub win: Credits,
    pub bet_enabled: bool,
    pub spin_button: SpinButton,
    pub auto_play: AutoPlay,
    pub fast_mode: bool,
    pub saved_bet: Option<Credits>,
    pub deviation: bool,
    pub feature_ends: Vec<(Credits, Credits)>,
}

impl Default for BarState {
    fn default() -> Self {
        Self {
            bet: Credits(100),
            bet_table: vec![Credits(100), Credits(200), Credits(500), Credits(1000), Credits(5000)],
            balance: Credits(1_000_000),
            win: Credits::ZERO,
            bet_enabled: true,
            spin_button: SpinButton::Spin,
            auto_play: AutoPlay::Off,
            fast_mode: false,
            saved_bet: None,
            deviation: false,
            feature_ends: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Record {
    pub sounds: Vec<String>,
    pub stopped_sounds: Vec<SoundHandle>,
    pub bgm: Option<String>,
    pub cues: Vec<Cue>,
    pub stopped_cues: Vec<CueTicket>,
    pub events: Vec<GameEvent>,
    pub sent: Vec<Outbound>,
    pub common_acks: Vec<CommonSpinAck>,
    pub roll_starts: Vec<(Credits, Credits)>,
    pub roll_skips: usize,
    pub big_wins: Vec<(Credits, Credits)>,
    pub jp_values: [Credits; 5],
    pub jp_rolling: [bool; 5],
    pub jp_locked: [bool; 5],
    pub bar: BarState,
    pub intro_seen: bool,
    /// Polls before a cue ticket reports done
    pub cue_polls: u32,
    /// Polls before a roll-up reports done
    pub roll_polls: u32,
    next_id: u64,
    pending_cues: HashMap<u64, u32>,
    roll_left: u32,
}

impl Record {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn sound_count(&self, key: &str) -> usize {
        self.sounds.iter().filter(|s| s.as_str() == key).count()
    }

    pub fn cue_count(&self, pred: impl Fn(&Cue) -> bool) -> usize {
        self.cues.iter().filter(|c| pred(c)).count()
    }

    pub fn event_count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Drop everything recorded so far, keep the widget state
    pub fn clear_log(&mut self) {
        self.sounds.clear();
        self.stopped_sounds.clear();
        self.cues.clear();
        self.stopped_cues.clear();
        self.events.clear();
        self.sent.clear();
        self.roll_starts.clear();
        self.big_wins.clear();
    }
}

pub struct MockAudio(pub Journal);

impl AudioPlayer for MockAudio {
    fn play(&mut self, key: &str) -> SoundHandle {
        let mut rec = self.0.borrow_mut();
        rec.sounds.push(key.to_string());
        SoundHandle(rec.next_id())
    }

    fn stop(&mut self, handle: SoundHandle) {
        self.0.borrow_mut().stopped_sounds.push(handle);
    }

    fn play_bgm(&mut self, key: &str) {
        self.0.borrow_mut().bgm = Some(key.to_string());
    }

    fn stop_bgm(&mut self) {
        self.0.borrow_mut().bgm = None;
    }
}

pub struct MockPresenter(pub Journal);

impl Presenter for MockPresenter {
    fn play(&mut self, cue: Cue) -> CueTicket {
        let mut rec = self.0.borrow_mut();
        rec.cues.push(cue);
        let id = rec.next_id();
        let polls = rec.cue_polls;
        rec.pending_cues.insert(id, polls);
        CueTicket(id)
    }

    fn is_done(&self, ticket: CueTicket) -> bool {
        let mut rec = self.0.borrow_mut();
        match rec.pending_cues.get_mut(&ticket.0) {
            Some(0) | None => true,
            Some(left) => {
                *left -= 1;
                false
            }
        }
    }

    fn stop(&mut self, ticket: CueTicket) {
        let mut rec = self.0.borrow_mut();
        rec.pending_cues.remove(&ticket.0);
        rec.stopped_cues.push(ticket);
    }

    fn emit(&mut self, event: GameEvent) {
        self.0.borrow_mut().events.push(event);
    }

    fn intro_seen_today(&self) -> bool {
        self.0.borrow().intro_seen
    }
}

pub struct MockRoller(pub Journal);

impl WinRoller for MockRoller {
    fn start(&mut self, from: Credits, to: Credits) {
        let mut rec = self.0.borrow_mut();
        rec.roll_starts.push((from, to));
        rec.roll_left = rec.roll_polls;
    }

    fn is_done(&self) -> bool {
        let mut rec = self.0.borrow_mut();
        if rec.roll_left == 0 {
            true
        } else {
            rec.roll_left -= 1;
            false
        }
    }

    fn skip(&mut self) {
        let mut rec = self.0.borrow_mut();
        rec.roll_skips += 1;
        rec.roll_left = 0;
    }

    fn reset(&mut self) {
        self.0.borrow_mut().roll_left = 0;
    }
}

pub struct MockBigWin(pub Journal);

impl BigWinService for MockBigWin {
    fn declare(&mut self, bet: Credits, win: Credits) {
        self.0.borrow_mut().big_wins.push((bet, win));
    }

    fn is_done(&self) -> bool {
        true
    }
}

pub struct MockJackpot(pub Journal);

impl JackpotDisplay for MockJackpot {
    fn set_value(&mut self, slot: usize, value: Credits) {
        if let Some(v) = self.0.borrow_mut().jp_values.get_mut(slot) {
            *v = value;
        }
    }

    fn set_rolling(&mut self, slot: usize, rolling: bool) {
        if let Some(r) = self.0.borrow_mut().jp_rolling.get_mut(slot) {
            *r = rolling;
        }
    }

    fn set_locked(&mut self, slot: usize, locked: bool) {
        if let Some(l) = self.0.borrow_mut().jp_locked.get_mut(slot) {
            *l = locked;
        }
    }
}

pub struct MockBar(pub Journal);

impl GameBar for MockBar {
    fn bet(&self) -> Credits {
        self.0.borrow().bar.bet
    }

    fn set_bet(&mut self, bet: Credits) {
        self.0.borrow_mut().bar.bet = bet;
    }

    fn bet_table(&self) -> Vec<Credits> {
        self.0.borrow().bar.bet_table.clone()
    }

    fn set_bet_table(&mut self, table: Vec<Credits>) {
        self.0.borrow_mut().bar.bet_table = table;
    }

    fn can_bet(&self) -> bool {
        let rec = self.0.borrow();
        rec.bar.balance >= rec.bar.bet
    }

    fn set_bet_enabled(&mut self, enabled: bool) {
        self.0.borrow_mut().bar.bet_enabled = enabled;
    }

    fn is_bet_enabled(&self) -> bool {
        self.0.borrow().bar.bet_enabled
    }

    fn spin_button(&self) -> SpinButton {
        self.0.borrow().bar.spin_button
    }

    fn set_spin_button(&mut self, face: SpinButton) {
        self.0.borrow_mut().bar.spin_button = face;
    }

    fn is_fast_mode(&self) -> bool {
        self.0.borrow().bar.fast_mode
    }

    fn auto_play(&self) -> AutoPlay {
        self.0.borrow().bar.auto_play
    }

    fn set_auto_play(&mut self, auto: AutoPlay) {
        self.0.borrow_mut().bar.auto_play = auto;
    }

    fn take_auto_round(&mut self) -> bool {
        let mut rec = self.0.borrow_mut();
        match rec.bar.auto_play {
            AutoPlay::Off | AutoPlay::Rounds(0) => false,
            AutoPlay::Infinite => true,
            AutoPlay::Rounds(n) => {
                rec.bar.auto_play = if n > 1 {
                    AutoPlay::Rounds(n - 1)
                } else {
                    AutoPlay::Off
                };
                true
            }
        }
    }

    fn debit(&mut self, amount: Credits) {
        let mut rec = self.0.borrow_mut();
        rec.bar.balance = rec.bar.balance.saturating_sub(amount);
    }

    fn credit(&mut self, amount: Credits) {
        self.0.borrow_mut().bar.balance += amount;
    }

    fn win(&self) -> Credits {
        self.0.borrow().bar.win
    }

    fn set_win(&mut self, win: Credits) {
        self.0.borrow_mut().bar.win = win;
    }

    fn saved_bet(&self) -> Option<Credits> {
        self.0.borrow().bar.saved_bet
    }

    fn save_bet(&mut self, bet: Credits) {
        self.0.borrow_mut().bar.saved_bet = Some(bet);
    }

    fn feature_game_end(&mut self, bet: Credits, total: Credits) {
        self.0.borrow_mut().bar.feature_ends.push((bet, total));
    }

    fn set_deviation(&mut self, on: bool) {
        self.0.borrow_mut().bar.deviation = on;
    }
}

pub struct MockService(pub Journal);

impl GameService for MockService {
    fn send(&mut self, request: Outbound) {
        self.0.borrow_mut().sent.push(request);
    }

    fn submit_common_ack(&mut self, ack: &CommonSpinAck) {
        self.0.borrow_mut().common_acks.push(ack.clone());
    }
}

/// Full set of recording collaborators with a seeded rng
pub fn services(seed: u64) -> (Services, Journal) {
    services_with_rng(Box::new(StdRng::seed_from_u64(seed)))
}

pub fn services_with_rng(rng: Box<dyn RngCore>) -> (Services, Journal) {
    let journal: Journal = Rc::new(RefCell::new(Record::default()));
    let services = Services {
        audio: Box::new(MockAudio(journal.clone())),
        presenter: Box::new(MockPresenter(journal.clone())),
        roller: Box::new(MockRoller(journal.clone())),
        big_win: Box::new(MockBigWin(journal.clone())),
        jackpot: Box::new(MockJackpot(journal.clone())),
        bar: Box::new(MockBar(journal.clone())),
        service: Box::new(MockService(journal.clone())),
        rng,
    };
    (services, journal)
}
