//! Scripted game server
//!
//! Answers client requests with seeded random boards. Every ack goes
//! through the wire encoding so the client decodes exactly what a real
//! server link would deliver.

use anyhow::{Context, Result};
use ee_core::Credits;
use ee_protocol::{
    AckType, AwardType, GameInfoAck, Inbound, LineAward, Outbound, PlateData, SpinAck, SpinReq,
    SpinState, Symbol,
};
use ee_slot::define::{FG_BASE_ROUND, LINE_TABLE_30, MAIN_COLUMN, MAIN_ROW, MAX_PHASE_LEVEL};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FILLER: [Symbol; 9] = [
    Symbol::Sphinx,
    Symbol::Wedjat,
    Symbol::Ankh,
    Symbol::Scepter,
    Symbol::A,
    Symbol::K,
    Symbol::Q,
    Symbol::J,
    Symbol::Ten,
];

/// Where a reconnecting session resumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Resume {
    /// Free game won, banner not dismissed yet
    FgStart,
    /// Inside a running free game
    FgSpin,
}

pub struct ScriptedServer {
    rng: ChaCha8Rng,
    /// Chance of a free game trigger per main spin
    trigger_rate: f64,
    /// Chance of a paying line per spin
    line_rate: f64,
    free_left: u32,
    fg_spinned: u32,
    purple: u32,
    green: u32,
    pools: Vec<Credits>,
    /// Bet stored for the session, echoed in game info
    bet: Credits,
}

impl ScriptedServer {
    pub fn new(seed: u64, bet: Credits) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            bet,
            trigger_rate: 0.08,
            line_rate: 0.3,
            free_left: 0,
            fg_spinned: 0,
            purple: 0,
            green: 0,
            pools: vec![
                Credits(5_000),
                Credits(20_000),
                Credits(80_000),
                Credits(200_000),
                Credits(1_000_000),
            ],
        }
    }

    /// Answer one request through the wire codec
    pub fn answer(&mut self, request: &Outbound, resume: Option<Resume>) -> Result<Inbound> {
        let (code, payload) = request.encode().context("encoding request")?;
        log::debug!("[Server] <- {code} {payload}");

        let reply = match request {
            Outbound::GameInfoReq => Inbound::GameInfoAck(self.game_info(resume)),
            Outbound::SpinReq(req) => Inbound::SpinAck(self.main_spin(req)),
            Outbound::FreeSpinReq(req) => Inbound::FreeSpinAck(self.free_spin(req)),
            Outbound::BonusSpinReq(req) => Inbound::BonusSpinAck(self.free_spin(req)),
        };

        let (code, payload) = reply.encode().context("encoding reply")?;
        log::debug!("[Server] -> {code} {} bytes", payload.len());
        Inbound::decode(code, &payload).with_context(|| format!("decoding reply code {code}"))
    }

    fn game_info(&mut self, resume: Option<Resume>) -> GameInfoAck {
        let mut ack = GameInfoAck {
            jp_info: self.pools.clone(),
            phase: vec![0, 0],
            bet: self.bet,
            ..Default::default()
        };
        match resume {
            None => {}
            Some(Resume::FgStart) => {
                let mut main = self.board(false);
                self.plant_scatters(&mut main, 3);
                main.remain_free_round = FG_BASE_ROUND;
                main.award_type_flag |= 1 << AwardType::Free.code();
                self.free_left = FG_BASE_ROUND;
                ack.spin_state = SpinState::FgStart;
                ack.main_plate = Some(main);
            }
            Some(Resume::FgSpin) => {
                let mut main = self.board(false);
                self.plant_scatters(&mut main, 3);
                main.remain_free_round = FG_BASE_ROUND;
                let mut last = self.board(true);
                self.fg_spinned = 2;
                self.free_left = FG_BASE_ROUND - self.fg_spinned;
                last.remain_free_round = self.free_left;
                ack.spin_state = SpinState::FgSpin;
                ack.main_plate = Some(main);
                ack.last_plate = Some(last);
                ack.fg_spinned = self.fg_spinned;
                ack.current_free_win = Credits(1_200);
            }
        }
        ack
    }

    fn main_spin(&mut self, req: &SpinReq) -> SpinAck {
        let mut data = self.board(false);
        if self.rng.random_bool(self.trigger_rate) {
            self.plant_scatters(&mut data, 3);
            data.remain_free_round = FG_BASE_ROUND;
            data.award_type_flag |= 1 << AwardType::Free.code();
            self.free_left = FG_BASE_ROUND;
            self.fg_spinned = 0;
        } else {
            self.pay_lines(&mut data, req.bet);
        }
        self.advance_phases(&mut data);
        self.grow_pools(req.bet);
        self.ack(data)
    }

    fn free_spin(&mut self, req: &SpinReq) -> SpinAck {
        let mut data = self.board(true);
        self.free_left = self.free_left.saturating_sub(1);
        self.fg_spinned += 1;
        if self.rng.random_bool(0.1) {
            self.plant_scatters(&mut data, 3);
            self.free_left += 3;
        } else {
            self.pay_lines(&mut data, req.bet);
        }
        data.remain_free_round = self.free_left;
        data.phase = vec![0, self.green];
        self.ack(data)
    }

    fn ack(&self, data: PlateData) -> SpinAck {
        SpinAck {
            ack_type: AckType::Success,
            jp_info: self.pools.clone(),
            plate_data: Some(data),
            common: None,
        }
    }

    fn board(&mut self, in_fg: bool) -> PlateData {
        let plate = (0..MAIN_COLUMN)
            .map(|_| {
                (0..MAIN_ROW)
                    .map(|_| {
                        if in_fg && self.rng.random_bool(0.1) {
                            Symbol::Wild
                        } else {
                            FILLER[self.rng.random_range(0..FILLER.len())]
                        }
                    })
                    .collect()
            })
            .collect();
        PlateData {
            plate,
            phase: vec![0, 0],
            ..Default::default()
        }
    }

    /// One scatter in each of `count` distinct columns
    fn plant_scatters(&mut self, data: &mut PlateData, count: usize) {
        let mut columns: Vec<usize> = (0..MAIN_COLUMN).collect();
        for _ in 0..count.min(MAIN_COLUMN) {
            let column = columns.remove(self.rng.random_range(0..columns.len()));
            let row = self.rng.random_range(0..MAIN_ROW);
            if let Some(cell) = data.plate.get_mut(column).and_then(|c| c.get_mut(row)) {
                *cell = Symbol::Scatter;
            }
        }
    }

    fn pay_lines(&mut self, data: &mut PlateData, bet: Credits) {
        if !self.rng.random_bool(self.line_rate) {
            return;
        }
        let line = self.rng.random_range(0..LINE_TABLE_30.len());
        let conn = self.rng.random_range(3..=MAIN_COLUMN);
        let symbol = FILLER[self.rng.random_range(0..FILLER.len())];
        for (column, row) in LINE_TABLE_30[line].iter().enumerate().take(conn) {
            if let Some(cell) = data.plate.get_mut(column).and_then(|c| c.get_mut(*row)) {
                *cell = symbol;
            }
        }
        let win = Credits(bet.value() / 10 * conn as u64);
        data.line_award_list.push(LineAward {
            symbol,
            line: line as u32,
            conn: conn as u32,
            win,
        });
        data.plate_win += win;
        data.award_type_flag |= 1 << AwardType::Line.code();
    }

    fn advance_phases(&mut self, data: &mut PlateData) {
        let scatters = data.count(Symbol::Scatter) as u32;
        if data.remain_free_round > 0 {
            self.purple = MAX_PHASE_LEVEL;
        } else {
            self.purple = (self.purple + scatters).min(MAX_PHASE_LEVEL - 1);
        }
        if self.rng.random_bool(0.1) {
            self.green = (self.green + 1) % (MAX_PHASE_LEVEL + 1);
        }
        data.phase = vec![self.purple, self.green];
        if data.remain_free_round > 0 {
            self.purple = 0;
        }
    }

    fn grow_pools(&mut self, bet: Credits) {
        for (slot, pool) in self.pools.iter_mut().enumerate() {
            *pool += Credits(bet.value() / 100 * (slot as u64 + 1));
        }
    }
}
