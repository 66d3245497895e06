//! Reel Adapter
//!
//! Wraps the [`SpinnerEngine`] with EgyptEternal placement rules: weighted
//! filler per column and mode, scatter spacing, coin decoration, lead-in
//! rows and the main-game omen that holds back the result.
//!
//! ## Architecture
//!
//! ```text
//! ReelAdapter (ReelEngine)
//!     ├── SpinnerEngine            motion, landing, events
//!     ├── SymbolGenerator          RandomSymbolSource
//!     │       ├── prize_weighted   per-column tables, JP tier weights
//!     │       └── protection       no scatter within two cells of a scatter
//!     └── held result              released once the omen finished
//!
//! spinner events ──> EffectSink
//!     StartNearWin ──> start_near_win
//!     ReachBottom  ──> reel_stop_effect
//!     JustStopped  ──> stop_near_win
//! ```

use ee_core::Credits;
use ee_protocol::{CoinValue, JpType, PhaseType, PlateData, Symbol};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::collaborators::{EffectSink, ReelEngine};
use crate::config::{ReelStrips, SlotConfig};
use crate::define::{HIGH_VALUE, MAIN_COLUMN, MAIN_ROW, MAX_PHASE_LEVEL};
use crate::spinner::{
    Cell, RandomSymbolSource, SpeedPresets, SpinnerEngine, SpinnerEvent, TrackEvent, TrackLayout,
};

/// Generated cells a scatter keeps scatter-free after it
const PROTECT_SPAN: u32 = 2;

// ═══════════════════════════════════════════════════════════════════════════════
// WEIGHTED DRAW
// ═══════════════════════════════════════════════════════════════════════════════

/// Draw one item with probability proportional to its weight.
///
/// A zero weight sum falls back to the first candidate. Returns `None` only
/// for an empty candidate list.
pub fn prize_weighted<T: Copy>(rng: &mut dyn RngCore, items: &[T], weights: &[u32]) -> Option<T> {
    let first = *items.first()?;
    let total: u64 = weights.iter().take(items.len()).map(|w| *w as u64).sum();
    if total == 0 {
        log::warn!("[Reel] zero weight sum over {} candidates", items.len());
        return Some(first);
    }
    let mut pick = rng.random_range(0..total) as i64;
    for (item, weight) in items.iter().zip(weights) {
        pick -= *weight as i64;
        if pick < 0 {
            return Some(*item);
        }
    }
    Some(first)
}

/// Coin value shown on a generated ball: `floor(bet / 100) × (1..=10) × 10`
pub fn create_random_value(rng: &mut dyn RngCore, bet: Credits) -> Credits {
    let step = rng.random_range(1..=10u64) * 10;
    Credits(bet.value() / 100 * step)
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECORATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFont {
    Normal,
    HighValue,
}

/// How a coin/ball cell is dressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinDecoration {
    pub skin: JpType,
    /// Value label, only for balls without a tier
    pub label: Option<ValueFont>,
}

pub fn decoration(coin: CoinValue, bet: Credits) -> CoinDecoration {
    let label = match coin.jp_type {
        JpType::NoJackpot => Some(if coin.value.ratio(bet) >= HIGH_VALUE {
            ValueFont::HighValue
        } else {
            ValueFont::Normal
        }),
        _ => None,
    };
    CoinDecoration {
        skin: coin.jp_type,
        label,
    }
}

/// Render order of every socket in a column, higher draws on top.
///
/// Lower sockets cover upper ones, scatters sit above ordinary symbols and
/// the hidden sockets of the outer columns sink below everything.
pub fn sibling_orders(column: usize, sockets: &[Cell], layout: TrackLayout) -> Vec<i32> {
    let total = sockets.len() as i32;
    sockets
        .iter()
        .enumerate()
        .map(|(socket, cell)| {
            let mut order = total - socket as i32;
            if cell.symbol == Symbol::Scatter {
                order += 10;
            }
            let hidden = socket < layout.loft || socket >= layout.loft + layout.main;
            if hidden && (column == 0 || column == MAIN_COLUMN - 1) {
                order -= 10;
            }
            order
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Filler source with scatter spacing
pub struct SymbolGenerator {
    main: ReelStrips,
    free: ReelStrips,
    in_fg: bool,
    bet: Credits,
    locked_jp: [bool; 5],
    jp_weights: Vec<u32>,
    protect_count: Vec<u32>,
    is_protecting: Vec<bool>,
    rng: Box<dyn RngCore>,
}

impl SymbolGenerator {
    pub fn new(main: ReelStrips, free: ReelStrips, rng: Box<dyn RngCore>) -> Self {
        let jp_weights = main.jp_type_weights.clone();
        Self {
            main,
            free,
            in_fg: false,
            bet: Credits::ZERO,
            locked_jp: [false; 5],
            jp_weights,
            protect_count: vec![0; MAIN_COLUMN],
            is_protecting: vec![false; MAIN_COLUMN],
            rng,
        }
    }

    fn strips(&self) -> &ReelStrips {
        if self.in_fg { &self.free } else { &self.main }
    }

    /// Tier weights for this spin, locked tiers zeroed
    pub fn refresh_jp_weights(&mut self) {
        let mut weights = self.strips().jp_type_weights.clone();
        for (weight, locked) in weights.iter_mut().zip(self.locked_jp) {
            if locked {
                *weight = 0;
            }
        }
        self.jp_weights = weights;
    }

    pub fn jp_weights(&self) -> &[u32] {
        &self.jp_weights
    }

    /// Arm protection on every column
    pub fn protect_all(&mut self) {
        self.protect_count.iter_mut().for_each(|c| *c = 0);
        self.is_protecting.iter_mut().for_each(|p| *p = true);
    }

    pub fn is_protecting(&self, column: usize) -> bool {
        self.is_protecting.get(column).copied().unwrap_or(false)
    }

    /// Weighted draw for `column`, skipping `without`
    pub fn draw(&mut self, column: usize, without: &[Symbol]) -> Cell {
        let Some(table) = self.strips().columns.get(column) else {
            return Cell::new(Symbol::Ten);
        };
        let (symbols, weights): (Vec<Symbol>, Vec<u32>) = table
            .symbols
            .iter()
            .zip(&table.weights)
            .filter(|(s, _)| !without.contains(s))
            .map(|(s, w)| (*s, *w))
            .unzip();
        let symbol = prize_weighted(self.rng.as_mut(), &symbols, &weights).unwrap_or(Symbol::Ten);
        self.dress(symbol)
    }

    /// Attach a coin payload to generated balls
    fn dress(&mut self, symbol: Symbol) -> Cell {
        if symbol != Symbol::Jp {
            return Cell::new(symbol);
        }
        let tiers = [
            JpType::Mini,
            JpType::Minor,
            JpType::Major,
            JpType::Mega,
            JpType::Grand,
            JpType::NoJackpot,
        ];
        let jp_type = prize_weighted(self.rng.as_mut(), &tiers, &self.jp_weights)
            .unwrap_or(JpType::NoJackpot);
        let value = match jp_type {
            JpType::NoJackpot => create_random_value(self.rng.as_mut(), self.bet),
            _ => Credits::ZERO,
        };
        Cell::with_coin(symbol, CoinValue { jp_type, value })
    }
}

impl RandomSymbolSource for SymbolGenerator {
    fn random_symbol(&mut self, column: usize) -> Cell {
        let cell = self.draw(column, &[]);
        if cell.symbol == Symbol::Scatter && self.protect_count.get(column).is_some_and(|c| *c > 0)
        {
            return self.draw(column, &[Symbol::Scatter]);
        }
        cell
    }

    fn symbol_entering(&mut self, column: usize, cell: &Cell) {
        let (Some(count), Some(protecting)) = (
            self.protect_count.get_mut(column),
            self.is_protecting.get_mut(column),
        ) else {
            return;
        };
        if cell.symbol == Symbol::Scatter && *count == 0 {
            *protecting = true;
        }
        if *protecting {
            *count += 1;
        }
        if *count > PROTECT_SPAN {
            *count = 0;
            *protecting = false;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADAPTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Convert the server board into spinner cells
pub fn plate_cells(data: &PlateData) -> Vec<Vec<Cell>> {
    data.plate
        .iter()
        .enumerate()
        .map(|(column, rows)| {
            rows.iter()
                .enumerate()
                .map(|(row, symbol)| Cell::with_coin(*symbol, data.coin_at(column, row)))
                .collect()
        })
        .collect()
}

fn symbol_cells(plate: &[Vec<Symbol>]) -> Vec<Vec<Cell>> {
    plate
        .iter()
        .map(|rows| rows.iter().map(|s| Cell::new(*s)).collect())
        .collect()
}

struct HeldResult {
    plate: Vec<Vec<Cell>>,
    near_win: Vec<bool>,
}

pub struct ReelAdapter {
    spinner: SpinnerEngine,
    generator: SymbolGenerator,
    omen_percent: u32,
    held: Option<HeldResult>,
    in_fg: bool,
}

impl ReelAdapter {
    pub fn new(config: &SlotConfig, plate: &[Vec<Symbol>]) -> Self {
        Self::with_rng(config, plate, Box::new(StdRng::from_os_rng()))
    }

    pub fn with_rng(config: &SlotConfig, plate: &[Vec<Symbol>], rng: Box<dyn RngCore>) -> Self {
        let layout = TrackLayout::new(
            config.loft_sockets,
            MAIN_ROW,
            config.base_sockets,
            config.socket_height,
        );
        let presets = SpeedPresets {
            normal: config.faster_speed.clone(),
            faster: config.faster_speed.clone(),
            turbo: config.turbo_speed.clone(),
        };
        let spinner = SpinnerEngine::new(layout, &symbol_cells(plate)).with_presets(presets);
        let generator =
            SymbolGenerator::new(config.main_strips.clone(), config.free_strips.clone(), rng);
        Self {
            spinner,
            generator,
            omen_percent: config.omen_percent,
            held: None,
            in_fg: false,
        }
    }

    pub fn spinner(&self) -> &SpinnerEngine {
        &self.spinner
    }

    pub fn generator(&self) -> &SymbolGenerator {
        &self.generator
    }

    /// Result waiting for the omen to finish
    pub fn is_holding_result(&self) -> bool {
        self.held.is_some()
    }

    pub fn sibling_orders(&self, column: usize) -> Vec<i32> {
        match self.spinner.track(column) {
            Some(track) => {
                let sockets: Vec<Cell> = track.sockets().iter().copied().collect();
                sibling_orders(column, &sockets, self.spinner.layout())
            }
            None => Vec::new(),
        }
    }

    fn translate(&mut self, sink: &mut dyn EffectSink) {
        let hard_stop = self.spinner.is_hard_stop();
        for event in self.spinner.drain_events() {
            if let SpinnerEvent::Track { column, event } = event {
                match event {
                    TrackEvent::StartNearWin { .. } => sink.start_near_win(column),
                    TrackEvent::ReachBottom => sink.reel_stop_effect(column, hard_stop),
                    TrackEvent::JustStopped => sink.stop_near_win(column),
                    _ => {}
                }
            }
        }
    }
}

impl ReelEngine for ReelAdapter {
    fn init(&mut self, plate: &[Vec<Symbol>]) {
        self.held = None;
        self.spinner.init(&symbol_cells(plate));
    }

    fn spin(&mut self, fast: bool, turbo: bool) -> bool {
        self.held = None;
        self.generator.in_fg = self.in_fg;
        self.generator.refresh_jp_weights();
        self.spinner.spin_reel(fast, turbo)
    }

    fn set_final_data(&mut self, data: &PlateData, near_win: &[bool], sink: &mut dyn EffectSink) {
        let result = HeldResult {
            plate: plate_cells(data),
            near_win: near_win.to_vec(),
        };
        let omen_roll = !self.in_fg
            && data.phase_level(PhaseType::Green.index()) == MAX_PHASE_LEVEL
            && self.omen_percent > 0
            && self.generator.rng.random_range(0..100) < self.omen_percent;
        if omen_roll {
            log::info!("[Reel] omen before result");
            sink.show_mg_omen();
            self.held = Some(result);
        } else {
            self.spinner.set_final_data(result.plate, &result.near_win);
        }
    }

    fn set_before_data(&mut self, data: &PlateData) {
        let before = (0..MAIN_COLUMN)
            .map(|column| {
                let scatter_below = data
                    .plate
                    .get(column)
                    .is_some_and(|rows| rows.iter().skip(1).any(|s| *s == Symbol::Scatter));
                let without: &[Symbol] = if scatter_below { &[Symbol::Scatter] } else { &[] };
                vec![self.generator.draw(column, without)]
            })
            .collect();
        self.spinner.set_before_data(before);
    }

    fn stop_hard(&mut self, skip_near_win: bool) {
        self.spinner.stop_hard(skip_near_win);
    }

    fn force_set_data(&mut self, data: &PlateData) {
        self.held = None;
        self.spinner.force_set_data(&plate_cells(data));
    }

    fn reset_stop_trigger_time(&mut self) {
        self.spinner.reset_stop_trigger_time(None);
    }

    fn is_plate_stopped(&self) -> bool {
        self.spinner.is_plate_stopped()
    }

    fn is_near_winning(&self) -> bool {
        self.spinner.is_near_winning()
    }

    fn is_hard_stop(&self) -> bool {
        self.spinner.is_hard_stop()
    }

    fn visible_plate(&self) -> Vec<Vec<Symbol>> {
        self.spinner
            .visible_plate()
            .iter()
            .map(|rows| rows.iter().map(|c| c.symbol).collect())
            .collect()
    }

    fn set_protect_symbol(&mut self) {
        self.generator.protect_all();
    }

    fn change_outside_symbol(&mut self) {
        let layout = self.spinner.layout();
        let base = layout.loft + layout.main;
        for column in 0..self.spinner.columns() {
            for socket in (0..layout.loft).chain(base..layout.total()) {
                let cell = self.generator.draw(column, &[Symbol::Scatter]);
                self.spinner.set_socket(column, socket, cell);
            }
        }
    }

    fn set_game_mode(&mut self, in_fg: bool) {
        self.in_fg = in_fg;
        self.generator.in_fg = in_fg;
    }

    fn set_bet(&mut self, bet: Credits) {
        self.generator.bet = bet;
    }

    fn set_locked_jp(&mut self, locked: [bool; 5]) {
        self.generator.locked_jp = locked;
    }

    fn tick(&mut self, dt: f32, sink: &mut dyn EffectSink) {
        if self.held.is_some() && !sink.is_omen_playing() {
            if let Some(result) = self.held.take() {
                log::debug!("[Reel] omen finished, releasing result");
                self.spinner.set_final_data(result.plate, &result.near_win);
            }
        }
        self.spinner.tick(dt, &mut self.generator);
        self.translate(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NullSink;
    use crate::config::WeightTable;
    use rand_chacha::ChaCha8Rng;

    fn rng(seed: u64) -> Box<dyn RngCore> {
        Box::new(ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn test_prize_weighted_uniform_is_unbiased() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let items = [0usize, 1, 2, 3];
        let mut counts = [0u32; 4];
        let n = 40_000;
        for _ in 0..n {
            let pick = prize_weighted(&mut rng, &items, &[1, 1, 1, 1]).unwrap();
            counts[pick] += 1;
        }
        for count in counts {
            let share = count as f64 / n as f64;
            assert!((share - 0.25).abs() < 0.02, "share {share}");
        }
    }

    #[test]
    fn test_prize_weighted_respects_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..500 {
            assert_eq!(prize_weighted(&mut rng, &['a', 'b', 'c'], &[0, 5, 0]), Some('b'));
        }
        assert_eq!(prize_weighted(&mut rng, &['x', 'y'], &[0, 0]), Some('x'));
        assert_eq!(prize_weighted::<char>(&mut rng, &[], &[]), None);
    }

    #[test]
    fn test_random_value_steps() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            let value = create_random_value(&mut rng, Credits(250)).value();
            assert_eq!(value % 20, 0);
            assert!((20..=200).contains(&value));
        }
    }

    #[test]
    fn test_decoration() {
        let bet = Credits(100);
        let ball = |jp_type, value| CoinValue {
            jp_type,
            value: Credits(value),
        };
        assert_eq!(
            decoration(ball(JpType::NoJackpot, 300), bet).label,
            Some(ValueFont::HighValue)
        );
        assert_eq!(
            decoration(ball(JpType::NoJackpot, 299), bet).label,
            Some(ValueFont::Normal)
        );
        let grand = decoration(ball(JpType::Grand, 0), bet);
        assert_eq!(grand.skin, JpType::Grand);
        assert_eq!(grand.label, None);
    }

    #[test]
    fn test_sibling_orders() {
        let layout = TrackLayout::new(1, 4, 1, 150.0);
        let mut sockets = vec![Cell::new(Symbol::A); 6];
        sockets[2] = Cell::new(Symbol::Scatter);
        assert_eq!(sibling_orders(2, &sockets, layout), vec![6, 5, 14, 3, 2, 1]);
        assert_eq!(sibling_orders(0, &sockets, layout), vec![-4, 5, 14, 3, 2, -9]);
    }

    #[test]
    fn test_generated_scatters_keep_distance() {
        let mut strips = ReelStrips::main_game();
        strips.columns[0] = WeightTable {
            symbols: vec![Symbol::Scatter, Symbol::A],
            weights: vec![9, 1],
        };
        let mut generator = SymbolGenerator::new(strips.clone(), strips, rng(11));
        let mut stream = Vec::new();
        for _ in 0..2000 {
            let cell = generator.random_symbol(0);
            generator.symbol_entering(0, &cell);
            stream.push(cell.symbol);
        }
        let scatters: Vec<usize> = stream
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Symbol::Scatter)
            .map(|(i, _)| i)
            .collect();
        assert!(scatters.len() > 100);
        for pair in scatters.windows(2) {
            assert!(pair[1] - pair[0] > 2, "scatters at {} and {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_locked_tiers_never_generated() {
        let mut strips = ReelStrips::main_game();
        strips.columns[1] = WeightTable {
            symbols: vec![Symbol::Jp],
            weights: vec![1],
        };
        let mut generator = SymbolGenerator::new(strips.clone(), strips, rng(5));
        generator.locked_jp = [false, false, true, true, true];
        generator.refresh_jp_weights();
        assert_eq!(generator.jp_weights(), &[1, 1, 0, 0, 0, 1]);
        for _ in 0..300 {
            let cell = generator.random_symbol(1);
            assert!(matches!(
                cell.jp_type(),
                JpType::Mini | JpType::Minor | JpType::NoJackpot
            ));
        }
    }

    fn result_plate() -> PlateData {
        use Symbol::*;
        PlateData {
            plate: vec![
                vec![Scatter, A, K, Q],
                vec![J, Scatter, Ten, Wild],
                vec![Wild, Wild, Wild, Wild],
                vec![A, A, Jp, Scatter],
                vec![Chest, K, Q, J],
            ],
            ..Default::default()
        }
    }

    fn run(reel: &mut ReelAdapter, sink: &mut dyn EffectSink) {
        for _ in 0..3000 {
            reel.tick(1.0 / 60.0, sink);
            if reel.is_plate_stopped() && !reel.is_holding_result() {
                break;
            }
        }
    }

    #[test]
    fn test_final_board_equals_server_data() {
        let config = SlotConfig::default();
        let mut reel = ReelAdapter::with_rng(&config, &crate::define::fallback_plate(), rng(2));
        let data = result_plate();
        assert!(reel.spin(true, false));
        reel.tick(1.0 / 60.0, &mut NullSink);
        reel.set_before_data(&data);
        reel.set_final_data(&data, &[false; 5], &mut NullSink);
        run(&mut reel, &mut NullSink);
        assert_eq!(reel.visible_plate(), data.plate);
        for column in 0..MAIN_COLUMN {
            let base = reel.spinner().track(column).unwrap().sockets()[5];
            if column == 1 || column == 3 {
                assert_ne!(base.symbol, Symbol::Scatter);
            }
        }
    }

    #[derive(Default)]
    struct OmenSink {
        omen_started: bool,
        omen_playing: bool,
        stops: Vec<usize>,
    }

    impl EffectSink for OmenSink {
        fn start_near_win(&mut self, _column: usize) {}
        fn stop_near_win(&mut self, _column: usize) {}
        fn reel_stop_effect(&mut self, column: usize, _hard_stop: bool) {
            self.stops.push(column);
        }
        fn show_mg_omen(&mut self) {
            self.omen_started = true;
            self.omen_playing = true;
        }
        fn is_omen_playing(&self) -> bool {
            self.omen_playing
        }
    }

    #[test]
    fn test_omen_holds_result_until_finished() {
        let mut config = SlotConfig::default();
        config.omen_percent = 100;
        let mut reel = ReelAdapter::with_rng(&config, &crate::define::fallback_plate(), rng(4));
        let mut data = result_plate();
        data.phase = vec![0, MAX_PHASE_LEVEL];
        let mut sink = OmenSink::default();
        reel.spin(true, false);
        reel.set_final_data(&data, &[false; 5], &mut sink);
        assert!(sink.omen_started);
        for _ in 0..600 {
            reel.tick(1.0 / 60.0, &mut sink);
        }
        assert!(reel.is_holding_result());
        assert!(!reel.is_plate_stopped());
        assert!(sink.stops.is_empty());

        sink.omen_playing = false;
        run(&mut reel, &mut sink);
        assert_eq!(reel.visible_plate(), data.plate);
        assert_eq!(sink.stops, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_change_outside_symbol_clears_hidden_scatters() {
        let mut strips = ReelStrips::main_game();
        for table in strips.columns.iter_mut() {
            *table = WeightTable {
                symbols: vec![Symbol::Scatter, Symbol::K],
                weights: vec![100, 1],
            };
        }
        let mut config = SlotConfig::default();
        config.main_strips = strips;
        let mut plate = crate::define::fallback_plate();
        plate[0] = vec![Symbol::Scatter; 4];
        let mut reel = ReelAdapter::with_rng(&config, &plate, rng(9));
        reel.change_outside_symbol();
        for column in 0..MAIN_COLUMN {
            let sockets = reel.spinner().track(column).unwrap().sockets();
            assert_eq!(sockets[0].symbol, Symbol::K);
            assert_eq!(sockets[5].symbol, Symbol::K);
        }
        assert_eq!(reel.visible_plate(), plate);
    }
}
