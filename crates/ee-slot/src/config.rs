//! Slot client configuration
//!
//! Everything a game designer may tune without touching code: reel speed
//! presets, filler symbol tables, presentation timings and the suspense
//! probabilities. Loaded from YAML or JSON and validated before use.

use std::path::Path;

use ee_core::{EeError, EeResult};
use ee_protocol::Symbol;
use serde::{Deserialize, Serialize};

use crate::define::MAIN_COLUMN;
use crate::spinner::SpeedConfig;

/// Candidate symbols and integer weights for one column's filler stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub symbols: Vec<Symbol>,
    pub weights: Vec<u32>,
}

impl WeightTable {
    /// Every candidate weighted 1
    pub fn uniform(symbols: Vec<Symbol>) -> Self {
        let weights = vec![1; symbols.len()];
        Self { symbols, weights }
    }

    pub fn total_weight(&self) -> u64 {
        self.weights.iter().map(|w| *w as u64).sum()
    }
}

/// Per-column filler tables for one game mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelStrips {
    pub columns: Vec<WeightTable>,
    /// Jackpot tier weights (MINI..GRAND, NoJackpot)
    pub jp_type_weights: Vec<u32>,
}

impl ReelStrips {
    /// Main game: column 0 may show CHEST, every column may show WILD/SCATTER/JP
    pub fn main_game() -> Self {
        use Symbol::*;
        let tail = vec![Sphinx, Wedjat, Scepter, A, K, Q, J, Ten, Wild, Scatter, Jp, JpGrand];
        let mut first = vec![Chest];
        first.extend(tail.iter().copied());
        let mut columns = vec![WeightTable::uniform(first)];
        columns.extend((1..MAIN_COLUMN).map(|_| WeightTable::uniform(tail.clone())));
        Self {
            columns,
            jp_type_weights: vec![1; 6],
        }
    }

    /// Free game: low and mid symbols only
    pub fn free_game() -> Self {
        use Symbol::*;
        let tail = vec![Sphinx, Wedjat, Scepter, A, K, Q, J, Ten];
        let mut first = vec![Chest];
        first.extend(tail.iter().copied());
        let mut columns = vec![WeightTable::uniform(first)];
        columns.extend((1..MAIN_COLUMN).map(|_| WeightTable::uniform(tail.clone())));
        Self {
            columns,
            jp_type_weights: vec![1; 6],
        }
    }
}

/// Presentation timings (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTiming {
    /// Collection symbol flight
    pub fly_time: f32,
    /// Ball dissolve after arrival
    pub fly_destroy_time: f32,
    /// Award line carousel period
    pub line_cycle_interval: f32,
    pub turbo_settle: f32,
    /// Settle when the first reel holds the feature symbol
    pub feature_settle: f32,
    pub normal_settle: f32,
    pub add_spins_settle: f32,
    /// Phase-win callback lead before its animation completes
    pub phase_win_callback: f32,
    pub fg_enter_delay: f32,
    pub turbo_win_delay: f32,
    /// Wait after the compliment is dismissed
    pub compliment_wait: f32,
    pub compliment_end_sound_delay: f32,
    /// Board swap back to the main plate during compliment end
    pub compliment_board_swap: f32,
    /// Where a skipped intro resumes
    pub intro_skip_to: f32,
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            fly_time: 0.4,
            fly_destroy_time: 0.5,
            line_cycle_interval: 3.0,
            turbo_settle: 1.0,
            feature_settle: 0.7,
            normal_settle: 0.3,
            add_spins_settle: 0.5,
            phase_win_callback: 0.15,
            fg_enter_delay: 0.5,
            turbo_win_delay: 0.3,
            compliment_wait: 1.0,
            compliment_end_sound_delay: 0.2,
            compliment_board_swap: 0.5,
            intro_skip_to: 4.0,
        }
    }
}

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub faster_speed: SpeedConfig,
    pub turbo_speed: SpeedConfig,
    /// Socket height in px, drives landing distance
    pub socket_height: f32,
    pub loft_sockets: usize,
    pub base_sockets: usize,
    pub main_strips: ReelStrips,
    pub free_strips: ReelStrips,
    /// Chance (0..=100) of the fake near-upgrade at level >= 4
    pub fake_upgrade_percent: u32,
    /// Chance (0..=100) of the main-game omen at green level 6
    pub omen_percent: u32,
    pub timing: EffectTiming,
    /// Delay before an auto-continued feature spin
    pub feature_autoplay_delay: f32,
    /// JP pool roll durations per tier (s)
    pub jp_roll_durations: [f32; 5],
}

impl SlotConfig {
    /// Shipped EgyptEternal tuning
    pub fn egypt_eternal() -> Self {
        Self {
            faster_speed: SpeedConfig::faster(),
            turbo_speed: SpeedConfig::turbo(),
            socket_height: 150.0,
            loft_sockets: 1,
            base_sockets: 1,
            main_strips: ReelStrips::main_game(),
            free_strips: ReelStrips::free_game(),
            fake_upgrade_percent: 0,
            omen_percent: 50,
            timing: EffectTiming::default(),
            feature_autoplay_delay: 0.0,
            jp_roll_durations: [208.0, 1579.0, 9836.0, 20689.0, 176470.0],
        }
    }

    pub fn from_yaml(text: &str) -> EeResult<Self> {
        let config: SlotConfig =
            serde_yml::from_str(text).map_err(|e| EeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> EeResult<Self> {
        let config: SlotConfig =
            serde_json::from_str(text).map_err(|e| EeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load by extension: `.yaml`/`.yml` or `.json`
    pub fn from_path(path: impl AsRef<Path>) -> EeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            Some("json") => Self::from_json(&text),
            other => Err(EeError::Config(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    pub fn to_yaml(&self) -> EeResult<String> {
        serde_yml::to_string(self).map_err(|e| EeError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> EeResult<()> {
        for (mode, strips) in [("main", &self.main_strips), ("free", &self.free_strips)] {
            if strips.columns.len() != MAIN_COLUMN {
                return Err(EeError::Config(format!(
                    "{mode} strips need {MAIN_COLUMN} columns, got {}",
                    strips.columns.len()
                )));
            }
            for (i, table) in strips.columns.iter().enumerate() {
                if table.symbols.len() != table.weights.len() {
                    return Err(EeError::Config(format!(
                        "{mode} column {i}: {} symbols but {} weights",
                        table.symbols.len(),
                        table.weights.len()
                    )));
                }
                if table.total_weight() == 0 {
                    return Err(EeError::InvalidParam(format!(
                        "{mode} column {i}: zero total weight"
                    )));
                }
                if !table.symbols.iter().any(|s| *s != Symbol::Scatter) {
                    return Err(EeError::Config(format!(
                        "{mode} column {i}: needs a non-scatter candidate"
                    )));
                }
            }
            if strips.jp_type_weights.len() != 6 {
                return Err(EeError::Config(format!(
                    "{mode} jp type weights need 6 entries, got {}",
                    strips.jp_type_weights.len()
                )));
            }
        }
        for (name, pct) in [
            ("fake_upgrade_percent", self.fake_upgrade_percent),
            ("omen_percent", self.omen_percent),
        ] {
            if pct > 100 {
                return Err(EeError::Config(format!("{name} must be 0..=100, got {pct}")));
            }
        }
        if self.socket_height <= 0.0 {
            return Err(EeError::Config("socket_height must be positive".into()));
        }
        Ok(())
    }

    pub fn strips(&self, in_fg: bool) -> &ReelStrips {
        if in_fg {
            &self.free_strips
        } else {
            &self.main_strips
        }
    }

    pub fn speed(&self, turbo: bool) -> SpeedConfig {
        if turbo {
            self.turbo_speed.clone()
        } else {
            self.faster_speed.clone()
        }
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::egypt_eternal()
    }
}
