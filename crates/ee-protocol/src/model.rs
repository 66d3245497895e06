//! Wire model: plates, acknowledgements and requests
//!
//! Field names follow Rust conventions; the compact keys used on the wire are
//! applied through `#[serde(rename)]`. Every field is optional on the wire and
//! falls back to its default, matching how the server omits empty fields.

use chrono::Utc;
use ee_core::Credits;
use serde::{Deserialize, Serialize};

use crate::symbols::{AckType, BetLockStatus, JpType, SpinState, Symbol, UnlockType};

// ═══════════════════════════════════════════════════════════════════════════════
// PLATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Coin/ball payload of one cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinValue {
    #[serde(rename = "jt")]
    pub jp_type: JpType,
    #[serde(rename = "v")]
    pub value: Credits,
}

/// Board coordinate, origin top-left
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pos {
    #[serde(rename = "c")]
    pub column: u32,
    #[serde(rename = "r")]
    pub row: u32,
}

/// One awarded pay line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAward {
    #[serde(rename = "s")]
    pub symbol: Symbol,
    /// Index into the 30-line table
    #[serde(rename = "l", default)]
    pub line: u32,
    /// Run length from the left reel
    #[serde(rename = "c", default)]
    pub conn: u32,
    #[serde(rename = "w", default, skip_serializing_if = "Credits::is_zero")]
    pub win: Credits,
}

/// Server-resolved board and award summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateData {
    /// Column-major symbol grid
    #[serde(rename = "p")]
    pub plate: Vec<Vec<Symbol>>,
    #[serde(rename = "atf")]
    pub award_type_flag: u32,
    #[serde(rename = "lal")]
    pub line_award_list: Vec<LineAward>,
    /// Column-major, parallel to `plate`
    #[serde(rename = "cvl")]
    pub coin_value_list: Vec<Vec<CoinValue>>,
    /// Purple / green collection levels
    #[serde(rename = "ph_")]
    pub phase: Vec<u32>,
    #[serde(rename = "rfr")]
    pub remain_free_round: u32,
    #[serde(rename = "rbr")]
    pub remain_bonus_round: u32,
    #[serde(rename = "mp")]
    pub move_path: Vec<Pos>,
    #[serde(rename = "pw")]
    pub plate_win: Credits,
}

impl PlateData {
    pub fn symbol_at(&self, column: usize, row: usize) -> Option<Symbol> {
        self.plate.get(column).and_then(|c| c.get(row)).copied()
    }

    pub fn coin_at(&self, column: usize, row: usize) -> CoinValue {
        self.coin_value_list
            .get(column)
            .and_then(|c| c.get(row))
            .copied()
            .unwrap_or_default()
    }

    pub fn phase_level(&self, channel: usize) -> u32 {
        self.phase.get(channel).copied().unwrap_or(0)
    }

    /// Number of columns holding at least one `symbol`
    pub fn columns_with(&self, symbol: Symbol) -> usize {
        self.plate.iter().filter(|col| col.contains(&symbol)).count()
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.plate
            .iter()
            .map(|col| col.iter().filter(|s| **s == symbol).count())
            .sum()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMON BET LAYER
// ═══════════════════════════════════════════════════════════════════════════════

/// Jackpot base odds for one tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JpSetting {
    #[serde(rename = "type")]
    pub jp_type: u32,
    #[serde(rename = "baseOdds")]
    pub base_odds: f64,
}

/// Minimum bet that unlocks an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockInfo {
    #[serde(rename = "ut")]
    pub unlock_type: UnlockType,
    #[serde(rename = "b", default)]
    pub bet: Credits,
    #[serde(rename = "ul", default)]
    pub unlock_level: u32,
}

/// One row of the bet table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetInfo {
    #[serde(rename = "b")]
    pub bet: Credits,
    #[serde(rename = "nl")]
    pub min_level: u32,
    #[serde(rename = "xl")]
    pub max_level: u32,
    #[serde(rename = "bi")]
    pub bet_index: u32,
}

/// Lock-state transition of one unlockable after a bet change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLockChange {
    #[serde(rename = "ut")]
    pub unlock_type: UnlockType,
    #[serde(rename = "ls", default)]
    pub last_status: BetLockStatus,
    #[serde(rename = "cs", default)]
    pub current_status: BetLockStatus,
    #[serde(rename = "ul", default)]
    pub unlock_level: u32,
}

/// Bet table plus jackpot odds and unlock thresholds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BetSettingAck {
    #[serde(rename = "bl")]
    pub bet_list: Vec<BetInfo>,
    #[serde(rename = "jl")]
    pub jp_list: Vec<JpSetting>,
    #[serde(rename = "ul")]
    pub unlock_list: Vec<UnlockInfo>,
    #[serde(rename = "lc")]
    pub lock_changes: Vec<BetLockChange>,
}

impl BetSettingAck {
    /// Minimum bet that unlocks `unlock_type`, zero when not listed
    pub fn unlock_bet(&self, unlock_type: UnlockType) -> Credits {
        self.unlock_list
            .iter()
            .find(|u| u.unlock_type == unlock_type)
            .map(|u| u.bet)
            .unwrap_or_default()
    }

    pub fn bet_table(&self) -> Vec<Credits> {
        self.bet_list.iter().map(|b| b.bet).collect()
    }
}

/// Opaque common-layer part of a spin ack, handed back to the platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommonSpinAck(pub serde_json::Value);

// ═══════════════════════════════════════════════════════════════════════════════
// ACKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Session bootstrap / reconnect snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInfoAck {
    #[serde(rename = "ss")]
    pub spin_state: SpinState,
    #[serde(rename = "ji")]
    pub jp_info: Vec<Credits>,
    #[serde(rename = "ph_")]
    pub phase: Vec<u32>,
    #[serde(rename = "b")]
    pub bet: Credits,
    /// Main-game board that triggered the running feature
    #[serde(rename = "mp")]
    pub main_plate: Option<PlateData>,
    #[serde(rename = "fp")]
    pub free_plate: Option<PlateData>,
    /// Board to resume from
    #[serde(rename = "lp")]
    pub last_plate: Option<PlateData>,
    #[serde(rename = "fgs")]
    pub fg_spinned: u32,
    #[serde(rename = "cfw")]
    pub current_free_win: Credits,
    #[serde(rename = "cp")]
    pub current_position: Option<Pos>,
    #[serde(rename = "cbw")]
    pub current_bonus_win: Credits,
    #[serde(rename = "cgc")]
    pub current_green_count: u32,
    #[serde(rename = "jl")]
    pub jp_setting_list: Vec<JpSetting>,
    #[serde(rename = "ul")]
    pub unlock_info_list: Vec<UnlockInfo>,
}

/// Result of one main/free/bonus spin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinAck {
    #[serde(rename = "at")]
    pub ack_type: AckType,
    #[serde(rename = "ji")]
    pub jp_info: Vec<Credits>,
    #[serde(rename = "pd")]
    pub plate_data: Option<PlateData>,
    #[serde(rename = "c")]
    pub common: Option<CommonSpinAck>,
}

impl SpinAck {
    pub fn is_success(&self) -> bool {
        self.ack_type == AckType::Success && self.plate_data.is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REQUESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Spin request body shared by every mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinReq {
    #[serde(rename = "b")]
    pub bet: Credits,
    #[serde(rename = "ct", default)]
    pub cheat_type: u32,
    /// Client send time in epoch milliseconds
    #[serde(rename = "buts", default)]
    pub time_stamp: i64,
}

impl SpinReq {
    pub fn new(bet: Credits, cheat_type: u32) -> Self {
        Self {
            bet,
            cheat_type,
            time_stamp: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_data_short_keys() {
        let json = r#"{
            "p": [[11,5,6,7],[0,1,2,3]],
            "atf": 2,
            "lal": [{"s": 5, "l": 0, "c": 3}],
            "cvl": [[{"jt": 5, "v": "0"}]],
            "ph_": [2, 0],
            "rfr": 6,
            "pw": "1500"
        }"#;
        let plate: PlateData = serde_json::from_str(json).unwrap();
        assert_eq!(plate.symbol_at(0, 0), Some(Symbol::Scatter));
        assert_eq!(plate.line_award_list[0].conn, 3);
        assert_eq!(plate.plate_win, Credits(1500));
        assert_eq!(plate.remain_free_round, 6);
        assert_eq!(plate.remain_bonus_round, 0);
        assert_eq!(plate.phase_level(0), 2);
        assert_eq!(plate.columns_with(Symbol::Scatter), 1);
        assert_eq!(plate.coin_at(3, 3), CoinValue::default());
    }

    #[test]
    fn test_game_info_ack_nested_plates() {
        let json = r#"{
            "ss": 2, "b": 500, "fgs": 3, "cfw": 1200,
            "lp": {"p": [[5,5,5,5]], "rfr": 2},
            "mp": {"p": [[11,11,11,5]]},
            "ul": [{"ut": 6, "b": 1000}, {"ut": 77, "b": 5}]
        }"#;
        let ack: GameInfoAck = serde_json::from_str(json).unwrap();
        assert_eq!(ack.spin_state, SpinState::FgSpin);
        assert_eq!(ack.last_plate.as_ref().unwrap().remain_free_round, 2);
        assert!(ack.free_plate.is_none());
        assert_eq!(ack.unlock_info_list[1].unlock_type, UnlockType::Other(77));
    }

    #[test]
    fn test_spin_ack_success_requires_plate() {
        let ack = SpinAck {
            ack_type: AckType::Success,
            ..Default::default()
        };
        assert!(!ack.is_success());
    }

    #[test]
    fn test_bet_setting_unlock_bet() {
        let json = r#"{"bl":[{"b":100},{"b":500}],"ul":[{"ut":3,"b":500}]}"#;
        let ack: BetSettingAck = serde_json::from_str(json).unwrap();
        assert_eq!(ack.unlock_bet(UnlockType::Major), Credits(500));
        assert_eq!(ack.unlock_bet(UnlockType::Grand), Credits::ZERO);
        assert_eq!(ack.bet_table(), vec![Credits(100), Credits(500)]);
    }

    #[test]
    fn test_line_award_omits_zero_win() {
        let mut award = LineAward {
            symbol: Symbol::A,
            line: 4,
            conn: 3,
            win: Credits::ZERO,
        };
        let value = serde_json::to_value(award).unwrap();
        assert!(value.get("w").is_none());
        assert_eq!(value["l"], 4);

        award.win = Credits(250);
        let value = serde_json::to_value(award).unwrap();
        assert_eq!(value["w"], 250);
        let back: LineAward = serde_json::from_value(value).unwrap();
        assert_eq!(back, award);
    }

    #[test]
    fn test_spin_req_keys() {
        let req = SpinReq {
            bet: Credits(300),
            cheat_type: 1,
            time_stamp: 42,
        };
        let value = serde_json::to_value(req).unwrap();
        assert_eq!(value["b"], 300);
        assert_eq!(value["ct"], 1);
        assert_eq!(value["buts"], 42);
    }
}
