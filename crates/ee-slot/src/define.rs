//! Game constants: board shape, pay lines, audio keys, fixed plates

use ee_protocol::Symbol;

pub const MAIN_COLUMN: usize = 5;
pub const MAIN_ROW: usize = 4;
pub const MAX_JP_NUM: usize = 5;
/// Free spins granted on entry
pub const FG_BASE_ROUND: u32 = 6;
/// Coin value / bet ratio that switches to the high-value font
pub const HIGH_VALUE: f64 = 3.0;
pub const MAX_PHASE_LEVEL: u32 = 6;
pub const TURBO_ENABLE: bool = true;

/// Row index per column for each of the 30 pay lines
pub const LINE_TABLE_30: [[usize; MAIN_COLUMN]; 30] = [
    [1, 1, 1, 1, 1],
    [0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2],
    [0, 1, 2, 1, 0],
    [2, 1, 0, 1, 2],
    [0, 0, 1, 2, 2],
    [2, 2, 1, 0, 0],
    [1, 0, 1, 2, 1],
    [1, 2, 1, 0, 1],
    [0, 1, 1, 1, 0],
    [2, 1, 1, 1, 2],
    [1, 0, 0, 1, 2],
    [1, 2, 2, 1, 0],
    [1, 1, 0, 1, 2],
    [1, 1, 2, 1, 0],
    [0, 0, 1, 2, 1],
    [2, 2, 1, 0, 1],
    [1, 0, 1, 2, 2],
    [1, 2, 1, 0, 0],
    [0, 0, 0, 1, 2],
    [2, 2, 2, 1, 0],
    [0, 1, 2, 2, 2],
    [2, 1, 0, 0, 0],
    [0, 1, 0, 1, 0],
    [2, 1, 2, 1, 2],
    [0, 1, 1, 1, 2],
    [2, 1, 1, 1, 0],
    [1, 0, 0, 0, 1],
    [1, 2, 2, 2, 1],
    [0, 1, 0, 1, 2],
];

/// Board shown when entering the free game
pub fn fg_init_plate() -> Vec<Vec<Symbol>> {
    use Symbol::*;
    vec![
        vec![Ankh, Scatter, Wedjat, Sphinx],
        vec![Ten, Jp, Q, K],
        vec![Wild, Wild, Wild, Wild],
        vec![Ten, Jp, A, Scepter],
        vec![Ankh, Scatter, Chest, Wild],
    ]
}

/// Board landed when a spin ack fails
pub fn fallback_plate() -> Vec<Vec<Symbol>> {
    use Symbol::*;
    vec![
        vec![A; MAIN_ROW],
        vec![K; MAIN_ROW],
        vec![Q; MAIN_ROW],
        vec![J; MAIN_ROW],
        vec![Ten; MAIN_ROW],
    ]
}

/// Audio keys, rooted at the shared sound folder
pub mod audio {
    pub const ROOT: &str = "Common/Sound/";

    pub const MG_BGM: &str = "Common/Sound/MG_BGM";
    pub const FG_BGM: &str = "Common/Sound/FG_BGM";
    pub const INTRO: &str = "Common/Sound/MG_in";
    pub const REEL_SPIN: &str = "Common/Sound/reel_spin";
    pub const REEL_STOP: &str = "Common/Sound/reel_stop";
    pub const SCATTER_STOP: &str = "Common/Sound/scatter_stop";
    pub const JP_STOP: &str = "Common/Sound/jp_stop";
    pub const SCATTER_NEAR_WIN: &str = "Common/Sound/nearwin";
    pub const GREEN_BALL_NEAR_WIN: &str = "Common/Sound/nearwin_ball";
    pub const SCATTER_FLY: &str = "Common/Sound/scatter_fly";
    pub const PHASE_COLLECT: &str = "Common/Sound/scatter_win";
    pub const PHASE_UP_FAIL: &str = "Common/Sound/phase_up_fail";
    pub const PHASE_WIN: &str = "Common/Sound/phase_win";
    pub const SYMBOL_AWARD: &str = "Common/Sound/symbol_award";
    pub const OMEN: &str = "Common/Sound/MG_omen";
    pub const RING: &str = "Common/Sound/scatter_ring";
    pub const FG_DECLARE: &str = "Common/Sound/FG_declare";
    pub const FG_DECLARE_END: &str = "Common/Sound/FG_declare_end";
    pub const FG_ADD_SPIN: &str = "Common/Sound/FG_add";
    pub const FG_COMPLIMENT_START: &str = "Common/Sound/FG_end_declare";
    pub const FG_COMPLIMENT_END: &str = "Common/Sound/FG_end_declare_end";
    pub const JP_LOCK: &str = "Common/Sound/jp_lock";
    pub const JP_UNLOCK: &str = "Common/Sound/jp_unlock";

    /// Level-up stinger for `level → level + 1`
    pub fn phase_level_up(level: u32) -> &'static str {
        match level {
            0 => "Common/Sound/scatter_update1",
            1 => "Common/Sound/scatter_update2",
            2 => "Common/Sound/scatter_update3",
            3 => "Common/Sound/scatter_update4",
            4 => "Common/Sound/scatter_update5",
            _ => "Common/Sound/scatter_update6",
        }
    }
}
