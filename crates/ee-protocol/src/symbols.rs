//! Wire enumerations
//!
//! Every enum travels as its numeric code. Unknown codes are rejected at
//! decode time except where the game explicitly tolerates them
//! (`UnlockType::Other`).

use serde::{Deserialize, Serialize};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $repr:ty as $repr_str:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = $repr_str, into = $repr_str)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn code(self) -> $repr {
                match self {
                    $( $name::$variant => $code ),+
                }
            }
        }

        impl TryFrom<$repr> for $name {
            type Error = String;

            fn try_from(code: $repr) -> Result<Self, Self::Error> {
                match code {
                    $( c if c == $code => Ok($name::$variant), )+
                    other => Err(format!(concat!("unknown ", stringify!($name), " code {}"), other)),
                }
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> $repr {
                value.code()
            }
        }
    };
}

wire_enum! {
    /// Reel symbol identity
    Symbol: u8 as "u8" {
        Chest = 0,
        Sphinx = 1,
        Wedjat = 2,
        Ankh = 3,
        Scepter = 4,
        A = 5,
        K = 6,
        Q = 7,
        J = 8,
        Ten = 9,
        Wild = 10,
        /// Purple collection symbol, triggers the free game
        Scatter = 11,
        /// Jackpot ball carrying a coin value or tier
        Jp = 12,
        JpGrand = 13,
        JpMajor = 14,
        JpMinor = 15,
        JpMini = 16,
    }
}

impl Symbol {
    /// Coin/ball symbols whose cell carries `coin_value` and `jp_type`
    pub fn is_coin(self) -> bool {
        matches!(
            self,
            Symbol::Jp | Symbol::JpGrand | Symbol::JpMajor | Symbol::JpMinor | Symbol::JpMini
        )
    }

    /// Symbols that play their own award animation on line highlights
    pub fn is_special(self) -> bool {
        self.code() >= Symbol::Wild.code()
    }
}

wire_enum! {
    /// Jackpot tier; `NoJackpot` is the "no tier" sentinel
    JpType: u8 as "u8" {
        Mini = 0,
        Minor = 1,
        Major = 2,
        Mega = 3,
        Grand = 4,
        NoJackpot = 5,
    }
}

impl JpType {
    pub const TIERS: [JpType; 5] = [
        JpType::Mini,
        JpType::Minor,
        JpType::Major,
        JpType::Mega,
        JpType::Grand,
    ];

    /// Slot index 0..5 for real tiers
    pub fn slot(self) -> Option<usize> {
        match self {
            JpType::NoJackpot => None,
            tier => Some(tier.code() as usize),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            JpType::Mini => "Mini",
            JpType::Minor => "Minor",
            JpType::Major => "Major",
            JpType::Mega => "Mega",
            JpType::Grand => "Grand",
            JpType::NoJackpot => "None",
        }
    }
}

impl Default for JpType {
    fn default() -> Self {
        JpType::NoJackpot
    }
}

wire_enum! {
    /// Which feature stage a reconnecting client resumes into
    SpinState: u8 as "u8" {
        None = 0,
        FgStart = 1,
        FgSpin = 2,
        BgStart = 3,
        BgSpin = 4,
        Max = 5,
    }
}

impl SpinState {
    /// Strictly between NONE and MAX
    pub fn is_feature(self) -> bool {
        !matches!(self, SpinState::None | SpinState::Max)
    }
}

impl Default for SpinState {
    fn default() -> Self {
        SpinState::None
    }
}

wire_enum! {
    /// Spin acknowledgement result
    AckType: u8 as "u8" {
        Success = 0,
        MoneyNotEnough = 1,
        MoneyAbnormal = 2,
        StateError = 3,
        NotInMain = 4,
        NotInFree = 5,
        NotInBonus = 6,
        Max = 7,
    }
}

impl Default for AckType {
    fn default() -> Self {
        AckType::Max
    }
}

wire_enum! {
    /// Bit positions in `PlateData::award_type_flag`
    AwardType: u8 as "u8" {
        None = 0,
        Line = 1,
        Free = 2,
        Bonus = 3,
        JpMini = 4,
        JpMinor = 5,
        JpMajor = 6,
        JpMega = 7,
        JpGrand = 8,
    }
}

impl AwardType {
    pub fn is_set(self, flag: u32) -> bool {
        flag & (1 << self.code()) != 0
    }
}

wire_enum! {
    /// Per-bet lock state of one unlockable
    BetLockStatus: u8 as "u8" {
        None = 0,
        Unlock = 1,
        Lock = 2,
        LockByLevel = 3,
    }
}

impl BetLockStatus {
    pub fn is_locked(self) -> bool {
        matches!(self, BetLockStatus::Lock | BetLockStatus::LockByLevel)
    }
}

impl Default for BetLockStatus {
    fn default() -> Self {
        BetLockStatus::None
    }
}

/// Unlockable item code from the common bet-setting layer
///
/// Codes the game does not recognize are preserved as `Other` so a lock
/// update can log and skip them instead of failing the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum UnlockType {
    Undefined,
    Mini,
    Minor,
    Major,
    Mega,
    Ultra,
    Grand,
    Jackpot,
    Free,
    Bonus,
    FiveReel,
    Other(u32),
}

impl UnlockType {
    pub fn code(self) -> u32 {
        match self {
            UnlockType::Undefined => 0,
            UnlockType::Mini => 1,
            UnlockType::Minor => 2,
            UnlockType::Major => 3,
            UnlockType::Mega => 4,
            UnlockType::Ultra => 5,
            UnlockType::Grand => 6,
            UnlockType::Jackpot => 7,
            UnlockType::Free => 20,
            UnlockType::Bonus => 21,
            UnlockType::FiveReel => 51,
            UnlockType::Other(code) => code,
        }
    }

    /// Jackpot panel slot this unlockable drives
    pub fn jp_slot(self) -> Option<usize> {
        match self {
            UnlockType::Mini => Some(0),
            UnlockType::Minor => Some(1),
            UnlockType::Major => Some(2),
            UnlockType::Mega => Some(3),
            UnlockType::Grand => Some(4),
            _ => None,
        }
    }
}

impl From<u32> for UnlockType {
    fn from(code: u32) -> Self {
        match code {
            0 => UnlockType::Undefined,
            1 => UnlockType::Mini,
            2 => UnlockType::Minor,
            3 => UnlockType::Major,
            4 => UnlockType::Mega,
            5 => UnlockType::Ultra,
            6 => UnlockType::Grand,
            7 => UnlockType::Jackpot,
            20 => UnlockType::Free,
            21 => UnlockType::Bonus,
            51 => UnlockType::FiveReel,
            other => UnlockType::Other(other),
        }
    }
}

impl From<UnlockType> for u32 {
    fn from(value: UnlockType) -> u32 {
        value.code()
    }
}

/// Collection channel on the phase panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseType {
    Purple = 0,
    Green = 1,
}

impl PhaseType {
    pub const ALL: [PhaseType; 2] = [PhaseType::Purple, PhaseType::Green];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Active game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePlayType {
    None,
    Main,
    Bonus,
    Free,
}

impl GamePlayType {
    pub fn is_feature(self) -> bool {
        matches!(self, GamePlayType::Free | GamePlayType::Bonus)
    }
}

impl Default for GamePlayType {
    fn default() -> Self {
        GamePlayType::None
    }
}
