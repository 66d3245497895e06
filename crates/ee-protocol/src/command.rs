//! Command codes and message framing
//!
//! ## Architecture
//!
//! ```text
//! host socket ──(code, json)──> Inbound::decode ──> GameView::on_command
//! GamePlay ──> Outbound ──(code, json)──> GameService::send
//! ```

use ee_core::{EeError, EeResult};
use serde::{Deserialize, Serialize};

use crate::model::{BetSettingAck, GameInfoAck, SpinAck, SpinReq};

/// Client → game server command codes
pub mod u2g {
    pub const GAME_INFO_REQ: u32 = 1;
    pub const SPIN_REQ: u32 = 2;
    pub const FREE_SPIN_REQ: u32 = 3;
    pub const BONUS_SPIN_REQ: u32 = 4;
    /// Common layer
    pub const BET_SETTING_REQ: u32 = 201;
}

/// Game server → client command codes
pub mod g2u {
    pub const GAME_INFO_ACK: u32 = 1;
    pub const SPIN_ACK: u32 = 2;
    pub const FREE_SPIN_ACK: u32 = 3;
    pub const BONUS_SPIN_ACK: u32 = 4;
    /// Common layer
    pub const BET_SETTING_ACK: u32 = 201;
}

/// Decoded server message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inbound {
    GameInfoAck(GameInfoAck),
    BetSettingAck(BetSettingAck),
    SpinAck(SpinAck),
    FreeSpinAck(SpinAck),
    BonusSpinAck(SpinAck),
}

impl Inbound {
    /// Decode a JSON payload for the given command code
    pub fn decode(code: u32, payload: &str) -> EeResult<Self> {
        fn parse<T: for<'de> Deserialize<'de>>(code: u32, payload: &str) -> EeResult<T> {
            serde_json::from_str(payload)
                .map_err(|e| EeError::Serialization(format!("command {code}: {e}")))
        }

        match code {
            g2u::GAME_INFO_ACK => Ok(Inbound::GameInfoAck(parse(code, payload)?)),
            g2u::BET_SETTING_ACK => Ok(Inbound::BetSettingAck(parse(code, payload)?)),
            g2u::SPIN_ACK => Ok(Inbound::SpinAck(parse(code, payload)?)),
            g2u::FREE_SPIN_ACK => Ok(Inbound::FreeSpinAck(parse(code, payload)?)),
            g2u::BONUS_SPIN_ACK => Ok(Inbound::BonusSpinAck(parse(code, payload)?)),
            other => Err(EeError::Protocol(format!("unknown G2U command {other}"))),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Inbound::GameInfoAck(_) => g2u::GAME_INFO_ACK,
            Inbound::BetSettingAck(_) => g2u::BET_SETTING_ACK,
            Inbound::SpinAck(_) => g2u::SPIN_ACK,
            Inbound::FreeSpinAck(_) => g2u::FREE_SPIN_ACK,
            Inbound::BonusSpinAck(_) => g2u::BONUS_SPIN_ACK,
        }
    }

    /// Encode back to the wire form, used by scripted servers
    pub fn encode(&self) -> EeResult<(u32, String)> {
        let json = match self {
            Inbound::GameInfoAck(ack) => serde_json::to_string(ack),
            Inbound::BetSettingAck(ack) => serde_json::to_string(ack),
            Inbound::SpinAck(ack) | Inbound::FreeSpinAck(ack) | Inbound::BonusSpinAck(ack) => {
                serde_json::to_string(ack)
            }
        }
        .map_err(|e| EeError::Serialization(e.to_string()))?;
        Ok((self.code(), json))
    }

    /// Spin acks carry the mode's board; everything else is session-level
    pub fn spin_ack(&self) -> Option<&SpinAck> {
        match self {
            Inbound::SpinAck(ack) | Inbound::FreeSpinAck(ack) | Inbound::BonusSpinAck(ack) => {
                Some(ack)
            }
            _ => None,
        }
    }
}

/// Client request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outbound {
    GameInfoReq,
    SpinReq(SpinReq),
    FreeSpinReq(SpinReq),
    BonusSpinReq(SpinReq),
}

impl Outbound {
    pub fn code(&self) -> u32 {
        match self {
            Outbound::GameInfoReq => u2g::GAME_INFO_REQ,
            Outbound::SpinReq(_) => u2g::SPIN_REQ,
            Outbound::FreeSpinReq(_) => u2g::FREE_SPIN_REQ,
            Outbound::BonusSpinReq(_) => u2g::BONUS_SPIN_REQ,
        }
    }

    pub fn encode(&self) -> EeResult<(u32, String)> {
        let json = match self {
            Outbound::GameInfoReq => Ok("{}".to_string()),
            Outbound::SpinReq(req) | Outbound::FreeSpinReq(req) | Outbound::BonusSpinReq(req) => {
                serde_json::to_string(req)
            }
        }
        .map_err(|e| EeError::Serialization(e.to_string()))?;
        Ok((self.code(), json))
    }

    pub fn decode(code: u32, payload: &str) -> EeResult<Self> {
        let req = || -> EeResult<SpinReq> {
            serde_json::from_str(payload).map_err(|e| EeError::Serialization(e.to_string()))
        };
        match code {
            u2g::GAME_INFO_REQ => Ok(Outbound::GameInfoReq),
            u2g::SPIN_REQ => Ok(Outbound::SpinReq(req()?)),
            u2g::FREE_SPIN_REQ => Ok(Outbound::FreeSpinReq(req()?)),
            u2g::BONUS_SPIN_REQ => Ok(Outbound::BonusSpinReq(req()?)),
            other => Err(EeError::Protocol(format!("unknown U2G command {other}"))),
        }
    }
}
