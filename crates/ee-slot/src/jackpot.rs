//! Jackpot bookkeeping
//!
//! Five tiers (Mini..Grand), each with a running pool, a bet-scaled base,
//! a lock flag driven by the bet-setting layer and a rolling display that
//! pauses while the free game shows frozen values.

use ee_core::Credits;
use ee_protocol::{BetLockChange, BetSettingAck, GameInfoAck, JpType, UnlockType};

use crate::collaborators::{Cue, GameBar, Services};
use crate::define::{MAX_JP_NUM, audio};

/// Display state of a tier's value label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollState {
    Running,
    Paused,
    /// Shows the exact value
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JackpotTier {
    pub base_odds: f64,
    pub pool: Credits,
    pub bet: Credits,
    pub roll_duration: f32,
    /// Digits before the label abbreviates
    pub max_count: u32,
    pub min_unlock_bet: Credits,
    pub locked: bool,
    pub already_reset: bool,
    pub roll: RollState,
}

impl JackpotTier {
    fn new(roll_duration: f32, max_count: u32) -> Self {
        Self {
            base_odds: 0.0,
            pool: Credits::ZERO,
            bet: Credits::ZERO,
            roll_duration,
            max_count,
            min_unlock_bet: Credits::ZERO,
            locked: false,
            already_reset: false,
            roll: RollState::Stopped,
        }
    }

    /// `bet × base_odds + pool`
    pub fn value(&self) -> Credits {
        let base = (self.bet.value() as f64 * self.base_odds).floor().max(0.0) as u64;
        Credits(base) + self.pool
    }
}

fn max_count(slot: usize) -> u32 {
    match slot {
        4 => 8,
        2 | 3 => 7,
        _ => 5,
    }
}

const UNLOCK_TYPES: [UnlockType; MAX_JP_NUM] = [
    UnlockType::Mini,
    UnlockType::Minor,
    UnlockType::Major,
    UnlockType::Mega,
    UnlockType::Grand,
];

#[derive(Debug, Clone)]
pub struct JackpotBoard {
    tiers: Vec<JackpotTier>,
    is_paused: bool,
    /// Session bootstrap in progress; lock changes stay silent
    is_init: bool,
    lock_seen: bool,
}

impl JackpotBoard {
    pub fn new(roll_durations: [f32; MAX_JP_NUM]) -> Self {
        Self {
            tiers: roll_durations
                .iter()
                .enumerate()
                .map(|(slot, d)| JackpotTier::new(*d, max_count(slot)))
                .collect(),
            is_paused: false,
            is_init: false,
            lock_seen: false,
        }
    }

    pub fn tier(&self, slot: usize) -> Option<&JackpotTier> {
        self.tiers.get(slot)
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn set_initializing(&mut self, init: bool) {
        self.is_init = init;
    }

    pub fn is_initializing(&self) -> bool {
        self.is_init
    }

    pub fn locked(&self) -> [bool; MAX_JP_NUM] {
        let mut locked = [false; MAX_JP_NUM];
        for (flag, tier) in locked.iter_mut().zip(&self.tiers) {
            *flag = tier.locked;
        }
        locked
    }

    fn sync(&self, svc: &mut Services, slot: usize) {
        if let Some(tier) = self.tiers.get(slot) {
            svc.jackpot.set_value(slot, tier.value());
            svc.jackpot.set_rolling(slot, tier.roll == RollState::Running);
        }
    }

    fn sync_all(&self, svc: &mut Services) {
        for slot in 0..self.tiers.len() {
            self.sync(svc, slot);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // VALUES
    // ═══════════════════════════════════════════════════════════════════════

    /// Bootstrap tiers from the session snapshot
    pub fn set_game_info_jp(&mut self, svc: &mut Services, ack: &GameInfoAck, bet: Credits, is_feature: bool) {
        for (slot, tier) in self.tiers.iter_mut().enumerate() {
            if let Some(setting) = ack.jp_setting_list.iter().find(|s| s.jp_type as usize == slot) {
                tier.base_odds = setting.base_odds;
            }
            tier.bet = bet;
            tier.pool = ack.jp_info.get(slot).copied().unwrap_or_default();
            tier.max_count = max_count(slot);
            tier.already_reset = false;
        }
        for unlock in &ack.unlock_info_list {
            if let Some(tier) = unlock.unlock_type.jp_slot().and_then(|s| self.tiers.get_mut(s)) {
                tier.min_unlock_bet = unlock.bet;
            }
        }
        log::info!("[Jackpot] game info: bet={bet} feature={is_feature}");
        if is_feature {
            self.reconnect_feature_jp(svc);
        } else {
            self.jp_run(svc);
        }
    }

    /// Pool values after each spin
    pub fn update_jp_money(&mut self, svc: &mut Services, jp_info: &[Credits]) {
        for (tier, pool) in self.tiers.iter_mut().zip(jp_info) {
            tier.pool = *pool;
        }
        self.sync_all(svc);
    }

    /// Tier was won: pool back to zero, exact value shown. Once per round.
    pub fn reset_jp_money(&mut self, svc: &mut Services, jp: JpType, bet: Credits) {
        let Some(slot) = jp.slot() else {
            return;
        };
        let Some(tier) = self.tiers.get_mut(slot) else {
            return;
        };
        if tier.already_reset {
            return;
        }
        tier.pool = Credits::ZERO;
        tier.bet = bet;
        tier.roll = RollState::Stopped;
        tier.already_reset = true;
        self.sync(svc, slot);
    }

    pub fn reset_already_flags(&mut self) {
        for tier in &mut self.tiers {
            tier.already_reset = false;
        }
    }

    /// Freeze every tier while the free game is announced
    pub fn set_fake_jp_value(&mut self, svc: &mut Services) {
        self.is_paused = true;
        for tier in &mut self.tiers {
            tier.roll = RollState::Paused;
        }
        self.sync_all(svc);
    }

    /// Grand rolls, the other tiers show exact values
    pub fn jp_run(&mut self, svc: &mut Services) {
        self.is_paused = false;
        for (slot, tier) in self.tiers.iter_mut().enumerate() {
            tier.roll = if slot == JpType::Grand.code() as usize {
                RollState::Running
            } else {
                RollState::Stopped
            };
        }
        self.sync_all(svc);
    }

    /// Resuming inside a feature: tiers already won show their real value
    pub fn reconnect_feature_jp(&mut self, svc: &mut Services) {
        for tier in &mut self.tiers {
            if tier.pool.is_zero() {
                tier.already_reset = true;
                tier.roll = RollState::Stopped;
            } else {
                tier.roll = RollState::Paused;
            }
        }
        self.sync_all(svc);
    }

    /// Base odds and minimum unlock bets from the bet-setting layer
    pub fn on_bet_info_update(&mut self, svc: &mut Services, ack: &BetSettingAck) {
        for (slot, tier) in self.tiers.iter_mut().enumerate() {
            if let Some(setting) = ack.jp_list.get(slot) {
                tier.base_odds = setting.base_odds;
            }
            tier.min_unlock_bet = ack.unlock_bet(UNLOCK_TYPES[slot]);
        }
        self.sync_all(svc);
    }

    pub fn on_bet_change(&mut self, svc: &mut Services, bet: Credits) {
        for tier in &mut self.tiers {
            tier.bet = bet;
        }
        self.sync_all(svc);
    }

    /// Raise the bet to the first table entry that unlocks `jp`. Only Major,
    /// Mega and Grand panels respond. Returns the new bet when it changed.
    pub fn force_unlock(&self, jp: JpType, bar: &mut dyn GameBar, in_fg: bool) -> Option<Credits> {
        if !matches!(jp, JpType::Major | JpType::Mega | JpType::Grand) {
            return None;
        }
        if in_fg || !bar.is_bet_enabled() {
            return None;
        }
        let min = self.tiers.get(jp.slot()?)?.min_unlock_bet;
        let table = bar.bet_table();
        let target = table
            .iter()
            .copied()
            .find(|bet| *bet >= min)
            .or_else(|| table.first().copied())?;
        if target > bar.bet() {
            log::info!("[Jackpot] force unlock {}: bet {} -> {}", jp.name(), bar.bet(), target);
            bar.set_bet(target);
            Some(target)
        } else {
            None
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LOCKS
    // ═══════════════════════════════════════════════════════════════════════

    /// Apply lock transitions. Returns how many lock/unlock animations
    /// were triggered.
    ///
    /// An empty list unlocks everything the first time and afterwards only
    /// re-applies the current lock skins.
    pub fn update_lock_display(&mut self, svc: &mut Services, changes: &[BetLockChange]) -> usize {
        let mut triggered = 0;
        if changes.is_empty() {
            if !self.lock_seen {
                for (slot, tier) in self.tiers.iter_mut().enumerate() {
                    tier.locked = false;
                    svc.jackpot.set_locked(slot, false);
                    svc.presenter.play(Cue::JpLock { slot, locked: false });
                    triggered += 1;
                }
            } else {
                for (slot, tier) in self.tiers.iter().enumerate() {
                    svc.jackpot.set_locked(slot, tier.locked);
                }
            }
        }

        for change in changes {
            let Some(slot) = change.unlock_type.jp_slot() else {
                log::warn!(
                    "[Jackpot] lock update for unknown unlock type {}",
                    change.unlock_type.code()
                );
                continue;
            };
            let Some(tier) = self.tiers.get_mut(slot) else {
                continue;
            };
            let locked = change.current_status.is_locked();
            svc.jackpot.set_locked(slot, locked);
            if change.current_status != change.last_status {
                svc.presenter.play(Cue::JpLock { slot, locked });
                if !self.is_init {
                    svc.audio.play(if locked { audio::JP_LOCK } else { audio::JP_UNLOCK });
                }
                triggered += 1;
            }
            tier.locked = locked;
        }
        self.lock_seen = true;
        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Cue;
    use crate::mock;
    use ee_protocol::{BetLockStatus, JpSetting, UnlockInfo};

    fn board() -> JackpotBoard {
        JackpotBoard::new([208.0, 1579.0, 9836.0, 20689.0, 176470.0])
    }

    fn change(ut: UnlockType, last: BetLockStatus, current: BetLockStatus) -> BetLockChange {
        BetLockChange {
            unlock_type: ut,
            last_status: last,
            current_status: current,
            unlock_level: 0,
        }
    }

    #[test]
    fn test_game_info_runs_grand_only() {
        let (mut svc, journal) = mock::services(1);
        let mut jp = board();
        let ack = GameInfoAck {
            jp_info: vec![Credits(1), Credits(2), Credits(3), Credits(4), Credits(5)],
            jp_setting_list: (0..5)
                .map(|i| JpSetting {
                    jp_type: i,
                    base_odds: 10.0 * (i + 1) as f64,
                })
                .collect(),
            ..Default::default()
        };
        jp.set_game_info_jp(&mut svc, &ack, Credits(100), false);
        let rec = journal.borrow();
        assert_eq!(rec.jp_rolling, [false, false, false, false, true]);
        assert_eq!(rec.jp_values[0], Credits(1001));
        assert_eq!(rec.jp_values[4], Credits(5005));
        assert_eq!(jp.tier(4).unwrap().max_count, 8);
        assert_eq!(jp.tier(2).unwrap().max_count, 7);
        assert_eq!(jp.tier(0).unwrap().max_count, 5);
    }

    #[test]
    fn test_reconnect_feature_stops_won_tiers() {
        let (mut svc, _journal) = mock::services(1);
        let mut jp = board();
        let ack = GameInfoAck {
            jp_info: vec![Credits(9), Credits::ZERO, Credits(9), Credits(9), Credits::ZERO],
            ..Default::default()
        };
        jp.set_game_info_jp(&mut svc, &ack, Credits(100), true);
        assert_eq!(jp.tier(1).unwrap().roll, RollState::Stopped);
        assert!(jp.tier(1).unwrap().already_reset);
        assert_eq!(jp.tier(0).unwrap().roll, RollState::Paused);
        assert_eq!(jp.tier(4).unwrap().roll, RollState::Stopped);
    }

    #[test]
    fn test_reset_jp_money_once_per_round() {
        let (mut svc, _journal) = mock::services(1);
        let mut jp = board();
        jp.update_jp_money(&mut svc, &[Credits(50); 5]);
        jp.reset_jp_money(&mut svc, JpType::Major, Credits(100));
        assert_eq!(jp.tier(2).unwrap().pool, Credits::ZERO);
        jp.update_jp_money(&mut svc, &[Credits(70); 5]);
        jp.reset_jp_money(&mut svc, JpType::Major, Credits(100));
        assert_eq!(jp.tier(2).unwrap().pool, Credits(70));
        jp.reset_already_flags();
        jp.reset_jp_money(&mut svc, JpType::Major, Credits(100));
        assert_eq!(jp.tier(2).unwrap().pool, Credits::ZERO);
        jp.reset_jp_money(&mut svc, JpType::NoJackpot, Credits(100));
    }

    #[test]
    fn test_fake_value_pauses_then_run_resumes() {
        let (mut svc, journal) = mock::services(1);
        let mut jp = board();
        jp.jp_run(&mut svc);
        jp.set_fake_jp_value(&mut svc);
        assert!(jp.is_paused());
        assert_eq!(journal.borrow().jp_rolling, [false; 5]);
        jp.jp_run(&mut svc);
        assert!(!jp.is_paused());
        assert!(journal.borrow().jp_rolling[4]);
    }

    #[test]
    fn test_lock_changes_trigger_on_status_change_only() {
        let (mut svc, journal) = mock::services(1);
        let mut jp = board();
        let changes = [
            change(UnlockType::Major, BetLockStatus::Unlock, BetLockStatus::Lock),
            change(UnlockType::Grand, BetLockStatus::Lock, BetLockStatus::Lock),
            change(UnlockType::FiveReel, BetLockStatus::Lock, BetLockStatus::Unlock),
            change(UnlockType::Other(42), BetLockStatus::Lock, BetLockStatus::Unlock),
        ];
        assert_eq!(jp.update_lock_display(&mut svc, &changes), 1);
        assert_eq!(jp.locked(), [false, false, true, false, true]);
        let rec = journal.borrow();
        assert_eq!(rec.jp_locked, [false, false, true, false, true]);
        assert_eq!(rec.sound_count(audio::JP_LOCK), 1);
        assert_eq!(rec.cue_count(|c| matches!(c, Cue::JpLock { slot: 2, locked: true })), 1);
        assert_eq!(rec.cue_count(|c| matches!(c, Cue::JpLock { slot: 4, .. })), 0);
    }

    #[test]
    fn test_lock_by_level_to_lock_counts_as_change() {
        let (mut svc, journal) = mock::services(1);
        let mut jp = board();
        let changes = [
            change(UnlockType::Major, BetLockStatus::Unlock, BetLockStatus::Lock),
            change(UnlockType::Grand, BetLockStatus::LockByLevel, BetLockStatus::Lock),
        ];
        assert_eq!(jp.update_lock_display(&mut svc, &changes), 2);
        assert_eq!(jp.locked(), [false, false, true, false, true]);
        let rec = journal.borrow();
        assert_eq!(rec.sound_count(audio::JP_LOCK), 2);
        assert_eq!(rec.cue_count(|c| matches!(c, Cue::JpLock { slot: 4, locked: true })), 1);
    }

    #[test]
    fn test_lock_sound_silent_while_initializing() {
        let (mut svc, journal) = mock::services(1);
        let mut jp = board();
        jp.set_initializing(true);
        let changes = [change(UnlockType::Mega, BetLockStatus::Lock, BetLockStatus::Unlock)];
        assert_eq!(jp.update_lock_display(&mut svc, &changes), 1);
        assert_eq!(journal.borrow().sound_count(audio::JP_UNLOCK), 0);
    }

    #[test]
    fn test_empty_update_replays_previous_state() {
        let (mut svc, journal) = mock::services(1);
        let mut jp = board();
        assert_eq!(jp.update_lock_display(&mut svc, &[]), 5);
        assert_eq!(jp.locked(), [false; 5]);

        let changes = [change(UnlockType::Grand, BetLockStatus::Unlock, BetLockStatus::Lock)];
        jp.update_lock_display(&mut svc, &changes);
        let before = jp.locked();
        journal.borrow_mut().clear_log();

        assert_eq!(jp.update_lock_display(&mut svc, &[]), 0);
        assert_eq!(jp.update_lock_display(&mut svc, &[]), 0);
        assert_eq!(jp.locked(), before);
        let rec = journal.borrow();
        assert!(rec.cues.is_empty());
        assert!(rec.sounds.is_empty());
        assert_eq!(rec.jp_locked, before);
    }

    #[test]
    fn test_force_unlock_raises_bet() {
        let (mut svc, journal) = mock::services(1);
        let mut jp = board();
        let ack = BetSettingAck {
            unlock_list: vec![
                UnlockInfo {
                    unlock_type: UnlockType::Major,
                    bet: Credits(400),
                    unlock_level: 0,
                },
                UnlockInfo {
                    unlock_type: UnlockType::Minor,
                    bet: Credits(5000),
                    unlock_level: 0,
                },
            ],
            ..Default::default()
        };
        jp.on_bet_info_update(&mut svc, &ack);
        assert_eq!(jp.force_unlock(JpType::Minor, svc.bar.as_mut(), false), None);
        assert_eq!(jp.force_unlock(JpType::Major, svc.bar.as_mut(), true), None);
        assert_eq!(
            jp.force_unlock(JpType::Major, svc.bar.as_mut(), false),
            Some(Credits(500))
        );
        assert_eq!(journal.borrow().bar.bet, Credits(500));
        assert_eq!(jp.force_unlock(JpType::Major, svc.bar.as_mut(), false), None);

        svc.bar.set_bet(Credits(100));
        svc.bar.set_bet_enabled(false);
        assert_eq!(jp.force_unlock(JpType::Major, svc.bar.as_mut(), false), None);
    }
}
