//! GamePlay strategies
//!
//! One strategy per game mode behind the [`GamePlay`] trait. The flow state
//! machine drives whichever is current: the strategy sends its mode's spin
//! request, digests the ack into effect data, hands the board to the reels
//! and reports which mode comes next.
//!
//! ## Architecture
//!
//! ```text
//! GameView ──PlayContext{reel, effect, svc}──> dyn GamePlay
//!                                                  ├── MainPlay   SPIN_REQ / SPIN_ACK
//!                                                  └── FreePlay   FREE_SPIN_REQ / FREE_SPIN_ACK
//! ```

use ee_core::Credits;
use ee_protocol::{
    AwardType, CommonSpinAck, GamePlayType, Inbound, JpType, Outbound, PhaseType, PlateData,
    SpinAck, SpinReq, Symbol,
};

use crate::collaborators::{GameEvent, ReelEngine, Services};
use crate::define::{MAIN_COLUMN, MAX_PHASE_LEVEL, fallback_plate};
use crate::effect::EffectView;

/// Award bits that won a jackpot tier
const JP_AWARDS: [(AwardType, JpType); 5] = [
    (AwardType::JpMini, JpType::Mini),
    (AwardType::JpMinor, JpType::Minor),
    (AwardType::JpMajor, JpType::Major),
    (AwardType::JpMega, JpType::Mega),
    (AwardType::JpGrand, JpType::Grand),
];

/// Everything a strategy touches during one call
pub struct PlayContext<'a> {
    pub reel: &'a mut dyn ReelEngine,
    pub effect: &'a mut EffectView,
    pub svc: &'a mut Services,
}

impl PlayContext<'_> {
    /// Final board to the reels, effect hooks bound
    fn land(&mut self, data: &PlateData, near_win: &[bool]) {
        let mut sink = self.effect.binding(self.svc);
        self.reel.set_final_data(data, near_win, &mut sink);
    }

    fn land_fallback(&mut self) {
        let data = PlateData {
            plate: fallback_plate(),
            ..Default::default()
        };
        self.effect.core_mut().apply_fallback(&data);
        self.land(&data, &[false; MAIN_COLUMN]);
    }

    /// Pools of every tier the round won go back to zero
    fn reset_won_jackpots(&mut self, data: &PlateData) {
        let bet = self.svc.bar.bet();
        for (award, jp) in JP_AWARDS {
            if award.is_set(data.award_type_flag) {
                self.effect.core_mut().jackpot.reset_jp_money(self.svc, jp, bet);
            }
        }
    }
}

pub trait GamePlay {
    fn game_type(&self) -> GamePlayType;

    fn is_feature_game(&self) -> bool {
        self.game_type().is_feature()
    }

    /// Pause before an auto-continued spin (s)
    fn autoplay_delay(&self) -> f32 {
        0.0
    }

    /// Send the spin request and start the reels
    fn start_spin(&mut self, ctx: &mut PlayContext<'_>, bet: Credits, cheat: u32, fast: bool, turbo: bool);
    fn is_spin_ack_received(&self) -> bool;

    fn is_plate_stopped(&self, ctx: &PlayContext<'_>) -> bool {
        ctx.reel.is_plate_stopped()
    }

    /// Player slammed the reels
    fn stop_hard(&mut self, ctx: &mut PlayContext<'_>) {
        ctx.reel.stop_hard(false);
    }

    fn is_stop_hard(&self, ctx: &PlayContext<'_>) -> bool {
        ctx.reel.is_hard_stop()
    }

    fn start_award(&mut self, ctx: &mut PlayContext<'_>, turbo: bool);

    fn is_award_end(&self, ctx: &PlayContext<'_>) -> bool {
        ctx.effect.is_show_end()
    }

    fn next_game_play_type(&self) -> GamePlayType;

    fn show_enter(&mut self, ctx: &mut PlayContext<'_>, auto: bool, skip: bool);
    fn is_show_enter_end(&self, ctx: &PlayContext<'_>) -> bool;
    fn show_leave(&mut self, ctx: &mut PlayContext<'_>);
    fn is_show_leave_end(&self, ctx: &PlayContext<'_>) -> bool;

    /// Server message for this mode
    fn on_command(&mut self, ctx: &mut PlayContext<'_>, cmd: &Inbound);

    /// Common-layer part of the last ack
    fn common_ack(&self) -> Option<&CommonSpinAck>;
}

fn plate_of(ack: Option<&SpinAck>) -> Option<&PlateData> {
    ack.filter(|a| a.is_success())
        .and_then(|a| a.plate_data.as_ref())
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN GAME
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MainPlay {
    spin_ack: Option<SpinAck>,
}

impl MainPlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spin_ack(&self) -> Option<&SpinAck> {
        self.spin_ack.as_ref()
    }
}

impl GamePlay for MainPlay {
    fn game_type(&self) -> GamePlayType {
        GamePlayType::Main
    }

    fn start_spin(&mut self, ctx: &mut PlayContext<'_>, bet: Credits, cheat: u32, fast: bool, turbo: bool) {
        self.spin_ack = None;
        ctx.effect.mg_reset_parameter(ctx.svc, turbo);
        ctx.effect.core_mut().jackpot.reset_already_flags();
        ctx.reel.spin(fast, turbo);
        ctx.effect.reel_spin_ani(ctx.svc);

        log::info!("[MainPlay] spin request bet={bet} cheat={cheat}");
        ctx.svc.service.send(Outbound::SpinReq(SpinReq::new(bet, cheat)));
    }

    fn is_spin_ack_received(&self) -> bool {
        self.spin_ack.is_some()
    }

    fn start_award(&mut self, ctx: &mut PlayContext<'_>, turbo: bool) {
        if let Some(data) = plate_of(self.spin_ack.as_ref()) {
            ctx.reset_won_jackpots(data);
        }
        ctx.effect.mg_show_collect(turbo);
    }

    fn next_game_play_type(&self) -> GamePlayType {
        match plate_of(self.spin_ack.as_ref()) {
            Some(data) if data.remain_free_round > 0 => GamePlayType::Free,
            _ => GamePlayType::Main,
        }
    }

    fn show_enter(&mut self, ctx: &mut PlayContext<'_>, _auto: bool, _skip: bool) {
        log::info!("[MainPlay] enter main game");
        ctx.effect.mg_show_enter(ctx.svc);
    }

    fn is_show_enter_end(&self, _ctx: &PlayContext<'_>) -> bool {
        true
    }

    fn show_leave(&mut self, _ctx: &mut PlayContext<'_>) {
        log::info!("[MainPlay] leave main game");
    }

    fn is_show_leave_end(&self, _ctx: &PlayContext<'_>) -> bool {
        true
    }

    fn on_command(&mut self, ctx: &mut PlayContext<'_>, cmd: &Inbound) {
        let Inbound::SpinAck(ack) = cmd else {
            return;
        };
        self.spin_ack = Some(ack.clone());

        let Some(data) = plate_of(Some(ack)) else {
            log::warn!("[MainPlay] spin rejected: {:?}", ack.ack_type);
            ctx.svc.bar.stop_auto_play();
            ctx.land_fallback();
            return;
        };

        let bet = ctx.svc.bar.bet();
        let core = ctx.effect.core_mut();
        let near_win = core.apply_result(data, bet);
        core.save_mg_plate(data);
        if data.remain_free_round > 0 {
            log::info!("[MainPlay] free game triggered: {} rounds", data.remain_free_round);
            core.fg_spinned = 0;
            core.total_free_round = data.remain_free_round;
        }
        core.jackpot.update_jp_money(ctx.svc, &ack.jp_info);
        ctx.reel.set_before_data(data);
        ctx.land(data, &near_win);
    }

    fn common_ack(&self) -> Option<&CommonSpinAck> {
        self.spin_ack.as_ref().and_then(|a| a.common.as_ref())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FREE GAME
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct FreePlay {
    spin_ack: Option<SpinAck>,
    autoplay_delay: f32,
}

impl FreePlay {
    pub fn new(autoplay_delay: f32) -> Self {
        Self {
            spin_ack: None,
            autoplay_delay,
        }
    }

    pub fn spin_ack(&self) -> Option<&SpinAck> {
        self.spin_ack.as_ref()
    }
}

impl GamePlay for FreePlay {
    fn game_type(&self) -> GamePlayType {
        GamePlayType::Free
    }

    fn autoplay_delay(&self) -> f32 {
        self.autoplay_delay
    }

    fn start_spin(&mut self, ctx: &mut PlayContext<'_>, bet: Credits, cheat: u32, fast: bool, turbo: bool) {
        self.spin_ack = None;
        ctx.effect.fg_reset_parameter(ctx.svc, turbo);
        ctx.effect.core_mut().jackpot.reset_already_flags();
        ctx.reel.spin(fast, turbo);

        let core = ctx.effect.core_mut();
        core.fg_spinned += 1;
        let (spun, total) = (core.fg_spinned, core.total_free_round);
        ctx.svc.presenter.emit(GameEvent::FgRounds { spun, total });
        ctx.effect.reel_spin_ani(ctx.svc);

        log::info!("[FreePlay] spin request {spun}/{total}");
        ctx.svc.service.send(Outbound::FreeSpinReq(SpinReq::new(bet, cheat)));
    }

    fn is_spin_ack_received(&self) -> bool {
        self.spin_ack.is_some()
    }

    fn start_award(&mut self, ctx: &mut PlayContext<'_>, _turbo: bool) {
        if let Some(data) = plate_of(self.spin_ack.as_ref()) {
            ctx.reset_won_jackpots(data);
        }
        ctx.effect.fg_show_collect();
    }

    fn next_game_play_type(&self) -> GamePlayType {
        match plate_of(self.spin_ack.as_ref()) {
            Some(data) if data.remain_bonus_round > 0 => GamePlayType::Bonus,
            Some(data) if data.remain_free_round > 0 => GamePlayType::Free,
            Some(_) => GamePlayType::Main,
            None => GamePlayType::Free,
        }
    }

    fn show_enter(&mut self, ctx: &mut PlayContext<'_>, auto: bool, skip: bool) {
        log::info!("[FreePlay] enter free game (auto={auto}, skip={skip})");
        ctx.effect.fg_show_enter(ctx.svc, auto, skip);
    }

    fn is_show_enter_end(&self, ctx: &PlayContext<'_>) -> bool {
        ctx.effect.is_show_end()
    }

    fn show_leave(&mut self, ctx: &mut PlayContext<'_>) {
        log::info!("[FreePlay] leave free game");
        ctx.effect.fg_show_leave();
    }

    fn is_show_leave_end(&self, ctx: &PlayContext<'_>) -> bool {
        ctx.effect.is_show_end()
    }

    fn on_command(&mut self, ctx: &mut PlayContext<'_>, cmd: &Inbound) {
        let ack = match cmd {
            Inbound::FreeSpinAck(ack) | Inbound::BonusSpinAck(ack) => ack,
            _ => return,
        };
        self.spin_ack = Some(ack.clone());

        let Some(data) = plate_of(Some(ack)) else {
            log::warn!("[FreePlay] spin rejected: {:?}", ack.ack_type);
            ctx.svc.bar.stop_auto_play();
            ctx.land_fallback();
            return;
        };

        let bet = ctx.svc.bar.bet();
        let core = ctx.effect.core_mut();
        let before = core.total_free_round;
        let near_win = core.apply_result(data, bet);
        let scatters = data.count(Symbol::Scatter);
        core.has_add_spin = scatters >= 3
            || data.phase_level(PhaseType::Purple.index()) == MAX_PHASE_LEVEL;
        core.fg_total_win += data.plate_win;
        core.total_free_round = core.fg_spinned + data.remain_free_round;
        core.add_spin_count = core.total_free_round.saturating_sub(before);
        if core.has_add_spin {
            log::info!(
                "[FreePlay] add spins: +{} ({} total)",
                core.add_spin_count,
                core.total_free_round
            );
        }
        core.jackpot.update_jp_money(ctx.svc, &ack.jp_info);
        ctx.reel.set_before_data(data);
        ctx.land(data, &near_win);
    }

    fn common_ack(&self) -> Option<&CommonSpinAck> {
        self.spin_ack.as_ref().and_then(|a| a.common.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotConfig;
    use crate::mock::{self, Journal};
    use crate::reel::ReelAdapter;
    use ee_protocol::{AckType, SpinAck};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Rig {
        reel: ReelAdapter,
        effect: EffectView,
        svc: Services,
        journal: Journal,
    }

    impl Rig {
        fn new() -> Self {
            let mut config = SlotConfig::egypt_eternal();
            config.omen_percent = 0;
            let reel = ReelAdapter::with_rng(
                &config,
                &fallback_plate(),
                Box::new(ChaCha8Rng::seed_from_u64(11)),
            );
            let (svc, journal) = mock::services(5);
            Self {
                reel,
                effect: EffectView::new(&config),
                svc,
                journal,
            }
        }

        fn ctx(&mut self) -> PlayContext<'_> {
            PlayContext {
                reel: &mut self.reel,
                effect: &mut self.effect,
                svc: &mut self.svc,
            }
        }

        fn run_reels(&mut self) {
            for _ in 0..2000 {
                let mut sink = self.effect.binding(&mut self.svc);
                self.reel.tick(1.0 / 60.0, &mut sink);
                if self.reel.is_plate_stopped() && !self.reel.is_holding_result() {
                    break;
                }
            }
        }
    }

    fn ack(plate: PlateData) -> SpinAck {
        SpinAck {
            ack_type: AckType::Success,
            jp_info: vec![Credits(10), Credits(20), Credits(30), Credits(40), Credits(50)],
            plate_data: Some(plate),
            common: None,
        }
    }

    fn board(scatter_columns: &[usize]) -> PlateData {
        let mut plate: Vec<Vec<Symbol>> = (0..MAIN_COLUMN)
            .map(|_| vec![Symbol::A, Symbol::K, Symbol::Q, Symbol::J])
            .collect();
        for &column in scatter_columns {
            plate[column][2] = Symbol::Scatter;
        }
        PlateData {
            plate,
            phase: vec![0, 0],
            ..Default::default()
        }
    }

    #[test]
    fn test_main_spin_sends_request() {
        let mut rig = Rig::new();
        let mut play = MainPlay::new();
        play.start_spin(&mut rig.ctx(), Credits(200), 3, false, false);
        assert!(!play.is_spin_ack_received());
        let rec = rig.journal.borrow();
        match rec.sent.as_slice() {
            [Outbound::SpinReq(req)] => {
                assert_eq!(req.bet, Credits(200));
                assert_eq!(req.cheat_type, 3);
            }
            other => panic!("unexpected requests {other:?}"),
        }
        assert_eq!(rec.sound_count(crate::define::audio::REEL_SPIN), 1);
    }

    #[test]
    fn test_main_ack_lands_server_board() {
        let mut rig = Rig::new();
        let mut play = MainPlay::new();
        play.start_spin(&mut rig.ctx(), Credits(100), 0, false, false);
        let mut data = board(&[0, 1, 3]);
        data.remain_free_round = 6;
        play.on_command(&mut rig.ctx(), &Inbound::SpinAck(ack(data.clone())));

        assert!(play.is_spin_ack_received());
        assert_eq!(play.next_game_play_type(), GamePlayType::Free);
        let core = rig.effect.core();
        assert_eq!(core.saved_mg_plate(), Some(&data));
        assert_eq!(core.total_free_round, 6);
        assert_eq!(core.collect_count(0), 3);
        assert_eq!(rig.journal.borrow().jp_values[0], Credits(10));

        rig.run_reels();
        assert!(rig.reel.is_plate_stopped());
        assert_eq!(rig.reel.visible_plate(), data.plate);
    }

    #[test]
    fn test_main_rejected_ack_stops_autoplay() {
        let mut rig = Rig::new();
        rig.svc.bar.set_auto_play(crate::collaborators::AutoPlay::Rounds(10));
        let mut play = MainPlay::new();
        play.start_spin(&mut rig.ctx(), Credits(100), 0, false, false);
        let rejected = SpinAck {
            ack_type: AckType::MoneyNotEnough,
            ..Default::default()
        };
        play.on_command(&mut rig.ctx(), &Inbound::SpinAck(rejected));

        assert!(play.is_spin_ack_received());
        assert!(!rig.svc.bar.auto_play().is_on());
        assert_eq!(play.next_game_play_type(), GamePlayType::Main);
        rig.run_reels();
        assert_eq!(rig.reel.visible_plate(), fallback_plate());
        assert!(rig.effect.core().round_win.is_zero());
    }

    #[test]
    fn test_main_ignores_other_modes() {
        let mut rig = Rig::new();
        let mut play = MainPlay::new();
        play.on_command(&mut rig.ctx(), &Inbound::FreeSpinAck(ack(board(&[]))));
        assert!(!play.is_spin_ack_received());
    }

    #[test]
    fn test_free_rounds_and_add_spins() {
        let mut rig = Rig::new();
        rig.effect.core_mut().total_free_round = 6;
        let mut play = FreePlay::new(0.5);
        assert!(play.is_feature_game());
        assert_eq!(play.autoplay_delay(), 0.5);

        play.start_spin(&mut rig.ctx(), Credits(100), 0, false, false);
        assert_eq!(rig.effect.core().fg_spinned, 1);
        let mut data = board(&[]);
        data.remain_free_round = 5;
        data.plate_win = Credits(300);
        play.on_command(&mut rig.ctx(), &Inbound::FreeSpinAck(ack(data)));
        {
            let core = rig.effect.core();
            assert!(!core.has_add_spin);
            assert_eq!(core.total_free_round, 6);
            assert_eq!(core.add_spin_count, 0);
        }
        assert_eq!(play.next_game_play_type(), GamePlayType::Free);
        rig.run_reels();

        play.start_spin(&mut rig.ctx(), Credits(100), 0, false, false);
        let mut data = board(&[0, 2, 4]);
        data.remain_free_round = 7;
        data.plate_win = Credits(200);
        play.on_command(&mut rig.ctx(), &Inbound::FreeSpinAck(ack(data)));
        let core = rig.effect.core();
        assert!(core.has_add_spin);
        assert_eq!(core.fg_spinned, 2);
        assert_eq!(core.total_free_round, 9);
        assert_eq!(core.add_spin_count, 3);
        assert_eq!(core.fg_total_win, Credits(500));
        assert_eq!(
            rig.journal
                .borrow()
                .event_count(|e| *e == GameEvent::FgRounds { spun: 2, total: 6 }),
            1
        );
        let sent = rig.journal.borrow().sent.clone();
        assert!(matches!(sent.as_slice(), [Outbound::FreeSpinReq(_), Outbound::FreeSpinReq(_)]));
    }

    #[test]
    fn test_free_next_type_priority() {
        let mut rig = Rig::new();
        let mut play = FreePlay::new(0.0);
        assert_eq!(play.next_game_play_type(), GamePlayType::Free);

        let mut data = board(&[]);
        data.remain_free_round = 2;
        data.remain_bonus_round = 1;
        play.on_command(&mut rig.ctx(), &Inbound::FreeSpinAck(ack(data.clone())));
        assert_eq!(play.next_game_play_type(), GamePlayType::Bonus);

        data.remain_bonus_round = 0;
        play.on_command(&mut rig.ctx(), &Inbound::FreeSpinAck(ack(data.clone())));
        assert_eq!(play.next_game_play_type(), GamePlayType::Free);

        data.remain_free_round = 0;
        play.on_command(&mut rig.ctx(), &Inbound::FreeSpinAck(ack(data)));
        assert_eq!(play.next_game_play_type(), GamePlayType::Main);
    }

    #[test]
    fn test_award_resets_won_jackpot_once() {
        let mut rig = Rig::new();
        let mut play = MainPlay::new();
        play.start_spin(&mut rig.ctx(), Credits(100), 0, false, false);
        let mut data = board(&[]);
        data.award_type_flag = 1 << AwardType::JpGrand.code();
        play.on_command(&mut rig.ctx(), &Inbound::SpinAck(ack(data)));
        assert_eq!(rig.effect.core().jackpot.tier(4).map(|t| t.pool), Some(Credits(50)));

        play.start_award(&mut rig.ctx(), false);
        let tier = rig.effect.core().jackpot.tier(4).cloned();
        assert_eq!(tier.as_ref().map(|t| t.pool), Some(Credits::ZERO));
        assert_eq!(tier.map(|t| t.already_reset), Some(true));
        assert_eq!(rig.effect.core().jackpot.tier(0).map(|t| t.pool), Some(Credits(10)));
        assert!(!rig.effect.is_show_end());
    }
}
