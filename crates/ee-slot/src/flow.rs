//! Game-flow state machine
//!
//! [`GameView`] owns the reels, the effect view and both strategies and
//! advances them once per frame. It decides when a spin may start, waits
//! for the ack and the reels, runs the award show and walks mode
//! transitions between the main and free game.
//!
//! ## States
//!
//! ```text
//! INIT ──> IDLE ──> SPIN ──> AWARD ──> END ──┬──> IDLE
//!            ^                               └──> TRANSIT_LEAVE ──> TRANSIT_ENTER ──┐
//!            └──────────────────────────────────────────────────────────────────────┘
//! ```

use ee_core::Credits;
use ee_protocol::{BetSettingAck, GameInfoAck, GamePlayType, Inbound, JpType, Outbound, SpinState};

use crate::collaborators::{AutoPlay, GameEvent, ReelEngine, Services, SpinButton};
use crate::config::SlotConfig;
use crate::define::{TURBO_ENABLE, fallback_plate};
use crate::effect::EffectView;
use crate::gameplay::{FreePlay, GamePlay, MainPlay, PlayContext};
use crate::state::StateMachine;
use crate::timer::{Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Init,
    Idle,
    Spin,
    Award,
    End,
    TransitLeave,
    TransitEnter,
}

pub struct GameView {
    svc: Services,
    reel: Box<dyn ReelEngine>,
    effect: EffectView,
    main_play: MainPlay,
    free_play: FreePlay,
    state: StateMachine<FlowState>,
    scheduler: Scheduler,
    autoplay_timer: Option<TimerHandle>,
    autoplay_due: bool,

    current: GamePlayType,
    next: GamePlayType,
    last: GamePlayType,

    is_init: bool,
    is_opening: bool,
    is_reconnecting: bool,
    is_feature_transit_skip: bool,
    /// Main-game autoplay parked while a feature forces infinite autoplay
    main_remain_autoplay: AutoPlay,
}

impl GameView {
    pub fn new(config: &SlotConfig, svc: Services, reel: Box<dyn ReelEngine>) -> Self {
        Self {
            svc,
            reel,
            effect: EffectView::new(config),
            main_play: MainPlay::new(),
            free_play: FreePlay::new(config.feature_autoplay_delay),
            state: StateMachine::new("Flow", FlowState::Init),
            scheduler: Scheduler::new(),
            autoplay_timer: None,
            autoplay_due: false,
            current: GamePlayType::Main,
            next: GamePlayType::Main,
            last: GamePlayType::Main,
            is_init: false,
            is_opening: false,
            is_reconnecting: false,
            is_feature_transit_skip: false,
            main_remain_autoplay: AutoPlay::Off,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> FlowState {
        self.state.current()
    }

    pub fn current_game(&self) -> GamePlayType {
        self.current
    }

    pub fn next_game(&self) -> GamePlayType {
        self.next
    }

    pub fn effect(&self) -> &EffectView {
        &self.effect
    }

    pub fn reel(&self) -> &dyn ReelEngine {
        self.reel.as_ref()
    }

    pub fn services(&self) -> &Services {
        &self.svc
    }

    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.svc
    }

    pub fn is_reconnecting(&self) -> bool {
        self.is_reconnecting
    }

    pub fn is_feature_transit_skip(&self) -> bool {
        self.is_feature_transit_skip
    }

    pub fn is_opening(&self) -> bool {
        self.is_opening
    }

    pub fn is_in_feature(&self) -> bool {
        self.current.is_feature()
    }

    pub fn is_in_mg_idle(&self) -> bool {
        self.state.is(FlowState::Idle) && !self.current.is_feature()
    }

    pub fn is_in_turbo_mode(&self) -> bool {
        TURBO_ENABLE && self.svc.bar.auto_play().is_on() && !self.current.is_feature()
    }

    pub fn is_bet_changeable(&self) -> bool {
        !self.current.is_feature() && self.state.is(FlowState::Idle)
    }

    fn is_manual(&self) -> bool {
        !self.svc.bar.auto_play().is_on()
    }

    fn play(&self, kind: GamePlayType) -> &dyn GamePlay {
        match kind {
            GamePlayType::Free | GamePlayType::Bonus => &self.free_play,
            GamePlayType::Main | GamePlayType::None => &self.main_play,
        }
    }

    /// Run `f` on the strategy for `kind` with the shared context lent out
    fn with_play<R>(
        &mut self,
        kind: GamePlayType,
        f: impl FnOnce(&mut dyn GamePlay, &mut PlayContext<'_>) -> R,
    ) -> R {
        let play: &mut dyn GamePlay = match kind {
            GamePlayType::Free | GamePlayType::Bonus => &mut self.free_play,
            GamePlayType::Main | GamePlayType::None => &mut self.main_play,
        };
        let mut ctx = PlayContext {
            reel: self.reel.as_mut(),
            effect: &mut self.effect,
            svc: &mut self.svc,
        };
        f(play, &mut ctx)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ENTRY POINTS
    // ═══════════════════════════════════════════════════════════════════════

    /// Join the session
    pub fn init_bind(&mut self) {
        log::info!("[Flow] join, requesting game info");
        self.svc.service.send(Outbound::GameInfoReq);
    }

    /// One frame
    pub fn main_process(&mut self, dt: f32) {
        {
            let mut sink = self.effect.binding(&mut self.svc);
            self.reel.tick(dt, &mut sink);
        }
        self.effect.tick(&mut self.svc, dt);
        for request in self.effect.take_reel_requests() {
            request.apply(self.reel.as_mut());
        }
        self.tick_flow(dt);
    }

    pub fn on_command(&mut self, cmd: &Inbound) {
        match cmd {
            Inbound::GameInfoAck(ack) => self.on_game_info_ack(ack),
            Inbound::BetSettingAck(ack) => self.on_bet_setting_ack(ack),
            _ => {
                let current = self.current;
                self.with_play(current, |play, ctx| play.on_command(ctx, cmd));
            }
        }
    }

    pub fn on_spin_btn_click(&mut self) -> bool {
        if self.is_opening {
            self.effect.skip_intro(&mut self.svc);
            return false;
        }
        if self.svc.bar.auto_play().is_on() {
            self.svc.bar.take_auto_round();
        }
        self.start_spin()
    }

    pub fn on_stop_btn_click(&mut self) {
        if !self.state.is(FlowState::Spin) {
            return;
        }
        self.svc.bar.set_spin_button(SpinButton::StopDisable);
        let current = self.current;
        self.with_play(current, |play, ctx| play.stop_hard(ctx));
    }

    /// Tap on the reel area acts as whatever the spin button shows
    pub fn on_reel_panel_touch(&mut self) {
        match self.svc.bar.spin_button() {
            SpinButton::Spin => {
                self.on_spin_btn_click();
            }
            SpinButton::Stop => self.on_stop_btn_click(),
            SpinButton::StopDisable => {}
        }
    }

    /// Player picked a new bet on the bar
    pub fn on_bet_change(&mut self, bet: Credits) -> bool {
        if !self.is_bet_changeable() {
            log::warn!("[Flow] bet change rejected in {:?}", self.state.current());
            return false;
        }
        self.svc.bar.set_bet(bet);
        self.effect.core_mut().jackpot.on_bet_change(&mut self.svc, bet);
        self.reel.set_bet(bet);
        true
    }

    /// Raise the bet to the minimum that unlocks `jp`
    pub fn force_unlock(&mut self, jp: JpType) -> Option<Credits> {
        if !self.is_bet_changeable() {
            return None;
        }
        let in_fg = self.current.is_feature();
        let bet = self
            .effect
            .core()
            .jackpot
            .force_unlock(jp, self.svc.bar.as_mut(), in_fg)?;
        log::info!("[Flow] unlock {} at bet {bet}", jp.name());
        self.on_bet_change(bet);
        Some(bet)
    }

    /// Spin request guard
    pub fn start_spin(&mut self) -> bool {
        let pending = self.state.pending();
        if pending == Some(FlowState::Spin) {
            return false;
        }
        if pending.is_some() || !self.state.is(FlowState::Idle) {
            log::warn!(
                "[Flow] spin rejected in {:?} (pending {pending:?})",
                self.state.current()
            );
            self.svc.bar.stop_auto_play();
            self.state.transit(FlowState::Idle);
            return false;
        }
        if self.current.is_feature() || self.svc.bar.can_bet() {
            self.state.transit(FlowState::Spin);
            true
        } else {
            log::warn!("[Flow] balance does not cover bet {}", self.svc.bar.bet());
            self.svc.bar.stop_auto_play();
            self.svc.bar.set_spin_button(SpinButton::Spin);
            false
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SESSION
    // ═══════════════════════════════════════════════════════════════════════

    fn on_game_info_ack(&mut self, ack: &GameInfoAck) {
        log::info!("[Flow] game info: state={:?} bet={}", ack.spin_state, ack.bet);
        self.effect.core_mut().jackpot.set_initializing(true);
        self.svc.bar.set_win(Credits::ZERO);

        let bet = if ack.bet.is_zero() {
            self.svc.bar.saved_bet().unwrap_or_else(|| self.svc.bar.bet())
        } else {
            ack.bet
        };
        self.svc.bar.set_bet(bet);
        self.reel.init(&fallback_plate());

        let is_feature = ack.spin_state.is_feature();
        let core = self.effect.core_mut();
        core.set_phase_level(&ack.phase);
        core.jackpot.set_game_info_jp(&mut self.svc, ack, bet, is_feature);
        let locked = core.jackpot.locked();
        self.reel.set_bet(bet);
        self.reel.set_locked_jp(locked);

        match ack.spin_state {
            SpinState::FgStart => self.rejoin_fg_declare_data(ack),
            SpinState::FgSpin => self.rejoin_fg_in_spin_data(ack),
            _ => self.next = GamePlayType::Main,
        }
        self.is_init = true;
    }

    /// Reconnect before the free game banner was dismissed
    fn rejoin_fg_declare_data(&mut self, ack: &GameInfoAck) {
        log::info!("[Flow] rejoin at free game declare");
        self.current = GamePlayType::Main;
        self.next = GamePlayType::Free;
        self.svc.bar.set_auto_play(AutoPlay::Infinite);
        self.is_reconnecting = true;

        let core = self.effect.core_mut();
        if let Some(main) = &ack.main_plate {
            core.set_mg_plate(main);
            core.total_free_round = main.remain_free_round;
            self.reel.force_set_data(main);
        }
        core.fg_spinned = 0;
    }

    /// Reconnect into a running free game
    fn rejoin_fg_in_spin_data(&mut self, ack: &GameInfoAck) {
        log::info!("[Flow] rejoin inside free game at round {}", ack.fg_spinned);
        self.current = GamePlayType::Free;
        self.next = GamePlayType::Free;
        self.svc.bar.set_auto_play(AutoPlay::Infinite);
        self.is_reconnecting = true;
        self.is_feature_transit_skip = true;

        let core = self.effect.core_mut();
        if let Some(main) = &ack.main_plate {
            core.save_mg_plate(main);
        }
        let resume = ack.last_plate.as_ref().or(ack.free_plate.as_ref());
        let remain = resume.map_or(0, |p| p.remain_free_round);
        if let Some(board) = resume {
            core.set_board(board);
            self.reel.force_set_data(board);
        }
        core.fg_total_win = ack.current_free_win;
        core.fg_spinned = ack.fg_spinned;
        core.total_free_round = remain + ack.fg_spinned;
        self.svc.bar.set_win(ack.current_free_win);
    }

    fn on_bet_setting_ack(&mut self, ack: &BetSettingAck) {
        let jackpot = &mut self.effect.core_mut().jackpot;
        jackpot.on_bet_info_update(&mut self.svc, ack);
        jackpot.update_lock_display(&mut self.svc, &ack.lock_changes);
        let locked = jackpot.locked();
        self.reel.set_locked_jp(locked);

        let table = ack.bet_table();
        if self.is_in_mg_idle() && !table.is_empty() {
            self.svc.bar.set_bet_table(table);
        }
    }

    fn mg_opening(&mut self) {
        if self.is_reconnecting {
            self.mg_run();
            return;
        }
        self.is_opening = true;
        self.svc.bar.set_bet_enabled(false);
        self.effect.mg_opening(&mut self.svc, false);
    }

    /// Leave INIT into the first mode
    pub fn mg_run(&mut self) {
        log::info!("[Flow] run, next={:?}", self.next);
        self.is_opening = false;
        self.current = GamePlayType::Main;
        self.effect.core_mut().jackpot.set_initializing(false);
        self.state.transit(FlowState::TransitEnter);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TICK
    // ═══════════════════════════════════════════════════════════════════════

    fn tick_flow(&mut self, dt: f32) {
        if self.state.update() == Some(FlowState::Idle) {
            self.scheduler.cancel_slot(&mut self.autoplay_timer);
            self.autoplay_due = false;
        }
        for handle in self.scheduler.advance(dt) {
            if self.autoplay_timer == Some(handle) {
                self.autoplay_timer = None;
                self.autoplay_due = true;
            }
        }

        let state = self.state.current();
        if self.state.is_entering() {
            self.on_enter(state);
        } else {
            self.on_update(state);
        }
    }

    fn on_enter(&mut self, state: FlowState) {
        match state {
            FlowState::Init => {}
            FlowState::Idle => self.enter_idle(),
            FlowState::Spin => self.enter_spin(),
            FlowState::Award => {
                let current = self.current;
                let turbo = self.is_in_turbo_mode();
                self.with_play(current, |play, ctx| play.start_award(ctx, turbo));
            }
            FlowState::End => self.enter_end(),
            FlowState::TransitLeave => {
                let current = self.current;
                self.with_play(current, |play, ctx| play.show_leave(ctx));
            }
            FlowState::TransitEnter => self.enter_transit(),
        }
    }

    fn on_update(&mut self, state: FlowState) {
        let current = self.current;
        match state {
            FlowState::Init => {
                if !self.is_init {
                    return;
                }
                if !self.is_opening {
                    self.mg_opening();
                } else if self.effect.is_opening_done(&self.svc) {
                    self.mg_run();
                }
            }
            FlowState::Idle => {
                if self.autoplay_due && current.is_feature() {
                    self.autoplay_due = false;
                    if self.svc.bar.take_auto_round() {
                        self.start_spin();
                    }
                }
            }
            FlowState::Spin => {
                let (acked, stopped) = self.with_play(current, |play, ctx| {
                    (play.is_spin_ack_received(), play.is_plate_stopped(ctx))
                });
                if acked && self.is_manual() && self.effect.is_near_winning() {
                    self.svc.bar.set_spin_button(SpinButton::StopDisable);
                }
                if acked && stopped {
                    self.effect.set_near_winning(false);
                    self.state.transit(FlowState::Award);
                }
            }
            FlowState::Award => {
                if self.is_manual() && self.effect.has_line_awards() {
                    self.svc.bar.set_spin_button(SpinButton::StopDisable);
                }
                if self.with_play(current, |play, ctx| play.is_award_end(ctx)) {
                    self.state.transit(FlowState::End);
                }
            }
            FlowState::End => {}
            FlowState::TransitLeave => {
                if self.with_play(current, |play, ctx| play.is_show_leave_end(ctx)) {
                    if self.next == GamePlayType::Main {
                        let common = self.play(current).common_ack().cloned();
                        if let Some(common) = common {
                            self.svc.service.submit_common_ack(&common);
                        }
                    }
                    self.state.transit(FlowState::TransitEnter);
                }
            }
            FlowState::TransitEnter => {
                let next = self.next;
                if self.with_play(next, |play, ctx| play.is_show_enter_end(ctx)) {
                    self.is_feature_transit_skip = false;
                    self.is_reconnecting = false;
                    self.last = self.current;
                    self.current = next;
                    log::info!("[Flow] now in {:?}", self.current);
                    self.state.transit(FlowState::Idle);
                }
            }
        }
    }

    fn enter_idle(&mut self) {
        self.scheduler.cancel_slot(&mut self.autoplay_timer);
        self.autoplay_due = false;
        let current = self.current;
        let is_feature = current.is_feature();
        if !is_feature {
            if self.last.is_feature() {
                self.svc.presenter.emit(GameEvent::LeaveFeatureToMainIdle);
                self.last = current;
            }
            self.svc.presenter.emit(GameEvent::EnterIdle);
        }

        if self.svc.bar.auto_play().is_on() {
            let delay = self.play(current).autoplay_delay();
            if !is_feature || delay <= 0.0 {
                if self.svc.bar.take_auto_round() {
                    self.start_spin();
                }
            } else {
                self.autoplay_timer = Some(self.scheduler.once(delay));
            }
        } else {
            if !is_feature {
                self.svc.bar.set_bet_enabled(true);
            }
            if !self.is_opening {
                self.svc.bar.set_spin_button(SpinButton::Spin);
            }
        }
    }

    fn enter_spin(&mut self) {
        let current = self.current;
        let is_feature = current.is_feature();
        if current == GamePlayType::Main {
            self.svc.bar.reset_win();
        }
        let bet = self.svc.bar.bet();
        let cheat = self.svc.bar.cheat_type();
        let fast = self.svc.bar.is_fast_mode();
        let turbo = self.is_in_turbo_mode();
        self.with_play(current, |play, ctx| play.start_spin(ctx, bet, cheat, fast, turbo));

        if self.is_manual() {
            self.svc.bar.set_spin_button(SpinButton::Stop);
        }
        self.svc.bar.set_bet_enabled(false);
        if !is_feature {
            self.svc.bar.debit(bet);
            self.svc.bar.save_bet(bet);
        }
    }

    fn enter_end(&mut self) {
        let current = self.current;
        if current == GamePlayType::Main {
            if let Some(common) = self.main_play.common_ack() {
                self.svc.service.submit_common_ack(common);
            }
        }

        let next = self.play(current).next_game_play_type();
        if next == current {
            self.state.transit(FlowState::Idle);
            return;
        }
        log::info!("[Flow] mode change {current:?} -> {next:?}");
        if next == GamePlayType::Bonus {
            log::warn!("[Flow] bonus rounds continue on the free game strategy");
        }
        self.next = next;
        if current == GamePlayType::Free && next == GamePlayType::Bonus {
            self.state.transit(FlowState::TransitEnter);
        } else {
            self.state.transit(FlowState::TransitLeave);
        }
    }

    fn enter_transit(&mut self) {
        let next = self.next;
        if next.is_feature() {
            if !self.current.is_feature() && !self.is_reconnecting {
                self.main_remain_autoplay = self.svc.bar.auto_play();
            }
            if self.svc.bar.auto_play().is_on() || self.is_reconnecting {
                self.svc.bar.set_auto_play(AutoPlay::Infinite);
            }
        } else {
            let restore = std::mem::take(&mut self.main_remain_autoplay);
            self.svc.bar.set_auto_play(restore);
            if self.current.is_feature() {
                if let Some(bet) = self.svc.bar.saved_bet() {
                    self.svc.bar.set_bet(bet);
                    self.reel.set_bet(bet);
                }
            }
        }

        let auto = self.svc.bar.auto_play().is_on();
        let skip = self.is_feature_transit_skip;
        self.with_play(next, |play, ctx| play.show_enter(ctx, auto, skip));
        self.svc.bar.set_bet_enabled(false);
    }
}
