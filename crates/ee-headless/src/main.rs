//! Headless EgyptEternal session
//!
//! Runs the slot core frame by frame against a scripted server with
//! recording collaborators and logs what the host UI would have shown.
//!
//! ```text
//! ee-headless --rounds 50 --seed 7 --auto
//! ee-headless --reconnect fg-spin --config slot.yaml
//! ```

mod server;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use ee_core::Credits;
use ee_protocol::Outbound;
use ee_slot::define::fallback_plate;
use ee_slot::mock::{self, Journal};
use ee_slot::{AutoPlay, FlowState, GameView, ReelAdapter, SlotConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use server::{Resume, ScriptedServer};

/// Frames allowed per main round before the run is declared stuck
const FRAMES_PER_ROUND: usize = 60 * 600;

#[derive(Parser)]
#[command(name = "ee-headless", about = "Drive an EgyptEternal session without a UI")]
struct Cli {
    /// Main-game rounds to play
    #[arg(short, long, default_value_t = 20)]
    rounds: u32,

    /// Seed for the server, reels and collaborators
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Slot config (YAML or JSON); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bet per main round
    #[arg(short, long, default_value_t = 100)]
    bet: u64,

    /// Use auto-play instead of clicking spin each round
    #[arg(long)]
    auto: bool,

    /// Fast reel mode
    #[arg(long)]
    fast: bool,

    /// Resume a free game left open in a previous session
    #[arg(long, value_enum)]
    reconnect: Option<Resume>,

    /// Frame step in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Everything a run needs between frames
struct Session {
    game: GameView,
    journal: Journal,
    server: ScriptedServer,
    resume: Option<Resume>,
    answered: usize,
    events_logged: usize,
    free_games: u32,
}

impl Session {
    fn new(cli: &Cli, config: &SlotConfig) -> Self {
        let reel = ReelAdapter::with_rng(
            config,
            &fallback_plate(),
            Box::new(ChaCha8Rng::seed_from_u64(cli.seed.wrapping_add(1))),
        );
        let (svc, journal) =
            mock::services_with_rng(Box::new(ChaCha8Rng::seed_from_u64(cli.seed)));
        {
            let mut rec = journal.borrow_mut();
            rec.bar.bet = Credits(cli.bet);
            rec.bar.fast_mode = cli.fast;
            rec.intro_seen = true;
        }
        Self {
            game: GameView::new(config, svc, Box::new(reel)),
            journal,
            server: ScriptedServer::new(cli.seed.wrapping_add(2), Credits(cli.bet)),
            resume: cli.reconnect,
            answered: 0,
            events_logged: 0,
            free_games: 0,
        }
    }

    /// One frame plus everything the server owes the client
    fn step(&mut self, dt: f32) -> Result<()> {
        self.game.main_process(dt);

        loop {
            let request = {
                let rec = self.journal.borrow();
                match rec.sent.get(self.answered) {
                    Some(request) => *request,
                    None => break,
                }
            };
            self.answered += 1;
            let reply = self
                .server
                .answer(&request, self.resume.take())
                .with_context(|| format!("answering {request:?}"))?;
            self.game.on_command(&reply);
        }

        let rec = self.journal.borrow();
        for event in &rec.events[self.events_logged..] {
            log::info!("[Session] {event:?}");
        }
        self.events_logged = rec.events.len();
        Ok(())
    }

    fn main_spins(&self) -> usize {
        self.journal
            .borrow()
            .sent
            .iter()
            .filter(|r| matches!(r, Outbound::SpinReq(_)))
            .count()
    }

    fn free_spins(&self) -> usize {
        self.journal
            .borrow()
            .sent
            .iter()
            .filter(|r| matches!(r, Outbound::FreeSpinReq(_) | Outbound::BonusSpinReq(_)))
            .count()
    }

    fn settled(&self) -> bool {
        !self.game.is_opening()
            && self.game.is_in_mg_idle()
            && self.game.effect().is_show_end()
            && self.game.state() == FlowState::Idle
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SlotConfig> {
    let config = match path {
        Some(path) => SlotConfig::from_path(path)
            .with_context(|| format!("loading slot config {}", path.display()))?,
        None => SlotConfig::egypt_eternal(),
    };
    config.validate().context("slot config")?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    if cli.dt <= 0.0 {
        bail!("--dt must be positive, got {}", cli.dt);
    }

    let config = load_config(cli.config.as_ref())?;
    log::info!(
        "Starting headless session: rounds={} seed={} bet={}",
        cli.rounds,
        cli.seed,
        cli.bet
    );

    let mut session = Session::new(&cli, &config);
    let start_balance = session.journal.borrow().bar.balance;
    session.game.init_bind();

    let frame_cap = FRAMES_PER_ROUND * (cli.rounds as usize + 1);
    let mut was_in_feature = false;
    let mut auto_armed = false;
    let mut frames = 0;

    loop {
        session.step(cli.dt)?;
        frames += 1;
        if frames > frame_cap {
            bail!(
                "session stuck after {frames} frames in {:?} ({:?})",
                session.game.state(),
                session.game.current_game()
            );
        }

        let in_feature = session.game.is_in_feature();
        if in_feature && !was_in_feature {
            session.free_games += 1;
        }
        was_in_feature = in_feature;

        if !session.settled() {
            continue;
        }
        let played = session.main_spins() as u32;
        if played >= cli.rounds {
            break;
        }

        if cli.auto {
            if auto_armed && !session.game.services().bar.auto_play().is_on() {
                log::warn!("[Session] auto-play stopped after {played} rounds");
                break;
            }
            if !auto_armed {
                session
                    .game
                    .services_mut()
                    .bar
                    .set_auto_play(AutoPlay::Rounds(cli.rounds - played));
                auto_armed = true;
                session.game.on_spin_btn_click();
            }
        } else if !session.game.on_spin_btn_click() && !session.game.services().bar.can_bet() {
            log::warn!("[Session] balance ran out after {played} rounds");
            break;
        }
    }

    let rec = session.journal.borrow();
    let bar = &rec.bar;
    let main_spins = session.main_spins();
    let spent = Credits(cli.bet) * main_spins as u64;
    let won = (bar.balance + spent).saturating_sub(start_balance);
    let summary = serde_json::json!({
        "rounds": main_spins,
        "free_spins": session.free_spins(),
        "free_games": session.free_games,
        "bet": cli.bet,
        "spent": spent.value(),
        "won": won.value(),
        "balance": bar.balance.value(),
        "frames": frames,
    });

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("rendering summary")?
        );
    } else {
        println!("rounds      {main_spins}");
        println!("free games  {} ({} spins)", session.free_games, session.free_spins());
        println!("spent       {spent}");
        println!("won         {won}");
        println!("balance     {} -> {}", start_balance, bar.balance);
    }
    Ok(())
}
