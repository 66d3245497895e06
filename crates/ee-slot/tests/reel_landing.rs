//! Reel landing integration tests
//!
//! Random server boards pushed through the full flow must land exactly,
//! whatever the reels generated on the way.

use std::collections::VecDeque;

use ee_core::Credits;
use ee_protocol::{AckType, GameInfoAck, Inbound, Outbound, PlateData, SpinAck, Symbol};
use ee_slot::define::{MAIN_COLUMN, MAIN_ROW, fallback_plate};
use ee_slot::mock;
use ee_slot::{
    FlowState, GameEvent, GameView, ReelAdapter, ReelEngine, SlotConfig, prize_weighted,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DT: f32 = 1.0 / 60.0;

const POOL: [Symbol; 10] = [
    Symbol::Sphinx,
    Symbol::Wedjat,
    Symbol::Ankh,
    Symbol::A,
    Symbol::K,
    Symbol::Q,
    Symbol::J,
    Symbol::Ten,
    Symbol::Wild,
    Symbol::Scatter,
];

fn random_board(rng: &mut ChaCha8Rng) -> PlateData {
    let plate = (0..MAIN_COLUMN)
        .map(|_| {
            (0..MAIN_ROW)
                .map(|_| POOL[rng.random_range(0..POOL.len())])
                .collect()
        })
        .collect();
    PlateData {
        plate,
        phase: vec![0, 0],
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LANDING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_every_round_lands_the_server_board() {
    let mut config = SlotConfig::egypt_eternal();
    config.omen_percent = 0;
    let reel = ReelAdapter::with_rng(
        &config,
        &fallback_plate(),
        Box::new(ChaCha8Rng::seed_from_u64(404)),
    );
    let (svc, journal) = mock::services(8);
    journal.borrow_mut().intro_seen = true;
    let mut game = GameView::new(&config, svc, Box::new(reel));
    game.init_bind();
    game.on_command(&Inbound::GameInfoAck(GameInfoAck {
        bet: Credits(100),
        ..Default::default()
    }));

    let mut boards_rng = ChaCha8Rng::seed_from_u64(1234);
    let mut pending: VecDeque<PlateData> = VecDeque::new();
    let mut answered = 0;
    for round in 0..8 {
        for _ in 0..600 {
            game.main_process(DT);
            if game.state() == FlowState::Idle && game.effect().is_show_end() {
                break;
            }
        }
        assert_eq!(game.state(), FlowState::Idle, "round {round} never settled");
        let board = random_board(&mut boards_rng);
        pending.push_back(board.clone());
        assert!(game.on_spin_btn_click());

        let target = journal.borrow().event_count(|e| *e == GameEvent::EnterIdle) + 1;
        for _ in 0..4000 {
            game.main_process(DT);
            let sent = journal.borrow().sent.len();
            while answered < sent {
                let request = journal.borrow().sent[answered];
                answered += 1;
                if let (Outbound::SpinReq(_), Some(data)) = (request, pending.pop_front()) {
                    game.on_command(&Inbound::SpinAck(SpinAck {
                        ack_type: AckType::Success,
                        plate_data: Some(data),
                        ..Default::default()
                    }));
                }
            }
            if journal.borrow().event_count(|e| *e == GameEvent::EnterIdle) == target {
                break;
            }
        }
        assert!(game.reel().is_plate_stopped());
        assert_eq!(game.reel().visible_plate(), board.plate, "round {round}");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEIGHTED DRAW
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_weighted_draw_follows_weights() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let items = ['a', 'b', 'c', 'd'];
    let weights = [1, 2, 3, 4];
    let draws = 40_000;
    let mut counts = [0usize; 4];
    for _ in 0..draws {
        let item = prize_weighted(&mut rng, &items, &weights).unwrap();
        counts[items.iter().position(|i| *i == item).unwrap()] += 1;
    }
    for (count, weight) in counts.iter().zip(weights) {
        let expected = draws as f64 * weight as f64 / 10.0;
        let ratio = *count as f64 / expected;
        assert!((0.95..1.05).contains(&ratio), "weight {weight}: {count} vs {expected}");
    }
}

#[test]
fn test_weighted_draw_degenerate_tables() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let empty: [Symbol; 0] = [];
    assert_eq!(prize_weighted(&mut rng, &empty, &[]), None);
    assert_eq!(
        prize_weighted(&mut rng, &[Symbol::K, Symbol::A], &[0, 0]),
        Some(Symbol::K)
    );
    for _ in 0..100 {
        assert_eq!(
            prize_weighted(&mut rng, &[Symbol::K, Symbol::A], &[0, 5]),
            Some(Symbol::A)
        );
    }
}
