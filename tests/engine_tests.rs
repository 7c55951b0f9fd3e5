//! Engine tests - game rules through the public API

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tetrecs::core::{
    Engine, GameEvent, MultiplayerEngine, Piece, PieceQueue, PlaceOutcome, TimeoutOutcome,
};
use tetrecs::types::{Coord, GameStatus, BASE_MULTIPLIER, STARTING_LIVES};

const DOT: u8 = 3;
const LINE: u8 = 0;

fn multiplayer(ids: &[u8]) -> MultiplayerEngine {
    let mut engine = Engine::multiplayer(5, 5);
    for &id in ids {
        assert!(engine.enqueue_piece(id));
    }
    engine
}

fn placed(outcome: PlaceOutcome) -> tetrecs::core::PlacementReport {
    match outcome {
        PlaceOutcome::Placed(report) => report,
        other => panic!("expected placement, got {:?}", other),
    }
}

#[test]
fn test_solo_game_starts_with_defaults() {
    let mut engine = Engine::seeded(5, 5, 12345);
    engine.start();

    assert_eq!(engine.status(), GameStatus::Running);
    assert_eq!(engine.score(), 0);
    assert_eq!(engine.level(), 0);
    assert_eq!(engine.lives(), STARTING_LIVES);
    assert_eq!(engine.multiplier(), BASE_MULTIPLIER);
    assert!(engine.current_piece().is_some());
    assert!(engine.following_piece().is_some());
    assert_eq!(engine.countdown().delay_ms(), 12_000);
}

#[test]
fn test_same_seed_same_pieces() {
    let mut a = Engine::seeded(5, 5, 99);
    let mut b = Engine::seeded(5, 5, 99);
    a.start();
    b.start();
    for _ in 0..10 {
        assert_eq!(a.current_piece(), b.current_piece());
        assert_eq!(a.following_piece(), b.following_piece());
        let ta = a.countdown().ticket();
        let tb = b.countdown().ticket();
        a.on_timeout(ta);
        b.on_timeout(tb);
        if a.game_over() {
            break;
        }
    }
}

#[test]
fn test_row_clear_scores_through_placements() {
    // Five dots across row 2 fill it on the fifth placement.
    let mut engine = multiplayer(&[DOT; 7]);
    engine.start();

    for x in 0..4 {
        let report = placed(engine.place_piece(x, 2));
        assert_eq!(report.lines_cleared, 0);
    }
    assert_eq!(engine.score(), 0);

    let report = placed(engine.place_piece(4, 2));
    assert_eq!(report.lines_cleared, 1);
    assert_eq!(report.blocks_cleared, 5);
    assert_eq!(report.points, 50);
    assert_eq!(engine.score(), 50);
    assert_eq!(engine.multiplier(), 2);
    assert_eq!(engine.grid().filled(), 0);
    let row: BTreeSet<Coord> = (0..5).map(|x| Coord::new(x, 2)).collect();
    assert_eq!(report.cleared, row);
}

#[test]
fn test_row_and_column_cleared_together() {
    let mut engine = multiplayer(&[DOT; 11]);
    engine.start();

    // Row 2 and column 3, each missing only (3, 2).
    for (x, y) in [(0, 2), (1, 2), (2, 2), (4, 2), (3, 0), (3, 1), (3, 3), (3, 4)] {
        let report = placed(engine.place_piece(x, y));
        assert_eq!(report.lines_cleared, 0);
    }

    let report = placed(engine.place_piece(3, 2));
    assert_eq!(report.lines_cleared, 2);
    assert_eq!(report.blocks_cleared, 9);
    assert_eq!(report.points, 2 * 9 * 10);
    assert_eq!(engine.score(), 180);
    assert_eq!(engine.grid().filled(), 0);
}

#[test]
fn test_multiplier_grows_on_consecutive_clears() {
    let mut engine = multiplayer(&[DOT; 13]);
    engine.start();

    // Fill rows 0 and 1 except column 4, then finish each in turn.
    for y in 0..2 {
        for x in 0..4 {
            placed(engine.place_piece(x, y));
        }
    }
    assert_eq!(engine.multiplier(), 1);

    assert_eq!(placed(engine.place_piece(4, 0)).points, 50);
    assert_eq!(engine.multiplier(), 2);
    assert_eq!(placed(engine.place_piece(4, 1)).points, 100);
    assert_eq!(engine.multiplier(), 3);
    assert_eq!(engine.score(), 150);

    // A miss drops it straight back.
    placed(engine.place_piece(2, 3));
    assert_eq!(engine.multiplier(), 1);
}

#[test]
fn test_rejected_placement_keeps_piece_and_countdown() {
    let mut engine = multiplayer(&[LINE, DOT, DOT]);
    engine.start();
    let ticket = engine.countdown().ticket();

    assert_eq!(engine.place_piece(2, 0), PlaceOutcome::Rejected);
    assert_eq!(engine.place_piece(-3, 9), PlaceOutcome::Rejected);
    assert_eq!(engine.current_piece().map(Piece::id), Some(LINE));
    assert_eq!(engine.countdown().ticket(), ticket);
    assert_eq!(engine.grid().filled(), 0);
}

#[test]
fn test_lives_run_down_to_game_over() {
    let mut engine = Engine::seeded(5, 5, 1);
    engine.start();

    let mut seen = Vec::new();
    loop {
        let ticket = engine.countdown().ticket();
        match engine.on_timeout(ticket) {
            TimeoutOutcome::LifeLost { lives } => seen.push(lives),
            TimeoutOutcome::GameOver => break,
            TimeoutOutcome::Ignored => panic!("live ticket ignored"),
        }
    }

    assert_eq!(seen, vec![2, 1, 0]);
    assert_eq!(engine.lives(), -1);
    assert_eq!(engine.status(), GameStatus::GameOver);
    assert_eq!(engine.place_piece(2, 2), PlaceOutcome::Inactive);
}

#[test]
fn test_tick_drives_the_countdown() {
    let mut engine = Engine::seeded(5, 5, 8);
    engine.start();

    for _ in 0..11 {
        assert_eq!(engine.tick(1_000), TimeoutOutcome::Ignored);
    }
    assert_eq!(engine.countdown().remaining_ms(), 1_000);
    assert_eq!(engine.tick(1_000), TimeoutOutcome::LifeLost { lives: 2 });
    assert_eq!(engine.countdown().remaining_ms(), 12_000);
}

#[test]
fn test_stale_and_stopped_timeouts_are_ignored() {
    let mut engine = multiplayer(&[DOT; 4]);
    engine.start();
    let first = engine.countdown().ticket();

    placed(engine.place_piece(0, 0));
    assert_eq!(engine.on_timeout(first), TimeoutOutcome::Ignored);

    let second = engine.countdown().ticket();
    engine.stop();
    engine.stop();
    assert_eq!(engine.on_timeout(second), TimeoutOutcome::Ignored);
    assert_eq!(engine.lives(), STARTING_LIVES);
    assert_eq!(engine.status(), GameStatus::Stopped);
}

#[test]
fn test_listener_wrappers_fire() {
    let mut engine = multiplayer(&[DOT; 8]);
    let next = Arc::new(Mutex::new(Vec::new()));
    let cleared = Arc::new(Mutex::new(Vec::new()));
    let armed = Arc::new(Mutex::new(Vec::new()));

    {
        let next = Arc::clone(&next);
        engine.on_next_piece(move |current, following| {
            next.lock().unwrap().push((current.id(), following.id()));
        });
        let cleared = Arc::clone(&cleared);
        engine.on_line_cleared(move |coords| cleared.lock().unwrap().push(coords.len()));
        let armed = Arc::clone(&armed);
        engine.on_game_loop_armed(move |delay| armed.lock().unwrap().push(delay));
    }

    engine.start();
    for x in 0..5 {
        placed(engine.place_piece(x, 4));
    }

    assert_eq!(next.lock().unwrap().len(), 6);
    assert_eq!(*cleared.lock().unwrap(), vec![5]);
    assert_eq!(*armed.lock().unwrap(), vec![12_000; 6]);
}

#[test]
fn test_events_arrive_in_transition_order() {
    let mut engine = multiplayer(&[DOT; 4]);
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.subscribe(move |e: &GameEvent| sink.lock().unwrap().push(e.name()));

    engine.start();
    engine.rotate_current_piece(1);
    engine.swap_current_and_following();
    engine.place_piece(2, 2);

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "next_piece",
            "game_loop_armed",
            "piece_rotated",
            "pieces_swapped",
            "piece_placed",
            "next_piece",
            "game_loop_armed",
        ]
    );
}

#[test]
fn test_closure_piece_source() {
    let mut ids = [4u8, 9, 14].into_iter().cycle();
    let mut engine = Engine::new(5, 5, move || {
        Piece::from_id(ids.next().unwrap_or(0)).unwrap_or_else(|| unreachable!())
    });
    engine.start();
    assert_eq!(engine.current_piece().map(Piece::id), Some(4));
    assert_eq!(engine.following_piece().map(Piece::id), Some(9));
    assert!(!engine.feed_piece(1));
}

#[test]
fn test_identical_feeds_give_identical_grids() {
    let ids = [7u8, 2, 11, 3, 0, 14, 5, 9, 3, 3, 12, 1];
    let moves = [(1, 1), (3, 3), (2, 2), (1, 3), (3, 1), (0, 0), (4, 4), (2, 0)];

    let play = || {
        let mut engine = Engine::with_grid(
            tetrecs::core::Grid::default(),
            PieceQueue::from_ids(ids),
        );
        engine.start();
        let outcomes: Vec<bool> = moves
            .iter()
            .map(|&(x, y)| engine.place_piece(x, y).is_placed())
            .collect();
        (engine.snapshot(), outcomes)
    };

    let (a, outcomes_a) = play();
    let (b, outcomes_b) = play();
    assert_eq!(outcomes_a, outcomes_b);
    assert_eq!(a.board, b.board);
    assert_eq!(a.board_hash(), b.board_hash());
    assert_eq!(a.score, b.score);
}

#[test]
#[should_panic(expected = "piece queue underrun")]
fn test_multiplayer_underrun_panics() {
    let mut engine = multiplayer(&[DOT, DOT]);
    engine.start();
    engine.place_piece(2, 2);
}
