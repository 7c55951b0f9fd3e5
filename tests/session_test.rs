use std::time::Duration;

use tetrecs::core::{Engine, GameEvent, PlaceOutcome};
use tetrecs::engine::GameSession;
use tetrecs::types::GameStatus;
use tokio_test::{assert_err, assert_ok};

const DOT: u8 = 3;

#[tokio::test(start_paused = true)]
async fn session_multiplayer_game_runs_on_fed_pieces() {
    let (handle, mut events) = GameSession::spawn_with_events(Engine::multiplayer(5, 5));
    for _ in 0..6 {
        assert!(handle.enqueue(DOT).await.unwrap());
    }
    handle.start().await.unwrap();

    for x in 0..4 {
        assert!(handle.place(x, 0).await.unwrap().is_placed());
    }
    match handle.place(4, 0).await.unwrap() {
        PlaceOutcome::Placed(report) => assert_eq!(report.lines_cleared, 1),
        other => panic!("expected placement, got {:?}", other),
    }

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.score, 50);
    assert_eq!(snap.multiplier, 2);

    let mut cleared = 0;
    while let Ok(event) = events.try_recv() {
        if let GameEvent::LineCleared { lines, .. } = event {
            cleared += lines;
        }
    }
    assert_eq!(cleared, 1);
}

#[tokio::test(start_paused = true)]
async fn session_timer_follows_each_rearm() {
    let handle = GameSession::spawn(Engine::seeded(5, 5, 77));
    handle.start().await.unwrap();

    // Keep placing just before each deadline; no life is lost.
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(11_500)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.lives, 3);
        // Any fitting spot re-arms the countdown.
        let mut done = false;
        'scan: for y in 0..5 {
            for x in 0..5 {
                if handle.place(x, y).await.unwrap().is_placed() {
                    done = true;
                    break 'scan;
                }
            }
        }
        if !done {
            break;
        }
    }

    // Left alone, the latest countdown runs out exactly once.
    tokio::time::sleep(Duration::from_millis(12_100)).await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.lives, 2);
    assert_eq!(snap.status, GameStatus::Running);
}

#[tokio::test]
async fn session_rejects_commands_after_shutdown() {
    let handle = GameSession::spawn(Engine::seeded(5, 5, 2));
    let observer = handle.clone();
    assert_ok!(handle.start().await);
    assert_ok!(handle.shutdown().await);

    assert_err!(observer.place(2, 2).await);
    assert_err!(observer.snapshot().await);
}

#[tokio::test]
async fn session_ends_when_handles_drop() {
    let (handle, mut events) = GameSession::spawn_with_events(Engine::seeded(5, 5, 1));
    handle.start().await.unwrap();
    drop(handle);

    // The stream closes once the task drops the engine.
    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while events.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());
}
