//! Game session actor
//!
//! One task owns one engine. Everything that mutates the engine, including the
//! countdown expiring, arrives as a message on that task.

use std::time::Duration;

use anyhow::anyhow;
use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Instant};

use crate::core::{Engine, GameEvent, GameSnapshot, PieceSource, PlaceOutcome, TimeoutOutcome};

/// Pending commands a session buffers before senders wait
pub const COMMAND_CAPACITY: usize = 32;

/// Receiving end of a session's event stream
pub type EventStream = mpsc::UnboundedReceiver<GameEvent>;

/// Message handled by the session task
#[derive(Debug)]
pub enum SessionCommand {
    Start {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Place {
        x: i32,
        y: i32,
        reply: oneshot::Sender<PlaceOutcome>,
    },
    Rotate {
        times: u32,
        reply: oneshot::Sender<bool>,
    },
    Swap {
        reply: oneshot::Sender<bool>,
    },
    Enqueue {
        id: u8,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
    Shutdown,
}

/// Spawner for session tasks
pub struct GameSession;

impl GameSession {
    /// Move `engine` onto a new task, discarding its events
    pub fn spawn<S>(engine: Engine<S>) -> GameHandle
    where
        S: PieceSource + Send + 'static,
    {
        let (handle, _events) = Self::spawn_with_events(engine);
        handle
    }

    /// Move `engine` onto a new task and return its event stream
    ///
    /// Events arrive in the order the engine emitted them.
    pub fn spawn_with_events<S>(mut engine: Engine<S>) -> (GameHandle, EventStream)
    where
        S: PieceSource + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        engine.subscribe(move |event| {
            // A dropped stream just means nobody is watching.
            let _ = event_tx.send(event.clone());
        });

        tokio::spawn(run_session(engine, cmd_rx));
        (GameHandle { tx: cmd_tx }, event_rx)
    }
}

async fn run_session<S: PieceSource>(
    mut engine: Engine<S>,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    let timer = sleep(Duration::ZERO);
    tokio::pin!(timer);
    // Ticket of the countdown the timer currently tracks
    let mut tracked: Option<u64> = None;

    info!("[Session] Started");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(cmd) => handle_command(&mut engine, cmd),
                }
            }
            () = &mut timer, if tracked.is_some() => {
                if let Some(ticket) = tracked.take() {
                    match engine.on_timeout(ticket) {
                        TimeoutOutcome::Ignored => debug!("[Session] Timer {} was stale", ticket),
                        TimeoutOutcome::LifeLost { lives } => {
                            info!("[Session] Countdown expired, {} lives left", lives)
                        }
                        TimeoutOutcome::GameOver => info!("[Session] Countdown expired, game over"),
                    }
                }
            }
        }

        // Follow the engine's countdown with the one timer.
        let countdown = engine.countdown();
        if !countdown.is_armed() {
            tracked = None;
        } else if tracked != Some(countdown.ticket()) {
            let remaining = Duration::from_millis(u64::from(countdown.remaining_ms()));
            timer.as_mut().reset(Instant::now() + remaining);
            tracked = Some(countdown.ticket());
        }
    }

    engine.stop();
    info!("[Session] Shut down");
}

fn handle_command<S: PieceSource>(engine: &mut Engine<S>, cmd: SessionCommand) {
    // A caller that stopped waiting for its reply is not an error.
    match cmd {
        SessionCommand::Start { reply } => {
            engine.start();
            let _ = reply.send(());
        }
        SessionCommand::Stop { reply } => {
            engine.stop();
            let _ = reply.send(());
        }
        SessionCommand::Place { x, y, reply } => {
            let _ = reply.send(engine.place_piece(x, y));
        }
        SessionCommand::Rotate { times, reply } => {
            let _ = reply.send(engine.rotate_current_piece(times));
        }
        SessionCommand::Swap { reply } => {
            let _ = reply.send(engine.swap_current_and_following());
        }
        SessionCommand::Enqueue { id, reply } => {
            let accepted = engine.feed_piece(id);
            if !accepted {
                warn!("[Session] Refused piece id {}", id);
            }
            let _ = reply.send(accepted);
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(engine.snapshot());
        }
        SessionCommand::Shutdown => {}
    }
}

/// Cloneable handle to a running session
///
/// The session ends once every handle is dropped or [`GameHandle::shutdown`] is called.
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl GameHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> anyhow::Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| anyhow!("game session closed"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("game session ended before replying"))
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        self.request(|reply| SessionCommand::Start { reply }).await
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.request(|reply| SessionCommand::Stop { reply }).await
    }

    pub async fn place(&self, x: i32, y: i32) -> anyhow::Result<PlaceOutcome> {
        self.request(|reply| SessionCommand::Place { x, y, reply })
            .await
    }

    pub async fn rotate(&self, times: u32) -> anyhow::Result<bool> {
        self.request(|reply| SessionCommand::Rotate { times, reply })
            .await
    }

    pub async fn swap(&self) -> anyhow::Result<bool> {
        self.request(|reply| SessionCommand::Swap { reply }).await
    }

    /// Feed a piece id; false if the id is invalid or the engine draws its own pieces
    pub async fn enqueue(&self, id: u8) -> anyhow::Result<bool> {
        self.request(|reply| SessionCommand::Enqueue { id, reply })
            .await
    }

    pub async fn snapshot(&self) -> anyhow::Result<GameSnapshot> {
        self.request(|reply| SessionCommand::Snapshot { reply })
            .await
    }

    /// Ask the session to stop its engine and exit
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| anyhow!("game session closed"))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
