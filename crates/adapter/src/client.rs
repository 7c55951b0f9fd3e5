//! Multiplayer client - feeds a game session from the shared sequence
//!
//! The client owns the TCP connection. The game itself runs in a
//! [`GameSession`](tetrecs_engine::GameSession); the client enqueues every
//! piece id it receives, starts the session once two pieces are buffered, and
//! reports score, lives, board and death back to the server.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::core::GameEvent;
use crate::engine::{EventStream, GameHandle};
use crate::protocol::*;
use crate::types::PIECE_COUNT;

/// Pieces the client tries to keep buffered ahead of the engine
pub const PREFETCH: u32 = 5;

/// Pieces that must be buffered before the game can start
pub const START_THRESHOLD: u64 = 2;

/// How long a dead client waits for the leaderboard that lists its death
pub const FINAL_SCORES_WAIT: Duration = Duration::from_secs(1);

/// What a finished client run saw
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientSummary {
    pub client_id: u64,
    /// Valid ids handed to the session
    pub pieces_received: u64,
    /// Ids refused with `invalid_piece`
    pub pieces_rejected: u64,
    pub final_score: u32,
    pub game_over: bool,
    /// Last leaderboard the server sent; after game over, the one showing this player dead
    pub leaderboard: Vec<PlayerScore>,
}

/// Connected, handshaken multiplayer client
pub struct MultiplayerClient {
    client_id: u64,
    name: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    seq: u64,
}

impl MultiplayerClient {
    /// Connect to `addr` and complete the hello/welcome handshake
    pub async fn connect(addr: SocketAddr, name: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {}", addr))?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            client_id: 0,
            name: name.to_string(),
            lines: BufReader::new(reader).lines(),
            writer,
            seq: 0,
        };

        client.send(&create_hello(name)).await?;
        loop {
            let Some(line) = client.lines.next_line().await? else {
                bail!("server closed the connection during handshake");
            };
            match parse_server_message(line.trim())? {
                Parsed::Message(Envelope {
                    body: ServerMessage::Welcome { client_id, protocol_version },
                    ..
                }) => {
                    info!(
                        "[Client] Joined as client {} (protocol {})",
                        client_id, protocol_version
                    );
                    client.client_id = client_id;
                    return Ok(client);
                }
                Parsed::Message(Envelope {
                    body: ServerMessage::Error { code, message },
                    ..
                }) => bail!("handshake refused ({}): {}", code.as_str(), message),
                other => debug!("[Client] Ignoring {:?} before welcome", other),
            }
        }
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    async fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        self.seq += 1;
        let mut line = encode(self.seq, msg)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Drive `session` from the server until the game ends or either side closes
    ///
    /// `events` must be the event stream of the same session.
    pub async fn run(
        mut self,
        session: GameHandle,
        mut events: EventStream,
    ) -> anyhow::Result<ClientSummary> {
        let mut feed = Feed::default();
        let mut summary = ClientSummary {
            client_id: self.client_id,
            ..ClientSummary::default()
        };

        self.request_more(&mut feed).await?;

        loop {
            tokio::select! {
                line = self.lines.next_line() => {
                    let Some(line) = line? else {
                        info!("[Client] Server closed the connection");
                        break;
                    };
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match parse_server_message(trimmed) {
                        Ok(Parsed::Message(Envelope { body, .. })) => {
                            self.on_server_message(body, &session, &mut feed, &mut summary)
                                .await?;
                        }
                        Ok(Parsed::Unknown { seq, detail }) => {
                            debug!("[Client] Skipping unknown message #{}: {}", seq, detail);
                        }
                        Err(e) => warn!("[Client] Unparseable line from server: {}", e),
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("[Client] Game session ended");
                        break;
                    };
                    if self.on_game_event(event, &session, &mut feed, &mut summary).await? {
                        self.await_final_scores(&mut summary).await?;
                        break;
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn on_server_message(
        &mut self,
        msg: ServerMessage,
        session: &GameHandle,
        feed: &mut Feed,
        summary: &mut ClientSummary,
    ) -> anyhow::Result<()> {
        match msg {
            ServerMessage::Piece { index, id } => {
                feed.outstanding = feed.outstanding.saturating_sub(1);
                if id >= PIECE_COUNT || !session.enqueue(id).await? {
                    warn!("[Client] Rejecting piece {} at index {}", id, index);
                    summary.pieces_rejected += 1;
                    self.send(&ClientMessage::Error {
                        code: ErrorCode::InvalidPiece,
                        message: format!("piece id {} at index {} is not a piece", id, index),
                    })
                    .await?;
                    return Ok(());
                }
                feed.enqueued += 1;
                summary.pieces_received += 1;

                if !feed.started && feed.enqueued >= START_THRESHOLD {
                    feed.started = true;
                    session.start().await?;
                    info!("[Client] Game started");
                }
                self.request_more(feed).await?;
            }
            ServerMessage::Scores { players } => {
                debug!("[Client] Leaderboard: {:?}", players);
                summary.leaderboard = players;
            }
            ServerMessage::Board { name, .. } => {
                debug!("[Client] Board update from {}", name);
            }
            ServerMessage::Error { code, message } => {
                warn!("[Client] Server error {}: {}", code.as_str(), message);
            }
            ServerMessage::Welcome { .. } => {
                return Err(anyhow!("unexpected second welcome"));
            }
        }
        Ok(())
    }

    /// Returns true once nothing more should be sent
    async fn on_game_event(
        &mut self,
        event: GameEvent,
        session: &GameHandle,
        feed: &mut Feed,
        summary: &mut ClientSummary,
    ) -> anyhow::Result<bool> {
        match event {
            GameEvent::NextPiece { .. } => {
                // Start draws two pieces but announces one advance.
                feed.drawn += if feed.drawn == 0 { START_THRESHOLD } else { 1 };
                self.request_more(feed).await?;
            }
            GameEvent::ScoreChanged { score, .. } => {
                if score != summary.final_score {
                    summary.final_score = score;
                    self.send(&ClientMessage::Score { score }).await?;
                }
            }
            GameEvent::LifeLost { lives } => {
                self.send(&ClientMessage::Lives { lives }).await?;
            }
            GameEvent::GameLoopArmed { .. } => {
                let cells = session.snapshot().await?.board;
                self.send(&ClientMessage::Board { cells }).await?;
            }
            GameEvent::GameOver { score } => {
                summary.final_score = score;
                summary.game_over = true;
                self.send(&ClientMessage::Die).await?;
                info!("[Client] Game over with score {}", score);
                return Ok(true);
            }
            _ => {}
        }
        Ok(false)
    }

    /// Read until the leaderboard shows this player dead, or give up after [`FINAL_SCORES_WAIT`]
    async fn await_final_scores(&mut self, summary: &mut ClientSummary) -> anyhow::Result<()> {
        let wait = tokio::time::timeout(FINAL_SCORES_WAIT, async {
            while let Some(line) = self.lines.next_line().await? {
                let Ok(Parsed::Message(Envelope {
                    body: ServerMessage::Scores { players },
                    ..
                })) = parse_server_message(line.trim())
                else {
                    continue;
                };
                let settled = players.iter().any(|p| p.name == self.name && p.dead);
                summary.leaderboard = players;
                if settled {
                    break;
                }
            }
            anyhow::Ok(())
        });
        match wait.await {
            Ok(result) => result,
            Err(_) => {
                debug!("[Client] No final leaderboard within {:?}", FINAL_SCORES_WAIT);
                Ok(())
            }
        }
    }

    /// Top the buffer back up to [`PREFETCH`] pieces
    async fn request_more(&mut self, feed: &mut Feed) -> anyhow::Result<()> {
        let count = feed.shortfall();
        if count > 0 {
            feed.outstanding += u64::from(count);
            self.send(&ClientMessage::PieceRequest { count }).await?;
        }
        Ok(())
    }
}

/// Piece accounting between server, client and engine
#[derive(Debug, Default)]
struct Feed {
    /// Requested but not yet received
    outstanding: u64,
    /// Handed to the session
    enqueued: u64,
    /// Drawn by the engine
    drawn: u64,
    started: bool,
}

impl Feed {
    fn buffered(&self) -> u64 {
        self.enqueued.saturating_sub(self.drawn)
    }

    fn shortfall(&self) -> u32 {
        let have = self.buffered() + self.outstanding;
        u64::from(PREFETCH).saturating_sub(have) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_feed_requests_full_prefetch() {
        let feed = Feed::default();
        assert_eq!(feed.shortfall(), PREFETCH);
    }

    #[test]
    fn test_outstanding_counts_toward_prefetch() {
        let feed = Feed {
            outstanding: 3,
            enqueued: 1,
            ..Feed::default()
        };
        assert_eq!(feed.shortfall(), 1);
    }

    #[test]
    fn test_draws_open_a_gap() {
        let feed = Feed {
            outstanding: 0,
            enqueued: 5,
            drawn: 2,
            started: true,
        };
        assert_eq!(feed.buffered(), 3);
        assert_eq!(feed.shortfall(), 2);
    }
}
