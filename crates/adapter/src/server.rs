//! TCP server dealing the shared piece sequence
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};

use crate::core::RandomPieces;
use crate::protocol::*;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seed of the shared piece sequence; random when unset
    pub seed: Option<u32>,
    pub max_clients: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9700,
            seed: None,
            max_clients: 8,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("TETRECS_HOST").unwrap_or(defaults.host);
        let port = env::var("TETRECS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let seed = env::var("TETRECS_SEED").ok().and_then(|s| s.trim().parse().ok());
        let max_clients = env::var("TETRECS_MAX_CLIENTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_clients);

        Self {
            host,
            port,
            seed,
            max_clients,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid socket address {}:{}", self.host, self.port))
    }
}

/// Lazily extended piece sequence shared by every client of a server
///
/// Index `n` is the same id for every caller, whenever it is asked for.
#[derive(Debug, Clone)]
pub struct PieceSequence {
    source: RandomPieces,
    ids: Vec<u8>,
}

impl PieceSequence {
    pub fn new(seed: u32) -> Self {
        Self {
            source: RandomPieces::new(seed),
            ids: Vec::new(),
        }
    }

    pub fn seed(&self) -> u32 {
        self.source.seed()
    }

    /// Id at `index`, generating up to it if needed
    pub fn get(&mut self, index: usize) -> u8 {
        while self.ids.len() <= index {
            let id = self.source.next_id();
            self.ids.push(id);
        }
        self.ids[index]
    }

    /// Ids generated so far
    pub fn generated(&self) -> &[u8] {
        &self.ids
    }
}

/// Handle to a connected client
#[derive(Debug)]
struct ClientHandle {
    id: u64,
    addr: SocketAddr,
    name: Option<String>,
    /// Next sequence index this client receives
    cursor: u64,
    score: u32,
    lives: i32,
    dead: bool,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ClientHandle {
    fn handshaken(&self) -> bool {
        self.name.is_some()
    }

    fn send(&self, msg: ServerMessage) {
        // Writer gone means the client is disconnecting; the reader cleans up.
        let _ = self.tx.send(msg);
    }

    /// Leaderboard entry, once the client has a name
    fn player_score(&self) -> Option<PlayerScore> {
        self.name.as_ref().map(|name| PlayerScore {
            name: name.clone(),
            score: self.score,
            lives: self.lives,
            dead: self.dead,
        })
    }
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    sequence: Mutex<PieceSequence>,
    clients: RwLock<Vec<ClientHandle>>,
    /// Players who left; they stay on the leaderboard with their last score
    finished: RwLock<Vec<PlayerScore>>,
}

impl ServerState {
    fn new(config: ServerConfig) -> Self {
        let seed = config
            .seed
            .unwrap_or_else(|| RandomPieces::from_entropy().seed());
        info!("[Server] Piece sequence seed {}", seed);
        Self {
            config,
            sequence: Mutex::new(PieceSequence::new(seed)),
            clients: RwLock::new(Vec::new()),
            finished: RwLock::new(Vec::new()),
        }
    }

    async fn send_to(&self, client_id: u64, msg: ServerMessage) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            c.send(msg);
        }
    }

    /// Everyone who has played, connected or not, highest score first
    async fn leaderboard(&self) -> Vec<PlayerScore> {
        let mut players: Vec<PlayerScore> = {
            let clients = self.clients.read().await;
            clients.iter().filter_map(ClientHandle::player_score).collect()
        };
        players.extend(self.finished.read().await.iter().cloned());
        players.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        players
    }

    /// Drop a disconnected client, keeping its score if it had joined
    ///
    /// A player that leaves can no longer play, so its entry is marked dead.
    async fn retire(&self, client_id: u64) {
        let departed = {
            let mut clients = self.clients.write().await;
            let index = clients.iter().position(|c| c.id == client_id);
            index.map(|i| clients.remove(i))
        };
        let Some(mut player) = departed.as_ref().and_then(ClientHandle::player_score) else {
            return;
        };
        player.dead = true;
        self.finished.write().await.push(player);
        self.broadcast_scores().await;
    }

    async fn broadcast_scores(&self) {
        let players = self.leaderboard().await;
        let clients = self.clients.read().await;

        for c in clients.iter().filter(|c| c.handshaken()) {
            c.send(ServerMessage::Scores {
                players: players.clone(),
            });
        }
    }
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up, which lets
/// callers bind port 0.
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!("[Server] Listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0u64;

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!("[Server] Client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, Arc::clone(&state)).await {
                warn!("[Server] Client {} error: {:#}", client_id, e);
            }
            state.retire(client_id).await;
            info!("[Server] Client {} disconnected", client_id);
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: u64,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Spawn task to write messages to client
    let write_task = tokio::spawn(async move {
        let mut seq = 0u64;
        while let Some(msg) = rx.recv().await {
            seq += 1;
            let mut line = match encode(seq, &msg) {
                Ok(line) => line,
                Err(e) => {
                    warn!("[Server] Failed to encode {:?}: {}", msg, e);
                    continue;
                }
            };
            line.push('\n');
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    {
        let mut clients = state.clients.write().await;
        if clients.len() >= state.config.max_clients {
            warn!("[Server] Refusing client {}: server full", client_id);
            let _ = tx.send(create_error(ErrorCode::ServerFull, "server is full"));
            drop(tx);
            drop(clients);
            let _ = write_task.await;
            return Ok(());
        }
        clients.push(ClientHandle {
            id: client_id,
            addr,
            name: None,
            cursor: 0,
            score: 0,
            lives: crate::types::STARTING_LIVES,
            dead: false,
            tx: tx.clone(),
        });
    }
    // The registered handle keeps the writer alive from here on.
    drop(tx);

    // Handle incoming messages
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            // Client disconnected
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_client_message(trimmed) {
            Ok(Parsed::Message(Envelope { seq, body })) => {
                debug!("[Server] Client {} sent #{} {:?}", client_id, seq, body);
                handle_message(&state, client_id, body).await;
            }
            Ok(Parsed::Unknown { seq, detail }) => {
                debug!("[Server] Client {} sent unknown #{}: {}", client_id, seq, detail);
                state
                    .send_to(
                        client_id,
                        create_error(ErrorCode::InvalidMessage, &format!("unrecognised message #{}", seq)),
                    )
                    .await;
            }
            Err(e) => {
                state
                    .send_to(
                        client_id,
                        create_error(ErrorCode::InvalidMessage, &format!("invalid JSON: {}", e)),
                    )
                    .await;
            }
        }
    }

    write_task.abort();
    Ok(())
}

async fn handle_message(state: &Arc<ServerState>, client_id: u64, msg: ClientMessage) {
    let handshaken = {
        let clients = state.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(ClientHandle::handshaken)
            .unwrap_or(false)
    };

    match msg {
        ClientMessage::Hello {
            name,
            protocol_version,
        } => {
            if let Some(version) = protocol_version.as_deref() {
                if version != PROTOCOL_VERSION {
                    state
                        .send_to(
                            client_id,
                            create_error(
                                ErrorCode::ProtocolMismatch,
                                &format!("server speaks {}", PROTOCOL_VERSION),
                            ),
                        )
                        .await;
                    return;
                }
            }
            {
                let mut clients = state.clients.write().await;
                if let Some(c) = clients.iter_mut().find(|c| c.id == client_id) {
                    info!("[Server] Client {} ({}) is {}", client_id, c.addr, name);
                    c.name = Some(name);
                    c.send(create_welcome(client_id));
                }
            }
            state.broadcast_scores().await;
        }
        _ if !handshaken => {
            state
                .send_to(
                    client_id,
                    create_error(ErrorCode::HandshakeRequired, "send hello first"),
                )
                .await;
        }
        ClientMessage::PieceRequest { count } => {
            if count == 0 || count > MAX_PIECE_BATCH {
                state
                    .send_to(
                        client_id,
                        create_error(
                            ErrorCode::InvalidRequest,
                            &format!("count must be 1..={}", MAX_PIECE_BATCH),
                        ),
                    )
                    .await;
                return;
            }
            deal_pieces(state, client_id, count).await;
        }
        ClientMessage::Score { score } => {
            update_player(state, client_id, |c| c.score = score).await;
        }
        ClientMessage::Lives { lives } => {
            update_player(state, client_id, |c| c.lives = lives).await;
        }
        ClientMessage::Die => {
            info!("[Server] Client {} died", client_id);
            update_player(state, client_id, |c| c.dead = true).await;
        }
        ClientMessage::Board { cells } => {
            let clients = state.clients.read().await;
            let Some(name) = clients
                .iter()
                .find(|c| c.id == client_id)
                .and_then(|c| c.name.clone())
            else {
                return;
            };
            for c in clients
                .iter()
                .filter(|c| c.id != client_id && c.handshaken())
            {
                c.send(ServerMessage::Board {
                    client_id,
                    name: name.clone(),
                    cells: cells.clone(),
                });
            }
        }
        ClientMessage::Error { code, message } => {
            warn!(
                "[Server] Client {} reported {}: {}",
                client_id,
                code.as_str(),
                message
            );
        }
    }
}

/// Send the next `count` ids of the shared sequence to one client
async fn deal_pieces(state: &Arc<ServerState>, client_id: u64, count: u32) {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return;
    };
    let mut sequence = state.sequence.lock().await;
    for _ in 0..count {
        let index = client.cursor;
        let id = sequence.get(index as usize);
        client.cursor += 1;
        client.send(ServerMessage::Piece { index, id });
    }
    debug!(
        "[Server] Dealt {} pieces to client {} (cursor {})",
        count, client_id, client.cursor
    );
}

async fn update_player(
    state: &Arc<ServerState>,
    client_id: u64,
    update: impl FnOnce(&mut ClientHandle),
) {
    {
        let mut clients = state.clients.write().await;
        if let Some(c) = clients.iter_mut().find(|c| c.id == client_id) {
            update(c);
        }
    }
    state.broadcast_scores().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9700);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_clients, 8);
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:9700".parse().unwrap()
        );
    }

    #[test]
    fn test_bad_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_sequence_is_stable_regardless_of_access_order() {
        let mut a = PieceSequence::new(42);
        let mut b = PieceSequence::new(42);

        let late = a.get(9);
        let early: Vec<u8> = (0..10).map(|i| b.get(i)).collect();
        assert_eq!(early[9], late);
        assert_eq!(a.generated(), b.generated());
        assert!(early.iter().all(|&id| id < crate::types::PIECE_COUNT));
    }

    fn register(
        state: &ServerState,
        id: u64,
        name: &str,
        score: u32,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ClientHandle {
            id,
            addr: "127.0.0.1:1".parse().unwrap(),
            name: Some(name.to_string()),
            cursor: 0,
            score,
            lives: crate::types::STARTING_LIVES,
            dead: false,
            tx,
        };
        state.clients.try_write().unwrap().push(handle);
        rx
    }

    #[tokio::test]
    async fn test_retired_player_stays_on_leaderboard() {
        let state = ServerState::new(ServerConfig {
            seed: Some(1),
            ..ServerConfig::default()
        });
        let mut alice = register(&state, 1, "alice", 100);
        let _bob = register(&state, 2, "bob", 400);

        state.retire(2).await;
        assert_eq!(state.clients.read().await.len(), 1);

        let Some(ServerMessage::Scores { players }) = alice.recv().await else {
            panic!("expected a leaderboard broadcast");
        };
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "bob");
        assert_eq!(players[0].score, 400);
        assert!(players[0].dead);
        assert_eq!(players[1].name, "alice");
        assert!(!players[1].dead);
    }

    #[tokio::test]
    async fn test_retiring_unnamed_client_changes_nothing() {
        let state = ServerState::new(ServerConfig::default());
        let mut alice = register(&state, 1, "alice", 0);
        let (tx, _rx) = mpsc::unbounded_channel();
        state.clients.write().await.push(ClientHandle {
            id: 2,
            addr: "127.0.0.1:2".parse().unwrap(),
            name: None,
            cursor: 0,
            score: 0,
            lives: crate::types::STARTING_LIVES,
            dead: false,
            tx,
        });

        state.retire(2).await;
        assert!(state.finished.read().await.is_empty());
        assert!(alice.try_recv().is_err());
        assert_eq!(state.leaderboard().await.len(), 1);
    }

    #[test]
    fn test_sequence_matches_random_source() {
        let mut seq = PieceSequence::new(7);
        let mut source = RandomPieces::new(7);
        for i in 0..20 {
            assert_eq!(seq.get(i), source.next_id());
        }
        assert_eq!(seq.seed(), 7);
    }
}
