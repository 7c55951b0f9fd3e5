//! Protocol module - JSON message types for multiplayer sync
//!
//! Line-delimited JSON. Every message is one object on one line carrying
//! `type` and `seq` (a per-sender counter starting at 1).

use serde::{Deserialize, Serialize};

/// Version spoken by this server and client
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Largest `piece_request.count` a server honours in one message
pub const MAX_PIECE_BATCH: u32 = 64;

/// Wire frame: a sequence number plus a tagged message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub seq: u64,
    #[serde(flatten)]
    pub body: T,
}

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message on a connection
    Hello {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        protocol_version: Option<String>,
    },
    /// Ask for the next `count` pieces of the shared sequence
    PieceRequest { count: u32 },
    Score { score: u32 },
    Lives { lives: i32 },
    /// Row-major cell values of the sender's grid
    Board { cells: Vec<Vec<u8>> },
    Die,
    /// Report a problem with something the server sent
    Error { code: ErrorCode, message: String },
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        client_id: u64,
        protocol_version: String,
    },
    /// Piece `index` of the shared sequence
    Piece { index: u64, id: u8 },
    /// Leaderboard, highest score first
    Scores { players: Vec<PlayerScore> },
    /// Another player's grid, for spectating
    Board {
        client_id: u64,
        name: String,
        cells: Vec<Vec<u8>>,
    },
    Error { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub name: String,
    pub score: u32,
    pub lives: i32,
    pub dead: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    ProtocolMismatch,
    InvalidMessage,
    InvalidRequest,
    InvalidPiece,
    ServerFull,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::HandshakeRequired => "handshake_required",
            ErrorCode::ProtocolMismatch => "protocol_mismatch",
            ErrorCode::InvalidMessage => "invalid_message",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidPiece => "invalid_piece",
            ErrorCode::ServerFull => "server_full",
        }
    }
}

// ============== Parsing ==============

/// Outcome of parsing one inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    Message(Envelope<T>),
    /// Valid JSON that is not a known message; `seq` recovered when present
    Unknown { seq: u64, detail: String },
}

fn parse_line<T>(json: &str) -> Result<Parsed<T>, serde_json::Error>
where
    T: for<'de> Deserialize<'de>,
{
    match serde_json::from_str::<Envelope<T>>(json) {
        Ok(envelope) => Ok(Parsed::Message(envelope)),
        Err(e) => {
            // Anything that is at least a JSON object gets a reply instead of a hangup.
            #[derive(Debug, Deserialize)]
            struct SeqOnly {
                seq: Option<u64>,
            }
            let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
            Ok(Parsed::Unknown {
                seq,
                detail: e.to_string(),
            })
        }
    }
}

/// Parse a line a client sent
pub fn parse_client_message(json: &str) -> Result<Parsed<ClientMessage>, serde_json::Error> {
    parse_line(json)
}

/// Parse a line a server sent
pub fn parse_server_message(json: &str) -> Result<Parsed<ServerMessage>, serde_json::Error> {
    parse_line(json)
}

/// Serialize a framed message without the trailing newline
pub fn encode<T: Serialize>(seq: u64, body: &T) -> Result<String, serde_json::Error> {
    #[derive(Serialize)]
    struct Frame<'a, T> {
        seq: u64,
        #[serde(flatten)]
        body: &'a T,
    }
    serde_json::to_string(&Frame { seq, body })
}

// ============== Utility Functions ==============

pub fn create_hello(name: &str) -> ClientMessage {
    ClientMessage::Hello {
        name: name.to_string(),
        protocol_version: Some(PROTOCOL_VERSION.to_string()),
    }
}

pub fn create_welcome(client_id: u64) -> ServerMessage {
    ServerMessage::Welcome {
        client_id,
        protocol_version: PROTOCOL_VERSION.to_string(),
    }
}

pub fn create_error(code: ErrorCode, message: &str) -> ServerMessage {
    ServerMessage::Error {
        code,
        message: message.to_string(),
    }
}
