//! Adapter module - multiplayer sync via TCP socket with JSON protocol
//!
//! A server deals one shared piece sequence to every player so all grids see
//! the same pieces in the same order. Players report score, lives, board and
//! death; the server keeps a leaderboard and relays boards for spectating.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:9700)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Dealing**: Client sends `piece_request`, server answers with `piece` messages
//! 4. **Reporting**: Client sends `score`, `lives`, `board`, `die`; server broadcasts `scores`
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Handshake with player name
//! - **piece_request**: Next `count` pieces of the shared sequence
//! - **score** / **lives** / **die**: Leaderboard updates
//! - **board**: Grid cells, relayed to other players
//! - **error**: Report something the server sent that the client refused
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with the assigned client id
//! - **piece**: One `{index, id}` of the shared sequence
//! - **scores**: Leaderboard, highest score first
//! - **board**: Another player's grid
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `TETRECS_HOST`: Bind address (default: "127.0.0.1")
//! - `TETRECS_PORT`: Port number (default: 9700)
//! - `TETRECS_SEED`: Seed of the shared sequence (default: random)
//! - `TETRECS_MAX_CLIENTS`: Connection limit (default: 8)
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"seq":1,"type":"hello","name":"alice","protocol_version":"1.0.0"}
//! Server -> Client: {"seq":1,"type":"welcome","client_id":1,"protocol_version":"1.0.0"}
//! Client -> Server: {"seq":2,"type":"piece_request","count":2}
//! Server -> Client: {"seq":3,"type":"piece","index":0,"id":7}
//! Server -> Client: {"seq":4,"type":"piece","index":1,"id":12}
//! ```

pub mod client;
pub mod protocol;
pub mod server;

pub use tetrecs_core as core;
pub use tetrecs_engine as engine;
pub use tetrecs_types as types;

// Re-export protocol types for convenience
pub use client::{ClientSummary, MultiplayerClient, PREFETCH};
pub use protocol::*;
pub use server::{run_server, PieceSequence, ServerConfig};
