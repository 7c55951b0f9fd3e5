//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains all the game rules, state management, and simulation logic.
//! It has **no dependencies** on timers, networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed (or same fed piece sequence) produces identical games
//! - **Testable**: Every rule is reachable through plain method calls
//! - **Portable**: Can run under any host (actor runtime, network client, headless bench)
//!
//! # Module Structure
//!
//! - [`grid`]: column-major cell grid with placement checks
//! - [`pieces`]: the 15 piece shapes and their 3x3 masks
//! - [`rng`]: piece sources (seeded random for solo, fed queue for multiplayer)
//! - [`scoring`]: score, multiplier, level and countdown rules
//! - [`events`]: events the engine emits after each transition
//! - [`engine`]: the complete game state machine
//! - [`snapshot`]: read-only copies of the game state
//!
//! # Game Rules
//!
//! - A piece is placed by the cell its mask centre lands on; nothing falls.
//! - After a placement, every full row **and** every full column is cleared at once.
//! - Lines clearing on consecutive placements grow the multiplier.
//! - A countdown runs per piece; letting it expire costs a life and the piece.
//! - The game ends when lives drop below zero.
//!
//! # Example
//!
//! ```
//! use tetrecs_core::{Engine, PlaceOutcome};
//!
//! let mut game = Engine::seeded(5, 5, 12345);
//! game.start();
//!
//! // Placing anything in the middle of an empty board always fits.
//! assert!(game.can_place_current(2, 2));
//! assert!(matches!(game.place_piece(2, 2), PlaceOutcome::Placed(_)));
//! assert!(game.grid().filled() > 0);
//! ```
//!
//! # Timing
//!
//! The engine owns one countdown but never sleeps. Hosts either call
//! [`Engine::tick`] with elapsed milliseconds or sleep on
//! [`Countdown::remaining_ms`] and then call [`Engine::on_timeout`] with the
//! countdown's ticket.

pub mod engine;
pub mod events;
pub mod grid;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use tetrecs_types as types;

// Re-export commonly used types for convenience
pub use engine::{
    Countdown, Engine, MultiplayerEngine, PlaceOutcome, PlacementReport, TimeoutOutcome,
};
pub use events::{GameEvent, Listener};
pub use grid::Grid;
pub use pieces::Piece;
pub use rng::{PieceQueue, PieceSource, RandomPieces, SimpleRng};
pub use scoring::{calculate_score, level_for_score, timer_delay_ms, ScoreResult};
pub use snapshot::{CountdownSnapshot, GameSnapshot, PieceSnapshot};
