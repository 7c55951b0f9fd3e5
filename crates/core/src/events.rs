//! Events emitted by the engine after each state change
//!
//! Listeners are called synchronously, in the order the engine applied the
//! transitions. Renderers, audio cues and the network layer all subscribe here
//! instead of binding to engine fields.

use std::collections::BTreeSet;

use crate::pieces::Piece;
use crate::types::{Coord, Rotation};

/// Something that just happened inside an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The piece pair advanced (also fired once by `start`)
    NextPiece { current: Piece, following: Piece },
    /// A placement filled at least one row or column; `coords` were reset to empty
    LineCleared { coords: BTreeSet<Coord>, lines: u32 },
    /// A fresh countdown of `delay_ms` began now
    GameLoopArmed { delay_ms: u32, ticket: u64 },
    /// The current piece was written into the grid centred on (x, y)
    PiecePlaced { x: i32, y: i32, value: u8 },
    /// A placement at (x, y) did not fit
    PlacementRejected { x: i32, y: i32 },
    /// Score, level or multiplier changed
    ScoreChanged { score: u32, level: u32, multiplier: u32 },
    /// Level strictly increased
    LevelUp { level: u32 },
    /// The countdown ran out
    LifeLost { lives: i32 },
    PieceRotated { rotation: Rotation },
    PiecesSwapped { current: Piece, following: Piece },
    /// Lives reached -1; the engine accepts nothing further
    GameOver { score: u32 },
}

impl GameEvent {
    /// Short stable name, used in logs and by the network layer
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::NextPiece { .. } => "next_piece",
            GameEvent::LineCleared { .. } => "line_cleared",
            GameEvent::GameLoopArmed { .. } => "game_loop_armed",
            GameEvent::PiecePlaced { .. } => "piece_placed",
            GameEvent::PlacementRejected { .. } => "placement_rejected",
            GameEvent::ScoreChanged { .. } => "score_changed",
            GameEvent::LevelUp { .. } => "level_up",
            GameEvent::LifeLost { .. } => "life_lost",
            GameEvent::PieceRotated { .. } => "piece_rotated",
            GameEvent::PiecesSwapped { .. } => "pieces_swapped",
            GameEvent::GameOver { .. } => "game_over",
        }
    }
}

/// Registered event callback
pub type Listener = Box<dyn FnMut(&GameEvent) + Send>;
