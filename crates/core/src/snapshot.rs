use std::hash::{Hash, Hasher};

use crate::pieces::Piece;
use crate::types::{GameStatus, Rotation};

/// Stable 64-bit FNV-1a hasher for deterministic `board_hash`.
///
/// We avoid `DefaultHasher` here since its output is not guaranteed stable across
/// Rust versions/platforms, and clients compare hashes with each other.
#[derive(Debug, Clone)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSnapshot {
    pub id: u8,
    pub value: u8,
    pub rotation: Rotation,
}

impl From<&Piece> for PieceSnapshot {
    fn from(value: &Piece) -> Self {
        Self {
            id: value.id(),
            value: value.value(),
            rotation: value.rotation(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountdownSnapshot {
    pub armed: bool,
    pub delay_ms: u32,
    pub remaining_ms: u32,
}

/// Read-only copy of everything a renderer or peer needs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub cols: usize,
    pub rows: usize,
    /// Row-major cell values
    pub board: Vec<Vec<u8>>,
    pub status: GameStatus,
    pub score: u32,
    pub level: u32,
    pub lives: i32,
    pub multiplier: u32,
    pub current: Option<PieceSnapshot>,
    pub following: Option<PieceSnapshot>,
    pub countdown: CountdownSnapshot,
}

impl GameSnapshot {
    /// Hash of the board cells alone; equal boards hash equal on every platform
    pub fn board_hash(&self) -> u64 {
        let mut hasher = Fnv1aHasher::new();
        self.cols.hash(&mut hasher);
        self.rows.hash(&mut hasher);
        self.board.hash(&mut hasher);
        hasher.finish()
    }
}
