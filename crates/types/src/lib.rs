//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, actor runtime, network protocol).
//!
//! # Grid Dimensions
//!
//! The default board is a 5x5 grid:
//!
//! - **Columns**: 5 (indexed 0-4, left to right)
//! - **Rows**: 5 (indexed 0-4, top to bottom)
//! - Cell value `0` is empty, `1..N_COLOURS` is a placed block colour
//!
//! # Game Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TIMER_BASE_MS` | 12000 | Countdown at level 0 |
//! | `TIMER_STEP_MS` | 500 | Countdown reduction per level |
//! | `TIMER_FLOOR_MS` | 2500 | Shortest countdown at any level |
//!
//! # Countdown by Level
//!
//! | Level | Countdown |
//! |-------|-----------|
//! | 0 | 12000ms |
//! | 1 | 11500ms |
//! | 10 | 7000ms |
//! | 19+ | 2500ms (floor) |
//!
//! # Examples
//!
//! ```
//! use tetrecs_types::{Coord, GameStatus, DEFAULT_COLS, DEFAULT_ROWS, PIECE_COUNT};
//!
//! assert_eq!(DEFAULT_COLS, 5);
//! assert_eq!(DEFAULT_ROWS, 5);
//! assert_eq!(PIECE_COUNT, 15);
//!
//! let c = Coord::new(3, 2);
//! assert_eq!((c.x, c.y), (3, 2));
//!
//! assert_eq!(GameStatus::from_str("running"), Some(GameStatus::Running));
//! ```

/// Default board width in cells (5 columns)
pub const DEFAULT_COLS: usize = 5;

/// Default board height in cells (5 rows)
pub const DEFAULT_ROWS: usize = 5;

/// Number of distinct piece shapes (ids `0..PIECE_COUNT`)
pub const PIECE_COUNT: u8 = 15;

/// Number of cell colours including the empty colour `0`
pub const N_COLOURS: u8 = 16;

/// Value of an empty cell
pub const EMPTY: u8 = 0;

/// Sentinel returned by grid reads outside the board
pub const OUT_OF_BOUNDS: i32 = -1;

/// Side length of the square piece mask
pub const MASK_SIZE: usize = 3;

/// Lives at the start of a game
pub const STARTING_LIVES: i32 = 3;

/// Lives value that marks a finished game
pub const GAME_OVER_LIVES: i32 = -1;

/// Multiplier at the start of a game and after any miss
pub const BASE_MULTIPLIER: u32 = 1;

/// Score needed per level
pub const POINTS_PER_LEVEL: u32 = 1000;

/// Points per cleared block before line and multiplier factors
pub const POINTS_PER_BLOCK: u32 = 10;

/// Countdown at level 0
pub const TIMER_BASE_MS: u32 = 12000;

/// Countdown reduction per level
pub const TIMER_STEP_MS: u32 = 500;

/// Shortest countdown at any level
pub const TIMER_FLOOR_MS: u32 = 2500;


/// Board coordinate of a single cell
///
/// `x` is the column, `y` is the row. Ordering is row-major so a sorted set of
/// coordinates reads top-left to bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

/// Lifecycle of a single game
///
/// - **Idle**: created, no pieces drawn, no countdown
/// - **Running**: pieces drawn, countdown armed, placements accepted
/// - **Stopped**: halted by its owner before lives ran out; terminal
/// - **GameOver**: terminal, lives reached -1
///
/// The cycle only moves forward: Idle → Running → (Stopped | GameOver)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Idle,
    Running,
    Stopped,
    GameOver,
}

impl GameStatus {
    /// Parse status from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "idle" => Some(GameStatus::Idle),
            "running" => Some(GameStatus::Running),
            "stopped" => Some(GameStatus::Stopped),
            "game_over" | "gameover" => Some(GameStatus::GameOver),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Idle => "idle",
            GameStatus::Running => "running",
            GameStatus::Stopped => "stopped",
            GameStatus::GameOver => "game_over",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Stopped | GameStatus::GameOver)
    }
}

/// Rotation state of a piece mask in quarter turns clockwise
///
/// The cycle goes: Spawn → Right → Flipped → Left → Spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Spawn,
    Right,
    Flipped,
    Left,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetrecs_types::Rotation;
    ///
    /// assert_eq!(Rotation::Spawn.rotate_cw(), Rotation::Right);
    /// assert_eq!(Rotation::Left.rotate_cw(), Rotation::Spawn);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::Spawn => Rotation::Right,
            Rotation::Right => Rotation::Flipped,
            Rotation::Flipped => Rotation::Left,
            Rotation::Left => Rotation::Spawn,
        }
    }
}
