//! Engine module - manages the complete game state
//!
//! This module ties together all core components: grid, pieces, piece source and
//! scoring. It handles placements, line clears, the per-piece countdown and the
//! game lifecycle.
//!
//! The engine is purely synchronous. It never sleeps and never spawns; whoever
//! owns it either calls [`Engine::tick`] with elapsed time or waits for
//! [`Engine::countdown`] to run out and calls [`Engine::on_timeout`] with the
//! ticket it was armed with.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::events::{GameEvent, Listener};
use crate::grid::Grid;
use crate::pieces::Piece;
use crate::rng::{PieceQueue, PieceSource, RandomPieces};
use crate::scoring::{calculate_score, level_for_score, timer_delay_ms};
use crate::snapshot::{CountdownSnapshot, GameSnapshot, PieceSnapshot};
use crate::types::*;

/// The single countdown of an engine
///
/// Every arm bumps `ticket`; a timeout carrying an older ticket is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    ticket: u64,
    delay_ms: u32,
    elapsed_ms: u32,
    armed: bool,
}

impl Countdown {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn remaining_ms(&self) -> u32 {
        self.delay_ms.saturating_sub(self.elapsed_ms)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    fn arm(&mut self, delay_ms: u32) {
        self.ticket = self.ticket.wrapping_add(1);
        self.delay_ms = delay_ms;
        self.elapsed_ms = 0;
        self.armed = true;
    }

    fn disarm(&mut self) {
        // Bump the ticket too so a callback scheduled before this point is stale.
        self.ticket = self.ticket.wrapping_add(1);
        self.elapsed_ms = 0;
        self.armed = false;
    }
}

/// Result of a successful placement's line resolution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlacementReport {
    /// Full rows plus full columns
    pub lines_cleared: u32,
    /// Unique cells reset to empty
    pub blocks_cleared: u32,
    pub points: u32,
    pub level_up: bool,
    pub cleared: BTreeSet<Coord>,
}

/// Result of [`Engine::place_piece`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    Placed(PlacementReport),
    /// The piece did not fit; nothing changed
    Rejected,
    /// The engine is not running; nothing changed
    Inactive,
}

impl PlaceOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlaceOutcome::Placed(_))
    }
}

/// Result of a countdown expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// Stale ticket or engine not running
    Ignored,
    LifeLost { lives: i32 },
    GameOver,
}

/// Complete game state
pub struct Engine<S = RandomPieces> {
    grid: Grid,
    source: S,
    current: Option<Piece>,
    following: Option<Piece>,
    score: u32,
    level: u32,
    lives: i32,
    multiplier: u32,
    status: GameStatus,
    countdown: Countdown,
    listeners: Vec<Listener>,
}

/// Engine whose pieces arrive from the network in a shared order
pub type MultiplayerEngine = Engine<PieceQueue>;

impl<S> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("grid", &self.grid)
            .field("current", &self.current)
            .field("following", &self.following)
            .field("score", &self.score)
            .field("level", &self.level)
            .field("lives", &self.lives)
            .field("multiplier", &self.multiplier)
            .field("status", &self.status)
            .field("countdown", &self.countdown)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Engine<RandomPieces> {
    /// Solo game drawing uniformly random pieces
    pub fn solo(cols: usize, rows: usize) -> Self {
        Self::new(cols, rows, RandomPieces::from_entropy())
    }

    /// Solo game whose piece sequence is fixed by `seed`
    pub fn seeded(cols: usize, rows: usize, seed: u32) -> Self {
        Self::new(cols, rows, RandomPieces::new(seed))
    }
}

impl Engine<PieceQueue> {
    /// Multiplayer game; feed it with [`Engine::enqueue_piece`] before `start`
    pub fn multiplayer(cols: usize, rows: usize) -> Self {
        Self::new(cols, rows, PieceQueue::new())
    }

    /// Append the piece for a network-delivered id
    /// Returns false if the id is not a piece
    pub fn enqueue_piece(&mut self, id: u8) -> bool {
        self.source.enqueue(id)
    }

    /// Pieces buffered and not yet drawn
    pub fn queued_pieces(&self) -> usize {
        self.source.len()
    }
}

impl<S: PieceSource> Engine<S> {
    /// Create a new game on an empty `cols` x `rows` grid
    pub fn new(cols: usize, rows: usize, source: S) -> Self {
        Self::with_grid(Grid::new(cols, rows), source)
    }

    /// Create a new game on a prepared grid
    pub fn with_grid(grid: Grid, source: S) -> Self {
        Self {
            grid,
            source,
            current: None,
            following: None,
            score: 0,
            level: 0,
            lives: STARTING_LIVES,
            multiplier: BASE_MULTIPLIER,
            status: GameStatus::Idle,
            countdown: Countdown::default(),
            listeners: Vec::new(),
        }
    }

    // ============== Events ==============

    /// Register a callback for every event
    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Register a callback for piece advances
    pub fn on_next_piece(&mut self, mut f: impl FnMut(&Piece, &Piece) + Send + 'static) {
        self.subscribe(move |event| {
            if let GameEvent::NextPiece { current, following } = event {
                f(current, following);
            }
        });
    }

    /// Register a callback for line clears
    pub fn on_line_cleared(&mut self, mut f: impl FnMut(&BTreeSet<Coord>) + Send + 'static) {
        self.subscribe(move |event| {
            if let GameEvent::LineCleared { coords, .. } = event {
                f(coords);
            }
        });
    }

    /// Register a callback for every countdown (re)start
    pub fn on_game_loop_armed(&mut self, mut f: impl FnMut(u32) + Send + 'static) {
        self.subscribe(move |event| {
            if let GameEvent::GameLoopArmed { delay_ms, .. } = event {
                f(*delay_ms);
            }
        });
    }

    fn emit(&mut self, event: GameEvent) {
        debug!("[Engine] event {}", event.name());
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    // ============== Accessors ==============

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    pub fn game_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    pub fn current_piece(&self) -> Option<&Piece> {
        self.current.as_ref()
    }

    pub fn following_piece(&self) -> Option<&Piece> {
        self.following.as_ref()
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Countdown length for the current level
    pub fn timer_delay_ms(&self) -> u32 {
        timer_delay_ms(self.level)
    }

    /// Hand an externally delivered piece id to the source
    /// Returns false when the id is invalid or the source generates its own pieces
    pub fn feed_piece(&mut self, id: u8) -> bool {
        self.source.feed(id)
    }

    /// Whether the current piece would fit centred on (x, y)
    pub fn can_place_current(&self, x: i32, y: i32) -> bool {
        match (&self.current, self.is_running()) {
            (Some(piece), true) => self.grid.can_place(piece, x, y),
            _ => false,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            cols: self.grid.cols(),
            rows: self.grid.rows(),
            board: self.grid.to_rows(),
            status: self.status,
            score: self.score,
            level: self.level,
            lives: self.lives,
            multiplier: self.multiplier,
            current: self.current.as_ref().map(PieceSnapshot::from),
            following: self.following.as_ref().map(PieceSnapshot::from),
            countdown: CountdownSnapshot {
                armed: self.countdown.armed,
                delay_ms: self.countdown.delay_ms,
                remaining_ms: self.countdown.remaining_ms(),
            },
        }
    }

    // ============== Lifecycle ==============

    /// Draw the first piece pair and arm the countdown
    pub fn start(&mut self) {
        if self.status != GameStatus::Idle {
            return;
        }
        info!("[Engine] Starting game on {}x{} grid", self.cols(), self.rows());
        self.status = GameStatus::Running;
        self.following = Some(self.source.next_piece());
        self.advance_piece();
        self.arm_countdown();
    }

    /// Cancel the countdown for good; safe to call any number of times
    pub fn stop(&mut self) {
        if self.countdown.armed {
            debug!("[Engine] Countdown cancelled");
        }
        self.countdown.disarm();
        if self.status == GameStatus::Running || self.status == GameStatus::Idle {
            info!("[Engine] Game stopped with score {}", self.score);
            self.status = GameStatus::Stopped;
        }
    }

    // ============== Player actions ==============

    /// Place the current piece centred on (x, y)
    pub fn place_piece(&mut self, x: i32, y: i32) -> PlaceOutcome {
        if !self.is_running() {
            return PlaceOutcome::Inactive;
        }
        let Some(piece) = self.current.as_ref() else {
            return PlaceOutcome::Inactive;
        };

        let value = piece.value();
        if !self.grid.place(piece, x, y) {
            debug!("[Engine] Rejected {} at ({}, {})", piece, x, y);
            self.emit(GameEvent::PlacementRejected { x, y });
            return PlaceOutcome::Rejected;
        }

        self.emit(GameEvent::PiecePlaced { x, y, value });
        self.advance_piece();
        let report = self.resolve_lines();
        self.arm_countdown();
        PlaceOutcome::Placed(report)
    }

    /// Rotate the current piece clockwise `times` quarter turns
    pub fn rotate_current_piece(&mut self, times: u32) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(piece) = self.current.as_mut() else {
            return false;
        };
        piece.rotate(times);
        let rotation = piece.rotation();
        debug!("[Engine] Rotated current piece to {:?}", rotation);
        self.emit(GameEvent::PieceRotated { rotation });
        true
    }

    /// Exchange the current and following pieces
    pub fn swap_current_and_following(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        std::mem::swap(&mut self.current, &mut self.following);
        let (Some(current), Some(following)) = (&self.current, &self.following) else {
            return false;
        };
        debug!("[Engine] Swapped in {}, {} is next", current, following);
        let event = GameEvent::PiecesSwapped {
            current: current.clone(),
            following: following.clone(),
        };
        self.emit(event);
        true
    }

    // ============== Rules ==============

    /// Clear every full row and column, then score, update multiplier and level
    ///
    /// Only placement runs this; outside callers cannot reset the multiplier.
    ///
    /// ```compile_fail
    /// let mut engine = tetrecs_core::Engine::seeded(5, 5, 1);
    /// engine.start();
    /// engine.resolve_lines();
    /// ```
    pub(crate) fn resolve_lines(&mut self) -> PlacementReport {
        if self.status.is_terminal() {
            return PlacementReport::default();
        }

        let cols = self.grid.cols();
        let rows = self.grid.rows();
        let mut lines = 0u32;
        let mut cleared = BTreeSet::new();

        for y in 0..rows {
            if self.grid.is_row_full(y) {
                lines += 1;
                cleared.extend((0..cols).map(|x| Coord::new(x as i32, y as i32)));
            }
        }

        for x in 0..cols {
            if self.grid.is_col_full(x) {
                lines += 1;
                cleared.extend((0..rows).map(|y| Coord::new(x as i32, y as i32)));
            }
        }

        if !cleared.is_empty() {
            for c in &cleared {
                self.grid.set(c.x, c.y, EMPTY);
            }
            info!("[Engine] {} lines cleared ({} blocks)", lines, cleared.len());
            self.emit(GameEvent::LineCleared {
                coords: cleared.clone(),
                lines,
            });
        }

        let before = (self.score, self.level, self.multiplier);
        let blocks = cleared.len() as u32;
        let result = calculate_score(lines, blocks, self.multiplier);
        self.score = self.score.saturating_add(result.points);
        self.multiplier = result.next_multiplier;
        let level_up = self.update_level();
        if (self.score, self.level, self.multiplier) != before {
            self.emit_score();
        }

        PlacementReport {
            lines_cleared: lines,
            blocks_cleared: blocks,
            points: result.points,
            level_up,
            cleared,
        }
    }

    /// Recompute the level from the score; true if it went up
    fn update_level(&mut self) -> bool {
        let old = self.level;
        self.level = level_for_score(self.score);
        if self.level > old {
            info!("[Engine] Level up to {}", self.level);
            self.emit(GameEvent::LevelUp { level: self.level });
            true
        } else {
            false
        }
    }

    fn emit_score(&mut self) {
        self.emit(GameEvent::ScoreChanged {
            score: self.score,
            level: self.level,
            multiplier: self.multiplier,
        });
    }

    /// current <- following, following <- next from the source
    fn advance_piece(&mut self) {
        let next = self.source.next_piece();
        self.current = self.following.replace(next);
        if let (Some(current), Some(following)) = (&self.current, &self.following) {
            debug!("[Engine] Next piece {} then {}", current, following);
            let event = GameEvent::NextPiece {
                current: current.clone(),
                following: following.clone(),
            };
            self.emit(event);
        }
    }

    fn arm_countdown(&mut self) {
        let delay_ms = self.timer_delay_ms();
        self.countdown.arm(delay_ms);
        debug!("[Engine] Countdown armed for {}ms", delay_ms);
        self.emit(GameEvent::GameLoopArmed {
            delay_ms,
            ticket: self.countdown.ticket,
        });
    }

    // ============== Countdown ==============

    /// Handle expiry of the countdown armed with `ticket`
    pub fn on_timeout(&mut self, ticket: u64) -> TimeoutOutcome {
        if !self.is_running() || !self.countdown.armed || ticket != self.countdown.ticket {
            debug!("[Engine] Ignoring stale timeout {}", ticket);
            return TimeoutOutcome::Ignored;
        }

        self.lives -= 1;
        info!("[Engine] Timer ran out, {} lives left", self.lives);
        self.emit(GameEvent::LifeLost { lives: self.lives });

        if self.lives <= GAME_OVER_LIVES {
            self.countdown.disarm();
            self.status = GameStatus::GameOver;
            info!("[Engine] Game over with score {}", self.score);
            self.emit(GameEvent::GameOver { score: self.score });
            return TimeoutOutcome::GameOver;
        }

        self.advance_piece();
        if self.multiplier != BASE_MULTIPLIER {
            self.multiplier = BASE_MULTIPLIER;
            self.emit_score();
        }
        self.arm_countdown();
        TimeoutOutcome::LifeLost { lives: self.lives }
    }

    /// Advance the countdown by `elapsed_ms`, firing the timeout when it runs out
    ///
    /// At most one timeout fires per call; leftover time is not carried into
    /// the next countdown.
    pub fn tick(&mut self, elapsed_ms: u32) -> TimeoutOutcome {
        if !self.is_running() || !self.countdown.armed {
            return TimeoutOutcome::Ignored;
        }
        self.countdown.elapsed_ms = self.countdown.elapsed_ms.saturating_add(elapsed_ms);
        if self.countdown.elapsed_ms >= self.countdown.delay_ms {
            let ticket = self.countdown.ticket;
            return self.on_timeout(ticket);
        }
        TimeoutOutcome::Ignored
    }
}

impl Default for Engine<RandomPieces> {
    fn default() -> Self {
        Self::solo(DEFAULT_COLS, DEFAULT_ROWS)
    }
}
