//! RNG module - piece sources
//!
//! The engine never decides where its next piece comes from. It asks a
//! [`PieceSource`] injected at construction:
//!
//! - [`RandomPieces`]: uniform draw over every piece id (solo play). Seedable so a
//!   game can be replayed exactly.
//! - [`PieceQueue`]: FIFO fed from outside (multiplayer). Every client that feeds the
//!   same ids in the same order draws the same pieces.
//!
//! Also provides a simple LCG for deterministic testing.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::pieces::Piece;
use crate::types::PIECE_COUNT;

/// Supplies the next piece whenever the engine advances
pub trait PieceSource {
    fn next_piece(&mut self) -> Piece;

    /// Accept a piece id delivered from outside
    ///
    /// Sources that generate their own pieces refuse every id.
    fn feed(&mut self, id: u8) -> bool {
        let _ = id;
        false
    }
}

impl<F> PieceSource for F
where
    F: FnMut() -> Piece,
{
    fn next_piece(&mut self) -> Piece {
        self()
    }
}

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // High bits of an LCG are far better distributed than the low ones.
        (((self.next_u32() >> 16) as u64 * max as u64) >> 16) as u32
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Uniform random piece generator
#[derive(Debug, Clone)]
pub struct RandomPieces {
    rng: SimpleRng,
    seed: u32,
}

impl RandomPieces {
    /// Create a generator with a fixed seed (replays draw the same ids)
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            seed,
        }
    }

    /// Create a generator seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u32>())
    }

    /// Draw the next piece id in `0..PIECE_COUNT`
    pub fn next_id(&mut self) -> u8 {
        self.rng.next_range(PIECE_COUNT as u32) as u8
    }

    /// Seed this generator was created with
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for RandomPieces {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl PieceSource for RandomPieces {
    fn next_piece(&mut self) -> Piece {
        let id = self.next_id();
        trace!("[Pieces] drew random id {}", id);
        Piece::from_id(id).unwrap_or_else(|| unreachable!("id {} drawn below PIECE_COUNT", id))
    }
}

/// Externally fed FIFO of pieces
///
/// Drawing from an empty queue means the feeder fell behind; the piece sequence
/// can no longer match other clients, so it panics instead of inventing a piece.
#[derive(Debug, Clone, Default)]
pub struct PieceQueue {
    queue: VecDeque<Piece>,
    /// Total pieces ever enqueued
    received: u64,
    /// Total pieces ever drawn
    drawn: u64,
}

impl PieceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue pre-filled with `ids`; invalid ids are skipped
    pub fn from_ids(ids: impl IntoIterator<Item = u8>) -> Self {
        let mut queue = Self::new();
        for id in ids {
            queue.enqueue(id);
        }
        queue
    }

    /// Append the piece for `id`
    /// Returns false (and enqueues nothing) if the id is not a piece
    pub fn enqueue(&mut self, id: u8) -> bool {
        match Piece::from_id(id) {
            Some(piece) => {
                self.queue.push_back(piece);
                self.received += 1;
                debug!("[Pieces] queued id {} (depth {})", id, self.queue.len());
                true
            }
            None => false,
        }
    }

    /// Remove the front piece, if any
    pub fn dequeue(&mut self) -> Option<Piece> {
        let piece = self.queue.pop_front()?;
        self.drawn += 1;
        Some(piece)
    }

    /// Peek at the next piece without removing it
    pub fn peek(&self) -> Option<&Piece> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl PieceSource for PieceQueue {
    fn feed(&mut self, id: u8) -> bool {
        self.enqueue(id)
    }

    fn next_piece(&mut self) -> Piece {
        match self.dequeue() {
            Some(piece) => piece,
            None => panic!(
                "piece queue underrun after {} draws: the feeder must stay ahead of consumption",
                self.drawn
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        // Same seed should produce same sequence
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(54321);

        let v1 = rng1.next_u32();
        let v2 = rng2.next_u32();
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_next_range_stays_in_range() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            assert!(rng.next_range(15) < 15);
        }
    }

    #[test]
    fn test_random_pieces_cover_every_id() {
        let mut source = RandomPieces::new(1);
        let mut seen = [false; PIECE_COUNT as usize];
        for _ in 0..2000 {
            seen[source.next_piece().id() as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "missing ids: {:?}", seen);
    }

    #[test]
    fn test_random_pieces_replay() {
        let mut a = RandomPieces::new(99);
        let mut b = RandomPieces::new(99);
        for _ in 0..50 {
            assert_eq!(a.next_piece(), b.next_piece());
        }
        assert_eq!(a.seed(), 99);
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = PieceQueue::from_ids([3, 1, 4]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().map(Piece::id), Some(3));
        assert_eq!(queue.next_piece().id(), 3);
        assert_eq!(queue.next_piece().id(), 1);
        assert_eq!(queue.next_piece().id(), 4);
        assert!(queue.is_empty());
        assert_eq!(queue.received(), 3);
        assert_eq!(queue.drawn(), 3);
    }

    #[test]
    fn test_queue_rejects_invalid_id() {
        let mut queue = PieceQueue::new();
        assert!(!queue.enqueue(PIECE_COUNT));
        assert!(!queue.enqueue(200));
        assert!(queue.is_empty());
        assert_eq!(queue.received(), 0);
    }

    #[test]
    #[should_panic(expected = "piece queue underrun")]
    fn test_queue_underrun_panics() {
        let mut queue = PieceQueue::from_ids([0]);
        queue.next_piece();
        queue.next_piece();
    }

    #[test]
    fn test_closure_source() {
        let mut ids = [6u8, 7].into_iter().cycle();
        let mut source = move || Piece::from_id(ids.next().unwrap()).unwrap();
        assert_eq!(source.next_piece().id(), 6);
        assert_eq!(source.next_piece().id(), 7);
        assert_eq!(source.next_piece().id(), 6);
    }
}
