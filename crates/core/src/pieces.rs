//! Pieces module - 3x3 piece shapes and quarter-turn rotation
//!
//! Every piece lives in a 3x3 mask whose centre cell `(1, 1)` is the placement
//! anchor. Shapes and colours are a pure function of the piece id, so two
//! engines that see the same id always build the same piece.

use arrayvec::ArrayVec;

use crate::types::{Rotation, MASK_SIZE, PIECE_COUNT};

/// Occupancy mask indexed `[x][y]` (column first)
pub type PieceMask = [[bool; MASK_SIZE]; MASK_SIZE];

/// Shape rows as drawn (row-major, top to bottom); transposed into a mask on creation
type ShapeRows = [[u8; MASK_SIZE]; MASK_SIZE];

/// Piece table indexed by id
const SHAPES: [(&str, ShapeRows); PIECE_COUNT as usize] = [
    ("Line", [[0, 1, 0], [0, 1, 0], [0, 1, 0]]),
    ("C", [[0, 0, 0], [1, 1, 1], [1, 0, 1]]),
    ("Plus", [[0, 1, 0], [1, 1, 1], [0, 1, 0]]),
    ("Dot", [[0, 0, 0], [0, 1, 0], [0, 0, 0]]),
    ("Square", [[1, 1, 0], [1, 1, 0], [0, 0, 0]]),
    ("L", [[0, 1, 0], [0, 1, 0], [0, 1, 1]]),
    ("J", [[0, 1, 0], [0, 1, 0], [1, 1, 0]]),
    ("S", [[0, 0, 0], [0, 1, 1], [1, 1, 0]]),
    ("Z", [[0, 0, 0], [1, 1, 0], [0, 1, 1]]),
    ("T", [[0, 0, 0], [1, 1, 1], [0, 1, 0]]),
    ("X", [[1, 0, 1], [0, 1, 0], [1, 0, 1]]),
    ("Corner", [[0, 0, 0], [0, 1, 1], [0, 1, 0]]),
    ("Inverse Corner", [[0, 0, 0], [1, 1, 0], [0, 1, 0]]),
    ("Double", [[0, 1, 0], [0, 1, 0], [0, 0, 0]]),
    ("Triple", [[0, 0, 0], [1, 1, 1], [0, 0, 0]]),
];

/// A placeable piece: fixed shape template plus its current rotation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    id: u8,
    name: &'static str,
    blocks: PieceMask,
    rotation: Rotation,
}

impl Piece {
    /// Create the piece for `id`, or `None` if the id is outside `0..PIECE_COUNT`
    ///
    /// # Examples
    ///
    /// ```
    /// use tetrecs_core::Piece;
    ///
    /// let plus = Piece::from_id(2).unwrap();
    /// assert_eq!(plus.name(), "Plus");
    /// assert_eq!(plus.value(), 3);
    /// assert!(Piece::from_id(15).is_none());
    /// ```
    pub fn from_id(id: u8) -> Option<Self> {
        let (name, rows) = SHAPES.get(id as usize)?;

        let mut blocks = [[false; MASK_SIZE]; MASK_SIZE];
        for (y, row) in rows.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                blocks[x][y] = cell != 0;
            }
        }

        Some(Self {
            id,
            name,
            blocks,
            rotation: Rotation::Spawn,
        })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Colour written into the grid for this piece (`id + 1`)
    pub fn value(&self) -> u8 {
        self.id + 1
    }

    pub fn blocks(&self) -> &PieceMask {
        &self.blocks
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Whether mask cell `(x, y)` is occupied; out-of-mask reads are empty
    pub fn is_block(&self, x: usize, y: usize) -> bool {
        x < MASK_SIZE && y < MASK_SIZE && self.blocks[x][y]
    }

    /// Occupied mask cells as `(x, y)` offsets into the 3x3 mask
    pub fn cells(&self) -> ArrayVec<(usize, usize), { MASK_SIZE * MASK_SIZE }> {
        let mut out = ArrayVec::new();
        for x in 0..MASK_SIZE {
            for y in 0..MASK_SIZE {
                if self.blocks[x][y] {
                    out.push((x, y));
                }
            }
        }
        out
    }

    pub fn block_count(&self) -> usize {
        self.blocks.iter().flatten().filter(|b| **b).count()
    }

    /// Rotate 90° clockwise `times` times (mod 4)
    pub fn rotate(&mut self, times: u32) {
        for _ in 0..times % 4 {
            self.rotate_cw_once();
        }
    }

    /// Rotate 90° counter-clockwise once
    pub fn rotate_ccw(&mut self) {
        self.rotate(3);
    }

    fn rotate_cw_once(&mut self) {
        let mut rotated = [[false; MASK_SIZE]; MASK_SIZE];
        for x in 0..MASK_SIZE {
            for y in 0..MASK_SIZE {
                // (x, y) about the centre turns to (2 - y, x) with y pointing down.
                rotated[MASK_SIZE - 1 - y][x] = self.blocks[x][y];
            }
        }
        self.blocks = rotated;
        self.rotation = self.rotation.rotate_cw();
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
