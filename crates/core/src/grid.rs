//! Grid module - manages the game board
//!
//! The grid is a `cols` x `rows` board where each cell holds a colour value
//! (`0` = empty). Uses a flat array for cache locality; storage is column-major
//! (`x * rows + y`) so a column scan is contiguous.
//! Coordinates: (x, y) where x is the column (left to right) and y the row (top to bottom).
//! Pieces are placed by anchoring the centre of their 3x3 mask on the clicked cell.

use arrayvec::ArrayVec;
use log::debug;

use crate::pieces::Piece;
use crate::types::{Coord, EMPTY, MASK_SIZE, OUT_OF_BOUNDS};

/// Mapped grid cells of one piece placement
pub type Footprint = ArrayVec<Coord, { MASK_SIZE * MASK_SIZE }>;

/// The game board with fixed dimensions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    cols: usize,
    rows: usize,
    /// Flat cell storage, column-major (x * rows + y)
    cells: Vec<u8>,
}

impl Grid {
    /// Create a new empty grid
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![EMPTY; cols * rows],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return None;
        }
        Some((x as usize) * self.rows + (y as usize))
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Get the value at (x, y), or `-1` if out of bounds
    pub fn get(&self, x: i32, y: i32) -> i32 {
        self.cell(x, y).map(i32::from).unwrap_or(OUT_OF_BOUNDS)
    }

    /// Get the value at (x, y), or `None` if out of bounds
    pub fn cell(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, value: u8) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Check if position is within bounds and empty
    pub fn is_empty_at(&self, x: i32, y: i32) -> bool {
        matches!(self.cell(x, y), Some(v) if v < 1)
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= self.rows {
            return false;
        }
        (0..self.cols).all(|x| self.cells[x * self.rows + y] >= 1)
    }

    /// Check if a column is completely filled
    pub fn is_col_full(&self, x: usize) -> bool {
        if x >= self.cols {
            return false;
        }
        let start = x * self.rows;
        self.cells[start..start + self.rows].iter().all(|&v| v >= 1)
    }

    /// Grid cells covered by `piece` anchored at (x, y), including any that fall off the board
    pub fn footprint(&self, piece: &Piece, x: i32, y: i32) -> Footprint {
        piece
            .cells()
            .into_iter()
            .map(|(i, j)| Coord::new(x - 1 + i as i32, y - 1 + j as i32))
            .collect()
    }

    /// Check whether `piece` fits with its centre on (x, y)
    ///
    /// Every occupied mask cell must land in bounds on an empty cell.
    pub fn can_place(&self, piece: &Piece, x: i32, y: i32) -> bool {
        self.footprint(piece, x, y)
            .iter()
            .all(|c| self.is_empty_at(c.x, c.y))
    }

    /// Place `piece` with its centre on (x, y)
    /// Returns true if successful, false (and no change) if any cell is out of bounds or occupied
    pub fn place(&mut self, piece: &Piece, x: i32, y: i32) -> bool {
        let footprint = self.footprint(piece, x, y);

        // First check if all positions are valid
        if !footprint.iter().all(|c| self.is_empty_at(c.x, c.y)) {
            return false;
        }

        // Then write all cells
        let value = piece.value();
        for c in &footprint {
            self.set(c.x, c.y, value);
        }

        debug!("[Grid] placed {} at ({}, {})", piece, x, y);
        true
    }

    /// Get a reference to the internal cells array (column-major)
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Copy the board into row-major rows, as the wire format and renderers expect
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.rows)
            .map(|y| (0..self.cols).map(|x| self.cells[x * self.rows + y]).collect())
            .collect()
    }

    /// Count filled cells
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|&&v| v >= 1).count()
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    /// Create from row-major rows for testing
    #[cfg(test)]
    pub fn from_rows(rows_2d: &[&[u8]]) -> Self {
        let rows = rows_2d.len();
        let cols = rows_2d.first().map(|r| r.len()).unwrap_or(0);
        assert!(rows_2d.iter().all(|row| row.len() == cols));

        let mut grid = Self::new(cols, rows);
        for (y, row) in rows_2d.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                grid.set(x as i32, y as i32, v);
            }
        }
        grid
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_COLS, crate::types::DEFAULT_ROWS)
    }
}
