//! The data tape.
//!
//! 30000 unsigned byte cells, all zero at start, with a data pointer that
//! begins at cell 0. The pointer never wraps: a move that would leave the
//! tape is an error and the pointer stays where it was.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of cells on the tape.
pub const TAPE_SIZE: usize = 30_000;

/// Fixed-size byte tape plus its data pointer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    cells: Vec<u8>,
    pointer: usize,
}

impl Tape {
    /// Create a tape with every cell zeroed and the pointer at cell 0.
    pub fn new() -> Self {
        Self {
            cells: vec![0; TAPE_SIZE],
            pointer: 0,
        }
    }

    /// Current data pointer.
    #[inline]
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Move the pointer one cell right.
    pub fn move_right(&mut self) -> Result<usize, TapeError> {
        if self.pointer + 1 >= TAPE_SIZE {
            return Err(TapeError::PastEnd(self.pointer));
        }
        self.pointer += 1;
        Ok(self.pointer)
    }

    /// Move the pointer one cell left.
    pub fn move_left(&mut self) -> Result<usize, TapeError> {
        if self.pointer == 0 {
            return Err(TapeError::BeforeStart);
        }
        self.pointer -= 1;
        Ok(self.pointer)
    }

    /// Value of the cell under the pointer.
    #[inline]
    pub fn current(&self) -> u8 {
        self.cells[self.pointer]
    }

    /// Overwrite the cell under the pointer.
    #[inline]
    pub fn set_current(&mut self, value: u8) {
        self.cells[self.pointer] = value;
    }

    /// Add one to the current cell, 255 wraps to 0.
    #[inline]
    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1);
    }

    /// Subtract one from the current cell, 0 wraps to 255.
    #[inline]
    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1);
    }

    /// Read a cell by index.
    pub fn read(&self, index: usize) -> Result<u8, TapeError> {
        self.cells
            .get(index)
            .copied()
            .ok_or(TapeError::IndexOutOfRange(index))
    }

    /// All cells, read-only.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&c| c != 0).count();

        f.debug_struct("Tape")
            .field("pointer", &self.pointer)
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &TAPE_SIZE)
            .finish()
    }
}

/// Errors raised by tape access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TapeError {
    #[error("data pointer moved left of cell 0")]
    BeforeStart,

    #[error("data pointer moved right of cell {0} (tape holds {size} cells)", size = TAPE_SIZE)]
    PastEnd(usize),

    #[error("cell index {0} out of range (0-{max})", max = TAPE_SIZE - 1)]
    IndexOutOfRange(usize),
}
