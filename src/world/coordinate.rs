use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell address on the rectangular grid.
///
/// Bounds are not checked here; the [`Field`](crate::world::Field) that a
/// coordinate is used against owns the extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    pub const fn new(row: usize, col: usize) -> Self {
        Coordinate { row, col }
    }

    /// Offset by a signed delta, or `None` if either axis would go negative.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Coordinate> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        Some(Coordinate { row, col })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
