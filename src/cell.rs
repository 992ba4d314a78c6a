//! Grid coordinates and placement directions.
//!
//! A cell is a plain `(column, row)` coordinate, 0-indexed from the
//! bottom-left corner of a tiling. Cells have no identity of their own; they
//! are compared and sorted as tuples, which also fixes the deterministic
//! iteration order used throughout the crate.

use std::fmt;

/// A `(column, row)` coordinate in a tiling's grid.
pub type Cell = (usize, usize);

/// Direction of the force applied when a point is placed into a cell.
///
/// `East`/`West` select the point furthest right/left by index,
/// `North`/`South` the point with the largest/smallest value. `None` applies
/// no force: every occupant of the cell is tried as the forced point in turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    East,
    North,
    West,
    South,
    None,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::East => "east",
            Direction::North => "north",
            Direction::West => "west",
            Direction::South => "south",
            Direction::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// Applies a column and a row renumbering to a cell.
#[inline]
pub(crate) fn map_cell(
    col_map: &std::collections::BTreeMap<usize, usize>,
    row_map: &std::collections::BTreeMap<usize, usize>,
    cell: Cell,
) -> Cell {
    (col_map[&cell.0], row_map[&cell.1])
}
