//! Gridded permutations: a permutation with a cell for every point.
//!
//! This is the geometric unit every other component manipulates. A
//! [`GriddedPerm`] pairs a pattern with one `(column, row)` cell per point,
//! index `i` of the positions being the cell of the `i`-th point of the
//! pattern. Obstructions and requirements are gridded permutations; the
//! semantic tag (forbidden versus required-alternative) lives in the tiling
//! that owns them, not in the value itself.
//!
//! # Invariants
//! - `patt.len() == pos.len()`, checked by every public constructor.
//! - Values are immutable; every operation returns a fresh value.
//! - Equality, ordering and hashing are structural over `(patt, pos)`.

use crate::cell::{Cell, Direction};
use crate::perm::Perm;
use crate::symmetry::Symmetry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A gridded permutation whose occurrence is forbidden.
pub type Obstruction = GriddedPerm;

/// A gridded permutation usable as one alternative of a requirement list.
pub type Requirement = GriddedPerm;

/// An OR-group of requirements; satisfied if at least one member occurs.
pub type RequirementList = Vec<Requirement>;

/// Error raised by malformed gridded-permutation construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GriddingError {
    /// Pattern and position sequence have different lengths.
    LengthMismatch { pattern: usize, positions: usize },
}

impl fmt::Display for GriddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GriddingError::LengthMismatch { pattern, positions } => write!(
                f,
                "pattern has {} points but {} positions were given",
                pattern, positions
            ),
        }
    }
}

impl std::error::Error for GriddingError {}

/// Index and value ranges into which a new point may be inserted at a cell.
///
/// Insertion slots are `min_index..=max_index` and `min_value..=max_value`,
/// derived from the nearest existing points sharing the cell's row or
/// column, or from the global extremes when the row or column is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_index: usize,
    pub max_index: usize,
    pub min_value: usize,
    pub max_value: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct RawGriddedPerm {
    patt: Perm,
    pos: Vec<Cell>,
}

impl TryFrom<RawGriddedPerm> for GriddedPerm {
    type Error = GriddingError;

    fn try_from(raw: RawGriddedPerm) -> Result<Self, GriddingError> {
        GriddedPerm::new(raw.patt, raw.pos)
    }
}

/// A permutation with each point assigned to a grid cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGriddedPerm")]
pub struct GriddedPerm {
    patt: Perm,
    pos: Vec<Cell>,
}

impl GriddedPerm {
    /// Creates a gridded permutation, validating the length invariant.
    pub fn new(patt: Perm, pos: Vec<Cell>) -> Result<Self, GriddingError> {
        if patt.len() != pos.len() {
            return Err(GriddingError::LengthMismatch {
                pattern: patt.len(),
                positions: pos.len(),
            });
        }
        Ok(GriddedPerm { patt, pos })
    }

    /// Internal constructor for parts already known to match in length.
    #[inline]
    pub(crate) fn assemble(patt: Perm, pos: Vec<Cell>) -> Self {
        debug_assert_eq!(patt.len(), pos.len());
        GriddedPerm { patt, pos }
    }

    /// A gridded permutation with every point in the same cell.
    pub fn single_cell(patt: Perm, cell: Cell) -> Self {
        let n = patt.len();
        GriddedPerm {
            patt,
            pos: vec![cell; n],
        }
    }

    /// The single-point gridded permutation in `cell`.
    pub fn point_at(cell: Cell) -> Self {
        GriddedPerm::single_cell(Perm::point(), cell)
    }

    /// The empty gridded permutation.
    pub fn empty() -> Self {
        GriddedPerm {
            patt: Perm::empty(),
            pos: Vec::new(),
        }
    }

    #[inline]
    pub fn patt(&self) -> &Perm {
        &self.patt
    }

    #[inline]
    pub fn pos(&self) -> &[Cell] {
        &self.pos
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patt.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patt.is_empty()
    }

    /// Whether the cell layout contradicts the pattern.
    ///
    /// True if some pair of points is ordered one way by the pattern and the
    /// other way by its cells: columns must be weakly increasing along the
    /// index order, and rows must agree with the relative values.
    pub fn contradictory(&self) -> bool {
        for i in 0..self.len() {
            for j in i + 1..self.len() {
                if self.pos[i].0 > self.pos[j].0 {
                    return true;
                }
                if self.patt[i] < self.patt[j] && self.pos[i].1 > self.pos[j].1 {
                    return true;
                }
                if self.patt[i] > self.patt[j] && self.pos[i].1 < self.pos[j].1 {
                    return true;
                }
            }
        }
        false
    }

    /// Whether some point lies in `cell`.
    #[inline]
    pub fn occupies(&self, cell: Cell) -> bool {
        self.pos.contains(&cell)
    }

    /// Indices of the points in `cell`.
    pub fn points_in_cell<'a>(&'a self, cell: Cell) -> impl Iterator<Item = usize> + 'a {
        self.pos
            .iter()
            .enumerate()
            .filter(move |(_, &c)| c == cell)
            .map(|(i, _)| i)
    }

    /// Occurrences of `self` as an order- and cell-consistent sub-occurrence
    /// of `other`.
    ///
    /// Each occurrence maps the points of `self`, in order, to increasing
    /// indices of `other` with identical cells and matching relative order.
    /// Lazy, finite and non-restartable.
    pub fn occurrences_in<'a>(&'a self, other: &'a GriddedPerm) -> GridOccurrences<'a> {
        GridOccurrences::new(self, other)
    }

    /// Whether `self` occurs in `other`.
    pub fn contained_in(&self, other: &GriddedPerm) -> bool {
        self.occurrences_in(other).next().is_some()
    }

    /// Whether `other` occurs in `self`.
    pub fn contains(&self, other: &GriddedPerm) -> bool {
        other.occurrences_in(self).next().is_some()
    }

    /// Drops every point lying in `cells` and re-standardizes the rest.
    pub fn remove_cells(&self, cells: &[Cell]) -> GriddedPerm {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| !cells.contains(&self.pos[i]))
            .collect();
        self.sub_perm_at_indices(&keep)
    }

    /// The sub gridded permutation at the given increasing indices.
    pub fn sub_perm_at_indices(&self, indices: &[usize]) -> GriddedPerm {
        GriddedPerm::assemble(
            Perm::to_standard(indices.iter().map(|&i| self.patt[i])),
            indices.iter().map(|&i| self.pos[i]).collect(),
        )
    }

    /// The sub gridded permutation of the points lying in `cells`.
    pub fn sub_perm_in_cells(&self, cells: &[Cell]) -> GriddedPerm {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| cells.contains(&self.pos[i]))
            .collect();
        self.sub_perm_at_indices(&keep)
    }

    /// The sub gridded permutation strictly left of `col`.
    pub fn sub_perm_left_of_col(&self, col: usize) -> GriddedPerm {
        let keep: Vec<usize> = (0..self.len()).filter(|&i| self.pos[i].0 < col).collect();
        self.sub_perm_at_indices(&keep)
    }

    /// Cells holding a single point that shares no row or column with any
    /// other point.
    pub fn isolated_cells(&self) -> Vec<Cell> {
        (0..self.len())
            .filter(|&i| {
                (0..self.len()).all(|j| {
                    i == j || (self.pos[i].0 != self.pos[j].0 && self.pos[i].1 != self.pos[j].1)
                })
            })
            .map(|i| self.pos[i])
            .collect()
    }

    /// Whether the points at `indices` share no row or column with any
    /// point outside `indices`.
    pub fn is_isolated(&self, indices: &[usize]) -> bool {
        (0..self.len())
            .filter(|i| !indices.contains(i))
            .all(|i| {
                indices.iter().all(|&j| {
                    self.pos[i].0 != self.pos[j].0 && self.pos[i].1 != self.pos[j].1
                })
            })
    }

    /// The index of the point in `cell` with the strongest force in the
    /// given direction, or `None` if the cell is unoccupied or no force is
    /// applied.
    pub fn forced_point_index(&self, cell: Cell, direction: Direction) -> Option<usize> {
        let points: Vec<usize> = self.points_in_cell(cell).collect();
        if points.is_empty() {
            return None;
        }
        match direction {
            Direction::East => points.iter().copied().max(),
            Direction::West => points.iter().copied().min(),
            Direction::North => points.iter().copied().max_by_key(|&p| self.patt[p]),
            Direction::South => points.iter().copied().min_by_key(|&p| self.patt[p]),
            Direction::None => None,
        }
    }

    /// Index and value ranges admitting a new point at `cell`.
    pub fn bounding_box(&self, cell: Cell) -> BoundingBox {
        let (col, row) = cell;
        let row_vals = (0..self.len())
            .filter(|&i| self.pos[i].1 == row)
            .map(|i| self.patt[i]);
        let (min_value, max_value) = match minmax(row_vals) {
            Some((lo, hi)) => (lo, hi + 1),
            None => {
                let above = (0..self.len())
                    .filter(|&i| self.pos[i].1 > row)
                    .map(|i| self.patt[i])
                    .min();
                let below = (0..self.len())
                    .filter(|&i| self.pos[i].1 < row)
                    .map(|i| self.patt[i])
                    .max();
                (below.map_or(0, |v| v + 1), above.unwrap_or(self.len()))
            }
        };
        let col_idxs = (0..self.len()).filter(|&i| self.pos[i].0 == col);
        let (min_index, max_index) = match minmax(col_idxs) {
            Some((lo, hi)) => (lo, hi + 1),
            None => {
                let right = (0..self.len()).filter(|&i| self.pos[i].0 > col).min();
                let left = (0..self.len()).filter(|&i| self.pos[i].0 < col).max();
                (left.map_or(0, |i| i + 1), right.unwrap_or(self.len()))
            }
        };
        BoundingBox {
            min_index,
            max_index,
            min_value,
            max_value,
        }
    }

    /// Translates the point at `index` as when a fresh row and column pair
    /// is split open at `seam = (index, value)`.
    pub fn point_translation(&self, index: usize, seam: (usize, usize)) -> Cell {
        let (x, y) = self.pos[index];
        (
            if index >= seam.0 { x + 2 } else { x },
            if self.patt[index] >= seam.1 { y + 2 } else { y },
        )
    }

    /// Translates every point as when a point is inserted at `seam`.
    pub fn stretch(&self, seam: (usize, usize)) -> GriddedPerm {
        let pos = (0..self.len())
            .map(|i| self.point_translation(i, seam))
            .collect();
        GriddedPerm::assemble(self.patt.clone(), pos)
    }

    /// Places a point into `cell` with the given force.
    ///
    /// If the gridded permutation occupies the cell, the forced point is
    /// removed and every other point is translated around the split
    /// row/column pair; with `Direction::None`, every occupant is tried as
    /// the forced point in turn. The remaining bounding box, truncated by
    /// the force, then yields one stretched copy per insertion seam. The
    /// result order is deterministic.
    pub fn place_point(&self, cell: Cell, direction: Direction) -> Vec<GriddedPerm> {
        let mut res = Vec::new();
        let bb = self.bounding_box(cell);
        let (mut min_index, mut max_index) = (bb.min_index, bb.max_index);
        let (mut min_value, mut max_value) = (bb.min_value, bb.max_value);
        if self.occupies(cell) {
            match self.forced_point_index(cell, direction) {
                Some(forced_index) => {
                    let forced_value = self.patt[forced_index];
                    res.push(self.remove_translated(forced_index));
                    match direction {
                        Direction::East => min_index = forced_index + 1,
                        Direction::North => min_value = forced_value + 1,
                        Direction::West => max_index = forced_index,
                        Direction::South => max_value = forced_value,
                        Direction::None => {}
                    }
                }
                None => {
                    let occupants: Vec<usize> = self.points_in_cell(cell).collect();
                    for index in occupants {
                        res.push(self.remove_translated(index));
                    }
                }
            }
        }
        for i in min_index..=max_index {
            for j in min_value..=max_value {
                res.push(self.stretch((i, j)));
            }
        }
        res
    }

    /// Removes the point at `index` while translating the remaining points
    /// around the split row/column pair opened at its location.
    fn remove_translated(&self, index: usize) -> GriddedPerm {
        let value = self.patt[index];
        let patt = Perm::to_standard(
            (0..self.len()).filter(|&i| i != index).map(|i| self.patt[i]),
        );
        let pos = (0..self.len())
            .filter(|&i| i != index)
            .map(|i| self.point_translation(i, (index, value)))
            .collect();
        GriddedPerm::assemble(patt, pos)
    }

    /// Inserts a new point into `cell` in every admissible way, mixing it
    /// with any points already in the cell.
    pub fn insert_point(&self, cell: Cell) -> Vec<GriddedPerm> {
        let bb = self.bounding_box(cell);
        let mut res = Vec::new();
        for idx in bb.min_index..=bb.max_index {
            for val in bb.min_value..=bb.max_value {
                let mut pos = self.pos.clone();
                pos.insert(idx, cell);
                res.push(GriddedPerm::assemble(self.patt.insert(idx, val), pos));
            }
        }
        res
    }

    /// Removes the point at `index`.
    pub fn remove_point(&self, index: usize) -> GriddedPerm {
        let keep: Vec<usize> = (0..self.len()).filter(|&i| i != index).collect();
        self.sub_perm_at_indices(&keep)
    }

    /// Maps every cell through `f`, keeping the pattern.
    pub fn map_cells<F>(&self, f: F) -> GriddedPerm
    where
        F: Fn(Cell) -> Cell,
    {
        GriddedPerm::assemble(self.patt.clone(), self.pos.iter().map(|&c| f(c)).collect())
    }

    /// Applies a symmetry, transforming cells through `cell_map`.
    ///
    /// Every point `(index, value, cell)` is mapped through the symmetry's
    /// coordinate action, the points re-sorted by their new index, and the
    /// pattern read off the new values; composition laws hold exactly.
    pub fn transform<F>(&self, sym: Symmetry, cell_map: F) -> GriddedPerm
    where
        F: Fn(Cell) -> Cell,
    {
        let n = self.len();
        let mut points: Vec<(usize, usize, Cell)> = (0..n)
            .map(|i| {
                let (a, b) = sym.map_point(n, i, self.patt[i]);
                (a, b, cell_map(self.pos[i]))
            })
            .collect();
        points.sort_unstable();
        GriddedPerm::assemble(
            Perm::from_ranks(points.iter().map(|&(_, b, _)| b).collect()),
            points.into_iter().map(|(_, _, c)| c).collect(),
        )
    }

    /// The cell of a length-1 gridded permutation.
    #[inline]
    pub fn is_point(&self) -> Option<Cell> {
        if self.len() == 1 {
            Some(self.pos[0])
        } else {
            None
        }
    }

    /// The cell occupied by every point, if there is exactly one.
    pub fn is_single_cell(&self) -> Option<Cell> {
        match self.pos.first() {
            Some(&first) if self.pos.iter().all(|&c| c == first) => Some(first),
            _ => None,
        }
    }

    /// Whether every point lies in one row.
    pub fn is_single_row(&self) -> bool {
        match self.pos.first() {
            Some(&(_, row)) => self.pos.iter().all(|&(_, r)| r == row),
            None => true,
        }
    }

    /// Appends a point with the given value in `cell`.
    ///
    /// The point becomes the rightmost by index; values `>= value` shift up
    /// by one. This is the canonical growth step of the column-major
    /// enumeration.
    pub(crate) fn append_point(&self, cell: Cell, value: usize) -> GriddedPerm {
        let mut pos = self.pos.clone();
        pos.push(cell);
        GriddedPerm::assemble(self.patt.insert(self.len(), value), pos)
    }
}

impl fmt::Display for GriddedPerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.patt)?;
        for (i, (c, r)) in self.pos.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " ({}, {})", c, r)?;
        }
        Ok(())
    }
}

fn minmax<I>(iter: I) -> Option<(usize, usize)>
where
    I: Iterator<Item = usize>,
{
    iter.fold(None, |acc, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    })
}

/// Lazy backtracking search for cell- and order-consistent occurrences.
pub struct GridOccurrences<'a> {
    patt: &'a GriddedPerm,
    host: &'a GriddedPerm,
    chosen: Vec<usize>,
    next: usize,
    done: bool,
}

impl<'a> GridOccurrences<'a> {
    fn new(patt: &'a GriddedPerm, host: &'a GriddedPerm) -> Self {
        GridOccurrences {
            patt,
            host,
            chosen: Vec::with_capacity(patt.len()),
            next: 0,
            done: false,
        }
    }

    fn compatible(&self, candidate: usize) -> bool {
        let d = self.chosen.len();
        if self.patt.pos[d] != self.host.pos[candidate] {
            return false;
        }
        self.chosen.iter().enumerate().all(|(j, &idx)| {
            (self.patt.patt[j] < self.patt.patt[d])
                == (self.host.patt[idx] < self.host.patt[candidate])
        })
    }
}

impl<'a> Iterator for GridOccurrences<'a> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let k = self.patt.len();
        if k == 0 {
            self.done = true;
            return Some(Vec::new());
        }
        loop {
            let remaining = k - self.chosen.len();
            if self.next + remaining > self.host.len() {
                match self.chosen.pop() {
                    Some(idx) => self.next = idx + 1,
                    None => {
                        self.done = true;
                        return None;
                    }
                }
                continue;
            }
            if self.compatible(self.next) {
                self.chosen.push(self.next);
                if self.chosen.len() == k {
                    let occurrence = self.chosen.clone();
                    self.chosen.pop();
                    self.next = occurrence[k - 1] + 1;
                    return Some(occurrence);
                }
                self.next += 1;
            } else {
                self.next += 1;
            }
        }
    }
}
