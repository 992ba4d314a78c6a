//! Tilings: grids of cells constrained by obstructions and requirements.
//!
//! A [`Tiling`] owns a set of obstructions (forbidden occurrences) and a set
//! of requirement lists (each an OR-group of mandatory occurrences, all
//! groups conjoined). Construction normalizes the constraint sets to a
//! canonical fixpoint, fills unconstrained cells with explicit point
//! obstructions, and renumbers rows and columns densely, so two tilings
//! admitting the same gridded permutations through the same constraints
//! compare equal structurally.
//!
//! # Invariants
//! - Obstruction and requirement sets are sorted, duplicate-free and free of
//!   implied members after construction.
//! - Every cell of the grid either appears in some constraint or carries a
//!   single-point obstruction.
//! - Row and column indices are dense; a tiling with no active cells has
//!   dimensions `(1, 1)`.
//! - Values are immutable; every mutator-shaped operation builds a new
//!   tiling through the canonicalizing constructor.

use crate::cell::{map_cell, Cell};
use crate::griddedperm::{GriddedPerm, Obstruction, RequirementList};
use crate::perm::Perm;
use crate::symmetry::Symmetry;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use tracing::debug;

/// Error raised by cell operations addressing a cell outside the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    OutOfBounds {
        cell: Cell,
        dimensions: (usize, usize),
    },
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::OutOfBounds { cell, dimensions } => write!(
                f,
                "cell ({}, {}) is outside the {}x{} grid",
                cell.0, cell.1, dimensions.0, dimensions.1
            ),
        }
    }
}

impl std::error::Error for CellError {}

#[derive(Debug, Clone, Deserialize)]
struct RawTiling {
    obstructions: Vec<Obstruction>,
    requirements: Vec<RequirementList>,
}

impl From<RawTiling> for Tiling {
    fn from(raw: RawTiling) -> Tiling {
        Tiling::new(raw.obstructions, raw.requirements)
    }
}

/// A grid of cells constrained by obstructions and requirement lists.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawTiling")]
pub struct Tiling {
    obstructions: Vec<Obstruction>,
    requirements: Vec<RequirementList>,
    dimensions: (usize, usize),
    active_cells: BTreeSet<Cell>,
    positive_cells: BTreeSet<Cell>,
    point_cells: BTreeSet<Cell>,
    emptiness: OnceLock<bool>,
}

impl Tiling {
    /// Builds a tiling in canonical form from raw constraint collections.
    ///
    /// Runs the minimization fixpoint, fills every unconstrained cell with a
    /// point obstruction, and compacts rows and columns to a dense range.
    /// An unsatisfiable requirement list collapses the whole tiling to the
    /// canonical empty tiling rather than failing.
    pub fn new(obstructions: Vec<Obstruction>, requirements: Vec<RequirementList>) -> Tiling {
        let mut obs = obstructions;
        obs.sort();
        obs.dedup();
        let mut reqs: Vec<RequirementList> = requirements
            .into_iter()
            .map(|mut list| {
                list.sort();
                list.dedup();
                list
            })
            .collect();
        reqs.sort();

        loop {
            let next_obs = Tiling::minimal_obs(&obs, &reqs);
            let (next_obs, next_reqs) = Tiling::minimal_reqs(next_obs, &reqs);
            if next_obs == obs && next_reqs == reqs {
                break;
            }
            obs = next_obs;
            reqs = next_reqs;
        }

        Tiling::fill_empty(&mut obs, &reqs);
        let (obs, reqs, dimensions) = Tiling::compact(obs, reqs);

        let active_cells = Tiling::active_cells_of(&obs, &reqs);
        let positive_cells = Tiling::positive_cells_of(&reqs);
        let point_cells = Tiling::point_cells_of(&obs, &positive_cells);
        debug!(
            cols = dimensions.0,
            rows = dimensions.1,
            obstructions = obs.len(),
            requirement_lists = reqs.len(),
            "constructed tiling"
        );
        Tiling {
            obstructions: obs,
            requirements: reqs,
            dimensions,
            active_cells,
            positive_cells,
            point_cells,
            emptiness: OnceLock::new(),
        }
    }

    /// Cells forced non-empty: for each requirement list, the cells shared
    /// by every alternative; unioned over the lists.
    fn positive_cells_of(requirements: &[RequirementList]) -> BTreeSet<Cell> {
        let mut positive = BTreeSet::new();
        for list in requirements {
            let mut alternatives = list.iter();
            if let Some(first) = alternatives.next() {
                let mut shared: BTreeSet<Cell> = first.pos().iter().copied().collect();
                for req in alternatives {
                    let cells: BTreeSet<Cell> = req.pos().iter().copied().collect();
                    shared = shared.intersection(&cells).copied().collect();
                }
                positive.extend(shared);
            }
        }
        positive
    }

    /// Cells appearing in a non-point obstruction or in any requirement.
    fn active_cells_of(
        obstructions: &[Obstruction],
        requirements: &[RequirementList],
    ) -> BTreeSet<Cell> {
        let mut active = BTreeSet::new();
        for ob in obstructions {
            if ob.is_point().is_none() {
                active.extend(ob.pos().iter().copied());
            }
        }
        for list in requirements {
            for req in list {
                active.extend(req.pos().iter().copied());
            }
        }
        active
    }

    /// Cells carrying a single-point obstruction.
    fn empty_cells_of(obstructions: &[Obstruction]) -> BTreeSet<Cell> {
        obstructions.iter().filter_map(|ob| ob.is_point()).collect()
    }

    /// Positive cells whose only inhabitants are single points, detected by
    /// the pair of localized length-2 obstructions forbidding both ascents
    /// and descents in the cell.
    fn point_cells_of(
        obstructions: &[Obstruction],
        positive_cells: &BTreeSet<Cell>,
    ) -> BTreeSet<Cell> {
        let mut local_len2 = BTreeMap::new();
        for ob in obstructions {
            if ob.len() == 2 {
                if let Some(cell) = ob.is_single_cell() {
                    *local_len2.entry(cell).or_insert(0usize) += 1;
                }
            }
        }
        positive_cells
            .iter()
            .copied()
            .filter(|cell| local_len2.get(cell) == Some(&2))
            .collect()
    }

    /// Bounding-box dimensions of the raw constraint sets, before
    /// compaction. A constraint-free tiling is a single cell.
    fn dims_of(obstructions: &[Obstruction], requirements: &[RequirementList]) -> (usize, usize) {
        let cells = obstructions
            .iter()
            .flat_map(|ob| ob.pos().iter().copied())
            .chain(
                requirements
                    .iter()
                    .flat_map(|list| list.iter().flat_map(|req| req.pos().iter().copied())),
            );
        match cells.fold(None, |acc: Option<(usize, usize)>, (c, r)| match acc {
            None => Some((c, r)),
            Some((mc, mr)) => Some((mc.max(c), mr.max(r))),
        }) {
            Some((max_col, max_row)) => (max_col + 1, max_row + 1),
            None => (1, 1),
        }
    }

    /// Strips redundant isolated points from an obstruction.
    ///
    /// An isolated point in a positive cell is guaranteed to exist
    /// independently of the obstruction, so forbidding it adds nothing.
    /// Likewise, when a single-alternative requirement occurs exactly once
    /// in the obstruction and that occurrence is isolated, the occurrence
    /// is implied and its cells are dropped.
    fn clean_isolated(
        obstruction: &Obstruction,
        positive_cells: &BTreeSet<Cell>,
        requirements: &[RequirementList],
    ) -> Obstruction {
        let remove: Vec<Cell> = obstruction
            .isolated_cells()
            .into_iter()
            .filter(|cell| positive_cells.contains(cell))
            .collect();
        let mut ob = obstruction.remove_cells(&remove);
        for list in requirements {
            if let [req] = list.as_slice() {
                let mut occs = req.occurrences_in(&ob);
                if let (Some(occ), None) = (occs.next(), occs.next()) {
                    if ob.is_isolated(&occ) {
                        ob = ob.remove_cells(req.pos());
                    }
                }
            }
        }
        ob
    }

    /// One pass of obstruction minimization: clean isolated points, then
    /// drop any obstruction containing an already-kept one.
    fn minimal_obs(
        obstructions: &[Obstruction],
        requirements: &[RequirementList],
    ) -> Vec<Obstruction> {
        let positive = Tiling::positive_cells_of(requirements);
        let mut sorted = obstructions.to_vec();
        sorted.sort();
        let mut clean: Vec<Obstruction> = Vec::with_capacity(sorted.len());
        for ob in &sorted {
            let cleaned = Tiling::clean_isolated(ob, &positive, requirements);
            if !clean.iter().any(|kept| cleaned.contains(kept)) {
                clean.push(cleaned);
            }
        }
        clean
    }

    /// One pass of requirement minimization.
    ///
    /// Alternatives containing an obstruction can never be satisfied and are
    /// dropped; within a list, an alternative containing another is
    /// redundant. A list drained of alternatives makes the tiling
    /// unsatisfiable: everything collapses to the length-0 obstruction.
    /// Across lists, a list implied by another kept list is dropped.
    fn minimal_reqs(
        obstructions: Vec<Obstruction>,
        requirements: &[RequirementList],
    ) -> (Vec<Obstruction>, Vec<RequirementList>) {
        let mut clean_lists: Vec<RequirementList> = Vec::with_capacity(requirements.len());
        for list in requirements {
            if list.iter().any(|req| req.is_empty()) {
                // A length-0 requirement is vacuously satisfied.
                continue;
            }
            let mut reqs = list.clone();
            reqs.sort();
            let mut redundant = vec![false; reqs.len()];
            for i in 0..reqs.len() {
                for j in i + 1..reqs.len() {
                    if reqs[j].contains(&reqs[i]) {
                        redundant[j] = true;
                    }
                }
                if obstructions.iter().any(|ob| reqs[i].contains(ob)) {
                    redundant[i] = true;
                }
            }
            let clean: RequirementList = reqs
                .into_iter()
                .zip(&redundant)
                .filter(|(_, &dead)| !dead)
                .map(|(req, _)| req)
                .collect();
            if clean.is_empty() {
                return (vec![GriddedPerm::empty()], Vec::new());
            }
            clean_lists.push(clean);
        }

        let mut removed = vec![false; clean_lists.len()];
        for i in 0..clean_lists.len() {
            if removed[i] {
                continue;
            }
            for j in 0..clean_lists.len() {
                if i == j || removed[j] {
                    continue;
                }
                let implied = clean_lists[i]
                    .iter()
                    .all(|r1| clean_lists[j].iter().any(|r2| r1.contains(r2)));
                if implied {
                    removed[j] = true;
                }
            }
        }
        let mut kept: Vec<RequirementList> = clean_lists
            .into_iter()
            .zip(&removed)
            .filter(|(_, &dead)| !dead)
            .map(|(list, _)| list)
            .collect();
        kept.sort();
        (obstructions, kept)
    }

    /// Adds a point obstruction to every in-bounds cell no constraint
    /// touches, closing the world around the active cells.
    fn fill_empty(obstructions: &mut Vec<Obstruction>, requirements: &[RequirementList]) {
        let (cols, rows) = Tiling::dims_of(obstructions, requirements);
        let active = Tiling::active_cells_of(obstructions, requirements);
        let empty = Tiling::empty_cells_of(obstructions);
        for col in 0..cols {
            for row in 0..rows {
                let cell = (col, row);
                if !active.contains(&cell) && !empty.contains(&cell) {
                    obstructions.push(GriddedPerm::point_at(cell));
                }
            }
        }
        obstructions.sort();
    }

    /// Renumbers used columns and rows to a dense range.
    ///
    /// Point obstructions in fully emptied columns or rows vanish with the
    /// cells they emptied; everything else is carried through the mapping.
    fn compact(
        obstructions: Vec<Obstruction>,
        requirements: Vec<RequirementList>,
    ) -> (Vec<Obstruction>, Vec<RequirementList>, (usize, usize)) {
        let active = Tiling::active_cells_of(&obstructions, &requirements);
        let (col_map, row_map): (BTreeMap<usize, usize>, BTreeMap<usize, usize>) =
            if active.is_empty() {
                let (cols, rows) = Tiling::dims_of(&obstructions, &requirements);
                ((0..cols).map(|c| (c, 0)).collect(), (0..rows).map(|r| (r, 0)).collect())
            } else {
                let cols: BTreeSet<usize> = active.iter().map(|&(c, _)| c).collect();
                let rows: BTreeSet<usize> = active.iter().map(|&(_, r)| r).collect();
                (
                    cols.into_iter().enumerate().map(|(new, old)| (old, new)).collect(),
                    rows.into_iter().enumerate().map(|(new, old)| (old, new)).collect(),
                )
            };

        let mut obs: Vec<Obstruction> = obstructions
            .iter()
            .filter(|ob| match ob.is_point() {
                Some((col, row)) => col_map.contains_key(&col) && row_map.contains_key(&row),
                None => true,
            })
            .map(|ob| ob.map_cells(|cell| map_cell(&col_map, &row_map, cell)))
            .collect();
        obs.sort();
        obs.dedup();
        let mut reqs: Vec<RequirementList> = requirements
            .into_iter()
            .map(|list| {
                let mut mapped: RequirementList = list
                    .iter()
                    .map(|req| req.map_cells(|cell| map_cell(&col_map, &row_map, cell)))
                    .collect();
                mapped.sort();
                mapped
            })
            .collect();
        reqs.sort();

        let cols = col_map.values().max().map_or(0, |&c| c) + 1;
        let rows = row_map.values().max().map_or(0, |&r| r) + 1;
        (obs, reqs, (cols, rows))
    }

    #[inline]
    pub fn obstructions(&self) -> &[Obstruction] {
        &self.obstructions
    }

    #[inline]
    pub fn requirements(&self) -> &[RequirementList] {
        &self.requirements
    }

    /// Grid dimensions as `(columns, rows)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    /// Cells that may be occupied by a gridded permutation.
    #[inline]
    pub fn active_cells(&self) -> &BTreeSet<Cell> {
        &self.active_cells
    }

    /// Cells forced non-empty by the requirements.
    #[inline]
    pub fn positive_cells(&self) -> &BTreeSet<Cell> {
        &self.positive_cells
    }

    /// Positive cells forced to hold exactly one point.
    #[inline]
    pub fn point_cells(&self) -> &BTreeSet<Cell> {
        &self.point_cells
    }

    /// Active cells not forced non-empty.
    pub fn possibly_empty(&self) -> BTreeSet<Cell> {
        self.active_cells
            .difference(&self.positive_cells)
            .copied()
            .collect()
    }

    /// Cells carrying a single-point obstruction.
    pub fn empty_cells(&self) -> BTreeSet<Cell> {
        Tiling::empty_cells_of(&self.obstructions)
    }

    /// Whether no gridded permutation can be gridded on this tiling.
    ///
    /// Computed once per instance; a length-0 obstruction short-circuits,
    /// otherwise the backtracking search is probed for a first result.
    pub fn is_empty(&self) -> bool {
        *self.emptiness.get_or_init(|| {
            self.obstructions.iter().any(|ob| ob.is_empty())
                || self.gridded_perms(None).next().is_none()
        })
    }

    /// Upper bound on the length of a minimal gridded permutation
    /// satisfying every requirement list: the sum over lists of their
    /// longest alternative.
    pub fn max_minimal_gridded_perm_length(&self) -> usize {
        self.requirements
            .iter()
            .map(|list| list.iter().map(GriddedPerm::len).max().unwrap_or(0))
            .sum()
    }

    #[inline]
    pub fn cell_within_bounds(&self, cell: Cell) -> bool {
        cell.0 < self.dimensions.0 && cell.1 < self.dimensions.1
    }

    /// A new tiling with `gp` added as an obstruction.
    pub fn add_obstruction(&self, gp: Obstruction) -> Tiling {
        let mut obs = self.obstructions.clone();
        obs.push(gp);
        Tiling::new(obs, self.requirements.clone())
    }

    /// A new tiling with `list` added as a requirement list.
    pub fn add_requirement_list(&self, list: RequirementList) -> Tiling {
        let mut reqs = self.requirements.clone();
        reqs.push(list);
        Tiling::new(self.obstructions.clone(), reqs)
    }

    /// A new tiling forbidding `patt` inside `cell`.
    pub fn add_single_cell_obstruction(&self, patt: Perm, cell: Cell) -> Tiling {
        self.add_obstruction(GriddedPerm::single_cell(patt, cell))
    }

    /// A new tiling requiring `patt` inside `cell`.
    pub fn add_single_cell_requirement(&self, patt: Perm, cell: Cell) -> Tiling {
        self.add_requirement_list(vec![GriddedPerm::single_cell(patt, cell)])
    }

    /// Empties `cell` by adding a point obstruction to it.
    pub fn empty_cell(&self, cell: Cell) -> Result<Tiling, CellError> {
        if !self.cell_within_bounds(cell) {
            return Err(CellError::OutOfBounds {
                cell,
                dimensions: self.dimensions,
            });
        }
        Ok(self.add_single_cell_obstruction(Perm::point(), cell))
    }

    /// Performs cell insertion: requires a point in `cell`.
    pub fn insert_cell(&self, cell: Cell) -> Result<Tiling, CellError> {
        if !self.cell_within_bounds(cell) {
            return Err(CellError::OutOfBounds {
                cell,
                dimensions: self.dimensions,
            });
        }
        Ok(self.add_single_cell_requirement(Perm::point(), cell))
    }

    /// Active cells in `row`.
    pub fn cells_in_row(&self, row: usize) -> BTreeSet<Cell> {
        self.active_cells
            .iter()
            .copied()
            .filter(|&(_, r)| r == row)
            .collect()
    }

    /// Active cells in `col`.
    pub fn cells_in_col(&self, col: usize) -> BTreeSet<Cell> {
        self.active_cells
            .iter()
            .copied()
            .filter(|&(c, _)| c == col)
            .collect()
    }

    pub fn only_cell_in_row(&self, cell: Cell) -> bool {
        self.active_cells.iter().filter(|&&(_, r)| r == cell.1).count() == 1
    }

    pub fn only_cell_in_col(&self, cell: Cell) -> bool {
        self.active_cells.iter().filter(|&&(c, _)| c == cell.0).count() == 1
    }

    pub fn only_positive_in_row(&self, cell: Cell) -> bool {
        self.positive_cells.contains(&cell)
            && self.positive_cells.iter().filter(|&&(_, r)| r == cell.1).count() == 1
    }

    pub fn only_positive_in_col(&self, cell: Cell) -> bool {
        self.positive_cells.contains(&cell)
            && self.positive_cells.iter().filter(|&&(c, _)| c == cell.0).count() == 1
    }

    pub fn only_positive_in_row_and_col(&self, cell: Cell) -> bool {
        self.only_positive_in_row(cell) && self.only_positive_in_col(cell)
    }

    /// The localized basis of each cell: the patterns of the obstructions
    /// whose points all lie in that cell.
    pub fn cell_basis(&self) -> BTreeMap<Cell, Vec<Perm>> {
        let mut basis: BTreeMap<Cell, Vec<Perm>> = BTreeMap::new();
        for ob in &self.obstructions {
            if let Some(cell) = ob.is_single_cell() {
                basis.entry(cell).or_default().push(ob.patt().clone());
            }
        }
        basis
    }

    /// Applies a symmetry of the square to the whole tiling.
    ///
    /// Every obstruction and requirement is transformed jointly on pattern
    /// and cells, and the result rebuilt through the canonicalizing
    /// constructor, so the transformed tiling is itself in canonical form.
    pub fn transform(&self, sym: Symmetry) -> Tiling {
        let (cols, rows) = self.dimensions;
        let obs = self
            .obstructions
            .iter()
            .map(|ob| ob.transform(sym, |cell| sym.map_cell(cols, rows, cell)))
            .collect();
        let reqs = self
            .requirements
            .iter()
            .map(|list| {
                list.iter()
                    .map(|req| req.transform(sym, |cell| sym.map_cell(cols, rows, cell)))
                    .collect()
            })
            .collect();
        Tiling::new(obs, reqs)
    }

    /// Flip over the vertical axis.
    pub fn reverse(&self) -> Tiling {
        self.transform(Symmetry::Reverse)
    }

    /// Flip over the horizontal axis.
    pub fn complement(&self) -> Tiling {
        self.transform(Symmetry::Complement)
    }

    /// Flip over the main diagonal.
    pub fn inverse(&self) -> Tiling {
        self.transform(Symmetry::Inverse)
    }

    /// Flip over the anti-diagonal.
    pub fn antidiagonal(&self) -> Tiling {
        self.transform(Symmetry::Antidiagonal)
    }

    pub fn rotate90(&self) -> Tiling {
        self.transform(Symmetry::Rotate90)
    }

    pub fn rotate180(&self) -> Tiling {
        self.transform(Symmetry::Rotate180)
    }

    pub fn rotate270(&self) -> Tiling {
        self.transform(Symmetry::Rotate270)
    }

    /// Serializes to the JSON interchange form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes from the JSON interchange form, rebuilding canonical
    /// form through the constructor.
    pub fn from_json(json: &str) -> Result<Tiling, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl PartialEq for Tiling {
    fn eq(&self, other: &Tiling) -> bool {
        self.obstructions == other.obstructions && self.requirements == other.requirements
    }
}

impl Eq for Tiling {}

impl PartialOrd for Tiling {
    fn partial_cmp(&self, other: &Tiling) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tiling {
    fn cmp(&self, other: &Tiling) -> std::cmp::Ordering {
        (&self.obstructions, &self.requirements).cmp(&(&other.obstructions, &other.requirements))
    }
}

impl Hash for Tiling {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.obstructions.hash(state);
        self.requirements.hash(state);
    }
}

impl Serialize for Tiling {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Tiling", 2)?;
        s.serialize_field("obstructions", &self.obstructions)?;
        s.serialize_field("requirements", &self.requirements)?;
        s.end()
    }
}

impl fmt::Display for Tiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obstructions:")?;
        for ob in &self.obstructions {
            write!(f, " [{}]", ob)?;
        }
        write!(f, "\nRequirements:")?;
        for list in &self.requirements {
            write!(f, " [")?;
            for (i, req) in list.iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                write!(f, "{}", req)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
