//! Backtracking enumeration of the gridded permutations a tiling admits.
//!
//! The search grows gridded permutations column by column, left to right,
//! appending one point at a time inside the active cells of the current
//! column. Branches die when an obstruction occurs, when a requirement list
//! can no longer be satisfied, or when the length or column bound is
//! reached. The traversal is depth-first over an explicit frame stack and
//! produces a lazy, finite, non-restartable sequence.
//!
//! # Invariants
//! - No gridded permutation is yielded twice: a state is emitted only when
//!   its requirement lists are exhausted and no ancestor on the skip chain
//!   already emitted it.
//! - Candidate order is deterministic: cells of a column in sorted order,
//!   values bottom to top.

use crate::cell::Cell;
use crate::griddedperm::{GriddedPerm, Requirement, RequirementList};
use crate::tiling::Tiling;
use tracing::trace;

impl Tiling {
    /// Enumerates every gridded permutation griddable on this tiling, up to
    /// `max_len` points.
    ///
    /// With `None`, the bound defaults to the longest minimal satisfying
    /// gridded permutation (at least 1), beyond which no minimal result can
    /// still be growing.
    pub fn gridded_perms(&self, max_len: Option<usize>) -> GriddedPerms<'_> {
        GriddedPerms::new(self, max_len)
    }

    /// Enumerates the griddable gridded permutations of exactly `length`
    /// points.
    pub fn gridded_perms_of_length(
        &self,
        length: usize,
    ) -> impl Iterator<Item = GriddedPerm> + '_ {
        self.gridded_perms(Some(length))
            .filter(move |gp| gp.len() == length)
    }
}

fn satisfies(gp: &GriddedPerm, list: &RequirementList) -> bool {
    list.iter().any(|req| gp.contains(req))
}

/// Whether `req` could still occur once columns `col` and beyond are
/// filled: its prefix restricted to earlier columns must already occur.
fn can_satisfy(gp: &GriddedPerm, col: usize, req: &Requirement) -> bool {
    gp.contains(&req.sub_perm_left_of_col(col))
}

fn can_satisfy_all(gp: &GriddedPerm, col: usize, lists: &[RequirementList]) -> bool {
    lists
        .iter()
        .all(|list| list.iter().any(|req| can_satisfy(gp, col, req)))
}

/// A state about to be explored: the partial gridded permutation, its
/// column, the requirement lists still unsatisfied, and whether an ancestor
/// on the column-skip chain already yielded this exact gridded permutation.
struct Enter {
    gp: GriddedPerm,
    col: usize,
    reqs: Vec<RequirementList>,
    yielded: bool,
}

/// One suspended search state, producing its children on demand: first the
/// column-skip child, then one child per point appended into the column.
struct Frame {
    gp: GriddedPerm,
    col: usize,
    reqs: Vec<RequirementList>,
    satisfiable: Vec<RequirementList>,
    yielded: bool,
    skip_tried: bool,
    cells: Vec<Cell>,
    cell_idx: usize,
    next_val: usize,
    max_val: usize,
    box_ready: bool,
}

impl Frame {
    fn new(
        gp: GriddedPerm,
        col: usize,
        reqs: Vec<RequirementList>,
        satisfiable: Vec<RequirementList>,
        yielded: bool,
        cells: Vec<Cell>,
    ) -> Self {
        Frame {
            gp,
            col,
            reqs,
            satisfiable,
            yielded,
            skip_tried: false,
            cells,
            cell_idx: 0,
            next_val: 0,
            max_val: 0,
            box_ready: false,
        }
    }

    fn next_child(&mut self, tiling: &Tiling) -> Option<Enter> {
        if !self.skip_tried {
            self.skip_tried = true;
            // Skip to the next column when every remaining list can still be
            // satisfied without touching this one.
            if can_satisfy_all(&self.gp, self.col + 1, &self.satisfiable) {
                return Some(Enter {
                    gp: self.gp.clone(),
                    col: self.col + 1,
                    reqs: self.satisfiable.clone(),
                    yielded: self.yielded,
                });
            }
        }
        loop {
            if !self.box_ready {
                let &cell = self.cells.get(self.cell_idx)?;
                let bb = self.gp.bounding_box(cell);
                self.next_val = bb.min_value;
                self.max_val = bb.max_value;
                self.box_ready = true;
            }
            if self.next_val > self.max_val {
                self.cell_idx += 1;
                self.box_ready = false;
                continue;
            }
            let cell = self.cells[self.cell_idx];
            let val = self.next_val;
            self.next_val += 1;
            let next_gp = self.gp.append_point(cell, val);
            if tiling.obstructions().iter().any(|ob| next_gp.contains(ob)) {
                continue;
            }
            let reqs = self
                .reqs
                .iter()
                .filter(|list| !satisfies(&next_gp, list))
                .cloned()
                .collect();
            return Some(Enter {
                gp: next_gp,
                col: self.col,
                reqs,
                yielded: false,
            });
        }
    }
}

/// Lazy depth-first enumeration of a tiling's gridded permutations.
pub struct GriddedPerms<'a> {
    tiling: &'a Tiling,
    max_len: usize,
    to_enter: Option<Enter>,
    stack: Vec<Frame>,
}

impl<'a> GriddedPerms<'a> {
    fn new(tiling: &'a Tiling, max_len: Option<usize>) -> Self {
        let max_len = max_len.unwrap_or_else(|| tiling.max_minimal_gridded_perm_length().max(1));
        // A length-0 obstruction forbids everything, the empty gridded
        // permutation included.
        let contradictory = tiling.obstructions().iter().any(|ob| ob.is_empty());
        GriddedPerms {
            tiling,
            max_len,
            to_enter: if contradictory {
                None
            } else {
                Some(Enter {
                    gp: GriddedPerm::empty(),
                    col: 0,
                    reqs: tiling.requirements().to_vec(),
                    yielded: false,
                })
            },
            stack: Vec::new(),
        }
    }
}

impl<'a> Iterator for GriddedPerms<'a> {
    type Item = GriddedPerm;

    fn next(&mut self) -> Option<GriddedPerm> {
        loop {
            if let Some(enter) = self.to_enter.take() {
                let Enter {
                    gp,
                    col,
                    reqs,
                    mut yielded,
                } = enter;
                let mut emit = None;
                if reqs.is_empty() && !yielded {
                    emit = Some(gp.clone());
                    yielded = true;
                }
                if gp.len() < self.max_len && col < self.tiling.dimensions().0 {
                    let satisfiable: Vec<RequirementList> = reqs
                        .iter()
                        .filter(|list| !satisfies(&gp, list))
                        .map(|list| {
                            list.iter()
                                .filter(|req| can_satisfy(&gp, col, req))
                                .cloned()
                                .collect()
                        })
                        .collect();
                    if !satisfiable.iter().any(|list| list.is_empty()) {
                        let cells: Vec<Cell> =
                            self.tiling.cells_in_col(col).into_iter().collect();
                        self.stack
                            .push(Frame::new(gp, col, reqs, satisfiable, yielded, cells));
                    }
                }
                if let Some(found) = emit {
                    trace!(len = found.len(), "yielding gridded permutation");
                    return Some(found);
                }
                continue;
            }
            let frame = self.stack.last_mut()?;
            match frame.next_child(self.tiling) {
                Some(enter) => self.to_enter = Some(enter),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
