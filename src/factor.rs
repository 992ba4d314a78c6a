//! Factorization of a tiling into independent sub-tilings.
//!
//! Two active cells belong to the same factor if they share a row or a
//! column, co-occur in an obstruction, or co-occur in a requirement list.
//! Connected components of that relation are computed with a union-find
//! over the grid cells; the restriction of the constraint sets to a
//! component forms a child tiling rebuilt through the canonicalizing
//! constructor. The counting sequence of the whole tiling is the product
//! of its factors' sequences, which is the external reason factorization
//! exists at all.

use crate::cell::Cell;
use crate::griddedperm::RequirementList;
use crate::tiling::Tiling;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Disjoint-set forest with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn unite(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

impl Tiling {
    /// The partition of the active cells into factor components, in the
    /// tiling's own coordinates.
    pub fn factor_cells(&self) -> Vec<BTreeSet<Cell>> {
        let rows = self.dimensions().1;
        let cell_to_int = |cell: Cell| cell.0 * rows + cell.1;
        let mut uf = UnionFind::new(self.dimensions().0 * rows);

        for ob in self.obstructions() {
            unite_cells(&mut uf, ob.pos().iter().copied().map(cell_to_int));
        }
        for list in self.requirements() {
            unite_cells(
                &mut uf,
                list.iter()
                    .flat_map(|req| req.pos().iter().copied())
                    .map(cell_to_int),
            );
        }
        let active: Vec<Cell> = self.active_cells().iter().copied().collect();
        for (i, &a) in active.iter().enumerate() {
            for &b in &active[i + 1..] {
                if a.0 == b.0 || a.1 == b.1 {
                    uf.unite(cell_to_int(a), cell_to_int(b));
                }
            }
        }

        let mut components: BTreeMap<usize, BTreeSet<Cell>> = BTreeMap::new();
        for &cell in &active {
            components
                .entry(uf.find(cell_to_int(cell)))
                .or_default()
                .insert(cell);
        }
        components.into_values().collect()
    }

    /// Splits the tiling into its irreducible factors.
    ///
    /// Every constraint and every shared row or column welds its cells into
    /// one component; each component keeps the obstructions and requirement
    /// lists rooted in it and becomes an independently constructed tiling,
    /// compacted to its own dense grid. A tiling with no active cells has
    /// no factors.
    pub fn find_factors(&self) -> Vec<Tiling> {
        let components = self.factor_cells();
        debug!(factors = components.len(), "factored tiling");

        components
            .into_iter()
            .map(|component| {
                let obstructions = self
                    .obstructions()
                    .iter()
                    .filter(|ob| ob.pos().first().is_some_and(|cell| component.contains(cell)))
                    .cloned()
                    .collect();
                let requirements: Vec<RequirementList> = self
                    .requirements()
                    .iter()
                    .filter(|list| {
                        list.first()
                            .and_then(|req| req.pos().first())
                            .is_some_and(|cell| component.contains(cell))
                    })
                    .cloned()
                    .collect();
                Tiling::new(obstructions, requirements)
            })
            .collect()
    }

    /// Whether the tiling splits into more than one factor.
    pub fn factorable(&self) -> bool {
        self.factor_cells().len() > 1
    }
}

fn unite_cells<I>(uf: &mut UnionFind, mut cells: I)
where
    I: Iterator<Item = usize>,
{
    if let Some(first) = cells.next() {
        for cell in cells {
            uf.unite(first, cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::griddedperm::GriddedPerm;
    use crate::perm::Perm;

    fn perm(values: &[usize]) -> Perm {
        Perm::new(values.to_vec()).unwrap()
    }

    fn cell_ob(values: &[usize], cell: Cell) -> GriddedPerm {
        GriddedPerm::single_cell(perm(values), cell)
    }

    #[test]
    fn diagonal_cells_split_into_two_factors() {
        let t = Tiling::new(
            vec![cell_ob(&[0, 1], (0, 0)), cell_ob(&[1, 0], (1, 1))],
            vec![],
        );
        let factors = t.find_factors();
        assert_eq!(factors.len(), 2);
        assert!(t.factorable());
        // Each factor compacts down to a lone cell.
        for factor in &factors {
            assert_eq!(factor.dimensions(), (1, 1));
        }
        assert_eq!(factors[0].obstructions(), &[cell_ob(&[0, 1], (0, 0))]);
        assert_eq!(factors[1].obstructions(), &[cell_ob(&[1, 0], (0, 0))]);
    }

    #[test]
    fn shared_row_welds_cells_together() {
        let t = Tiling::new(
            vec![cell_ob(&[0, 1], (0, 0)), cell_ob(&[1, 0], (1, 0))],
            vec![],
        );
        assert_eq!(t.find_factors().len(), 1);
        assert!(!t.factorable());
    }

    #[test]
    fn crossing_obstruction_welds_diagonal_cells() {
        let t = Tiling::new(
            vec![
                cell_ob(&[0, 1, 2], (0, 0)),
                cell_ob(&[0, 1, 2], (1, 1)),
                GriddedPerm::new(perm(&[0, 1]), vec![(0, 0), (1, 1)]).unwrap(),
            ],
            vec![],
        );
        assert_eq!(t.find_factors().len(), 1);
    }

    #[test]
    fn requirement_list_welds_its_cells() {
        // The two alternatives live in diagonal cells; the list ties them.
        let t = Tiling::new(
            vec![cell_ob(&[0, 1], (0, 0)), cell_ob(&[0, 1], (1, 1))],
            vec![vec![
                GriddedPerm::point_at((0, 0)),
                GriddedPerm::point_at((1, 1)),
            ]],
        );
        assert_eq!(t.find_factors().len(), 1);
    }

    #[test]
    fn factor_cells_partition_the_active_cells() {
        let t = Tiling::new(
            vec![
                cell_ob(&[0, 1], (0, 0)),
                cell_ob(&[1, 0], (1, 1)),
                cell_ob(&[0, 1, 2], (2, 2)),
            ],
            vec![vec![GriddedPerm::point_at((2, 2))]],
        );
        let factors = t.find_factors();
        assert_eq!(factors.len(), 3);
        let total: usize = factors.iter().map(|f| f.active_cells().len()).sum();
        assert_eq!(total, t.active_cells().len());
    }

    #[test]
    fn empty_tiling_has_no_factors() {
        let t = Tiling::new(vec![GriddedPerm::empty()], vec![]);
        assert!(t.find_factors().is_empty());
    }
}
