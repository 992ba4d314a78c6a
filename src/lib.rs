//! permgrid: tilings of permutation classes.
//!
//! This crate implements the tiling engine used to mechanically decompose a
//! permutation class into simpler pieces:
//! - Gridded permutations: a permutation with a grid cell for every point.
//! - Tilings: grids constrained by obstructions (forbidden occurrences) and
//!   requirement lists (OR-groups of mandatory occurrences), normalized to
//!   a canonical minimal form at construction.
//! - Factorization into independent sub-tilings, the eight symmetries of
//!   the square, bounded backtracking enumeration of the gridded
//!   permutations a tiling admits, and a canonical binary codec with
//!   fingerprinting for persistence keys.
//!
//! Every type is an immutable value: operations that look like mutation
//! return new values, so tilings can be shared freely across threads.
//!
//! # References
//!
//! - Albert, Atkinson. "Simple permutations and pattern restricted
//!   permutations" (2005) – symmetry group of permutation classes
//! - Bean. "Finding structure in permutation classes" (2018) – tilings and
//!   the case-split decomposition this engine serves
//!
//! # Example
//!
//! ```
//! use permgrid::prelude::*;
//!
//! // A single cell forbidding both ascents and descents, with a point
//! // required: the tiling of exactly one point.
//! let tiling = Tiling::new(
//!     vec![
//!         GriddedPerm::single_cell(Perm::new(vec![0, 1]).unwrap(), (0, 0)),
//!         GriddedPerm::single_cell(Perm::new(vec![1, 0]).unwrap(), (0, 0)),
//!     ],
//!     vec![vec![GriddedPerm::point_at((0, 0))]],
//! );
//! let admitted: Vec<_> = tiling.gridded_perms(None).collect();
//! assert_eq!(admitted, vec![GriddedPerm::point_at((0, 0))]);
//! ```

pub mod cell;
pub mod codec;
pub mod factor;
pub mod fingerprint;
pub mod griddedperm;
pub mod perm;
pub mod search;
pub mod symmetry;
pub mod tiling;

pub use cell::{Cell, Direction};
pub use codec::{CodecError, PatternTable};
pub use fingerprint::{HashValue, TilingFingerprint};
pub use griddedperm::{
    BoundingBox, GriddedPerm, GriddingError, Obstruction, Requirement, RequirementList,
};
pub use perm::{Perm, PermError};
pub use search::GriddedPerms;
pub use symmetry::Symmetry;
pub use tiling::{CellError, Tiling};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::cell::{Cell, Direction};
    pub use crate::codec::{CodecError, PatternTable};
    pub use crate::fingerprint::{HashValue, TilingFingerprint};
    pub use crate::griddedperm::{
        BoundingBox, GriddedPerm, GriddingError, Obstruction, Requirement, RequirementList,
    };
    pub use crate::perm::{Perm, PermError};
    pub use crate::search::GriddedPerms;
    pub use crate::symmetry::Symmetry;
    pub use crate::tiling::{CellError, Tiling};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    fn perm(values: &[usize]) -> Perm {
        Perm::new(values.to_vec()).unwrap()
    }

    fn cell_ob(values: &[usize], cell: Cell) -> GriddedPerm {
        GriddedPerm::single_cell(perm(values), cell)
    }

    /// Point placement into a tiling-like pipeline: place, rebuild, query.
    #[test]
    fn placement_feeds_back_into_construction() {
        let ob = GriddedPerm::new(perm(&[0, 1]), vec![(0, 0), (1, 1)]).unwrap();
        let placed = ob.place_point((0, 0), Direction::East);
        // Each placement result is a valid obstruction for a new tiling.
        for gp in placed {
            assert!(!gp.contradictory());
            let t = Tiling::new(vec![gp], vec![]);
            assert!(!t.is_empty());
        }
    }

    /// A two-factor tiling splits and the factors enumerate independently.
    #[test]
    fn factors_enumerate_independently() {
        let t = Tiling::new(
            vec![
                cell_ob(&[0, 1], (0, 0)),
                cell_ob(&[1, 0], (0, 0)),
                cell_ob(&[0, 1], (1, 1)),
                cell_ob(&[1, 0], (1, 1)),
            ],
            vec![
                vec![GriddedPerm::point_at((0, 0))],
                vec![GriddedPerm::point_at((1, 1))],
            ],
        );
        let factors = t.find_factors();
        assert_eq!(factors.len(), 2);
        for factor in &factors {
            // Each factor is the point tiling.
            assert_eq!(
                factor.gridded_perms(None).collect::<Vec<_>>(),
                vec![GriddedPerm::point_at((0, 0))]
            );
        }
    }

    /// Compression, fingerprints and symmetries agree on canonical forms.
    #[test]
    fn codec_and_symmetries_compose() {
        let t = Tiling::new(
            vec![
                cell_ob(&[0, 2, 1], (0, 0)),
                GriddedPerm::new(perm(&[0, 1]), vec![(0, 0), (1, 1)]).unwrap(),
            ],
            vec![vec![
                GriddedPerm::point_at((0, 0)),
                GriddedPerm::point_at((1, 1)),
            ]],
        );
        let round_tripped = Tiling::decompress(&t.compress(None).unwrap(), None).unwrap();
        assert_eq!(round_tripped, t);
        assert_eq!(round_tripped.fingerprint().unwrap(), t.fingerprint().unwrap());
        // A full turn of the square is the identity on fingerprints too.
        let turned = t.rotate90().rotate90().rotate90().rotate90();
        assert_eq!(turned.fingerprint().unwrap(), t.fingerprint().unwrap());
    }
}
