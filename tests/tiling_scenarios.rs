//! End-to-end scenarios exercising construction, enumeration, placement,
//! factorization and the codec together.

use permgrid::prelude::*;

fn perm(values: &[usize]) -> Perm {
    Perm::new(values.to_vec()).unwrap()
}

fn cell_ob(values: &[usize], cell: Cell) -> GriddedPerm {
    GriddedPerm::single_cell(perm(values), cell)
}

/// The 1x1 tiling whose single cell is empty admits exactly the empty
/// gridded permutation, at every bound.
#[test]
fn empty_cell_scenario() {
    let tiling = Tiling::new(vec![cell_ob(&[0], (0, 0))], vec![]);
    for bound in [None, Some(1), Some(4)] {
        let admitted: Vec<_> = tiling.gridded_perms(bound).collect();
        assert_eq!(admitted, vec![GriddedPerm::empty()]);
    }
    assert!(!tiling.is_empty());
    assert_eq!(tiling.dimensions(), (1, 1));
}

/// The point tiling admits exactly one gridded permutation of length 1.
#[test]
fn point_tiling_scenario() {
    let tiling = Tiling::new(
        vec![cell_ob(&[0, 1], (0, 0)), cell_ob(&[1, 0], (0, 0))],
        vec![vec![GriddedPerm::point_at((0, 0))]],
    );
    assert_eq!(tiling.point_cells().len(), 1);
    assert_eq!(
        tiling.gridded_perms(None).collect::<Vec<_>>(),
        vec![GriddedPerm::point_at((0, 0))]
    );
    for length in [0, 2, 3] {
        assert_eq!(tiling.gridded_perms_of_length(length).count(), 0);
    }
}

/// Jointly unsatisfiable constraints collapse to the canonical empty
/// tiling, and the search yields nothing at any bound.
#[test]
fn contradiction_closure_scenario() {
    let tiling = Tiling::new(
        vec![cell_ob(&[0], (0, 0))],
        vec![vec![GriddedPerm::point_at((0, 0))]],
    );
    assert!(tiling.is_empty());
    for bound in [None, Some(2), Some(6)] {
        assert_eq!(tiling.gridded_perms(bound).count(), 0);
    }
}

/// Cell insertion splits a class into "empty cell" and "cell with a point"
/// children whose gridded permutations partition the parent's.
#[test]
fn cell_insertion_case_split() {
    let parent = Tiling::new(vec![cell_ob(&[0, 1, 2], (0, 0))], vec![]);
    let with_point = parent.insert_cell((0, 0)).unwrap();
    let without = parent.empty_cell((0, 0)).unwrap();

    for length in 0..4 {
        let parent_count = parent.gridded_perms_of_length(length).count();
        let with_count = with_point.gridded_perms_of_length(length).count();
        let without_count = without.gridded_perms_of_length(length).count();
        assert_eq!(
            parent_count,
            with_count + without_count,
            "length {}",
            length
        );
    }
}

/// A block-diagonal tiling factors, and the factor counting sequences
/// multiply back to the parent's.
#[test]
fn factor_counts_multiply() {
    let tiling = Tiling::new(
        vec![cell_ob(&[0, 1], (0, 0)), cell_ob(&[1, 0], (1, 1))],
        vec![],
    );
    let factors = tiling.find_factors();
    assert_eq!(factors.len(), 2);

    // The two cells are separated in both index and value, so a gridded
    // permutation of the parent is exactly a choice of one gridded
    // permutation per factor: the counting sequences convolve.
    for length in 0..4 {
        let expected: usize = (0..=length)
            .map(|k| {
                let left = factors[0].gridded_perms_of_length(k).count();
                let right = factors[1].gridded_perms_of_length(length - k).count();
                left * right
            })
            .sum();
        assert_eq!(
            tiling.gridded_perms_of_length(length).count(),
            expected,
            "length {}",
            length
        );
    }
}

/// Placement results feed back into tilings: placing the point of a point
/// cell produces children that still admit gridded permutations.
#[test]
fn placement_pipeline() {
    let requirement = GriddedPerm::new(perm(&[0, 1]), vec![(0, 0), (1, 1)]).unwrap();
    for direction in [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ] {
        let placed = requirement.place_point((0, 0), direction);
        assert!(!placed.is_empty());
        for gp in placed {
            assert!(!gp.contradictory());
        }
    }
}

/// The binary codec round-trips through a shared pattern table across a
/// family of symmetric tilings.
#[test]
fn codec_with_shared_table_across_symmetries() {
    let base = Tiling::new(
        vec![
            cell_ob(&[0, 2, 1], (0, 0)),
            GriddedPerm::new(perm(&[0, 1]), vec![(0, 0), (1, 1)]).unwrap(),
        ],
        vec![vec![
            GriddedPerm::point_at((0, 0)),
            GriddedPerm::point_at((1, 1)),
        ]],
    );
    let family: Vec<Tiling> = Symmetry::ALL.iter().map(|&s| base.transform(s)).collect();

    let mut patterns: Vec<Perm> = family
        .iter()
        .flat_map(|t| {
            t.obstructions()
                .iter()
                .map(|ob| ob.patt().clone())
                .chain(
                    t.requirements()
                        .iter()
                        .flat_map(|list| list.iter().map(|req| req.patt().clone())),
                )
        })
        .collect();
    patterns.sort();
    patterns.dedup();
    let table = PatternTable::new(patterns).unwrap();

    for tiling in &family {
        let bytes = tiling.compress(Some(&table)).unwrap();
        assert_eq!(&Tiling::decompress(&bytes, Some(&table)).unwrap(), tiling);
        // Table form and rank form agree on the decoded value.
        let plain = tiling.compress(None).unwrap();
        assert_eq!(&Tiling::decompress(&plain, None).unwrap(), tiling);
    }
}

/// Fingerprints key a deduplication map the way the persistence layer
/// uses them: symmetric variants of one tiling may coincide or differ,
/// but rebuilding any variant reproduces its own key.
#[test]
fn fingerprints_are_stable_dedup_keys() {
    use std::collections::BTreeMap;

    let base = Tiling::new(
        vec![
            cell_ob(&[0, 1], (0, 0)),
            GriddedPerm::new(perm(&[1, 0]), vec![(0, 1), (1, 0)]).unwrap(),
        ],
        vec![],
    );
    let mut store: BTreeMap<TilingFingerprint, Tiling> = BTreeMap::new();
    for &sym in &Symmetry::ALL {
        let variant = base.transform(sym);
        store.insert(variant.fingerprint().unwrap(), variant);
    }
    for (key, tiling) in &store {
        assert_eq!(tiling.fingerprint().unwrap(), *key);
        let rebuilt =
            Tiling::new(tiling.obstructions().to_vec(), tiling.requirements().to_vec());
        assert_eq!(rebuilt.fingerprint().unwrap(), *key);
    }
}
