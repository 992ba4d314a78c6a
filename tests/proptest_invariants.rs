//! Property tests for the canonicalization, codec and search invariants.

use permgrid::prelude::*;
use proptest::prelude::*;

fn arb_perm(max_len: usize) -> impl Strategy<Value = Perm> {
    prop::collection::vec(0u8..16, 0..=max_len)
        .prop_map(|keys| Perm::to_standard(keys.into_iter().map(usize::from)))
}

fn arb_gridded_perm(grid: usize, max_len: usize) -> impl Strategy<Value = GriddedPerm> {
    arb_perm(max_len).prop_flat_map(move |patt| {
        let len = patt.len();
        prop::collection::vec((0..grid, 0..grid), len)
            .prop_map(move |pos| GriddedPerm::new(patt.clone(), pos).unwrap())
    })
}

/// Gridded permutations whose cells agree with the pattern: columns are
/// drawn sorted by index and rows sorted by value.
fn arb_consistent_gridded_perm(
    grid: usize,
    max_len: usize,
) -> impl Strategy<Value = GriddedPerm> {
    arb_perm(max_len).prop_flat_map(move |patt| {
        let len = patt.len();
        (
            Just(patt),
            prop::collection::vec(0..grid, len),
            prop::collection::vec(0..grid, len),
        )
    })
    .prop_map(|(patt, mut cols, mut rows)| {
        cols.sort_unstable();
        rows.sort_unstable();
        let pos = (0..patt.len()).map(|i| (cols[i], rows[patt[i]])).collect();
        GriddedPerm::new(patt, pos).unwrap()
    })
}

fn arb_tiling() -> impl Strategy<Value = Tiling> {
    (
        prop::collection::vec(arb_gridded_perm(3, 3), 0..4),
        prop::collection::vec(prop::collection::vec(arb_gridded_perm(3, 2), 1..3), 0..3),
    )
        .prop_map(|(obstructions, requirements)| Tiling::new(obstructions, requirements))
}

proptest! {
    #[test]
    fn construction_is_a_fixpoint(tiling in arb_tiling()) {
        let rebuilt = Tiling::new(
            tiling.obstructions().to_vec(),
            tiling.requirements().to_vec(),
        );
        prop_assert_eq!(rebuilt, tiling);
    }

    #[test]
    fn binary_codec_round_trips(tiling in arb_tiling()) {
        let bytes = tiling.compress(None).unwrap();
        prop_assert_eq!(Tiling::decompress(&bytes, None).unwrap(), tiling);
    }

    #[test]
    fn binary_codec_round_trips_with_table(tiling in arb_tiling()) {
        let mut patterns: Vec<Perm> = tiling
            .obstructions()
            .iter()
            .map(|ob| ob.patt().clone())
            .chain(
                tiling
                    .requirements()
                    .iter()
                    .flat_map(|list| list.iter().map(|req| req.patt().clone())),
            )
            .collect();
        patterns.sort();
        patterns.dedup();
        let table = PatternTable::new(patterns).unwrap();
        let bytes = tiling.compress(Some(&table)).unwrap();
        prop_assert_eq!(Tiling::decompress(&bytes, Some(&table)).unwrap(), tiling);
    }

    #[test]
    fn json_round_trips(tiling in arb_tiling()) {
        let json = tiling.to_json().unwrap();
        prop_assert_eq!(Tiling::from_json(&json).unwrap(), tiling);
    }

    #[test]
    fn equal_tilings_share_fingerprints(tiling in arb_tiling()) {
        let rebuilt = Tiling::new(
            tiling.obstructions().to_vec(),
            tiling.requirements().to_vec(),
        );
        prop_assert_eq!(
            rebuilt.fingerprint().unwrap(),
            tiling.fingerprint().unwrap()
        );
    }

    #[test]
    fn symmetry_group_laws(tiling in arb_tiling()) {
        prop_assert_eq!(tiling.reverse().reverse(), tiling.clone());
        prop_assert_eq!(tiling.complement().complement(), tiling.clone());
        prop_assert_eq!(tiling.inverse().inverse(), tiling.clone());
        prop_assert_eq!(tiling.antidiagonal().antidiagonal(), tiling.clone());
        prop_assert_eq!(tiling.rotate90().rotate90(), tiling.rotate180());
        prop_assert_eq!(tiling.rotate180().rotate180(), tiling.clone());
        prop_assert_eq!(tiling.rotate270().rotate90(), tiling.clone());
        prop_assert_eq!(tiling.reverse().complement(), tiling.rotate180());
        prop_assert_eq!(tiling.rotate180().inverse(), tiling.antidiagonal());
    }

    #[test]
    fn factor_cells_partition_active_cells(tiling in arb_tiling()) {
        let components = tiling.factor_cells();
        let mut seen = std::collections::BTreeSet::new();
        for component in &components {
            prop_assert!(!component.is_empty());
            for &cell in component {
                // Components are pairwise disjoint.
                prop_assert!(seen.insert(cell));
            }
        }
        prop_assert_eq!(&seen, tiling.active_cells());
        prop_assert_eq!(components.len(), tiling.find_factors().len());
    }

    #[test]
    fn no_requirement_list_implies_another(tiling in arb_tiling()) {
        let lists = tiling.requirements();
        for (i, a) in lists.iter().enumerate() {
            for (j, b) in lists.iter().enumerate() {
                if i == j {
                    continue;
                }
                let implies = a
                    .iter()
                    .all(|r1| b.iter().any(|r2| r1.contains(r2)));
                prop_assert!(!implies, "list {} implies list {}", i, j);
            }
        }
    }

    #[test]
    fn enumeration_yields_only_valid_gridded_perms(tiling in arb_tiling()) {
        let admitted: Vec<GriddedPerm> = tiling.gridded_perms(Some(3)).collect();
        let mut dedup = admitted.clone();
        dedup.sort();
        dedup.dedup();
        prop_assert_eq!(dedup.len(), admitted.len(), "duplicate results");
        for gp in &admitted {
            prop_assert!(!gp.contradictory());
            for cell in gp.pos() {
                prop_assert!(tiling.active_cells().contains(cell));
            }
            for ob in tiling.obstructions() {
                prop_assert!(!gp.contains(ob));
            }
            for list in tiling.requirements() {
                prop_assert!(list.iter().any(|req| gp.contains(req)));
            }
        }
    }

    #[test]
    fn placement_respects_consistency(
        gp in arb_consistent_gridded_perm(3, 4),
        cell in (0usize..3, 0usize..3),
    ) {
        let occupants = gp.points_in_cell(cell).count();
        let placed = gp.place_point(cell, Direction::None);
        // One removal result per occupant, then one stretched copy per
        // insertion seam.
        prop_assert!(placed.len() > occupants);
        for (i, result) in placed.iter().enumerate() {
            prop_assert!(!result.contradictory());
            if i < occupants {
                prop_assert_eq!(result.len() + 1, gp.len());
            } else {
                prop_assert_eq!(result.len(), gp.len());
            }
        }
    }

    #[test]
    fn gridded_perm_words_round_trip(gp in arb_gridded_perm(4, 5)) {
        let words = gp.compress(None).unwrap();
        prop_assert_eq!(GriddedPerm::decompress(&words, None).unwrap(), gp);
    }
}
