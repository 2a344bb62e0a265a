//! Property-based tests for the placement grid.
//!
//! Random sequences of place/move/remove must keep every cell owned by at
//! most one occupant, keep every footprint inside the grid, and keep the
//! cell table and the placement table in agreement.

use std::collections::BTreeMap;

use homestead_core::id::{BuildingId, Occupant};
use homestead_spatial::{Footprint, GridPosition, PlacementGrid};
use proptest::prelude::*;
use slotmap::SlotMap;

const W: u32 = 8;
const H: u32 = 6;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum GridOp {
    Place { x: i32, y: i32, w: u32, h: u32 },
    Move { which: usize, x: i32, y: i32 },
    Remove { which: usize },
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<GridOp>> {
    proptest::collection::vec(
        prop_oneof![
            (-2..10i32, -2..8i32, 0..4u32, 0..4u32)
                .prop_map(|(x, y, w, h)| GridOp::Place { x, y, w, h }),
            (0..16usize, -2..10i32, -2..8i32).prop_map(|(which, x, y)| GridOp::Move { which, x, y }),
            (0..16usize).prop_map(|which| GridOp::Remove { which }),
        ],
        1..=max_ops,
    )
}

// ===========================================================================
// Invariant check
// ===========================================================================

fn assert_consistent(grid: &PlacementGrid) {
    let mut expected: BTreeMap<GridPosition, Occupant> = BTreeMap::new();
    for (occupant, placement) in grid.occupants() {
        assert!(grid.fits(placement.origin, placement.footprint));
        for cell in placement.footprint.tiles(placement.origin) {
            assert!(
                expected.insert(cell, occupant).is_none(),
                "cell {cell:?} claimed twice"
            );
        }
    }
    assert_eq!(expected.len(), grid.occupied_cell_count());
    for (cell, occupant) in expected {
        assert_eq!(grid.occupant_at(cell), Some(occupant));
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn footprints_never_overlap(ops in arb_ops(40)) {
        let mut keys: SlotMap<BuildingId, ()> = SlotMap::with_key();
        let mut grid = PlacementGrid::new(W, H);
        let mut placed: Vec<Occupant> = Vec::new();

        for op in ops {
            match op {
                GridOp::Place { x, y, w, h } => {
                    let occupant = Occupant::Building(keys.insert(()));
                    let origin = GridPosition::new(x, y);
                    let footprint = Footprint::new(w, h);
                    let predicted = grid.can_place(origin, footprint);
                    let before = grid.occupied_cell_count();
                    let result = grid.place(occupant, origin, footprint);
                    prop_assert_eq!(result.is_ok(), predicted);
                    if result.is_ok() {
                        placed.push(occupant);
                    } else {
                        prop_assert_eq!(grid.occupied_cell_count(), before);
                    }
                }
                GridOp::Move { which, x, y } => {
                    if placed.is_empty() {
                        continue;
                    }
                    let occupant = placed[which % placed.len()];
                    let before = grid.placement_of(occupant);
                    if grid.move_to(occupant, GridPosition::new(x, y)).is_err() {
                        prop_assert_eq!(grid.placement_of(occupant), before);
                    }
                }
                GridOp::Remove { which } => {
                    if placed.is_empty() {
                        continue;
                    }
                    let occupant = placed.swap_remove(which % placed.len());
                    prop_assert!(grid.remove(occupant).is_some());
                }
            }
            assert_consistent(&grid);
        }
    }
}
