//! Property tests over random farm sessions.

use std::sync::Arc;
use std::time::Duration;

use homestead_core::catalog::Catalog;
use homestead_core::economy::Inventory;
use homestead_core::fixed::Fixed64;
use homestead_core::growth::CropState;
use homestead_core::id::{BuildingTypeId, CropTypeId, Occupant, TileId};
use homestead_core::production::{ProductionLedger, ResourceProduction};
use homestead_core::test_utils::*;
use homestead_farm::codec;
use homestead_farm::config::FarmConfig;
use homestead_farm::Farm;
use homestead_spatial::GridPosition;
use proptest::prelude::*;

const SIDE: u32 = 6;

fn new_farm(catalog: &Arc<Catalog>) -> Farm {
    let config = FarmConfig {
        width: SIDE,
        height: SIDE,
        starting_inventory: [(coin(), 1_000)].into_iter().collect(),
        ..FarmConfig::default()
    };
    Farm::new(Arc::clone(catalog), config, ts_secs(0)).unwrap()
}

#[derive(Debug, Clone)]
enum Action {
    Plant(i32, i32, CropTypeId),
    Harvest(i32, i32),
    Build(i32, i32, BuildingTypeId),
    Move(i32, i32, i32, i32),
    Collect,
    Tick(u64),
}

fn cell() -> impl Strategy<Value = i32> {
    -1..=SIDE as i32
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (cell(), cell(), prop_oneof![Just(wheat()), Just(corn())])
            .prop_map(|(x, y, c)| Action::Plant(x, y, c)),
        2 => (cell(), cell()).prop_map(|(x, y)| Action::Harvest(x, y)),
        1 => (cell(), cell(), prop_oneof![Just(barn()), Just(silo()), Just(mill())])
            .prop_map(|(x, y, b)| Action::Build(x, y, b)),
        1 => (cell(), cell(), cell(), cell()).prop_map(|(a, b, c, d)| Action::Move(a, b, c, d)),
        1 => Just(Action::Collect),
        3 => (0u64..400_000).prop_map(Action::Tick),
    ]
}

fn apply(farm: &mut Farm, action: &Action) {
    // Rejections are part of the property; only the resulting state matters.
    match *action {
        Action::Plant(x, y, crop) => {
            let _ = farm.plant(x, y, crop);
        }
        Action::Harvest(x, y) => {
            let _ = farm.harvest(x, y);
        }
        Action::Build(x, y, building) => {
            if farm.start_placement(building).is_ok() {
                let _ = farm.confirm_placement(x, y);
                farm.cancel_placement();
            }
        }
        Action::Move(fx, fy, tx, ty) => {
            let _ = farm.move_building(fx, fy, tx, ty);
        }
        Action::Collect => {
            farm.collect_resources();
        }
        Action::Tick(ms) => {
            farm.tick(Duration::from_millis(ms));
        }
    }
}

/// Crops and buildings never share a cell, and every non-empty tile holds
/// its own cell in the grid.
fn assert_consistent(farm: &Farm) {
    let mut cells = 0u64;
    for ((x, y), tile) in farm.tiles() {
        let occupant = farm.grid().occupant_at(GridPosition::new(x as i32, y as i32));
        if tile.is_empty() {
            assert!(!matches!(occupant, Some(Occupant::Crop(_))));
        } else {
            assert_eq!(occupant, Some(Occupant::Crop(TileId::from_cell(x, y, SIDE))));
            assert!(tile.crop.is_some());
            cells += 1;
        }
        assert!(tile.progress >= Fixed64::ZERO && tile.progress <= Fixed64::ONE);
    }
    for b in farm.buildings() {
        for pos in b.footprint.tiles(b.origin) {
            assert!(farm.grid().in_bounds(pos));
            assert_eq!(farm.grid().occupant_at(pos), Some(Occupant::Building(b.id)));
        }
        cells += b.footprint.area();
    }
    assert_eq!(farm.grid().occupied_cell_count() as u64, cells);
    for p in farm.ledger().productions() {
        assert!(p.current_amount >= Fixed64::ZERO);
        assert!(p.current_amount <= Fixed64::from_num(p.max_capacity));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_sessions_stay_consistent(
        actions in proptest::collection::vec(action_strategy(), 1..60),
    ) {
        let catalog = Arc::new(standard_catalog());
        let mut farm = new_farm(&catalog);
        for action in &actions {
            apply(&mut farm, action);
            assert_consistent(&farm);
        }
    }

    #[test]
    fn save_load_preserves_state(
        actions in proptest::collection::vec(action_strategy(), 1..40),
    ) {
        let catalog = Arc::new(standard_catalog());
        let mut farm = new_farm(&catalog);
        for action in &actions {
            apply(&mut farm, action);
        }

        let snapshot = farm.save();
        let bytes = codec::encode(&snapshot).unwrap();
        prop_assert_eq!(&codec::decode(&bytes).unwrap(), &snapshot);

        let config = farm.config().clone();
        let restored = Farm::load(Arc::clone(&catalog), config, snapshot, farm.now()).unwrap();
        prop_assert_eq!(restored.state_hash(), farm.state_hash());
        prop_assert_eq!(restored.inventory(), farm.inventory());
        prop_assert_eq!(restored.buildings().len(), farm.buildings().len());
        assert_consistent(&restored);
    }

    #[test]
    fn offline_gap_matches_online_ticks(
        actions in proptest::collection::vec(action_strategy(), 0..30),
        ticks in proptest::collection::vec(0u64..900_000, 1..20),
    ) {
        let catalog = Arc::new(standard_catalog());
        let mut online = new_farm(&catalog);
        for action in &actions {
            apply(&mut online, action);
        }
        let snapshot = online.save();

        let gap: u64 = ticks.iter().sum();
        for &ms in &ticks {
            online.tick(Duration::from_millis(ms));
        }
        let resume_at = snapshot.last_tick.saturating_add_millis(gap);
        let offline =
            Farm::load(Arc::clone(&catalog), online.config().clone(), snapshot, resume_at).unwrap();

        prop_assert_eq!(offline.now(), online.now());
        prop_assert_eq!(offline.state_hash(), online.state_hash());
    }

    #[test]
    fn growth_never_regresses(
        crop in prop_oneof![Just(wheat()), Just(corn())],
        ticks in proptest::collection::vec(0u64..60_000, 1..40),
    ) {
        let catalog = Arc::new(standard_catalog());
        let mut farm = new_farm(&catalog);
        farm.plant(0, 0, crop).unwrap();
        let mut last_progress = Fixed64::ZERO;
        let mut last_state = CropState::Seeded;
        for ms in ticks {
            farm.tick(Duration::from_millis(ms));
            let tile = farm.tile(0, 0).unwrap();
            prop_assert!(tile.progress >= last_progress);
            prop_assert!(rank(tile.state) >= rank(last_state));
            prop_assert_eq!(tile.state == CropState::Ready, tile.progress == Fixed64::ONE);
            last_progress = tile.progress;
            last_state = tile.state;
        }
    }

    #[test]
    fn harvest_then_replant_cycles(cycles in 1usize..6, extra_ms in 0u64..120_000) {
        let catalog = Arc::new(standard_catalog());
        let mut farm = new_farm(&catalog);
        for n in 0..cycles {
            farm.plant(3, 3, wheat()).unwrap();
            prop_assert!(farm.harvest(3, 3).is_err());
            farm.tick(Duration::from_millis(120_000 + extra_ms));
            let report = farm.harvest(3, 3).unwrap();
            prop_assert_eq!(report.amount, 15);
            prop_assert!(farm.tile(3, 3).unwrap().is_empty());
            prop_assert!(!farm.grid().is_occupied(GridPosition::new(3, 3)));
            prop_assert_eq!(farm.inventory().amount(coin()), 1_000 - 5 * (n as u64 + 1));
            prop_assert_eq!(farm.inventory().amount(wheat_res()), 15 * (n as u64 + 1));
        }
    }

    #[test]
    fn ledger_accrual_stays_within_capacity(
        rate in 0u32..2_000,
        cap in 0u32..500,
        steps in proptest::collection::vec(0u64..600_000, 1..30),
    ) {
        let mut ledger = ProductionLedger::new();
        let rate = Fixed64::from_num(rate) / 16;
        ledger.track(ResourceProduction::new(wheat_res(), rate, cap)).unwrap();
        let mut inventory = Inventory::new();
        let mut collected = 0u64;
        for ms in steps {
            ledger.update_millis(ms);
            let amount = ledger.current_amount(wheat_res()).unwrap();
            prop_assert!(amount >= Fixed64::ZERO);
            prop_assert!(amount <= Fixed64::from_num(cap));
            for (_, n) in ledger.collect(&mut inventory) {
                prop_assert!(n <= cap as u64);
                collected += n;
            }
            prop_assert!(ledger.current_amount(wheat_res()).unwrap() < Fixed64::ONE);
        }
        prop_assert_eq!(inventory.amount(wheat_res()), collected);
    }
}

fn rank(state: CropState) -> u8 {
    match state {
        CropState::Empty => 0,
        CropState::Seeded => 1,
        CropState::Growing => 2,
        CropState::Ready => 3,
    }
}
