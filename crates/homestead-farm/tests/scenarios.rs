//! End-to-end farm scenarios driven through the public API.

use std::sync::Arc;
use std::time::Duration;

use homestead_core::fixed::Fixed64;
use homestead_core::growth::CropState;
use homestead_core::test_utils::*;
use homestead_farm::codec;
use homestead_farm::config::FarmConfig;
use homestead_farm::migration::MigrationRegistry;
use homestead_farm::persist::LoadError;
use homestead_farm::{ActionError, Farm};
use homestead_spatial::GridPosition;

fn farm_of(width: u32, height: u32) -> Farm {
    let config = FarmConfig {
        width,
        height,
        ..FarmConfig::default()
    };
    Farm::new(Arc::new(standard_catalog()), config, ts_secs(0)).unwrap()
}

// ===========================================================================
// Plant, grow, harvest
// ===========================================================================

#[test]
fn wheat_grows_in_two_minutes_and_harvests() {
    let mut farm = farm_of(5, 5);
    assert_eq!(farm.inventory().amount(coin()), 100);

    farm.plant(0, 0, wheat()).unwrap();
    assert_eq!(farm.inventory().amount(coin()), 95);
    let tile = farm.tile(0, 0).unwrap();
    assert_eq!(tile.state, CropState::Seeded);
    assert_eq!(tile.progress, Fixed64::ZERO);

    farm.tick(Duration::from_secs(121));
    let tile = farm.tile(0, 0).unwrap();
    assert_eq!(tile.state, CropState::Ready);
    assert_eq!(tile.progress, Fixed64::ONE);

    let wheat_before = farm.inventory().amount(wheat_res());
    farm.harvest(0, 0).unwrap();
    assert_eq!(farm.inventory().amount(wheat_res()), wheat_before + 15);
    let tile = farm.tile(0, 0).unwrap();
    assert_eq!(tile.state, CropState::Empty);
    assert_eq!(tile.crop, None);
    assert_eq!(tile.planted_at, None);
}

#[test]
fn growth_advances_in_small_ticks() {
    let mut farm = farm_of(5, 5);
    farm.plant(4, 4, corn()).unwrap();
    let mut last = Fixed64::ZERO;
    for _ in 0..60 {
        farm.tick(Duration::from_secs(5));
        let progress = farm.tile(4, 4).unwrap().progress;
        assert!(progress >= last);
        last = progress;
    }
    assert_eq!(farm.tile(4, 4).unwrap().state, CropState::Ready);
}

// ===========================================================================
// Building cost
// ===========================================================================

#[test]
fn barn_unaffordable_after_planting() {
    let mut farm = farm_of(10, 10);
    farm.plant(5, 5, wheat()).unwrap();
    assert_eq!(farm.inventory().amount(coin()), 95);

    farm.start_placement(barn()).unwrap();
    let result = farm.confirm_placement(1, 1);
    assert_eq!(
        result,
        Err(ActionError::InsufficientResources {
            resource: coin(),
            required: 100,
            available: 95
        })
    );
    assert_eq!(farm.inventory().amount(coin()), 95);
    assert_eq!(farm.grid().occupant_at(GridPosition::new(1, 1)), None);
    assert!(farm.building_at(1, 1).is_none());
}

// ===========================================================================
// Dimension mismatch
// ===========================================================================

#[test]
fn narrower_save_falls_back_to_fresh_farm() {
    let mut old = farm_of(8, 10);
    old.plant(0, 0, wheat()).unwrap();
    let snapshot = old.save();
    assert_eq!(snapshot.width, 8);

    let config = FarmConfig {
        width: 10,
        height: 10,
        ..FarmConfig::default()
    };
    let catalog = Arc::new(standard_catalog());
    let err = Farm::load(Arc::clone(&catalog), config.clone(), snapshot.clone(), ts_secs(60)).err();
    assert!(matches!(err, Some(LoadError::DimensionMismatch { found_width: 8, .. })));

    let bytes = codec::encode(&snapshot).unwrap();
    let farm = Farm::restore_or_new(
        catalog,
        config,
        Some(&bytes),
        ts_secs(60),
        &MigrationRegistry::new(),
    )
    .unwrap();
    assert_eq!(farm.config().width, 10);
    assert_eq!(farm.inventory().amount(coin()), 100);
    assert!(farm.tiles().all(|(_, t)| t.is_empty()));
    assert_eq!(farm.now(), ts_secs(60));
}
