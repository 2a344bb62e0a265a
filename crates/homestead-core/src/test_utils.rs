//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::BTreeMap;

use crate::catalog::*;
use crate::fixed::Fixed64;
use crate::id::*;
use crate::sim::Timestamp;

// ===========================================================================
// Fixed-point and time helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn ts_secs(secs: i64) -> Timestamp {
    Timestamp::from_millis(secs * 1_000)
}

// ===========================================================================
// Standard catalog ids (registration order of `standard_catalog`)
// ===========================================================================

pub fn coin() -> ResourceId {
    ResourceId(0)
}
pub fn wheat_res() -> ResourceId {
    ResourceId(1)
}
pub fn corn_res() -> ResourceId {
    ResourceId(2)
}

pub fn wheat() -> CropTypeId {
    CropTypeId(0)
}
pub fn corn() -> CropTypeId {
    CropTypeId(1)
}

pub fn barn() -> BuildingTypeId {
    BuildingTypeId(0)
}
pub fn silo() -> BuildingTypeId {
    BuildingTypeId(1)
}
pub fn mill() -> BuildingTypeId {
    BuildingTypeId(2)
}

// ===========================================================================
// Catalog builders
// ===========================================================================

/// Builder pre-loaded with the stock farm: coin/wheat/corn, two crops and
/// three buildings.
pub fn standard_catalog_builder() -> CatalogBuilder {
    let mut b = CatalogBuilder::new();
    let coin = b.register_resource("coin");
    let wheat = b.register_resource("wheat");
    let corn = b.register_resource("corn");
    b.set_currency(coin);

    b.register_crop(CropDef {
        name: "wheat".into(),
        growth_time_minutes: 2,
        seed_cost: 5,
        harvest_yield: 15,
        resource: wheat,
    });
    b.register_crop(CropDef {
        name: "corn".into(),
        growth_time_minutes: 5,
        seed_cost: 10,
        harvest_yield: 25,
        resource: corn,
    });

    b.register_building(BuildingDef {
        name: "barn".into(),
        width: 2,
        height: 2,
        cost: 100,
        production_boosts: BTreeMap::from([(wheat, 10)]),
    });
    b.register_building(BuildingDef {
        name: "silo".into(),
        width: 1,
        height: 2,
        cost: 75,
        production_boosts: BTreeMap::from([(corn, 5)]),
    });
    b.register_building(BuildingDef {
        name: "mill".into(),
        width: 2,
        height: 1,
        cost: 150,
        production_boosts: BTreeMap::from([(wheat, 5), (corn, 5)]),
    });
    b
}

pub fn standard_catalog() -> Catalog {
    match standard_catalog_builder().build() {
        Ok(catalog) => catalog,
        Err(e) => panic!("standard catalog is invalid: {e}"),
    }
}
