//! Serde data file structs for farm content definitions.
//!
//! These structs define the on-disk format for resources, crops, buildings
//! and the farm layout. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into catalog and config types by the loader.
//! Cross-references use names, never numeric ids.

use std::collections::BTreeMap;

use serde::Deserialize;

// ===========================================================================
// Resources
// ===========================================================================

/// A resource type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub name: String,
    /// Exactly one resource pays for seeds and buildings.
    #[serde(default)]
    pub currency: bool,
}

// ===========================================================================
// Crops
// ===========================================================================

/// A crop definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct CropData {
    pub name: String,
    pub growth_time_minutes: u32,
    #[serde(default)]
    pub seed_cost: u32,
    pub harvest_yield: u32,
    /// Name of the resource credited on harvest.
    pub resource: String,
}

// ===========================================================================
// Buildings
// ===========================================================================

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub name: String,
    #[serde(default = "default_footprint")]
    pub footprint: FootprintData,
    #[serde(default)]
    pub cost: u32,
    /// Resource name -> percent added to its production rate.
    #[serde(default)]
    pub boosts: BTreeMap<String, u32>,
}

/// The footprint (size) of a building on the grid.
#[derive(Debug, Clone, Deserialize)]
pub struct FootprintData {
    pub width: u32,
    pub height: u32,
}

fn default_footprint() -> FootprintData {
    FootprintData {
        width: 1,
        height: 1,
    }
}

// ===========================================================================
// Farm layout
// ===========================================================================

/// The optional farm file. Every field has a default matching the stock farm.
#[derive(Debug, Clone, Deserialize)]
pub struct FarmFileData {
    #[serde(default = "default_side")]
    pub width: u32,
    #[serde(default = "default_side")]
    pub height: u32,
    /// Plantable cells as `(x, y)` pairs. Absent means every cell.
    #[serde(default)]
    pub plantable: Option<Vec<(u32, u32)>>,
    #[serde(default = "default_interval")]
    pub production_interval_ms: u64,
    /// Resource name -> starting amount.
    #[serde(default)]
    pub starting_inventory: BTreeMap<String, u64>,
    #[serde(default)]
    pub productions: Vec<ProductionData>,
}

/// Initial production for one resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductionData {
    pub resource: String,
    pub rate_per_minute: f64,
    pub max_capacity: u32,
}

fn default_side() -> u32 {
    5
}

fn default_interval() -> u64 {
    homestead_farm::config::DEFAULT_PRODUCTION_INTERVAL_MS
}
