//! Farm configuration: grid size, plantable cells, production defaults and
//! the starting inventory.

use std::collections::{BTreeMap, BTreeSet};

use homestead_core::catalog::Catalog;
use homestead_core::fixed::Fixed64;
use homestead_core::id::{ResourceId, TileId};
use homestead_core::production::{ProductionError, ProductionLedger, ResourceProduction};
use serde::{Deserialize, Serialize};

/// Default milliseconds between production steps.
pub const DEFAULT_PRODUCTION_INTERVAL_MS: u64 = 10_000;

/// Which cells accept crops.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Plantable {
    #[default]
    All,
    Cells(BTreeSet<(u32, u32)>),
}

/// Initial production for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionConfig {
    pub resource: ResourceId,
    pub rate_per_minute: Fixed64,
    pub max_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmConfig {
    pub width: u32,
    pub height: u32,
    pub plantable: Plantable,
    pub production_interval_ms: u64,
    pub starting_inventory: BTreeMap<ResourceId, u64>,
    pub productions: Vec<ProductionConfig>,
}

/// The stock farm: a 5x5 field, 100 coin and 10 wheat, wheat produced at
/// 1/min (cap 100) and corn at 0.5/min (cap 50). Resource ids assume the
/// catalog registers coin, wheat and corn in that order.
impl Default for FarmConfig {
    fn default() -> Self {
        let coin = ResourceId(0);
        let wheat = ResourceId(1);
        let corn = ResourceId(2);
        Self {
            width: 5,
            height: 5,
            plantable: Plantable::All,
            production_interval_ms: DEFAULT_PRODUCTION_INTERVAL_MS,
            starting_inventory: BTreeMap::from([(coin, 100), (wheat, 10)]),
            productions: vec![
                ProductionConfig {
                    resource: wheat,
                    rate_per_minute: Fixed64::ONE,
                    max_capacity: 100,
                },
                ProductionConfig {
                    resource: corn,
                    rate_per_minute: Fixed64::from_bits(1 << 31),
                    max_capacity: 50,
                },
            ],
        }
    }
}

impl FarmConfig {
    pub fn is_plantable(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        match &self.plantable {
            Plantable::All => true,
            Plantable::Cells(cells) => cells.contains(&(x, y)),
        }
    }

    /// Tile ids of every plantable cell, in row-major order.
    pub fn plantable_tiles(&self) -> Vec<TileId> {
        let mut tiles = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_plantable(x, y) {
                    tiles.push(TileId::from_cell(x, y, self.width));
                }
            }
        }
        tiles
    }

    /// Check the configuration against a catalog.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        // Cells are i32 positions and tile ids are row-major u32 indices.
        if self.width > i32::MAX as u32
            || self.height > i32::MAX as u32
            || self.width as u64 * self.height as u64 > u32::MAX as u64
        {
            return Err(ConfigError::GridTooLarge);
        }
        if self.production_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if let Plantable::Cells(cells) = &self.plantable
            && let Some(&(x, y)) = cells.iter().find(|&&(x, y)| x >= self.width || y >= self.height)
        {
            return Err(ConfigError::PlantableOutOfBounds { x, y });
        }
        let known = |r: &ResourceId| catalog.get_resource(*r).is_some();
        if let Some(r) = self.starting_inventory.keys().find(|r| !known(r)) {
            return Err(ConfigError::UnknownResource(*r));
        }
        if let Some(p) = self.productions.iter().find(|p| !known(&p.resource)) {
            return Err(ConfigError::UnknownResource(p.resource));
        }
        self.ledger().map(|_| ())
    }

    /// A ledger holding every configured production at zero.
    pub fn ledger(&self) -> Result<ProductionLedger, ConfigError> {
        let mut ledger = ProductionLedger::new();
        for p in &self.productions {
            ledger
                .track(ResourceProduction::new(p.resource, p.rate_per_minute, p.max_capacity))
                .map_err(|e| match e {
                    ProductionError::AlreadyTracked(r) | ProductionError::Untracked(r) => {
                        ConfigError::DuplicateProduction(r)
                    }
                })?;
        }
        Ok(ledger)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1")]
    EmptyGrid,
    #[error("grid is too large")]
    GridTooLarge,
    #[error("production interval must be positive")]
    ZeroInterval,
    #[error("plantable cell ({x}, {y}) is outside the grid")]
    PlantableOutOfBounds { x: u32, y: u32 },
    #[error("resource {0:?} is not in the catalog")]
    UnknownResource(ResourceId),
    #[error("resource {0:?} has more than one production")]
    DuplicateProduction(ResourceId),
}
