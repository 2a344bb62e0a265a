//! Snapshots, loading with offline catch-up, and save files.
//!
//! A [`FarmSnapshot`] captures everything needed to rebuild a farm: the grid
//! size, every crop tile, every building, the production ledger, the
//! inventory and the farm clock. The occupancy grid itself is not stored; it
//! is rebuilt on load by replaying placements.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use homestead_core::catalog::Catalog;
use homestead_core::economy::Inventory;
use homestead_core::fixed::Fixed64;
use homestead_core::growth::{CropState, CropTile};
use homestead_core::id::*;
use homestead_core::production::{ProductionError, ProductionLedger, ResourceProduction};
use homestead_core::sim::{SimClock, Timestamp};
use homestead_spatial::{Footprint, GridPosition, SpatialError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::codec::{self, DeserializeError, SerializeError};
use crate::config::{ConfigError, FarmConfig};
use crate::engine::Farm;
use crate::migration::MigrationRegistry;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One plantable tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRecord {
    pub x: u32,
    pub y: u32,
    pub crop: Option<CropTypeId>,
    pub state: CropState,
    pub progress: Fixed64,
    pub planted_at: Option<Timestamp>,
}

/// One placed building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub building_type: BuildingTypeId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub width: u32,
    pub height: u32,
    pub crops: Vec<CropRecord>,
    pub buildings: Vec<BuildingRecord>,
    pub productions: Vec<ResourceProduction>,
    pub inventory: BTreeMap<ResourceId, u64>,
    /// Farm time of the last advance.
    pub last_tick: Timestamp,
    /// Elapsed milliseconds not yet turned into a production step.
    pub production_accumulator_ms: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A snapshot that cannot describe a valid farm.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorruptSnapshot {
    #[error("unknown crop type {0:?}")]
    UnknownCrop(CropTypeId),
    #[error("unknown building type {0:?}")]
    UnknownBuilding(BuildingTypeId),
    #[error("building {building_type:?} stored as {width}x{height}, catalog disagrees")]
    FootprintMismatch {
        building_type: BuildingTypeId,
        width: u32,
        height: u32,
    },
    #[error("building at ({x}, {y}) cannot be placed: {source}")]
    BuildingPlacement {
        x: i32,
        y: i32,
        source: SpatialError,
    },
    #[error("crop record at ({x}, {y}) is not on a plantable cell")]
    CropOffField { x: u32, y: u32 },
    #[error("planted crop at ({x}, {y}) overlaps a building")]
    CropCovered { x: u32, y: u32 },
    #[error("crop record at ({x}, {y}) disagrees with its own state")]
    InconsistentTile { x: u32, y: u32 },
    #[error("clock remainder {accumulator_ms} ms is not below the {interval_ms} ms step")]
    ClockRemainder { accumulator_ms: u64, interval_ms: u64 },
    #[error("production ledger: {0}")]
    Production(#[from] ProductionError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("save is {found_width}x{found_height}, farm is configured as {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },
    #[error("corrupt save: {0}")]
    Corrupt(#[from] CorruptSnapshot),
    #[error("invalid farm configuration: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Save / load
// ---------------------------------------------------------------------------

impl Farm {
    /// Capture the farm. The pending placement is not part of a save.
    pub fn save(&self) -> FarmSnapshot {
        let width = self.config.width;
        let crops = self
            .tiles
            .iter()
            .map(|(id, tile)| {
                let (x, y) = id.to_cell(width);
                CropRecord {
                    x,
                    y,
                    crop: tile.crop,
                    state: tile.state,
                    progress: tile.progress,
                    planted_at: tile.planted_at,
                }
            })
            .collect();
        let buildings = self
            .buildings()
            .into_iter()
            .map(|b| BuildingRecord {
                building_type: b.building_type,
                x: b.origin.x,
                y: b.origin.y,
                width: b.footprint.width,
                height: b.footprint.height,
            })
            .collect();
        FarmSnapshot {
            width,
            height: self.config.height,
            crops,
            buildings,
            productions: self.ledger.productions().to_vec(),
            inventory: self.inventory.balances().clone(),
            last_tick: self.clock.now,
            production_accumulator_ms: self.clock.accumulator_ms,
        }
    }

    /// Rebuild a farm from `snapshot`, then catch up on the time between the
    /// save and `resume_at`.
    ///
    /// Buildings are re-placed without charging their cost or re-applying
    /// their boosts, since the stored production rates already include them.
    pub fn load(
        catalog: Arc<Catalog>,
        config: FarmConfig,
        snapshot: FarmSnapshot,
        resume_at: Timestamp,
    ) -> Result<Self, LoadError> {
        config.validate(&catalog)?;
        if snapshot.width != config.width || snapshot.height != config.height {
            return Err(LoadError::DimensionMismatch {
                width: config.width,
                height: config.height,
                found_width: snapshot.width,
                found_height: snapshot.height,
            });
        }

        if snapshot.production_accumulator_ms >= config.production_interval_ms {
            return Err(CorruptSnapshot::ClockRemainder {
                accumulator_ms: snapshot.production_accumulator_ms,
                interval_ms: config.production_interval_ms,
            }
            .into());
        }

        let ledger =
            ProductionLedger::from_productions(snapshot.productions).map_err(CorruptSnapshot::from)?;
        let inventory = Inventory::from_balances(snapshot.inventory);
        let clock = SimClock {
            now: snapshot.last_tick,
            accumulator_ms: snapshot.production_accumulator_ms,
        };
        let mut farm = Farm::assemble(catalog, config, inventory, ledger, clock);

        for record in &snapshot.buildings {
            farm.restore_building(record)?;
        }
        for record in snapshot.crops {
            farm.restore_crop(record)?;
        }

        let gap_ms = resume_at.millis_since(snapshot.last_tick);
        let report = if resume_at >= snapshot.last_tick {
            farm.advance_to(resume_at)
        } else {
            warn!(
                saved = snapshot.last_tick.as_millis(),
                resume = resume_at.as_millis(),
                "save is newer than resume time, skipping catch-up"
            );
            Default::default()
        };
        info!(
            gap_ms,
            steps = report.steps_run,
            buildings = snapshot.buildings.len(),
            "farm loaded"
        );
        Ok(farm)
    }

    fn restore_building(&mut self, record: &BuildingRecord) -> Result<(), CorruptSnapshot> {
        let def = self
            .catalog
            .get_building(record.building_type)
            .ok_or(CorruptSnapshot::UnknownBuilding(record.building_type))?;
        if def.width != record.width || def.height != record.height {
            return Err(CorruptSnapshot::FootprintMismatch {
                building_type: record.building_type,
                width: record.width,
                height: record.height,
            });
        }
        let id = self.buildings.insert(record.building_type);
        let origin = GridPosition::new(record.x, record.y);
        let footprint = Footprint::new(record.width, record.height);
        self.grid
            .place(Occupant::Building(id), origin, footprint)
            .map_err(|source| CorruptSnapshot::BuildingPlacement {
                x: record.x,
                y: record.y,
                source,
            })
    }

    fn restore_crop(&mut self, record: CropRecord) -> Result<(), CorruptSnapshot> {
        let (x, y) = (record.x, record.y);
        if !self.config.is_plantable(x, y) {
            return Err(CorruptSnapshot::CropOffField { x, y });
        }
        if let Some(crop) = record.crop
            && self.catalog.get_crop(crop).is_none()
        {
            return Err(CorruptSnapshot::UnknownCrop(crop));
        }
        let planted = record.state != CropState::Empty;
        if planted != record.crop.is_some() || planted != record.planted_at.is_some() {
            return Err(CorruptSnapshot::InconsistentTile { x, y });
        }
        let id = TileId::from_cell(x, y, self.config.width);
        if record.state != CropState::Empty {
            self.grid
                .place(
                    Occupant::Crop(id),
                    GridPosition::new(x as i32, y as i32),
                    Footprint::single(),
                )
                .map_err(|_| CorruptSnapshot::CropCovered { x, y })?;
        }
        self.tiles.insert(
            id,
            CropTile {
                crop: record.crop,
                state: record.state,
                progress: record.progress.clamp(Fixed64::ZERO, Fixed64::ONE),
                planted_at: record.planted_at,
            },
        );
        Ok(())
    }

    /// Load the saved farm if there is one and it fits this configuration,
    /// otherwise start a fresh farm at `now`. Unreadable or mismatched saves
    /// are logged and discarded; only an invalid configuration is an error.
    pub fn restore_or_new(
        catalog: Arc<Catalog>,
        config: FarmConfig,
        saved: Option<&[u8]>,
        now: Timestamp,
        migrations: &MigrationRegistry,
    ) -> Result<Self, ConfigError> {
        let Some(bytes) = saved else {
            info!("no save found, starting a new farm");
            return Farm::new(catalog, config, now);
        };
        let snapshot = match codec::decode_with_migrations(bytes, migrations) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "save unreadable, starting a new farm");
                return Farm::new(catalog, config, now);
            }
        };
        match Farm::load(Arc::clone(&catalog), config.clone(), snapshot, now) {
            Ok(farm) => Ok(farm),
            Err(LoadError::Config(e)) => Err(e),
            Err(e) => {
                warn!(error = %e, "save rejected, starting a new farm");
                Farm::new(catalog, config, now)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Save files
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SaveFileError {
    #[error("save file I/O: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}

/// Write `snapshot` to `path`, replacing any existing save atomically.
pub fn write_save(path: &Path, snapshot: &FarmSnapshot) -> Result<(), SaveFileError> {
    let bytes = codec::encode(snapshot)?;
    let tmp = temp_path(path);
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), bytes = bytes.len(), "farm saved");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read the save at `path`. A missing file is `Ok(None)`.
pub fn read_save(
    path: &Path,
    migrations: &MigrationRegistry,
) -> Result<Option<FarmSnapshot>, SaveFileError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(codec::decode_with_migrations(&bytes, migrations)?))
}

/// Delete the save at `path`. Returns whether a file was removed.
pub fn delete_save(path: &Path) -> Result<bool, SaveFileError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "save deleted");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
