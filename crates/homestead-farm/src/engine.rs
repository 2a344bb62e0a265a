//! The farm simulation context.
//!
//! [`Farm`] owns the grid, the crop tiles, the placed buildings, the
//! inventory and the production ledger. Every operation validates first and
//! mutates second, so a rejected call leaves the farm exactly as it was.
//!
//! Time only moves when the host calls [`Farm::tick`] or
//! [`Farm::advance_to`]; the farm never reads the system clock itself.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use homestead_core::catalog::Catalog;
use homestead_core::economy::Inventory;
use homestead_core::fixed::Fixed64;
use homestead_core::growth::{CropState, CropTile, GrowthError, refresh_tiles};
use homestead_core::id::*;
use homestead_core::production::ProductionLedger;
use homestead_core::sim::{SimClock, StateHash, Timestamp};
use homestead_spatial::{Footprint, GridPosition, PlacementGrid, SpatialError};
use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::config::{ConfigError, FarmConfig};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A catalog entry referenced by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry {
    Crop(CropTypeId),
    Building(BuildingTypeId),
}

/// Why a farm action was rejected. The farm is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("cell ({x}, {y}) is occupied")]
    CellOccupied { x: i32, y: i32 },
    #[error("tile ({x}, {y}) already has a crop")]
    CellNotEmpty { x: i32, y: i32 },
    #[error("cell ({x}, {y}) does not accept crops")]
    NotPlantable { x: i32, y: i32 },
    #[error("need {required} of {resource:?}, have {available}")]
    InsufficientResources {
        resource: ResourceId,
        required: u64,
        available: u64,
    },
    #[error("unknown catalog entry {0:?}")]
    UnknownCatalogEntry(CatalogEntry),
    #[error("crop at ({x}, {y}) is not ready")]
    NotReady { x: i32, y: i32 },
    #[error("no building has its origin at ({x}, {y})")]
    UnknownOccupant { x: i32, y: i32 },
    #[error("no building placement in progress")]
    NoPlacementInProgress,
}

impl ActionError {
    fn from_spatial(err: SpatialError, at: GridPosition) -> Self {
        match err {
            SpatialError::OutOfBounds => ActionError::OutOfBounds { x: at.x, y: at.y },
            SpatialError::CellOccupied { pos, .. } => ActionError::CellOccupied { x: pos.x, y: pos.y },
            SpatialError::AlreadyPlaced => ActionError::CellOccupied { x: at.x, y: at.y },
            SpatialError::UnknownOccupant => ActionError::UnknownOccupant { x: at.x, y: at.y },
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A building on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedBuilding {
    pub id: BuildingId,
    pub building_type: BuildingTypeId,
    pub origin: GridPosition,
    pub footprint: Footprint,
}

/// Result of a successful harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestReport {
    pub crop: CropTypeId,
    pub resource: ResourceId,
    pub amount: u64,
}

/// What confirming the pending placement at a given origin would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPreview {
    pub building_type: BuildingTypeId,
    pub origin: GridPosition,
    pub footprint: Footprint,
    /// The footprint fits inside the grid on free cells.
    pub fits: bool,
    /// The inventory covers the building's cost.
    pub affordable: bool,
}

impl PlacementPreview {
    pub fn is_valid(&self) -> bool {
        self.fits && self.affordable
    }
}

/// Result of advancing time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Production steps run.
    pub steps_run: u64,
    /// Crop tiles whose stage changed.
    pub crops_changed: usize,
}

// ---------------------------------------------------------------------------
// Farm
// ---------------------------------------------------------------------------

pub struct Farm {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) config: FarmConfig,
    pub(crate) grid: PlacementGrid,
    /// One tile per plantable cell.
    pub(crate) tiles: BTreeMap<TileId, CropTile>,
    pub(crate) buildings: SlotMap<BuildingId, BuildingTypeId>,
    pub(crate) inventory: Inventory,
    pub(crate) ledger: ProductionLedger,
    pub(crate) clock: SimClock,
    pub(crate) pending_placement: Option<BuildingTypeId>,
}

impl Farm {
    /// A fresh farm: every plantable tile empty, no buildings, the starting
    /// inventory credited and every configured production at zero.
    pub fn new(catalog: Arc<Catalog>, config: FarmConfig, now: Timestamp) -> Result<Self, ConfigError> {
        config.validate(&catalog)?;
        let mut inventory = Inventory::new();
        for (&resource, &amount) in &config.starting_inventory {
            inventory.add(resource, amount);
        }
        let ledger = config.ledger()?;
        Ok(Self::assemble(catalog, config, inventory, ledger, SimClock::new(now)))
    }

    /// Wire up an empty grid and tile table around the given state.
    pub(crate) fn assemble(
        catalog: Arc<Catalog>,
        config: FarmConfig,
        inventory: Inventory,
        ledger: ProductionLedger,
        clock: SimClock,
    ) -> Self {
        let tiles = config
            .plantable_tiles()
            .into_iter()
            .map(|id| (id, CropTile::empty()))
            .collect();
        Self {
            grid: PlacementGrid::new(config.width, config.height),
            catalog,
            config,
            tiles,
            buildings: SlotMap::with_key(),
            inventory,
            ledger,
            clock,
            pending_placement: None,
        }
    }

    // -- Accessors --

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn grid(&self) -> &PlacementGrid {
        &self.grid
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn ledger(&self) -> &ProductionLedger {
        &self.ledger
    }

    /// The farm's current time.
    pub fn now(&self) -> Timestamp {
        self.clock.now
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn pending_placement(&self) -> Option<BuildingTypeId> {
        self.pending_placement
    }

    fn tile_id(&self, x: i32, y: i32) -> Result<TileId, ActionError> {
        if !self.grid.in_bounds(GridPosition::new(x, y)) {
            return Err(ActionError::OutOfBounds { x, y });
        }
        let id = TileId::from_cell(x as u32, y as u32, self.config.width);
        if !self.tiles.contains_key(&id) {
            return Err(ActionError::NotPlantable { x, y });
        }
        Ok(id)
    }

    /// The crop tile at `(x, y)`, if the cell is plantable.
    pub fn tile(&self, x: i32, y: i32) -> Option<&CropTile> {
        let id = self.tile_id(x, y).ok()?;
        self.tiles.get(&id)
    }

    /// Every crop tile with its cell coordinates, in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = ((u32, u32), &CropTile)> + '_ {
        let width = self.config.width;
        self.tiles.iter().map(move |(id, tile)| (id.to_cell(width), tile))
    }

    fn placed(&self, id: BuildingId, building_type: BuildingTypeId) -> Option<PlacedBuilding> {
        let placement = self.grid.placement_of(Occupant::Building(id))?;
        Some(PlacedBuilding {
            id,
            building_type,
            origin: placement.origin,
            footprint: placement.footprint,
        })
    }

    /// The building covering `(x, y)`.
    pub fn building_at(&self, x: i32, y: i32) -> Option<PlacedBuilding> {
        match self.grid.occupant_at(GridPosition::new(x, y))? {
            Occupant::Building(id) => self.placed(id, *self.buildings.get(id)?),
            Occupant::Crop(_) => None,
        }
    }

    pub fn building(&self, id: BuildingId) -> Option<PlacedBuilding> {
        self.placed(id, *self.buildings.get(id)?)
    }

    /// Every placed building, ordered by origin row then column.
    pub fn buildings(&self) -> Vec<PlacedBuilding> {
        let mut placed: Vec<_> = self
            .buildings
            .iter()
            .filter_map(|(id, &ty)| self.placed(id, ty))
            .collect();
        placed.sort_by_key(|b| (b.origin.y, b.origin.x));
        placed
    }

    /// Whether the inventory covers `cost` of the currency. Checked last, after
    /// every other precondition.
    fn check_funds(&self, cost: u32) -> Result<(), ActionError> {
        let currency = self.catalog.currency();
        let available = self.inventory.amount(currency);
        if available < cost as u64 {
            return Err(ActionError::InsufficientResources {
                resource: currency,
                required: cost as u64,
                available,
            });
        }
        Ok(())
    }

    fn pay(&mut self, cost: u32) {
        let paid = self.inventory.use_resource(self.catalog.currency(), cost as u64);
        debug_assert!(paid, "funds checked before paying");
    }

    // -- Crops --

    /// Plant `crop` on the tile at `(x, y)`, paying its seed cost.
    pub fn plant(&mut self, x: i32, y: i32, crop: CropTypeId) -> Result<(), ActionError> {
        self.try_plant(x, y, crop)
            .inspect_err(|e| warn!(x, y, ?crop, error = %e, "plant rejected"))
    }

    fn try_plant(&mut self, x: i32, y: i32, crop: CropTypeId) -> Result<(), ActionError> {
        let id = self.tile_id(x, y)?;
        if self.tiles.get(&id).is_some_and(|t| !t.is_empty()) {
            return Err(ActionError::CellNotEmpty { x, y });
        }
        let pos = GridPosition::new(x, y);
        if self.grid.is_occupied(pos) {
            return Err(ActionError::CellOccupied { x, y });
        }
        let seed_cost = self
            .catalog
            .get_crop(crop)
            .ok_or(ActionError::UnknownCatalogEntry(CatalogEntry::Crop(crop)))?
            .seed_cost;
        self.check_funds(seed_cost)?;

        self.grid
            .place(Occupant::Crop(id), pos, Footprint::single())
            .map_err(|e| ActionError::from_spatial(e, pos))?;
        self.pay(seed_cost);
        let now = self.clock.now;
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.plant(crop, now)
                .map_err(|_| ActionError::CellNotEmpty { x, y })?;
        }
        debug!(x, y, ?crop, seed_cost, "planted");
        Ok(())
    }

    /// Harvest the Ready crop at `(x, y)` into the inventory.
    pub fn harvest(&mut self, x: i32, y: i32) -> Result<HarvestReport, ActionError> {
        self.try_harvest(x, y)
            .inspect_err(|e| warn!(x, y, error = %e, "harvest rejected"))
    }

    fn try_harvest(&mut self, x: i32, y: i32) -> Result<HarvestReport, ActionError> {
        let id = self.tile_id(x, y)?;
        let tile = self
            .tiles
            .get(&id)
            .ok_or(ActionError::NotPlantable { x, y })?;
        if tile.state != CropState::Ready {
            return Err(ActionError::NotReady { x, y });
        }
        let crop = tile.crop.ok_or(ActionError::NotReady { x, y })?;
        let def = self
            .catalog
            .get_crop(crop)
            .ok_or(ActionError::UnknownCatalogEntry(CatalogEntry::Crop(crop)))?;
        let report = HarvestReport {
            crop,
            resource: def.resource,
            amount: def.harvest_yield as u64,
        };

        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.harvest().map_err(|e| match e {
                GrowthError::NotReady | GrowthError::NotEmpty => ActionError::NotReady { x, y },
            })?;
        }
        self.grid.remove(Occupant::Crop(id));
        self.inventory.add(report.resource, report.amount);
        debug!(x, y, ?crop, amount = report.amount, "harvested");
        Ok(report)
    }

    // -- Building placement --

    /// Choose the building type the next confirmed placement will create.
    /// Replaces any placement already in progress.
    pub fn start_placement(&mut self, building_type: BuildingTypeId) -> Result<(), ActionError> {
        if self.catalog.get_building(building_type).is_none() {
            let err = ActionError::UnknownCatalogEntry(CatalogEntry::Building(building_type));
            warn!(?building_type, error = %err, "placement not started");
            return Err(err);
        }
        self.pending_placement = Some(building_type);
        debug!(?building_type, "placement started");
        Ok(())
    }

    /// Drop the pending placement. Returns whether one was in progress.
    pub fn cancel_placement(&mut self) -> bool {
        let was_pending = self.pending_placement.take().is_some();
        if was_pending {
            debug!("placement cancelled");
        }
        was_pending
    }

    fn pending(&self) -> Result<(BuildingTypeId, Footprint, u32), ActionError> {
        let building_type = self
            .pending_placement
            .ok_or(ActionError::NoPlacementInProgress)?;
        let def = self
            .catalog
            .get_building(building_type)
            .ok_or(ActionError::UnknownCatalogEntry(CatalogEntry::Building(building_type)))?;
        Ok((building_type, Footprint::new(def.width, def.height), def.cost))
    }

    /// Evaluate the pending placement at origin `(x, y)` without changing
    /// anything.
    pub fn placement_preview(&self, x: i32, y: i32) -> Result<PlacementPreview, ActionError> {
        let (building_type, footprint, cost) = self.pending()?;
        let origin = GridPosition::new(x, y);
        Ok(PlacementPreview {
            building_type,
            origin,
            footprint,
            fits: self.grid.can_place(origin, footprint),
            affordable: self.check_funds(cost).is_ok(),
        })
    }

    /// Place the pending building with its origin at `(x, y)`, pay for it and
    /// apply its production boosts. On failure the placement stays pending.
    pub fn confirm_placement(&mut self, x: i32, y: i32) -> Result<BuildingId, ActionError> {
        self.try_confirm_placement(x, y)
            .inspect_err(|e| warn!(x, y, error = %e, "placement rejected"))
    }

    fn try_confirm_placement(&mut self, x: i32, y: i32) -> Result<BuildingId, ActionError> {
        let (building_type, footprint, cost) = self.pending()?;
        let origin = GridPosition::new(x, y);
        self.grid
            .validate(origin, footprint)
            .map_err(|e| ActionError::from_spatial(e, origin))?;
        self.check_funds(cost)?;

        let id = self.buildings.insert(building_type);
        if let Err(e) = self.grid.place(Occupant::Building(id), origin, footprint) {
            self.buildings.remove(id);
            return Err(ActionError::from_spatial(e, origin));
        }
        self.pay(cost);
        self.apply_boosts(building_type);
        self.pending_placement = None;
        debug!(x, y, ?building_type, cost, "building placed");
        Ok(id)
    }

    fn apply_boosts(&mut self, building_type: BuildingTypeId) {
        let Some(def) = self.catalog.get_building(building_type) else {
            return;
        };
        for (&resource, &percent) in &def.production_boosts {
            if let Err(e) = self.ledger.apply_boost(resource, percent) {
                warn!(?building_type, ?resource, error = %e, "boost skipped");
            }
        }
    }

    /// Move the building whose origin is `(from_x, from_y)` so its origin
    /// becomes `(to_x, to_y)`. Costs nothing and leaves production untouched.
    pub fn move_building(
        &mut self,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    ) -> Result<BuildingId, ActionError> {
        self.try_move_building(from_x, from_y, to_x, to_y)
            .inspect_err(|e| warn!(from_x, from_y, to_x, to_y, error = %e, "move rejected"))
    }

    fn try_move_building(
        &mut self,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    ) -> Result<BuildingId, ActionError> {
        let from = GridPosition::new(from_x, from_y);
        let id = self
            .building_at(from_x, from_y)
            .filter(|b| b.origin == from)
            .ok_or(ActionError::UnknownOccupant {
                x: from_x,
                y: from_y,
            })?
            .id;
        let to = GridPosition::new(to_x, to_y);
        self.grid
            .move_to(Occupant::Building(id), to)
            .map_err(|e| ActionError::from_spatial(e, to))?;
        debug!(from_x, from_y, to_x, to_y, "building moved");
        Ok(id)
    }

    // -- Production --

    /// Move every whole unit of production into the inventory.
    pub fn collect_resources(&mut self) -> Vec<(ResourceId, u64)> {
        let collected = self.ledger.collect(&mut self.inventory);
        debug!(?collected, "resources collected");
        collected
    }

    // -- Time --

    /// Advance the farm by `delta` of wall-clock time.
    pub fn tick(&mut self, delta: Duration) -> TickReport {
        let to = self.clock.now.saturating_add(delta);
        self.advance_to(to)
    }

    /// Advance the farm to `to`: run every whole production interval that
    /// elapsed, then refresh crop growth. Times earlier than now are ignored.
    pub fn advance_to(&mut self, to: Timestamp) -> TickReport {
        let interval_ms = self.config.production_interval_ms;
        let Some(advance) = self.clock.advance(to, interval_ms) else {
            warn!(
                now = self.clock.now.as_millis(),
                requested = to.as_millis(),
                "ignoring time that runs backwards"
            );
            return TickReport::default();
        };
        self.ledger.update_steps(advance.steps_run, interval_ms);
        let crops_changed = self.refresh_growth();
        TickReport {
            steps_run: advance.steps_run,
            crops_changed,
        }
    }

    pub(crate) fn refresh_growth(&mut self) -> usize {
        refresh_tiles(self.tiles.values_mut(), self.clock.now, &self.catalog)
    }

    // -- Hashing --

    /// Deterministic hash of everything a save captures. Independent of the
    /// internal building ids, so a reloaded farm hashes the same.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_u32(self.config.width);
        h.write_u32(self.config.height);
        for (id, tile) in &self.tiles {
            h.write_u32(id.0);
            h.write_u32(tile.crop.map_or(u32::MAX, |c| c.0));
            h.write_u32(tile.state as u32);
            h.write_fixed64(tile.progress);
            h.write_i64(tile.planted_at.map_or(i64::MIN, Timestamp::as_millis));
        }
        for b in self.buildings() {
            h.write_u32(b.building_type.0);
            h.write_u32(b.origin.x as u32);
            h.write_u32(b.origin.y as u32);
        }
        for p in self.ledger.productions() {
            h.write_u32(p.resource.0);
            h.write_fixed64(p.rate_per_minute);
            h.write_u32(p.max_capacity);
            h.write_fixed64(p.current_amount);
        }
        for (resource, amount) in self.inventory.iter() {
            h.write_u32(resource.0);
            h.write_u64(amount);
        }
        h.write_i64(self.clock.now.as_millis());
        h.write_u64(self.clock.accumulator_ms);
        h.finish()
    }

    /// Production rate for `resource`, or zero if it is not produced.
    pub fn production_rate(&self, resource: ResourceId) -> Fixed64 {
        self.ledger.production_rate(resource).unwrap_or(Fixed64::ZERO)
    }
}
