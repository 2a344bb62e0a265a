//! Bounded placement grid shared by crop tiles and buildings.
//!
//! A [`PlacementGrid`] is a fixed `width x height` rectangle of cells. Every
//! cell is empty or covered by exactly one [`Occupant`]; crops take a single
//! cell and buildings take a rectangular [`Footprint`]. All mutations are
//! validated up front so a failed call never leaves a partial footprint.

use std::collections::BTreeMap;

use homestead_core::id::Occupant;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A cell position on the grid. `(0, 0)` is the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The size of an occupant on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A 1x1 footprint.
    pub fn single() -> Self {
        Self::new(1, 1)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Iterate over all cells covered by this footprint at the given origin,
    /// row by row. Origin is the top-left corner.
    pub fn tiles(&self, origin: GridPosition) -> impl Iterator<Item = GridPosition> {
        let w = self.width as i32;
        let h = self.height as i32;
        let ox = origin.x;
        let oy = origin.y;
        (0..h).flat_map(move |dy| (0..w).map(move |dx| GridPosition::new(ox + dx, oy + dy)))
    }
}

/// Where an occupant sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub origin: GridPosition,
    pub footprint: Footprint,
}

/// Errors from placement operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    #[error("footprint does not fit inside the grid")]
    OutOfBounds,
    #[error("cell {pos:?} is occupied by {by:?}")]
    CellOccupied { pos: GridPosition, by: Occupant },
    #[error("occupant is already placed on the grid")]
    AlreadyPlaced,
    #[error("occupant is not placed on the grid")]
    UnknownOccupant,
}

// ---------------------------------------------------------------------------
// PlacementGrid
// ---------------------------------------------------------------------------

/// Cell allocator over a fixed rectangle.
///
/// Maintains a bidirectional mapping:
/// - `cells`: position -> occupant covering it
/// - `placements`: occupant -> origin and footprint
#[derive(Debug, Clone)]
pub struct PlacementGrid {
    width: u32,
    height: u32,
    cells: BTreeMap<GridPosition, Occupant>,
    placements: BTreeMap<Occupant, Placement>,
}

impl PlacementGrid {
    /// An empty grid. Dimensions are capped at `i32::MAX`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.min(i32::MAX as u32),
            height: height.min(i32::MAX as u32),
            cells: BTreeMap::new(),
            placements: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// True iff a non-empty footprint at `origin` lies fully inside the grid.
    pub fn fits(&self, origin: GridPosition, footprint: Footprint) -> bool {
        if footprint.width == 0 || footprint.height == 0 || origin.x < 0 || origin.y < 0 {
            return false;
        }
        origin.x as u64 + footprint.width as u64 <= self.width as u64
            && origin.y as u64 + footprint.height as u64 <= self.height as u64
    }

    // -- Validation --

    /// Bounds first, then occupancy. Cells held by `ignoring` count as free.
    fn check(
        &self,
        origin: GridPosition,
        footprint: Footprint,
        ignoring: Option<Occupant>,
    ) -> Result<(), SpatialError> {
        if !self.fits(origin, footprint) {
            return Err(SpatialError::OutOfBounds);
        }
        for pos in footprint.tiles(origin) {
            if let Some(&by) = self.cells.get(&pos)
                && Some(by) != ignoring
            {
                return Err(SpatialError::CellOccupied { pos, by });
            }
        }
        Ok(())
    }

    /// Check if a footprint could be placed at `origin` right now.
    pub fn can_place(&self, origin: GridPosition, footprint: Footprint) -> bool {
        self.check(origin, footprint, None).is_ok()
    }

    /// Why a footprint could not be placed at `origin`, if it could not.
    pub fn validate(&self, origin: GridPosition, footprint: Footprint) -> Result<(), SpatialError> {
        self.check(origin, footprint, None)
    }

    // -- Mutation --

    /// Cover every cell of the footprint with `occupant`.
    pub fn place(
        &mut self,
        occupant: Occupant,
        origin: GridPosition,
        footprint: Footprint,
    ) -> Result<(), SpatialError> {
        if self.placements.contains_key(&occupant) {
            return Err(SpatialError::AlreadyPlaced);
        }
        self.check(origin, footprint, None)?;
        self.occupy(occupant, Placement { origin, footprint });
        Ok(())
    }

    fn occupy(&mut self, occupant: Occupant, placement: Placement) {
        for pos in placement.footprint.tiles(placement.origin) {
            self.cells.insert(pos, occupant);
        }
        self.placements.insert(occupant, placement);
    }

    /// Clear every cell of `occupant`. Unknown occupants are ignored.
    pub fn remove(&mut self, occupant: Occupant) -> Option<Placement> {
        let placement = self.placements.remove(&occupant)?;
        for pos in placement.footprint.tiles(placement.origin) {
            self.cells.remove(&pos);
        }
        Some(placement)
    }

    /// Relocate `occupant` so its origin is `to`. The occupant's own cells
    /// count as free; on failure it stays where it was.
    pub fn move_to(&mut self, occupant: Occupant, to: GridPosition) -> Result<(), SpatialError> {
        let placement = *self
            .placements
            .get(&occupant)
            .ok_or(SpatialError::UnknownOccupant)?;
        self.check(to, placement.footprint, Some(occupant))?;
        self.remove(occupant);
        self.occupy(
            occupant,
            Placement {
                origin: to,
                footprint: placement.footprint,
            },
        );
        Ok(())
    }

    // -- Queries --

    pub fn occupant_at(&self, pos: GridPosition) -> Option<Occupant> {
        self.cells.get(&pos).copied()
    }

    pub fn is_occupied(&self, pos: GridPosition) -> bool {
        self.cells.contains_key(&pos)
    }

    pub fn placement_of(&self, occupant: Occupant) -> Option<Placement> {
        self.placements.get(&occupant).copied()
    }

    pub fn position_of(&self, occupant: Occupant) -> Option<GridPosition> {
        self.placements.get(&occupant).map(|p| p.origin)
    }

    pub fn footprint_of(&self, occupant: Occupant) -> Option<Footprint> {
        self.placements.get(&occupant).map(|p| p.footprint)
    }

    /// Every placed occupant in id order.
    pub fn occupants(&self) -> impl Iterator<Item = (Occupant, Placement)> + '_ {
        self.placements.iter().map(|(&o, &p)| (o, p))
    }

    pub fn occupant_count(&self) -> usize {
        self.placements.len()
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.cells.len()
    }
}
