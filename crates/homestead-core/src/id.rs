use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed building for the lifetime of a farm session.
    pub struct BuildingId;
}

/// Identifies a resource type (coin, wheat, ...) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Identifies a crop definition in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CropTypeId(pub u32);

/// Identifies a building definition in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingTypeId(pub u32);

/// Identifies a plantable cell. The value is the cell's row-major index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

impl TileId {
    /// Row-major tile id for cell `(x, y)` on a grid `width` cells wide.
    pub fn from_cell(x: u32, y: u32, width: u32) -> Self {
        Self(y * width + x)
    }

    /// Inverse of [`TileId::from_cell`].
    pub fn to_cell(self, width: u32) -> (u32, u32) {
        (self.0 % width, self.0 / width)
    }
}

/// What occupies a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Occupant {
    Crop(TileId),
    Building(BuildingId),
}
