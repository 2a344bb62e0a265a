//! Per-tile crop lifecycle.
//!
//! `Empty -> Seeded -> Growing -> Ready -> (harvest) -> Empty`. Progress is
//! a pure function of the planting time, the current time and the crop's
//! growth time, so refreshing twice at the same instant changes nothing.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::fixed::{Fixed64, ratio};
use crate::id::CropTypeId;
use crate::sim::Timestamp;

const MILLIS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CropState {
    #[default]
    Empty,
    Seeded,
    Growing,
    Ready,
}

/// Fraction of the growth time that has passed, in `[0, 1]`.
pub fn growth_progress(planted_at: Timestamp, now: Timestamp, growth_time_minutes: u32) -> Fixed64 {
    let total_ms = growth_time_minutes as u64 * MILLIS_PER_MINUTE;
    let elapsed_ms = now.millis_since(planted_at);
    if elapsed_ms >= total_ms {
        return Fixed64::ONE;
    }
    ratio(elapsed_ms, total_ms)
}

/// Stage reached at a given progress. Below 0.33 a crop is still Seeded.
pub fn state_for_progress(progress: Fixed64) -> CropState {
    if progress >= Fixed64::ONE {
        CropState::Ready
    } else if progress < ratio(33, 100) {
        CropState::Seeded
    } else {
        CropState::Growing
    }
}

/// One plantable cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropTile {
    pub crop: Option<CropTypeId>,
    pub state: CropState,
    pub progress: Fixed64,
    pub planted_at: Option<Timestamp>,
}

impl CropTile {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.state == CropState::Empty
    }

    /// Seed the tile at `now`.
    pub fn plant(&mut self, crop: CropTypeId, now: Timestamp) -> Result<(), GrowthError> {
        if !self.is_empty() {
            return Err(GrowthError::NotEmpty);
        }
        self.crop = Some(crop);
        self.state = CropState::Seeded;
        self.progress = Fixed64::ZERO;
        self.planted_at = Some(now);
        Ok(())
    }

    /// Recompute progress and stage at `now`. Only Seeded and Growing tiles
    /// move; progress never goes backwards. Returns true if the stage changed.
    pub fn refresh(&mut self, now: Timestamp, growth_time_minutes: u32) -> bool {
        if !matches!(self.state, CropState::Seeded | CropState::Growing) {
            return false;
        }
        let Some(planted_at) = self.planted_at else {
            return false;
        };
        self.progress = self
            .progress
            .max(growth_progress(planted_at, now, growth_time_minutes));
        let next = state_for_progress(self.progress);
        let changed = next != self.state;
        self.state = next;
        changed
    }

    /// Take the crop of a Ready tile and reset it to Empty.
    pub fn harvest(&mut self) -> Result<CropTypeId, GrowthError> {
        match (self.state, self.crop) {
            (CropState::Ready, Some(crop)) => {
                self.reset();
                Ok(crop)
            }
            _ => Err(GrowthError::NotReady),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::empty();
    }
}

/// Refresh every tile against the catalog. Tiles whose crop is not in the
/// catalog are left alone. Returns the number of tiles that changed stage.
pub fn refresh_tiles<'a>(
    tiles: impl IntoIterator<Item = &'a mut CropTile>,
    now: Timestamp,
    catalog: &Catalog,
) -> usize {
    let mut changed = 0;
    for tile in tiles {
        let Some(def) = tile.crop.and_then(|c| catalog.get_crop(c)) else {
            continue;
        };
        if tile.refresh(now, def.growth_time_minutes) {
            changed += 1;
        }
    }
    changed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GrowthError {
    #[error("tile is not empty")]
    NotEmpty,
    #[error("crop is not ready")]
    NotReady,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn progress_is_elapsed_over_total() {
        let t0 = ts_secs(0);
        assert_eq!(growth_progress(t0, ts_secs(30), 2), fixed(0.25));
        assert_eq!(growth_progress(t0, ts_secs(60), 2), fixed(0.5));
        assert_eq!(growth_progress(t0, ts_secs(120), 2), Fixed64::ONE);
        assert_eq!(growth_progress(t0, ts_secs(9_000), 2), Fixed64::ONE);
    }

    #[test]
    fn zero_growth_time_is_immediately_complete() {
        assert_eq!(growth_progress(ts_secs(5), ts_secs(5), 0), Fixed64::ONE);
    }

    #[test]
    fn stage_thresholds() {
        assert_eq!(state_for_progress(Fixed64::ZERO), CropState::Seeded);
        assert_eq!(state_for_progress(fixed(0.32)), CropState::Seeded);
        assert_eq!(state_for_progress(fixed(0.5)), CropState::Growing);
        assert_eq!(state_for_progress(fixed(0.999)), CropState::Growing);
        assert_eq!(state_for_progress(Fixed64::ONE), CropState::Ready);
    }

    #[test]
    fn plant_sets_seeded() {
        let mut tile = CropTile::empty();
        tile.plant(wheat(), ts_secs(10)).unwrap();
        assert_eq!(tile.state, CropState::Seeded);
        assert_eq!(tile.crop, Some(wheat()));
        assert_eq!(tile.progress, Fixed64::ZERO);
        assert_eq!(tile.planted_at, Some(ts_secs(10)));
    }

    #[test]
    fn plant_on_occupied_tile_fails_unchanged() {
        let mut tile = CropTile::empty();
        tile.plant(wheat(), ts_secs(0)).unwrap();
        let before = tile.clone();
        assert_eq!(tile.plant(corn(), ts_secs(1)), Err(GrowthError::NotEmpty));
        assert_eq!(tile, before);
    }

    #[test]
    fn refresh_walks_through_stages() {
        let mut tile = CropTile::empty();
        tile.plant(wheat(), ts_secs(0)).unwrap();
        assert!(!tile.refresh(ts_secs(30), 2));
        assert_eq!(tile.state, CropState::Seeded);
        assert!(tile.refresh(ts_secs(60), 2));
        assert_eq!(tile.state, CropState::Growing);
        assert!(tile.refresh(ts_secs(120), 2));
        assert_eq!(tile.state, CropState::Ready);
        assert_eq!(tile.progress, Fixed64::ONE);
    }

    #[test]
    fn refresh_is_idempotent_and_monotonic() {
        let mut tile = CropTile::empty();
        tile.plant(corn(), ts_secs(0)).unwrap();
        tile.refresh(ts_secs(150), 5);
        let snapshot = tile.clone();
        tile.refresh(ts_secs(150), 5);
        assert_eq!(tile, snapshot);
        tile.refresh(ts_secs(10), 5);
        assert_eq!(tile, snapshot);
    }

    #[test]
    fn refresh_leaves_empty_and_ready_alone() {
        let mut tile = CropTile::empty();
        assert!(!tile.refresh(ts_secs(1_000), 1));
        assert_eq!(tile, CropTile::empty());
    }

    #[test]
    fn harvest_requires_ready() {
        let mut tile = CropTile::empty();
        assert_eq!(tile.harvest(), Err(GrowthError::NotReady));
        tile.plant(wheat(), ts_secs(0)).unwrap();
        tile.refresh(ts_secs(90), 2);
        assert_eq!(tile.harvest(), Err(GrowthError::NotReady));
        tile.refresh(ts_secs(120), 2);
        assert_eq!(tile.harvest(), Ok(wheat()));
        assert_eq!(tile, CropTile::empty());
    }

    #[test]
    fn refresh_tiles_uses_catalog_growth_time() {
        let catalog = standard_catalog();
        let mut tiles = vec![CropTile::empty(), CropTile::empty(), CropTile::empty()];
        tiles[0].plant(wheat(), ts_secs(0)).unwrap();
        tiles[1].plant(corn(), ts_secs(0)).unwrap();
        let changed = refresh_tiles(tiles.iter_mut(), ts_secs(120), &catalog);
        assert_eq!(changed, 2);
        assert_eq!(tiles[0].state, CropState::Ready);
        assert_eq!(tiles[1].state, CropState::Growing);
        assert_eq!(tiles[2].state, CropState::Empty);
    }
}
