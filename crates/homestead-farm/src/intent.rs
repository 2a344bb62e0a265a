//! Intents: farm operations as data.
//!
//! A host that gathers input over a frame (UI, scripting, replays) can
//! queue [`Intent`]s and apply them in one batch with
//! [`Farm::apply_queued`]. Each intent maps one-to-one onto a [`Farm`]
//! method and is applied with the same validation.

use std::time::Duration;

use homestead_core::id::{BuildingId, BuildingTypeId, CropTypeId, ResourceId};
use homestead_core::sim::Timestamp;
use tracing::debug;

use crate::engine::{ActionError, Farm, HarvestReport, TickReport};

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Plant { x: i32, y: i32, crop: CropTypeId },
    Harvest { x: i32, y: i32 },
    StartPlacement { building_type: BuildingTypeId },
    ConfirmPlacement { x: i32, y: i32 },
    CancelPlacement,
    MoveBuilding {
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    },
    CollectResources,
    Tick { delta: Duration },
    AdvanceTo { at: Timestamp },
}

/// What a successfully applied intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Planted,
    Harvested(HarvestReport),
    PlacementStarted,
    BuildingPlaced(BuildingId),
    /// Whether a placement was in progress.
    PlacementCancelled(bool),
    BuildingMoved(BuildingId),
    Collected(Vec<(ResourceId, u64)>),
    Advanced(TickReport),
}

impl Farm {
    /// Apply a single intent.
    pub fn apply(&mut self, intent: Intent) -> Result<Outcome, ActionError> {
        match intent {
            Intent::Plant { x, y, crop } => self.plant(x, y, crop).map(|()| Outcome::Planted),
            Intent::Harvest { x, y } => self.harvest(x, y).map(Outcome::Harvested),
            Intent::StartPlacement { building_type } => self
                .start_placement(building_type)
                .map(|()| Outcome::PlacementStarted),
            Intent::ConfirmPlacement { x, y } => {
                self.confirm_placement(x, y).map(Outcome::BuildingPlaced)
            }
            Intent::CancelPlacement => Ok(Outcome::PlacementCancelled(self.cancel_placement())),
            Intent::MoveBuilding {
                from_x,
                from_y,
                to_x,
                to_y,
            } => self
                .move_building(from_x, from_y, to_x, to_y)
                .map(Outcome::BuildingMoved),
            Intent::CollectResources => Ok(Outcome::Collected(self.collect_resources())),
            Intent::Tick { delta } => Ok(Outcome::Advanced(self.tick(delta))),
            Intent::AdvanceTo { at } => Ok(Outcome::Advanced(self.advance_to(at))),
        }
    }

    /// Drain `queue` and apply every intent in submission order. One failed
    /// intent does not stop the rest.
    pub fn apply_queued(&mut self, queue: &mut IntentQueue) -> Vec<Result<Outcome, ActionError>> {
        let intents = queue.drain(self.now());
        debug!(count = intents.len(), "applying queued intents");
        intents.into_iter().map(|intent| self.apply(intent)).collect()
    }
}

// ---------------------------------------------------------------------------
// IntentQueue
// ---------------------------------------------------------------------------

/// A FIFO of intents waiting to be applied.
///
/// Supports optional history tracking for replay and debugging.
#[derive(Debug, Default)]
pub struct IntentQueue {
    pending: Vec<Intent>,
    /// Drained intents with the farm time they were applied at.
    history: Vec<(Timestamp, Intent)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl IntentQueue {
    /// An empty queue with no history tracking.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty queue that retains up to `max_history` applied intents.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push(&mut self, intent: Intent) {
        self.pending.push(intent);
    }

    pub fn push_batch(&mut self, intents: impl IntoIterator<Item = Intent>) {
        self.pending.extend(intents);
    }

    /// Take every pending intent in submission order, recording them in the
    /// history under `at`.
    pub fn drain(&mut self, at: Timestamp) -> Vec<Intent> {
        let intents: Vec<Intent> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history
                .extend(intents.iter().cloned().map(|intent| (at, intent)));
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        intents
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(Timestamp, Intent)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
