//! Continuous per-resource production with rate and capacity.
//!
//! Each tracked resource accrues `rate_per_minute * elapsed_minutes` into a
//! fractional accumulator clamped to `[0, max_capacity]`. Collection moves
//! the whole units into an [`Inventory`] and keeps the fraction, so nothing
//! is lost to rounding between collections.

use serde::{Deserialize, Serialize};

use crate::economy::Inventory;
use crate::fixed::{Fixed64, minutes_from_millis, ratio};
use crate::id::ResourceId;

// ---------------------------------------------------------------------------
// Single resource
// ---------------------------------------------------------------------------

/// Production state for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProduction {
    pub resource: ResourceId,
    pub rate_per_minute: Fixed64,
    pub max_capacity: u32,
    /// Fractional units produced since the last collection.
    pub current_amount: Fixed64,
}

impl ResourceProduction {
    pub fn new(resource: ResourceId, rate_per_minute: Fixed64, max_capacity: u32) -> Self {
        Self {
            resource,
            rate_per_minute,
            max_capacity,
            current_amount: Fixed64::ZERO,
        }
    }

    fn capacity(&self) -> Fixed64 {
        Fixed64::saturating_from_num(self.max_capacity)
    }

    /// Accrue production for `elapsed_minutes`.
    pub fn update(&mut self, elapsed_minutes: Fixed64) {
        let produced = self.rate_per_minute.saturating_mul(elapsed_minutes);
        self.current_amount = self
            .current_amount
            .saturating_add(produced)
            .clamp(Fixed64::ZERO, self.capacity());
    }

    /// Accrue `steps` equal updates of `step_minutes` each in one pass.
    ///
    /// Matches calling [`update`](Self::update) `steps` times bit for bit:
    /// every step adds the same exact increment and the clamp is monotone.
    pub fn update_steps(&mut self, steps: u64, step_minutes: Fixed64) {
        if steps == 0 {
            return;
        }
        let per_step = self.rate_per_minute.saturating_mul(step_minutes);
        let steps = i64::try_from(steps).unwrap_or(i64::MAX);
        self.current_amount = self
            .current_amount
            .saturating_add(per_step.saturating_mul_int(steps))
            .clamp(Fixed64::ZERO, self.capacity());
    }

    /// Whole units available for collection.
    pub fn collectable(&self) -> u64 {
        self.current_amount.floor().to_num::<i64>().max(0) as u64
    }

    /// Remove the whole units and return how many were taken.
    fn take_whole(&mut self) -> u64 {
        let whole = self.collectable();
        self.current_amount -= Fixed64::saturating_from_num(whole);
        whole
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// All tracked productions, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionLedger {
    productions: Vec<ResourceProduction>,
}

impl ProductionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored productions, clamping amounts into range.
    pub fn from_productions(
        productions: Vec<ResourceProduction>,
    ) -> Result<Self, ProductionError> {
        let mut ledger = Self::new();
        for mut p in productions {
            p.current_amount = p.current_amount.clamp(Fixed64::ZERO, p.capacity());
            ledger.track(p)?;
        }
        Ok(ledger)
    }

    /// Start tracking a resource.
    pub fn track(&mut self, production: ResourceProduction) -> Result<(), ProductionError> {
        if self.get(production.resource).is_some() {
            return Err(ProductionError::AlreadyTracked(production.resource));
        }
        self.productions.push(production);
        Ok(())
    }

    pub fn get(&self, resource: ResourceId) -> Option<&ResourceProduction> {
        self.productions.iter().find(|p| p.resource == resource)
    }

    fn get_mut(&mut self, resource: ResourceId) -> Result<&mut ResourceProduction, ProductionError> {
        self.productions
            .iter_mut()
            .find(|p| p.resource == resource)
            .ok_or(ProductionError::Untracked(resource))
    }

    /// Accrue every production for `elapsed_minutes`.
    pub fn update(&mut self, elapsed_minutes: Fixed64) {
        for p in &mut self.productions {
            p.update(elapsed_minutes);
        }
    }

    /// Accrue every production for `elapsed_ms` milliseconds.
    pub fn update_millis(&mut self, elapsed_ms: u64) {
        self.update(minutes_from_millis(elapsed_ms));
    }

    /// Accrue `steps` fixed intervals of `step_ms` milliseconds at once.
    pub fn update_steps(&mut self, steps: u64, step_ms: u64) {
        let step_minutes = minutes_from_millis(step_ms);
        for p in &mut self.productions {
            p.update_steps(steps, step_minutes);
        }
    }

    /// Move the whole units of every production into `inventory`. Returns
    /// the non-zero amounts moved, in ledger order.
    pub fn collect(&mut self, inventory: &mut Inventory) -> Vec<(ResourceId, u64)> {
        let mut collected = Vec::new();
        for p in &mut self.productions {
            let whole = p.take_whole();
            if whole > 0 {
                inventory.add(p.resource, whole);
                collected.push((p.resource, whole));
            }
        }
        collected
    }

    pub fn set_production_rate(
        &mut self,
        resource: ResourceId,
        rate_per_minute: Fixed64,
    ) -> Result<(), ProductionError> {
        self.get_mut(resource)?.rate_per_minute = rate_per_minute;
        Ok(())
    }

    /// Change the capacity. An amount above the new capacity is clamped.
    pub fn set_max_capacity(
        &mut self,
        resource: ResourceId,
        max_capacity: u32,
    ) -> Result<(), ProductionError> {
        let p = self.get_mut(resource)?;
        p.max_capacity = max_capacity;
        p.current_amount = p.current_amount.min(p.capacity());
        Ok(())
    }

    /// Add `delta` units per minute to the rate.
    pub fn add_rate(&mut self, resource: ResourceId, delta: Fixed64) -> Result<(), ProductionError> {
        let p = self.get_mut(resource)?;
        p.rate_per_minute = p.rate_per_minute.saturating_add(delta);
        Ok(())
    }

    /// Add `percent / 100` units per minute to the rate.
    pub fn apply_boost(&mut self, resource: ResourceId, percent: u32) -> Result<(), ProductionError> {
        self.add_rate(resource, ratio(percent as u64, 100))
    }

    pub fn current_amount(&self, resource: ResourceId) -> Option<Fixed64> {
        self.get(resource).map(|p| p.current_amount)
    }

    pub fn production_rate(&self, resource: ResourceId) -> Option<Fixed64> {
        self.get(resource).map(|p| p.rate_per_minute)
    }

    pub fn max_capacity(&self, resource: ResourceId) -> Option<u32> {
        self.get(resource).map(|p| p.max_capacity)
    }

    pub fn productions(&self) -> &[ResourceProduction] {
        &self.productions
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProductionError {
    #[error("resource {0:?} has no production")]
    Untracked(ResourceId),
    #[error("resource {0:?} already has a production")]
    AlreadyTracked(ResourceId),
}
