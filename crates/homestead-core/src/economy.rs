use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::ResourceId;

/// Resource balances keyed by resource type. Resources that were never
/// credited read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    balances: BTreeMap<ResourceId, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_balances(balances: BTreeMap<ResourceId, u64>) -> Self {
        Self { balances }
    }

    /// Credit `amount` units. Saturates at `u64::MAX`.
    pub fn add(&mut self, resource: ResourceId, amount: u64) {
        let balance = self.balances.entry(resource).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Debit `amount` units. Returns false and leaves the balance untouched
    /// if there is not enough.
    #[must_use = "false means nothing was deducted"]
    pub fn use_resource(&mut self, resource: ResourceId, amount: u64) -> bool {
        if amount == 0 {
            return true;
        }
        match self.balances.get_mut(&resource) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        }
    }

    pub fn has(&self, resource: ResourceId, amount: u64) -> bool {
        self.amount(resource) >= amount
    }

    pub fn amount(&self, resource: ResourceId) -> u64 {
        self.balances.get(&resource).copied().unwrap_or(0)
    }

    /// Balances in resource id order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, u64)> + '_ {
        self.balances.iter().map(|(&r, &n)| (r, n))
    }

    pub fn balances(&self) -> &BTreeMap<ResourceId, u64> {
        &self.balances
    }

    pub fn is_empty(&self) -> bool {
        self.balances.values().all(|&n| n == 0)
    }
}
