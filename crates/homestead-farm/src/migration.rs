//! Save payload upgrades.
//!
//! Each registered step rewrites a snapshot payload from version `N` to
//! `N + 1`. [`crate::codec::decode_with_migrations`] chains the steps from a
//! save's version up to the current one.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("no migration path from version {from} to version {to}")]
    NoMigrationPath { from: u32, to: u32 },
    #[error("migration from version {from} to version {to} failed: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },
}

/// Rewrites a payload to the next version.
pub type MigrationFn = fn(&[u8]) -> Result<Vec<u8>, MigrationError>;

/// Upgrade steps keyed by the version they read.
#[derive(Debug, Default)]
pub struct MigrationRegistry {
    steps: BTreeMap<u32, MigrationFn>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the step that reads `from_version` payloads.
    pub fn register(&mut self, from_version: u32, step: MigrationFn) {
        self.steps.insert(from_version, step);
    }

    /// Upgrade `payload` from version `from` to version `to`.
    pub fn migrate(&self, payload: &[u8], from: u32, to: u32) -> Result<Vec<u8>, MigrationError> {
        if from > to {
            return Err(MigrationError::NoMigrationPath { from, to });
        }
        let mut current = payload.to_vec();
        for version in from..to {
            let step = self
                .steps
                .get(&version)
                .ok_or(MigrationError::NoMigrationPath { from, to })?;
            current = step(&current)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(byte: u8) -> impl Fn(&[u8]) -> Vec<u8> {
        move |payload| [payload, &[byte]].concat()
    }

    fn to_v1(payload: &[u8]) -> Result<Vec<u8>, MigrationError> {
        Ok(tag(1)(payload))
    }

    fn to_v2(payload: &[u8]) -> Result<Vec<u8>, MigrationError> {
        Ok(tag(2)(payload))
    }

    #[test]
    fn steps_run_in_version_order() {
        let mut registry = MigrationRegistry::new();
        registry.register(1, to_v2);
        registry.register(0, to_v1);
        assert_eq!(registry.migrate(&[9], 0, 2).unwrap(), vec![9, 1, 2]);
        assert_eq!(registry.migrate(&[9], 1, 2).unwrap(), vec![9, 2]);
        assert_eq!(registry.migrate(&[9], 2, 2).unwrap(), vec![9]);
    }

    #[test]
    fn gaps_and_downgrades_have_no_path() {
        let mut registry = MigrationRegistry::new();
        registry.register(1, to_v2);
        assert_eq!(
            registry.migrate(&[], 0, 2),
            Err(MigrationError::NoMigrationPath { from: 0, to: 2 })
        );
        assert_eq!(
            registry.migrate(&[], 2, 1),
            Err(MigrationError::NoMigrationPath { from: 2, to: 1 })
        );
    }
}
