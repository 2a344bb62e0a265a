//! Binary save format.
//!
//! A save is a bitcode-encoded envelope holding a [`SaveHeader`] and the
//! bitcode-encoded [`FarmSnapshot`] payload. The header is readable even when
//! the payload layout has changed, so an old payload can be run through the
//! [`MigrationRegistry`] before it is decoded.

use homestead_core::sim::Timestamp;
use serde::{Deserialize, Serialize};

use crate::migration::{MigrationError, MigrationRegistry};
use crate::persist::FarmSnapshot;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a farm save.
pub const SAVE_MAGIC: u32 = 0x4841_4D01;

/// Current payload version. Increment when the snapshot layout changes.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SAVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("save from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("migration failed: {0}")]
    Migration(#[from] MigrationError),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
    /// Farm time when the save was taken.
    pub saved_at: Timestamp,
}

impl SaveHeader {
    /// A header for the current format version.
    pub fn new(saved_at: Timestamp) -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: FORMAT_VERSION,
            saved_at,
        }
    }

    /// Validate the header. Returns `Ok(())` if the payload can be decoded
    /// as-is.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SAVE_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveEnvelope {
    header: SaveHeader,
    payload: Vec<u8>,
}

fn open_envelope(data: &[u8]) -> Result<SaveEnvelope, DeserializeError> {
    bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
}

fn decode_payload(payload: &[u8]) -> Result<FarmSnapshot, DeserializeError> {
    bitcode::deserialize(payload).map_err(|e| DeserializeError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Encode a snapshot at the current format version.
pub fn encode(snapshot: &FarmSnapshot) -> Result<Vec<u8>, SerializeError> {
    let payload =
        bitcode::serialize(snapshot).map_err(|e| SerializeError::Encode(e.to_string()))?;
    let envelope = SaveEnvelope {
        header: SaveHeader::new(snapshot.last_tick),
        payload,
    };
    bitcode::serialize(&envelope).map_err(|e| SerializeError::Encode(e.to_string()))
}

/// Read only the header of a save.
pub fn read_header(data: &[u8]) -> Result<SaveHeader, DeserializeError> {
    Ok(open_envelope(data)?.header)
}

/// Decode a save written at the current format version.
pub fn decode(data: &[u8]) -> Result<FarmSnapshot, DeserializeError> {
    let envelope = open_envelope(data)?;
    envelope.header.validate()?;
    decode_payload(&envelope.payload)
}

/// Decode a save, migrating an older payload up to the current version
/// first. Future versions are rejected.
pub fn decode_with_migrations(
    data: &[u8],
    migrations: &MigrationRegistry,
) -> Result<FarmSnapshot, DeserializeError> {
    let envelope = open_envelope(data)?;
    match envelope.header.validate() {
        Ok(()) => decode_payload(&envelope.payload),
        Err(DeserializeError::UnsupportedVersion(old)) => {
            let migrated = migrations.migrate(&envelope.payload, old, FORMAT_VERSION)?;
            decode_payload(&migrated)
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{CropRecord, FarmSnapshot};
    use homestead_core::growth::CropState;
    use homestead_core::id::ResourceId;
    use homestead_core::production::ResourceProduction;
    use homestead_core::test_utils::*;
    use std::collections::BTreeMap;

    fn sample_snapshot() -> FarmSnapshot {
        FarmSnapshot {
            width: 5,
            height: 5,
            crops: vec![CropRecord {
                x: 1,
                y: 2,
                crop: Some(wheat()),
                state: CropState::Growing,
                progress: fixed(0.5),
                planted_at: Some(ts_secs(10)),
            }],
            buildings: Vec::new(),
            productions: vec![ResourceProduction::new(wheat_res(), fixed(1.0), 100)],
            inventory: BTreeMap::from([(coin(), 95), (wheat_res(), 10)]),
            last_tick: ts_secs(70),
            production_accumulator_ms: 3_000,
        }
    }

    fn envelope(header: SaveHeader, payload: Vec<u8>) -> Vec<u8> {
        bitcode::serialize(&SaveEnvelope { header, payload }).unwrap()
    }

    #[test]
    fn encode_decode_preserves_snapshot() {
        let snapshot = sample_snapshot();
        let bytes = encode(&snapshot).unwrap();
        assert_eq!(decode(&bytes).unwrap(), snapshot);
        let header = read_header(&bytes).unwrap();
        assert_eq!(header.saved_at, ts_secs(70));
        assert_eq!(header.version, FORMAT_VERSION);
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            decode(&[0xDE, 0xAD, 0xBE, 0xEF]),
            Err(DeserializeError::Decode(_))
        ));
    }

    #[test]
    fn wrong_magic_rejected() {
        let header = SaveHeader {
            magic: 0x1234_5678,
            ..SaveHeader::new(ts_secs(0))
        };
        let bytes = envelope(header, Vec::new());
        assert!(matches!(
            decode(&bytes),
            Err(DeserializeError::InvalidMagic(0x1234_5678))
        ));
    }

    #[test]
    fn future_version_rejected_even_with_migrations() {
        let header = SaveHeader {
            version: FORMAT_VERSION + 1,
            ..SaveHeader::new(ts_secs(0))
        };
        let bytes = envelope(header, Vec::new());
        let migrations = MigrationRegistry::new();
        assert!(matches!(
            decode_with_migrations(&bytes, &migrations),
            Err(DeserializeError::FutureVersion(v)) if v == FORMAT_VERSION + 1
        ));
    }

    /// Version 0 payloads predate the stored production remainder.
    #[derive(Serialize, Deserialize)]
    struct SnapshotV0 {
        width: u32,
        height: u32,
        crops: Vec<CropRecord>,
        buildings: Vec<crate::persist::BuildingRecord>,
        productions: Vec<ResourceProduction>,
        inventory: BTreeMap<ResourceId, u64>,
        last_tick: Timestamp,
    }

    fn migrate_v0_to_v1(data: &[u8]) -> Result<Vec<u8>, MigrationError> {
        let failed = |reason: String| MigrationError::MigrationFailed {
            from: 0,
            to: 1,
            reason,
        };
        let old: SnapshotV0 = bitcode::deserialize(data).map_err(|e| failed(e.to_string()))?;
        let new = FarmSnapshot {
            width: old.width,
            height: old.height,
            crops: old.crops,
            buildings: old.buildings,
            productions: old.productions,
            inventory: old.inventory,
            last_tick: old.last_tick,
            production_accumulator_ms: 0,
        };
        bitcode::serialize(&new).map_err(|e| failed(e.to_string()))
    }

    #[test]
    fn old_version_is_migrated() {
        let current = sample_snapshot();
        let old = SnapshotV0 {
            width: current.width,
            height: current.height,
            crops: current.crops.clone(),
            buildings: Vec::new(),
            productions: current.productions.clone(),
            inventory: current.inventory.clone(),
            last_tick: current.last_tick,
        };
        let header = SaveHeader {
            version: 0,
            ..SaveHeader::new(current.last_tick)
        };
        let bytes = envelope(header, bitcode::serialize(&old).unwrap());

        assert!(matches!(
            decode(&bytes),
            Err(DeserializeError::UnsupportedVersion(0))
        ));
        assert!(matches!(
            decode_with_migrations(&bytes, &MigrationRegistry::new()),
            Err(DeserializeError::Migration(MigrationError::NoMigrationPath { from: 0, to: 1 }))
        ));

        let mut migrations = MigrationRegistry::new();
        migrations.register(0, migrate_v0_to_v1);
        let migrated = decode_with_migrations(&bytes, &migrations).unwrap();
        assert_eq!(migrated.production_accumulator_ms, 0);
        assert_eq!(migrated.crops, current.crops);
        assert_eq!(migrated.inventory, current.inventory);
    }
}
