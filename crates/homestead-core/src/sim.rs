//! Wall-clock time and the fixed-interval simulation clock.
//!
//! Farms advance on real elapsed time rather than a frame counter. The host
//! reports the current [`Timestamp`]; [`SimClock`] turns the elapsed time
//! into a whole number of fixed production steps and carries the remainder
//! forward, the same way delta mode works in a fixed-timestep game loop.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Milliseconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// The current system time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    /// `None` if the value lies outside chrono's representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// Milliseconds from `earlier` to `self`; zero if `earlier` is later.
    pub fn millis_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0).max(0) as u64
    }

    pub fn saturating_add_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms.min(i64::MAX as u64) as i64))
    }

    pub fn saturating_add(self, delta: Duration) -> Self {
        self.saturating_add_millis(delta.as_millis().min(u64::MAX as u128) as u64)
    }
}

// ---------------------------------------------------------------------------
// Simulation clock
// ---------------------------------------------------------------------------

/// Current time plus the sub-interval remainder not yet turned into a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    /// Time of the last advance.
    pub now: Timestamp,

    /// Milliseconds accumulated since the last whole step. Always less than
    /// the step interval after an advance.
    pub accumulator_ms: u64,
}

/// Result of a [`SimClock::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Number of whole fixed-interval steps that elapsed.
    pub steps_run: u64,

    /// Wall-clock milliseconds covered by this advance.
    pub elapsed_ms: u64,
}

impl SimClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            accumulator_ms: 0,
        }
    }

    /// Move the clock forward to `to`.
    ///
    /// Returns `None` and leaves the clock untouched if `to` is earlier than
    /// the current time. A zero `interval_ms` never produces steps.
    pub fn advance(&mut self, to: Timestamp, interval_ms: u64) -> Option<AdvanceResult> {
        if to < self.now {
            return None;
        }
        let elapsed_ms = to.millis_since(self.now);
        self.now = to;
        if interval_ms == 0 {
            return Some(AdvanceResult {
                steps_run: 0,
                elapsed_ms,
            });
        }
        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);
        let steps_run = self.accumulator_ms / interval_ms;
        self.accumulator_ms %= interval_ms;
        Some(AdvanceResult {
            steps_run,
            elapsed_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for comparing snapshots.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
