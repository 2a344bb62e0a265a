//! Homestead Core -- the simulation building blocks of a grid farm.
//!
//! This crate holds everything that does not depend on the grid itself:
//! catalog definitions, the resource inventory, continuous production,
//! the crop growth state machine, and deterministic fixed-point and
//! wall-clock time types.
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable resource, crop and building
//!   definitions (frozen at startup).
//! - [`economy::Inventory`] -- Resource balances with add/use/has.
//! - [`production::ProductionLedger`] -- Per-resource accumulators with rate
//!   and capacity.
//! - [`growth::CropTile`] -- One plantable cell and its lifecycle.
//! - [`sim::SimClock`] -- Wall-clock time turned into fixed production steps.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

pub mod catalog;
pub mod economy;
pub mod fixed;
pub mod growth;
pub mod id;
pub mod production;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
