//! Homestead Farm -- the farm simulation context.
//!
//! Ties the catalog, the placement grid, crop growth, production and the
//! inventory together behind one [`Farm`](engine::Farm) value, and saves and
//! restores it across sessions.
//!
//! # Time
//!
//! The farm never reads the system clock. The host calls
//! [`Farm::tick`](engine::Farm::tick) with the elapsed time (or
//! [`Farm::advance_to`](engine::Farm::advance_to) with a timestamp); the farm
//! runs one production step per whole configured interval and carries the
//! remainder forward, then refreshes crop growth.
//!
//! # Offline time
//!
//! [`Farm::load`](engine::Farm::load) replays the saved farm and then
//! advances it to the resume time exactly as if it had been ticking all
//! along, so a farm that was closed for an hour ends up in the same state as
//! one that stayed open.
//!
//! # Key Types
//!
//! - [`engine::Farm`] -- Simulation context and every player action.
//! - [`intent::Intent`] / [`intent::IntentQueue`] -- Actions as data.
//! - [`config::FarmConfig`] -- Grid size, plantable cells, production setup.
//! - [`persist::FarmSnapshot`] -- Everything a save holds.
//! - [`codec`] -- Versioned binary saves via bitcode.

pub mod codec;
pub mod config;
pub mod engine;
pub mod intent;
pub mod migration;
pub mod persist;

pub use engine::{ActionError, Farm};
