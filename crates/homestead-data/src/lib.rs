//! Data-driven farm content: resources, crops, buildings and the farm layout
//! loaded from RON, TOML or JSON files.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, FarmData, load_farm_data};
