//! Resolution pipeline: reads data files, resolves names, builds the catalog
//! and the farm configuration.
//!
//! A data directory holds `resources`, `crops` and `buildings` files and an
//! optional `farm` file, each in RON, TOML or JSON (detected from the file
//! extension). Resources are registered first so crops and buildings can
//! refer to them by name.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use homestead_core::catalog::{BuildingDef, Catalog, CatalogBuilder, CatalogError, CropDef};
use homestead_core::fixed::Fixed64;
use homestead_core::id::ResourceId;
use homestead_farm::config::{ConfigError, FarmConfig, Plantable, ProductionConfig};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::schema::{BuildingData, CropData, FarmFileData, ResourceData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resources file must mark exactly one currency.
    #[error("{file} must mark exactly one resource as currency, found {found}")]
    Currency { file: PathBuf, found: usize },

    /// A numeric value cannot be represented.
    #[error("invalid value for {field} in {file}: {detail}")]
    InvalidValue {
        file: PathBuf,
        field: String,
        detail: String,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("farm configuration: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Record `name` as seen, returning a `DuplicateName` error if it already was.
pub fn claim_name(seen: &mut HashSet<String>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if seen.insert(name.to_string()) {
        Ok(())
    } else {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything loaded from a data directory.
#[derive(Debug)]
pub struct FarmData {
    pub catalog: Catalog,
    pub config: FarmConfig,
}

/// Load the catalog and farm configuration from `dir`.
///
/// `resources`, `crops` and `buildings` are required; a missing `farm` file
/// yields [`FarmConfig::default`].
pub fn load_farm_data(dir: &Path) -> Result<FarmData, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    // -- Resources --
    let resources_path = require_data_file(dir, "resources")?;
    let resources: Vec<ResourceData> = deserialize_list(&resources_path, "resources")?;
    let mut resource_ids: HashMap<String, ResourceId> = HashMap::new();
    let mut currencies = Vec::new();
    for data in &resources {
        check_duplicate(&resource_ids, &data.name, &resources_path)?;
        let id = builder.register_resource(&data.name);
        resource_ids.insert(data.name.clone(), id);
        if data.currency {
            currencies.push(id);
        }
    }
    match currencies.as_slice() {
        [currency] => builder.set_currency(*currency),
        other => {
            return Err(DataLoadError::Currency {
                file: resources_path,
                found: other.len(),
            });
        }
    }

    // -- Crops --
    let crops_path = require_data_file(dir, "crops")?;
    let crops: Vec<CropData> = deserialize_list(&crops_path, "crops")?;
    let mut crop_names = HashSet::new();
    for data in crops {
        claim_name(&mut crop_names, &data.name, &crops_path)?;
        let resource = *resolve_name(&resource_ids, &data.resource, &crops_path, "resource")?;
        builder.register_crop(CropDef {
            name: data.name,
            growth_time_minutes: data.growth_time_minutes,
            seed_cost: data.seed_cost,
            harvest_yield: data.harvest_yield,
            resource,
        });
    }

    // -- Buildings --
    let buildings_path = require_data_file(dir, "buildings")?;
    let buildings: Vec<BuildingData> = deserialize_list(&buildings_path, "buildings")?;
    let mut building_names = HashSet::new();
    for data in buildings {
        claim_name(&mut building_names, &data.name, &buildings_path)?;
        let mut production_boosts = BTreeMap::new();
        for (name, percent) in &data.boosts {
            let resource = *resolve_name(&resource_ids, name, &buildings_path, "resource")?;
            production_boosts.insert(resource, *percent);
        }
        builder.register_building(BuildingDef {
            name: data.name,
            width: data.footprint.width,
            height: data.footprint.height,
            cost: data.cost,
            production_boosts,
        });
    }

    let catalog = builder.build()?;

    // -- Farm --
    let config = match find_data_file(dir, "farm")? {
        Some(path) => {
            let data: FarmFileData = deserialize_file(&path)?;
            resolve_farm(data, &resource_ids, &path)?
        }
        None => {
            debug!(dir = %dir.display(), "no farm file, using the stock layout");
            FarmConfig::default()
        }
    };
    config.validate(&catalog)?;

    info!(
        dir = %dir.display(),
        resources = catalog.resource_count(),
        crops = catalog.crop_count(),
        buildings = catalog.building_count(),
        "farm data loaded"
    );
    Ok(FarmData { catalog, config })
}

fn resolve_farm(
    data: FarmFileData,
    resource_ids: &HashMap<String, ResourceId>,
    path: &Path,
) -> Result<FarmConfig, DataLoadError> {
    let plantable = match data.plantable {
        None => Plantable::All,
        Some(cells) => Plantable::Cells(cells.into_iter().collect::<BTreeSet<_>>()),
    };

    let mut starting_inventory = BTreeMap::new();
    for (name, amount) in &data.starting_inventory {
        let resource = *resolve_name(resource_ids, name, path, "resource")?;
        starting_inventory.insert(resource, *amount);
    }

    let mut productions = Vec::new();
    for p in &data.productions {
        let resource = *resolve_name(resource_ids, &p.resource, path, "resource")?;
        let rate_per_minute = Fixed64::checked_from_num(p.rate_per_minute).ok_or_else(|| {
            DataLoadError::InvalidValue {
                file: path.to_path_buf(),
                field: format!("{}.rate_per_minute", p.resource),
                detail: format!("{} is not representable", p.rate_per_minute),
            }
        })?;
        productions.push(ProductionConfig {
            resource,
            rate_per_minute,
            max_capacity: p.max_capacity,
        });
    }

    Ok(FarmConfig {
        width: data.width,
        height: data.height,
        plantable,
        production_interval_ms: data.production_interval_ms,
        starting_inventory,
        productions,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
