use std::collections::{BTreeMap, HashMap};

use crate::id::*;

/// A resource type definition (coin, wheat, corn, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDef {
    pub name: String,
}

/// A crop definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropDef {
    pub name: String,
    /// Minutes from planting to Ready. Zero means Ready on the first refresh.
    pub growth_time_minutes: u32,
    /// Currency deducted when planting.
    pub seed_cost: u32,
    /// Units of `resource` credited on harvest.
    pub harvest_yield: u32,
    pub resource: ResourceId,
}

/// A building definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingDef {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Currency deducted when the building is placed.
    pub cost: u32,
    /// Percent added to a resource's production rate while the building exists.
    pub production_boosts: BTreeMap<ResourceId, u32>,
}

/// Builder for constructing an immutable [`Catalog`].
/// Two-phase lifecycle: registration -> finalization.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    resources: Vec<ResourceDef>,
    resource_name_to_id: HashMap<String, ResourceId>,
    crops: Vec<CropDef>,
    crop_name_to_id: HashMap<String, CropTypeId>,
    buildings: Vec<BuildingDef>,
    building_name_to_id: HashMap<String, BuildingTypeId>,
    currency: Option<ResourceId>,
    duplicate: Option<String>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type. Returns its ID.
    pub fn register_resource(&mut self, name: &str) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(ResourceDef {
            name: name.to_string(),
        });
        if self.resource_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicate.get_or_insert_with(|| name.to_string());
        }
        id
    }

    /// Designate the resource that pays for seeds and buildings.
    pub fn set_currency(&mut self, id: ResourceId) {
        self.currency = Some(id);
    }

    /// Register a crop. Returns its ID.
    pub fn register_crop(&mut self, def: CropDef) -> CropTypeId {
        let id = CropTypeId(self.crops.len() as u32);
        if self.crop_name_to_id.insert(def.name.clone(), id).is_some() {
            self.duplicate.get_or_insert_with(|| def.name.clone());
        }
        self.crops.push(def);
        id
    }

    /// Register a building. Returns its ID.
    pub fn register_building(&mut self, def: BuildingDef) -> BuildingTypeId {
        let id = BuildingTypeId(self.buildings.len() as u32);
        if self.building_name_to_id.insert(def.name.clone(), id).is_some() {
            self.duplicate.get_or_insert_with(|| def.name.clone());
        }
        self.buildings.push(def);
        id
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some(name) = self.duplicate {
            return Err(CatalogError::DuplicateName(name));
        }
        let currency = self.currency.ok_or(CatalogError::MissingCurrency)?;
        let known = |id: ResourceId| (id.0 as usize) < self.resources.len();
        if !known(currency) {
            return Err(CatalogError::InvalidResourceRef(currency));
        }
        for crop in &self.crops {
            if !known(crop.resource) {
                return Err(CatalogError::InvalidResourceRef(crop.resource));
            }
        }
        for building in &self.buildings {
            if building.width == 0 || building.height == 0 {
                return Err(CatalogError::EmptyFootprint(building.name.clone()));
            }
            if let Some(&bad) = building.production_boosts.keys().find(|&&r| !known(r)) {
                return Err(CatalogError::InvalidResourceRef(bad));
            }
        }

        Ok(Catalog {
            resources: self.resources,
            resource_name_to_id: self.resource_name_to_id,
            crops: self.crops,
            crop_name_to_id: self.crop_name_to_id,
            buildings: self.buildings,
            building_name_to_id: self.building_name_to_id,
            currency,
        })
    }
}

/// Immutable catalog of resource, crop and building definitions. Frozen
/// after build(). Ids are assigned in registration order.
#[derive(Debug)]
pub struct Catalog {
    resources: Vec<ResourceDef>,
    resource_name_to_id: HashMap<String, ResourceId>,
    crops: Vec<CropDef>,
    crop_name_to_id: HashMap<String, CropTypeId>,
    buildings: Vec<BuildingDef>,
    building_name_to_id: HashMap<String, BuildingTypeId>,
    currency: ResourceId,
}

impl Catalog {
    pub fn get_resource(&self, id: ResourceId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn get_crop(&self, id: CropTypeId) -> Option<&CropDef> {
        self.crops.get(id.0 as usize)
    }

    pub fn get_building(&self, id: BuildingTypeId) -> Option<&BuildingDef> {
        self.buildings.get(id.0 as usize)
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_name_to_id.get(name).copied()
    }

    pub fn crop_id(&self, name: &str) -> Option<CropTypeId> {
        self.crop_name_to_id.get(name).copied()
    }

    pub fn building_id(&self, name: &str) -> Option<BuildingTypeId> {
        self.building_name_to_id.get(name).copied()
    }

    /// The resource seeds and buildings are paid in.
    pub fn currency(&self) -> ResourceId {
        self.currency
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn crop_count(&self) -> usize {
        self.crops.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn crops(&self) -> impl Iterator<Item = (CropTypeId, &CropDef)> {
        self.crops
            .iter()
            .enumerate()
            .map(|(i, def)| (CropTypeId(i as u32), def))
    }

    pub fn buildings(&self) -> impl Iterator<Item = (BuildingTypeId, &BuildingDef)> {
        self.buildings
            .iter()
            .enumerate()
            .map(|(i, def)| (BuildingTypeId(i as u32), def))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("no currency resource designated")]
    MissingCurrency,
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("invalid resource reference: {0:?}")]
    InvalidResourceRef(ResourceId),
    #[error("building {0} has a zero-area footprint")]
    EmptyFootprint(String),
}
