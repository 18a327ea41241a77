//! Categorical mapping table
//!
//! Maps brand, model, fuel and transmission categories to the integer ids
//! the regressors were trained on. Every field carries an explicit
//! "unknown" id so that out-of-catalogue listings can still be encoded.

use crate::error::{Result, ValuationError};
use crate::predictor::{FEATURE_LAYOUT, FUEL_SLOTS, TRANSMISSION_SLOTS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const ARTIFACT_NAME: &str = "mappings.json";

/// Categorical field of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryField {
    Brand,
    Model,
    Fuel,
    Transmission,
}

impl CategoryField {
    pub const ALL: [CategoryField; 4] = [
        CategoryField::Brand,
        CategoryField::Model,
        CategoryField::Fuel,
        CategoryField::Transmission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryField::Brand => "brand",
            CategoryField::Model => "model",
            CategoryField::Fuel => "fuel",
            CategoryField::Transmission => "transmission",
        }
    }
}

impl fmt::Display for CategoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soft warning recorded when a category fell back to the unknown bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWarning {
    pub field: CategoryField,
    pub value: String,
}

/// Outcome of a single category lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLookup {
    pub id: u32,
    pub known: bool,
}

#[derive(Debug, Deserialize)]
struct UnknownIds {
    brand: u32,
    model: u32,
    fuel: u32,
    transmission: u32,
}

#[derive(Debug, Deserialize)]
struct MappingArtifact {
    version: String,
    layout: String,
    brands: HashMap<String, u32>,
    models: HashMap<String, u32>,
    fuels: HashMap<String, u32>,
    transmissions: HashMap<String, u32>,
    unknown: UnknownIds,
    #[serde(default)]
    brand_tiers: HashMap<String, u32>,
    #[serde(default)]
    unknown_tier: u32,
}

/// Lookup for one categorical field, with its reverse index
#[derive(Debug)]
struct CategoryIndex {
    ids: HashMap<String, u32>,
    names: HashMap<u32, String>,
    unknown: u32,
}

impl CategoryIndex {
    fn build(field: CategoryField, raw: HashMap<String, u32>, unknown: u32) -> Result<Self> {
        let mut ids = HashMap::with_capacity(raw.len());
        let mut names = HashMap::with_capacity(raw.len());

        for (name, id) in raw {
            let key = normalize(&name);
            if key.is_empty() {
                return Err(ValuationError::artifact(
                    ARTIFACT_NAME,
                    format!("{} table contains an empty category", field),
                ));
            }
            if id == unknown {
                return Err(ValuationError::artifact(
                    ARTIFACT_NAME,
                    format!("{} '{}' reuses the unknown id {}", field, key, unknown),
                ));
            }
            if let Some(existing) = names.insert(id, key.clone()) {
                return Err(ValuationError::artifact(
                    ARTIFACT_NAME,
                    format!("{} id {} is shared by '{}' and '{}'", field, id, existing, key),
                ));
            }
            if ids.insert(key.clone(), id).is_some() {
                return Err(ValuationError::artifact(
                    ARTIFACT_NAME,
                    format!("{} '{}' is listed twice", field, key),
                ));
            }
        }

        Ok(Self { ids, names, unknown })
    }

    fn lookup(&self, key: &str) -> CategoryLookup {
        match self.ids.get(key) {
            Some(&id) => CategoryLookup { id, known: true },
            None => CategoryLookup {
                id: self.unknown,
                known: false,
            },
        }
    }

    fn max_known_id(&self) -> Option<u32> {
        self.names.keys().copied().max()
    }
}

/// Read-only categorical lookup, loaded once per process
#[derive(Debug)]
pub struct MappingTable {
    version: String,
    layout: String,
    brands: CategoryIndex,
    models: CategoryIndex,
    fuels: CategoryIndex,
    transmissions: CategoryIndex,
    brand_tiers: HashMap<String, u32>,
    unknown_tier: u32,
}

impl MappingTable {
    /// Parse and check a mapping artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: MappingArtifact =
            serde_json::from_slice(bytes).map_err(|e| ValuationError::artifact(ARTIFACT_NAME, e))?;

        if artifact.layout != FEATURE_LAYOUT {
            return Err(ValuationError::artifact(
                ARTIFACT_NAME,
                format!(
                    "layout '{}' does not match feature layout '{}'",
                    artifact.layout, FEATURE_LAYOUT
                ),
            ));
        }

        let table = Self {
            version: artifact.version,
            layout: artifact.layout,
            brands: CategoryIndex::build(CategoryField::Brand, artifact.brands, artifact.unknown.brand)?,
            models: CategoryIndex::build(CategoryField::Model, artifact.models, artifact.unknown.model)?,
            fuels: CategoryIndex::build(CategoryField::Fuel, artifact.fuels, artifact.unknown.fuel)?,
            transmissions: CategoryIndex::build(
                CategoryField::Transmission,
                artifact.transmissions,
                artifact.unknown.transmission,
            )?,
            brand_tiers: artifact
                .brand_tiers
                .into_iter()
                .map(|(brand, tier)| (normalize(&brand), tier))
                .collect(),
            unknown_tier: artifact.unknown_tier,
        };

        // One-hot slots are indexed by id
        if table.fuels.max_known_id().is_some_and(|id| id as usize >= FUEL_SLOTS) {
            return Err(ValuationError::artifact(
                ARTIFACT_NAME,
                format!("fuel ids must be below {}", FUEL_SLOTS),
            ));
        }
        if table
            .transmissions
            .max_known_id()
            .is_some_and(|id| id as usize >= TRANSMISSION_SLOTS)
        {
            return Err(ValuationError::artifact(
                ARTIFACT_NAME,
                format!("transmission ids must be below {}", TRANSMISSION_SLOTS),
            ));
        }

        Ok(table)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    fn index(&self, field: CategoryField) -> &CategoryIndex {
        match field {
            CategoryField::Brand => &self.brands,
            CategoryField::Model => &self.models,
            CategoryField::Fuel => &self.fuels,
            CategoryField::Transmission => &self.transmissions,
        }
    }

    /// Look up a raw category, falling back to the field's unknown id
    pub fn lookup(&self, field: CategoryField, raw: &str) -> CategoryLookup {
        self.index(field).lookup(&normalize(raw))
    }

    /// Look up a model, accepting names with or without the brand prefix
    pub fn lookup_model(&self, brand: &str, model: &str) -> CategoryLookup {
        self.models.lookup(&model_key(brand, model))
    }

    pub fn unknown_id(&self, field: CategoryField) -> u32 {
        self.index(field).unknown
    }

    /// Prestige tier of a brand; unknown brands get the table's default tier
    pub fn brand_tier(&self, brand: &str) -> u32 {
        self.brand_tiers
            .get(&normalize(brand))
            .copied()
            .unwrap_or(self.unknown_tier)
    }

    /// Highest tier any brand (or the unknown bucket) can resolve to
    pub fn max_tier(&self) -> u32 {
        self.brand_tiers
            .values()
            .copied()
            .chain(std::iter::once(self.unknown_tier))
            .max()
            .unwrap_or(self.unknown_tier)
    }

    /// Reverse lookup of a known id
    pub fn category_name(&self, field: CategoryField, id: u32) -> Option<&str> {
        self.index(field).names.get(&id).map(String::as_str)
    }

    /// Reverse lookup of a (brand, model) id pair into the catalogue strings
    pub fn resolve_pair(&self, brand_id: u32, model_id: u32) -> Option<(&str, &str)> {
        let brand = self.category_name(CategoryField::Brand, brand_id)?;
        let full = self.category_name(CategoryField::Model, model_id)?;
        let model = full.strip_prefix(brand)?.strip_prefix(' ')?;
        Some((brand, model))
    }

    /// Known brands, sorted
    pub fn brands(&self) -> Vec<&str> {
        let mut brands: Vec<&str> = self.brands.ids.keys().map(String::as_str).collect();
        brands.sort_unstable();
        brands
    }

    /// Known models of a brand without the brand prefix, sorted
    pub fn models_for_brand(&self, brand: &str) -> Vec<&str> {
        let prefix = format!("{} ", normalize(brand));
        let mut models: Vec<&str> = self
            .models
            .ids
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .collect();
        models.sort_unstable();
        models
    }
}

/// Trim, lowercase and collapse inner whitespace
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Catalogue key for a model: `"<brand> <model>"`
pub fn model_key(brand: &str, model: &str) -> String {
    let brand = normalize(brand);
    let model = normalize(model);
    if model.starts_with(&format!("{} ", brand)) {
        model
    } else {
        format!("{} {}", brand, model)
    }
}
