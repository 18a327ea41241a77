//! Feature encoding for the two regression stages
//!
//! Turns a validated listing into the fixed-order vector both models were
//! trained on. Encoding happens in two steps: categorical lookups and
//! derived features first ([`FeatureDraft`]), then the power figures once
//! they have been resolved.

use super::power::ResolvedPower;
use crate::error::{Result, ValuationError};
use crate::mapping::{CategoryField, CategoryWarning, MappingTable};
use crate::validation::ValidatedListing;
use std::ops::Range;

/// Layout tag shared by the mapping table and both model artifacts
pub const FEATURE_LAYOUT: &str = "eucar-v2";

/// Total number of encoded features
pub const FEATURE_COUNT: usize = 17;

/// Features consumed by the technical-specification model
pub const TECHNICAL_FEATURES: Range<usize> = 0..14;

/// Features consumed by the brand-influence model
pub const BRAND_FEATURES: Range<usize> = 14..17;

/// Number of fuel one-hot slots, indexed by fuel id
pub const FUEL_SLOTS: usize = 6;

/// Number of transmission one-hot slots, indexed by transmission id
pub const TRANSMISSION_SLOTS: usize = 2;

/// Positions inside the encoded vector
pub mod index {
    pub const AGE: usize = 0;
    pub const MILEAGE: usize = 1;
    pub const MILEAGE_DENSITY: usize = 2;
    pub const POWER_KW: usize = 3;
    pub const POWER_HP: usize = 4;
    pub const DISPLACEMENT_L: usize = 5;
    /// First transmission slot (automatic, manual)
    pub const TRANSMISSION: usize = 6;
    /// First fuel slot (cng, diesel, electric, hybrid, lpg, petrol)
    pub const FUEL: usize = 8;
    pub const BRAND_ID: usize = 14;
    pub const MODEL_ID: usize = 15;
    pub const BRAND_TIER: usize = 16;
}

/// Fixed-length feature vector in layout [`FEATURE_LAYOUT`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureVector {
    values: Vec<f64>,
}

impl EncodedFeatureVector {
    /// Wrap raw values, refusing anything but [`FEATURE_COUNT`] entries
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.len() != FEATURE_COUNT {
            return Err(ValuationError::FeatureLayout {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn technical(&self) -> &[f64] {
        &self.values[TECHNICAL_FEATURES]
    }

    pub fn brand(&self) -> &[f64] {
        &self.values[BRAND_FEATURES]
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.values[idx]
    }
}

/// Categorical and derived features, waiting for resolved power
#[derive(Debug, Clone)]
pub struct FeatureDraft {
    pub age_years: u32,
    pub mileage_km: f64,
    pub mileage_density: f64,
    pub displacement_l: f64,
    pub transmission_id: u32,
    pub fuel_id: u32,
    pub brand_id: u32,
    pub model_id: u32,
    pub brand_tier: u32,
    pub warnings: Vec<CategoryWarning>,
}

/// Encoded listing ready for inference
#[derive(Debug, Clone)]
pub struct EncodedListing {
    pub features: EncodedFeatureVector,
    pub age_years: u32,
    pub warnings: Vec<CategoryWarning>,
}

impl FeatureDraft {
    /// Fill in power and produce the final vector
    pub fn complete(self, power: &ResolvedPower) -> Result<EncodedListing> {
        let mut values = Vec::with_capacity(FEATURE_COUNT);
        values.push(self.age_years as f64);
        values.push(self.mileage_km);
        values.push(self.mileage_density);
        values.push(power.kw);
        values.push(power.hp);
        values.push(self.displacement_l);
        values.extend(one_hot(self.transmission_id, TRANSMISSION_SLOTS));
        values.extend(one_hot(self.fuel_id, FUEL_SLOTS));
        values.push(self.brand_id as f64);
        values.push(self.model_id as f64);
        values.push(self.brand_tier as f64);

        Ok(EncodedListing {
            features: EncodedFeatureVector::from_values(values)?,
            age_years: self.age_years,
            warnings: self.warnings,
        })
    }
}

/// Ids outside the slot range set no slot
fn one_hot(id: u32, slots: usize) -> impl Iterator<Item = f64> {
    (0..slots).map(move |slot| if slot == id as usize { 1.0 } else { 0.0 })
}

/// Encodes listings against a mapping table
pub struct FeatureEncoder<'a> {
    mapping: &'a MappingTable,
    reference_year: i32,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(mapping: &'a MappingTable, reference_year: i32) -> Self {
        Self {
            mapping,
            reference_year,
        }
    }

    /// Vehicle age in whole years, never negative
    pub fn age(&self, year: i32) -> u32 {
        (self.reference_year - year).max(0) as u32
    }

    /// Kilometres per year of age, treating brand-new cars as one year old
    pub fn mileage_density(&self, mileage_km: u32, age_years: u32) -> f64 {
        mileage_km as f64 / age_years.max(1) as f64
    }

    /// Resolve categories and derived features
    pub fn encode(&self, listing: &ValidatedListing) -> FeatureDraft {
        let raw = listing.listing();
        let mut warnings = Vec::new();
        let mut resolve = |field: CategoryField, value: &str, lookup: crate::mapping::CategoryLookup| {
            if !lookup.known {
                warnings.push(CategoryWarning {
                    field,
                    value: value.to_string(),
                });
            }
            lookup.id
        };

        let brand_id = resolve(
            CategoryField::Brand,
            &raw.brand,
            self.mapping.lookup(CategoryField::Brand, &raw.brand),
        );
        let model_id = resolve(
            CategoryField::Model,
            &raw.model,
            self.mapping.lookup_model(&raw.brand, &raw.model),
        );
        let fuel_id = resolve(
            CategoryField::Fuel,
            raw.fuel.as_str(),
            self.mapping.lookup(CategoryField::Fuel, raw.fuel.as_str()),
        );
        let transmission_id = resolve(
            CategoryField::Transmission,
            raw.transmission.as_str(),
            self.mapping
                .lookup(CategoryField::Transmission, raw.transmission.as_str()),
        );

        let age_years = self.age(raw.year);
        FeatureDraft {
            age_years,
            mileage_km: raw.mileage_km as f64,
            mileage_density: self.mileage_density(raw.mileage_km, age_years),
            displacement_l: raw.displacement_cc.map(|cc| cc as f64 / 1000.0).unwrap_or(0.0),
            transmission_id,
            fuel_id,
            brand_id,
            model_id,
            brand_tier: self.mapping.brand_tier(&raw.brand),
            warnings,
        }
    }
}
