//! Core data models for the valuation pipeline

use crate::mapping::CategoryWarning;
use crate::predictor::ResolvedPower;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fuel type of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
    Cng,
    Lpg,
    Other,
}

impl FuelType {
    /// Category key as stored in the mapping table
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Hybrid => "hybrid",
            FuelType::Electric => "electric",
            FuelType::Cng => "cng",
            FuelType::Lpg => "lpg",
            FuelType::Other => "other",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "petrol" | "gasoline" => Ok(FuelType::Petrol),
            "diesel" => Ok(FuelType::Diesel),
            "hybrid" => Ok(FuelType::Hybrid),
            "electric" | "ev" => Ok(FuelType::Electric),
            "cng" => Ok(FuelType::Cng),
            "lpg" => Ok(FuelType::Lpg),
            "other" => Ok(FuelType::Other),
            other => Err(format!("unknown fuel type '{}'", other)),
        }
    }
}

/// Gearbox type of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transmission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Transmission::Manual),
            "automatic" | "auto" => Ok(Transmission::Automatic),
            other => Err(format!("unknown transmission '{}'", other)),
        }
    }
}

/// Power figures as supplied by the seller, either or both may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerFigures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<f64>,
}

/// A used-car listing as received from a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarListing {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage_km: u32,
    pub fuel: FuelType,
    pub transmission: Transmission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacement_cc: Option<u32>,
    #[serde(default)]
    pub power: PowerFigures,
    /// Seller-assessed condition factor in `[0.1, 1.0]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<f64>,
}

impl CarListing {
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        mileage_km: u32,
        fuel: FuelType,
        transmission: Transmission,
    ) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            year,
            mileage_km,
            fuel,
            transmission,
            displacement_cc: None,
            power: PowerFigures::default(),
            condition: None,
        }
    }

    pub fn with_displacement(mut self, cc: u32) -> Self {
        self.displacement_cc = Some(cc);
        self
    }

    pub fn with_kw(mut self, kw: f64) -> Self {
        self.power.kw = Some(kw);
        self
    }

    pub fn with_hp(mut self, hp: f64) -> Self {
        self.power.hp = Some(hp);
        self
    }

    pub fn with_condition(mut self, condition: f64) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Price band returned to callers, all amounts in whole EUR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub point_eur: u64,
    pub lower_eur: u64,
    pub upper_eur: u64,
    pub details: PredictionDetails,
}

impl PredictionResult {
    pub fn band_width_eur(&self) -> u64 {
        self.upper_eur - self.lower_eur
    }
}

/// Intermediate values kept for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDetails {
    /// Stage-1 estimate before brand correction
    pub base_estimate_eur: f64,
    /// Stage-2 estimate before rounding
    pub adjusted_estimate_eur: f64,
    pub age_years: u32,
    pub power: ResolvedPower,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CategoryWarning>,
    pub technical_model_version: String,
    pub brand_model_version: String,
    pub feature_layout: String,
}
