//! Valuation configuration

use crate::error::{Result, ValuationError};
use chrono::Datelike;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default half-width of the market band in EUR
pub const DEFAULT_BAND_WIDTH_EUR: u32 = 2000;

/// Monetary outputs are rounded to this unit
pub const DEFAULT_ROUNDING_UNIT_EUR: u32 = 100;

/// Valuation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationConfig {
    /// Directory holding mappings.json, tech_model.json and brand_model.json
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Year used to compute vehicle age (current year when unset)
    #[serde(default)]
    pub reference_year: Option<i32>,

    /// Half-width of the price band applied around the point estimate
    #[serde(default = "default_band_width")]
    pub band_width_eur: u32,

    /// Rounding unit for the point estimate and bounds
    #[serde(default = "default_rounding_unit")]
    pub rounding_unit_eur: u32,

    /// Oldest accepted year of manufacture
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    /// Largest accepted odometer reading
    #[serde(default = "default_max_mileage")]
    pub max_mileage_km: u32,

    /// Verify artifact digests against manifest.json when it exists
    #[serde(default = "default_verify_manifest")]
    pub verify_manifest: bool,

    /// Estimates above this are treated as inference failures
    #[serde(default = "default_max_plausible_price")]
    pub max_plausible_price_eur: f64,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_band_width() -> u32 {
    DEFAULT_BAND_WIDTH_EUR
}

fn default_rounding_unit() -> u32 {
    DEFAULT_ROUNDING_UNIT_EUR
}

fn default_min_year() -> i32 {
    1950
}

fn default_max_mileage() -> u32 {
    1_000_000
}

fn default_verify_manifest() -> bool {
    true
}

fn default_max_plausible_price() -> f64 {
    5_000_000.0
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            artifact_dir: default_artifact_dir(),
            reference_year: None,
            band_width_eur: default_band_width(),
            rounding_unit_eur: default_rounding_unit(),
            min_year: default_min_year(),
            max_mileage_km: default_max_mileage(),
            verify_manifest: default_verify_manifest(),
            max_plausible_price_eur: default_max_plausible_price(),
        }
    }
}

impl ValuationConfig {
    /// Load configuration from an optional TOML file and `CARVAL_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(config::Environment::with_prefix("CARVAL").try_parsing(true))
            .build()?;

        let loaded: ValuationConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject combinations that would break band arithmetic
    pub fn validate(&self) -> Result<()> {
        if self.rounding_unit_eur == 0 {
            return Err(ValuationError::config("rounding_unit_eur must be positive"));
        }
        if self.band_width_eur % self.rounding_unit_eur != 0 {
            return Err(ValuationError::config(format!(
                "band_width_eur {} is not a multiple of rounding_unit_eur {}",
                self.band_width_eur, self.rounding_unit_eur
            )));
        }
        if !(self.max_plausible_price_eur.is_finite() && self.max_plausible_price_eur > 0.0) {
            return Err(ValuationError::config(
                "max_plausible_price_eur must be a positive number",
            ));
        }
        if let Some(year) = self.reference_year {
            if year < self.min_year {
                return Err(ValuationError::config(format!(
                    "reference_year {} is before min_year {}",
                    year, self.min_year
                )));
            }
        }
        Ok(())
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Utc::now().year())
    }
}
