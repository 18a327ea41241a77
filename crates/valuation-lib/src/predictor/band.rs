//! Market band post-processing
//!
//! Rounds the point estimate to the configured unit and spreads a fixed
//! tolerance around it. The lower bound is floored at zero.

use crate::config::{ValuationConfig, DEFAULT_BAND_WIDTH_EUR, DEFAULT_ROUNDING_UNIT_EUR};
use crate::error::{Result, ValuationError};

/// Configuration for band computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandConfig {
    /// Half-width of the band (default: €2000)
    pub band_width_eur: u32,
    /// Rounding unit for all outputs (default: €100)
    pub rounding_unit_eur: u32,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            band_width_eur: DEFAULT_BAND_WIDTH_EUR,
            rounding_unit_eur: DEFAULT_ROUNDING_UNIT_EUR,
        }
    }
}

impl From<&ValuationConfig> for BandConfig {
    fn from(config: &ValuationConfig) -> Self {
        Self {
            band_width_eur: config.band_width_eur,
            rounding_unit_eur: config.rounding_unit_eur,
        }
    }
}

/// Rounded price band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub point_eur: u64,
    pub lower_eur: u64,
    pub upper_eur: u64,
}

/// Turns a point estimate into a bounded price range
#[derive(Debug, Clone)]
pub struct MarketBandCalculator {
    config: BandConfig,
}

impl MarketBandCalculator {
    pub fn new() -> Self {
        Self {
            config: BandConfig::default(),
        }
    }

    /// The width must sit on the rounding grid so both bounds stay rounded
    pub fn with_config(config: BandConfig) -> Result<Self> {
        if config.rounding_unit_eur == 0 {
            return Err(ValuationError::config("rounding_unit_eur must be positive"));
        }
        if config.band_width_eur % config.rounding_unit_eur != 0 {
            return Err(ValuationError::config(format!(
                "band_width_eur {} is not a multiple of rounding_unit_eur {}",
                config.band_width_eur, config.rounding_unit_eur
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> BandConfig {
        self.config
    }

    /// Round to the nearest unit
    pub fn round(&self, estimate_eur: f64) -> u64 {
        let unit = self.config.rounding_unit_eur as f64;
        ((estimate_eur.max(0.0) / unit).round() * unit) as u64
    }

    pub fn compute(&self, estimate_eur: f64) -> Result<PriceBand> {
        if !estimate_eur.is_finite() || estimate_eur < 0.0 {
            return Err(ValuationError::inference(
                "market_band",
                format!("invalid point estimate {}", estimate_eur),
            ));
        }

        let width = self.config.band_width_eur as u64;
        let point_eur = self.round(estimate_eur);
        Ok(PriceBand {
            point_eur,
            lower_eur: point_eur.saturating_sub(width),
            upper_eur: point_eur + width,
        })
    }
}

impl Default for MarketBandCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band() {
        let band = MarketBandCalculator::new().compute(18_305.29).unwrap();
        assert_eq!(band.point_eur, 18_300);
        assert_eq!(band.lower_eur, 16_300);
        assert_eq!(band.upper_eur, 20_300);
        assert_eq!(band.upper_eur - band.lower_eur, 4_000);
    }

    #[test]
    fn test_rounds_half_up() {
        let calc = MarketBandCalculator::new();
        assert_eq!(calc.round(12_349.99), 12_300);
        assert_eq!(calc.round(12_350.0), 12_400);
    }

    #[test]
    fn test_lower_bound_floored_at_zero() {
        let band = MarketBandCalculator::new().compute(1_230.0).unwrap();
        assert_eq!(band.point_eur, 1_200);
        assert_eq!(band.lower_eur, 0);
        assert_eq!(band.upper_eur, 3_200);
    }

    #[test]
    fn test_custom_width() {
        let calc = MarketBandCalculator::with_config(BandConfig {
            band_width_eur: 1_000,
            rounding_unit_eur: 100,
        })
        .unwrap();
        let band = calc.compute(9_960.0).unwrap();
        assert_eq!((band.lower_eur, band.point_eur, band.upper_eur), (9_000, 10_000, 11_000));
    }

    #[test]
    fn test_rejects_off_grid_width() {
        assert!(MarketBandCalculator::with_config(BandConfig {
            band_width_eur: 1_050,
            rounding_unit_eur: 100,
        })
        .is_err());
    }

    #[test]
    fn test_invalid_estimate() {
        let calc = MarketBandCalculator::new();
        assert!(calc.compute(f64::NAN).is_err());
        assert!(calc.compute(-1.0).is_err());
        assert!(calc.compute(f64::INFINITY).is_err());
    }
}
