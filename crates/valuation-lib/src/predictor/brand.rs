//! Stage 2: brand-influence correction
//!
//! Residual corrector in log space:
//!
//! ```text
//! final = exp_m1(ln_1p(base) + tier_offset[tier] + clamp(g(brand), -r, r))
//! ```
//!
//! `g` is a tree ensemble over the brand slice (brand id, model id, tier)
//! and `r` is `max_residual`. Adjacent tier offsets must be at least `2r`
//! apart, so moving a listing to a higher prestige tier can never lower its
//! estimate regardless of what `g` learned.

use super::ensemble::{EnsembleArtifact, TreeEnsemble};
use super::features::{index, EncodedFeatureVector, BRAND_FEATURES, FEATURE_LAYOUT};
use super::technical::BaseEstimate;
use super::Regressor;
use crate::error::{Result, ValuationError};
use serde::Deserialize;

const ARTIFACT_NAME: &str = "brand_model.json";
const STAGE: &str = "brand_influence";

#[derive(Debug, Deserialize)]
struct BrandArtifact {
    #[serde(flatten)]
    ensemble: EnsembleArtifact,
    max_residual: f64,
    tier_offsets: Vec<f64>,
}

/// Stage-2 output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedEstimate {
    pub log_price: f64,
    pub tier_offset: f64,
    /// Clamped model residual
    pub residual: f64,
    pub eur: f64,
}

/// Brand-influence corrector
pub struct BrandInfluenceModel {
    regressor: Box<dyn Regressor>,
    max_residual: f64,
    tier_offsets: Vec<f64>,
}

impl BrandInfluenceModel {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: BrandArtifact =
            serde_json::from_slice(bytes).map_err(|e| ValuationError::artifact(ARTIFACT_NAME, e))?;
        let ensemble = TreeEnsemble::from_artifact(
            artifact.ensemble,
            ARTIFACT_NAME,
            FEATURE_LAYOUT,
            BRAND_FEATURES.len(),
        )?;
        Self::new(Box::new(ensemble), artifact.max_residual, artifact.tier_offsets)
    }

    /// Build a corrector, checking the tier table keeps the estimate monotone
    pub fn new(regressor: Box<dyn Regressor>, max_residual: f64, tier_offsets: Vec<f64>) -> Result<Self> {
        if regressor.feature_count() != BRAND_FEATURES.len() {
            return Err(ValuationError::artifact(
                ARTIFACT_NAME,
                format!(
                    "regressor takes {} features, brand slice has {}",
                    regressor.feature_count(),
                    BRAND_FEATURES.len()
                ),
            ));
        }
        if !(max_residual.is_finite() && max_residual >= 0.0) {
            return Err(ValuationError::artifact(
                ARTIFACT_NAME,
                "max_residual must be a non-negative number",
            ));
        }
        if tier_offsets.is_empty() {
            return Err(ValuationError::artifact(ARTIFACT_NAME, "tier_offsets is empty"));
        }
        if tier_offsets.iter().any(|o| !o.is_finite()) {
            return Err(ValuationError::artifact(ARTIFACT_NAME, "tier_offsets must be finite"));
        }
        for (tier, pair) in tier_offsets.windows(2).enumerate() {
            if pair[1] - pair[0] < 2.0 * max_residual {
                return Err(ValuationError::artifact(
                    ARTIFACT_NAME,
                    format!(
                        "tier {} offset {} is less than 2 * max_residual above tier {} offset {}",
                        tier + 1,
                        pair[1],
                        tier,
                        pair[0]
                    ),
                ));
            }
        }

        Ok(Self {
            regressor,
            max_residual,
            tier_offsets,
        })
    }

    pub fn version(&self) -> &str {
        self.regressor.version()
    }

    pub fn tier_count(&self) -> usize {
        self.tier_offsets.len()
    }

    /// Offset for a tier; tiers past the table use its last entry
    pub fn tier_offset(&self, tier: u32) -> f64 {
        let idx = (tier as usize).min(self.tier_offsets.len() - 1);
        self.tier_offsets[idx]
    }

    /// Correct the base estimate and apply the condition factor
    pub fn adjust(
        &self,
        base: &BaseEstimate,
        features: &EncodedFeatureVector,
        condition: f64,
    ) -> Result<AdjustedEstimate> {
        let raw = self.regressor.predict(features.brand())?;
        if !raw.is_finite() {
            return Err(ValuationError::inference(
                STAGE,
                format!("non-finite residual {}", raw),
            ));
        }

        let residual = raw.clamp(-self.max_residual, self.max_residual);
        let tier_offset = self.tier_offset(features.get(index::BRAND_TIER) as u32);
        let log_price = base.eur.ln_1p() + tier_offset + residual;
        let eur = log_price.exp_m1() * condition;

        if !eur.is_finite() {
            return Err(ValuationError::inference(
                STAGE,
                format!("adjusted log price {} overflows", log_price),
            ));
        }

        Ok(AdjustedEstimate {
            log_price,
            tier_offset,
            residual,
            eur: eur.max(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::features::FEATURE_COUNT;
    use crate::predictor::testing::{ConstantRegressor, SliceRegressor};

    fn vector_with_tier(tier: u32) -> EncodedFeatureVector {
        let mut values = vec![0.0; FEATURE_COUNT];
        values[index::BRAND_TIER] = tier as f64;
        EncodedFeatureVector::from_values(values).unwrap()
    }

    fn base(eur: f64) -> BaseEstimate {
        BaseEstimate {
            log_price: eur.ln_1p(),
            eur,
        }
    }

    #[test]
    fn test_residual_and_offset_applied_in_log_space() {
        let model =
            BrandInfluenceModel::new(Box::new(ConstantRegressor::new(3, 0.02)), 0.05, vec![-0.1, 0.0, 0.2])
                .unwrap();
        let adjusted = model.adjust(&base(10_000.0), &vector_with_tier(2), 1.0).unwrap();
        assert_eq!(adjusted.tier_offset, 0.2);
        assert_eq!(adjusted.residual, 0.02);
        let expected = (10_000.0f64.ln_1p() + 0.22).exp_m1();
        assert!((adjusted.eur - expected).abs() < 1e-6);
    }

    #[test]
    fn test_residual_clamped() {
        let model =
            BrandInfluenceModel::new(Box::new(ConstantRegressor::new(3, 3.0)), 0.05, vec![0.0]).unwrap();
        let adjusted = model.adjust(&base(10_000.0), &vector_with_tier(0), 1.0).unwrap();
        assert_eq!(adjusted.residual, 0.05);
    }

    #[test]
    fn test_higher_tier_never_lowers_estimate() {
        // Residual rewards low tiers as hard as the clamp allows
        let regressor = SliceRegressor::new(3, |x| 1.0 - x[2]);
        let model = BrandInfluenceModel::new(Box::new(regressor), 0.05, vec![-0.25, -0.10, 0.0, 0.15, 0.35])
            .unwrap();

        let mut previous = 0.0;
        for tier in 0..6 {
            let eur = model.adjust(&base(15_000.0), &vector_with_tier(tier), 1.0).unwrap().eur;
            assert!(eur >= previous, "tier {} estimate {} below {}", tier, eur, previous);
            previous = eur;
        }
    }

    #[test]
    fn test_condition_scales_estimate() {
        let model =
            BrandInfluenceModel::new(Box::new(ConstantRegressor::new(3, 0.0)), 0.05, vec![0.0]).unwrap();
        let full = model.adjust(&base(10_000.0), &vector_with_tier(0), 1.0).unwrap();
        let worn = model.adjust(&base(10_000.0), &vector_with_tier(0), 0.5).unwrap();
        assert!((worn.eur - full.eur * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_tier_table_that_breaks_monotonicity() {
        let err = BrandInfluenceModel::new(Box::new(ConstantRegressor::new(3, 0.0)), 0.05, vec![0.0, 0.05])
            .err()
            .unwrap();
        assert!(err.to_string().contains("max_residual"), "{}", err);
        assert!(BrandInfluenceModel::new(Box::new(ConstantRegressor::new(3, 0.0)), 0.05, vec![]).is_err());
        assert!(BrandInfluenceModel::new(Box::new(ConstantRegressor::new(3, 0.0)), -1.0, vec![0.0]).is_err());
    }

    #[test]
    fn test_non_finite_residual_is_inference_error() {
        let model =
            BrandInfluenceModel::new(Box::new(ConstantRegressor::new(3, f64::INFINITY)), 0.05, vec![0.0])
                .unwrap();
        let err = model.adjust(&base(10_000.0), &vector_with_tier(0), 1.0).unwrap_err();
        assert!(matches!(err, ValuationError::Inference { stage: "brand_influence", .. }));
    }

    #[test]
    fn test_parses_artifact_with_tiers() {
        let json = br#"{
            "name": "brand_influence", "version": "b1", "layout": "eucar-v2",
            "feature_count": 3, "base_score": 0.0,
            "max_residual": 0.05, "tier_offsets": [0.0, 0.2],
            "trees": [{ "nodes": [{ "leaf": 0.01 }] }]
        }"#;
        let model = BrandInfluenceModel::from_json(json).unwrap();
        assert_eq!(model.version(), "b1");
        assert_eq!(model.tier_offset(1), 0.2);
        assert_eq!(model.tier_offset(9), 0.2);
    }
}
