//! Stage 1: technical-specification regressor
//!
//! Predicts `ln(1 + price)` from the technical slice of the feature vector
//! and converts it back to EUR.

use super::ensemble::{EnsembleArtifact, TreeEnsemble};
use super::features::{EncodedFeatureVector, FEATURE_LAYOUT, TECHNICAL_FEATURES};
use super::Regressor;
use crate::error::{Result, ValuationError};

const ARTIFACT_NAME: &str = "tech_model.json";
const STAGE: &str = "technical";

/// Stage-1 output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseEstimate {
    /// Model output in log space
    pub log_price: f64,
    pub eur: f64,
}

/// Technical-specification model
pub struct TechnicalSpecModel {
    regressor: Box<dyn Regressor>,
}

impl TechnicalSpecModel {
    /// Parse a tree-ensemble artifact
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: EnsembleArtifact =
            serde_json::from_slice(bytes).map_err(|e| ValuationError::artifact(ARTIFACT_NAME, e))?;
        let ensemble =
            TreeEnsemble::from_artifact(artifact, ARTIFACT_NAME, FEATURE_LAYOUT, TECHNICAL_FEATURES.len())?;
        Self::new(Box::new(ensemble))
    }

    /// Wrap any regressor over the technical slice
    pub fn new(regressor: Box<dyn Regressor>) -> Result<Self> {
        if regressor.feature_count() != TECHNICAL_FEATURES.len() {
            return Err(ValuationError::artifact(
                ARTIFACT_NAME,
                format!(
                    "regressor takes {} features, technical slice has {}",
                    regressor.feature_count(),
                    TECHNICAL_FEATURES.len()
                ),
            ));
        }
        Ok(Self { regressor })
    }

    pub fn version(&self) -> &str {
        self.regressor.version()
    }

    pub fn predict(&self, features: &EncodedFeatureVector) -> Result<BaseEstimate> {
        let log_price = self.regressor.predict(features.technical())?;
        if !log_price.is_finite() {
            return Err(ValuationError::inference(
                STAGE,
                format!("non-finite log price {}", log_price),
            ));
        }

        let eur = log_price.exp_m1();
        if !eur.is_finite() {
            return Err(ValuationError::inference(
                STAGE,
                format!("log price {} overflows", log_price),
            ));
        }

        Ok(BaseEstimate {
            log_price,
            eur: eur.max(0.0),
        })
    }
}
