//! Two-stage price prediction

mod band;
mod brand;
mod ensemble;
mod features;
mod pipeline;
mod power;
mod technical;

#[cfg(test)]
pub(crate) mod testing;

pub use band::{BandConfig, MarketBandCalculator, PriceBand};
pub use brand::{AdjustedEstimate, BrandInfluenceModel};
pub use ensemble::{EnsembleArtifact, Tree, TreeEnsemble, TreeNode};
pub use features::{
    index, EncodedFeatureVector, EncodedListing, FeatureDraft, FeatureEncoder, BRAND_FEATURES,
    FEATURE_COUNT, FEATURE_LAYOUT, FUEL_SLOTS, TECHNICAL_FEATURES, TRANSMISSION_SLOTS,
};
pub use pipeline::{PipelineStep, PredictionPipeline};
pub use power::{
    category_default_kw, PowerEstimator, PowerSource, PowerTier, ResolvedPower, DIESEL_TIERS,
    KW_TO_HP, PETROL_TIERS,
};
pub use technical::{BaseEstimate, TechnicalSpecModel};

use crate::error::Result;

/// Trait for regression model implementations
pub trait Regressor: Send + Sync {
    /// Predict a single value from a feature slice
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Number of input features expected
    fn feature_count(&self) -> usize;

    /// Model version tag from the artifact
    fn version(&self) -> &str;
}
