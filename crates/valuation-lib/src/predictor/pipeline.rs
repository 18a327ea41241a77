//! Prediction pipeline
//!
//! Runs one listing through every step in order:
//!
//! ```text
//! Validate -> Encode -> EstimatePower -> Stage1Predict -> Stage2Adjust -> ComputeBand
//! ```
//!
//! The pipeline only reads the shared [`ValuationContext`], so a single
//! instance can serve any number of threads. Failures are tagged with the
//! step that raised them.

use super::band::{BandConfig, MarketBandCalculator};
use super::features::{FeatureEncoder, FEATURE_LAYOUT};
use super::power::PowerEstimator;
use crate::context::ValuationContext;
use crate::error::{PredictionError, Result, ValuationError};
use crate::models::{CarListing, PredictionDetails, PredictionResult};
use crate::observability::{StructuredLogger, ValuationMetrics};
use crate::validation::{validate, ValidationRules};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A stage of the prediction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Validate,
    Encode,
    EstimatePower,
    Stage1Predict,
    Stage2Adjust,
    ComputeBand,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Validate => "validate",
            PipelineStep::Encode => "encode",
            PipelineStep::EstimatePower => "estimate_power",
            PipelineStep::Stage1Predict => "stage1_predict",
            PipelineStep::Stage2Adjust => "stage2_adjust",
            PipelineStep::ComputeBand => "compute_band",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attach the failing step to a core error
trait AtStep<T> {
    fn at(self, step: PipelineStep) -> std::result::Result<T, PredictionError>;
}

impl<T, E: Into<ValuationError>> AtStep<T> for std::result::Result<T, E> {
    fn at(self, step: PipelineStep) -> std::result::Result<T, PredictionError> {
        self.map_err(|e| PredictionError::new(step, e.into()))
    }
}

/// Two-stage price band predictor
pub struct PredictionPipeline {
    context: Arc<ValuationContext>,
    band: MarketBandCalculator,
    rules: ValidationRules,
    reference_year: i32,
    metrics: ValuationMetrics,
    logger: StructuredLogger,
}

impl PredictionPipeline {
    pub fn new(context: Arc<ValuationContext>) -> Result<Self> {
        let config = context.config();
        let reference_year = config.reference_year();
        let band = MarketBandCalculator::with_config(BandConfig::from(config))?;
        let rules = ValidationRules::from_config(config, reference_year);

        let metrics = ValuationMetrics::new();
        metrics.set_artifact_versions(
            context.mapping().version(),
            context.technical().version(),
            context.brand().version(),
        );

        Ok(Self {
            context,
            band,
            rules,
            reference_year,
            metrics,
            logger: StructuredLogger::new("pipeline"),
        })
    }

    /// Override the band half-width for this pipeline
    pub fn with_band_width(mut self, band_width_eur: u32) -> Result<Self> {
        let config = BandConfig {
            band_width_eur,
            ..self.band.config()
        };
        self.band = MarketBandCalculator::with_config(config)?;
        Ok(self)
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn context(&self) -> &ValuationContext {
        &self.context
    }

    /// Predict the market band for one listing
    pub fn predict(
        &self,
        listing: &CarListing,
    ) -> std::result::Result<PredictionResult, PredictionError> {
        let start = Instant::now();

        match self.run(listing) {
            Ok(result) => {
                let elapsed = start.elapsed();
                self.metrics.observe_prediction_latency(elapsed.as_secs_f64());
                self.metrics.inc_predictions();
                for warning in &result.details.warnings {
                    self.metrics.inc_unknown_category(warning.field);
                    self.logger.log_unknown_category(warning.field, &warning.value);
                }
                self.logger.log_prediction(
                    &listing.brand,
                    &listing.model,
                    listing.year,
                    result.point_eur,
                    result.lower_eur,
                    result.upper_eur,
                    result.details.base_estimate_eur,
                    elapsed.as_micros(),
                );
                Ok(result)
            }
            Err(err) => {
                let kind = err.kind();
                self.metrics.inc_prediction_failure(err.step, kind.as_str());
                self.logger
                    .log_prediction_failure(err.step, kind.as_str(), &err.source.to_string());
                Err(err)
            }
        }
    }

    fn run(&self, listing: &CarListing) -> std::result::Result<PredictionResult, PredictionError> {
        let ctx = &self.context;

        let validated = validate(listing, &self.rules).at(PipelineStep::Validate)?;

        let encoder = FeatureEncoder::new(ctx.mapping(), self.reference_year);
        let draft = encoder.encode(&validated);

        let raw = validated.listing();
        let power = PowerEstimator::resolve(raw.displacement_cc, raw.fuel, &raw.power);
        let encoded = draft.complete(&power).at(PipelineStep::EstimatePower)?;
        debug!(
            kw = power.kw,
            source = ?power.source,
            unknown_categories = encoded.warnings.len(),
            "Listing encoded"
        );

        let base = ctx
            .technical()
            .predict(&encoded.features)
            .at(PipelineStep::Stage1Predict)?;

        let adjusted = ctx
            .brand()
            .adjust(&base, &encoded.features, validated.condition())
            .at(PipelineStep::Stage2Adjust)?;
        let ceiling = ctx.config().max_plausible_price_eur;
        if adjusted.eur > ceiling {
            return Err(PredictionError::new(
                PipelineStep::Stage2Adjust,
                ValuationError::inference(
                    "brand_influence",
                    format!("estimate {:.0} exceeds plausible ceiling {:.0}", adjusted.eur, ceiling),
                ),
            ));
        }
        debug!(
            base_eur = base.eur,
            tier_offset = adjusted.tier_offset,
            residual = adjusted.residual,
            adjusted_eur = adjusted.eur,
            "Estimate adjusted"
        );

        let band = self
            .band
            .compute(adjusted.eur)
            .at(PipelineStep::ComputeBand)?;

        Ok(PredictionResult {
            point_eur: band.point_eur,
            lower_eur: band.lower_eur,
            upper_eur: band.upper_eur,
            details: PredictionDetails {
                base_estimate_eur: base.eur,
                adjusted_estimate_eur: adjusted.eur,
                age_years: encoded.age_years,
                power,
                warnings: encoded.warnings,
                technical_model_version: ctx.technical().version().to_string(),
                brand_model_version: ctx.brand().version().to_string(),
                feature_layout: FEATURE_LAYOUT.to_string(),
            },
        })
    }
}
