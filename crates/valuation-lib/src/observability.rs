//! Observability infrastructure for the valuation core
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes, unknown categories, artifact versions)
//! - Structured logging with tracing

use crate::mapping::CategoryField;
use crate::predictor::PipelineStep;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    Encoder, GaugeVec, Histogram, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ValuationMetricsInner> = OnceLock::new();

struct ValuationMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_failures: IntCounterVec,
    unknown_categories: IntCounterVec,
    artifact_version_info: GaugeVec,
}

impl ValuationMetricsInner {
    fn new() -> Self {
        let inner = Self {
            prediction_latency_seconds: register_histogram!(
                "carval_prediction_latency_seconds",
                "Time spent running the prediction pipeline",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "carval_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            prediction_failures: register_int_counter_vec!(
                "carval_prediction_failures_total",
                "Failed predictions by pipeline step",
                &["step", "kind"]
            )
            .expect("Failed to register prediction_failures_total"),

            unknown_categories: register_int_counter_vec!(
                "carval_unknown_categories_total",
                "Categories resolved through the unknown bucket",
                &["field"]
            )
            .expect("Failed to register unknown_categories_total"),

            artifact_version_info: register_gauge_vec!(
                "carval_artifact_version_info",
                "Versions of the loaded mapping table and models",
                &["mapping", "technical", "brand"]
            )
            .expect("Failed to register artifact_version_info"),
        };

        // Expose every field at zero from the start
        for field in CategoryField::ALL {
            inner.unknown_categories.with_label_values(&[field.as_str()]);
        }
        inner
    }
}

/// Valuation metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ValuationMetrics {
    _private: (),
}

impl Default for ValuationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ValuationMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ValuationMetricsInner {
        GLOBAL_METRICS.get_or_init(ValuationMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_failure(&self, step: PipelineStep, kind: &str) {
        self.inner()
            .prediction_failures
            .with_label_values(&[step.as_str(), kind])
            .inc();
    }

    pub fn inc_unknown_category(&self, field: CategoryField) {
        self.inner()
            .unknown_categories
            .with_label_values(&[field.as_str()])
            .inc();
    }

    pub fn set_artifact_versions(&self, mapping: &str, technical: &str, brand: &str) {
        self.inner().artifact_version_info.reset();
        self.inner()
            .artifact_version_info
            .with_label_values(&[mapping, technical, brand])
            .set(1.0);
    }

    pub fn predictions_total(&self) -> u64 {
        self.inner().predictions_total.get()
    }

    pub fn unknown_category_count(&self, field: CategoryField) -> u64 {
        self.inner()
            .unknown_categories
            .with_label_values(&[field.as_str()])
            .get()
    }

    /// Render the default registry in Prometheus text format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for valuation events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, artifact_dir: &str) {
        info!(
            event = "valuation_started",
            instance = %self.instance,
            version = %version,
            artifact_dir = %artifact_dir,
            "Valuation core starting"
        );
    }

    pub fn log_artifacts_loaded(&self, mapping: &str, technical: &str, brand: &str) {
        info!(
            event = "artifacts_loaded",
            instance = %self.instance,
            mapping_version = %mapping,
            technical_version = %technical,
            brand_version = %brand,
            "Mapping table and models ready"
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_prediction(
        &self,
        brand: &str,
        model: &str,
        year: i32,
        point_eur: u64,
        lower_eur: u64,
        upper_eur: u64,
        base_estimate_eur: f64,
        elapsed_us: u128,
    ) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            brand = %brand,
            model = %model,
            year = year,
            point_eur = point_eur,
            lower_eur = lower_eur,
            upper_eur = upper_eur,
            base_estimate_eur = base_estimate_eur,
            elapsed_us = elapsed_us as u64,
            "Generated price band"
        );
    }

    pub fn log_prediction_failure(&self, step: PipelineStep, kind: &str, error: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            step = %step,
            kind = %kind,
            error = %error,
            "Prediction failed"
        );
    }

    pub fn log_unknown_category(&self, field: CategoryField, value: &str) {
        warn!(
            event = "unknown_category",
            instance = %self.instance,
            field = %field,
            value = %value,
            "Category not in mapping table, using unknown bucket"
        );
    }
}
