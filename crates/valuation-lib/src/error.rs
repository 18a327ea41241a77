//! Error types for the valuation core

use crate::predictor::PipelineStep;
use std::fmt;
use thiserror::Error;

/// Result type alias for valuation operations
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Errors raised while loading artifacts or running a prediction
#[derive(Error, Debug)]
pub enum ValuationError {
    /// One or more listing fields are malformed or out of range
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A mapping table or model artifact could not be read or parsed
    #[error("failed to load artifact {artifact}: {reason}")]
    ArtifactLoad { artifact: String, reason: String },

    /// A model produced a non-finite or implausible value
    #[error("{stage} inference failed: {reason}")]
    Inference { stage: &'static str, reason: String },

    /// Feature vector length does not match the model layout
    #[error("feature layout mismatch: expected {expected} features, got {actual}")]
    FeatureLayout { expected: usize, actual: usize },

    /// Configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),
}

impl ValuationError {
    pub fn artifact(artifact: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ArtifactLoad {
            artifact: artifact.into(),
            reason: reason.to_string(),
        }
    }

    pub fn inference(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::Inference {
            stage,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify the error for callers deciding whether to retry
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ArtifactLoad { .. } => ErrorKind::ArtifactLoad,
            Self::Inference { .. } => ErrorKind::Inference,
            Self::FeatureLayout { .. } => ErrorKind::Internal,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<config::ConfigError> for ValuationError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, fix the listing and retry
    Validation,
    /// Startup-fatal
    ArtifactLoad,
    /// Request failed, process stays healthy
    Inference,
    /// Invariant violation inside the core
    Internal,
    /// Startup-fatal
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::ArtifactLoad => "artifact_load",
            ErrorKind::Inference => "inference",
            ErrorKind::Internal => "internal",
            ErrorKind::Config => "config",
        }
    }

    /// Returns true if the caller may retry with corrected input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::Validation | ErrorKind::Inference)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single offending listing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All validation failures found in one listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    /// Names of the offending fields, in the order they were checked
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.field).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid listing")?;
        for (i, err) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} {}", sep, err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// A per-request failure tagged with the pipeline step that raised it
#[derive(Error, Debug)]
#[error("{step} step failed: {source}")]
pub struct PredictionError {
    pub step: PipelineStep,
    #[source]
    pub source: ValuationError,
}

impl PredictionError {
    pub fn new(step: PipelineStep, source: ValuationError) -> Self {
        Self { step, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// Returns the validation details if the listing was rejected
    pub fn validation(&self) -> Option<&ValidationError> {
        match &self.source {
            ValuationError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_all_fields() {
        let err = ValidationError {
            fields: vec![
                FieldError {
                    field: "year",
                    message: "must be at least 1950".to_string(),
                },
                FieldError {
                    field: "brand",
                    message: "must not be empty".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert_eq!(msg, "invalid listing: year must be at least 1950; brand must not be empty");
        assert_eq!(err.field_names(), vec!["year", "brand"]);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ValuationError::artifact("mappings.json", "missing").kind(), ErrorKind::ArtifactLoad);
        assert_eq!(ValuationError::inference("technical", "NaN").kind(), ErrorKind::Inference);
        assert_eq!(
            ValuationError::FeatureLayout { expected: 17, actual: 16 }.kind(),
            ErrorKind::Internal
        );
        assert!(ErrorKind::Validation.is_recoverable());
        assert!(!ErrorKind::ArtifactLoad.is_recoverable());
    }

    #[test]
    fn test_prediction_error_wraps_step() {
        let err = PredictionError::new(
            PipelineStep::Stage1Predict,
            ValuationError::inference("technical", "non-finite output"),
        );
        assert_eq!(err.kind(), ErrorKind::Inference);
        assert!(err.validation().is_none());
        assert_eq!(
            err.to_string(),
            "stage1_predict step failed: technical inference failed: non-finite output"
        );
    }
}
