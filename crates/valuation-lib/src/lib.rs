//! Valuation library for used-car price bands
//!
//! This crate provides the core functionality for:
//! - Loading and verifying the mapping table and model artifacts
//! - Listing validation and feature encoding
//! - Two-stage price prediction (technical specs, then brand influence)
//! - Market band post-processing
//! - Metrics and structured logging

pub mod artifacts;
pub mod config;
pub mod context;
pub mod error;
pub mod mapping;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod validation;

pub use artifacts::{ArtifactLoader, ArtifactManifest, LoadedArtifacts};
pub use config::ValuationConfig;
pub use context::ValuationContext;
pub use error::{
    ErrorKind, FieldError, PredictionError, Result, ValidationError, ValuationError,
};
pub use mapping::{CategoryField, CategoryWarning, MappingTable};
pub use models::*;
pub use observability::{StructuredLogger, ValuationMetrics};
pub use predictor::{PipelineStep, PredictionPipeline};
