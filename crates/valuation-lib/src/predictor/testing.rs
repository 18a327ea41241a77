//! Regressor doubles for unit tests

use super::Regressor;
use crate::error::Result;

/// Always returns the same value
pub struct ConstantRegressor {
    feature_count: usize,
    value: f64,
}

impl ConstantRegressor {
    pub fn new(feature_count: usize, value: f64) -> Self {
        Self {
            feature_count,
            value,
        }
    }
}

impl Regressor for ConstantRegressor {
    fn predict(&self, _features: &[f64]) -> Result<f64> {
        Ok(self.value)
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn version(&self) -> &str {
        "constant"
    }
}

/// Evaluates a closure over the feature slice
pub struct SliceRegressor {
    feature_count: usize,
    f: Box<dyn Fn(&[f64]) -> f64 + Send + Sync>,
}

impl SliceRegressor {
    pub fn new(feature_count: usize, f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            feature_count,
            f: Box::new(f),
        }
    }
}

impl Regressor for SliceRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        Ok((self.f)(features))
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn version(&self) -> &str {
        "slice"
    }
}
