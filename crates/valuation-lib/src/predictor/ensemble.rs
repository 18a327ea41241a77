//! Gradient-boosted tree ensemble inference
//!
//! Both regression stages are exported offline as JSON tree dumps. A node
//! is either a leaf or a split on `x[feature] < threshold`; missing values
//! (NaN) follow `missing_left`. Child indices must point forward in the
//! node list, which rules out cycles and bounds every traversal.

use super::Regressor;
use crate::error::{Result, ValuationError};
use serde::Deserialize;

/// Single tree node as exported by the training job
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        missing_left: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn check(&self, tree_idx: usize, feature_count: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree_idx));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        return Err(format!("tree {} node {} has a non-finite leaf", tree_idx, idx));
                    }
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if feature >= feature_count {
                        return Err(format!(
                            "tree {} node {} splits on feature {} but the model has {}",
                            tree_idx, idx, feature, feature_count
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("tree {} node {} has a NaN threshold", tree_idx, idx));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!(
                                "tree {} node {} points to invalid child {}",
                                tree_idx, idx, child
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { leaf } => return leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    missing_left,
                } => {
                    let value = x[feature];
                    idx = if value.is_nan() {
                        if missing_left {
                            left
                        } else {
                            right
                        }
                    } else if value < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Serialized form of an ensemble artifact
#[derive(Debug, Clone, Deserialize)]
pub struct EnsembleArtifact {
    pub name: String,
    pub version: String,
    pub layout: String,
    pub feature_count: usize,
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

/// Validated tree ensemble
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    name: String,
    version: String,
    feature_count: usize,
    base_score: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Check an artifact against the expected layout and width
    pub fn from_artifact(
        artifact: EnsembleArtifact,
        artifact_name: &str,
        layout: &str,
        feature_count: usize,
    ) -> Result<Self> {
        if artifact.layout != layout {
            return Err(ValuationError::artifact(
                artifact_name,
                format!(
                    "layout '{}' does not match feature layout '{}'",
                    artifact.layout, layout
                ),
            ));
        }
        if artifact.feature_count != feature_count {
            return Err(ValuationError::artifact(
                artifact_name,
                format!(
                    "model expects {} features, layout provides {}",
                    artifact.feature_count, feature_count
                ),
            ));
        }
        if !artifact.base_score.is_finite() {
            return Err(ValuationError::artifact(artifact_name, "base_score is not finite"));
        }
        for (idx, tree) in artifact.trees.iter().enumerate() {
            tree.check(idx, feature_count)
                .map_err(|reason| ValuationError::artifact(artifact_name, reason))?;
        }

        Ok(Self {
            name: artifact.name,
            version: artifact.version,
            feature_count,
            base_score: artifact.base_score,
            trees: artifact.trees,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.feature_count {
            return Err(ValuationError::FeatureLayout {
                expected: self.feature_count,
                actual: features.len(),
            });
        }
        Ok(self.base_score + self.trees.iter().map(|t| t.eval(features)).sum::<f64>())
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn version(&self) -> &str {
        &self.version
    }
}
