//! Frozen scoring models: tree ensembles behind one scoring capability
//!
//! Three independently trained ranker dumps are consumed at inference time,
//! one per event type. A dump is a flattened gradient-boosted tree ensemble
//! and arrives in one of two shapes:
//!
//! - **Wrapped**: declares its training feature names and accepts the
//!   feature table directly.
//! - **Native**: a bare ensemble that takes a plain numeric matrix plus a
//!   best-iteration hint capping how many trees are evaluated.
//!
//! The shape is detected once at load (wrapped attempted first, native as
//! the fallback, matching how the dumps were exported) and every later
//! prediction call dispatches through the single `score()` capability.
//! Feature-contract validation runs once at context construction; shape
//! problems that only surface inside tree traversal are reported as
//! recoverable per-event-type scoring errors.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::constants::FEATURE_COUNT;
use crate::errors::{RecError, Result};
use crate::features::{FeatureTable, FEATURE_COLUMNS};
use crate::session::EventType;

// =============================================================================
// TREE ENSEMBLE
// =============================================================================

/// One regression tree in flattened array form
///
/// Internal node `i` splits on `split_feature[i]` at `threshold[i]`; rows
/// with `value <= threshold` descend left. A non-negative child index is an
/// internal node; a negative child `c` addresses leaf `-(c) - 1`.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    split_feature: Vec<usize>,
    threshold: Vec<f64>,
    left_child: Vec<i32>,
    right_child: Vec<i32>,
    leaf_value: Vec<f64>,
}

impl Tree {
    /// Structural consistency: all internal-node arrays the same length,
    /// at least one leaf
    fn check_structure(&self, tree_idx: usize) -> std::result::Result<(), String> {
        let n = self.split_feature.len();
        if self.threshold.len() != n || self.left_child.len() != n || self.right_child.len() != n {
            return Err(format!("tree {tree_idx}: inconsistent node array lengths"));
        }
        if self.leaf_value.is_empty() {
            return Err(format!("tree {tree_idx}: no leaves"));
        }
        Ok(())
    }

    /// Evaluate one row; every index is bounds-checked so a malformed dump
    /// surfaces as an error, never a panic
    fn predict_row(&self, row: &[f64]) -> std::result::Result<f64, String> {
        if self.split_feature.is_empty() {
            // Constant tree: single leaf
            return self
                .leaf_value
                .first()
                .copied()
                .ok_or_else(|| "constant tree has no leaf".to_string());
        }

        let mut node = 0usize;
        // A well-formed tree terminates within node-count steps
        for _ in 0..=self.split_feature.len() {
            let feature = self.split_feature[node];
            let value = *row
                .get(feature)
                .ok_or_else(|| format!("split on feature {feature}, row has {}", row.len()))?;

            let child = if value <= self.threshold[node] {
                self.left_child[node]
            } else {
                self.right_child[node]
            };

            if child < 0 {
                let leaf = (-child - 1) as usize;
                return self
                    .leaf_value
                    .get(leaf)
                    .copied()
                    .ok_or_else(|| format!("leaf index {leaf} out of range"));
            }

            node = child as usize;
            if node >= self.split_feature.len() {
                return Err(format!("child index {node} out of range"));
            }
        }
        Err("tree traversal did not reach a leaf".to_string())
    }
}

/// Gradient-boosted ensemble: prediction is the sum of tree outputs
#[derive(Debug, Clone, Deserialize)]
pub struct GbdtEnsemble {
    /// Feature width the ensemble was trained on
    num_features: usize,

    /// Constant added to every prediction
    #[serde(default)]
    base_score: f64,

    trees: Vec<Tree>,
}

impl GbdtEnsemble {
    fn check_structure(&self) -> std::result::Result<(), String> {
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.check_structure(idx)?;
        }
        Ok(())
    }

    /// Sum the first `num_trees` tree outputs per row
    fn predict(
        &self,
        matrix: &[[f64; FEATURE_COUNT]],
        num_trees: usize,
    ) -> std::result::Result<Vec<f64>, String> {
        let trees = &self.trees[..self.trees.len().min(num_trees)];
        matrix
            .iter()
            .map(|row| {
                let mut score = self.base_score;
                for tree in trees {
                    score += tree.predict_row(row)?;
                }
                Ok(score)
            })
            .collect()
    }
}

// =============================================================================
// ARTIFACT SHAPES
// =============================================================================

/// Dump that declares its training feature names
#[derive(Debug, Clone, Deserialize)]
pub struct WrappedModel {
    feature_names: Vec<String>,
    #[serde(flatten)]
    ensemble: GbdtEnsemble,
}

/// Bare ensemble dump with an iteration-count hint
#[derive(Debug, Clone, Deserialize)]
pub struct NativeModel {
    /// Trees evaluated per prediction; 0 means all trees (no hint recorded)
    best_iteration: usize,
    #[serde(flatten)]
    ensemble: GbdtEnsemble,
}

/// A loaded scoring model, shape resolved once at load time
#[derive(Debug, Clone)]
pub enum ScoringModel {
    Wrapped(WrappedModel),
    Native(NativeModel),
}

impl ScoringModel {
    /// Parse a model dump, attempting the wrapped shape first and falling
    /// back to native
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let model = if let Ok(wrapped) = serde_json::from_str::<WrappedModel>(json) {
            ScoringModel::Wrapped(wrapped)
        } else {
            let native = serde_json::from_str::<NativeModel>(json).map_err(|e| {
                RecError::ArtifactInvalid {
                    name: name.to_string(),
                    reason: format!("neither wrapped nor native model shape: {e}"),
                }
            })?;
            ScoringModel::Native(native)
        };

        model
            .ensemble()
            .check_structure()
            .map_err(|reason| RecError::ArtifactInvalid {
                name: name.to_string(),
                reason,
            })?;
        Ok(model)
    }

    /// Load a model dump from disk
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| RecError::ArtifactUnreadable {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(name, &json)?;
        info!(
            model = name,
            shape = model.shape(),
            trees = model.ensemble().trees.len(),
            "Loaded scoring model"
        );
        Ok(model)
    }

    fn ensemble(&self) -> &GbdtEnsemble {
        match self {
            ScoringModel::Wrapped(m) => &m.ensemble,
            ScoringModel::Native(m) => &m.ensemble,
        }
    }

    /// Shape label for logs
    pub fn shape(&self) -> &'static str {
        match self {
            ScoringModel::Wrapped(_) => "wrapped",
            ScoringModel::Native(_) => "native",
        }
    }

    /// Validate this model against the feature builder's output contract
    ///
    /// Wrapped models must declare exactly the builder's column names, in
    /// order; native models must declare the builder's column count. Runs
    /// once at context construction; a mismatch aborts setup.
    pub fn validate_feature_contract(&self, event_type: EventType) -> Result<()> {
        match self {
            ScoringModel::Wrapped(m) => {
                let declared: Vec<&str> = m.feature_names.iter().map(String::as_str).collect();
                if declared != FEATURE_COLUMNS {
                    return Err(RecError::FeatureContractMismatch {
                        event_type,
                        expected: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
                        declared: m.feature_names.clone(),
                    });
                }
                Ok(())
            }
            ScoringModel::Native(m) => {
                if m.ensemble.num_features != FEATURE_COUNT {
                    return Err(RecError::FeatureWidthMismatch {
                        event_type,
                        expected: FEATURE_COUNT,
                        declared: m.ensemble.num_features,
                    });
                }
                Ok(())
            }
        }
    }

    /// Score every row of the feature table, in row order
    ///
    /// Failures here are recoverable per event type: the caller records the
    /// error and serves the other event types normally.
    pub fn score(&self, features: &FeatureTable, event_type: EventType) -> Result<Vec<f64>> {
        let matrix = features.matrix();
        let result = match self {
            ScoringModel::Wrapped(m) => m.ensemble.predict(&matrix, m.ensemble.trees.len()),
            ScoringModel::Native(m) => {
                let num_trees = if m.best_iteration == 0 {
                    m.ensemble.trees.len()
                } else {
                    m.best_iteration
                };
                m.ensemble.predict(&matrix, num_trees)
            }
        };
        result.map_err(|reason| RecError::ScoringFailed { event_type, reason })
    }
}
