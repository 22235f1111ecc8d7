//! Burned-area regression model
//!
//! The artifact is a JSON export of a fitted random-forest regressor: the
//! feature names it was trained with and, per tree, the flat node arrays
//! (`children_left`, `children_right`, `feature`, `threshold`, `value`).
//! A node whose left child is `-1` is a leaf.
//!
//! A fitted scikit-learn forest maps onto this layout one estimator at a
//! time. `tree_.value` has shape `(n_nodes, 1, 1)` for a single-output
//! regressor and is flattened to one value per node:
//!
//! ```python
//! {
//!     "feature_names": list(forest.feature_names_in_),
//!     "trees": [
//!         {
//!             "children_left": t.tree_.children_left.tolist(),
//!             "children_right": t.tree_.children_right.tolist(),
//!             "feature": t.tree_.feature.tolist(),
//!             "threshold": t.tree_.threshold.tolist(),
//!             "value": t.tree_.value[:, 0, 0].tolist(),
//!         }
//!         for t in forest.estimators_
//!     ],
//! }
//! ```
//!
//! `models/sample_burned_area.json` is a three-tree artifact in this format
//! for trying the pipeline without a trained forest.

use crate::models::{FEATURE_NAMES, FeatureVector};
use crate::{FireWatchError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

const LEAF: i64 = -1;

#[derive(Debug, Clone, Deserialize)]
struct Tree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl Tree {
    fn validate(&self, index: usize) -> Result<()> {
        let nodes = self.children_left.len();
        if nodes == 0 {
            return Err(FireWatchError::model(format!("tree {index} has no nodes")));
        }
        let lengths = [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ];
        if lengths.iter().any(|&len| len != nodes) {
            return Err(FireWatchError::model(format!(
                "tree {index} has node arrays of different lengths"
            )));
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                continue;
            }
            // children always follow their parent, which rules out cycles
            let in_range = |child: i64| child > node as i64 && (child as usize) < nodes;
            if !in_range(left) || !in_range(right) {
                return Err(FireWatchError::model(format!(
                    "tree {index} node {node} has invalid children ({left}, {right})"
                )));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= FEATURE_NAMES.len() {
                return Err(FireWatchError::model(format!(
                    "tree {index} node {node} splits on unknown feature {feature}"
                )));
            }
        }
        Ok(())
    }

    fn predict(&self, row: &[f64; 9]) -> f64 {
        let mut node = 0;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Artifact {
    feature_names: Vec<String>,
    trees: Vec<Tree>,
}

/// Tree-ensemble regressor predicting burned area in km²
#[derive(Debug, Clone)]
pub struct BurnedAreaModel {
    trees: Vec<Tree>,
}

impl BurnedAreaModel {
    /// Load and validate the artifact at `path`
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            FireWatchError::model(format!("Failed to read model {}: {e}", path.display()))
        })?;
        let model = Self::from_json(&json)?;
        info!(
            "Loaded burned-area model with {} trees from {}",
            model.trees.len(),
            path.display()
        );
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: Artifact = serde_json::from_str(json)
            .map_err(|e| FireWatchError::model(format!("Invalid model artifact: {e}")))?;

        if artifact.feature_names != FEATURE_NAMES {
            return Err(FireWatchError::model(format!(
                "Model was trained on {:?}, expected {:?}",
                artifact.feature_names, FEATURE_NAMES
            )));
        }
        if artifact.trees.is_empty() {
            return Err(FireWatchError::model("Model contains no trees"));
        }
        for (index, tree) in artifact.trees.iter().enumerate() {
            tree.validate(index)?;
        }

        Ok(Self {
            trees: artifact.trees,
        })
    }

    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-tree predictions for a single row
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let row = features.as_row();
        if let Some((name, value)) = features.named().find(|(_, v)| !v.is_finite()) {
            return Err(FireWatchError::model(format!(
                "Feature {name} is not finite: {value}"
            )));
        }

        let sum: f64 = self.trees.iter().map(|tree| tree.predict(&row)).sum();
        let prediction = sum / self.trees.len() as f64;
        debug!("Predicted burned area {:.3} km²", prediction);
        Ok(prediction)
    }
}
