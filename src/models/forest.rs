//! Bagged decision-tree forest shared by the predictive models.

use crate::error::{AnalyticsError, Component};
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure
    pub max_depth: Option<usize>,
    /// Tree `i` bootstraps from `seed + i`
    pub seed: u64,
}

impl ForestParams {
    pub fn with_seed(seed: u64) -> Self {
        ForestParams {
            seed,
            ..Self::default()
        }
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_trees: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

/// Majority-vote ensemble of Gini decision trees, each fit on a bootstrap sample.
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    trees: Vec<DecisionTree<f64, usize>>,
    n_features: usize,
    component: Component,
}

impl ForestClassifier {
    /// Trains the forest.
    ///
    /// Trees are fit in parallel; the result does not depend on scheduling
    /// because every tree owns its seeded sampler.
    ///
    /// # Arguments
    /// * `records` - One row per sample
    /// * `targets` - Class code per row
    /// * `weights` - Optional per-sample weights, carried into each bootstrap
    /// * `component` - Component reported in errors
    ///
    /// # Errors
    /// - `AnalyticsError::InvalidInput` for zero trees or mismatched lengths
    /// - `AnalyticsError::InsufficientData` for an empty training set
    /// - `AnalyticsError::Model` if a tree fails to fit
    pub fn fit(
        records: &Array2<f64>,
        targets: &Array1<usize>,
        weights: Option<&Array1<f32>>,
        params: &ForestParams,
        component: Component,
    ) -> Result<Self, AnalyticsError> {
        if params.n_trees == 0 {
            return Err(AnalyticsError::InvalidInput {
                component,
                reason: "forest needs at least one tree".to_string(),
            });
        }
        let n = records.nrows();
        if n == 0 {
            return Err(AnalyticsError::InsufficientData {
                component,
                required: 1,
                found: 0,
            });
        }
        let weights_match = weights.map_or(true, |w| w.len() == n);
        if targets.len() != n || !weights_match {
            return Err(AnalyticsError::InvalidInput {
                component,
                reason: format!("{} rows but {} targets", n, targets.len()),
            });
        }

        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(tree_index as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

                let dataset = Dataset::new(
                    records.select(Axis(0), &sample),
                    targets.select(Axis(0), &sample),
                );
                let dataset = match weights {
                    Some(w) => dataset.with_weights(w.select(Axis(0), &sample)),
                    None => dataset,
                };

                DecisionTree::params()
                    .split_quality(SplitQuality::Gini)
                    .max_depth(params.max_depth)
                    .fit(&dataset)
                    .map_err(|e| AnalyticsError::model(component, e))
            })
            .collect::<Result<Vec<DecisionTree<f64, usize>>, AnalyticsError>>()?;

        debug!(
            component = component.as_str(),
            n_trees = trees.len(),
            n_samples = n,
            seed = params.seed,
            "trained forest"
        );

        Ok(ForestClassifier {
            trees,
            n_features: records.ncols(),
            component,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Class code per row by majority vote; ties go to the lowest code.
    pub fn predict(&self, records: &Array2<f64>) -> Array1<usize> {
        let votes: Vec<Array1<usize>> = self
            .trees
            .iter()
            .map(|tree| tree.predict(records))
            .collect();

        (0..records.nrows())
            .map(|row| {
                let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
                for tree_votes in &votes {
                    *counts.entry(tree_votes[row]).or_insert(0) += 1;
                }
                let mut winner = (0, 0);
                for (class, count) in counts {
                    if count > winner.1 {
                        winner = (class, count);
                    }
                }
                winner.0
            })
            .collect()
    }

    /// Class code for a single feature vector.
    ///
    /// # Errors
    /// Returns `AnalyticsError::InvalidInput` if `features` has the wrong width.
    pub fn predict_one(&self, features: &[f64]) -> Result<usize, AnalyticsError> {
        if features.len() != self.n_features {
            return Err(AnalyticsError::InvalidInput {
                component: self.component,
                reason: format!(
                    "expected {} features, got {}",
                    self.n_features,
                    features.len()
                ),
            });
        }
        let row = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| AnalyticsError::model(self.component, e))?;
        Ok(self.predict(&row)[0])
    }
}
