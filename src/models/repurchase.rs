//! Repurchase Estimator
//!
//! Scores whether a customer buys again. There is no observed repurchase
//! outcome in the purchase data, so the label is synthesized from spend:
//! a customer repurchases with probability `total_spend / max(total_spend)`.
//! The label is derived from a feature the model also sees, so the reported
//! accuracy says nothing about real repurchase behavior. The estimator is a
//! stand-in that exercises the training pipeline end to end.

use crate::error::{AnalyticsError, Component};
use crate::models::forest::{ForestClassifier, ForestParams};
use crate::models::split::train_test_split;
use crate::profile::CustomerProfile;
use ndarray::{arr2, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

/// Held-out share of the profiles.
pub const REPURCHASE_TEST_FRACTION: f64 = 0.2;

const NOT_REPURCHASED: usize = 0;
const REPURCHASED: usize = 1;

/// Counts of each synthetic label over the whole profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelDistribution {
    pub repurchased: usize,
    pub not_repurchased: usize,
}

/// Held-out precision and recall of one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class: &'static str,
    pub precision: f64,
    pub recall: f64,
    /// Held-out rows whose true label is this class
    pub support: usize,
}

/// Summary of a trained repurchase model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepurchaseEvaluation {
    pub accuracy: f64,
    pub label_distribution: LabelDistribution,
    pub classes: Vec<ClassMetrics>,
    pub train_profiles: usize,
    pub test_profiles: usize,
}

/// Draws one synthetic repurchase label per profile.
///
/// `p = total_spend / max(total_spend)`, so the top spender always
/// repurchases and a zero spender never does. When every spend is zero all
/// labels are `false`.
pub fn synthesize_labels(profiles: &[CustomerProfile], seed: u64) -> Vec<bool> {
    let max_spend = profiles
        .iter()
        .map(|profile| profile.total_spend)
        .fold(0.0_f64, f64::max);
    let mut rng = StdRng::seed_from_u64(seed);

    profiles
        .iter()
        .map(|profile| {
            let p = if max_spend > 0.0 {
                (profile.total_spend / max_spend).clamp(0.0, 1.0)
            } else {
                0.0
            };
            rng.gen_bool(p)
        })
        .collect()
}

/// Per-sample weights `n / (2 * count_c)` over `labels`.
fn balanced_weights(labels: &Array1<usize>) -> Array1<f32> {
    let n = labels.len() as f32;
    let mut counts = [0_usize; 2];
    for &label in labels {
        counts[label] += 1;
    }
    labels.mapv(|label| n / (2.0 * counts[label] as f32))
}

fn class_metrics(class: &'static str, code: usize, predicted: &[usize], expected: &[usize]) -> ClassMetrics {
    let mut true_positive = 0;
    let mut predicted_positive = 0;
    let mut support = 0;
    for (&p, &e) in predicted.iter().zip(expected) {
        if p == code {
            predicted_positive += 1;
        }
        if e == code {
            support += 1;
            if p == code {
                true_positive += 1;
            }
        }
    }
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    ClassMetrics {
        class,
        precision: ratio(true_positive, predicted_positive),
        recall: ratio(true_positive, support),
        support,
    }
}

/// Trained repurchase classifier.
#[derive(Debug, Clone)]
pub struct RepurchaseModel {
    forest: ForestClassifier,
    evaluation: RepurchaseEvaluation,
}

impl RepurchaseModel {
    pub fn accuracy(&self) -> f64 {
        self.evaluation.accuracy
    }

    pub fn label_distribution(&self) -> LabelDistribution {
        self.evaluation.label_distribution
    }

    pub fn evaluation(&self) -> &RepurchaseEvaluation {
        &self.evaluation
    }

    /// Whether a customer with these features is predicted to repurchase.
    pub fn predict(&self, total_spend: f64, total_trips: usize, unique_destinations: usize) -> bool {
        let row = arr2(&[[total_spend, total_trips as f64, unique_destinations as f64]]);
        self.forest.predict(&row)[0] == REPURCHASED
    }
}

/// Trains the repurchase model with the default forest.
///
/// # Errors
/// - `AnalyticsError::InsufficientData` for fewer than two profiles
/// - `AnalyticsError::InvalidInput` if a profile's spend is not finite
pub fn train_repurchase(
    profiles: &[CustomerProfile],
    seed: u64,
) -> Result<RepurchaseModel, AnalyticsError> {
    train_repurchase_with(profiles, &ForestParams::with_seed(seed))
}

/// Trains the repurchase model with explicit forest parameters.
///
/// `params.seed` drives the label draw, the split and the forest.
pub fn train_repurchase_with(
    profiles: &[CustomerProfile],
    params: &ForestParams,
) -> Result<RepurchaseModel, AnalyticsError> {
    if profiles.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            component: Component::Repurchase,
            required: 2,
            found: profiles.len(),
        });
    }
    if let Some(profile) = profiles.iter().find(|p| !p.total_spend.is_finite()) {
        return Err(AnalyticsError::InvalidInput {
            component: Component::Repurchase,
            reason: format!("total spend of customer {} is not finite", profile.customer_id),
        });
    }

    let labels = synthesize_labels(profiles, params.seed);
    let repurchased = labels.iter().filter(|&&label| label).count();
    let label_distribution = LabelDistribution {
        repurchased,
        not_repurchased: labels.len() - repurchased,
    };

    let mut features: Array2<f64> = Array2::zeros((profiles.len(), 3));
    for (mut row, profile) in features.outer_iter_mut().zip(profiles) {
        row.assign(&Array1::from(profile.features().to_vec()));
    }
    let targets: Array1<usize> = labels
        .iter()
        .map(|&label| if label { REPURCHASED } else { NOT_REPURCHASED })
        .collect();

    let split = train_test_split(profiles.len(), REPURCHASE_TEST_FRACTION, params.seed);
    let train_x = features.select(Axis(0), &split.train);
    let train_y = targets.select(Axis(0), &split.train);
    let test_x = features.select(Axis(0), &split.test);
    let test_y = targets.select(Axis(0), &split.test).to_vec();

    let weights = balanced_weights(&train_y);
    let forest = ForestClassifier::fit(
        &train_x,
        &train_y,
        Some(&weights),
        params,
        Component::Repurchase,
    )?;
    let predicted = forest.predict(&test_x).to_vec();

    let evaluation = RepurchaseEvaluation {
        accuracy: super::accuracy(&predicted, &test_y),
        label_distribution,
        classes: vec![
            class_metrics("not_repurchased", NOT_REPURCHASED, &predicted, &test_y),
            class_metrics("repurchased", REPURCHASED, &predicted, &test_y),
        ],
        train_profiles: split.train.len(),
        test_profiles: split.test.len(),
    };
    info!(
        profiles = profiles.len(),
        repurchased = label_distribution.repurchased,
        accuracy = evaluation.accuracy,
        "trained repurchase model"
    );

    Ok(RepurchaseModel { forest, evaluation })
}
