//! Predictive Models
//!
//! Supervised models trained on one purchase batch. Both models share the
//! bagged decision-tree forest in [`forest`], the seeded split in [`split`]
//! and the label vocabulary in [`encoder`].

pub mod encoder;
pub mod forest;
pub mod next_route;
pub mod repurchase;
pub mod split;

pub use encoder::RouteEncoder;
pub use forest::{ForestClassifier, ForestParams};
pub use next_route::{
    sequence_pairs, train_next_route, train_next_route_with, NextRouteEvaluation, NextRouteModel,
    SequencePair,
};
pub use repurchase::{
    synthesize_labels, train_repurchase, train_repurchase_with, ClassMetrics, LabelDistribution,
    RepurchaseEvaluation, RepurchaseModel,
};
pub use split::{train_test_split, TrainTestSplit};

/// Fraction of matching predictions, or 0 for an empty evaluation set.
pub(crate) fn accuracy(predicted: &[usize], expected: &[usize]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let hits = predicted
        .iter()
        .zip(expected)
        .filter(|(p, e)| p == e)
        .count();
    hits as f64 / expected.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1, 2, 3, 4], &[1, 2, 0, 0]), 0.5);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
