//! Sequence Predictor
//!
//! Learns which route a customer buys next from the route they bought last
//! and the month they bought it in.

use crate::error::{AnalyticsError, Component};
use crate::models::encoder::RouteEncoder;
use crate::models::forest::{ForestClassifier, ForestParams};
use crate::models::split::train_test_split;
use crate::purchase::PurchaseRecord;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Held-out share of the sequence pairs.
pub const NEXT_ROUTE_TEST_FRACTION: f64 = 0.25;

/// Two consecutive purchases of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencePair {
    pub customer_id: String,
    pub current_route: String,
    /// Month of the current purchase, 1..=12
    pub month: u32,
    pub next_route: String,
}

/// Summary of a trained next-route model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextRouteEvaluation {
    pub accuracy: f64,
    pub train_pairs: usize,
    pub test_pairs: usize,
    pub route_vocabulary: usize,
    pub next_route_vocabulary: usize,
}

/// Extracts every `(current route, month) -> next route` pair of the batch.
///
/// Each customer's purchases are ordered by date; purchases on the same date
/// keep their batch order. Customers with a single purchase contribute nothing.
pub fn sequence_pairs(records: &[PurchaseRecord]) -> Vec<SequencePair> {
    let mut by_customer: BTreeMap<&str, Vec<&PurchaseRecord>> = BTreeMap::new();
    for record in records {
        by_customer
            .entry(record.customer_id.as_str())
            .or_default()
            .push(record);
    }

    let mut pairs = Vec::new();
    for (customer_id, mut purchases) in by_customer {
        purchases.sort_by_key(|purchase| purchase.purchase_date);
        for window in purchases.windows(2) {
            pairs.push(SequencePair {
                customer_id: customer_id.to_string(),
                current_route: window[0].route().label(),
                month: window[0].month(),
                next_route: window[1].route().label(),
            });
        }
    }
    pairs
}

/// Trained next-route classifier.
#[derive(Debug, Clone)]
pub struct NextRouteModel {
    forest: ForestClassifier,
    current_routes: RouteEncoder,
    next_routes: RouteEncoder,
    evaluation: NextRouteEvaluation,
}

impl NextRouteModel {
    /// Held-out accuracy.
    pub fn accuracy(&self) -> f64 {
        self.evaluation.accuracy
    }

    pub fn evaluation(&self) -> &NextRouteEvaluation {
        &self.evaluation
    }

    /// Routes the model can be asked about.
    pub fn known_routes(&self) -> &[String] {
        self.current_routes.labels()
    }

    /// Routes the model can answer with.
    pub fn predictable_routes(&self) -> &[String] {
        self.next_routes.labels()
    }

    /// Most likely next route after buying `route_label` in `month`.
    ///
    /// # Errors
    /// - `AnalyticsError::InvalidInput` if `month` is outside 1..=12
    /// - `AnalyticsError::UnknownCategory` if `route_label` was never a current route in training
    pub fn predict(&self, route_label: &str, month: u32) -> Result<String, AnalyticsError> {
        if !(1..=12).contains(&month) {
            return Err(AnalyticsError::InvalidInput {
                component: Component::NextRoute,
                reason: format!("month {} is outside 1..=12", month),
            });
        }
        let code = self.current_routes.encode(route_label)?;
        let predicted = self.forest.predict_one(&[code as f64, month as f64])?;
        self.next_routes
            .decode(predicted)
            .map(str::to_string)
            .ok_or_else(|| {
                AnalyticsError::model(
                    Component::NextRoute,
                    format!("class {} outside the route vocabulary", predicted),
                )
            })
    }
}

/// Trains the next-route model on one batch with the default forest.
///
/// # Errors
/// - `AnalyticsError::EmptyBatch` if `records` is empty
/// - `AnalyticsError::InsufficientData` if the batch yields fewer than two sequence pairs
pub fn train_next_route(
    records: &[PurchaseRecord],
    seed: u64,
) -> Result<NextRouteModel, AnalyticsError> {
    train_next_route_with(records, &ForestParams::with_seed(seed))
}

/// Trains the next-route model with explicit forest parameters.
///
/// `params.seed` drives both the train/held-out split and the forest.
pub fn train_next_route_with(
    records: &[PurchaseRecord],
    params: &ForestParams,
) -> Result<NextRouteModel, AnalyticsError> {
    if records.is_empty() {
        return Err(AnalyticsError::EmptyBatch {
            component: Component::NextRoute,
        });
    }
    let pairs = sequence_pairs(records);
    if pairs.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            component: Component::NextRoute,
            required: 2,
            found: pairs.len(),
        });
    }

    let current_routes = RouteEncoder::fit(
        pairs.iter().map(|pair| pair.current_route.as_str()),
        Component::NextRoute,
    );
    let next_routes = RouteEncoder::fit(
        pairs.iter().map(|pair| pair.next_route.as_str()),
        Component::NextRoute,
    );

    let mut features: Array2<f64> = Array2::zeros((pairs.len(), 2));
    let mut targets: Array1<usize> = Array1::zeros(pairs.len());
    for (row, pair) in pairs.iter().enumerate() {
        features[[row, 0]] = current_routes.encode(&pair.current_route)? as f64;
        features[[row, 1]] = pair.month as f64;
        targets[row] = next_routes.encode(&pair.next_route)?;
    }

    let split = train_test_split(pairs.len(), NEXT_ROUTE_TEST_FRACTION, params.seed);
    let train_x = features.select(Axis(0), &split.train);
    let train_y = targets.select(Axis(0), &split.train);
    let test_x = features.select(Axis(0), &split.test);
    let test_y = targets.select(Axis(0), &split.test);

    let forest = ForestClassifier::fit(&train_x, &train_y, None, params, Component::NextRoute)?;
    let predicted = forest.predict(&test_x);
    let accuracy = super::accuracy(&predicted.to_vec(), &test_y.to_vec());

    let evaluation = NextRouteEvaluation {
        accuracy,
        train_pairs: split.train.len(),
        test_pairs: split.test.len(),
        route_vocabulary: current_routes.len(),
        next_route_vocabulary: next_routes.len(),
    };
    info!(
        pairs = pairs.len(),
        accuracy = evaluation.accuracy,
        routes = evaluation.route_vocabulary,
        "trained next-route model"
    );

    Ok(NextRouteModel {
        forest,
        current_routes,
        next_routes,
        evaluation,
    })
}
