//! Profile Aggregator
//!
//! Folds a purchase batch into one behavioral profile per customer. The
//! profile table feeds both the segmentation engine and the repurchase
//! estimator.

use crate::error::{AnalyticsError, Component};
use crate::purchase::PurchaseRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Aggregated purchase behavior of one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    /// Sum of gross value over all purchases
    pub total_spend: f64,
    /// Number of purchases
    pub total_trips: usize,
    /// Number of distinct outbound destinations
    pub unique_destinations: usize,
    pub first_purchase: NaiveDate,
    pub last_purchase: NaiveDate,
}

impl CustomerProfile {
    /// The three numeric features used for clustering and repurchase scoring,
    /// in `[total_spend, total_trips, unique_destinations]` order.
    pub fn features(&self) -> [f64; 3] {
        [
            self.total_spend,
            self.total_trips as f64,
            self.unique_destinations as f64,
        ]
    }
}

struct ProfileAccumulator<'a> {
    total_spend: f64,
    total_trips: usize,
    destinations: BTreeSet<&'a str>,
    first_purchase: NaiveDate,
    last_purchase: NaiveDate,
}

/// Builds one profile per distinct customer in the batch.
///
/// The result does not depend on record order: profiles are sorted by
/// customer id, and spend is summed in per-customer order of (date, order id)
/// so floating-point totals are identical for any permutation of the batch.
///
/// # Errors
/// - `AnalyticsError::EmptyBatch` if `records` is empty
/// - `AnalyticsError::InvalidInput` if a customer's summed spend overflows
pub fn build_profiles(records: &[PurchaseRecord]) -> Result<Vec<CustomerProfile>, AnalyticsError> {
    if records.is_empty() {
        return Err(AnalyticsError::EmptyBatch {
            component: Component::Profiles,
        });
    }

    let mut by_customer: BTreeMap<&str, Vec<&PurchaseRecord>> = BTreeMap::new();
    for record in records {
        by_customer
            .entry(record.customer_id.as_str())
            .or_default()
            .push(record);
    }

    let profiles = by_customer
        .into_iter()
        .map(|(customer_id, mut purchases)| {
            purchases.sort_by(|a, b| {
                a.purchase_date
                    .cmp(&b.purchase_date)
                    .then_with(|| a.order_id.cmp(&b.order_id))
                    .then_with(|| a.gross_value.total_cmp(&b.gross_value))
            });

            let first = purchases[0];
            let mut acc = ProfileAccumulator {
                total_spend: 0.0,
                total_trips: 0,
                destinations: BTreeSet::new(),
                first_purchase: first.purchase_date,
                last_purchase: first.purchase_date,
            };
            for purchase in &purchases {
                acc.total_spend += purchase.gross_value;
                acc.total_trips += 1;
                acc.destinations.insert(purchase.destination_out.as_str());
                acc.first_purchase = acc.first_purchase.min(purchase.purchase_date);
                acc.last_purchase = acc.last_purchase.max(purchase.purchase_date);
            }

            // Each gross value is finite, the sum may not be
            if !acc.total_spend.is_finite() {
                return Err(AnalyticsError::InvalidInput {
                    component: Component::Profiles,
                    reason: format!("total spend of customer {} is not finite", customer_id),
                });
            }

            Ok(CustomerProfile {
                customer_id: customer_id.to_string(),
                total_spend: acc.total_spend,
                total_trips: acc.total_trips,
                unique_destinations: acc.destinations.len(),
                first_purchase: acc.first_purchase,
                last_purchase: acc.last_purchase,
            })
        })
        .collect::<Result<Vec<CustomerProfile>, AnalyticsError>>()?;

    debug!(
        record_count = records.len(),
        customer_count = profiles.len(),
        "built customer profiles"
    );

    Ok(profiles)
}
