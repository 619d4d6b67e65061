//! Dashboard reports
//!
//! Plain aggregations over one purchase batch. Monthly series are keyed by
//! `YYYY-MM` labels and always come back in chronological order.

use crate::error::{AnalyticsError, Component};
use crate::profile::build_profiles;
use crate::purchase::{month_label, PurchaseRecord};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Number of routes in the top-routes report.
pub const TOP_ROUTES_LIMIT: usize = 10;

/// Headline figures for a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_tickets: u64,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCount {
    pub route: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

fn ensure_records(records: &[PurchaseRecord]) -> Result<(), AnalyticsError> {
    if records.is_empty() {
        return Err(AnalyticsError::EmptyBatch {
            component: Component::Reports,
        });
    }
    Ok(())
}

/// Total revenue, tickets sold and distinct customers.
///
/// # Errors
/// Returns `AnalyticsError::EmptyBatch` if `records` is empty.
pub fn kpis(records: &[PurchaseRecord]) -> Result<Kpis, AnalyticsError> {
    ensure_records(records)?;
    let customers: BTreeSet<&str> = records.iter().map(|r| r.customer_id.as_str()).collect();
    Ok(Kpis {
        total_revenue: records.iter().map(|r| r.gross_value).sum(),
        total_tickets: records.iter().map(|r| u64::from(r.ticket_count)).sum(),
        unique_customers: customers.len(),
    })
}

/// The ten most purchased outbound routes.
///
/// Ordered by count descending; equal counts are ordered by route label.
///
/// # Errors
/// Returns `AnalyticsError::EmptyBatch` if `records` is empty.
pub fn top_routes(records: &[PurchaseRecord]) -> Result<Vec<RouteCount>, AnalyticsError> {
    ensure_records(records)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.route().label()).or_insert(0) += 1;
    }
    debug!(
        record_count = records.len(),
        distinct_routes = counts.len(),
        "counted routes"
    );

    let mut routes: Vec<RouteCount> = counts
        .into_iter()
        .map(|(route, count)| RouteCount { route, count })
        .collect();
    // Stable sort: equal counts stay in label order
    routes.sort_by_key(|entry| Reverse(entry.count));
    routes.truncate(TOP_ROUTES_LIMIT);
    Ok(routes)
}

/// Revenue per purchase month.
///
/// # Errors
/// Returns `AnalyticsError::EmptyBatch` if `records` is empty.
pub fn monthly_revenue(records: &[PurchaseRecord]) -> Result<Vec<MonthlyRevenue>, AnalyticsError> {
    ensure_records(records)?;
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *by_month.entry(record.month_label()).or_insert(0.0) += record.gross_value;
    }
    Ok(by_month
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect())
}

/// Customers counted by the month of their first purchase.
///
/// # Errors
/// Returns `AnalyticsError::EmptyBatch` if `records` is empty.
pub fn new_customers_over_time(
    records: &[PurchaseRecord],
) -> Result<Vec<MonthlyCount>, AnalyticsError> {
    ensure_records(records)?;
    let profiles = build_profiles(records)?;
    let mut by_month: BTreeMap<String, usize> = BTreeMap::new();
    for profile in &profiles {
        *by_month.entry(month_label(profile.first_purchase)).or_insert(0) += 1;
    }
    Ok(by_month
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect())
}
