//! Test helpers for building purchase batches.

use crate::purchase::PurchaseRecord;
use chrono::{NaiveDate, NaiveTime};

/// Test helper: one-way purchase with one ticket, dated `YYYY-MM-DD`.
pub(crate) fn purchase(
    order_id: &str,
    customer_id: &str,
    date: &str,
    origin: &str,
    destination: &str,
    gross_value: f64,
) -> PurchaseRecord {
    PurchaseRecord::one_way(
        order_id,
        customer_id,
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        origin,
        destination,
        "Viacao Cometa",
        gross_value,
        1,
    )
    .unwrap()
}

/// Test helper: a customer's trips along `legs`, one per month starting in January 2024.
pub(crate) fn trips(customer_id: &str, legs: &[(&str, &str)], gross_value: f64) -> Vec<PurchaseRecord> {
    legs.iter()
        .enumerate()
        .map(|(idx, (origin, destination))| {
            purchase(
                &format!("{}-{}", customer_id, idx),
                customer_id,
                &format!("2024-{:02}-10", (idx % 12) + 1),
                origin,
                destination,
                gross_value,
            )
        })
        .collect()
}

/// Test helper: eight customers in four clearly separated spend tiers.
pub(crate) fn tiered_batch() -> Vec<PurchaseRecord> {
    let mut records = Vec::new();
    let tiers: [(&str, usize, f64); 8] = [
        ("vip-1", 6, 450.0),
        ("vip-2", 6, 440.0),
        ("loyal-1", 4, 250.0),
        ("loyal-2", 4, 260.0),
        ("occ-1", 2, 150.0),
        ("occ-2", 2, 140.0),
        ("new-1", 1, 50.0),
        ("new-2", 1, 55.0),
    ];
    let cities = ["A", "B", "C", "D", "E", "F", "G"];
    for (customer, count, value) in tiers {
        let legs: Vec<(&str, &str)> = (0..count)
            .map(|i| (cities[i % cities.len()], cities[(i + 1) % cities.len()]))
            .collect();
        records.extend(trips(customer, &legs, value));
    }
    records
}
