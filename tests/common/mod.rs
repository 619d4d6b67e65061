#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use nextride::PurchaseRecord;

pub fn purchase(
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
        NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
        origin,
        destination,
        "Expresso Adamantina",
        gross_value,
        1,
    )
    .unwrap()
}

/// Twelve customers across four spend tiers and a small city network.
pub fn dashboard_batch() -> Vec<PurchaseRecord> {
    let cities = ["Sao Paulo", "Campinas", "Santos", "Curitiba", "Rio de Janeiro"];
    let tiers: [(&str, usize, f64); 4] = [("vip", 8, 500.0), ("loyal", 5, 220.0), ("occ", 2, 120.0), ("new", 1, 40.0)];

    let mut records = Vec::new();
    for (tier, trips, value) in tiers {
        for n in 0..3 {
            let customer = format!("{}-{}", tier, n);
            for t in 0..trips {
                let origin = cities[(n + t) % cities.len()];
                let destination = cities[(n + t + 1) % cities.len()];
                records.push(purchase(
                    &format!("{}-{}", customer, t),
                    &customer,
                    &format!("2024-{:02}-{:02}", t % 12 + 1, n + 1),
                    origin,
                    destination,
                    value + n as f64,
                ));
            }
        }
    }
    records
}
