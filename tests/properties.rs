//! Property-based tests for the batch components.

mod common;

use common::{dashboard_batch, purchase};
use nextride::hubs::RouteGraph;
use nextride::models::next_route::sequence_pairs;
use nextride::{
    build_profiles, segment_customers, top_hubs, top_routes, train_next_route, AnalyticsError,
    Component, Persona, PurchaseRecord, SegmentationParams,
};
use proptest::prelude::*;

const CITIES: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

/// Generate a non-empty batch over a handful of customers and cities.
fn arb_batch() -> impl Strategy<Value = Vec<PurchaseRecord>> {
    prop::collection::vec(
        (
            0usize..6,        // customer
            0usize..6,        // origin
            1usize..6,        // destination offset, never the origin
            1u32..=12,        // month
            1u32..=28,        // day
            0u32..100_000,    // gross value in cents
        ),
        1..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (customer, origin, offset, month, day, cents))| {
                purchase(
                    &format!("o{}", i),
                    &format!("c{}", customer),
                    &format!("2024-{:02}-{:02}", month, day),
                    CITIES[origin],
                    CITIES[(origin + offset) % CITIES.len()],
                    cents as f64 / 100.0,
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn trips_sum_to_batch_size(batch in arb_batch()) {
        let profiles = build_profiles(&batch).unwrap();
        let trips: usize = profiles.iter().map(|p| p.total_trips).sum();
        prop_assert_eq!(trips, batch.len());
        for profile in &profiles {
            prop_assert!(profile.unique_destinations <= profile.total_trips);
            prop_assert!(profile.first_purchase <= profile.last_purchase);
        }
    }

    #[test]
    fn profiles_ignore_record_order(batch in arb_batch().prop_shuffle()) {
        let mut sorted = batch.clone();
        sorted.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        prop_assert_eq!(build_profiles(&batch).unwrap(), build_profiles(&sorted).unwrap());
    }

    #[test]
    fn centrality_matches_degree_formula(batch in arb_batch()) {
        let graph = RouteGraph::from_records(&batch);
        let n = graph.node_count();
        for hub in top_hubs(&batch).unwrap() {
            let city = graph.cities().find(|c| *c == hub.city).unwrap();
            let expected = (graph.in_degree(city) + graph.out_degree(city)) as f64 / (n - 1) as f64;
            prop_assert_eq!(hub.centrality, expected);
            prop_assert!((0.0..=2.0).contains(&hub.centrality));
        }
    }

    #[test]
    fn route_counts_never_exceed_batch(batch in arb_batch()) {
        let routes = top_routes(&batch).unwrap();
        prop_assert!(routes.len() <= 10);
        prop_assert!(routes.iter().map(|r| r.count).sum::<usize>() <= batch.len());
        for pair in routes.windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
        }
    }
}

#[test]
fn loop_scenario() {
    let legs = [("A", "B"), ("B", "A"), ("A", "B"), ("A", "C"), ("C", "A")];
    let records: Vec<_> = legs
        .iter()
        .enumerate()
        .map(|(i, (o, d))| purchase(&format!("o{}", i), "c1", &format!("2024-01-{:02}", i + 1), o, d, 50.0))
        .collect();

    let profiles = build_profiles(&records).unwrap();
    assert_eq!(profiles[0].total_trips, 5);
    assert_eq!(profiles[0].unique_destinations, 3);

    let graph = RouteGraph::from_records(&records);
    let mut cities: Vec<&str> = graph.cities().collect();
    cities.sort();
    assert_eq!(cities, vec!["A", "B", "C"]);
    assert_eq!(graph.degree_centrality("A"), 2.0);
}

#[test]
fn three_customers_cannot_be_segmented() {
    let records = vec![
        purchase("o1", "c1", "2024-01-01", "A", "B", 10.0),
        purchase("o2", "c2", "2024-01-01", "B", "C", 20.0),
        purchase("o3", "c3", "2024-01-01", "C", "A", 30.0),
    ];
    let profiles = build_profiles(&records).unwrap();
    let err = segment_customers(&profiles, &SegmentationParams::default()).unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::InsufficientData {
            component: Component::Segmentation,
            ..
        }
    ));
}

#[test]
fn vip_cluster_spends_the_most() {
    let profiles = build_profiles(&dashboard_batch()).unwrap();
    for seed in [1, 42, 1234] {
        let segmentation = segment_customers(&profiles, &SegmentationParams::with_seed(seed)).unwrap();
        let clusters = segmentation.clusters();
        assert_eq!(clusters[0].persona_name, Persona::Vip);
        assert!(clusters.iter().all(|c| clusters[0].mean_spend >= c.mean_spend));

        let again = segment_customers(&profiles, &SegmentationParams::with_seed(seed)).unwrap();
        assert_eq!(segmentation.assignments(), again.assignments());
    }
}

#[test]
fn next_route_predictions_are_observed_routes() {
    let records = dashboard_batch();
    let observed: Vec<String> = sequence_pairs(&records)
        .into_iter()
        .map(|pair| pair.next_route)
        .collect();
    let model = train_next_route(&records, 42).unwrap();

    for route in model.known_routes() {
        for month in [1, 6, 12] {
            let predicted = model.predict(route, month).unwrap();
            assert!(observed.contains(&predicted), "{} not observed", predicted);
        }
    }
}
