// Integration tests for end-to-end workflows and critical user scenarios

#[cfg(test)]
mod integration_tests {
    use crate::csv_source::CsvSource;
    use crate::error::{AnalyticsError, Component};
    use crate::hubs::top_hubs;
    use crate::models::next_route::{sequence_pairs, train_next_route};
    use crate::models::repurchase::train_repurchase;
    use crate::pipeline::{Stage, StageStatus, TrainingPipeline};
    use crate::profile::build_profiles;
    use crate::purchase::PurchaseRecord;
    use crate::queries::Queries;
    use crate::reports::top_routes;
    use crate::segmentation::{segment_customers, Persona, SegmentationParams};
    use crate::source::{InMemorySource, PurchaseSource};
    use crate::sqlite_source::SqliteSource;
    use crate::testing::{purchase, tiered_batch, trips};
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::TempDir;

    /// Test end-to-end workflow: CSV export -> SQLite -> dashboard queries
    #[test]
    fn test_csv_to_sqlite_to_queries_workflow() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("export.csv");
        let records = tiered_batch();
        CsvSource::write_batch(&csv_path, &records).unwrap();

        // Load the export and persist it
        let loaded = CsvSource::new(&csv_path).load_batch().unwrap();
        assert_eq!(loaded, records);
        let db = SqliteSource::new(dir.path().join("purchases.db"));
        assert_eq!(db.insert_batch(&loaded).unwrap(), records.len());

        // Both sources answer every query identically
        let from_csv = CsvSource::new(&csv_path);
        let csv_queries = Queries::new(&from_csv, 42);
        let db_queries = Queries::new(&db, 42);

        assert_eq!(csv_queries.kpis().unwrap(), db_queries.kpis().unwrap());
        assert_eq!(csv_queries.top_routes().unwrap(), db_queries.top_routes().unwrap());
        assert_eq!(csv_queries.clusters().unwrap(), db_queries.clusters().unwrap());
        assert_eq!(csv_queries.hub_details().unwrap(), db_queries.hub_details().unwrap());
    }

    /// Test the single-customer loop: profile, graph and sequences agree
    #[test]
    fn test_loop_scenario_across_components() {
        let records = trips(
            "c1",
            &[("A", "B"), ("B", "A"), ("A", "B"), ("A", "C"), ("C", "A")],
            100.0,
        );

        let profiles = build_profiles(&records).unwrap();
        assert_eq!(profiles[0].total_trips, 5);
        assert_eq!(profiles[0].unique_destinations, 3);

        let hubs = top_hubs(&records).unwrap();
        assert_eq!(hubs.len(), 3);
        assert_eq!((hubs[0].city.as_str(), hubs[0].centrality), ("A", 2.0));

        // Four consecutive pairs, enough for the next-route model
        assert_eq!(sequence_pairs(&records).len(), 4);
        let model = train_next_route(&records, 42).unwrap();
        let predicted = model.predict("A -> B", 1).unwrap();
        assert!(model.predictable_routes().contains(&predicted));

        // A single customer can't be segmented
        assert!(matches!(
            segment_customers(&profiles, &SegmentationParams::default()),
            Err(AnalyticsError::InsufficientData {
                component: Component::Segmentation,
                found: 1,
                ..
            })
        ));
    }

    /// Test the route-count scenario through the query facade
    #[test]
    fn test_route_counts_through_queries() {
        let mut source = InMemorySource::default();
        for i in 0..7 {
            source.push(purchase(&format!("x{}", i), "c1", "2024-01-01", "X", "Y", 10.0));
        }
        for i in 0..3 {
            source.push(purchase(&format!("y{}", i), "c2", "2024-01-02", "Y", "X", 10.0));
        }

        let routes = Queries::new(&source, 42).top_routes().unwrap();
        let pairs: Vec<(&str, usize)> = routes.iter().map(|r| (r.route.as_str(), r.count)).collect();
        assert_eq!(pairs, vec![("X -> Y", 7), ("Y -> X", 3)]);
    }

    /// Test that round trips only contribute their outbound leg
    #[test]
    fn test_round_trip_uses_outbound_leg() {
        let round_trip = PurchaseRecord::round_trip(
            "rt-1",
            "c1",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            "Sao Paulo",
            "Rio de Janeiro",
            "Viacao Cometa",
            "Viacao 1001",
            320.0,
            2,
        )
        .unwrap();
        assert!(round_trip.is_round_trip());

        let records = vec![round_trip];
        let routes = top_routes(&records).unwrap();
        assert_eq!(routes[0].route, "Sao Paulo -> Rio de Janeiro");
        let hubs = top_hubs(&records).unwrap();
        assert_eq!(hubs.len(), 2);
    }

    /// Test full training run over tiered customers
    #[test]
    fn test_training_pipeline_on_tiered_batch() {
        let records = tiered_batch();
        let source = InMemorySource::new(records.clone());
        let report = TrainingPipeline::new(42).run(&source).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.record_count, records.len());

        // Pipeline output matches running the components directly
        let profiles = build_profiles(&records).unwrap();
        let segmentation = segment_customers(&profiles, &SegmentationParams::with_seed(42)).unwrap();
        assert_eq!(report.clusters.as_deref(), Some(segmentation.clusters()));
        assert_eq!(
            report.clusters.as_ref().map(|c| c[0].persona_name),
            Some(Persona::Vip)
        );

        let repurchase = train_repurchase(&profiles, 42).unwrap();
        assert_eq!(report.repurchase.as_ref(), Some(repurchase.evaluation()));
        assert_eq!(report.status(Stage::NextRoute), Some(&StageStatus::Completed));
    }

    /// Test that identical input and seed produce the same personas across runs
    #[test]
    fn test_segmentation_stable_across_loads() {
        let source = InMemorySource::new(tiered_batch());
        let queries = Queries::new(&source, 11);

        assert_eq!(queries.clusters().unwrap(), queries.clusters().unwrap());
        assert_eq!(
            queries.segment_distribution().unwrap(),
            queries.segment_distribution().unwrap()
        );
    }
}
