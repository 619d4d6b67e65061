pub mod purchase;
pub mod source;
pub mod csv_source;
pub mod sqlite_source;
pub mod error;
pub mod profile;
pub mod hubs;
pub mod segmentation;
pub mod models;
pub mod reports;
pub mod queries;
pub mod pipeline;
pub mod config;
pub mod server;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod integration_tests;

pub use purchase::{PurchaseRecord, RecordError, Route};
pub use source::{InMemorySource, PurchaseSource, SourceError};
pub use csv_source::CsvSource;
pub use sqlite_source::SqliteSource;
pub use error::{AnalyticsError, Component};
pub use profile::{build_profiles, CustomerProfile};
pub use hubs::{hub_details, top_hubs, HubCentrality, HubDegree, RouteGraph};
pub use segmentation::{
    segment_customers,
    ClusterSummary,
    CustomerSegment,
    Persona,
    SegmentCount,
    Segmentation,
    SegmentationParams,
};
pub use models::{
    train_next_route,
    train_repurchase,
    ForestParams,
    NextRouteModel,
    RepurchaseModel,
};
pub use reports::{kpis, monthly_revenue, new_customers_over_time, top_routes, Kpis, MonthlyCount, MonthlyRevenue, RouteCount};
pub use queries::Queries;
pub use pipeline::{Stage, StageStatus, TrainingPipeline, TrainingReport};
pub use config::{ServerConfig, SourceConfig};
pub use server::{create_router, run_server, ApiError, AppState};

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG`.
///
/// `log` records from the data-source loaders are forwarded through the
/// subscriber's log bridge. Calling this more than once is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
