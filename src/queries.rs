//! Query facade
//!
//! One method per dashboard query. Every call loads a fresh batch from the
//! source and runs the pure component over it; nothing is cached between
//! calls.

use crate::error::AnalyticsError;
use crate::hubs::{self, HubCentrality, HubDegree};
use crate::profile::build_profiles;
use crate::purchase::PurchaseRecord;
use crate::reports::{self, Kpis, MonthlyCount, MonthlyRevenue, RouteCount};
use crate::segmentation::{segment_customers, ClusterSummary, SegmentCount, Segmentation, SegmentationParams};
use crate::source::PurchaseSource;
use tracing::debug;

/// Dashboard queries over a purchase source.
pub struct Queries<'a> {
    source: &'a dyn PurchaseSource,
    seed: u64,
}

impl<'a> Queries<'a> {
    /// # Arguments
    /// * `source` - Where every query loads its batch from
    /// * `seed` - Seed for the stochastic queries (segmentation)
    pub fn new(source: &'a dyn PurchaseSource, seed: u64) -> Self {
        Queries { source, seed }
    }

    fn batch(&self) -> Result<Vec<PurchaseRecord>, AnalyticsError> {
        let records = self.source.load_batch()?;
        debug!(
            source = %self.source.describe(),
            record_count = records.len(),
            "loaded batch"
        );
        Ok(records)
    }

    pub fn kpis(&self) -> Result<Kpis, AnalyticsError> {
        reports::kpis(&self.batch()?)
    }

    pub fn top_routes(&self) -> Result<Vec<RouteCount>, AnalyticsError> {
        reports::top_routes(&self.batch()?)
    }

    pub fn monthly_revenue(&self) -> Result<Vec<MonthlyRevenue>, AnalyticsError> {
        reports::monthly_revenue(&self.batch()?)
    }

    pub fn new_customers_over_time(&self) -> Result<Vec<MonthlyCount>, AnalyticsError> {
        reports::new_customers_over_time(&self.batch()?)
    }

    pub fn top_hubs(&self) -> Result<Vec<HubCentrality>, AnalyticsError> {
        hubs::top_hubs(&self.batch()?)
    }

    pub fn hub_details(&self) -> Result<Vec<HubDegree>, AnalyticsError> {
        hubs::hub_details(&self.batch()?)
    }

    fn segmentation(&self) -> Result<Segmentation, AnalyticsError> {
        let profiles = build_profiles(&self.batch()?)?;
        segment_customers(&profiles, &SegmentationParams::with_seed(self.seed))
    }

    /// Spend-ranked cluster summaries.
    pub fn clusters(&self) -> Result<Vec<ClusterSummary>, AnalyticsError> {
        Ok(self.segmentation()?.clusters().to_vec())
    }

    /// Customers per persona.
    pub fn segment_distribution(&self) -> Result<Vec<SegmentCount>, AnalyticsError> {
        Ok(self.segmentation()?.distribution())
    }
}
