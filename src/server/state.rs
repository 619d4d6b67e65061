//! Shared application state for the API server

use super::error::ApiError;
use crate::config::ServerConfig;
use crate::error::AnalyticsError;
use crate::queries::Queries;
use crate::source::PurchaseSource;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
///
/// Holds no batch data: every request loads its own batch through `source`.
#[derive(Clone)]
pub struct AppState {
    /// Purchase source queried once per request
    pub source: Arc<dyn PurchaseSource + Send + Sync>,
    /// Seed for stochastic queries
    pub seed: u64,
    /// Wall-clock limit per query
    pub query_timeout: Duration,
}

impl AppState {
    /// Creates a new application state
    pub fn new(source: Box<dyn PurchaseSource + Send + Sync>, seed: u64, query_timeout: Duration) -> Self {
        AppState {
            source: Arc::from(source),
            seed,
            query_timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.source.open(), config.seed, config.query_timeout)
    }

    /// Runs `query` on the blocking pool, bounded by `query_timeout`.
    ///
    /// On timeout the response is sent immediately; the blocking task is
    /// left to finish and its result is dropped.
    pub async fn run_query<T, F>(&self, name: &'static str, query: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Queries<'_>) -> Result<T, AnalyticsError> + Send + 'static,
        T: Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let seed = self.seed;
        let task = tokio::task::spawn_blocking(move || {
            let queries = Queries::new(source.as_ref(), seed);
            query(&queries)
        });

        match tokio::time::timeout(self.query_timeout, task).await {
            Ok(Ok(result)) => result.map_err(ApiError::from),
            Ok(Err(join_error)) => Err(ApiError::InternalError(join_error.to_string())),
            Err(_elapsed) => {
                tracing::warn!(query = name, timeout = ?self.query_timeout, "query timed out");
                Err(ApiError::Timeout {
                    query: name,
                    after: self.query_timeout,
                })
            }
        }
    }
}
