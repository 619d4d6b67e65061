//! Runtime configuration for the binaries

use crate::csv_source::CsvSource;
use crate::source::PurchaseSource;
use crate::sqlite_source::SqliteSource;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Where purchase batches are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// CSV export file
    Csv(PathBuf),
    /// SQLite database with a `purchases` table
    Sqlite(PathBuf),
}

impl SourceConfig {
    /// Parses `csv:<path>` or `sqlite:<path>`; a bare path is read as CSV.
    pub fn parse(value: &str) -> Self {
        if let Some(path) = value.strip_prefix("sqlite:") {
            SourceConfig::Sqlite(PathBuf::from(path))
        } else if let Some(path) = value.strip_prefix("csv:") {
            SourceConfig::Csv(PathBuf::from(path))
        } else {
            SourceConfig::Csv(PathBuf::from(value))
        }
    }

    /// Builds the configured source. Nothing is read until the first load.
    pub fn open(&self) -> Box<dyn PurchaseSource + Send + Sync> {
        match self {
            SourceConfig::Csv(path) => Box::new(CsvSource::new(path)),
            SourceConfig::Sqlite(path) => Box::new(SqliteSource::new(path)),
        }
    }
}

impl fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceConfig::Csv(path) => write!(f, "csv:{}", path.display()),
            SourceConfig::Sqlite(path) => write!(f, "sqlite:{}", path.display()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Server host address (default: "127.0.0.1")
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Purchase source (default: `viagens_clickbus.csv`)
    pub source: SourceConfig,
    /// Seed for every stochastic step (default: 42)
    pub seed: u64,
    /// Wall-clock limit per query (default: 30s)
    pub query_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            source: SourceConfig::Csv(PathBuf::from("viagens_clickbus.csv")),
            seed: 42,
            query_timeout: Duration::from_secs(30),
        }
    }
}

fn parse_or_default<T: FromStr + fmt::Display>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %value, fallback = %default, "ignoring invalid setting");
            default
        }),
    }
}

impl ServerConfig {
    /// Creates a new server configuration with default seed and timeout
    pub fn new(host: impl Into<String>, port: u16, source: SourceConfig) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            source,
            ..Self::default()
        }
    }

    /// Reads `HOST`, `PORT`, `DATA_SOURCE`, `ANALYTICS_SEED` and
    /// `QUERY_TIMEOUT_SECS`, keeping the default for anything unset or invalid.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ServerConfig::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs = parse_or_default(
            "QUERY_TIMEOUT_SECS",
            lookup("QUERY_TIMEOUT_SECS"),
            defaults.query_timeout.as_secs(),
        );
        ServerConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or_default("PORT", lookup("PORT"), defaults.port),
            source: lookup("DATA_SOURCE")
                .filter(|value| !value.trim().is_empty())
                .map(|value| SourceConfig::parse(value.trim()))
                .unwrap_or(defaults.source),
            seed: parse_or_default("ANALYTICS_SEED", lookup("ANALYTICS_SEED"), defaults.seed),
            query_timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// `host:port` to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
