use crate::purchase::{PurchaseRecord, RecordError};
use std::fmt;

/// Trait for purchase-batch sources.
///
/// The engine never owns a live connection: each query asks its source for a
/// complete batch and works on that copy. Implementations can be:
/// - In-memory vector (for testing and embedding)
/// - CSV export file
/// - SQLite database
/// - Any other loader that can materialize the full batch
pub trait PurchaseSource {
    /// Loads the complete current batch of purchase records.
    ///
    /// # Errors
    /// Returns a [`SourceError`] when the batch cannot be obtained. The engine
    /// propagates it unchanged; retrying is the loader's concern.
    fn load_batch(&self) -> Result<Vec<PurchaseRecord>, SourceError>;

    /// Human-readable description used in logs.
    fn describe(&self) -> String {
        "purchase source".to_string()
    }
}

/// Errors raised while obtaining a purchase batch.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The underlying file could not be read
    Io(String),
    /// A row could not be parsed into a purchase
    Parse { row: usize, reason: String },
    /// The database rejected a query
    Database(String),
    /// A row parsed but violates a purchase invariant
    InvalidRecord(RecordError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(msg) => write!(f, "I/O error: {}", msg),
            SourceError::Parse { row, reason } => write!(f, "row {}: {}", row, reason),
            SourceError::Database(msg) => write!(f, "database error: {}", msg),
            SourceError::InvalidRecord(err) => write!(f, "invalid record: {}", err),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<RecordError> for SourceError {
    fn from(err: RecordError) -> Self {
        SourceError::InvalidRecord(err)
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err.to_string())
    }
}

impl From<rusqlite::Error> for SourceError {
    fn from(err: rusqlite::Error) -> Self {
        SourceError::Database(err.to_string())
    }
}

/// In-memory purchase source.
///
/// Hands out a clone of its records on every load so callers never share
/// mutable state.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<PurchaseRecord>,
}

impl InMemorySource {
    /// Creates a source over the given records.
    pub fn new(records: Vec<PurchaseRecord>) -> Self {
        InMemorySource { records }
    }

    /// Appends a record to the batch.
    pub fn push(&mut self, record: PurchaseRecord) {
        self.records.push(record);
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the source holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PurchaseSource for InMemorySource {
    fn load_batch(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory source ({} records)", self.records.len())
    }
}

/// A source that always fails, for exercising error propagation.
#[cfg(test)]
pub(crate) struct FailingSource;

#[cfg(test)]
impl PurchaseSource for FailingSource {
    fn load_batch(&self) -> Result<Vec<PurchaseRecord>, SourceError> {
        Err(SourceError::Io("connection refused".to_string()))
    }
}
