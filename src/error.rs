//! Error types shared by every analytics component

use crate::source::SourceError;
use std::fmt;

/// Engine component that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Profiles,
    Reports,
    Hubs,
    Segmentation,
    NextRoute,
    Repurchase,
}

impl Component {
    /// Stable lowercase name, used in logs and pipeline reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Profiles => "profiles",
            Component::Reports => "reports",
            Component::Hubs => "hubs",
            Component::Segmentation => "segmentation",
            Component::NextRoute => "next_route",
            Component::Repurchase => "repurchase",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by the analytics engine.
///
/// Every variant is terminal for the operation that raised it. None of the
/// components retry or degrade to a partial result.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// The record batch contained no records
    EmptyBatch { component: Component },
    /// Not enough distinct data points to run the component
    InsufficientData {
        component: Component,
        required: usize,
        found: usize,
    },
    /// A categorical label outside the trained vocabulary
    UnknownCategory { component: Component, label: String },
    /// The record batch could not be obtained from its source
    SourceUnavailable(SourceError),
    /// A caller-supplied argument is out of range
    InvalidInput { component: Component, reason: String },
    /// The underlying learner failed to fit
    Model { component: Component, reason: String },
}

impl AnalyticsError {
    /// Returns the component that raised the error, if any.
    pub fn component(&self) -> Option<Component> {
        match self {
            AnalyticsError::EmptyBatch { component }
            | AnalyticsError::InsufficientData { component, .. }
            | AnalyticsError::UnknownCategory { component, .. }
            | AnalyticsError::InvalidInput { component, .. }
            | AnalyticsError::Model { component, .. } => Some(*component),
            AnalyticsError::SourceUnavailable(_) => None,
        }
    }

    /// Short machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::EmptyBatch { .. } => "EmptyBatch",
            AnalyticsError::InsufficientData { .. } => "InsufficientData",
            AnalyticsError::UnknownCategory { .. } => "UnknownCategory",
            AnalyticsError::SourceUnavailable(_) => "SourceUnavailable",
            AnalyticsError::InvalidInput { .. } => "InvalidInput",
            AnalyticsError::Model { .. } => "Model",
        }
    }

    pub(crate) fn model(component: Component, err: impl fmt::Display) -> Self {
        AnalyticsError::Model {
            component,
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyticsError::EmptyBatch { component } => {
                write!(f, "{}: the purchase batch is empty", component)
            }
            AnalyticsError::InsufficientData {
                component,
                required,
                found,
            } => write!(
                f,
                "{}: insufficient data (need at least {}, found {})",
                component, required, found
            ),
            AnalyticsError::UnknownCategory { component, label } => {
                write!(f, "{}: unknown category '{}'", component, label)
            }
            AnalyticsError::SourceUnavailable(err) => {
                write!(f, "purchase source unavailable: {}", err)
            }
            AnalyticsError::InvalidInput { component, reason } => {
                write!(f, "{}: invalid input: {}", component, reason)
            }
            AnalyticsError::Model { component, reason } => {
                write!(f, "{}: model training failed: {}", component, reason)
            }
        }
    }
}

impl std::error::Error for AnalyticsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalyticsError::SourceUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SourceError> for AnalyticsError {
    fn from(err: SourceError) -> Self {
        AnalyticsError::SourceUnavailable(err)
    }
}
