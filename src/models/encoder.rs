use crate::error::{AnalyticsError, Component};
use std::collections::BTreeSet;

/// Dense integer codes for a categorical vocabulary fixed at training time.
///
/// Codes follow the sorted order of the labels, so the same label set always
/// encodes the same way regardless of the order it was observed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEncoder {
    labels: Vec<String>,
    component: Component,
}

impl RouteEncoder {
    /// Builds the vocabulary from every label in `labels`.
    pub fn fit<I, S>(labels: I, component: Component) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        RouteEncoder {
            labels: vocabulary.into_iter().collect(),
            component,
        }
    }

    /// Code of `label`.
    ///
    /// # Errors
    /// Returns `AnalyticsError::UnknownCategory` for a label outside the vocabulary.
    pub fn encode(&self, label: &str) -> Result<usize, AnalyticsError> {
        self.labels
            .binary_search_by(|known| known.as_str().cmp(label))
            .map_err(|_| AnalyticsError::UnknownCategory {
                component: self.component,
                label: label.to_string(),
            })
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.encode(label).is_ok()
    }

    /// Vocabulary in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
