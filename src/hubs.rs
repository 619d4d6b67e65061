//! Hub Centrality Analyzer
//!
//! Builds the simple directed route graph of a batch and ranks cities by
//! normalized degree centrality. Edges come from outbound legs only; repeated
//! trips on the same route collapse into one edge.

use crate::error::{AnalyticsError, Component};
use crate::purchase::PurchaseRecord;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::Serialize;
use std::cmp::Reverse;
use tracing::debug;

/// Number of cities reported as hubs.
pub const HUB_LIMIT: usize = 10;

/// A hub city with its degree centrality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubCentrality {
    pub city: String,
    pub centrality: f64,
}

/// Arrival and departure connectivity of a hub city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubDegree {
    pub city: String,
    pub in_degree: usize,
    pub out_degree: usize,
}

/// Simple directed graph of observed routes.
#[derive(Debug, Clone)]
pub struct RouteGraph<'a> {
    graph: DiGraphMap<&'a str, ()>,
}

impl<'a> RouteGraph<'a> {
    /// Builds the graph from the outbound leg of every record.
    pub fn from_records(records: &'a [PurchaseRecord]) -> Self {
        let mut graph = DiGraphMap::new();
        for record in records {
            // add_edge on an existing pair replaces the weight, so the graph stays simple
            graph.add_edge(record.origin_out.as_str(), record.destination_out.as_str(), ());
        }
        RouteGraph { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Cities in the graph, in insertion order.
    pub fn cities(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.graph.nodes()
    }

    /// Number of distinct cities with a route into `city`.
    pub fn in_degree(&self, city: &'a str) -> usize {
        self.graph
            .neighbors_directed(city, Direction::Incoming)
            .count()
    }

    /// Number of distinct cities reachable from `city` in one leg.
    pub fn out_degree(&self, city: &'a str) -> usize {
        self.graph
            .neighbors_directed(city, Direction::Outgoing)
            .count()
    }

    /// `(in_degree + out_degree) / (N - 1)`, or 0 for a graph with fewer than two nodes.
    pub fn degree_centrality(&self, city: &'a str) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        (self.in_degree(city) + self.out_degree(city)) as f64 / (n - 1) as f64
    }

    /// The `limit` most connected cities, by total degree descending then name ascending.
    pub fn ranked_cities(&self, limit: usize) -> Vec<&'a str> {
        let mut ranked: Vec<(&'a str, usize)> = self
            .graph
            .nodes()
            .map(|city| (city, self.in_degree(city) + self.out_degree(city)))
            .collect();
        ranked.sort_by_key(|&(city, degree)| (Reverse(degree), city));
        ranked.truncate(limit);
        ranked.into_iter().map(|(city, _)| city).collect()
    }
}

fn non_empty_graph(records: &[PurchaseRecord]) -> Result<RouteGraph<'_>, AnalyticsError> {
    if records.is_empty() {
        return Err(AnalyticsError::EmptyBatch {
            component: Component::Hubs,
        });
    }
    let graph = RouteGraph::from_records(records);
    debug!(
        record_count = records.len(),
        node_count = graph.node_count(),
        edge_count = graph.edge_count(),
        "built route graph"
    );
    Ok(graph)
}

/// Top-10 hub cities by degree centrality.
///
/// Returns fewer entries when the graph has fewer than ten cities.
///
/// # Errors
/// Returns `AnalyticsError::EmptyBatch` if `records` is empty.
pub fn top_hubs(records: &[PurchaseRecord]) -> Result<Vec<HubCentrality>, AnalyticsError> {
    let graph = non_empty_graph(records)?;
    Ok(graph
        .ranked_cities(HUB_LIMIT)
        .into_iter()
        .map(|city| HubCentrality {
            city: city.to_string(),
            centrality: graph.degree_centrality(city),
        })
        .collect())
}

/// In- and out-degree of the top-10 hub cities, in hub rank order.
///
/// Degrees are only computed for the selected hubs, not the whole graph.
///
/// # Errors
/// Returns `AnalyticsError::EmptyBatch` if `records` is empty.
pub fn hub_details(records: &[PurchaseRecord]) -> Result<Vec<HubDegree>, AnalyticsError> {
    let graph = non_empty_graph(records)?;
    Ok(graph
        .ranked_cities(HUB_LIMIT)
        .into_iter()
        .map(|city| HubDegree {
            city: city.to_string(),
            in_degree: graph.in_degree(city),
            out_degree: graph.out_degree(city),
        })
        .collect())
}
