//! Segmentation Engine
//!
//! Standardizes the profile features, partitions customers into four k-means
//! clusters and names each cluster by its spend rank. Raw cluster ids from the
//! clustering algorithm never leave this module: every externally visible
//! cluster is identified by its rank (0 = highest mean spend).

use crate::error::{AnalyticsError, Component};
use crate::profile::CustomerProfile;
use linfa::traits::{Fit, Predict, Transformer};
use linfa::Dataset;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Number of customer segments.
pub const CLUSTER_COUNT: usize = 4;

/// Human-facing name of a spend-ranked cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Persona {
    #[serde(rename = "VIP")]
    Vip,
    Loyal,
    Occasional,
    #[serde(rename = "New/Budget")]
    NewBudget,
}

impl Persona {
    /// Personas in spend-rank order.
    pub const ALL: [Persona; CLUSTER_COUNT] = [
        Persona::Vip,
        Persona::Loyal,
        Persona::Occasional,
        Persona::NewBudget,
    ];

    /// Persona bound to a spend rank, or `None` past the last rank.
    pub fn from_rank(rank: usize) -> Option<Persona> {
        Self::ALL.get(rank).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Vip => "VIP",
            Persona::Loyal => "Loyal",
            Persona::Occasional => "Occasional",
            Persona::NewBudget => "New/Budget",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clustering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationParams {
    /// Seed for centroid initialization
    pub seed: u64,
    /// Maximum Lloyd iterations per run
    pub max_iterations: u64,
    /// Convergence tolerance on centroid movement
    pub tolerance: f64,
    /// Independent initializations; the lowest-inertia run wins
    pub n_runs: usize,
}

impl SegmentationParams {
    pub fn with_seed(seed: u64) -> Self {
        SegmentationParams {
            seed,
            ..Self::default()
        }
    }
}

impl Default for SegmentationParams {
    fn default() -> Self {
        SegmentationParams {
            seed: 42,
            max_iterations: 300,
            tolerance: 1e-4,
            n_runs: 10,
        }
    }
}

/// Zero-mean, unit-variance columns fitted on this batch.
///
/// A zero-variance column keeps a scale of 1 and standardizes to 0.
fn standardize(features: Array2<f64>) -> Result<Array2<f64>, AnalyticsError> {
    let dataset = Dataset::new(features.clone(), Array1::<usize>::zeros(features.nrows()));
    let scaler = LinearScaler::standard()
        .fit(&dataset)
        .map_err(|e| AnalyticsError::model(Component::Segmentation, e))?;
    Ok(scaler.transform(features))
}

/// Summary of one spend-ranked cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster_rank: usize,
    pub mean_spend: f64,
    pub mean_trips: f64,
    pub mean_destinations: f64,
    pub persona_name: Persona,
}

/// Segment assigned to one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSegment {
    pub customer_id: String,
    pub cluster_rank: usize,
    pub persona_name: Persona,
}

/// Number of customers carrying a persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentCount {
    pub persona_name: Persona,
    pub count: usize,
}

/// Result of segmenting one batch of profiles.
#[derive(Debug, Clone)]
pub struct Segmentation {
    assignments: Vec<CustomerSegment>,
    clusters: Vec<ClusterSummary>,
}

impl Segmentation {
    /// Per-customer segments, in profile order.
    pub fn assignments(&self) -> &[CustomerSegment] {
        &self.assignments
    }

    /// Cluster summaries ordered by rank.
    pub fn clusters(&self) -> &[ClusterSummary] {
        &self.clusters
    }

    /// Persona of a customer, if the customer was part of the batch.
    pub fn persona_of(&self, customer_id: &str) -> Option<Persona> {
        self.assignments
            .iter()
            .find(|segment| segment.customer_id == customer_id)
            .map(|segment| segment.persona_name)
    }

    /// Customers per persona, by count descending then rank.
    pub fn distribution(&self) -> Vec<SegmentCount> {
        let mut counts: BTreeMap<Persona, usize> = BTreeMap::new();
        for segment in &self.assignments {
            *counts.entry(segment.persona_name).or_insert(0) += 1;
        }
        let mut distribution: Vec<SegmentCount> = counts
            .into_iter()
            .map(|(persona_name, count)| SegmentCount {
                persona_name,
                count,
            })
            .collect();
        distribution.sort_by_key(|entry| (Reverse(entry.count), entry.persona_name));
        distribution
    }
}

fn feature_matrix(profiles: &[CustomerProfile]) -> Array2<f64> {
    let mut features: Array2<f64> = Array2::zeros((profiles.len(), 3));
    for (mut row, profile) in features.outer_iter_mut().zip(profiles) {
        row.assign(&Array1::from(profile.features().to_vec()));
    }
    features
}

fn distinct_rows(profiles: &[CustomerProfile]) -> usize {
    profiles
        .iter()
        .map(|profile| profile.features().map(f64::to_bits))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Maps each raw cluster id to its spend rank.
///
/// Clusters are ordered by mean `total_spend` descending; equal means keep
/// the lower raw id first. Returns `rank_of[raw_id]`.
pub(crate) fn rank_clusters(raw_labels: &[usize], profiles: &[CustomerProfile]) -> Vec<usize> {
    let mut spend = [0.0_f64; CLUSTER_COUNT];
    let mut sizes = [0_usize; CLUSTER_COUNT];
    for (&label, profile) in raw_labels.iter().zip(profiles) {
        spend[label] += profile.total_spend;
        sizes[label] += 1;
    }

    let mut order: Vec<usize> = (0..CLUSTER_COUNT).collect();
    order.sort_by_key(|&raw| {
        let mean = if sizes[raw] == 0 {
            f64::NEG_INFINITY
        } else {
            spend[raw] / sizes[raw] as f64
        };
        (Reverse(OrderedFloat(mean)), raw)
    });

    let mut rank_of = vec![0; CLUSTER_COUNT];
    for (rank, raw) in order.into_iter().enumerate() {
        rank_of[raw] = rank;
    }
    rank_of
}

/// Segments customers into four spend-ranked personas.
///
/// The same profiles and seed always produce the same assignment.
///
/// # Errors
/// - `AnalyticsError::EmptyBatch` if `profiles` is empty
/// - `AnalyticsError::InsufficientData` if there are fewer than four
///   customers, fewer than four distinct feature vectors, or the fit leaves a
///   cluster empty
/// - `AnalyticsError::Model` if k-means fails to fit
pub fn segment_customers(
    profiles: &[CustomerProfile],
    params: &SegmentationParams,
) -> Result<Segmentation, AnalyticsError> {
    if profiles.is_empty() {
        return Err(AnalyticsError::EmptyBatch {
            component: Component::Segmentation,
        });
    }
    if profiles.len() < CLUSTER_COUNT {
        return Err(AnalyticsError::InsufficientData {
            component: Component::Segmentation,
            required: CLUSTER_COUNT,
            found: profiles.len(),
        });
    }
    let distinct = distinct_rows(profiles);
    if distinct < CLUSTER_COUNT {
        return Err(AnalyticsError::InsufficientData {
            component: Component::Segmentation,
            required: CLUSTER_COUNT,
            found: distinct,
        });
    }

    let raw_features = feature_matrix(profiles);
    let standardized = standardize(raw_features)?;

    // Unsupervised fit, targets are placeholders
    let targets: Array1<usize> = Array1::zeros(standardized.nrows());
    let dataset = Dataset::new(standardized, targets);
    let rng = StdRng::seed_from_u64(params.seed);
    let model: KMeans<f64, L2Dist> = KMeans::params_with(CLUSTER_COUNT, rng, L2Dist)
        .n_runs(params.n_runs)
        .max_n_iterations(params.max_iterations)
        .tolerance(params.tolerance)
        .fit(&dataset)
        .map_err(|e| AnalyticsError::model(Component::Segmentation, e))?;
    let raw_labels: Array1<usize> = model.predict(&dataset);
    let raw_labels = raw_labels.to_vec();

    let mut sizes = [0_usize; CLUSTER_COUNT];
    for &label in &raw_labels {
        sizes[label] += 1;
    }
    let non_empty = sizes.iter().filter(|&&size| size > 0).count();
    if non_empty < CLUSTER_COUNT {
        return Err(AnalyticsError::InsufficientData {
            component: Component::Segmentation,
            required: CLUSTER_COUNT,
            found: non_empty,
        });
    }

    let rank_of = rank_clusters(&raw_labels, profiles);

    let mut sums = [[0.0_f64; 3]; CLUSTER_COUNT];
    for (&label, profile) in raw_labels.iter().zip(profiles) {
        let rank = rank_of[label];
        for (sum, value) in sums[rank].iter_mut().zip(profile.features()) {
            *sum += value;
        }
    }

    let mut rank_sizes = [0_usize; CLUSTER_COUNT];
    for (raw, &size) in sizes.iter().enumerate() {
        rank_sizes[rank_of[raw]] = size;
    }

    let clusters: Vec<ClusterSummary> = Persona::ALL
        .iter()
        .enumerate()
        .map(|(rank, &persona)| {
            let n = rank_sizes[rank] as f64;
            ClusterSummary {
                cluster_rank: rank,
                mean_spend: sums[rank][0] / n,
                mean_trips: sums[rank][1] / n,
                mean_destinations: sums[rank][2] / n,
                persona_name: persona,
            }
        })
        .collect();

    let assignments: Vec<CustomerSegment> = raw_labels
        .iter()
        .zip(profiles)
        .map(|(&label, profile)| {
            let rank = rank_of[label];
            CustomerSegment {
                customer_id: profile.customer_id.clone(),
                cluster_rank: rank,
                persona_name: Persona::ALL[rank],
            }
        })
        .collect();

    debug!(
        customer_count = profiles.len(),
        seed = params.seed,
        cluster_sizes = ?rank_sizes,
        "segmented customers"
    );

    Ok(Segmentation {
        assignments,
        clusters,
    })
}
