//! Training pipeline
//!
//! Runs every batch component over one purchase batch as a DAG of stages.
//! Stages whose inputs failed are skipped; independent stages still run.

use crate::error::AnalyticsError;
use crate::hubs::{top_hubs, HubCentrality};
use crate::models::next_route::{train_next_route, NextRouteEvaluation};
use crate::models::repurchase::{train_repurchase, RepurchaseEvaluation};
use crate::profile::{build_profiles, CustomerProfile};
use crate::purchase::PurchaseRecord;
use crate::segmentation::{segment_customers, ClusterSummary, SegmentCount, SegmentationParams};
use crate::source::PurchaseSource;
use daggy::{Dag, NodeIndex, Walker};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::{info, warn};

/// One unit of work in the training pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Profiles,
    Hubs,
    Segmentation,
    Repurchase,
    NextRoute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Profiles => "profiles",
            Stage::Hubs => "hubs",
            Stage::Segmentation => "segmentation",
            Stage::Repurchase => "repurchase",
            Stage::NextRoute => "next_route",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Failed { kind: &'static str, message: String },
    /// Not run because an input stage did not complete
    Skipped { blocked_by: Stage },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    #[serde(flatten)]
    pub status: StageStatus,
}

/// Everything one pipeline run produced.
///
/// A field is `None` when its stage failed or was skipped; `stages` says which.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub seed: u64,
    pub record_count: usize,
    pub profile_count: Option<usize>,
    pub hubs: Option<Vec<HubCentrality>>,
    pub clusters: Option<Vec<ClusterSummary>>,
    pub segment_distribution: Option<Vec<SegmentCount>>,
    pub repurchase: Option<RepurchaseEvaluation>,
    pub next_route: Option<NextRouteEvaluation>,
    /// Outcomes in execution order
    pub stages: Vec<StageOutcome>,
}

impl TrainingReport {
    /// Outcome of `stage`, if the pipeline contains it.
    pub fn status(&self, stage: Stage) -> Option<&StageStatus> {
        self.stages
            .iter()
            .find(|outcome| outcome.stage == stage)
            .map(|outcome| &outcome.status)
    }

    /// True when every stage completed.
    pub fn is_complete(&self) -> bool {
        self.stages
            .iter()
            .all(|outcome| outcome.status == StageStatus::Completed)
    }
}

/// DAG of training stages with a shared seed.
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    dag: Dag<Stage, ()>,
    seed: u64,
}

impl TrainingPipeline {
    /// Builds the stage graph:
    /// `Profiles -> Segmentation`, `Profiles -> Repurchase`, with `Hubs` and
    /// `NextRoute` reading the batch directly.
    pub fn new(seed: u64) -> Self {
        let mut dag = Dag::new();
        let profiles = dag.add_node(Stage::Profiles);
        // add_child always creates a fresh node, so no edge can close a cycle
        dag.add_child(profiles, (), Stage::Segmentation);
        dag.add_child(profiles, (), Stage::Repurchase);
        dag.add_node(Stage::Hubs);
        dag.add_node(Stage::NextRoute);
        TrainingPipeline { dag, seed }
    }

    /// Stages that must complete before `stage` runs.
    pub fn dependencies(&self, stage: Stage) -> Vec<Stage> {
        self.index_of(stage)
            .map(|index| {
                self.dag
                    .parents(index)
                    .iter(&self.dag)
                    .map(|(_, parent)| self.dag[parent])
                    .collect()
            })
            .unwrap_or_default()
    }

    fn index_of(&self, stage: Stage) -> Option<NodeIndex> {
        self.dag
            .graph()
            .node_indices()
            .find(|&index| self.dag[index] == stage)
    }

    /// Kahn's algorithm seeded in insertion order, so the order is stable.
    fn execution_order(&self) -> Vec<NodeIndex> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .dag
            .graph()
            .node_indices()
            .map(|index| (index, 0))
            .collect();
        for edge in self.dag.raw_edges() {
            *in_degree.entry(edge.target()).or_insert(0) += 1;
        }

        let mut queue: VecDeque<NodeIndex> = self
            .dag
            .graph()
            .node_indices()
            .filter(|index| in_degree.get(index) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.dag.node_count());
        while let Some(index) = queue.pop_front() {
            order.push(index);
            for (_, child) in self.dag.children(index).iter(&self.dag) {
                if let Some(degree) = in_degree.get_mut(&child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }
        order
    }

    /// Stages in the order `run` executes them.
    pub fn stages(&self) -> Vec<Stage> {
        self.execution_order()
            .into_iter()
            .map(|index| self.dag[index])
            .collect()
    }

    /// Loads one batch from `source` and runs every stage over it.
    ///
    /// # Errors
    /// Returns `AnalyticsError::SourceUnavailable` if the batch cannot be
    /// loaded. Stage failures are recorded in the report instead.
    pub fn run(&self, source: &dyn PurchaseSource) -> Result<TrainingReport, AnalyticsError> {
        let records = source.load_batch()?;
        info!(source = %source.describe(), record_count = records.len(), "starting training run");
        Ok(self.run_batch(&records))
    }

    /// Runs every stage over `records`.
    pub fn run_batch(&self, records: &[PurchaseRecord]) -> TrainingReport {
        let mut report = TrainingReport {
            seed: self.seed,
            record_count: records.len(),
            profile_count: None,
            hubs: None,
            clusters: None,
            segment_distribution: None,
            repurchase: None,
            next_route: None,
            stages: Vec::new(),
        };
        let mut profiles: Option<Vec<CustomerProfile>> = None;
        let mut completed: HashMap<Stage, bool> = HashMap::new();

        for index in self.execution_order() {
            let stage = self.dag[index];
            let blocked_by = self
                .dependencies(stage)
                .into_iter()
                .find(|parent| completed.get(parent) != Some(&true));

            let status = match blocked_by {
                Some(parent) => StageStatus::Skipped { blocked_by: parent },
                None => match self.run_stage(stage, records, &mut profiles, &mut report) {
                    Ok(()) => StageStatus::Completed,
                    Err(err) => {
                        warn!(stage = stage.as_str(), error = %err, "training stage failed");
                        StageStatus::Failed {
                            kind: err.kind(),
                            message: err.to_string(),
                        }
                    }
                },
            };

            completed.insert(stage, status == StageStatus::Completed);
            report.stages.push(StageOutcome { stage, status });
        }

        info!(
            record_count = report.record_count,
            complete = report.is_complete(),
            "training run finished"
        );
        report
    }

    fn run_stage(
        &self,
        stage: Stage,
        records: &[PurchaseRecord],
        profiles: &mut Option<Vec<CustomerProfile>>,
        report: &mut TrainingReport,
    ) -> Result<(), AnalyticsError> {
        match stage {
            Stage::Profiles => {
                let built = build_profiles(records)?;
                report.profile_count = Some(built.len());
                *profiles = Some(built);
            }
            Stage::Hubs => {
                report.hubs = Some(top_hubs(records)?);
            }
            Stage::Segmentation => {
                let profiles = profiles.as_deref().unwrap_or_default();
                let segmentation =
                    segment_customers(profiles, &SegmentationParams::with_seed(self.seed))?;
                report.clusters = Some(segmentation.clusters().to_vec());
                report.segment_distribution = Some(segmentation.distribution());
            }
            Stage::Repurchase => {
                let profiles = profiles.as_deref().unwrap_or_default();
                let model = train_repurchase(profiles, self.seed)?;
                report.repurchase = Some(model.evaluation().clone());
            }
            Stage::NextRoute => {
                let model = train_next_route(records, self.seed)?;
                report.next_route = Some(model.evaluation().clone());
            }
        }
        Ok(())
    }
}
