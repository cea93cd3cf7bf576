// Tue Jan 13 2026 - Alex

use crate::config::Config;
use crate::engine::{
    JobHandle, ReportSummary, TaskEvent, TaskGraph, TaskId, TaskListener, TaskReport, TaskScheduler, TaskState,
};
use crate::orchestrator::collector::ResultCollector;
use crate::orchestrator::coordinator::{FailurePolicy, MergeCoordinator, MergeOutcome};
use crate::orchestrator::error::{RunError, ValidationError};
use crate::orchestrator::partition::{batch_size, partition, Batch};
use crate::orchestrator::run_config::RunConfig;
use crate::orchestrator::unit::{ComputeUnit, UnitInputs};
use crate::output::{OutputError, OutputFormat, SinkRegistry};
use crate::stats::{column_names, RasterSampler, SampledKernel, StatRegistry, StatisticsKernel};
use crate::table::{MergeError, ResultTable, TableMerger};
use crate::ui::progress::ProgressTracker;
use crate::utils::scoped_timer;
use itertools::Itertools;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Callbacks for one run. Both channels are independent of any UI.
pub trait RunObserver: Send + Sync {
    /// Cumulative percent, delivered in non-decreasing order.
    fn on_progress(&self, _percent: u8) {}

    fn on_unit(&self, _event: &TaskEvent) {}

    /// The coordinator reached a terminal state.
    fn on_complete(&self, _state: TaskState) {}
}

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub batches: Vec<Batch>,
    pub batch_size: usize,
    pub feature_count: usize,
    pub parallelism: usize,
}

impl RunPlan {
    pub fn unit_count(&self) -> usize {
        self.batches.len()
    }
}

/// State that lives for exactly one run: the plan, the collector and what
/// the coordinator needs. Consumed when the task graph is built.
pub struct RunContext {
    plan: RunPlan,
    inputs: Arc<UnitInputs>,
    collector: ResultCollector,
    merger: TableMerger,
    policy: FailurePolicy,
}

impl RunContext {
    pub fn new(plan: RunPlan, inputs: UnitInputs, merger: TableMerger, policy: FailurePolicy) -> Self {
        Self {
            plan,
            inputs: Arc::new(inputs),
            collector: ResultCollector::new(),
            merger,
            policy,
        }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// One subtask per batch under a single merge parent. Unit ids come
    /// back in batch order.
    pub fn into_graph(self) -> (TaskGraph<MergeOutcome, MergeError>, Vec<TaskId>) {
        let RunContext { plan, inputs, mut collector, merger, policy } = self;
        let share_source = plan.parallelism == 1;

        let units: Vec<ComputeUnit> = plan.batches
            .into_iter()
            .map(|batch| {
                let slot = collector.slot(batch.index());
                ComputeUnit::new(batch, inputs.clone(), slot).sharing_source(share_source)
            })
            .collect();

        let coordinator = MergeCoordinator::new(collector, merger, policy);
        let mut graph = TaskGraph::new("merge", move |reports: &[TaskReport]| coordinator.run(reports));

        let ids = units.into_iter()
            .map(|unit| graph.add_subtask(unit.into_subtask()))
            .collect();

        (graph, ids)
    }
}

/// A submitted run.
pub struct RunHandle {
    job: JobHandle<MergeOutcome, MergeError>,
    units: Vec<TaskId>,
    progress: Arc<ProgressTracker>,
}

impl RunHandle {
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn progress(&self) -> u8 {
        self.progress.percent()
    }

    pub fn cancel(&self) {
        self.job.cancel();
    }

    /// Cancels the unit for batch `index`. False for an unknown index.
    pub fn cancel_unit(&self, index: usize) -> bool {
        self.units.get(index)
            .map(|id| self.job.cancel_task(*id))
            .unwrap_or(false)
    }

    pub fn state(&self) -> TaskState {
        self.job.parent_state()
    }

    pub fn unit_states(&self) -> Vec<TaskState> {
        self.units.iter()
            .map(|id| self.job.state(*id).unwrap_or(TaskState::Pending))
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.job.is_finished()
    }

    pub fn wait(self) -> Result<MergeOutcome, RunError> {
        self.job.wait().map_err(RunError::from)
    }

    pub fn wait_timeout(self, timeout: Duration) -> Result<Result<MergeOutcome, RunError>, Self> {
        let RunHandle { job, units, progress } = self;
        match job.wait_timeout(timeout) {
            Ok(result) => Ok(result.map_err(RunError::from)),
            Err(job) => Err(RunHandle { job, units, progress }),
        }
    }
}

/// Result of [`RunController::execute`]: the merged table plus what
/// happened when it was written out.
#[derive(Debug)]
pub struct RunOutcome {
    pub table: ResultTable,
    pub missing_units: Vec<String>,
    pub summary: ReportSummary,
    pub written: Option<PathBuf>,
    pub output_error: Option<OutputError>,
}

pub struct RunController {
    config: Config,
    scheduler: TaskScheduler,
    registry: Arc<StatRegistry>,
    kernel: Arc<dyn StatisticsKernel>,
    sinks: SinkRegistry,
}

impl RunController {
    pub fn new(
        config: Config,
        kernel: Arc<dyn StatisticsKernel>,
        registry: Arc<StatRegistry>,
    ) -> Result<Self, RunError> {
        config.validate()?;
        let scheduler = TaskScheduler::new(config.worker_threads)?;
        log::debug!("Run controller ready with {} worker threads", scheduler.thread_count());

        Ok(Self {
            config,
            scheduler,
            registry,
            kernel,
            sinks: SinkRegistry::default(),
        })
    }

    /// Controller backed by the sampled kernel over `sampler`.
    pub fn with_sampler(
        config: Config,
        sampler: Arc<dyn RasterSampler>,
        registry: Arc<StatRegistry>,
    ) -> Result<Self, RunError> {
        let kernel = Arc::new(SampledKernel::new(sampler, registry.clone()));
        Self::new(config, kernel, registry)
    }

    pub fn with_sinks(mut self, sinks: SinkRegistry) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &StatRegistry {
        &self.registry
    }

    pub fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    pub fn validate(&self, run: &RunConfig) -> Result<(), ValidationError> {
        let features = match run.features() {
            Some(features) if !run.rasters().is_empty() => features,
            _ => return Err(ValidationError::MissingLayers),
        };

        let id_field = run.id_field()
            .filter(|f| !f.trim().is_empty())
            .ok_or(ValidationError::MissingIdField)?;

        let output = run.output()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ValidationError::MissingOutputPath)?;

        let format = OutputFormat::from_path(output).ok_or_else(|| {
            let ext = output.extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            ValidationError::UnsupportedExtension(ext)
        })?;

        if format == OutputFormat::Parquet && !self.sinks.supports(OutputFormat::Parquet) {
            return Err(ValidationError::ParquetUnavailable);
        }

        if !run.has_statistics() {
            return Err(ValidationError::NoStatistics);
        }

        if !format.supports_arrays() && !run.arrays().is_empty() {
            return Err(ValidationError::ArraysWithParquet(run.arrays().to_vec()));
        }

        if run.parallelism() == 0 {
            return Err(ValidationError::InvalidParallelism);
        }

        let schema = features.schema();
        if !schema.contains(id_field) {
            return Err(ValidationError::IdFieldNotFound {
                layer: features.name().to_string(),
                field: id_field.to_string(),
            });
        }
        if !schema.is_integer(id_field) {
            return Err(ValidationError::IdFieldNotInteger(id_field.to_string()));
        }

        let specs = run.stat_specs();
        for spec in &specs {
            if !self.registry.supports(spec) {
                return Err(ValidationError::UnknownStatistic {
                    name: spec.name.clone(),
                    kind: spec.kind,
                });
            }
            if run.weights().is_none() && self.registry.requires_weights(&spec.name) {
                return Err(ValidationError::WeightsRequired(spec.name.clone()));
            }
        }

        // Repeated statistics or rasters sharing a file stem collide here.
        if let Some(column) = column_names(run.rasters(), &specs).into_iter().duplicates().next() {
            return Err(ValidationError::DuplicateColumn(column));
        }

        Ok(())
    }

    pub fn plan(&self, run: &RunConfig) -> Result<RunPlan, ValidationError> {
        self.validate(run)?;

        let ids = match run.features() {
            Some(features) => features.feature_ids(),
            None => return Err(ValidationError::MissingLayers),
        };
        let parallelism = run.parallelism();

        Ok(RunPlan {
            batch_size: batch_size(ids.len(), parallelism),
            batches: partition(&ids, parallelism),
            feature_count: ids.len(),
            parallelism,
        })
    }

    /// Validates, partitions and hands the run to the scheduler. Returns as
    /// soon as the graph is submitted.
    pub fn submit(
        &self,
        run: &RunConfig,
        observer: Option<Arc<dyn RunObserver>>,
    ) -> Result<RunHandle, RunError> {
        let plan = self.plan(run)?;
        let (source, id_column) = match (run.features(), run.id_field()) {
            (Some(source), Some(id)) => (source.clone(), id.to_string()),
            (None, _) => return Err(ValidationError::MissingLayers.into()),
            (_, None) => return Err(ValidationError::MissingIdField.into()),
        };

        log::info!(
            "Computing {} features in {} batches of up to {} ({} rasters)",
            plan.feature_count,
            plan.unit_count(),
            plan.batch_size,
            run.rasters().len()
        );

        let inputs = UnitInputs {
            source,
            kernel: self.kernel.clone(),
            rasters: run.rasters().to_vec(),
            weights: run.weights().map(str::to_string),
            stats: run.stat_specs(),
            id_column: id_column.clone(),
        };
        let merger = TableMerger::new(&id_column)
            .with_columns(column_names(&inputs.rasters, &inputs.stats))
            .with_prefix(run.prefix())
            .with_conflict_policy(self.config.key_conflict_policy);

        let context = RunContext::new(plan, inputs, merger, self.config.failure_policy);
        let progress = Arc::new(ProgressTracker::new(context.plan().unit_count()));
        let (graph, units) = context.into_graph();

        let listener = progress_listener(progress.clone(), observer);
        let job = self.scheduler.submit(graph, Some(listener))?;

        Ok(RunHandle { job, units, progress })
    }

    /// Submits, waits, and writes the merged table to the run's output. A
    /// failed write is logged and reported in the outcome; the table is kept.
    pub fn execute(
        &self,
        run: &RunConfig,
        observer: Option<Arc<dyn RunObserver>>,
    ) -> Result<RunOutcome, RunError> {
        let _timer = scoped_timer("zonal statistics run");
        let merged = self.submit(run, observer)?.wait().map_err(|err| {
            let err = RunError::from(err);
            log::error!("Run did not produce a merged table: {}", err);
            err
        })?;

        let (written, output_error) = match run.output() {
            Some(path) => match self.sinks.write(&merged.table, path) {
                Ok(_) => (Some(path.to_path_buf()), None),
                Err(err) => {
                    log::error!("Failed to write {}: {}", path.display(), err);
                    (None, Some(err))
                }
            },
            None => (None, None),
        };

        Ok(RunOutcome {
            table: merged.table,
            missing_units: merged.missing_units,
            summary: merged.summary,
            written,
            output_error,
        })
    }
}

fn progress_listener(progress: Arc<ProgressTracker>, observer: Option<Arc<dyn RunObserver>>) -> TaskListener {
    let reported = Mutex::new(0u8);

    Arc::new(move |event: &TaskEvent| {
        // Held across the callbacks so observers see progress in order.
        let mut last = reported.lock();

        let percent = match (event.is_parent, event.state) {
            (true, TaskState::Completed) => progress.finish(),
            (false, TaskState::Completed) => progress.unit_completed(),
            _ => progress.percent(),
        };

        if !event.is_parent && event.state == TaskState::Failed {
            log::warn!("{} failed: {}", event.name, event.detail.as_deref().unwrap_or("unknown error"));
        }

        let Some(observer) = &observer else {
            return;
        };

        if !event.is_parent {
            observer.on_unit(event);
        }
        if percent > *last {
            *last = percent;
            observer.on_progress(percent);
        }
        if event.is_parent && event.state.is_terminal() {
            observer.on_complete(event.state);
        }
    })
}
