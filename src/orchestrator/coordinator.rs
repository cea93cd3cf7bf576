// Tue Jan 13 2026 - Alex

use crate::engine::{ReportSummary, TaskReport};
use crate::orchestrator::collector::ResultCollector;
use crate::table::{MergeError, ResultTable, TableMerger};
use serde::{Deserialize, Serialize};

/// What the merge does when some units did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed or cancelled unit fails the merge.
    #[default]
    Abort,
    /// Merge what was collected and report the missing units.
    MergeAvailable,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: ResultTable,
    pub missing_units: Vec<String>,
    pub summary: ReportSummary,
}

impl MergeOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing_units.is_empty()
    }
}

/// Parent task of a run. Owns the collector and is its only reader.
pub struct MergeCoordinator {
    collector: ResultCollector,
    merger: TableMerger,
    policy: FailurePolicy,
}

impl MergeCoordinator {
    pub fn new(collector: ResultCollector, merger: TableMerger, policy: FailurePolicy) -> Self {
        Self {
            collector,
            merger,
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Runs once every unit has reached a terminal state.
    pub fn run(self, reports: &[TaskReport]) -> Result<MergeOutcome, MergeError> {
        let summary = ReportSummary::from_reports(reports);
        let missing_units: Vec<String> = reports.iter()
            .filter(|r| !r.is_completed())
            .map(|r| match r.error_message() {
                Some(reason) => format!("{} ({})", r.name, reason),
                None => format!("{} ({})", r.name, r.state),
            })
            .collect();

        if !missing_units.is_empty() {
            match self.policy {
                FailurePolicy::Abort => {
                    log::error!("{} of {} units did not complete", missing_units.len(), reports.len());
                    return Err(MergeError::UnitsFailed { units: missing_units });
                }
                FailurePolicy::MergeAvailable => {
                    log::warn!("Merging without {} unit(s): {}", missing_units.len(), missing_units.join(", "));
                }
            }
        }

        let mut partials = self.collector.drain();
        // Batch order keeps the column order stable across runs.
        partials.sort_by_key(|p| p.batch);
        log::debug!("Merging {} partial tables", partials.len());

        let merger = self.merger.fill_missing(self.policy == FailurePolicy::MergeAvailable);
        let table = merger.merge(partials.into_iter().map(|p| p.table))?;

        log::info!("Merged {} rows from {} units", table.row_count(), summary.completed);
        Ok(MergeOutcome {
            table,
            missing_units,
            summary,
        })
    }
}
