// Tue Jan 13 2026 - Alex

use crate::engine::task::{TaskError, TaskId, TaskState};
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of one subtask, handed to the parent task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub id: TaskId,
    pub name: String,
    pub state: TaskState,
    pub error: Option<TaskError>,
    pub duration: Duration,
}

impl TaskReport {
    pub fn is_completed(&self) -> bool {
        self.state == TaskState::Completed
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl ReportSummary {
    pub fn from_reports(reports: &[TaskReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match report.state {
                TaskState::Completed => summary.completed += 1,
                TaskState::Failed => summary.failed += 1,
                TaskState::Cancelled => summary.cancelled += 1,
                TaskState::Pending | TaskState::Running => {}
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.completed + self.failed + self.cancelled
    }

    pub fn all_completed(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// Why a job produced no value.
#[derive(Error, Debug)]
pub enum JobError<E: std::error::Error + 'static> {
    #[error("Job was cancelled")]
    Cancelled,
    #[error("Job panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Failed(E),
    #[error("Job thread exited without a result")]
    Disconnected,
}

impl<E: std::error::Error + 'static> JobError<E> {
    pub fn state(&self) -> TaskState {
        match self {
            JobError::Cancelled => TaskState::Cancelled,
            _ => TaskState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(state: TaskState) -> TaskReport {
        TaskReport {
            id: TaskId::next(),
            name: "unit".to_string(),
            state,
            error: None,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_summary() {
        let reports = vec![
            report(TaskState::Completed),
            report(TaskState::Completed),
            report(TaskState::Failed),
            report(TaskState::Cancelled),
        ];
        let summary = ReportSummary::from_reports(&reports);

        assert_eq!(summary, ReportSummary { completed: 2, failed: 1, cancelled: 1 });
        assert_eq!(summary.total(), 4);
        assert!(!summary.all_completed());
        assert!(ReportSummary::from_reports(&reports[..2]).all_completed());
    }
}
