// Tue Jan 13 2026 - Alex

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Cancelled)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("Task was cancelled")]
    Cancelled,
    #[error("Execution error: {0}")]
    Failed(String),
    #[error("Task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub fn failed<E: fmt::Display>(err: E) -> Self {
        TaskError::Failed(err.to_string())
    }

    /// State a task lands in when it ends with this error.
    pub fn terminal_state(&self) -> TaskState {
        match self {
            TaskError::Cancelled => TaskState::Cancelled,
            _ => TaskState::Failed,
        }
    }
}

/// Cancellation flag shared between a job, its tasks, and the caller.
/// A child token reports cancelled when either it or its parent is.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    parent: Option<Arc<AtomicBool>>,
    own: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            parent: Some(self.own.clone()),
            own: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.own.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.own.load(Ordering::SeqCst)
            || self.parent.as_ref().map(|p| p.load(Ordering::SeqCst)).unwrap_or(false)
    }

    pub fn check(&self) -> Result<(), TaskError> {
        if self.is_cancelled() {
            Err(TaskError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskEvent {
    pub task: TaskId,
    pub name: String,
    pub state: TaskState,
    pub is_parent: bool,
    pub detail: Option<String>,
}

pub type TaskListener = Arc<dyn Fn(&TaskEvent) + Send + Sync>;

pub type SubtaskFn = Box<dyn FnOnce(&CancelToken) -> Result<(), TaskError> + Send>;

pub struct Subtask {
    id: TaskId,
    name: String,
    run: SubtaskFn,
}

impl Subtask {
    pub fn new<F>(name: &str, run: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Result<(), TaskError> + Send + 'static,
    {
        Self {
            id: TaskId::next(),
            name: name.to_string(),
            run: Box::new(run),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (TaskId, String, SubtaskFn) {
        (self.id, self.name, self.run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(b > a);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
    }

    #[test]
    fn test_cancel_propagates_to_children_only() {
        let job = CancelToken::new();
        let a = job.child();
        let b = job.child();

        a.cancel();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!job.is_cancelled());

        job.cancel();
        assert!(b.is_cancelled());
        assert_eq!(b.check(), Err(TaskError::Cancelled));
    }
}
