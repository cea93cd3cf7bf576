// Tue Jan 13 2026 - Alex

pub mod handle;
pub mod result;
pub mod scheduler;
pub mod task;

pub use handle::JobHandle;
pub use result::{JobError, ReportSummary, TaskReport};
pub use scheduler::{SchedulerError, TaskGraph, TaskScheduler};
pub use task::{CancelToken, Subtask, TaskError, TaskEvent, TaskId, TaskListener, TaskState};
