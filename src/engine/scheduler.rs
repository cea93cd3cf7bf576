// Tue Jan 13 2026 - Alex

use crate::engine::handle::{JobHandle, JobShared};
use crate::engine::result::{JobError, TaskReport};
use crate::engine::task::{CancelToken, Subtask, TaskError, TaskId, TaskListener, TaskState};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use thiserror::Error;

pub type ParentFn<T, E> = Box<dyn FnOnce(&[TaskReport]) -> Result<T, E> + Send>;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Failed to build worker pool: {0}")]
    Pool(String),
    #[error("Failed to spawn job thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A parent task that runs once every subtask has reached a terminal state.
pub struct TaskGraph<T, E> {
    id: TaskId,
    name: String,
    subtasks: Vec<Subtask>,
    parent: ParentFn<T, E>,
}

impl<T, E> TaskGraph<T, E> {
    pub fn new<F>(name: &str, parent: F) -> Self
    where
        F: FnOnce(&[TaskReport]) -> Result<T, E> + Send + 'static,
    {
        Self {
            id: TaskId::next(),
            name: name.to_string(),
            subtasks: Vec::new(),
            parent: Box::new(parent),
        }
    }

    pub fn add_subtask(&mut self, subtask: Subtask) -> TaskId {
        let id = subtask.id();
        self.subtasks.push(subtask);
        id
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subtask_count(&self) -> usize {
        self.subtasks.len()
    }

    pub fn subtask_ids(&self) -> Vec<TaskId> {
        self.subtasks.iter().map(|s| s.id()).collect()
    }
}

pub struct TaskScheduler {
    pool: Arc<ThreadPool>,
    thread_count: usize,
}

impl TaskScheduler {
    pub fn new(thread_count: usize) -> Result<Self, SchedulerError> {
        let thread_count = thread_count.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|i| format!("zonal-worker-{}", i))
            .build()
            .map_err(|e| SchedulerError::Pool(e.to_string()))?;

        Ok(Self {
            pool: Arc::new(pool),
            thread_count,
        })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Starts the graph on a job thread and returns immediately.
    pub fn submit<T, E>(
        &self,
        graph: TaskGraph<T, E>,
        listener: Option<TaskListener>,
    ) -> Result<JobHandle<T, E>, SchedulerError>
    where
        T: Send + 'static,
        E: std::error::Error + Send + 'static,
    {
        let shared = Arc::new(JobShared::new(graph.id, &graph.subtasks, CancelToken::new()));
        let (sender, receiver) = channel();

        log::debug!(
            "Submitting {} ({}) with {} subtasks",
            graph.name,
            graph.id,
            graph.subtasks.len()
        );

        let pool = self.pool.clone();
        let job = shared.clone();
        let thread = thread::Builder::new()
            .name(format!("zonal-job-{}", graph.id.as_u64()))
            .spawn(move || {
                let result = drive(&pool, graph, &job, listener.as_ref());
                let _ = sender.send(result);
            })?;

        Ok(JobHandle::new(shared, receiver, thread))
    }
}

fn drive<T, E>(
    pool: &ThreadPool,
    graph: TaskGraph<T, E>,
    job: &JobShared,
    listener: Option<&TaskListener>,
) -> Result<T, JobError<E>>
where
    E: std::error::Error + 'static,
{
    let TaskGraph { id, name, subtasks, parent } = graph;
    job.transition(id, &name, TaskState::Running, None, listener);

    let reports = Mutex::new(Vec::with_capacity(subtasks.len()));

    // The scope returns only after every spawned subtask has finished.
    pool.scope(|scope| {
        for subtask in subtasks {
            let reports = &reports;
            scope.spawn(move |_| {
                let report = run_subtask(subtask, job, listener);
                reports.lock().push(report);
            });
        }
    });

    let mut reports = reports.into_inner();
    reports.sort_by_key(|r| r.id);

    if job.token().is_cancelled() {
        job.transition(id, &name, TaskState::Cancelled, None, listener);
        return Err(JobError::Cancelled);
    }

    match panic::catch_unwind(AssertUnwindSafe(|| parent(&reports))) {
        Ok(Ok(value)) => {
            job.transition(id, &name, TaskState::Completed, None, listener);
            Ok(value)
        }
        Ok(Err(err)) => {
            job.transition(id, &name, TaskState::Failed, Some(err.to_string()), listener);
            Err(JobError::Failed(err))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            job.transition(id, &name, TaskState::Failed, Some(message.clone()), listener);
            Err(JobError::Panicked(message))
        }
    }
}

fn run_subtask(subtask: Subtask, job: &JobShared, listener: Option<&TaskListener>) -> TaskReport {
    let (id, name, run) = subtask.into_parts();
    let token = job.token_for(id);
    let started = Instant::now();

    let outcome = if token.is_cancelled() {
        Err(TaskError::Cancelled)
    } else {
        job.transition(id, &name, TaskState::Running, None, listener);
        match panic::catch_unwind(AssertUnwindSafe(|| run(&token))) {
            Ok(result) => result,
            Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
        }
    };

    let (state, error) = match outcome {
        Ok(()) => (TaskState::Completed, None),
        Err(err) => (err.terminal_state(), Some(err)),
    };
    job.transition(id, &name, state, error.as_ref().map(|e| e.to_string()), listener);

    TaskReport {
        id,
        name,
        state,
        error,
        duration: started.elapsed(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::TaskEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Error)]
    #[error("parent failed")]
    struct ParentFailed;

    fn scheduler() -> TaskScheduler {
        TaskScheduler::new(2).unwrap()
    }

    #[test]
    fn test_parent_runs_after_all_subtasks() {
        let done = Arc::new(AtomicUsize::new(0));
        let seen = done.clone();
        let mut graph = TaskGraph::new("join", move |reports: &[TaskReport]| {
            Ok::<_, ParentFailed>((seen.load(Ordering::SeqCst), reports.len()))
        });

        for i in 0..4 {
            let done = done.clone();
            graph.add_subtask(Subtask::new(&format!("unit-{}", i), move |_| {
                thread::sleep(Duration::from_millis(5));
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        let handle = scheduler().submit(graph, None).unwrap();
        assert_eq!(handle.wait().unwrap(), (4, 4));
    }

    #[test]
    fn test_failed_and_panicked_subtasks_are_reported() {
        let mut graph = TaskGraph::new("join", |reports: &[TaskReport]| {
            Ok::<_, ParentFailed>(reports.iter().map(|r| r.state).collect::<Vec<_>>())
        });
        graph.add_subtask(Subtask::new("ok", |_| Ok(())));
        graph.add_subtask(Subtask::new("fails", |_| Err(TaskError::failed("bad raster"))));
        graph.add_subtask(Subtask::new("panics", |_| panic!("boom")));

        let states = scheduler().submit(graph, None).unwrap().wait().unwrap();
        assert_eq!(states, vec![TaskState::Completed, TaskState::Failed, TaskState::Failed]);
    }

    #[test]
    fn test_parent_error_and_panic() {
        let graph = TaskGraph::new("join", |_: &[TaskReport]| Err::<(), _>(ParentFailed));
        let err = scheduler().submit(graph, None).unwrap().wait().unwrap_err();
        assert!(matches!(err, JobError::Failed(ParentFailed)));

        let graph = TaskGraph::new("join", |_: &[TaskReport]| -> Result<(), ParentFailed> { panic!("merge blew up") });
        let err = scheduler().submit(graph, None).unwrap().wait().unwrap_err();
        assert!(matches!(err, JobError::Panicked(ref m) if m == "merge blew up"));
    }

    #[test]
    fn test_cancel_skips_parent() {
        let parent_ran = Arc::new(AtomicUsize::new(0));
        let flag = parent_ran.clone();
        let mut graph = TaskGraph::new("join", move |_: &[TaskReport]| {
            flag.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ParentFailed>(())
        });
        graph.add_subtask(Subtask::new("slow", |token: &CancelToken| {
            while !token.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            Err(TaskError::Cancelled)
        }));

        let handle = scheduler().submit(graph, None).unwrap();
        handle.cancel();

        assert!(matches!(handle.wait(), Err(JobError::Cancelled)));
        assert_eq!(parent_ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_sees_every_transition() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let listener: TaskListener = Arc::new(move |e: &TaskEvent| sink.lock().push((e.is_parent, e.state)));

        let mut graph = TaskGraph::new("join", |_: &[TaskReport]| Ok::<_, ParentFailed>(()));
        graph.add_subtask(Subtask::new("unit", |_| Ok(())));

        let handle = scheduler().submit(graph, Some(listener)).unwrap();
        handle.wait().unwrap();

        let events = events.lock();
        assert_eq!(events.first(), Some(&(true, TaskState::Running)));
        assert_eq!(events.last(), Some(&(true, TaskState::Completed)));
        assert!(events.contains(&(false, TaskState::Completed)));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_wait_timeout_returns_handle() {
        let mut graph = TaskGraph::new("join", |_: &[TaskReport]| Ok::<_, ParentFailed>(7));
        graph.add_subtask(Subtask::new("gate", |token: &CancelToken| {
            while !token.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        }));
        let ids = graph.subtask_ids();

        let handle = scheduler().submit(graph, None).unwrap();
        let handle = match handle.wait_timeout(Duration::from_millis(10)) {
            Ok(_) => panic!("job should still be running"),
            Err(handle) => handle,
        };
        assert!(!handle.is_finished());

        assert!(handle.cancel_task(ids[0]));
        assert_eq!(handle.wait().unwrap(), 7);
    }
}
