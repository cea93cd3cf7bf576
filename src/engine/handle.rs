// Tue Jan 13 2026 - Alex

use crate::engine::result::JobError;
use crate::engine::task::{CancelToken, Subtask, TaskEvent, TaskId, TaskListener, TaskState};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// State shared between the job thread, the pool workers and the handle.
pub(crate) struct JobShared {
    parent: TaskId,
    token: CancelToken,
    tokens: HashMap<TaskId, CancelToken>,
    states: RwLock<IndexMap<TaskId, TaskState>>,
}

impl JobShared {
    pub(crate) fn new(parent: TaskId, subtasks: &[Subtask], token: CancelToken) -> Self {
        let mut states = IndexMap::with_capacity(subtasks.len() + 1);
        let mut tokens = HashMap::with_capacity(subtasks.len());

        states.insert(parent, TaskState::Pending);
        for subtask in subtasks {
            states.insert(subtask.id(), TaskState::Pending);
            tokens.insert(subtask.id(), token.child());
        }

        Self {
            parent,
            token,
            tokens,
            states: RwLock::new(states),
        }
    }

    pub(crate) fn transition(
        &self,
        id: TaskId,
        name: &str,
        state: TaskState,
        detail: Option<String>,
        listener: Option<&TaskListener>,
    ) {
        self.states.write().insert(id, state);

        match &detail {
            Some(reason) => log::debug!("{} ({}) -> {}: {}", name, id, state, reason),
            None => log::debug!("{} ({}) -> {}", name, id, state),
        }

        if let Some(listener) = listener {
            listener(&TaskEvent {
                task: id,
                name: name.to_string(),
                state,
                is_parent: id == self.parent,
                detail,
            });
        }
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.token
    }

    pub(crate) fn token_for(&self, id: TaskId) -> CancelToken {
        self.tokens.get(&id)
            .cloned()
            .unwrap_or_else(|| self.token.child())
    }

    fn state(&self, id: TaskId) -> Option<TaskState> {
        self.states.read().get(&id).copied()
    }
}

/// Caller's view of a submitted task graph.
pub struct JobHandle<T, E: std::error::Error + 'static> {
    shared: Arc<JobShared>,
    receiver: Receiver<Result<T, JobError<E>>>,
    thread: Option<JoinHandle<()>>,
}

impl<T, E: std::error::Error + 'static> JobHandle<T, E> {
    pub(crate) fn new(
        shared: Arc<JobShared>,
        receiver: Receiver<Result<T, JobError<E>>>,
        thread: JoinHandle<()>,
    ) -> Self {
        Self {
            shared,
            receiver,
            thread: Some(thread),
        }
    }

    pub fn id(&self) -> TaskId {
        self.shared.parent
    }

    /// Cancels every subtask that has not started and keeps the parent
    /// from running. Subtasks already running see it through their token.
    pub fn cancel(&self) {
        log::info!("Cancelling job {}", self.shared.parent);
        self.shared.token.cancel();
    }

    pub fn cancel_task(&self, id: TaskId) -> bool {
        match self.shared.tokens.get(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.shared.state(id)
    }

    pub fn parent_state(&self) -> TaskState {
        self.shared.state(self.shared.parent).unwrap_or(TaskState::Pending)
    }

    pub fn states(&self) -> Vec<(TaskId, TaskState)> {
        self.shared.states.read()
            .iter()
            .map(|(id, state)| (*id, *state))
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.parent_state().is_terminal()
    }

    pub fn wait(mut self) -> Result<T, JobError<E>> {
        let result = self.receiver.recv().unwrap_or(Err(JobError::Disconnected));
        self.join();
        result
    }

    /// Gives the handle back if the job is still running after `timeout`.
    pub fn wait_timeout(mut self, timeout: Duration) -> Result<Result<T, JobError<E>>, Self> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => {
                self.join();
                Ok(result)
            }
            Err(RecvTimeoutError::Timeout) => Err(self),
            Err(RecvTimeoutError::Disconnected) => {
                self.join();
                Ok(Err(JobError::Disconnected))
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
