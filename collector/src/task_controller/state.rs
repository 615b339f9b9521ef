//! Shared task and submission registry.
//!
//! Holds the active tasks and the immutable submission records taken under
//! them. The state is a clonable handle created once at startup and passed
//! into the engine explicitly; there is no ambient global.
//!
//! Accepted uploads do not write the registry directly. The write path sends
//! a [`SubmissionUpdate`] through an MPSC channel and a single recorder task
//! applies it: appending the `Submission` record and bumping the task's
//! submission count. This keeps the upload hot path free of registry lock
//! contention.

use common::model::submission::Submission;
use common::model::task::Task;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// A thread-safe, shareable container for tasks and their submissions.
#[derive(Clone)]
pub struct TasksState {
    /// Map from task id to its current configuration and counters.
    pub tasks: Arc<RwLock<HashMap<String, Task>>>,
    /// Append-only log of accepted submissions, oldest first.
    pub submissions: Arc<RwLock<Vec<Submission>>>,
    /// Sender used by the write path to report accepted submissions.
    pub tx: mpsc::Sender<SubmissionUpdate>,
}

/// One accepted submission, reported by the write path.
#[derive(Debug)]
pub struct SubmissionUpdate {
    pub submission: Submission,
}

impl TasksState {
    pub fn new(tx: mpsc::Sender<SubmissionUpdate>) -> Self {
        TasksState {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            submissions: Arc::new(RwLock::new(Vec::new())),
            tx,
        }
    }

    pub async fn register_task(&self, task: Task) {
        self.tasks.write().await.insert(task.id.clone(), task);
    }

    /// Registers `task` under a freshly generated id and returns it.
    pub async fn create_task(&self, mut task: Task) -> Task {
        task.id = Uuid::new_v4().to_string();
        self.register_task(task.clone()).await;
        task
    }

    pub async fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Removes a task. Historical submission records are kept untouched.
    pub async fn delete_task(&self, task_id: &str) -> Option<Task> {
        self.tasks.write().await.remove(task_id)
    }

    /// Deletes one submission record by its stored filename.
    pub async fn delete_submission(&self, task_id: &str, stored_filename: &str) -> bool {
        let mut submissions = self.submissions.write().await;
        let before = submissions.len();
        submissions.retain(|s| !(s.task_id == task_id && s.stored_filename == stored_filename));
        submissions.len() != before
    }

    /// Deletes every submission record of a task; returns how many went.
    pub async fn delete_submissions(&self, task_id: &str) -> usize {
        let mut submissions = self.submissions.write().await;
        let before = submissions.len();
        submissions.retain(|s| s.task_id != task_id);
        before - submissions.len()
    }
}

/// Applies [`SubmissionUpdate`]s to the shared state.
///
/// Spawn this once as a long-running background task; it exits when every
/// sender is dropped.
pub async fn start_submission_recorder(state: TasksState, mut rx: mpsc::Receiver<SubmissionUpdate>) {
    while let Some(update) = rx.recv().await {
        let task_id = update.submission.task_id.clone();
        state.submissions.write().await.push(update.submission);
        if let Some(task) = state.tasks.write().await.get_mut(&task_id) {
            task.submission_count += 1;
        }
    }
}
