//! Registry of named background tasks.
//!
//! At most one task runs per name. `stop` only signals; `stop_all` signals
//! every task and then waits for all of them to finish.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::ClientError;

type Registry = Arc<Mutex<HashMap<String, TaskRecord>>>;

struct TaskRecord {
    id: u64,
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

/// Removes the record and signals completion when the task future ends,
/// including by panic.
struct Deregister {
    registry: Registry,
    name: String,
    id: u64,
    done: watch::Sender<bool>,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        let mut tasks = lock(&self.registry);
        if tasks.get(&self.name).is_some_and(|r| r.id == self.id) {
            tasks.remove(&self.name);
        }
        drop(tasks);
        self.done.send_replace(true);
        debug!(task = %self.name, "Task deregistered");
    }
}

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<String, TaskRecord>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn wait_done(mut done: watch::Receiver<bool>) {
    // A dropped sender also means the task is gone
    let _ = done.wait_for(|finished| *finished).await;
}

/// Process-wide task registry, owned by the composition root.
#[derive(Default)]
pub struct TaskSupervisor {
    tasks: Registry,
    next_id: AtomicU64,
}

impl std::fmt::Debug for TaskSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSupervisor")
            .field("running", &self.running())
            .finish()
    }
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch `op` under `name` and return immediately.
    ///
    /// `op` receives a fresh token that `stop`/`stop_all` cancel. A task that
    /// returns an error is logged and deregistered; it is not restarted.
    pub fn start<F, Fut>(&self, name: &str, op: F) -> Result<(), ClientError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut tasks = lock(&self.tasks);
        if tasks.contains_key(name) {
            return Err(ClientError::AlreadyRunning(name.to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);
        tasks.insert(
            name.to_string(),
            TaskRecord {
                id,
                cancel: cancel.clone(),
                done: done_rx,
            },
        );
        drop(tasks);

        let guard = Deregister {
            registry: Arc::clone(&self.tasks),
            name: name.to_string(),
            id,
            done: done_tx,
        };
        tokio::spawn(async move {
            let guard = guard;
            match op(cancel).await {
                Ok(()) => info!(task = %guard.name, "Task finished"),
                Err(e) => error!(task = %guard.name, error = %e, "Task failed"),
            }
        });

        info!(task = name, "Task started");
        Ok(())
    }

    /// Signal cancellation to `name` without waiting for it.
    pub fn stop(&self, name: &str) -> Result<(), ClientError> {
        let tasks = lock(&self.tasks);
        let record = tasks
            .get(name)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;
        record.cancel.cancel();
        drop(tasks);
        info!(task = name, "Task stop requested");
        Ok(())
    }

    /// Wait until `name` is no longer running. Returns at once if it is not.
    pub async fn wait(&self, name: &str) {
        let done = lock(&self.tasks).get(name).map(|r| r.done.clone());
        if let Some(done) = done {
            wait_done(done).await;
        }
    }

    /// Cancel every task and wait for all of them to terminate.
    pub async fn stop_all(&self) {
        let pending: Vec<(String, watch::Receiver<bool>)> = {
            let tasks = lock(&self.tasks);
            tasks
                .iter()
                .map(|(name, record)| {
                    record.cancel.cancel();
                    (name.clone(), record.done.clone())
                })
                .collect()
        };
        if pending.is_empty() {
            return;
        }

        info!(count = pending.len(), "Stopping all tasks");
        for (name, done) in pending {
            wait_done(done).await;
            debug!(task = %name, "Task stopped");
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        lock(&self.tasks).contains_key(name)
    }

    /// Names of running tasks, sorted.
    pub fn running(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.tasks).keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    async fn until_cancelled(cancel: CancellationToken) -> anyhow::Result<()> {
        cancel.cancelled().await;
        Ok(())
    }

    async fn fails(_cancel: CancellationToken) -> anyhow::Result<()> {
        anyhow::bail!("boom")
    }

    async fn panics(_cancel: CancellationToken) -> anyhow::Result<()> {
        panic!("task panic")
    }

    #[tokio::test]
    async fn second_start_with_same_name_is_rejected() {
        let sup = TaskSupervisor::new();
        sup.start("x", until_cancelled).unwrap();
        let err = sup.start("x", until_cancelled).unwrap_err();
        assert!(matches!(err, ClientError::AlreadyRunning(ref n) if n == "x"));
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn stop_unknown_is_not_found() {
        let sup = TaskSupervisor::new();
        assert!(matches!(sup.stop("nope"), Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn restart_after_stop_and_termination() {
        let sup = TaskSupervisor::new();
        sup.start("x", until_cancelled).unwrap();
        sup.stop("x").unwrap();
        sup.wait("x").await;
        assert!(!sup.is_running("x"));
        sup.start("x", until_cancelled).unwrap();
        assert!(sup.is_running("x"));
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn stop_all_joins_every_task() {
        let sup = TaskSupervisor::new();
        let flags: Vec<Arc<AtomicBool>> = (0..4).map(|_| Arc::new(AtomicBool::new(false))).collect();
        for (i, flag) in flags.iter().enumerate() {
            let flag = Arc::clone(flag);
            sup.start(&format!("task-{i}"), move |cancel| async move {
                cancel.cancelled().await;
                // Slow shutdown
                tokio::time::sleep(Duration::from_millis(20)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            })
            .unwrap();
        }
        assert_eq!(sup.running().len(), 4);

        sup.stop_all().await;

        assert!(flags.iter().all(|f| f.load(Ordering::SeqCst)));
        assert!(sup.running().is_empty());
    }

    #[tokio::test]
    async fn failing_task_is_deregistered() {
        let sup = TaskSupervisor::new();
        sup.start("bad", fails).unwrap();
        sup.wait("bad").await;
        assert!(!sup.is_running("bad"));
        // Not retried
        tokio::task::yield_now().await;
        assert!(!sup.is_running("bad"));
    }

    #[tokio::test]
    async fn panicking_task_is_deregistered() {
        let sup = TaskSupervisor::new();
        sup.start("panics", panics).unwrap();
        sup.wait("panics").await;
        assert!(!sup.is_running("panics"));
    }

    #[tokio::test]
    async fn running_is_sorted() {
        let sup = TaskSupervisor::new();
        sup.start("b", until_cancelled).unwrap();
        sup.start("a", until_cancelled).unwrap();
        assert_eq!(sup.running(), ["a", "b"]);
        sup.stop_all().await;
    }

    #[tokio::test]
    async fn stop_all_with_nothing_running() {
        TaskSupervisor::new().stop_all().await;
    }
}
