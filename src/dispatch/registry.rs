use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Background generation tasks, keyed by task id.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, task_id: String, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|_, h| !h.is_finished());
        if let Some(previous) = tasks.insert(task_id.clone(), handle) {
            log::warn!("Task id {} reused while a previous task was still tracked", task_id);
            drop(previous);
        }
    }

    /// Waits for the task to finish. Returns false if the id is not tracked.
    pub async fn wait(&self, task_id: &str) -> bool {
        let handle = self.tasks.lock().await.remove(task_id);
        match handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    log::error!("Task {} did not complete: {}", task_id, e);
                }
                true
            }
            None => false,
        }
    }

    /// Aborts a running task. Returns true only if a still-running task was aborted.
    pub async fn cancel(&self, task_id: &str) -> bool {
        match self.tasks.lock().await.remove(task_id) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub async fn active(&self) -> usize {
        self.tasks
            .lock()
            .await
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }
}
