//! ---
//! esim_section: "01-core-functionality"
//! esim_subsection: "module"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Runtime helpers supporting the simulation session."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use anyhow::{anyhow, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawned tasks joined in spawn order, so results line up with their inputs.
#[derive(Debug)]
pub struct TaskGroup<T> {
    tasks: Vec<(String, JoinHandle<Result<T>>)>,
    cancel: Option<broadcast::Sender<()>>,
}

impl<T> Default for TaskGroup<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            cancel: None,
        }
    }
}

impl<T: Send + 'static> TaskGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group whose first failing task signals `cancel`, so siblings listening on it stop early.
    pub fn cancel_on_failure(cancel: broadcast::Sender<()>) -> Self {
        Self {
            tasks: Vec::new(),
            cancel: Some(cancel),
        }
    }

    pub fn spawn<F>(&mut self, label: impl Into<String>, fut: F)
    where
        F: std::future::Future<Output = Result<T>> + Send + 'static,
    {
        let label = label.into();
        debug!(task = %label, "spawning task");
        let cancel = self.cancel.clone();
        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let result = fut.await;
            if let (Err(err), Some(cancel)) = (&result, &cancel) {
                warn!(task = %task_label, error = %err, "task failed; cancelling siblings");
                let _ = cancel.send(());
            }
            result
        });
        self.tasks.push((label, handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task. The first failure or panic is returned after all have finished.
    pub async fn join(self) -> Result<Vec<T>> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        let mut first_error = None;
        for (label, task) in self.tasks {
            let outcome = task
                .await
                .map_err(|err| anyhow!("task {label} failed to join: {err}"))
                .and_then(|result| result.map_err(|err| err.context(format!("task {label}"))));
            match outcome {
                Ok(output) => outputs.push(output),
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(err) => debug!(task = %label, error = %err, "additional task failure"),
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(outputs),
        }
    }
}
