//! Shutdown and scoped-use coordination.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;

use super::TaskManager;

impl TaskManager {
    /// Gracefully shut down the manager
    ///
    /// 1. Stops accepting new batches
    /// 2. Waits for every spawned execution unit, including ones still
    ///    retrying, to reach a terminal state and finish its callback
    ///
    /// Running attempts are never cancelled. Calling this again (from any
    /// clone) just waits for the drain to finish.
    pub async fn shutdown(&self) {
        let first = self.pool.accepting_new.swap(false, Ordering::SeqCst);
        if first {
            tracing::info!(parent: &self.span, "Initiating graceful shutdown");
        }

        self.pool.units.close();

        let in_flight = self.pool.units.len();
        if in_flight > 0 {
            tracing::info!(
                parent: &self.span,
                in_flight,
                "Waiting for in-flight tasks to finish"
            );
        }

        self.pool.units.wait().await;

        if first {
            tracing::info!(parent: &self.span, "Graceful shutdown complete");
        }
    }

    /// Run `f` with this manager, then shut down whatever `f` returned
    ///
    /// The drain also happens when `f` panics; the panic is resumed afterwards.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use batchpool::task::SubmitOptions;
    /// use batchpool::{Settings, TaskManager, TaskSource};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> batchpool::Result<()> {
    /// let manager = TaskManager::new("crawler", Settings::default())?;
    /// let summary = manager
    ///     .scope(|m| async move {
    ///         m.submit_tasks(
    ///             TaskSource::Count(10),
    ///             |t: Arc<batchpool::Target<()>>| async move { Ok::<_, String>(t.index()) },
    ///             SubmitOptions::new(),
    ///         )
    ///         .await
    ///     })
    ///     .await?;
    /// assert_eq!(summary.submitted, 10);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scope<F, Fut, R>(self, f: F) -> R
    where
        F: FnOnce(TaskManager) -> Fut,
        Fut: Future<Output = R>,
    {
        let result = AssertUnwindSafe(f(self.clone())).catch_unwind().await;
        self.shutdown().await;
        match result {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
