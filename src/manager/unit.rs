//! One target's attempts plus its terminal callback.

use crate::retry::{RetryPolicy, run_with_retry};
use crate::target::Target;
use crate::task::{ErrorCallback, SuccessCallback};
use crate::types::UnitOutcome;
use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::Instrument;

/// Everything a worker needs to drive one target to a terminal state
pub(super) struct ExecutionUnit<D, T, E, F> {
    pub(super) target: Arc<Target<D>>,
    pub(super) task_fn: Arc<F>,
    pub(super) policy: RetryPolicy,
    pub(super) on_success: Option<SuccessCallback<D, T>>,
    pub(super) on_error: Option<ErrorCallback<D, E>>,
}

impl<D, T, E, F, Fut> ExecutionUnit<D, T, E, F>
where
    F: Fn(Arc<Target<D>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    D: Send + Sync + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    /// Run the unit inside its target's span
    ///
    /// Waits for a worker permit, runs every attempt and then at most one
    /// callback, all while holding the permit.
    pub(super) async fn run(self, workers: Arc<Semaphore>) -> UnitOutcome {
        let span = self.target.span().clone();
        self.execute(workers).instrument(span).await
    }

    async fn execute(self, workers: Arc<Semaphore>) -> UnitOutcome {
        let Ok(_permit) = workers.acquire_owned().await else {
            tracing::error!("Worker pool closed before the task could start");
            return UnitOutcome::Aborted;
        };

        let ExecutionUnit {
            target,
            task_fn,
            policy,
            on_success,
            on_error,
        } = self;

        let attempts = run_with_retry(&policy, |_attempt| task_fn(Arc::clone(&target)));

        match AssertUnwindSafe(attempts).catch_unwind().await {
            Ok(Ok(value)) => {
                tracing::info!("Task succeeded");
                if let Some(callback) = on_success {
                    invoke_callback("on_success", || callback(&target, value));
                }
                UnitOutcome::Succeeded
            }
            Ok(Err(e)) => {
                tracing::error!(
                    error = %e,
                    attempts = policy.max_attempts(),
                    "Task failed"
                );
                if let Some(callback) = on_error {
                    invoke_callback("on_error", || callback(&target, e));
                }
                UnitOutcome::Failed
            }
            Err(panic) => {
                tracing::error!(
                    panic = panic_message(panic.as_ref()),
                    "Task panicked, no callback will be invoked"
                );
                UnitOutcome::Aborted
            }
        }
    }
}

/// Run a user callback, logging and swallowing a panic
fn invoke_callback(name: &'static str, callback: impl FnOnce()) {
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(callback)) {
        tracing::error!(
            callback = name,
            panic = panic_message(panic.as_ref()),
            "Callback panicked, task outcome unchanged"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
