//! Processing function and callback plumbing
//!
//! A processing function is any `Fn(Arc<Target<D>>) -> Future<Output = Result<T, E>>`.
//! Synchronous functions are adapted with [`blocking`], which moves each call
//! onto tokio's blocking thread pool.

use crate::target::Target;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Invoked once with the result of an item that succeeded
pub type SuccessCallback<D, T> = Arc<dyn Fn(&Target<D>, T) + Send + Sync>;

/// Invoked once with the final error of an item whose attempts were exhausted
pub type ErrorCallback<D, E> = Arc<dyn Fn(&Target<D>, E) + Send + Sync>;

/// Derives the proxy session key of an item from its payload
pub type SessionKey<D> = Arc<dyn Fn(&D) -> String + Send + Sync>;

/// Per-batch callbacks and retry overrides
pub struct SubmitOptions<D, T, E> {
    pub(crate) on_success: Option<SuccessCallback<D, T>>,
    pub(crate) on_error: Option<ErrorCallback<D, E>>,
    pub(crate) session_key: Option<SessionKey<D>>,
    pub(crate) retries: Option<u32>,
    pub(crate) retry_delay: Option<Duration>,
}

impl<D, T, E> Default for SubmitOptions<D, T, E> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
            session_key: None,
            retries: None,
            retry_delay: None,
        }
    }
}

impl<D, T, E> Clone for SubmitOptions<D, T, E> {
    fn clone(&self) -> Self {
        Self {
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            session_key: self.session_key.clone(),
            retries: self.retries,
            retry_delay: self.retry_delay,
        }
    }
}

impl<D, T, E> SubmitOptions<D, T, E> {
    /// Options with no callbacks and the configured retry defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `f(target, result)` when an item succeeds
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&Target<D>, T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Call `f(target, error)` when an item fails for the last time
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Target<D>, E) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Key each item's proxy session by `f(payload)`
    ///
    /// Replaces the `*****` placeholder of the configured proxy, so an item
    /// keeps its session whatever slot shuffling gives it. Items without a
    /// payload, and batches without a session key, use the task index.
    pub fn session_key<F>(mut self, f: F) -> Self
    where
        F: Fn(&D) -> String + Send + Sync + 'static,
    {
        self.session_key = Some(Arc::new(f));
        self
    }

    /// Override the retry count for this batch
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Override the delay between attempts for this batch
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }
}

/// Adapt a synchronous processing function
///
/// Each call runs on tokio's blocking pool inside the target's span. The
/// execution unit keeps its worker permit while the call runs, so the worker
/// limit still holds. A panic in `f` is propagated to the execution unit.
///
/// # Example
///
/// ```no_run
/// use batchpool::task::{SubmitOptions, blocking};
/// use batchpool::{Settings, TaskManager};
///
/// # async fn example() -> batchpool::Result<()> {
/// let manager = TaskManager::new("hashes", Settings::default())?;
/// manager
///     .submit_tasks(
///         vec!["a", "b"],
///         blocking(|target| Ok::<_, String>(target.data().map(|s: &&str| s.len()))),
///         SubmitOptions::new(),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
pub fn blocking<D, T, E, F>(
    f: F,
) -> impl Fn(Arc<Target<D>>) -> BoxFuture<'static, Result<T, E>> + Send + Sync + 'static
where
    F: Fn(&Target<D>) -> Result<T, E> + Send + Sync + 'static,
    D: Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let f = Arc::new(f);
    move |target: Arc<Target<D>>| {
        let f = Arc::clone(&f);
        async move {
            let joined = tokio::task::spawn_blocking(move || {
                let _entered = target.span().enter();
                f(&target)
            })
            .await;

            match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => std::panic::resume_unwind(Box::new(format!(
                    "blocking task did not complete: {e}"
                ))),
            }
        }
        .boxed()
    }
}
