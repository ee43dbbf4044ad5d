//! Blocking facade over [`TaskManager`]
//!
//! [`TaskRunner`] owns a multi-threaded tokio runtime with exactly
//! `max_workers` worker threads and exposes synchronous submission: every call
//! blocks the calling thread until its batch has drained. Dropping the runner
//! (or calling [`TaskRunner::close`]) drains all outstanding work before the
//! runtime is released.
//!
//! # Example
//!
//! ```no_run
//! use batchpool::task::SubmitOptions;
//! use batchpool::{SettingsOverrides, TaskRunner};
//!
//! fn main() -> batchpool::Result<()> {
//!     let runner = TaskRunner::from_env(
//!         "accounts",
//!         SettingsOverrides { max_workers: Some(3), ..Default::default() },
//!     )?;
//!
//!     runner.submit_blocking_tasks(
//!         vec!["data-1", "data-2"],
//!         |target| {
//!             tracing::info!(proxy = ?target.proxy(), "processing {:?}", target.data());
//!             Ok::<_, String>(target.index())
//!         },
//!         SubmitOptions::new()
//!             .retries(1)
//!             .on_error(|target, error: String| {
//!                 tracing::error!(%error, "item {} gave up", target.name())
//!             }),
//!     )?;
//!
//!     runner.close();
//!     Ok(())
//! }
//! ```

use crate::config::{Settings, SettingsOverrides};
use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::target::{Target, TaskSource};
use crate::task::{SubmitOptions, blocking};
use crate::types::BatchSummary;
use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Synchronous task runner with its own worker threads
///
/// # Panics
///
/// Submitting, closing or dropping a runner from inside an async context
/// panics, as with any nested tokio runtime. Use [`TaskManager`] directly
/// from async code.
pub struct TaskRunner {
    manager: TaskManager,
    runtime: Runtime,
}

impl TaskRunner {
    /// Start a runner with `settings.max_workers` worker threads
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the settings are invalid
    /// - [`Error::Runtime`] if the worker threads cannot be started
    pub fn new(name: impl Into<String>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let name = name.into();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(settings.max_workers)
            .thread_name(format!("{name}-worker"))
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        let manager = TaskManager::new(name, settings)?;
        Ok(Self { manager, runtime })
    }

    /// Start a runner from the environment (and `.env`), with `overrides` applied on top
    pub fn from_env(name: impl Into<String>, overrides: SettingsOverrides) -> Result<Self> {
        let settings = Settings::from_env()?.with_overrides(overrides)?;
        Self::new(name, settings)
    }

    /// The underlying orchestrator
    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    /// Blocking form of [`TaskManager::submit_tasks`]
    pub fn submit_tasks<D, T, E, F, Fut>(
        &self,
        source: impl Into<TaskSource<D>>,
        task_fn: F,
        options: SubmitOptions<D, T, E>,
    ) -> Result<BatchSummary>
    where
        F: Fn(Arc<Target<D>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        D: Send + Sync + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.runtime
            .block_on(self.manager.submit_tasks(source, task_fn, options))
    }

    /// Submit a synchronous processing function
    ///
    /// Shorthand for [`submit_tasks`](TaskRunner::submit_tasks) with
    /// [`blocking`]`(task_fn)`.
    pub fn submit_blocking_tasks<D, T, E, F>(
        &self,
        source: impl Into<TaskSource<D>>,
        task_fn: F,
        options: SubmitOptions<D, T, E>,
    ) -> Result<BatchSummary>
    where
        F: Fn(&Target<D>) -> std::result::Result<T, E> + Send + Sync + 'static,
        D: Send + Sync + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.submit_tasks(source, blocking(task_fn), options)
    }

    /// Blocking form of [`TaskManager::submit_tasks_from_file`], for synchronous functions
    pub fn submit_tasks_from_file<T, E, F>(
        &self,
        path: impl AsRef<Path>,
        separator: &str,
        task_fn: F,
        options: SubmitOptions<Vec<String>, T, E>,
    ) -> Result<BatchSummary>
    where
        F: Fn(&Target<Vec<String>>) -> std::result::Result<T, E> + Send + Sync + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.runtime.block_on(self.manager.submit_tasks_from_file(
            path,
            separator,
            blocking(task_fn),
            options,
        ))
    }

    /// Drain outstanding work and release the worker threads
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.runtime.block_on(self.manager.shutdown());
    }
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}
