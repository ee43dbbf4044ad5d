//! Task orchestration split into focused submodules.
//!
//! The `TaskManager` struct and its methods are organized by concern:
//! - [`unit`] - One retry-wrapped execution unit per target
//! - [`lifecycle`] - Shutdown, drain and scoped use

mod lifecycle;
mod unit;


use crate::config::{Settings, SettingsOverrides};
use crate::error::{Error, Result};
use crate::proxy::ProxyAllocator;
use crate::retry::RetryPolicy;
use crate::target::{Target, TaskSource, build_targets};
use crate::task::SubmitOptions;
use crate::types::{BatchSummary, UnitOutcome};
use crate::utils;
use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::Span;

use unit::ExecutionUnit;

/// Worker pool shared by every batch of one manager
#[derive(Clone)]
pub(crate) struct PoolState {
    /// Semaphore bounding concurrently running units to `max_workers`
    pub(crate) workers: Arc<Semaphore>,
    /// Every spawned execution unit, for draining on shutdown
    pub(crate) units: TaskTracker,
    /// Flag to indicate whether new batches are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Bounded-concurrency batch orchestrator (cloneable - all fields are shared)
///
/// Build one per job, submit any number of batches, then call
/// [`shutdown`](TaskManager::shutdown) (or use [`scope`](TaskManager::scope))
/// to drain outstanding work.
#[derive(Clone)]
pub struct TaskManager {
    /// Orchestrator name, attached to every log line through `span`
    pub(crate) name: Arc<str>,
    /// Effective configuration, read-only after construction
    pub(crate) settings: Arc<Settings>,
    /// Proxy resolved from `settings`
    pub(crate) proxies: ProxyAllocator,
    /// Worker pool and drain bookkeeping
    pub(crate) pool: PoolState,
    /// Parent span of every target span
    pub(crate) span: Span,
}

impl TaskManager {
    /// Create a manager from a resolved settings snapshot
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the settings violate an invariant
    /// (e.g. `max_workers == 0`).
    pub fn new(name: impl Into<String>, settings: Settings) -> Result<Self> {
        settings.validate()?;

        let name: Arc<str> = Arc::from(name.into());
        let span = tracing::info_span!("manager", manager = %name);
        span.in_scope(|| settings.log());

        let permits = settings.max_workers.min(Semaphore::MAX_PERMITS);

        Ok(Self {
            name,
            proxies: ProxyAllocator::from_settings(&settings),
            settings: Arc::new(settings),
            pool: PoolState {
                workers: Arc::new(Semaphore::new(permits)),
                units: TaskTracker::new(),
                accepting_new: Arc::new(AtomicBool::new(true)),
            },
            span,
        })
    }

    /// Create a manager from the environment (and `.env`), with `overrides` applied on top
    pub fn from_env(name: impl Into<String>, overrides: SettingsOverrides) -> Result<Self> {
        let settings = Settings::from_env()?.with_overrides(overrides)?;
        Self::new(name, settings)
    }

    /// Orchestrator name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether new batches are accepted
    pub fn is_accepting(&self) -> bool {
        self.pool.accepting_new.load(Ordering::SeqCst)
    }

    /// Execution units spawned but not yet settled, across all batches
    pub fn in_flight(&self) -> usize {
        self.pool.units.len()
    }

    /// Run `task_fn` once per item of `source` and wait for the whole batch
    ///
    /// Each item becomes a [`Target`] and an execution unit that retries
    /// `task_fn` per the batch policy (overrides in `options`, else the
    /// settings defaults). On terminal success `on_success(target, value)` is
    /// invoked, on terminal failure `on_error(target, last_error)`; both run on
    /// the worker that executed the item. At most `max_workers` units run at
    /// once across every batch of this manager.
    ///
    /// Per-item failures and callback panics never surface here; the returned
    /// [`BatchSummary`] only counts them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] after [`shutdown`](TaskManager::shutdown)
    /// has started. No unit is scheduled in that case.
    pub async fn submit_tasks<D, T, E, F, Fut>(
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
        // Held until every unit is spawned, so a concurrent shutdown cannot
        // finish draining between the accepting check and the spawns
        let spawning = self.pool.units.token();
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }

        let source = source.into();
        if source.is_empty() {
            tracing::warn!(parent: &self.span, "Task batch is empty, nothing to dispatch");
            return Ok(BatchSummary::default());
        }

        let policy = RetryPolicy::resolve(&self.settings, options.retries, options.retry_delay);
        let targets = {
            let mut rng = rand::thread_rng();
            build_targets(
                source,
                self.settings.shuffle,
                &self.proxies,
                options.session_key.as_deref(),
                &self.span,
                &mut rng,
            )
        };

        tracing::info!(
            parent: &self.span,
            tasks = targets.len(),
            retries = policy.retries,
            retry_delay_ms = policy.delay.as_millis(),
            "Dispatching task batch"
        );

        let mut summary = BatchSummary {
            submitted: targets.len(),
            ..Default::default()
        };

        let task_fn = Arc::new(task_fn);
        let handles: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let unit = ExecutionUnit {
                    target: Arc::new(target),
                    task_fn: Arc::clone(&task_fn),
                    policy,
                    on_success: options.on_success.clone(),
                    on_error: options.on_error.clone(),
                };
                self.pool.units.spawn(unit.run(Arc::clone(&self.pool.workers)))
            })
            .collect();
        drop(spawning);

        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    tracing::error!(parent: &self.span, error = %e, "Execution unit did not complete");
                    summary.record(UnitOutcome::Aborted);
                }
            }
        }

        tracing::info!(
            parent: &self.span,
            submitted = summary.submitted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            aborted = summary.aborted,
            "Task batch finished"
        );

        Ok(summary)
    }

    /// Submit one item per non-empty line of a text file
    ///
    /// `.txt` is appended to `path` when missing. Each trimmed line is split on
    /// `separator` and the resulting fields become the item's payload. Unless
    /// `options` sets its own, the proxy session key is the trimmed line.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSource`] if `separator` is empty
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::ShuttingDown`] as for [`submit_tasks`](TaskManager::submit_tasks)
    pub async fn submit_tasks_from_file<T, E, F, Fut>(
        &self,
        path: impl AsRef<Path>,
        separator: &str,
        task_fn: F,
        options: SubmitOptions<Vec<String>, T, E>,
    ) -> Result<BatchSummary>
    where
        F: Fn(Arc<Target<Vec<String>>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        if separator.is_empty() {
            return Err(Error::InvalidSource(
                "line separator must not be empty".to_string(),
            ));
        }

        let lines = utils::read_txt_lines(path).await?;
        let rows = utils::split_lines(lines, separator)?;

        let options = if options.session_key.is_some() {
            options
        } else {
            let separator = separator.to_string();
            options.session_key(move |fields: &Vec<String>| fields.join(&separator))
        };
        self.submit_tasks(rows, task_fn, options).await
    }
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("accepting_new", &self.is_accepting())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
