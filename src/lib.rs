//! # batchpool
//!
//! Bounded-concurrency batch task runner with retries and per-item callbacks.
//!
//! ## Design Philosophy
//!
//! batchpool is designed to be:
//! - **Bounded** - At most `max_workers` items run at once, whatever the batch size
//! - **Callback-driven** - Exactly one of `on_success` / `on_error` fires per item
//! - **Typed** - Processing functions return `Result<T, E>`; retries inspect that value
//! - **Drain on exit** - Shutting down waits for every in-flight item, including retries
//!
//! ## Quick Start
//!
//! ```no_run
//! use batchpool::task::SubmitOptions;
//! use batchpool::{Settings, Target, TaskManager};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TaskManager::new(
//!         "fetcher",
//!         Settings {
//!             max_workers: 4,
//!             ..Default::default()
//!         },
//!     )?;
//!
//!     let urls = vec!["https://a.example", "https://b.example"];
//!     let summary = manager
//!         .submit_tasks(
//!             urls,
//!             |target: Arc<Target<&'static str>>| async move {
//!                 tracing::info!(proxy = ?target.proxy(), "fetching");
//!                 Ok::<_, String>(target.data().map(|u| u.len()))
//!             },
//!             SubmitOptions::new()
//!                 .retries(3)
//!                 .retry_delay(Duration::from_secs(1))
//!                 .on_success(|target, len| println!("{} -> {:?}", target.name(), len))
//!                 .on_error(|target, error| eprintln!("{} failed: {}", target.name(), error)),
//!         )
//!         .await?;
//!
//!     println!("{} of {} succeeded", summary.succeeded, summary.submitted);
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Optional log output setup
pub mod logging;
/// Task orchestration
pub mod manager;
/// Proxy assignment
pub mod proxy;
/// Retry logic with constant delay
pub mod retry;
/// Blocking facade with its own worker threads
pub mod runner;
/// Per-item execution context
pub mod target;
/// Processing function and callback plumbing
pub mod task;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Settings, SettingsOverrides};
pub use error::{Error, Result};
pub use manager::TaskManager;
pub use proxy::ProxyAllocator;
pub use retry::RetryPolicy;
pub use runner::TaskRunner;
pub use target::{Target, TaskSource};
pub use task::{SubmitOptions, blocking};
pub use types::{BatchSummary, UnitOutcome};
