//! Core types shared by the orchestrator and its callers

use serde::{Deserialize, Serialize};

/// Terminal state of one execution unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOutcome {
    /// An attempt returned `Ok`
    Succeeded,
    /// Every attempt returned `Err`
    Failed,
    /// The unit panicked or was torn down before reaching a terminal state
    Aborted,
}

/// Tally of one batch, returned once every unit has settled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of items dispatched
    pub submitted: usize,
    /// Items that ended in success
    pub succeeded: usize,
    /// Items that ended in failure after exhausting retries
    pub failed: usize,
    /// Items whose unit panicked (no callback was invoked for these)
    pub aborted: usize,
}

impl BatchSummary {
    /// Count one settled unit
    pub(crate) fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Succeeded => self.succeeded += 1,
            UnitOutcome::Failed => self.failed += 1,
            UnitOutcome::Aborted => self.aborted += 1,
        }
    }

    /// Whether every submitted item succeeded
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.submitted
    }
}
