//! Rerunning repetitions that ended unreliable.
//!
//! The engine never retries on its own; an unreliable repetition is reported
//! as such. These helpers implement the usual caller-side policy of running
//! again, a bounded number of times.

use qsim_core::{Model, RepetitionOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::estimate::ExploreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total runs allowed, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Final outcome and how many runs it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetriedOutcome {
    pub outcome: RepetitionOutcome,
    pub attempts: u32,
}

impl RetriedOutcome {
    pub fn is_reliable(&self) -> bool {
        self.outcome.is_reliable()
    }
}

/// Run repetitions on `model` until one is reliable or the policy is used up.
///
/// The last outcome is returned either way; check
/// [`RetriedOutcome::is_reliable`].
pub fn run_with_retry(model: &mut Model, policy: RetryPolicy) -> Result<RetriedOutcome, ExploreError> {
    if policy.max_attempts == 0 {
        return Err(ExploreError::ZeroAttempts);
    }

    let mut attempts = 0;
    loop {
        attempts += 1;
        let outcome = model.run_once()?;
        if outcome.is_reliable() || attempts == policy.max_attempts {
            if !outcome.is_reliable() {
                warn!(attempts, "Still unreliable after exhausting retries");
            }
            return Ok(RetriedOutcome { outcome, attempts });
        }
        debug!(attempt = attempts, "Unreliable repetition, running again");
    }
}
