//! Independent repetitions, sequential or across a rayon pool.

use qsim_core::{repetition_span, Model, ModelConfig, RepetitionOutcome, SimError};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::retry::{run_with_retry, RetriedOutcome, RetryPolicy};

#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("repetitions must be > 0")]
    ZeroRepetitions,

    #[error("retry policy requires max_attempts >= 1")]
    ZeroAttempts,
}

/// Seed for repetition `i` of an experiment seeded with `base`.
///
/// SplitMix64 over `base + i·γ`, so neighbouring indices get unrelated seeds.
pub fn derive_seed(base: u64, i: u64) -> u64 {
    let mut x = base.wrapping_add(i.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Run `times` repetitions in parallel, one freshly seeded [`Model`] each.
///
/// Repetition `i` uses `derive_seed(base_seed, i)`, and results come back in
/// repetition order, so the output does not depend on the thread count.
pub fn run_parallel(
    config: &ModelConfig,
    times: usize,
    base_seed: u64,
) -> Result<Vec<RepetitionOutcome>, ExploreError> {
    if times == 0 {
        return Err(ExploreError::ZeroRepetitions);
    }
    config.validate()?;
    info!(times, base_seed, load = config.load_factor(), "Running repetitions in parallel");

    (0..times)
        .into_par_iter()
        .map(|i| -> Result<RepetitionOutcome, ExploreError> {
            let seed = derive_seed(base_seed, i as u64);
            let _span = repetition_span(i as u64).entered();
            debug!(seed, "Starting repetition");
            let mut model = Model::with_seed(config.clone(), seed)?;
            Ok(model.run_once()?)
        })
        .collect()
}

/// Like [`run_parallel`], rerunning each unreliable repetition under `policy`.
///
/// Retries continue on the same model, so they draw fresh values from the
/// repetition's seed stream.
pub fn run_parallel_with_retry(
    config: &ModelConfig,
    times: usize,
    base_seed: u64,
    policy: RetryPolicy,
) -> Result<Vec<RetriedOutcome>, ExploreError> {
    if times == 0 {
        return Err(ExploreError::ZeroRepetitions);
    }
    config.validate()?;

    (0..times)
        .into_par_iter()
        .map(|i| -> Result<RetriedOutcome, ExploreError> {
            let mut model = Model::with_seed(config.clone(), derive_seed(base_seed, i as u64))?;
            run_with_retry(&mut model, policy)
        })
        .collect()
}

/// Sequential counterpart of [`run_parallel`]; yields identical outcomes.
pub fn run_sequential(
    config: &ModelConfig,
    times: usize,
    base_seed: u64,
) -> Result<Vec<RepetitionOutcome>, ExploreError> {
    if times == 0 {
        return Err(ExploreError::ZeroRepetitions);
    }
    (0..times)
        .map(|i| -> Result<RepetitionOutcome, ExploreError> {
            let mut model = Model::with_seed(config.clone(), derive_seed(base_seed, i as u64))?;
            Ok(model.run_once()?)
        })
        .collect()
}
