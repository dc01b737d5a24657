//! Repetition tooling for qsim models.
//!
//! The engine in `qsim-core` runs one repetition at a time and reports
//! unreliable runs without retrying them. This crate adds what experiments
//! need on top: per-repetition seed derivation, parallel batches, bounded
//! retries, sample summaries and JSON files for configurations and results.

pub mod estimate;
pub mod io;
pub mod retry;
pub mod stats;

/// Prelude for common exploration types.
pub mod prelude {
    pub use crate::estimate::{
        derive_seed, run_parallel, run_parallel_with_retry, run_sequential, ExploreError,
    };
    pub use crate::io::{
        read_config_from_path, read_outcomes_from_path, write_config_to_path,
        write_outcomes_to_path, IoError, ResultsFile,
    };
    pub use crate::retry::{run_with_retry, RetriedOutcome, RetryPolicy};
    pub use crate::stats::{z_for_confidence, SampleSummary, UnreliablePolicy};
}
