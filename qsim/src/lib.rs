//! # qsim - Queueing System Simulator
//!
//! Discrete-event simulation of tasks from several Rayleigh-distributed
//! generators served by a pool of identical operators, measuring the average
//! time tasks spend waiting.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! qsim = "0.1"
//! ```
//!
//! ```rust
//! use qsim::prelude::*;
//!
//! let mut model = new_model(0.0, 20.0, &[(4.0, 0.0, 2.0)], 1).unwrap();
//! let waits = model.run_repetitions_raw(5).unwrap();
//! assert_eq!(waits.len(), 5);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Includes `explore`
//! - `explore`: Parallel repetitions, retries, summaries and JSON I/O

// Re-export core (always available)
pub use qsim_core as core;

#[cfg(feature = "explore")]
pub use qsim_explore as explore;

// Convenience re-exports of commonly used items
pub mod prelude {
    //! Commonly used types and functions

    pub use qsim_core::{
        init_simulation_logging, new_model, GeneratorParams, Model, ModelConfig,
        RepetitionOutcome, RunStats, SimError, SimTime, UNRELIABLE_SENTINEL,
    };

    #[cfg(feature = "explore")]
    pub use qsim_explore::prelude::*;
}
