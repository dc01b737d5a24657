//! Discrete event engine for multi-generator, multi-operator queueing models.
//!
//! Several independent generators emit tasks with Rayleigh-distributed
//! inter-arrival gaps. A pool of identical operators serves them with uniformly
//! distributed service times. A task that finds every operator busy waits and
//! retries at the next completion. Each repetition measures the average wait.
//!
//! # Architecture Overview
//!
//! - [`Model`]: owns generators, operators, the [`EventQueue`] and the
//!   [`TaskArena`], and runs repetitions.
//! - [`RandomProvider`]: the single source of randomness. Use
//!   [`SeededRandomProvider`] for reproducible runs and
//!   [`ScriptedRandomProvider`] to replay exact scenarios.
//! - [`RepetitionOutcome`]: a measured average wait, or an explicit
//!   unreliable marker when work was stuck in flight at the horizon.
//!
//! # Basic Usage
//!
//! ```rust
//! use qsim_core::{Model, ModelConfig};
//!
//! // One generator (σ = 4, service in [0, 2)), one operator, 20 s horizon.
//! let mut model = Model::with_seed(ModelConfig::default(), 7).unwrap();
//!
//! for outcome in model.run_repetitions(10).unwrap() {
//!     match outcome.average_wait() {
//!         Some(avg) => println!("average wait {avg:.3}s"),
//!         None => println!("unreliable"),
//!     }
//! }
//! ```
//!
//! # Time Model
//!
//! Times are seconds at the API boundary and [`SimTime`] (integer
//! nanoseconds) inside the engine, so simultaneous events compare exactly and
//! ties resolve in insertion order.

pub mod config;
pub mod dists;
pub mod error;
pub mod generator;
pub mod logging;
pub mod model;
pub mod randomness;
pub mod scheduler;
pub mod task;
pub mod time;
pub mod types;

pub use config::{GeneratorParams, ModelConfig, MAX_EXPECTED_ARRIVALS};
pub use dists::{RayleighArrivals, UniformServiceTime};
pub use error::{EventError, SimError};
pub use generator::{Generator, Operator};
pub use logging::{
    event_span, init_detailed_simulation_logging, init_simulation_logging,
    init_simulation_logging_with_level, repetition_span,
};
pub use model::{
    new_model, Model, ModelSnapshot, RepetitionOutcome, RunPhase, RunStats, StepView,
    UNRELIABLE_SENTINEL,
};
pub use randomness::{DrawSite, RandomProvider, ScriptedRandomProvider, SeededRandomProvider};
pub use scheduler::{Event, EventKind, EventQueue};
pub use task::{Task, TaskArena, TaskStatus};
pub use time::SimTime;
pub use types::{EventId, GeneratorId, OperatorId, TaskId};
