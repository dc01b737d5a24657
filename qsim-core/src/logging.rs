//! Structured logging for queueing simulation runs
//!
//! The engine logs through `tracing`; nothing is printed unless a subscriber
//! is installed. The helpers here install a `tracing-subscriber` registry.
//!
//! # Controlling output
//!
//! ```bash
//! # Default (info level): one line per repetition
//! cargo run --example logging_demo
//!
//! # Every dispatch, wait and release
//! RUST_LOG=qsim_core=trace cargo run --example logging_demo
//! ```
//!
//! Levels:
//! - **TRACE**: each processed event and queue state
//! - **DEBUG**: dispatch, wait and release decisions
//! - **INFO**: repetition start and result
//! - **WARN**: repetitions whose measurement is unreliable
//! - **ERROR**: engine invariant violations

use crate::scheduler::EventKind;
use crate::time::SimTime;
use crate::types::{EventId, GeneratorId, OperatorId, TaskId};
use tracing::{debug, error, info, trace, warn, Span};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging at info level.
pub fn init_simulation_logging() {
    init_simulation_logging_with_level("info")
}

/// Initialize logging with a specific level
///
/// `RUST_LOG` takes precedence when set. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
///
/// # Example
/// ```rust
/// use qsim_core::logging::init_simulation_logging_with_level;
///
/// init_simulation_logging_with_level("debug");
/// ```
pub fn init_simulation_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("qsim={level},qsim_core={level},qsim_explore={level}").into()
    });

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Simulation logging initialized at level: {}", level);
    }
}

/// Trace-level logging, pretty printed, with file and line numbers.
pub fn init_detailed_simulation_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trace,qsim_core=trace,qsim_explore=debug".into());

    let installed = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .pretty(),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        info!("Detailed simulation logging initialized");
    }
}

/// Span covering one repetition
pub fn repetition_span(repetition: u64) -> Span {
    tracing::info_span!("repetition", repetition)
}

/// Span covering the processing of a single event
pub fn event_span(event_id: EventId, kind: EventKind, time: SimTime) -> Span {
    tracing::trace_span!("event", id = %event_id, kind = kind.name(), time = %time)
}

/// Log helpers for the scheduling loop
pub mod events {
    use super::*;

    pub fn repetition_started(repetition: u64, start: SimTime, end: SimTime, seeded: usize) {
        info!(repetition, start = %start, end = %end, seeded, "Repetition started");
    }

    pub fn repetition_completed(repetition: u64, completed: u64, average_wait: f64, leftover: usize) {
        info!(repetition, completed, average_wait, leftover, "Repetition completed");
    }

    pub fn task_dispatched(task: TaskId, operator: OperatorId, now: SimTime, wait_secs: f64, done_at: SimTime) {
        debug!(task = %task, operator = %operator, now = %now, wait_secs, done_at = %done_at, "Task dispatched");
    }

    pub fn task_waiting(task: TaskId, now: SimTime, retry_at: SimTime) {
        debug!(task = %task, now = %now, retry_at = %retry_at, "All operators busy, task waits");
    }

    pub fn operator_released(operator: OperatorId, task: TaskId, now: SimTime) {
        debug!(operator = %operator, task = %task, now = %now, "Operator released");
    }

    pub fn arrival_discarded(generator: GeneratorId, arrival: SimTime, end: SimTime) {
        trace!(generator = %generator, arrival = %arrival, end = %end, "Arrival beyond horizon discarded");
    }

    pub fn queue_state(now: SimTime, pending: usize, next: Option<SimTime>) {
        trace!(now = %now, pending, next = ?next, "Queue state");
    }
}

/// Log helpers for abnormal conditions
pub mod diagnostics {
    use super::*;

    pub fn unreliable_repetition(repetition: u64, leftover: usize, busy_operators: usize) {
        warn!(
            repetition,
            leftover,
            busy_operators,
            "Repetition ended with work in flight; measurement is unreliable"
        );
    }

    pub fn invariant_violation(description: &str, now: SimTime) {
        error!(description, now = %now, "Simulation invariant violated");
    }
}
