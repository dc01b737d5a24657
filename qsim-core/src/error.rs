//! Error types for the simulation engine

use thiserror::Error;

/// Top-level error type for simulation operations
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SimError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SimError::Configuration(message.into())
    }
}

/// Errors raised by the event queue.
///
/// Both variants indicate a broken engine invariant rather than a condition a
/// caller can recover from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Event queue is empty")]
    EmptyQueue,

    #[error("No completion event pending while every operator is busy")]
    NoPendingCompletion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_error_converts_into_sim_error() {
        let err: SimError = EventError::EmptyQueue.into();
        assert!(matches!(err, SimError::Event(EventError::EmptyQueue)));
        assert_eq!(err.to_string(), "Event error: Event queue is empty");
    }

    #[test]
    fn test_configuration_message() {
        let err = SimError::config("operators must be > 0");
        assert_eq!(err.to_string(), "Invalid configuration: operators must be > 0");
    }
}
