//! Simulation time management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

use crate::error::SimError;

pub(crate) const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Simulation time with nanosecond precision
///
/// SimTime represents a point in simulated time, stored as nanoseconds since
/// time zero. Model parameters are expressed in seconds and converted on entry,
/// so equal timestamps compare exactly and ties have a well-defined order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// The largest representable instant. Used for gaps that overflow the clock.
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// Create a new SimTime at time zero
    pub const fn zero() -> Self {
        SimTime(0)
    }

    /// Create a SimTime from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        SimTime(nanos)
    }

    /// Create a SimTime from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis * 1_000_000)
    }

    /// Create a SimTime from seconds
    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs * 1_000_000_000)
    }

    /// Create a SimTime from a Duration since time zero
    pub fn from_duration(duration: Duration) -> Self {
        SimTime(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    /// Convert fractional seconds into a SimTime.
    ///
    /// Values beyond the representable range saturate to [`SimTime::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] for negative or NaN input.
    pub fn from_secs_f64(secs: f64) -> Result<Self, SimError> {
        if secs.is_nan() {
            return Err(SimError::config("time cannot be NaN"));
        }
        if secs < 0.0 {
            return Err(SimError::config(format!("time cannot be negative: {secs}")));
        }
        const MAX_SECS: f64 = (u64::MAX as f64) / NANOS_PER_SEC;
        if secs >= MAX_SECS {
            return Ok(SimTime::MAX);
        }
        Ok(SimTime((secs * NANOS_PER_SEC) as u64))
    }

    /// Get the raw nanosecond value
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Fractional seconds since time zero
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    /// Calculate the duration since another SimTime
    pub fn duration_since(&self, earlier: SimTime) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Add a duration to this SimTime
    pub fn add_duration(&self, duration: Duration) -> Self {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        SimTime(self.0.saturating_add(nanos))
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> Self::Output {
        self.add_duration(rhs)
    }
}

impl Sub<SimTime> for SimTime {
    type Output = Duration;

    fn sub(self, rhs: SimTime) -> Self::Output {
        self.duration_since(rhs)
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::zero()
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == SimTime::MAX {
            return write!(f, "never");
        }
        let duration = Duration::from_nanos(self.0);
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();
        let micros = duration.subsec_micros() % 1000;
        let nanos = duration.subsec_nanos() % 1000;

        if secs > 0 {
            write!(f, "{secs}.{millis:03}s")
        } else if millis > 0 {
            write!(f, "{millis}.{micros:03}ms")
        } else if micros > 0 {
            write!(f, "{micros}.{nanos:03}µs")
        } else {
            write!(f, "{nanos}ns")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simtime_creation() {
        assert_eq!(SimTime::zero().as_nanos(), 0);
        assert_eq!(SimTime::from_nanos(1000).as_nanos(), 1000);
        assert_eq!(SimTime::from_millis(1).as_nanos(), 1_000_000);
        assert_eq!(SimTime::from_secs(1).as_nanos(), 1_000_000_000);
        assert_eq!(
            SimTime::from_duration(Duration::from_millis(3)),
            SimTime::from_millis(3)
        );
    }

    #[test]
    fn test_simtime_arithmetic() {
        let t1 = SimTime::from_millis(100);
        let t2 = SimTime::from_millis(50);

        assert_eq!(t1 + Duration::from_millis(25), SimTime::from_millis(125));
        assert_eq!(t1 - t2, Duration::from_millis(50));
        // Saturating in both directions
        assert_eq!(t2 - t1, Duration::ZERO);
        assert_eq!(SimTime::MAX + Duration::from_secs(1), SimTime::MAX);
    }

    #[test]
    fn test_simtime_from_secs_f64() {
        assert_eq!(SimTime::from_secs_f64(1.5).unwrap().as_nanos(), 1_500_000_000);
        assert_eq!(SimTime::from_secs_f64(0.0).unwrap(), SimTime::zero());
        assert_eq!(SimTime::from_secs_f64(f64::INFINITY).unwrap(), SimTime::MAX);
        assert_eq!(SimTime::from_secs_f64(1e300).unwrap(), SimTime::MAX);
        assert!((SimTime::from_secs(20).as_secs_f64() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_simtime_from_secs_f64_rejects_invalid() {
        assert!(matches!(
            SimTime::from_secs_f64(-1.0),
            Err(SimError::Configuration(_))
        ));
        assert!(matches!(
            SimTime::from_secs_f64(f64::NAN),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_simtime_display() {
        assert_eq!(SimTime::from_millis(1500).to_string(), "1.500s");
        assert_eq!(SimTime::from_millis(2).to_string(), "2.000ms");
        assert_eq!(SimTime::from_nanos(7).to_string(), "7ns");
        assert_eq!(SimTime::MAX.to_string(), "never");
    }
}
