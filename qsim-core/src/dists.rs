//! Arrival-gap and service-time distributions
//!
//! Generators draw inter-arrival gaps from a Rayleigh distribution and service
//! durations from a uniform distribution. Both are validated at construction
//! and sample through a [`RandomProvider`] so the engine stays deterministic
//! under a seeded or scripted source.

use std::time::Duration;

use crate::error::SimError;
use crate::randomness::{RandomProvider, ARRIVAL_SITE, SERVICE_SITE};

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Rayleigh-distributed inter-arrival gaps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayleighArrivals {
    scale: f64,
}

impl RayleighArrivals {
    /// Create a new Rayleigh arrival pattern with scale parameter σ.
    ///
    /// # Errors
    ///
    /// Fails if `scale` is negative or not finite.
    pub fn new(scale: f64) -> Result<Self, SimError> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(SimError::config(format!(
                "Rayleigh scale must be finite and >= 0, got {scale}"
            )));
        }
        Ok(Self { scale })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Mean gap in seconds, σ·√(π/2)
    pub fn mean(&self) -> f64 {
        self.scale * (std::f64::consts::PI / 2.0).sqrt()
    }

    /// Draw the time until the next arrival, in seconds.
    ///
    /// Left unquantized so that callers can carry gaps shorter than the
    /// clock resolution.
    pub fn next_gap(&self, rng: &mut dyn RandomProvider) -> f64 {
        rng.sample_rayleigh(ARRIVAL_SITE, self.scale).max(0.0)
    }
}

/// Uniform service times on `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformServiceTime {
    low: f64,
    high: f64,
}

impl UniformServiceTime {
    /// # Errors
    ///
    /// Fails unless `0 <= low < high` and both bounds are finite.
    pub fn new(low: f64, high: f64) -> Result<Self, SimError> {
        if !low.is_finite() || !high.is_finite() {
            return Err(SimError::config(format!(
                "service bounds must be finite, got [{low}, {high}]"
            )));
        }
        if low < 0.0 || low >= high {
            return Err(SimError::config(format!(
                "service bounds must satisfy 0 <= a < b, got [{low}, {high}]"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Mean service time in seconds
    pub fn mean(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn sample(&self, rng: &mut dyn RandomProvider) -> Duration {
        secs_to_duration(rng.sample_uniform(SERVICE_SITE, self.low, self.high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::{ScriptedRandomProvider, SeededRandomProvider};

    #[test]
    fn test_rayleigh_arrivals_creation() {
        let arrivals = RayleighArrivals::new(4.0).unwrap();
        assert_eq!(arrivals.scale(), 4.0);
        assert!((arrivals.mean() - 5.013_256_549_262_001).abs() < 1e-9);
        assert!(RayleighArrivals::new(0.0).is_ok());
    }

    #[test]
    fn test_rayleigh_arrivals_invalid_scale() {
        assert!(RayleighArrivals::new(-0.1).is_err());
        assert!(RayleighArrivals::new(f64::NAN).is_err());
        assert!(RayleighArrivals::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_rayleigh_gaps_are_non_negative() {
        let arrivals = RayleighArrivals::new(0.5).unwrap();
        let mut rng = SeededRandomProvider::new(5);
        for _ in 0..100 {
            let gap = arrivals.next_gap(&mut rng);
            assert!(gap.is_finite() && gap >= 0.0);
        }
    }

    #[test]
    fn test_uniform_service_time_creation() {
        let service = UniformServiceTime::new(0.0, 2.0).unwrap();
        assert_eq!(service.low(), 0.0);
        assert_eq!(service.high(), 2.0);
        assert_eq!(service.mean(), 1.0);
    }

    #[test]
    fn test_uniform_service_time_invalid_range() {
        assert!(UniformServiceTime::new(2.0, 1.0).is_err());
        assert!(UniformServiceTime::new(1.0, 1.0).is_err());
        assert!(UniformServiceTime::new(-1.0, 1.0).is_err());
        assert!(UniformServiceTime::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_uniform_service_time_sampling() {
        let service = UniformServiceTime::new(0.05, 0.15).unwrap();
        let mut rng = SeededRandomProvider::new(9);
        for _ in 0..200 {
            let t = service.sample(&mut rng);
            assert!(t >= Duration::from_millis(50));
            assert!(t <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_sub_nanosecond_gaps_are_kept() {
        let arrivals = RayleighArrivals::new(1e-10).unwrap();
        let mut rng = SeededRandomProvider::new(1);
        let total: f64 = (0..1000).map(|_| arrivals.next_gap(&mut rng)).sum();
        // Mean gap is about 1.25e-10 s.
        assert!(total > 1e-7 && total < 1.5e-7, "{total}");
    }

    #[test]
    fn test_service_time_never_negative() {
        let service = UniformServiceTime::new(0.0, 1.0).unwrap();
        let mut rng = ScriptedRandomProvider::new(Vec::new(), [-0.5, 1e30]);
        assert_eq!(service.sample(&mut rng), Duration::ZERO);
        assert_eq!(service.sample(&mut rng), Duration::MAX);
    }
}
