//! Model configuration
//!
//! Configurations are plain serde structs so they can be stored next to
//! experiment results. Nothing is trusted until [`ModelConfig::validate`] has
//! run; [`crate::Model`] calls it on construction.

use serde::{Deserialize, Serialize};

use crate::dists::{RayleighArrivals, UniformServiceTime};
use crate::error::SimError;
use crate::time::SimTime;

/// Most arrivals one generator may be expected to emit over the horizon.
pub const MAX_EXPECTED_ARRIVALS: f64 = 1e7;

/// Parameters of one generator: Rayleigh scale σ and uniform service bounds `[a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub sigma: f64,
    pub low: f64,
    pub high: f64,
}

impl GeneratorParams {
    /// # Errors
    ///
    /// Fails unless σ ≥ 0 and 0 ≤ a < b.
    pub fn new(sigma: f64, low: f64, high: f64) -> Result<Self, SimError> {
        let params = Self { sigma, low, high };
        params.validate()?;
        Ok(params)
    }

    /// Build parameters from intensities instead of raw distribution bounds.
    ///
    /// * `arrival_rate` - mean arrivals per second λ, giving σ = (1/λ)·√(2/π)
    /// * `service_rate` - mean services per second μ
    /// * `service_std_dev` - standard deviation s of the service time, giving
    ///   `[1/μ − s·√3, 1/μ + s·√3)`
    ///
    /// # Errors
    ///
    /// Fails for non-positive rates, or when the resulting bounds are invalid
    /// (for instance a deviation so wide that `a` would be negative).
    pub fn from_intensities(
        arrival_rate: f64,
        service_rate: f64,
        service_std_dev: f64,
    ) -> Result<Self, SimError> {
        if !(arrival_rate > 0.0) || !(service_rate > 0.0) {
            return Err(SimError::config(format!(
                "intensities must be positive, got arrival {arrival_rate}, service {service_rate}"
            )));
        }
        if !(service_std_dev > 0.0) {
            return Err(SimError::config(format!(
                "service deviation must be positive, got {service_std_dev}"
            )));
        }
        let sigma = (2.0 / std::f64::consts::PI).sqrt() / arrival_rate;
        let half_width = service_std_dev * 3f64.sqrt();
        let mean_service = 1.0 / service_rate;
        Self::new(sigma, mean_service - half_width, mean_service + half_width)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        RayleighArrivals::new(self.sigma)?;
        UniformServiceTime::new(self.low, self.high)?;
        Ok(())
    }

    /// Mean inter-arrival gap, σ·√(π/2)
    pub fn mean_gap(&self) -> f64 {
        self.sigma * (std::f64::consts::PI / 2.0).sqrt()
    }

    /// Mean service time, (a+b)/2
    pub fn mean_service(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

impl From<(f64, f64, f64)> for GeneratorParams {
    fn from((sigma, low, high): (f64, f64, f64)) -> Self {
        Self { sigma, low, high }
    }
}

/// Everything needed to build a [`crate::Model`].
///
/// Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub start_time: f64,
    pub end_time: f64,
    pub generators: Vec<GeneratorParams>,
    pub operators: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 20.0,
            generators: vec![GeneratorParams {
                sigma: 4.0,
                low: 0.0,
                high: 2.0,
            }],
            operators: 1,
        }
    }
}

impl ModelConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// See [`ModelConfig::validate`].
    pub fn new(
        start_time: f64,
        end_time: f64,
        generators: impl IntoIterator<Item = impl Into<GeneratorParams>>,
        operators: usize,
    ) -> Result<Self, SimError> {
        let config = Self {
            start_time,
            end_time,
            generators: generators.into_iter().map(Into::into).collect(),
            operators,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the horizon, generator parameters and operator count.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if `start_time < 0`,
    /// `end_time <= start_time`, there are no generators, any generator is
    /// invalid, or there are no operators.
    ///
    /// A generator is also rejected when its mean gap would produce more than
    /// [`MAX_EXPECTED_ARRIVALS`] over the horizon. σ = 0 falls under this
    /// rule: its gaps never move the clock, so the run would not terminate.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(SimError::config(format!(
                "start_time must be finite and >= 0, got {}",
                self.start_time
            )));
        }
        if !self.end_time.is_finite() || self.end_time <= self.start_time {
            return Err(SimError::config(format!(
                "end_time must be finite and > start_time ({}), got {}",
                self.start_time, self.end_time
            )));
        }
        if self.generators.is_empty() {
            return Err(SimError::config("at least one generator is required"));
        }
        for (index, params) in self.generators.iter().enumerate() {
            params
                .validate()
                .map_err(|err| SimError::config(format!("generator {index}: {err}")))?;
            let expected = (self.end_time - self.start_time) / params.mean_gap();
            if !(expected <= MAX_EXPECTED_ARRIVALS) {
                return Err(SimError::config(format!(
                    "generator {index}: sigma {} expects {expected:e} arrivals before end_time \
                     (limit {MAX_EXPECTED_ARRIVALS:e}); the run would not terminate",
                    params.sigma
                )));
            }
        }
        if self.operators == 0 {
            return Err(SimError::config("operators must be > 0"));
        }
        Ok(())
    }

    pub(crate) fn horizon(&self) -> Result<(SimTime, SimTime), SimError> {
        Ok((
            SimTime::from_secs_f64(self.start_time)?,
            SimTime::from_secs_f64(self.end_time)?,
        ))
    }

    /// Offered load per operator, Σ λᵢ·E[serviceᵢ] / N with λᵢ = 1/E[gapᵢ].
    ///
    /// Generators whose mean gap is zero make the load infinite.
    pub fn load_factor(&self) -> f64 {
        let offered: f64 = self
            .generators
            .iter()
            .map(|g| {
                let gap = g.mean_gap();
                if gap > 0.0 {
                    g.mean_service() / gap
                } else {
                    f64::INFINITY
                }
            })
            .sum();
        offered / self.operators as f64
    }
}
