//! Randomness facade for deterministic simulation.
//!
//! The engine never touches an RNG directly. Every draw goes through a
//! [`RandomProvider`], labelled with the [`DrawSite`] it comes from, so a run
//! can be driven by a seeded generator or by a fixed script of values.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Uniform, Weibull};

/// A labeled sampling location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawSite {
    pub tag: &'static str,
    pub site_id: u64,
}

impl DrawSite {
    pub const fn new(tag: &'static str) -> Self {
        Self {
            tag,
            site_id: fnv1a64(tag),
        }
    }
}

/// Inter-arrival gaps drawn by generators.
pub const ARRIVAL_SITE: DrawSite = DrawSite::new("generator.arrival_gap");
/// Service durations drawn for new tasks.
pub const SERVICE_SITE: DrawSite = DrawSite::new("generator.service_time");

/// Const-friendly 64-bit FNV-1a hash.
pub const fn fnv1a64(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut hash: u64 = 0xcbf29ce484222325;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x100000001b3);
        i += 1;
    }
    hash
}

/// Sampling interface that can be swapped for scripted values in tests.
///
/// Owned by a [`crate::Model`] and used on the simulation thread only.
pub trait RandomProvider: Send {
    /// Sample a Rayleigh distribution with scale `scale` (seconds).
    fn sample_rayleigh(&mut self, site: DrawSite, scale: f64) -> f64;

    /// Sample uniformly from `[low, high)` (seconds).
    fn sample_uniform(&mut self, site: DrawSite, low: f64, high: f64) -> f64;
}

/// `StdRng`-backed provider.
pub struct SeededRandomProvider {
    rng: StdRng,
}

impl SeededRandomProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomProvider for SeededRandomProvider {
    fn sample_rayleigh(&mut self, _site: DrawSite, scale: f64) -> f64 {
        // Rayleigh(σ) is Weibull(σ·√2, 2).
        match Weibull::new(scale * std::f64::consts::SQRT_2, 2.0) {
            Ok(dist) => self.rng.sample(dist),
            // Degenerate scale: every gap is zero.
            Err(_) => 0.0,
        }
    }

    fn sample_uniform(&mut self, _site: DrawSite, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.sample(Uniform::new(low, high))
    }
}

/// A provider that hands out pre-recorded values in order.
///
/// Arrival gaps and service durations are kept in separate queues keyed by
/// draw site. Running out of values is a test bug and panics.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandomProvider {
    gaps: VecDeque<f64>,
    services: VecDeque<f64>,
    fallback_gap: Option<f64>,
}

impl ScriptedRandomProvider {
    pub fn new(
        gaps: impl IntoIterator<Item = f64>,
        services: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            gaps: gaps.into_iter().collect(),
            services: services.into_iter().collect(),
            fallback_gap: None,
        }
    }

    /// Once the scripted gaps are used up, keep returning `gap`.
    ///
    /// Handy for pushing the next arrival past the horizon without counting
    /// exactly how many draws a scenario makes.
    #[must_use]
    pub fn then_gap(mut self, gap: f64) -> Self {
        self.fallback_gap = Some(gap);
        self
    }

    pub fn remaining(&self) -> (usize, usize) {
        (self.gaps.len(), self.services.len())
    }
}

impl RandomProvider for ScriptedRandomProvider {
    fn sample_rayleigh(&mut self, site: DrawSite, _scale: f64) -> f64 {
        match (self.gaps.pop_front(), self.fallback_gap) {
            (Some(gap), _) => gap,
            (None, Some(gap)) => gap,
            (None, None) => panic!("scripted draws exhausted at site {}", site.tag),
        }
    }

    fn sample_uniform(&mut self, site: DrawSite, _low: f64, _high: f64) -> f64 {
        self.services
            .pop_front()
            .unwrap_or_else(|| panic!("scripted draws exhausted at site {}", site.tag))
    }
}
