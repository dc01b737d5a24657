use qsim_core::{RepetitionOutcome, UNRELIABLE_SENTINEL};
use serde::{Deserialize, Serialize};

/// Inverse CDF (quantile) of the standard normal distribution.
///
/// Uses the Peter J. Acklam rational approximation.
///
/// # Panics
/// Panics if `p` is not in `(0, 1)`.
pub fn inv_norm_cdf(p: f64) -> f64 {
    assert!(p > 0.0 && p < 1.0, "p must be in (0, 1)");

    // See: https://web.archive.org/web/20150910044729/http://home.online.no/~pjacklam/notes/invnorm/
    const A: [f64; 6] = [
        -3.969_683_028_665_376e+01,
        2.209_460_984_245_205e+02,
        -2.759_285_104_469_687e+02,
        1.383_577_518_672_690e+02,
        -3.066_479_806_614_716e+01,
        2.506_628_277_459_239e+00,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e+01,
        1.615_858_368_580_409e+02,
        -1.556_989_798_598_866e+02,
        6.680_131_188_771_972e+01,
        -1.328_068_155_288_572e+01,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-03,
        -3.223_964_580_411_365e-01,
        -2.400_758_277_161_838e+00,
        -2.549_732_539_343_734e+00,
        4.374_664_141_464_968e+00,
        2.938_163_982_698_783e+00,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-03,
        3.224_671_290_700_398e-01,
        2.445_134_137_142_996e+00,
        3.754_408_661_907_416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        let num = ((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5];
        let den = (((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0;
        num / den
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - P_LOW {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let q = p - 0.5;
        let r = q * q;
        let num = (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q;
        let den = ((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0;
        num / den
    }
}

/// z-value for a symmetric confidence interval under a normal approximation.
///
/// For example, `confidence = 0.95` returns ~1.96.
pub fn z_for_confidence(confidence: f64) -> f64 {
    assert!(
        confidence > 0.0 && confidence < 1.0,
        "confidence must be in (0, 1)"
    );
    inv_norm_cdf(0.5 + confidence / 2.0)
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Mean squared deviation, dividing by `n`.
pub fn population_variance(xs: &[f64]) -> Option<f64> {
    let m = mean(xs)?;
    Some(xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64)
}

pub fn sample_variance(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs)?;
    Some(xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (xs.len() as f64 - 1.0))
}

/// What to do with unreliable repetitions when summarizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnreliablePolicy {
    /// Leave them out of the sample
    Exclude,
    /// Count them as a zero wait
    AsZero,
    /// Any unreliable repetition makes the whole summary unreliable
    Poison,
}

/// Summary of average waits over a batch of repetitions.
///
/// Statistics are `None` when there is nothing to compute them from, or when
/// the sample was poisoned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub policy: UnreliablePolicy,
    /// Repetitions seen, reliable or not
    pub count: usize,
    pub unreliable: usize,
    /// Values that went into the statistics
    pub used: usize,
    pub mean: Option<f64>,
    /// Population variance of the used values
    pub dispersion: Option<f64>,
    pub std_err: Option<f64>,
    pub confidence: f64,
    pub ci_low: Option<f64>,
    pub ci_high: Option<f64>,
}

impl SampleSummary {
    /// Summarize with a 95% confidence interval.
    pub fn from_outcomes(outcomes: &[RepetitionOutcome], policy: UnreliablePolicy) -> Self {
        Self::from_outcomes_with_confidence(outcomes, policy, 0.95)
    }

    pub fn from_outcomes_with_confidence(
        outcomes: &[RepetitionOutcome],
        policy: UnreliablePolicy,
        confidence: f64,
    ) -> Self {
        let waits: Vec<Option<f64>> = outcomes.iter().map(RepetitionOutcome::average_wait).collect();
        Self::summarize(&waits, policy, confidence)
    }

    /// Summarize values in the legacy encoding, where [`UNRELIABLE_SENTINEL`]
    /// marks an unreliable repetition.
    pub fn from_raw(samples: &[f64], policy: UnreliablePolicy) -> Self {
        let waits: Vec<Option<f64>> = samples
            .iter()
            .map(|&v| (v != UNRELIABLE_SENTINEL).then_some(v))
            .collect();
        Self::summarize(&waits, policy, 0.95)
    }

    pub fn is_poisoned(&self) -> bool {
        self.policy == UnreliablePolicy::Poison && self.unreliable > 0
    }

    fn summarize(waits: &[Option<f64>], policy: UnreliablePolicy, confidence: f64) -> Self {
        let unreliable = waits.iter().filter(|w| w.is_none()).count();
        let values: Vec<f64> = match policy {
            UnreliablePolicy::Poison if unreliable > 0 => Vec::new(),
            UnreliablePolicy::Exclude | UnreliablePolicy::Poison => waits.iter().flatten().copied().collect(),
            UnreliablePolicy::AsZero => waits.iter().map(|w| w.unwrap_or(0.0)).collect(),
        };

        let mean = mean(&values);
        let std_err = sample_variance(&values).map(|var| (var / values.len() as f64).sqrt());
        let (ci_low, ci_high) = match (mean, std_err) {
            (Some(m), Some(se)) => {
                let z = z_for_confidence(confidence);
                (Some(m - z * se), Some(m + z * se))
            }
            _ => (None, None),
        };

        Self {
            policy,
            count: waits.len(),
            unreliable,
            used: values.len(),
            mean,
            dispersion: population_variance(&values),
            std_err,
            confidence,
            ci_low,
            ci_high,
        }
    }
}
