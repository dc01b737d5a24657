//! Task generators and operators

use crate::config::GeneratorParams;
use crate::dists::{RayleighArrivals, UniformServiceTime};
use crate::error::SimError;
use crate::randomness::RandomProvider;
use crate::task::Task;
use crate::time::{SimTime, NANOS_PER_SEC};
use crate::types::{GeneratorId, OperatorId, TaskId};

/// Produces one class of tasks, chained in time from its own cursor.
///
/// The cursor keeps the fraction of a nanosecond each gap leaves over, so
/// gaps below the clock resolution still add up instead of vanishing.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    id: GeneratorId,
    arrivals: RayleighArrivals,
    service: UniformServiceTime,
    last_emit_time: SimTime,
    carry_nanos: f64,
}

impl Generator {
    /// # Errors
    ///
    /// Returns [`SimError::Configuration`] if `params` is invalid.
    pub fn new(id: GeneratorId, params: GeneratorParams, start_time: SimTime) -> Result<Self, SimError> {
        Ok(Self {
            id,
            arrivals: RayleighArrivals::new(params.sigma)?,
            service: UniformServiceTime::new(params.low, params.high)?,
            last_emit_time: start_time,
            carry_nanos: 0.0,
        })
    }

    pub fn id(&self) -> GeneratorId {
        self.id
    }

    pub fn last_emit_time(&self) -> SimTime {
        self.last_emit_time
    }

    pub fn arrivals(&self) -> &RayleighArrivals {
        &self.arrivals
    }

    pub fn service(&self) -> &UniformServiceTime {
        &self.service
    }

    /// Advance the cursor by one Rayleigh gap and emit the task arriving there.
    ///
    /// The gap is drawn before the service duration.
    pub fn next_task(&mut self, rng: &mut dyn RandomProvider) -> Task {
        let gap = self.arrivals.next_gap(rng);
        self.advance(gap);
        let service = self.service.sample(rng);
        Task::new(self.last_emit_time, service, self.id)
    }

    pub fn reset(&mut self, start_time: SimTime) {
        self.last_emit_time = start_time;
        self.carry_nanos = 0.0;
    }

    fn advance(&mut self, gap_secs: f64) {
        let nanos = gap_secs * NANOS_PER_SEC + self.carry_nanos;
        if nanos >= u64::MAX as f64 {
            self.last_emit_time = SimTime::MAX;
            self.carry_nanos = 0.0;
            return;
        }
        let whole = nanos.floor();
        self.carry_nanos = nanos - whole;
        self.last_emit_time =
            SimTime::from_nanos(self.last_emit_time.as_nanos().saturating_add(whole as u64));
    }
}

/// One service channel. Busy exactly while it holds a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    id: OperatorId,
    serving: Option<TaskId>,
}

impl Operator {
    pub fn new(id: OperatorId) -> Self {
        Self { id, serving: None }
    }

    pub fn id(&self) -> OperatorId {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.serving.is_some()
    }

    pub fn serving(&self) -> Option<TaskId> {
        self.serving
    }

    pub(crate) fn assign(&mut self, task: TaskId) {
        debug_assert!(self.serving.is_none(), "{} already busy", self.id);
        self.serving = Some(task);
    }

    /// Free the channel, returning the task it was serving.
    pub(crate) fn release(&mut self) -> Option<TaskId> {
        self.serving.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::{ScriptedRandomProvider, SeededRandomProvider};
    use crate::task::TaskStatus;
    use std::time::Duration;

    fn params(sigma: f64, low: f64, high: f64) -> GeneratorParams {
        GeneratorParams { sigma, low, high }
    }

    #[test]
    fn test_generator_chains_arrivals() {
        let mut generator =
            Generator::new(GeneratorId(3), params(4.0, 0.0, 2.0), SimTime::from_secs(1)).unwrap();
        let mut rng = ScriptedRandomProvider::new([0.5, 1.25], [1.5, 0.25]);

        let first = generator.next_task(&mut rng);
        assert_eq!(first.arrival_time, SimTime::from_millis(1500));
        assert_eq!(first.service_duration, Duration::from_millis(1500));
        assert_eq!(first.generator, GeneratorId(3));
        assert_eq!(first.status, TaskStatus::New);

        let second = generator.next_task(&mut rng);
        assert_eq!(second.arrival_time, SimTime::from_millis(2750));
        assert_eq!(second.service_duration, Duration::from_millis(250));
        assert_eq!(generator.last_emit_time(), SimTime::from_millis(2750));
    }

    #[test]
    fn test_generator_zero_gap_is_valid() {
        let mut generator = Generator::new(GeneratorId(0), params(0.0, 0.0, 1.0), SimTime::zero()).unwrap();
        let mut rng = ScriptedRandomProvider::new([0.0, 0.0], [0.5, 0.5]);
        let a = generator.next_task(&mut rng);
        let b = generator.next_task(&mut rng);
        assert_eq!(a.arrival_time, b.arrival_time);
    }

    #[test]
    fn test_generator_accumulates_sub_nanosecond_gaps() {
        let mut generator = Generator::new(GeneratorId(0), params(1e-10, 0.0, 1e-9), SimTime::zero()).unwrap();
        let mut rng = SeededRandomProvider::new(1);
        let mut previous = SimTime::zero();
        for _ in 0..100_000 {
            let task = generator.next_task(&mut rng);
            assert!(task.arrival_time >= previous);
            previous = task.arrival_time;
        }
        // 100k gaps averaging about 1.25e-10 s.
        let cursor = generator.last_emit_time().as_secs_f64();
        assert!(cursor > 1.2e-5 && cursor < 1.3e-5, "cursor at {cursor}");
    }

    #[test]
    fn test_generator_carries_fraction_of_a_nanosecond() {
        let mut generator = Generator::new(GeneratorId(0), params(1e-10, 0.0, 1.0), SimTime::zero()).unwrap();
        let mut rng = ScriptedRandomProvider::new([0.75e-9; 3], [0.0; 3]);
        let arrivals: Vec<u64> = (0..3).map(|_| generator.next_task(&mut rng).arrival_time.as_nanos()).collect();
        // 0.75, 1.5 and 2.25 ns.
        assert_eq!(arrivals, vec![0, 1, 2]);
    }

    #[test]
    fn test_generator_huge_gap_saturates_cursor() {
        let mut generator = Generator::new(GeneratorId(0), params(1.0, 0.0, 1.0), SimTime::zero()).unwrap();
        let mut rng = ScriptedRandomProvider::new([1e30, 1.0], [0.5, 0.5]);
        assert_eq!(generator.next_task(&mut rng).arrival_time, SimTime::MAX);
        assert_eq!(generator.next_task(&mut rng).arrival_time, SimTime::MAX);
    }

    #[test]
    fn test_generator_rejects_invalid_params() {
        assert!(Generator::new(GeneratorId(0), params(-1.0, 0.0, 1.0), SimTime::zero()).is_err());
        assert!(Generator::new(GeneratorId(0), params(1.0, 2.0, 1.0), SimTime::zero()).is_err());
    }

    #[test]
    fn test_generator_reset_rewinds_cursor() {
        let mut generator = Generator::new(GeneratorId(0), params(1.0, 0.0, 1.0), SimTime::zero()).unwrap();
        let mut rng = ScriptedRandomProvider::new([3.0, 0.6e-9, 0.6e-9], [0.5, 0.5, 0.5]);
        generator.next_task(&mut rng);
        assert_eq!(generator.last_emit_time(), SimTime::from_secs(3));
        generator.next_task(&mut rng);
        generator.reset(SimTime::zero());
        assert_eq!(generator.last_emit_time(), SimTime::zero());
        // The leftover fraction is dropped too.
        assert_eq!(generator.next_task(&mut rng).arrival_time, SimTime::zero());
    }

    #[test]
    fn test_operator_assign_release() {
        let mut op = Operator::new(OperatorId(0));
        assert!(!op.is_busy());
        op.assign(TaskId(4));
        assert!(op.is_busy());
        assert_eq!(op.serving(), Some(TaskId(4)));
        assert_eq!(op.release(), Some(TaskId(4)));
        assert!(!op.is_busy());
        assert_eq!(op.release(), None);
    }
}
