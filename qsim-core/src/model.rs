//! The simulation engine.
//!
//! A [`Model`] owns its generators, operators, event queue and task arena, and
//! runs one repetition of the horizon at a time:
//!
//! 1. every generator seeds one arrival (arrivals at or after `end_time` are
//!    discarded);
//! 2. events are processed in time order while the clock is before the
//!    horizon. An arrival first schedules its generator's next arrival, then
//!    takes the first free operator or waits for the next completion;
//! 3. completions still queued at the front after the horizon are drained so
//!    operator state is consistent;
//! 4. the repetition is measured, or flagged [`RepetitionOutcome::Unreliable`]
//!    when work is left in flight in a way the drain could not resolve;
//! 5. the model resets, ready for the next independent repetition.

use std::time::Duration;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};

use crate::config::{GeneratorParams, ModelConfig};
use crate::error::{EventError, SimError};
use crate::generator::{Generator, Operator};
use crate::logging::{diagnostics, event_span, events};
use crate::randomness::{RandomProvider, SeededRandomProvider};
use crate::scheduler::{Event, EventKind, EventQueue};
use crate::task::{Task, TaskArena, TaskStatus};
use crate::time::SimTime;
use crate::types::{GeneratorId, OperatorId, TaskId};

/// Legacy encoding of an unreliable repetition in a plain `f64` sample list.
pub const UNRELIABLE_SENTINEL: f64 = -1.0;

/// Where a repetition currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Reset, nothing scheduled
    Idle,
    /// Clock before the horizon, events being processed
    Running,
    /// Past the horizon, flushing completions at the front of the queue
    Draining,
    /// Drained, result computed
    Finished,
}

/// Counters collected over one repetition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Arrivals before the horizon that entered the queue
    pub accepted: u64,
    /// Tasks that started service
    pub completed: u64,
    /// Completion events processed (operator freed)
    pub released: u64,
    /// Failed dispatch attempts, one per wait or re-wait
    pub retries: u64,
    pub total_wait: Duration,
    pub max_wait: Duration,
    /// Peak number of tasks waiting at the same time
    pub max_waiting: usize,
    /// Events still queued after the drain
    pub leftover_events: usize,
    /// Operators still busy after the drain
    pub busy_at_end: usize,
}

impl RunStats {
    /// Mean wait in seconds; zero when nothing started service.
    pub fn average_wait(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.total_wait.as_secs_f64() / self.completed as f64
        }
    }

    fn record_wait(&mut self, wait: Duration) {
        self.completed += 1;
        self.total_wait += wait;
        self.max_wait = self.max_wait.max(wait);
    }
}

/// Result of one repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RepetitionOutcome {
    /// The run ended cleanly; `average_wait` is in seconds.
    Measured { average_wait: f64, stats: RunStats },
    /// Work was stuck in flight at the horizon. Discard or retry.
    Unreliable { stats: RunStats },
}

impl RepetitionOutcome {
    pub fn average_wait(&self) -> Option<f64> {
        match self {
            RepetitionOutcome::Measured { average_wait, .. } => Some(*average_wait),
            RepetitionOutcome::Unreliable { .. } => None,
        }
    }

    pub fn is_reliable(&self) -> bool {
        matches!(self, RepetitionOutcome::Measured { .. })
    }

    pub fn stats(&self) -> &RunStats {
        match self {
            RepetitionOutcome::Measured { stats, .. } | RepetitionOutcome::Unreliable { stats } => stats,
        }
    }

    /// The average wait, or [`UNRELIABLE_SENTINEL`].
    pub fn to_sentinel(&self) -> f64 {
        self.average_wait().unwrap_or(UNRELIABLE_SENTINEL)
    }
}

/// State visible to an observer after each processed event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepView {
    pub phase: RunPhase,
    pub now: SimTime,
    pub kind: EventKind,
    pub task: TaskId,
    pub task_status: TaskStatus,
    /// Operator serving `task`, once it has started service
    pub operator: Option<OperatorId>,
    pub busy_operators: usize,
    /// Tasks in service whose completion has not fired yet
    pub pending_completions: usize,
    pub waiting_tasks: usize,
    pub queue_len: usize,
}

/// Comparable summary of a model's mutable state
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSnapshot {
    pub phase: RunPhase,
    pub queue_len: usize,
    pub task_count: usize,
    pub waiting_tasks: usize,
    pub stats: RunStats,
    pub busy: Vec<bool>,
    pub cursors: Vec<SimTime>,
}

/// Multi-generator, multi-operator queueing model.
///
/// See the [module documentation](self) for the scheduling algorithm.
pub struct Model {
    config: ModelConfig,
    start: SimTime,
    end: SimTime,
    generators: Vec<Generator>,
    operators: Vec<Operator>,
    queue: EventQueue,
    tasks: TaskArena,
    stats: RunStats,
    waiting: usize,
    phase: RunPhase,
    repetitions: u64,
    rng: Box<dyn RandomProvider>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("repetitions", &self.repetitions)
            .field("queue_len", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Build a model drawing from `rng`.
    ///
    /// # Errors
    ///
    /// [`SimError::Configuration`] if the configuration does not validate.
    pub fn new(config: ModelConfig, rng: impl RandomProvider + 'static) -> Result<Self, SimError> {
        config.validate()?;
        let (start, end) = config.horizon()?;
        let generators = config
            .generators
            .iter()
            .enumerate()
            .map(|(i, params)| Generator::new(GeneratorId(i), *params, start))
            .collect::<Result<Vec<_>, _>>()?;
        let operators = (0..config.operators).map(|i| Operator::new(OperatorId(i))).collect();

        Ok(Self {
            config,
            start,
            end,
            generators,
            operators,
            queue: EventQueue::new(),
            tasks: TaskArena::default(),
            stats: RunStats::default(),
            waiting: 0,
            phase: RunPhase::Idle,
            repetitions: 0,
            rng: Box::new(rng),
        })
    }

    /// Build a model with a `StdRng` seeded from `seed`.
    pub fn with_seed(config: ModelConfig, seed: u64) -> Result<Self, SimError> {
        Self::new(config, SeededRandomProvider::new(seed))
    }

    /// Build a model with an entropy-seeded `StdRng`.
    pub fn from_entropy(config: ModelConfig) -> Result<Self, SimError> {
        Self::new(config, SeededRandomProvider::from_entropy())
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Number of repetitions run so far, including failed ones
    pub fn repetitions(&self) -> u64 {
        self.repetitions
    }

    pub fn busy_operators(&self) -> usize {
        self.operators.iter().filter(|op| op.is_busy()).count()
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            phase: self.phase,
            queue_len: self.queue.len(),
            task_count: self.tasks.len(),
            waiting_tasks: self.waiting,
            stats: self.stats.clone(),
            busy: self.operators.iter().map(Operator::is_busy).collect(),
            cursors: self.generators.iter().map(Generator::last_emit_time).collect(),
        }
    }

    /// Run `times` independent repetitions.
    ///
    /// # Errors
    ///
    /// [`SimError::Configuration`] if `times` is zero; event errors abort the call.
    pub fn run_repetitions(&mut self, times: usize) -> Result<Vec<RepetitionOutcome>, SimError> {
        if times == 0 {
            return Err(SimError::config("repetition count must be > 0"));
        }
        (0..times).map(|_| self.run_once()).collect()
    }

    /// Like [`Model::run_repetitions`], encoding unreliable runs as [`UNRELIABLE_SENTINEL`].
    pub fn run_repetitions_raw(&mut self, times: usize) -> Result<Vec<f64>, SimError> {
        Ok(self
            .run_repetitions(times)?
            .iter()
            .map(RepetitionOutcome::to_sentinel)
            .collect())
    }

    /// Run a single repetition and reset.
    pub fn run_once(&mut self) -> Result<RepetitionOutcome, SimError> {
        self.run_once_observed(|_| {})
    }

    /// Run a single repetition, calling `observer` after every processed event.
    ///
    /// The model is reset afterwards even if the run fails.
    #[instrument(skip(self, observer), fields(repetition = self.repetitions))]
    pub fn run_once_observed<F>(&mut self, mut observer: F) -> Result<RepetitionOutcome, SimError>
    where
        F: FnMut(&StepView),
    {
        let result = self.simulate(&mut observer);
        self.repetitions += 1;
        self.reset();
        result
    }

    /// Clear the queue, tasks, counters and busy flags, and rewind generators.
    ///
    /// Idempotent. The random source is left where it is so the next
    /// repetition draws fresh values.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.tasks.clear();
        self.stats = RunStats::default();
        self.waiting = 0;
        self.phase = RunPhase::Idle;
        for operator in &mut self.operators {
            operator.release();
        }
        for generator in &mut self.generators {
            generator.reset(self.start);
        }
    }

    fn simulate(&mut self, observer: &mut dyn FnMut(&StepView)) -> Result<RepetitionOutcome, SimError> {
        self.phase = RunPhase::Running;
        for index in 0..self.generators.len() {
            self.schedule_next_arrival(index);
        }
        events::repetition_started(self.repetitions, self.start, self.end, self.queue.len());

        let mut now = self.start;
        while now < self.end && !self.queue.is_empty() {
            let event = self.queue.pop_front()?;
            now = event.time;
            if now > self.end {
                // Dropped, like everything after it.
                break;
            }
            let _span = event_span(event.id(), event.kind, now).entered();
            trace!(%event, "Processing event");

            self.process(&event, now)?;
            observer(&self.view(&event, now));

            // Refresh from the front: processing may have queued earlier work.
            match self.queue.peek_time() {
                Some(next) => now = next,
                None => break,
            }
            events::queue_state(now, self.queue.len(), Some(now));
        }

        self.phase = RunPhase::Draining;
        while self.queue.peek().is_some_and(Event::is_completion) {
            let event = self.queue.pop_front()?;
            self.process(&event, event.time)?;
            observer(&self.view(&event, event.time));
        }

        self.phase = RunPhase::Finished;
        Ok(self.outcome())
    }

    fn process(&mut self, event: &Event, now: SimTime) -> Result<(), SimError> {
        match event.kind {
            EventKind::Arrival => {
                let generator = self.task(event.task)?.generator;
                // Keep the generator's chain going whether or not this task is served.
                self.schedule_next_arrival(generator.0);
                self.dispatch(event.task, now)
            }
            EventKind::Retry { .. } => self.dispatch(event.task, now),
            EventKind::Completion { operator } => self.release(operator, event.task, now),
        }
    }

    fn schedule_next_arrival(&mut self, index: usize) {
        let generator = &mut self.generators[index];
        let task = generator.next_task(self.rng.as_mut());
        if task.arrival_time >= self.end {
            events::arrival_discarded(generator.id(), task.arrival_time, self.end);
            return;
        }
        let arrival = task.arrival_time;
        let id = self.tasks.insert(task);
        self.queue.insert(Event::arrival(arrival, id));
        self.stats.accepted += 1;
    }

    /// Hand `task` to the first free operator, in index order, or make it wait.
    fn dispatch(&mut self, task: TaskId, now: SimTime) -> Result<(), SimError> {
        let Some(slot) = self.operators.iter().position(|op| !op.is_busy()) else {
            return self.defer(task, now);
        };
        let operator = &mut self.operators[slot];
        operator.assign(task);
        let operator_id = operator.id();

        let entry = self.tasks.get_mut(task).ok_or_else(|| missing_task(task))?;
        let was_waiting = entry.status == TaskStatus::Waiting;
        let done_at = entry.begin_service(now, operator_id);
        let wait = entry.wait_time().unwrap_or_default();

        if was_waiting {
            self.waiting -= 1;
        }
        self.stats.record_wait(wait);
        counter!("qsim_tasks_completed").increment(1);

        self.queue.insert(Event::completion(done_at, task, operator_id));
        events::task_dispatched(task, operator_id, now, wait.as_secs_f64(), done_at);
        Ok(())
    }

    /// Every operator is busy: retry at the next completion.
    fn defer(&mut self, task: TaskId, now: SimTime) -> Result<(), SimError> {
        let Some(retry_at) = self.queue.next_completion_time() else {
            diagnostics::invariant_violation("all operators busy but no completion pending", now);
            return Err(EventError::NoPendingCompletion.into());
        };

        let entry = self.tasks.get_mut(task).ok_or_else(|| missing_task(task))?;
        if entry.status == TaskStatus::New {
            entry.mark_waiting();
            self.waiting += 1;
            self.stats.max_waiting = self.stats.max_waiting.max(self.waiting);
        }
        let arrived_at = entry.arrival_time;

        self.stats.retries += 1;
        counter!("qsim_task_retries").increment(1);

        self.queue.insert_retry(Event::retry(retry_at, task, arrived_at));
        events::task_waiting(task, now, retry_at);
        Ok(())
    }

    fn release(&mut self, operator: OperatorId, task: TaskId, now: SimTime) -> Result<(), SimError> {
        let channel = self
            .operators
            .get_mut(operator.0)
            .ok_or_else(|| SimError::Internal(format!("unknown {operator}")))?;
        match channel.release() {
            Some(served) if served == task => {}
            other => {
                diagnostics::invariant_violation("completion for a task the operator is not serving", now);
                return Err(SimError::Internal(format!(
                    "{operator} completed {task} while serving {other:?}"
                )));
            }
        }
        self.stats.released += 1;
        events::operator_released(operator, task, now);
        Ok(())
    }

    fn outcome(&mut self) -> RepetitionOutcome {
        let busy = self.busy_operators();
        let leftover = self.queue.len();
        self.stats.leftover_events = leftover;
        self.stats.busy_at_end = busy;

        let clean = self.stats.completed == 0 || leftover == 0 || (leftover == 1 && busy == 0);
        let stats = self.stats.clone();
        if clean {
            let average_wait = stats.average_wait();
            histogram!("qsim_average_wait_seconds").record(average_wait);
            events::repetition_completed(self.repetitions, stats.completed, average_wait, leftover);
            RepetitionOutcome::Measured { average_wait, stats }
        } else {
            counter!("qsim_repetitions_unreliable").increment(1);
            diagnostics::unreliable_repetition(self.repetitions, leftover, busy);
            RepetitionOutcome::Unreliable { stats }
        }
    }

    fn task(&self, id: TaskId) -> Result<&Task, SimError> {
        self.tasks.get(id).ok_or_else(|| missing_task(id))
    }

    fn view(&self, event: &Event, now: SimTime) -> StepView {
        let task = self.tasks.get(event.task);
        StepView {
            phase: self.phase,
            now,
            kind: event.kind,
            task: event.task,
            task_status: task.map_or(TaskStatus::New, |t| t.status),
            operator: task.and_then(Task::operator),
            busy_operators: self.busy_operators(),
            pending_completions: self.queue.iter().filter(|e| e.is_completion()).count(),
            waiting_tasks: self.waiting,
            queue_len: self.queue.len(),
        }
    }
}

fn missing_task(id: TaskId) -> SimError {
    SimError::Internal(format!("{id} is not in the task arena"))
}

/// Entropy-seeded model from raw parameters.
///
/// # Errors
///
/// [`SimError::Configuration`] for an invalid horizon, generator or operator count.
pub fn new_model(
    start_time: f64,
    end_time: f64,
    generators: &[(f64, f64, f64)],
    operators: usize,
) -> Result<Model, SimError> {
    let config = ModelConfig::new(
        start_time,
        end_time,
        generators.iter().copied().map(GeneratorParams::from),
        operators,
    )?;
    info!(generators = generators.len(), operators, "Building model");
    Model::from_entropy(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::ScriptedRandomProvider;

    fn single(end: f64, gen: (f64, f64, f64), operators: usize) -> ModelConfig {
        ModelConfig::new(0.0, end, [gen], operators).unwrap()
    }

    #[test]
    fn test_fresh_model_is_idle() {
        let model = Model::with_seed(ModelConfig::default(), 1).unwrap();
        let snap = model.snapshot();
        assert_eq!(snap.phase, RunPhase::Idle);
        assert_eq!(snap.queue_len, 0);
        assert_eq!(snap.busy, vec![false]);
        assert_eq!(snap.cursors, vec![SimTime::zero()]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ModelConfig {
            operators: 0,
            ..ModelConfig::default()
        };
        assert!(matches!(
            Model::with_seed(config, 1),
            Err(SimError::Configuration(_))
        ));
        assert!(new_model(0.0, 0.0, &[(1.0, 0.0, 1.0)], 1).is_err());
        assert!(new_model(0.0, 5.0, &[], 1).is_err());
    }

    #[test]
    fn test_zero_repetitions_is_an_error() {
        let mut model = Model::with_seed(ModelConfig::default(), 1).unwrap();
        assert!(matches!(
            model.run_repetitions(0),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_wait_then_retry_scenario() {
        // Arrivals at 1, 2, 3 with service 3, 1, 1 on one operator.
        let rng = ScriptedRandomProvider::new([1.0, 1.0, 1.0], [3.0, 1.0, 1.0, 0.5]).then_gap(100.0);
        let mut model = Model::new(single(10.0, (1.0, 0.0, 5.0), 1), rng).unwrap();

        let outcome = model.run_once().unwrap();
        let stats = outcome.stats();
        assert!(outcome.is_reliable());
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.released, 3);
        // Tasks 1 and 2 wait at t=2 and t=3; task 2 has to wait a second time.
        assert_eq!(stats.retries, 3);
        assert_eq!(stats.max_waiting, 2);
        assert_eq!(stats.total_wait, Duration::from_secs(4));
        assert_eq!(stats.max_wait, Duration::from_secs(2));
        let avg = outcome.average_wait().unwrap();
        assert!((avg - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_leftover_retry_is_clean() {
        // Task 0 is in service past the horizon, task 1 waits behind it.
        let rng = ScriptedRandomProvider::new([1.0, 1.0], [20.0, 1.0, 0.5]).then_gap(100.0);
        let mut model = Model::new(single(10.0, (1.0, 0.0, 30.0), 1), rng).unwrap();

        let outcome = model.run_once().unwrap();
        assert_eq!(outcome.average_wait(), Some(0.0));
        assert_eq!(outcome.stats().leftover_events, 1);
        assert_eq!(outcome.stats().busy_at_end, 0);
    }

    #[test]
    fn test_two_leftover_retries_are_unreliable() {
        let rng = ScriptedRandomProvider::new([1.0, 1.0, 1.0], [20.0, 1.0, 1.0, 0.5]).then_gap(100.0);
        let mut model = Model::new(single(10.0, (1.0, 0.0, 30.0), 1), rng).unwrap();

        let outcome = model.run_once().unwrap();
        assert!(!outcome.is_reliable());
        assert_eq!(outcome.to_sentinel(), UNRELIABLE_SENTINEL);
        assert_eq!(outcome.stats().completed, 1);
        assert_eq!(outcome.stats().leftover_events, 2);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut model = Model::with_seed(ModelConfig::default(), 5).unwrap();
        let initial = model.snapshot();
        model.run_once().unwrap();
        model.reset();
        let once = model.snapshot();
        model.reset();
        assert_eq!(model.snapshot(), once);
        assert_eq!(once, initial);
    }

    #[test]
    fn test_sentinel_encoding() {
        let measured = RepetitionOutcome::Measured {
            average_wait: 0.5,
            stats: RunStats::default(),
        };
        let unreliable = RepetitionOutcome::Unreliable {
            stats: RunStats::default(),
        };
        assert_eq!(measured.to_sentinel(), 0.5);
        assert_eq!(unreliable.to_sentinel(), -1.0);
        assert_eq!(unreliable.average_wait(), None);
    }

    #[test]
    fn test_average_wait_of_empty_run_is_zero() {
        assert_eq!(RunStats::default().average_wait(), 0.0);
    }
}
