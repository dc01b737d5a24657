//! Hand-checked scenarios replayed through `ScriptedRandomProvider`.
//!
//! Every arrival gap and service duration is fixed, so the expected timeline
//! can be written down event by event.

use std::time::Duration;

use qsim_core::{
    EventKind, Model, ModelConfig, OperatorId, RunPhase, ScriptedRandomProvider, SimTime, StepView,
    TaskId, TaskStatus,
};

fn collect_steps(model: &mut Model) -> (qsim_core::RepetitionOutcome, Vec<StepView>) {
    let mut steps = Vec::new();
    let outcome = model.run_once_observed(|step| steps.push(*step)).unwrap();
    (outcome, steps)
}

#[test]
fn idle_operator_serves_immediately() {
    // Arrival at t=2 served for 1.5 s, next arrival beyond the horizon.
    let rng = ScriptedRandomProvider::new([2.0], [1.5, 0.5]).then_gap(50.0);
    let config = ModelConfig::new(0.0, 10.0, [(1.0, 0.0, 2.0)], 1).unwrap();
    let mut model = Model::new(config, rng).unwrap();

    let (outcome, steps) = collect_steps(&mut model);
    assert_eq!(outcome.average_wait(), Some(0.0));
    assert_eq!(outcome.stats().accepted, 1);
    assert_eq!(outcome.stats().completed, 1);
    assert_eq!(outcome.stats().released, 1);

    let kinds: Vec<_> = steps.iter().map(|s| s.kind.name()).collect();
    assert_eq!(kinds, vec!["arrival", "completion"]);
    assert_eq!(steps[0].now, SimTime::from_secs(2));
    assert_eq!(steps[0].operator, Some(OperatorId(0)));
    assert_eq!(steps[1].now, SimTime::from_millis(3500));
    assert_eq!(steps[1].busy_operators, 0);
}

#[test]
fn waiting_tasks_are_served_in_arrival_order() {
    // t=1: task 0 starts, busy until 4. Tasks 1 (t=2) and 2 (t=3) wait.
    // t=4: task 1 starts (waited 2 s), task 2 waits again until 5 (waited 2 s).
    let rng = ScriptedRandomProvider::new([1.0, 1.0, 1.0], [3.0, 1.0, 1.0, 0.5]).then_gap(100.0);
    let config = ModelConfig::new(0.0, 10.0, [(1.0, 0.0, 5.0)], 1).unwrap();
    let mut model = Model::new(config, rng).unwrap();

    let (outcome, steps) = collect_steps(&mut model);

    let served_after_wait: Vec<_> = steps
        .iter()
        .filter(|s| matches!(s.kind, EventKind::Retry { .. }) && s.task_status == TaskStatus::Done)
        .map(|s| (s.task, s.now))
        .collect();
    assert_eq!(
        served_after_wait,
        vec![(TaskId(1), SimTime::from_secs(4)), (TaskId(2), SimTime::from_secs(5))]
    );

    let peak = steps.iter().map(|s| s.waiting_tasks).max().unwrap();
    assert_eq!(peak, 2);

    let stats = outcome.stats();
    assert_eq!(stats.retries, 3);
    assert_eq!(stats.total_wait, Duration::from_secs(4));
    let avg = outcome.average_wait().unwrap();
    assert!((avg - 4.0 / 3.0).abs() < 1e-9);
}

#[test]
fn simultaneous_arrivals_take_operators_in_index_order() {
    // Both generators emit at t=1; generator 0 was seeded first.
    let rng = ScriptedRandomProvider::new([1.0, 1.0], [2.0, 3.0, 0.5, 0.5]).then_gap(100.0);
    let config = ModelConfig::new(0.0, 10.0, [(1.0, 0.0, 5.0), (1.0, 0.0, 5.0)], 2).unwrap();
    let mut model = Model::new(config, rng).unwrap();

    let (outcome, steps) = collect_steps(&mut model);

    let assignments: Vec<_> = steps
        .iter()
        .filter(|s| s.kind == EventKind::Arrival)
        .map(|s| (s.task, s.operator))
        .collect();
    assert_eq!(
        assignments,
        vec![(TaskId(0), Some(OperatorId(0))), (TaskId(1), Some(OperatorId(1)))]
    );

    let releases: Vec<_> = steps
        .iter()
        .filter_map(|s| match s.kind {
            EventKind::Completion { operator } => Some((operator, s.now)),
            _ => None,
        })
        .collect();
    assert_eq!(
        releases,
        vec![
            (OperatorId(0), SimTime::from_secs(3)),
            (OperatorId(1), SimTime::from_secs(4)),
        ]
    );
    assert_eq!(outcome.average_wait(), Some(0.0));
}

#[test]
fn completions_past_the_horizon_are_drained() {
    // Task 0 runs from t=1 to t=21; the horizon is 10.
    let rng = ScriptedRandomProvider::new([1.0], [20.0, 0.5]).then_gap(100.0);
    let config = ModelConfig::new(0.0, 10.0, [(1.0, 0.0, 30.0)], 1).unwrap();
    let mut model = Model::new(config, rng).unwrap();

    let (outcome, steps) = collect_steps(&mut model);
    let last = steps.last().unwrap();
    assert_eq!(last.phase, RunPhase::Draining);
    assert_eq!(last.now, SimTime::from_secs(21));
    assert_eq!(last.busy_operators, 0);
    assert_eq!(outcome.average_wait(), Some(0.0));
    assert_eq!(outcome.stats().leftover_events, 0);
}

#[test]
fn stuck_waiters_make_the_run_unreliable() {
    let rng = ScriptedRandomProvider::new([1.0, 1.0, 1.0], [20.0, 1.0, 1.0, 0.5]).then_gap(100.0);
    let config = ModelConfig::new(0.0, 10.0, [(1.0, 0.0, 30.0)], 1).unwrap();
    let mut model = Model::new(config, rng).unwrap();

    let outcome = model.run_once().unwrap();
    assert!(!outcome.is_reliable());
    assert_eq!(outcome.to_sentinel(), -1.0);
    assert_eq!(outcome.stats().leftover_events, 2);
}

#[test]
fn arrival_exactly_at_horizon_is_discarded() {
    let rng = ScriptedRandomProvider::new([10.0], [1.0]);
    let config = ModelConfig::new(0.0, 10.0, [(1.0, 0.0, 2.0)], 1).unwrap();
    let mut model = Model::new(config, rng).unwrap();

    let outcome = model.run_once().unwrap();
    assert_eq!(outcome.stats().accepted, 0);
    assert_eq!(outcome.average_wait(), Some(0.0));
}

#[test]
fn generators_start_from_start_time() {
    let rng = ScriptedRandomProvider::new([0.5], [1.0, 1.0]).then_gap(100.0);
    let config = ModelConfig::new(5.0, 10.0, [(1.0, 0.0, 2.0)], 1).unwrap();
    let mut model = Model::new(config, rng).unwrap();

    let (_, steps) = collect_steps(&mut model);
    assert_eq!(steps[0].now, SimTime::from_millis(5500));
}
