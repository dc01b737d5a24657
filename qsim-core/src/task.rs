//! Tasks and the arena that owns them
//!
//! A [`Task`] is one unit of work emitted by a generator. Events never hold a
//! task directly; they carry a [`TaskId`] into the [`TaskArena`], so exactly
//! one place owns each task's state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::time::SimTime;
use crate::types::{GeneratorId, OperatorId, TaskId};

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Arrived, not yet offered to an operator
    New,
    /// Found every operator busy at least once
    Waiting,
    /// Service started; the completion is scheduled
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub arrival_time: SimTime,
    pub service_duration: Duration,
    pub generator: GeneratorId,
    pub status: TaskStatus,
    wait_time: Option<Duration>,
    operator: Option<OperatorId>,
}

impl Task {
    pub fn new(arrival_time: SimTime, service_duration: Duration, generator: GeneratorId) -> Self {
        Self {
            arrival_time,
            service_duration,
            generator,
            status: TaskStatus::New,
            wait_time: None,
            operator: None,
        }
    }

    /// Time between arrival and start of service. Only set once `Done`.
    pub fn wait_time(&self) -> Option<Duration> {
        self.wait_time
    }

    pub fn operator(&self) -> Option<OperatorId> {
        self.operator
    }

    pub(crate) fn mark_waiting(&mut self) {
        debug_assert_ne!(self.status, TaskStatus::Done);
        self.status = TaskStatus::Waiting;
    }

    /// Start service on `operator` at `now`. Returns the completion instant.
    pub(crate) fn begin_service(&mut self, now: SimTime, operator: OperatorId) -> SimTime {
        debug_assert_ne!(self.status, TaskStatus::Done, "task served twice");
        self.status = TaskStatus::Done;
        self.operator = Some(operator);
        self.wait_time = Some(now - self.arrival_time);
        now + self.service_duration
    }
}

/// Storage for every task created during one repetition
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskArena {
    tasks: Vec<Task>,
}

impl TaskArena {
    pub fn insert(&mut self, task: Task) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(task);
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks.iter().enumerate().map(|(i, t)| (TaskId(i), t))
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
