//! The event queue.
//!
//! Events are kept sorted by time in a `VecDeque`, equal timestamps in
//! insertion order. Only the front is ever popped.

use std::collections::VecDeque;
use std::fmt;

use crate::error::EventError;
use crate::time::SimTime;
use crate::types::{EventId, OperatorId, TaskId};

/// What an event means when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A task enters the system
    Arrival,
    /// `operator` finishes its task and becomes free
    Completion { operator: OperatorId },
    /// A waiting task tries again for a free operator
    Retry { arrived_at: SimTime },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Arrival => "arrival",
            EventKind::Completion { .. } => "completion",
            EventKind::Retry { .. } => "retry",
        }
    }
}

/// Entry stored in the queue: a firing time, the task it concerns, and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: EventId,
    pub time: SimTime,
    pub task: TaskId,
    pub kind: EventKind,
}

impl Event {
    pub fn new(time: SimTime, task: TaskId, kind: EventKind) -> Self {
        Self {
            id: EventId(0),
            time,
            task,
            kind,
        }
    }

    pub fn arrival(time: SimTime, task: TaskId) -> Self {
        Self::new(time, task, EventKind::Arrival)
    }

    pub fn completion(time: SimTime, task: TaskId, operator: OperatorId) -> Self {
        Self::new(time, task, EventKind::Completion { operator })
    }

    pub fn retry(time: SimTime, task: TaskId, arrived_at: SimTime) -> Self {
        Self::new(time, task, EventKind::Retry { arrived_at })
    }

    /// Sequence number assigned when the event was inserted.
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn is_completion(&self) -> bool {
        matches!(self.kind, EventKind::Completion { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {} for {}", self.id, self.kind.name(), self.time, self.task)
    }
}

/// Time-ordered event queue with FIFO tie-breaking.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    next_event_id: u64,
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping ascending time order.
    ///
    /// The event goes after every queued event with the same timestamp.
    pub fn insert(&mut self, mut event: Event) -> EventId {
        event.id = self.next_id();
        let id = event.id;
        let index = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(index, event);
        id
    }

    /// Insert a retry so that waiting tasks are served in arrival order.
    ///
    /// The retry lands after every event at its timestamp, except retries of
    /// tasks that arrived later than this one, which it overtakes.
    pub fn insert_retry(&mut self, mut event: Event) -> EventId {
        let arrived_at = match event.kind {
            EventKind::Retry { arrived_at } => arrived_at,
            _ => return self.insert(event),
        };
        event.id = self.next_id();
        let id = event.id;
        let index = self
            .events
            .iter()
            .position(|e| {
                e.time > event.time
                    || (e.time == event.time
                        && matches!(e.kind, EventKind::Retry { arrived_at: other } if other > arrived_at))
            })
            .unwrap_or(self.events.len());
        self.events.insert(index, event);
        id
    }

    /// Remove and return the earliest event.
    ///
    /// # Errors
    ///
    /// [`EventError::EmptyQueue`] if there is nothing to pop.
    pub fn pop_front(&mut self) -> Result<Event, EventError> {
        self.events.pop_front().ok_or(EventError::EmptyQueue)
    }

    pub fn peek(&self) -> Option<&Event> {
        self.events.front()
    }

    /// Timestamp of the earliest event, if any.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.events.front().map(|e| e.time)
    }

    /// Time of the earliest pending completion, i.e. when some operator frees up.
    pub fn next_completion_time(&self) -> Option<SimTime> {
        self.events.iter().find(|e| e.is_completion()).map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Drop every event and restart sequence numbering.
    pub fn clear(&mut self) {
        self.events.clear();
        self.next_event_id = 0;
    }

    fn next_id(&mut self) -> EventId {
        self.next_event_id += 1;
        EventId(self.next_event_id)
    }
}
