use crate::domains::relativity::ObservationEvent;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Buffered,
    /// The insertion counter reached capacity and was reset; the caller owes a flush.
    FlushDue,
}

/// Fixed-capacity FIFO of the most recent observations.
///
/// `events.len() <= capacity` always holds. The insertion counter is
/// independent of the stored length: it counts pushes since the last flush
/// and wraps to zero exactly when it reaches `capacity`.
#[derive(Debug, Clone)]
pub struct EventHistoryWindow {
    capacity: usize,
    events: VecDeque<ObservationEvent>,
    counter: usize,
}

impl Default for EventHistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl EventHistoryWindow {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity + 1),
            counter: 0,
        }
    }

    pub fn push(&mut self, event: ObservationEvent) -> PushOutcome {
        self.events.push_back(event);
        if self.events.len() > self.capacity {
            self.events.pop_front();
        }

        self.counter += 1;
        if self.counter == self.capacity {
            self.counter = 0;
            PushOutcome::FlushDue
        } else {
            PushOutcome::Buffered
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Oldest first.
    pub fn events(&self) -> impl Iterator<Item = &ObservationEvent> {
        self.events.iter()
    }

    pub fn to_vec(&self) -> Vec<ObservationEvent> {
        self.events.iter().cloned().collect()
    }
}
