//! One-shot timers for simulated agent work.
//!
//! The engine never sleeps. It asks a [`Scheduler`] to deliver a
//! [`ScheduledEvent`] after a delay and is handed the event back later
//! through `Action::Deliver`. [`ManualScheduler`] keeps a virtual clock so
//! tests can move time forward deterministically.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimerId(pub u64);

/// Work to perform when a timer fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledEvent {
    /// Post the synthetic agent answer for a user message
    AgentReply {
        message_id: u64,
        task_id: Option<u64>,
        input: String,
    },
}

pub trait Scheduler {
    /// Arrange for `event` to be delivered once after `delay`
    fn schedule(&mut self, delay: Duration, event: ScheduledEvent) -> TimerId;

    /// Cancel a pending timer. Returns false if it already fired or never existed.
    fn cancel(&mut self, id: TimerId) -> bool;
}

/// Virtual-time scheduler
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), ScheduledEvent>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Move the clock forward and return every event now due
    ///
    /// Events come back ordered by deadline, ties by the order they were scheduled.
    pub fn advance(&mut self, by: Duration) -> Vec<ScheduledEvent> {
        self.now += by;
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > self.now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, event: ScheduledEvent) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.queue.insert((self.now + delay, id), event);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|(_, timer), _| *timer != id);
        self.queue.len() != before
    }
}
