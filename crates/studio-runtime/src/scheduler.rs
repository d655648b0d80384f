use std::collections::HashMap;
use std::time::Duration;
use studio_core::scheduler::{ScheduledEvent, Scheduler, TimerId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// An event whose timer has elapsed
#[derive(Debug)]
pub struct Fired {
    pub timer: TimerId,
    pub event: ScheduledEvent,
}

/// Wall-clock scheduler backed by tokio timers
///
/// Each timer is a spawned task that sleeps and then sends the event over an
/// unbounded channel. Cancelling aborts the task. `schedule` must be called
/// from within a tokio runtime.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<Fired>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    next_id: u64,
}

impl TokioScheduler {
    /// Create a scheduler and the receiver its events arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                timers: HashMap::new(),
                next_id: 0,
            },
            rx,
        )
    }

    /// Forget the handle of a timer that has fired
    pub fn release(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    /// Timers spawned and not yet released or cancelled
    pub fn outstanding(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, event: ScheduledEvent) -> TimerId {
        self.next_id += 1;
        let timer = TimerId(self.next_id);
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(Fired { timer, event }).is_err() {
                tracing::debug!("Timer {:?} fired after the session ended", timer);
            }
        });

        self.timers.insert(timer, handle);
        timer
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.remove(&id) {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(message_id: u64) -> ScheduledEvent {
        ScheduledEvent::AgentReply {
            message_id,
            task_id: None,
            input: "go".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (mut scheduler, mut rx) = TokioScheduler::new();
        let id = scheduler.schedule(Duration::from_millis(1000), reply(7));

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(rx.try_recv().is_err());

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.timer, id);
        assert_eq!(fired.event, reply(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_is_not_delivered() {
        let (mut scheduler, mut rx) = TokioScheduler::new();
        let cancelled = scheduler.schedule(Duration::from_millis(100), reply(1));
        let kept = scheduler.schedule(Duration::from_millis(200), reply(2));

        assert!(scheduler.cancel(cancelled));
        assert!(!scheduler.cancel(cancelled));

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.timer, kept);
        scheduler.release(kept);
        assert_eq!(scheduler.outstanding(), 0);
    }
}
