use crate::scheduler::{Fired, TokioScheduler};
use crate::{Error, Result};
use std::path::Path;
use std::time::Duration;
use studio_core::{Action, Outcome, Studio};
use tokio::sync::mpsc;

/// A studio running against the wall clock
///
/// Actions are applied immediately; replies arrive later through
/// [`Session::next_reply`], which the caller polls alongside its own input.
pub struct Session {
    studio: Studio<TokioScheduler>,
    fired: mpsc::UnboundedReceiver<Fired>,
}

impl Session {
    pub fn new(reply_delay: Duration) -> Self {
        let (scheduler, fired) = TokioScheduler::new();
        Self {
            studio: Studio::new(scheduler).with_reply_delay(reply_delay),
            fired,
        }
    }

    pub fn studio(&self) -> &Studio<TokioScheduler> {
        &self.studio
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Outcome> {
        Ok(self.studio.dispatch(action)?)
    }

    /// Wait for the next timer and apply it
    ///
    /// Pends forever while nothing is scheduled, so it is meant to be one
    /// branch of a `tokio::select!`.
    pub async fn next_reply(&mut self) -> Result<Outcome> {
        let Fired { timer, event } = self.fired.recv().await.ok_or(Error::ChannelClosed)?;
        self.studio.scheduler_mut().release(timer);
        tracing::debug!("Timer {:?} fired", timer);
        Ok(self.studio.dispatch(Action::Deliver(event))?)
    }

    /// Write the state snapshot to `path`
    pub fn export(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.studio.snapshot_json()?)?;
        tracing::debug!("Snapshot written to {}", path.display());
        Ok(())
    }

    /// Apply replies until none are outstanding
    pub async fn drain(&mut self) -> Result<Vec<Outcome>> {
        let mut outcomes = Vec::new();
        while self.studio.pending_replies() > 0 {
            outcomes.push(self.next_reply().await?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::conversation::Sender;

    #[tokio::test(start_paused = true)]
    async fn test_drain_delivers_every_reply() {
        let mut session = Session::new(Duration::from_millis(1000));
        session.dispatch(Action::SetAgentActive(true)).unwrap();
        session
            .dispatch(Action::SendMessage("book a flight".to_string()))
            .unwrap();
        session
            .dispatch(Action::SendMessage("check email".to_string()))
            .unwrap();

        let outcomes = session.drain().await.unwrap();
        assert_eq!(outcomes.len(), 2);

        let log = &session.studio().state().conversation;
        assert_eq!(log.count_by(Sender::Agent), 2);
        assert_eq!(session.studio().scheduler().outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_reply_skips_it() {
        let mut session = Session::new(Duration::from_millis(1000));
        session.dispatch(Action::SetAgentActive(true)).unwrap();
        session
            .dispatch(Action::SendMessage("slow task".to_string()))
            .unwrap();
        let task_id = session.studio().state().tasks.list()[0].id;

        session.dispatch(Action::StopTask(task_id)).unwrap();
        let outcomes = session.drain().await.unwrap();

        assert!(outcomes.is_empty());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            session.studio().state().conversation.count_by(Sender::Agent),
            0
        );
    }

    #[tokio::test]
    async fn test_export_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let mut session = Session::new(Duration::from_millis(10));
        session
            .dispatch(Action::SendMessage("hello".to_string()))
            .unwrap();
        session.export(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"hello\""));
    }

    #[tokio::test]
    async fn test_export_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("snapshot.json");

        let session = Session::new(Duration::from_millis(10));
        assert!(matches!(session.export(&path), Err(Error::Io(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_session_schedules_nothing() {
        let mut session = Session::new(Duration::from_millis(10));
        session.dispatch(Action::SendMessage("hello".to_string())).unwrap();

        assert!(session.drain().await.unwrap().is_empty());
        assert_eq!(session.studio().scheduler().outstanding(), 0);
    }
}
