use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const INITIAL_ACTION: &str = "Planning";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Idle,
    Running,
    Completed,
    Stopped,
}

/// A unit of simulated automation work
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub name: String,
    /// Percentage in 0..=100, never decreasing
    pub progress: u8,
    pub current_action: String,
    pub steps: u32,
    pub state: TaskState,
    /// Conversation message that launched the task, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_message: Option<u64>,
    pub started_at: DateTime<Utc>,
}

impl Task {
    fn new(id: u64, name: String, origin_message: Option<u64>) -> Self {
        Self {
            id,
            name,
            progress: 0,
            current_action: INITIAL_ACTION.to_string(),
            steps: 0,
            state: TaskState::Idle,
            origin_message,
            started_at: Utc::now(),
        }
    }
}

/// Tracks running tasks; finished ones leave the active set
#[derive(Debug, Default, Serialize)]
pub struct TaskTracker {
    active: Vec<Task>,
    #[serde(skip)]
    next_id: u64,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task and move it straight to `running`
    pub fn launch(&mut self, name: &str, origin_message: Option<u64>) -> &Task {
        self.next_id += 1;
        let mut task = Task::new(self.next_id, name.to_string(), origin_message);
        task.state = TaskState::Running;
        tracing::debug!("Task {} running: {}", task.id, task.name);
        self.active.push(task);
        &self.active[self.active.len() - 1]
    }

    /// Move a task forward
    ///
    /// Progress above 100 is clamped. A value lower than the current one is
    /// rejected. Reaching 100 completes the task and removes it from the
    /// active set; the returned snapshot then has state `completed`.
    pub fn advance(&mut self, id: u64, progress: u32, action: Option<&str>) -> Result<Task> {
        let idx = self.index_of(id)?;
        let requested = progress.min(100) as u8;
        let task = &mut self.active[idx];

        if requested < task.progress {
            return Err(Error::ProgressRegression {
                id,
                current: task.progress,
                requested,
            });
        }

        task.progress = requested;
        task.steps += 1;
        if let Some(action) = action {
            task.current_action = action.to_string();
        }

        if task.progress == 100 {
            let mut done = self.active.remove(idx);
            done.state = TaskState::Completed;
            tracing::debug!("Task {} completed after {} steps", done.id, done.steps);
            return Ok(done);
        }

        Ok(task.clone())
    }

    /// Change the current-action label without counting a step
    pub fn set_action(&mut self, id: u64, action: &str) -> Result<()> {
        let idx = self.index_of(id)?;
        self.active[idx].current_action = action.to_string();
        Ok(())
    }

    /// Stop a running task and drop it from the active set
    pub fn stop(&mut self, id: u64) -> Result<Task> {
        let idx = self.index_of(id)?;
        let mut stopped = self.active.remove(idx);
        stopped.state = TaskState::Stopped;
        tracing::debug!("Task {} stopped at {}%", stopped.id, stopped.progress);
        Ok(stopped)
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.active.iter().find(|t| t.id == id)
    }

    pub fn list(&self) -> &[Task] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        self.active
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_starts_running_at_zero() {
        let mut tracker = TaskTracker::new();
        let task = tracker.launch("book a flight", Some(1));

        assert_eq!(task.state, TaskState::Running);
        assert_eq!(task.progress, 0);
        assert_eq!(task.current_action, INITIAL_ACTION);
        assert_eq!(task.origin_message, Some(1));
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut tracker = TaskTracker::new();
        let id = tracker.launch("scrape", None).id;

        tracker.advance(id, 40, Some("Opening page")).unwrap();
        let err = tracker.advance(id, 10, None).unwrap_err();
        assert!(matches!(
            err,
            Error::ProgressRegression {
                current: 40,
                requested: 10,
                ..
            }
        ));

        let task = tracker.advance(id, 40, None).unwrap();
        assert_eq!(task.progress, 40);
        assert_eq!(task.steps, 2);
        assert_eq!(task.current_action, "Opening page");
    }

    #[test]
    fn test_advance_to_full_completes_and_removes() {
        let mut tracker = TaskTracker::new();
        let id = tracker.launch("fill form", None).id;

        let task = tracker.advance(id, 250, Some("Submitting")).unwrap();
        assert_eq!(task.progress, 100);
        assert_eq!(task.state, TaskState::Completed);
        assert!(tracker.get(id).is_none());
        assert!(tracker.advance(id, 100, None).is_err());
    }

    #[test]
    fn test_stop_removes_task() {
        let mut tracker = TaskTracker::new();
        let a = tracker.launch("a", None).id;
        let b = tracker.launch("b", None).id;

        let stopped = tracker.stop(a).unwrap();
        assert_eq!(stopped.state, TaskState::Stopped);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.list()[0].id, b);
        assert!(matches!(tracker.stop(a), Err(Error::TaskNotFound(_))));
    }

    #[test]
    fn test_set_action_does_not_count_step() {
        let mut tracker = TaskTracker::new();
        let id = tracker.launch("a", None).id;
        tracker.set_action(id, "Executing task").unwrap();

        let task = tracker.get(id).unwrap();
        assert_eq!(task.current_action, "Executing task");
        assert_eq!(task.steps, 0);
    }
}
