//! Application state and its single mutation path.
//!
//! Every change to the studio goes through [`Studio::dispatch`]. Timer-driven
//! work (the simulated agent reply) is issued through the [`Scheduler`] the
//! studio was built with and comes back as [`Action::Deliver`].

use crate::agent::{AgentKind, AgentRegistry, AgentStatus};
use crate::config::{AdvancedSettings, BrowserConfig, Provider, SavedConfigs, ToolCallingMethod};
use crate::conversation::{ConversationLog, MessageKind, Sender};
use crate::credential::CredentialList;
use crate::preview::Preview;
use crate::profile::{ProfileField, ProfileStore};
use crate::scheduler::{ManualScheduler, ScheduledEvent, Scheduler, TimerId};
use crate::task::{Task, TaskTracker};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);
pub const EXECUTING_ACTION: &str = "Executing task";

/// How the chat panel drives the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Auto,
    Manual,
    Guided,
}

impl FromStr for ControlMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ControlMode::Auto),
            "manual" => Ok(ControlMode::Manual),
            "guided" => Ok(ControlMode::Guided),
            other => Err(Error::InvalidValue(format!("unknown mode '{}'", other))),
        }
    }
}

/// Everything the session knows, owned in one place
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub conversation: ConversationLog,
    pub tasks: TaskTracker,
    pub agents: AgentRegistry,
    pub profiles: ProfileStore,
    pub credentials: CredentialList,
    pub config: BrowserConfig,
    pub saved_configs: SavedConfigs,
    pub preview: Preview,
    pub agent_active: bool,
    pub mode: ControlMode,
}

#[derive(Debug, Clone)]
pub enum Action {
    SendMessage(String),
    SetAgentActive(bool),
    SetMode(ControlMode),
    Deliver(ScheduledEvent),

    LaunchTask { name: String },
    AdvanceTask { id: u64, progress: u32, action: Option<String> },
    StopTask(u64),

    CreateAgent { name: String, kind: AgentKind, prompt: String },
    ToggleAgent(u64),
    RemoveAgent(u64),

    CreateProfile(String),
    SelectProfile(String),
    UpdateProfileField { profile: String, field: ProfileField, value: String },

    AddCredential { site: String, username: String, auto_login: bool },
    RemoveCredential(u64),

    SetProvider(Provider),
    SetModel(String),
    SetApiKey(String),
    SetBaseUrl(String),
    SetTemperature(f64),
    SetMaxSteps(u32),
    SetMaxActionsPerStep(u32),
    SetUseVision(bool),
    SetEnableScreenshot(bool),
    SetToolCallingMethod(ToolCallingMethod),
    SetAdvanced(AdvancedSettings),
    SetWorkflowEndpoint(String),
    SetStorage { url: String, key: String },
    SaveConfig(String),
    LoadConfig(String),

    Navigate(String),
    ToggleRecording,
}

/// What a dispatched action did
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Input was accepted but ignored (blank message, nameless agent, ...)
    Unchanged,
    Updated,
    MessageSent {
        message_id: u64,
        task_id: Option<u64>,
        reply: Option<TimerId>,
    },
    ReplyPosted { message_id: u64 },
    TaskLaunched(u64),
    TaskUpdated(Task),
    AgentCreated(u64),
    AgentStatusChanged(AgentStatus),
    CredentialAdded(u64),
}

#[derive(Debug, Clone, Copy)]
struct PendingReply {
    timer: TimerId,
    task_id: Option<u64>,
}

pub struct Studio<S: Scheduler> {
    state: AppState,
    scheduler: S,
    reply_delay: Duration,
    /// Outstanding replies keyed by the user message that caused them
    pending: HashMap<u64, PendingReply>,
}

impl Default for Studio<ManualScheduler> {
    fn default() -> Self {
        Self::new(ManualScheduler::new())
    }
}

impl<S: Scheduler> Studio<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            state: AppState::default(),
            scheduler,
            reply_delay: DEFAULT_REPLY_DELAY,
            pending: HashMap::new(),
        }
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn reply_delay(&self) -> Duration {
        self.reply_delay
    }

    pub fn pending_replies(&self) -> usize {
        self.pending.len()
    }

    /// Apply one action to the state
    pub fn dispatch(&mut self, action: Action) -> Result<Outcome> {
        tracing::trace!(?action, "dispatch");
        match action {
            Action::SendMessage(text) => Ok(self.send_message(text)),
            Action::SetAgentActive(active) => {
                self.state.agent_active = active;
                tracing::debug!("Agent {}", if active { "active" } else { "inactive" });
                Ok(Outcome::Updated)
            }
            Action::SetMode(mode) => {
                self.state.mode = mode;
                Ok(Outcome::Updated)
            }
            Action::Deliver(event) => Ok(self.deliver(event)),

            Action::LaunchTask { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Ok(Outcome::Unchanged);
                }
                Ok(Outcome::TaskLaunched(self.launch_task(name, None)))
            }
            Action::AdvanceTask {
                id,
                progress,
                action,
            } => {
                let task = self.state.tasks.advance(id, progress, action.as_deref())?;
                Ok(Outcome::TaskUpdated(task))
            }
            Action::StopTask(id) => {
                let task = self.state.tasks.stop(id)?;
                self.cancel_replies_for(id);
                Ok(Outcome::TaskUpdated(task))
            }

            Action::CreateAgent { name, kind, prompt } => {
                Ok(match self.state.agents.create_agent(&name, kind, &prompt) {
                    Some(agent) => Outcome::AgentCreated(agent.id),
                    None => Outcome::Unchanged,
                })
            }
            Action::ToggleAgent(id) => Ok(Outcome::AgentStatusChanged(
                self.state.agents.toggle_status(id)?,
            )),
            Action::RemoveAgent(id) => {
                self.state.agents.remove(id)?;
                Ok(Outcome::Updated)
            }

            Action::CreateProfile(name) => {
                self.state.profiles.create_profile(&name)?;
                Ok(Outcome::Updated)
            }
            Action::SelectProfile(name) => {
                self.state.profiles.select_profile(&name)?;
                Ok(Outcome::Updated)
            }
            Action::UpdateProfileField {
                profile,
                field,
                value,
            } => {
                self.state.profiles.update_field(&profile, field, &value)?;
                Ok(Outcome::Updated)
            }

            Action::AddCredential {
                site,
                username,
                auto_login,
            } => Ok(match self.state.credentials.add(&site, &username, auto_login) {
                Some(credential) => Outcome::CredentialAdded(credential.id),
                None => Outcome::Unchanged,
            }),
            Action::RemoveCredential(id) => {
                self.state.credentials.remove(id)?;
                Ok(Outcome::Updated)
            }

            Action::SetProvider(provider) => {
                self.state.config.set_provider(provider);
                Ok(Outcome::Updated)
            }
            Action::SetModel(model) => {
                self.state.config.set_model(&model)?;
                Ok(Outcome::Updated)
            }
            Action::SetApiKey(key) => {
                self.state.config.set_api_key(&key);
                Ok(Outcome::Updated)
            }
            Action::SetBaseUrl(url) => {
                self.state.config.base_url = url;
                Ok(Outcome::Updated)
            }
            Action::SetTemperature(t) => {
                self.state.config.set_temperature(t);
                Ok(Outcome::Updated)
            }
            Action::SetMaxSteps(n) => {
                self.state.config.max_steps = n;
                Ok(Outcome::Updated)
            }
            Action::SetMaxActionsPerStep(n) => {
                self.state.config.max_actions_per_step = n;
                Ok(Outcome::Updated)
            }
            Action::SetUseVision(on) => {
                self.state.config.use_vision = on;
                Ok(Outcome::Updated)
            }
            Action::SetEnableScreenshot(on) => {
                self.state.config.enable_screenshot = on;
                Ok(Outcome::Updated)
            }
            Action::SetToolCallingMethod(method) => {
                self.state.config.tool_calling_method = method;
                Ok(Outcome::Updated)
            }
            Action::SetAdvanced(advanced) => {
                self.state.config.advanced = advanced;
                Ok(Outcome::Updated)
            }
            Action::SetWorkflowEndpoint(url) => {
                self.state.config.integrations.workflow_endpoint = url;
                Ok(Outcome::Updated)
            }
            Action::SetStorage { url, key } => {
                self.state.config.integrations.storage_url = url;
                self.state.config.integrations.storage_key = key;
                Ok(Outcome::Updated)
            }

            Action::SaveConfig(name) => {
                self.state.saved_configs.save(&name, &self.state.config)?;
                Ok(Outcome::Updated)
            }
            Action::LoadConfig(name) => {
                self.state.config = self.state.saved_configs.get(&name)?.clone();
                tracing::debug!("Loaded configuration '{}'", name);
                Ok(Outcome::Updated)
            }

            Action::Navigate(url) => {
                self.state.preview.navigate(&url)?;
                Ok(Outcome::Updated)
            }
            Action::ToggleRecording => {
                self.state.preview.toggle_recording();
                Ok(Outcome::Updated)
            }
        }
    }

    /// Pretty JSON of the whole state, secrets redacted
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    fn send_message(&mut self, text: String) -> Outcome {
        if text.trim().is_empty() {
            return Outcome::Unchanged;
        }

        let message_id = self.state.conversation.append(text.clone(), Sender::User, None).id;

        if !self.state.agent_active {
            return Outcome::MessageSent {
                message_id,
                task_id: None,
                reply: None,
            };
        }

        let task_id = self.launch_task(text.trim(), Some(message_id));
        let timer = self.scheduler.schedule(
            self.reply_delay,
            ScheduledEvent::AgentReply {
                message_id,
                task_id: Some(task_id),
                input: text,
            },
        );
        self.pending.insert(
            message_id,
            PendingReply {
                timer,
                task_id: Some(task_id),
            },
        );
        tracing::debug!(
            "Reply to message {} scheduled in {:?}",
            message_id,
            self.reply_delay
        );

        Outcome::MessageSent {
            message_id,
            task_id: Some(task_id),
            reply: Some(timer),
        }
    }

    fn deliver(&mut self, event: ScheduledEvent) -> Outcome {
        match event {
            ScheduledEvent::AgentReply {
                message_id,
                task_id,
                input,
            } => {
                // Events can race a cancellation in real-time schedulers
                if self.pending.remove(&message_id).is_none() {
                    tracing::debug!("Dropping reply for message {}: no longer pending", message_id);
                    return Outcome::Unchanged;
                }

                let reply = format!("Browser Agent: Executing task: \"{}\"", input);
                let reply_id = self
                    .state
                    .conversation
                    .append(reply, Sender::Agent, Some(MessageKind::BrowserAction))
                    .id;

                if let Some(task_id) = task_id {
                    if self.state.tasks.set_action(task_id, EXECUTING_ACTION).is_err() {
                        tracing::debug!("Task {} finished before the reply arrived", task_id);
                    }
                }

                tracing::info!("Agent replied to message {}", message_id);
                Outcome::ReplyPosted {
                    message_id: reply_id,
                }
            }
        }
    }

    fn launch_task(&mut self, name: &str, origin: Option<u64>) -> u64 {
        let config = &self.state.config;
        tracing::info!(
            provider = %config.provider(),
            model = config.model(),
            max_steps = config.max_steps,
            "Launching task: {}",
            name
        );
        self.state.tasks.launch(name, origin).id
    }

    fn cancel_replies_for(&mut self, task_id: u64) {
        let scheduler = &mut self.scheduler;
        self.pending.retain(|message_id, pending| {
            if pending.task_id == Some(task_id) {
                scheduler.cancel(pending.timer);
                tracing::debug!("Cancelled reply to message {}", message_id);
                false
            } else {
                true
            }
        });
    }
}

impl Studio<ManualScheduler> {
    /// Advance virtual time and apply every event that came due
    pub fn advance(&mut self, by: Duration) -> Result<Vec<Outcome>> {
        let due = self.scheduler.advance(by);
        due.into_iter()
            .map(|event| self.dispatch(Action::Deliver(event)))
            .collect()
    }
}
