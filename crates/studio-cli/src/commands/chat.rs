//! Interactive chat session.
//!
//! Reads stdin line by line. Plain lines are sent to the conversation as
//! user messages; lines starting with `/` control the session. While the
//! agent is active every message launches a task and gets one simulated
//! reply after the configured delay. On end of input the session waits for
//! outstanding replies before exiting.
//!
//! # Examples
//!
//! ```bash
//! echo "book a flight" | studio chat --agent-active --reply-delay-ms 50
//! ```

use crate::OutputFormat;
use crate::commands::config::{self, ConfigKey, ConfigOverrides};
use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::time::Duration;
use studio_core::agent::AgentKind;
use studio_core::conversation::{Message, Sender};
use studio_core::profile::ProfileField;
use studio_core::studio::ControlMode;
use studio_core::task::Task;
use studio_core::{Action, AppState, Outcome};
use studio_runtime::Session;
use tokio::io::{AsyncBufReadExt, BufReader};

pub const HELP: &str = "\
Commands:
  <text>                         send a message
  /agent on|off                  activate or deactivate the agent
  /mode auto|manual|guided       set the control mode
  /launch <name>                 launch a task by hand
  /tasks                         list active tasks
  /advance <id> <pct> [action]   move a task forward
  /stop <id>                     stop a task (cancels its pending reply)
  /new-agent <kind> <name>       register an agent
  /agents                        list agents
  /toggle-agent <id>             flip an agent between active and inactive
  /remove-agent <id>             delete an agent
  /profile new|use <name>        create or select a profile
  /profile set <field> <value>   set a field on the selected profile
  /profile show                  print the selected profile
  /credential add <site> <user>  record a website login (no password)
  /credential rm <id>            remove a credential
  /credentials                   list credentials
  /config show                   print the current configuration
  /config set <key> <value>      change one setting (provider, model, api-key,
                                 base-url, temperature, max-steps, max-actions,
                                 vision, screenshots, tool-calling, headless,
                                 disable-images, block-ads, user-agent, timeout,
                                 max-parallel, workflow, storage-url, storage-key)
  /config save|load <name>       store or restore a named configuration
  /config saved                  list saved configurations
  /navigate <url>                point the preview at a URL
  /record                        toggle action recording
  /log                           print the whole conversation
  /help                          show this help
  /quit                          end the session";

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub agent_active: bool,
    pub reply_delay: Duration,
    pub overrides: ConfigOverrides,
    pub export: Option<PathBuf>,
}

/// Read-only views available from the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Tasks,
    Agents,
    Profile,
    Credentials,
    Config,
    SavedConfigs,
    Log,
}

/// One parsed input line
#[derive(Debug, Clone)]
pub enum Command {
    Do(Action),
    SetProfileField(ProfileField, String),
    SetConfig(ConfigKey, String),
    Show(View),
    Help,
    Quit,
}

fn parse_id(raw: Option<&str>, what: &str) -> Result<u64> {
    let raw = raw.ok_or_else(|| anyhow!("Missing {} id", what))?;
    raw.parse::<u64>()
        .map_err(|_| anyhow!("Invalid {} id: {}", what, raw))
}

fn rest(words: &[&str]) -> String {
    words.join(" ")
}

/// Parse one input line. Blank lines yield `None`.
///
/// Messages keep the line exactly as typed.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return Ok(Some(Command::Do(Action::SendMessage(line.to_string()))));
    };

    let words: Vec<&str> = command.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Err(anyhow!("Empty command. Type /help for a list."));
    };

    let parsed = match head {
        "agent" => match args.first().copied() {
            Some("on") => Command::Do(Action::SetAgentActive(true)),
            Some("off") => Command::Do(Action::SetAgentActive(false)),
            _ => return Err(anyhow!("Usage: /agent on|off")),
        },
        "mode" => {
            let mode = args
                .first()
                .ok_or_else(|| anyhow!("Usage: /mode auto|manual|guided"))?
                .parse::<ControlMode>()?;
            Command::Do(Action::SetMode(mode))
        }
        "launch" => {
            if args.is_empty() {
                return Err(anyhow!("Usage: /launch <name>"));
            }
            Command::Do(Action::LaunchTask { name: rest(args) })
        }
        "tasks" => Command::Show(View::Tasks),
        "advance" => {
            let id = parse_id(args.first().copied(), "task")?;
            let raw = args
                .get(1)
                .ok_or_else(|| anyhow!("Usage: /advance <id> <pct> [action]"))?;
            let progress = raw
                .trim_end_matches('%')
                .parse::<u32>()
                .map_err(|_| anyhow!("Invalid progress: {}", raw))?;
            let action = args.get(2..).filter(|a| !a.is_empty()).map(rest);
            Command::Do(Action::AdvanceTask {
                id,
                progress,
                action,
            })
        }
        "stop" => Command::Do(Action::StopTask(parse_id(args.first().copied(), "task")?)),
        "new-agent" => {
            let kind = args
                .first()
                .ok_or_else(|| anyhow!("Usage: /new-agent <kind> <name>"))?
                .parse::<AgentKind>()?;
            Command::Do(Action::CreateAgent {
                name: rest(&args[1..]),
                kind,
                prompt: String::new(),
            })
        }
        "agents" => Command::Show(View::Agents),
        "toggle-agent" => Command::Do(Action::ToggleAgent(parse_id(args.first().copied(), "agent")?)),
        "remove-agent" => Command::Do(Action::RemoveAgent(parse_id(args.first().copied(), "agent")?)),
        "profile" => match args {
            ["new", name @ ..] if !name.is_empty() => Command::Do(Action::CreateProfile(rest(name))),
            ["use", name @ ..] if !name.is_empty() => Command::Do(Action::SelectProfile(rest(name))),
            ["set", field, value @ ..] => {
                Command::SetProfileField(field.parse::<ProfileField>()?, rest(value))
            }
            ["show"] => Command::Show(View::Profile),
            _ => return Err(anyhow!("Usage: /profile new|use <name> | set <field> <value> | show")),
        },
        "credential" => match args {
            ["add", site, username @ ..] => Command::Do(Action::AddCredential {
                site: site.to_string(),
                username: rest(username),
                auto_login: true,
            }),
            ["rm", id] => Command::Do(Action::RemoveCredential(parse_id(Some(*id), "credential")?)),
            _ => return Err(anyhow!("Usage: /credential add <site> <user> | rm <id>")),
        },
        "credentials" => Command::Show(View::Credentials),
        "config" => match args {
            ["show"] => Command::Show(View::Config),
            ["set", key, value @ ..] if !value.is_empty() => {
                Command::SetConfig(key.parse::<ConfigKey>()?, rest(value))
            }
            ["save", name @ ..] if !name.is_empty() => Command::Do(Action::SaveConfig(rest(name))),
            ["load", name @ ..] if !name.is_empty() => Command::Do(Action::LoadConfig(rest(name))),
            ["saved"] => Command::Show(View::SavedConfigs),
            _ => {
                return Err(anyhow!(
                    "Usage: /config show | set <key> <value> | save <name> | load <name> | saved"
                ));
            }
        },
        "navigate" => {
            let url = args.first().ok_or_else(|| anyhow!("Usage: /navigate <url>"))?;
            Command::Do(Action::Navigate(url.to_string()))
        }
        "record" => Command::Do(Action::ToggleRecording),
        "log" => Command::Show(View::Log),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("Unknown command: /{}. Type /help for a list.", other)),
    };

    Ok(Some(parsed))
}

pub fn execute(options: ChatOptions, format: OutputFormat) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(options, format))
}

async fn run(options: ChatOptions, format: OutputFormat) -> Result<()> {
    tracing::debug!(
        "Starting chat session (reply delay {:?}, format {})",
        options.reply_delay,
        format.as_str()
    );

    let mut session = Session::new(options.reply_delay);
    for action in options.overrides.actions()? {
        session.dispatch(action)?;
    }
    session.dispatch(Action::SetAgentActive(options.agent_active))?;

    let printer = Printer { format };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => handle(&mut session, command, &printer),
                    Ok(None) => {}
                    Err(e) => eprintln!("⚠️  {}", e),
                }
            }
            reply = session.next_reply() => {
                let outcome = reply?;
                printer.outcome(session.studio().state(), &outcome);
            }
        }
    }

    if session.studio().pending_replies() > 0 {
        tracing::info!(
            "Waiting for {} pending repl(ies)",
            session.studio().pending_replies()
        );
    }
    for outcome in session.drain().await? {
        printer.outcome(session.studio().state(), &outcome);
    }

    if let Some(path) = options.export {
        session.export(&path)?;
        eprintln!("Session exported to: {}", path.display());
    }

    Ok(())
}

fn handle(session: &mut Session, command: Command, printer: &Printer) {
    match apply(session, command, printer) {
        Ok(Some(outcome)) => printer.outcome(session.studio().state(), &outcome),
        Ok(None) => {}
        Err(e) => {
            tracing::debug!("Command rejected: {:?}", e);
            eprintln!("⚠️  {}", e);
        }
    }
}

fn apply(session: &mut Session, command: Command, printer: &Printer) -> Result<Option<Outcome>> {
    let action = match command {
        Command::Do(action) => action,
        Command::SetProfileField(field, value) => Action::UpdateProfileField {
            profile: session.studio().state().profiles.selected_name().to_string(),
            field,
            value,
        },
        Command::SetConfig(key, value) => key.action(&value, &session.studio().state().config)?,
        Command::Show(view) => {
            printer.view(session.studio().state(), view);
            return Ok(None);
        }
        Command::Help => {
            println!("{}", HELP);
            return Ok(None);
        }
        Command::Quit => return Ok(None),
    };

    Ok(Some(session.dispatch(action)?))
}

struct Printer {
    format: OutputFormat,
}

impl Printer {
    fn outcome(&self, state: &AppState, outcome: &Outcome) {
        match outcome {
            Outcome::MessageSent {
                message_id,
                task_id,
                ..
            } => {
                if let Some(message) = state.conversation.get(*message_id) {
                    self.message(message);
                }
                if let (Some(id), OutputFormat::Pretty) = (task_id, self.format) {
                    println!("  ↳ task #{} launched", id);
                }
            }
            Outcome::ReplyPosted { message_id } => {
                if let Some(message) = state.conversation.get(*message_id) {
                    self.message(message);
                }
            }
            Outcome::TaskLaunched(id) => {
                if let Some(task) = state.tasks.get(*id) {
                    self.tasks(std::slice::from_ref(task));
                }
            }
            Outcome::TaskUpdated(task) => self.tasks(std::slice::from_ref(task)),
            Outcome::AgentCreated(id) => println!("✅ Agent #{} created", id),
            Outcome::AgentStatusChanged(status) => println!("Agent status: {:?}", status),
            Outcome::CredentialAdded(id) => println!("✅ Credential #{} added", id),
            Outcome::Updated | Outcome::Unchanged => {}
        }
    }

    fn message(&self, message: &Message) {
        match self.format {
            OutputFormat::Json => match serde_json::to_string(message) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("⚠️  {}", e),
            },
            OutputFormat::Table => println!(
                "{},{},{}",
                message.id,
                sender_label(message.sender),
                quoted(&message.text)
            ),
            OutputFormat::Pretty => {
                use console::style;

                let time = message.timestamp.format("%H:%M:%S");
                let label = match message.sender {
                    Sender::User => style("[you]").blue().bold(),
                    Sender::Agent => style("[agent]").magenta().bold(),
                };
                println!("{} {} {}", style(time).dim(), label, message.text);
            }
        }
    }

    fn tasks(&self, tasks: &[Task]) {
        match self.format {
            OutputFormat::Json => self.json(&tasks),
            OutputFormat::Table => {
                for task in tasks {
                    println!("{}", task_row(task));
                }
            }
            OutputFormat::Pretty => {
                for task in tasks {
                    println!(
                        "#{:<3} {:>3}%  {:<9} {} steps  {:<16} {}",
                        task.id,
                        task.progress,
                        format!("{:?}", task.state).to_lowercase(),
                        task.steps,
                        task.current_action,
                        task.name
                    );
                }
            }
        }
    }

    fn view(&self, state: &AppState, view: View) {
        match view {
            View::Tasks => {
                if state.tasks.is_empty() && self.format == OutputFormat::Pretty {
                    println!("No active browser tasks");
                } else {
                    self.tasks(state.tasks.list());
                }
            }
            View::Log => {
                for message in state.conversation.list() {
                    self.message(message);
                }
            }
            View::Agents => match self.format {
                OutputFormat::Pretty => {
                    if state.agents.is_empty() {
                        println!("No agents");
                    }
                    for agent in state.agents.list() {
                        println!(
                            "#{:<3} {:<20} {:<18} {:?}",
                            agent.id, agent.name, agent.kind, agent.status
                        );
                    }
                }
                _ => self.json(&state.agents.list()),
            },
            View::Profile => match state.profiles.selected() {
                Some(profile) => self.json(profile),
                None => eprintln!("⚠️  No profile selected"),
            },
            View::Config => match config::render(&state.config, self.format) {
                Ok(output) => print!("{}", output),
                Err(e) => eprintln!("⚠️  {}", e),
            },
            View::SavedConfigs => match self.format {
                OutputFormat::Pretty => {
                    if state.saved_configs.is_empty() {
                        println!("No saved configurations");
                    }
                    for saved in state.saved_configs.list() {
                        println!(
                            "{:<20} {} / {}",
                            saved.name,
                            saved.config.provider(),
                            saved.config.model()
                        );
                    }
                }
                _ => self.json(&state.saved_configs.list()),
            },
            View::Credentials => match self.format {
                OutputFormat::Pretty => {
                    if state.credentials.is_empty() {
                        println!("No credentials");
                    }
                    for credential in state.credentials.list() {
                        println!(
                            "#{:<3} {:<20} {}{}",
                            credential.id,
                            credential.site,
                            credential.username,
                            if credential.auto_login { "  (auto-login)" } else { "" }
                        );
                    }
                }
                _ => self.json(&state.credentials.list()),
            },
        }
    }

    fn json<T: serde::Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("⚠️  {}", e),
        }
    }
}

/// CSV field with embedded quotes doubled
fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn task_row(task: &Task) -> String {
    format!(
        "{},{},{},{},{},{}",
        task.id,
        format!("{:?}", task.state).to_lowercase(),
        task.progress,
        task.steps,
        quoted(&task.name),
        quoted(&task.current_action)
    )
}

fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Agent => "agent",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(line: &str) -> Action {
        match parse_line(line).unwrap() {
            Some(Command::Do(action)) => action,
            other => panic!("expected an action for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn test_plain_text_is_a_message() {
        assert!(matches!(
            action("  book a flight "),
            Action::SendMessage(text) if text == "  book a flight "
        ));
    }

    #[test]
    fn test_blank_line_is_skipped() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn test_agent_toggle() {
        assert!(matches!(action("/agent on"), Action::SetAgentActive(true)));
        assert!(matches!(action("/agent off"), Action::SetAgentActive(false)));
        assert!(parse_line("/agent maybe").is_err());
    }

    #[test]
    fn test_advance_with_action_label() {
        match action("/advance 3 40% Filling checkout form") {
            Action::AdvanceTask {
                id,
                progress,
                action,
            } => {
                assert_eq!(id, 3);
                assert_eq!(progress, 40);
                assert_eq!(action.as_deref(), Some("Filling checkout form"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            action("/advance 3 50"),
            Action::AdvanceTask { action: None, .. }
        ));
        assert!(parse_line("/advance x 50").is_err());
    }

    #[test]
    fn test_new_agent_allows_empty_name() {
        // an empty name reaches the registry, which ignores it
        assert!(matches!(
            action("/new-agent web-scraper"),
            Action::CreateAgent { name, kind: AgentKind::WebScraper, .. } if name.is_empty()
        ));
        assert!(parse_line("/new-agent robot Bob").is_err());
    }

    #[test]
    fn test_profile_commands() {
        assert!(matches!(
            action("/profile use business"),
            Action::SelectProfile(name) if name == "business"
        ));
        match parse_line("/profile set email jane@example.com").unwrap() {
            Some(Command::SetProfileField(field, value)) => {
                assert_eq!(field, ProfileField::Email);
                assert_eq!(value, "jane@example.com");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_line("/profile set shoeSize 42").is_err());
        assert!(matches!(
            parse_line("/profile show").unwrap(),
            Some(Command::Show(View::Profile))
        ));
    }

    #[test]
    fn test_config_commands() {
        match parse_line("/config set base-url http://localhost:8080/v1").unwrap() {
            Some(Command::SetConfig(key, value)) => {
                assert_eq!(key, ConfigKey::BaseUrl);
                assert_eq!(value, "http://localhost:8080/v1");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            action("/config save local llm"),
            Action::SaveConfig(name) if name == "local llm"
        ));
        assert!(matches!(
            parse_line("/config show").unwrap(),
            Some(Command::Show(View::Config))
        ));
        assert!(parse_line("/config set max-steps").is_err());
        assert!(parse_line("/config set colour blue").is_err());
    }

    #[test]
    fn test_task_row_quotes_text_columns() {
        let mut tracker = studio_core::task::TaskTracker::new();
        let id = tracker.launch("say \"hi\"", None).id;
        let task = tracker
            .advance(id, 30, Some("Typing \"hello\""))
            .unwrap();

        assert_eq!(
            task_row(&task),
            format!("{},running,30,1,\"say \"\"hi\"\"\",\"Typing \"\"hello\"\"\"", id)
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_line("/dance").unwrap_err();
        assert!(err.to_string().contains("Unknown command"));
    }

    #[test]
    fn test_quit_aliases() {
        assert!(matches!(parse_line("/quit").unwrap(), Some(Command::Quit)));
        assert!(matches!(parse_line("/exit").unwrap(), Some(Command::Quit)));
    }
}
