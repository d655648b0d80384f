use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;
use studio_cli::OutputFormat;
use studio_cli::commands;
use studio_cli::commands::chat::ChatOptions;
use studio_cli::commands::config::ConfigOverrides;

#[derive(Parser)]
#[command(name = "studio")]
#[command(author, version)]
#[command(
    about = "A control panel for a simulated browser automation agent",
    long_about = "Studio keeps the state of a browser automation session: LLM provider settings, \
                  a conversation with a simulated agent, running tasks, agents, form profiles \
                  and website credentials. No browser is driven and no LLM is called."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session on stdin
    Chat {
        /// Start with the agent active
        #[arg(long)]
        agent_active: bool,

        /// Delay before the simulated agent replies, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        reply_delay_ms: u64,

        /// LLM provider (openrouter, openai, anthropic, groq, ollama)
        #[arg(long)]
        provider: Option<String>,

        /// Model, must be offered by the provider
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature, clamped to 0.0-2.0
        #[arg(long)]
        temperature: Option<f64>,

        /// API key for the provider
        #[arg(long, env = "STUDIO_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Write a JSON snapshot of the session to this file on exit
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },

    /// Inspect LLM provider configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Inspect agent definitions
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Inspect form-filling profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n  bash, zsh, fish, powershell, elvish\n\n\
                            INSTALLATION:\n  \
                            bash:  studio completion --shell bash >> ~/.bashrc\n  \
                            zsh:   studio completion --shell zsh > ~/.zfunc/_studio\n         \
                            (add 'fpath=(~/.zfunc $fpath)' to ~/.zshrc)\n  \
                            fish:  studio completion --shell fish > ~/.config/fish/completions/studio.fish")]
    Completion {
        /// Target shell
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List providers and their models
    Providers,

    /// Show the effective configuration
    Show {
        /// Switch to this provider (resets the model to its default)
        #[arg(long)]
        provider: Option<String>,

        /// Select a model offered by the provider
        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature, clamped to 0.0-2.0
        #[arg(long)]
        temperature: Option<f64>,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List the available agent kinds
    Kinds,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List profile fields grouped by section
    Fields,

    /// Print an empty profile as JSON
    Template {
        /// Profile name
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Chat {
            agent_active,
            reply_delay_ms,
            provider,
            model,
            temperature,
            api_key,
            export,
        } => commands::chat::execute(
            ChatOptions {
                agent_active,
                reply_delay: Duration::from_millis(reply_delay_ms),
                overrides: ConfigOverrides {
                    provider,
                    model,
                    temperature,
                    api_key,
                },
                export,
            },
            cli.format,
        ),
        Commands::Config { command } => match command {
            ConfigCommands::Providers => commands::config::providers(cli.format),
            ConfigCommands::Show {
                provider,
                model,
                temperature,
            } => commands::config::show(
                &ConfigOverrides {
                    provider,
                    model,
                    temperature,
                    api_key: None,
                },
                cli.format,
            ),
        },
        Commands::Agent { command } => match command {
            AgentCommands::Kinds => commands::agent::kinds(cli.format),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Fields => commands::profile::fields(cli.format),
            ProfileCommands::Template { name } => commands::profile::template(name.as_deref()),
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("studio=debug,studio_core=debug,studio_runtime=debug")
    } else {
        EnvFilter::new("studio=info,studio_core=warn,studio_runtime=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
