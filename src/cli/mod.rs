//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;
pub mod settings;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::api::system::{fetch_assistants, fetch_health, sorted_assistant_names};
use crate::cli::say::run_say;
use crate::core::config::data::Config;
use crate::core::config::defaults::retry_delay_from_ms;
use crate::ui::chat_loop::{run_chat, ChatOptions};
use crate::utils::url::Endpoints;

/// Environment variable holding the diagnostic log filter.
pub const LOG_ENV: &str = "CRYSTAL_LOG";

#[derive(Parser)]
#[command(name = "crystal")]
#[command(about = "A terminal chat client for a Crystal assistant backend")]
#[command(
    long_about = "Crystal talks to an assistant backend over a WebSocket and falls back to \
plain HTTP whenever the live connection is down, so messages always get through.\n\n\
Environment Variables:\n\
  CRYSTAL_LOG       Diagnostic log filter written to stderr (default: warn)\n\n\
Commands:\n\
  /status           Show connection and logging status\n\
  /log <filename>   Enable logging to specified file\n\
  /log              Toggle logging pause/resume\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend origin, e.g. http://localhost:8000
    #[arg(short = 's', long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Assistant to talk to
    #[arg(short = 'a', long, global = true)]
    pub assistant: Option<String>,

    /// Delay between live reconnect attempts
    #[arg(long, global = true, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,

    /// Show the actions the backend reports for each reply
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Say {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Check that the backend is up
    Health,
    /// List the assistants the backend offers
    Assistants,
    /// Set configuration values, or print them all when no key is given
    Set {
        key: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset { key: String },
}

impl Args {
    /// Flags win over the config file, which wins over built-in defaults.
    pub fn chat_options(&self, config: &Config) -> ChatOptions {
        ChatOptions {
            server: self
                .server
                .clone()
                .unwrap_or_else(|| config.server_or_default().to_string()),
            assistant: self
                .assistant
                .clone()
                .unwrap_or_else(|| config.assistant_or_default().to_string()),
            retry_delay: self
                .retry_delay_ms
                .map(retry_delay_from_ms)
                .unwrap_or_else(|| config.retry_delay()),
            log_file: self.log.clone().or_else(|| config.log_file.clone()),
            verbose: self.verbose,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };
    let options = args.chat_options(&config);

    match args.command {
        None | Some(Commands::Chat) => run_chat(options).await,
        Some(Commands::Say { prompt }) => run_say(prompt, options).await,
        Some(Commands::Health) => {
            let endpoints = resolve_endpoints(&options.server);
            let health = fetch_health(&reqwest::Client::new(), &endpoints.health).await?;
            println!("Server: {}", endpoints.origin);
            println!("  status: {}", health.status);
            if let Some(app) = &health.app {
                println!("  app: {app}");
            }
            if let Some(version) = &health.version {
                println!("  version: {version}");
            }
            if !health.assistants.is_empty() {
                println!("  assistants: {}", health.assistants.join(", "));
            }
            Ok(())
        }
        Some(Commands::Assistants) => {
            let endpoints = resolve_endpoints(&options.server);
            let response = fetch_assistants(&reqwest::Client::new(), &endpoints.assistants).await?;
            println!("Available assistants ({}):", response.count);
            for name in sorted_assistant_names(&response) {
                let marker = if name == options.assistant { " (selected)" } else { "" };
                println!("  {name}{marker}");
            }
            Ok(())
        }
        Some(Commands::Set { key: None, .. }) => {
            config.print_all();
            Ok(())
        }
        Some(Commands::Set {
            key: Some(key),
            value,
        }) => {
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            match settings::set(&key, &value) {
                Ok(message) => println!("{message}"),
                Err(err) => {
                    err.print();
                    std::process::exit(err.exit_code());
                }
            }
            Ok(())
        }
        Some(Commands::Unset { key }) => {
            match settings::unset(&key) {
                Ok(message) => println!("{message}"),
                Err(err) => {
                    err.print();
                    std::process::exit(err.exit_code());
                }
            }
            Ok(())
        }
    }
}

fn resolve_endpoints(server: &str) -> Endpoints {
    match Endpoints::from_origin(server) {
        Ok(endpoints) => endpoints,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    }
}
