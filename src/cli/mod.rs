//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments, applies configuration, and starts
//! the selected chat surface.

pub mod line_chat;
pub mod mode;
pub mod model_list;
pub mod pick_model;

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::cli::line_chat::run_line_chat;
use crate::cli::mode::choose_mode;
use crate::cli::model_list::list_models;
use crate::cli::pick_model::choose_model;
use crate::core::chat_stream::OllamaClient;
use crate::core::config::{ChatMode, Config};
use crate::core::discovery::discover_models;
use crate::core::session::{ModelDescriptor, SessionContext};
use crate::core::turn::TurnCoordinator;
use crate::ui::chat_loop::run_windowed_chat;
use crate::utils::logging::{init_tracing, TranscriptLog};

#[derive(Parser)]
#[command(name = "thinkchat")]
#[command(version)]
#[command(about = "Chat with a reasoning model served by a local Ollama instance")]
#[command(
    long_about = "thinkchat talks to a model hosted by a local Ollama server. Replies are \
streamed, and any <think>...</think> reasoning is removed before the answer is shown.\n\n\
Environment Variables:\n\
  OLLAMA_HOST       Server address used when neither --base-url nor the config sets one\n\
  THINKCHAT_LOG     Diagnostics filter (e.g. 'debug', 'thinkchat=trace'; default 'warn')\n\n\
Line mode:\n\
  Type a question and press Enter; 'exit' or 'quit' ends the session.\n\n\
Window mode:\n\
  Enter             Send the message\n\
  PgUp/PgDn         Scroll the conversation\n\
  Esc, Ctrl+C       Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to chat with; skips the model menu
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Conversation interface; skips the mode menu
    #[arg(long, global = true, value_enum)]
    pub mode: Option<ChatMode>,

    /// Ollama server address (default http://localhost:11434)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Append the conversation transcript to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a chat session (default)
    Chat,
    /// List the models installed on the server
    Models,
    /// Set a configuration value, or show the configuration when no value is given
    Set {
        /// Configuration key to set
        key: String,
        /// Value for the key (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let mut args = Args::parse();
    let mut config = Config::load()?;

    match args.command.take() {
        Some(Commands::Set { key, value }) => {
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            if let Err(e) = config.set_value(&key, &value) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Some(Commands::Unset { key }) => {
            if let Err(e) = config.unset_value(&key) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Some(Commands::Models) => {
            let base_url = resolve_base_url(&args, &config);
            list_models(&base_url, config.default_model.as_deref()).await
        }
        Some(Commands::Chat) | None => run_chat(args, config).await,
    }
}

fn resolve_base_url(args: &Args, config: &Config) -> String {
    let env_host = std::env::var("OLLAMA_HOST").ok();
    config.resolve_base_url(args.base_url.as_deref(), env_host.as_deref())
}

async fn run_chat(args: Args, config: Config) -> Result<(), Box<dyn Error>> {
    println!("Welcome to thinkchat!");

    let mode = match args.mode.or(config.default_mode) {
        Some(mode) => mode,
        None => choose_mode(&mut io::stdin().lock(), &mut io::stdout())?,
    };
    init_tracing(mode, config.diagnostics_file.as_deref());

    let base_url = resolve_base_url(&args, &config);
    let http = reqwest::Client::new();

    let model = match args.model.clone().or_else(|| config.default_model.clone()) {
        Some(name) => ModelDescriptor::new(name),
        None => {
            let models = discover_models(&http, &base_url).await;
            choose_model(&models, &mut io::stdin().lock(), &mut io::stdout())?
        }
    };
    tracing::debug!(%base_url, %model, %mode, "starting chat session");

    let client = Arc::new(OllamaClient::new(http, base_url));
    let session =
        SessionContext::new(client, model).with_failed_turns(config.include_failed_turns());
    let mut coordinator = TurnCoordinator::new(session);
    let transcript = TranscriptLog::new(args.log)?;

    match mode {
        ChatMode::Cli => {
            run_line_chat(
                &mut io::stdin().lock(),
                &mut io::stdout(),
                &mut coordinator,
                &transcript,
            )
            .await
        }
        ChatMode::Ui => run_windowed_chat(coordinator, &transcript).await,
    }
}
