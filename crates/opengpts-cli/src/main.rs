//! # opengpts
//!
//! Command-line access to per-user assistants, threads and thread messages,
//! plus document ingestion into an assistant's retrieval index.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use opengpts_ingest::{IngestBinding, IngestPipeline};
use opengpts_settings::{OpenGptsSettings, load_settings, load_settings_from_path};
use opengpts_storage::Storage;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// `OpenGPTs` storage command line.
#[derive(Parser, Debug)]
#[command(name = "opengpts", about = "Inspect and edit OpenGPTs assistants and threads")]
struct Cli {
    /// Settings file (defaults to `~/.opengpts/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Store URL (overrides settings and `REDIS_URL`).
    #[arg(long, global = true)]
    store_url: Option<String>,

    /// Log filter directive (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assistant records.
    #[command(subcommand)]
    Assistants(AssistantCommand),
    /// Thread records.
    #[command(subcommand)]
    Threads(ThreadCommand),
    /// Thread messages.
    #[command(subcommand)]
    Messages(MessageCommand),
    /// Split, embed and index a document for an assistant.
    Ingest(IngestArgs),
}

#[derive(Subcommand, Debug)]
enum AssistantCommand {
    /// List a user's assistants.
    List(UserArg),
    /// Show one assistant.
    Get {
        #[command(flatten)]
        user: UserArg,
        /// Assistant id.
        #[arg(long)]
        assistant: String,
    },
    /// Create or overwrite an assistant.
    Put {
        #[command(flatten)]
        user: UserArg,
        /// Assistant id.
        #[arg(long)]
        assistant: String,
        /// Display name.
        #[arg(long)]
        name: String,
        /// Configuration as JSON.
        #[arg(long, default_value = "{}", value_parser = parse_json)]
        config: Value,
    },
}

#[derive(Subcommand, Debug)]
enum ThreadCommand {
    /// List a user's threads.
    List(UserArg),
    /// Show one thread.
    Get {
        #[command(flatten)]
        user: UserArg,
        /// Thread id.
        #[arg(long)]
        thread: String,
    },
    /// Create or overwrite a thread.
    Put {
        #[command(flatten)]
        user: UserArg,
        /// Thread id.
        #[arg(long)]
        thread: String,
        /// Assistant the thread talks to.
        #[arg(long)]
        assistant: String,
        /// Display name.
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum MessageCommand {
    /// Show a thread's messages, oldest first.
    Get {
        #[command(flatten)]
        user: UserArg,
        /// Thread id.
        #[arg(long)]
        thread: String,
    },
}

#[derive(Args, Debug)]
struct UserArg {
    /// Owning user id.
    #[arg(long = "user")]
    user_id: String,
}

#[derive(Args, Debug)]
struct IngestArgs {
    #[command(flatten)]
    user: UserArg,
    /// Assistant whose index receives the document.
    #[arg(long)]
    assistant: String,
    /// Document to ingest.
    #[arg(long)]
    file: PathBuf,
}

fn parse_json(raw: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn resolve_settings(cli: &Cli) -> Result<OpenGptsSettings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => load_settings().context("Failed to load settings")?,
    };
    if let Some(url) = &cli.store_url {
        settings.store.url.clone_from(url);
    }
    if let Some(level) = &cli.log_level {
        settings.logging.level.clone_from(level);
    }
    Ok(settings)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_storage(settings: &OpenGptsSettings) -> Result<Storage> {
    Storage::open(&settings.store)
        .with_context(|| format!("Failed to open store at {}", settings.store.url))
}

fn run_assistants(storage: &Storage, command: AssistantCommand) -> Result<()> {
    match command {
        AssistantCommand::List(user) => print_json(&storage.list_assistants(&user.user_id)?),
        AssistantCommand::Get { user, assistant } => {
            print_json(&storage.get_assistant(&user.user_id, &assistant)?)
        }
        AssistantCommand::Put {
            user,
            assistant,
            name,
            config,
        } => print_json(&storage.put_assistant(&user.user_id, &assistant, &name, config)?),
    }
}

fn run_threads(storage: &Storage, command: ThreadCommand) -> Result<()> {
    match command {
        ThreadCommand::List(user) => print_json(&storage.list_threads(&user.user_id)?),
        ThreadCommand::Get { user, thread } => {
            print_json(&storage.get_thread(&user.user_id, &thread)?)
        }
        ThreadCommand::Put {
            user,
            thread,
            assistant,
            name,
        } => print_json(&storage.put_thread(&user.user_id, &thread, &assistant, &name)?),
    }
}

fn run_messages(storage: &Storage, command: MessageCommand) -> Result<()> {
    match command {
        MessageCommand::Get { user, thread } => {
            print_json(&storage.get_thread_messages(&user.user_id, &thread)?)
        }
    }
}

async fn run_ingest(settings: &OpenGptsSettings, args: IngestArgs) -> Result<()> {
    let text = read_document(&args.file)?;
    let pipeline =
        IngestPipeline::from_settings(&settings.ingest).context("Failed to build ingest pipeline")?;
    let binding = IngestBinding::new(args.user.user_id, args.assistant);

    let mut payload = serde_json::Map::new();
    let _ = payload.insert(settings.ingest.input_key.clone(), Value::String(text));
    let ids = pipeline
        .ingest(&binding, &Value::Object(payload))
        .await
        .with_context(|| format!("Failed to ingest {}", args.file.display()))?;
    info!(file = %args.file.display(), chunks = ids.len(), "ingest complete");
    print_json(&ids)
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    opengpts_core::logging::init_subscriber(&settings.logging.level);

    match cli.command {
        Command::Assistants(command) => run_assistants(&open_storage(&settings)?, command),
        Command::Threads(command) => run_threads(&open_storage(&settings)?, command),
        Command::Messages(command) => run_messages(&open_storage(&settings)?, command),
        Command::Ingest(args) => run_ingest(&settings, args).await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
