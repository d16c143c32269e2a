// Catalog Wizard - Console Driver
// Run with: cargo run --bin wizard-console

//! # Wizard Console
//!
//! Drives the admin router from the terminal, one line per chat update:
//!
//! ```text
//! Some text              → text message
//! photo:<file_id> [text] → photo, optionally with a caption
//! cb:<data>              → inline button press
//! ```
//!
//! Outgoing messages are printed to stdout, logs go to stderr. With
//! `--state-file` unfinished wizards survive a restart.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use catalog_wizard::{
    AdminRouter, AppConfig, ChatTransport, ConversationId, InMemoryCatalog, InMemorySessionStore, Keyboard,
    PhotoRef, SessionStore, UserInput, WizardEngine, WizardError,
};

#[derive(Parser)]
#[command(name = "wizard-console")]
#[command(about = "Catalog Wizard console - run the admin dialogs from a terminal")]
#[command(version = "0.1")]
struct Cli {
    /// Configuration file (defaults to ./wizard.toml if present)
    #[arg(short, long, env = "WIZARD_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Conversation id to speak as
    #[arg(long, default_value_t = 1)]
    chat: i64,

    /// Keep unfinished wizards in this file between runs
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Print wizard lifecycle events
    #[arg(long)]
    events: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Prints outgoing messages to stdout
struct ConsoleTransport;

impl ConsoleTransport {
    /// Write one outgoing message; a closed stdout is a delivery failure
    fn write(&self, mut lines: Vec<String>, keyboard: Option<&Keyboard>) -> catalog_wizard::Result<()> {
        lines.extend(render_keyboard(keyboard));

        let mut out = std::io::stdout().lock();
        for line in &lines {
            writeln!(out, "{}", line).map_err(|e| WizardError::Transport(e.to_string()))?;
        }
        out.flush().map_err(|e| WizardError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_text(
        &self,
        _conversation: ConversationId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> catalog_wizard::Result<()> {
        self.write(vec![format!("bot> {}", text)], keyboard.as_ref())
    }

    async fn send_photo(
        &self,
        _conversation: ConversationId,
        photo: &PhotoRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> catalog_wizard::Result<()> {
        let lines = vec![
            format!("bot> [photo {}]", photo),
            format!("     {}", caption.replace('\n', "\n     ")),
        ];
        self.write(lines, keyboard.as_ref())
    }

    async fn send_animation(&self, _conversation: ConversationId, animation: &str) -> catalog_wizard::Result<()> {
        self.write(vec![format!("bot> [animation {}]", animation)], None)
    }

    async fn delete_message(&self, _conversation: ConversationId, message_id: i64) -> catalog_wizard::Result<()> {
        self.write(vec![format!("bot> [deleted message {}]", message_id)], None)
    }
}

fn render_keyboard(keyboard: Option<&Keyboard>) -> Option<String> {
    match keyboard {
        Some(Keyboard::Reply { buttons, .. }) => Some(format!("     keyboard: {}", buttons.join(" | "))),
        Some(Keyboard::Inline { buttons, .. }) => {
            let rendered: Vec<String> = buttons
                .iter()
                .map(|(label, data)| format!("{} (cb:{})", label, data))
                .collect();
            Some(format!("     buttons: {}", rendered.join(" | ")))
        }
        Some(Keyboard::Remove) | None => None,
    }
}

/// Turn one console line into a chat update
fn parse_line(line: &str) -> Option<UserInput> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    if let Some(data) = line.strip_prefix("cb:") {
        return Some(UserInput::callback(data.trim()));
    }

    if let Some(rest) = line.strip_prefix("photo:") {
        let rest = rest.trim_start();
        return Some(match rest.split_once(' ') {
            Some((file_id, caption)) => UserInput::photo_with_caption(file_id, caption),
            None => UserInput::photo(rest),
        });
    }

    Some(UserInput::text(line))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Logs go to stderr so they do not interleave with the conversation
    let log_level = if cli.verbose { "debug".to_string() } else { config.log_level.clone() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let sessions = match &cli.state_file {
        Some(path) if path.exists() => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let store = InMemorySessionStore::restore(&json)?;
            let active = store.active_conversations().await;
            info!(path = %path.display(), count = active.len(), "restored unfinished wizards");
            Arc::new(store)
        }
        _ => Arc::new(InMemorySessionStore::new()),
    };

    let catalog = Arc::new(InMemoryCatalog::with_seed(
        config.catalog.categories.clone(),
        config.catalog.info_pages.clone(),
    ));
    let transport: Arc<dyn ChatTransport> = Arc::new(ConsoleTransport);
    let engine = Arc::new(WizardEngine::new(
        sessions.clone(),
        catalog.clone(),
        transport.clone(),
        config.wizard_settings(),
    ));

    if cli.events {
        let mut receiver = engine.events().subscribe();
        tokio::spawn(async move {
            while let Ok(event) = receiver.recv().await {
                eprintln!("event> {:?}", event.event_type);
            }
        });
    }

    let router = AdminRouter::new(engine, catalog, transport, config);
    let conversation = ConversationId(cli.chat);
    info!(%conversation, "console ready, type /admin to begin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(input) = parse_line(&line) else {
            continue;
        };
        match router.dispatch(conversation, &input).await {
            Ok(routed) => debug!(?routed, "input handled"),
            Err(e) => warn!(error = %e, "input failed"),
        }
    }

    if let Some(path) = &cli.state_file {
        tokio::fs::write(path, sessions.snapshot()?)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved wizard sessions");
    }

    Ok(())
}
