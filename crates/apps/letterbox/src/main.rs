//! Letterbox - A small Gmail client for the terminal
//!
//! This is the main entry point. It parses the command line, starts the
//! controller thread and renders the events it sends back.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use mail::{
    Command, ComposeDraft, Controller, CredentialStore, EventSink, GmailConnector, GoogleOAuth,
    MessageId, Settings,
};

mod render;

#[derive(Debug, Parser)]
#[command(name = "letterbox", version, about = "Read and send Gmail from the terminal")]
struct Cli {
    /// Settings file to use instead of the one in the config directory
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// List the most recent messages (default)
    Inbox,
    /// Show the text of a message
    Show { id: String },
    /// Compose and send a message
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        /// Sender address; empty or "me" uses the signed-in account
        #[arg(long, default_value = "")]
        from: String,
    },
    /// Forget the stored credential
    Logout,
}

impl Action {
    fn commands(self) -> Vec<Command> {
        match self {
            Action::Inbox => vec![Command::Authorize, Command::Refresh],
            Action::Show { id } => vec![Command::Authorize, Command::Open(MessageId::new(id))],
            Action::Send {
                to,
                subject,
                body,
                from,
            } => vec![
                Command::Authorize,
                Command::Send(ComposeDraft {
                    to,
                    subject,
                    body,
                    from,
                }),
            ],
            Action::Logout => vec![Command::Logout],
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Settings::load().context("Failed to load settings"),
    }
}

fn run(cli: Cli) -> Result<bool> {
    let settings = load_settings(cli.settings.as_ref())?;
    debug!("Settings: {:?}", settings);

    let (events, rx) = EventSink::channel();
    let server = Arc::new(GoogleOAuth::new(
        settings.callback_port,
        settings.request_timeout(),
    ));
    let store = CredentialStore::new(
        settings.token_path(),
        settings.client_secret_path(),
        server,
        events.clone(),
    );
    let connector = GmailConnector::new(settings.request_timeout());
    let controller = Controller::new(store, connector, settings, events);
    let snapshot = controller.snapshot();

    let (commands, handle) = controller
        .spawn()
        .context("Failed to start controller thread")?;

    for command in cli.command.unwrap_or(Action::Inbox).commands() {
        // The controller stops on its own after a fatal error
        if commands.send(command).is_err() {
            break;
        }
    }
    let _ = commands.send(Command::Shutdown);
    drop(commands);

    let mut ok = true;
    for event in rx {
        ok &= render::event(&event, &snapshot);
    }

    if handle.join().is_err() {
        anyhow::bail!("Controller thread panicked");
    }
    Ok(ok)
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
