//! Terminal entry point for the chat client.
//!
//! Thin adapter around `minchat-core`: CLI arguments, logging bootstrap,
//! file-backed token store, history log, stdout display, and a stdin pump
//! feeding the outbound queue. The session engine does everything else.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use minchat_core::{
    ChatError, ChatSession, ConnectionInfo, RetryPolicy, SessionConfig, SessionHandle,
    SessionSinks, TokenStore, auth, run_with_backoff,
};

mod display;
mod history;
mod store;

use store::FileTokenStore;

#[derive(Parser, Debug)]
#[command(name = "minchat", about = "Resilient terminal client for the minechat server")]
struct Cli {
    /// Chat server host.
    #[arg(long, default_value = "minechat.dvmn.org")]
    host: String,

    /// Chat server port.
    #[arg(long, default_value_t = 5050)]
    port: u16,

    /// File the session token is read from and saved to.
    #[arg(long, default_value = "minchat.token")]
    token_path: PathBuf,

    /// File the conversation is appended to.
    #[arg(long, default_value = "minchat.history")]
    history_path: PathBuf,

    /// Register a new account under this nickname, save its token, and exit.
    #[arg(long, value_name = "NICKNAME")]
    register: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {}
        Err(ChatError::TokenMissing) => {
            eprintln!("No saved token yet. Run `minchat --register <nickname>` first.");
            std::process::exit(1);
        }
        Err(error) => {
            error!(%error, "client exited");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<(), ChatError> {
    let server = ConnectionInfo::new(cli.host, cli.port);
    let store = FileTokenStore::new(cli.token_path.clone());

    if let Some(nickname) = cli.register {
        auth::register(&server, &nickname, &store).await?;
        println!(
            "Registered as {nickname}. Token saved to {}.",
            cli.token_path.display()
        );
        return Ok(());
    }

    let token = store.load().await?;

    for line in history::preload(&cli.history_path)
        .await
        .map_err(ChatError::Storage)?
    {
        println!("{line}");
    }

    let (messages_tx, messages_rx) = mpsc::unbounded_channel();
    let (history_tx, history_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();

    let (mut session, handle) = ChatSession::new(
        SessionConfig::new(server),
        token,
        SessionSinks {
            messages: messages_tx,
            history: history_tx,
            status: status_tx,
        },
    );

    tokio::spawn(display::render_messages(messages_rx));
    tokio::spawn(display::render_status(status_rx));

    let history_path = cli.history_path;
    tokio::spawn(async move {
        if let Err(error) = history::save_messages(&history_path, history_rx).await {
            warn!(%error, "history writer stopped");
        }
    });

    tokio::spawn(pump_stdin(handle));

    run_with_backoff(&mut session, &RetryPolicy::default()).await
}

/// Feed stdin lines into the outbound queue. On stdin closing, the handle
/// drops, the queue closes, and the engine winds down cleanly.
async fn pump_stdin(handle: SessionHandle) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                if handle.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
}
