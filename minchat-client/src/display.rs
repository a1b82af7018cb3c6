//! Stdout rendering of the engine's event streams.
//!
//! The engine emits closed enums; every human-readable string lives here.

use tokio::sync::mpsc;

use minchat_core::{Direction, Identity, InboundMessage, LinkState, StatusEvent};

/// Shared line format for the conversation panel and the history file.
pub fn format_message(message: &InboundMessage) -> String {
    format!(
        "[{}]: {}",
        message.received_at.format("%d.%m.%y %H:%M:%S"),
        message.text
    )
}

/// Print the inbound stream until the engine hangs up.
pub async fn render_messages(mut rx: mpsc::UnboundedReceiver<InboundMessage>) {
    while let Some(message) = rx.recv().await {
        println!("{}", format_message(&message));
    }
}

/// One status event as a display line.
pub fn status_line(event: &StatusEvent) -> String {
    match event {
        StatusEvent::Link { direction, state } => {
            let side = match direction {
                Direction::Read => "reading",
                Direction::Send => "sending",
            };
            let phase = match state {
                LinkState::Initiated => "connecting",
                LinkState::Established => "connection established",
                LinkState::Closed => "connection closed",
            };
            format!("{side}: {phase}")
        }
        StatusEvent::Identity(Identity::Nick(nickname)) => format!("logged in as {nickname}"),
        StatusEvent::Identity(Identity::Unknown) => "logged out".to_string(),
        StatusEvent::TokenRejected => {
            "the server does not recognize your token; check it or register again".to_string()
        }
    }
}

/// Print the status stream until the engine hangs up.
pub async fn render_status(mut rx: mpsc::UnboundedReceiver<StatusEvent>) {
    while let Some(event) = rx.recv().await {
        println!("* {}", status_line(&event));
    }
}
