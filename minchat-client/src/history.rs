//! Chat history file: preload on startup, append-only persistence after.

use std::io;
use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use minchat_core::InboundMessage;

use crate::display;

/// Read previously saved conversation lines, oldest first.
///
/// A history file that does not exist yet is an empty history.
pub async fn preload(path: &Path) -> io::Result<Vec<String>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error),
    };
    let mut lines = BufReader::new(file).lines();
    let mut out = Vec::new();
    while let Some(line) = lines.next_line().await? {
        out.push(line);
    }
    debug!(count = out.len(), path = %path.display(), "history preloaded");
    Ok(out)
}

/// Append the inbound stream to the history file, one formatted line per
/// message, flushed as it arrives. Runs until the engine hangs up.
pub async fn save_messages(
    path: &Path,
    mut rx: mpsc::UnboundedReceiver<InboundMessage>,
) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    while let Some(message) = rx.recv().await {
        file.write_all(display::format_message(&message).as_bytes())
            .await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preload_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lines = preload(&dir.path().join("no-such.history")).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn saved_messages_come_back_on_preload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.history");

        let (tx, rx) = mpsc::unbounded_channel();
        let first = InboundMessage::received("hi".to_string());
        let second = InboundMessage::received("bye".to_string());
        tx.send(first.clone()).unwrap();
        tx.send(second.clone()).unwrap();
        drop(tx);

        save_messages(&path, rx).await.unwrap();

        let lines = preload(&path).await.unwrap();
        assert_eq!(
            lines,
            vec![
                display::format_message(&first),
                display::format_message(&second),
            ]
        );
    }

    #[tokio::test]
    async fn appends_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.history");

        for text in ["one", "two"] {
            let (tx, rx) = mpsc::unbounded_channel();
            tx.send(InboundMessage::received(text.to_string())).unwrap();
            drop(tx);
            save_messages(&path, rx).await.unwrap();
        }

        let lines = preload(&path).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("]: one"));
        assert!(lines[1].ends_with("]: two"));
    }
}
