//! File-backed credential store.
//!
//! The token lives alone on the first line of a small file next to the
//! history log. A missing or empty file is the distinct "never registered"
//! outcome, not an I/O failure.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use minchat_core::{ChatError, Token, TokenStore};

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Token, ChatError> {
        debug!(path = %self.path.display(), "read token");
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.lines().next().unwrap_or("").trim();
                if token.is_empty() {
                    return Err(ChatError::TokenMissing);
                }
                Ok(Token::new(token))
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Err(ChatError::TokenMissing),
            Err(error) => Err(ChatError::Storage(error)),
        }
    }

    async fn save(&self, token: &Token) -> Result<(), ChatError> {
        debug!(path = %self.path.display(), "save token");
        tokio::fs::write(&self.path, token.as_str())
            .await
            .map_err(ChatError::Storage)
    }
}
