//! Credential store boundary.

use async_trait::async_trait;

use crate::auth::Token;
use crate::error::ChatError;

/// Where the session token lives between runs.
///
/// The engine only reads the token at session start and writes it at the
/// end of registration; everything else about persistence is the
/// implementor's business. `load` must report an absent credential as
/// [`ChatError::TokenMissing`], distinct from an I/O failure.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Token, ChatError>;
    async fn save(&self, token: &Token) -> Result<(), ChatError>;
}
