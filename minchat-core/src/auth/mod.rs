//! Token handshake and account registration.
//!
//! The server answers a token line with either the literal `null` — the
//! token is unknown — or a one-line JSON user object followed by a welcome
//! line. Registration is its own short-lived connection: an empty token
//! line switches the server into registration mode, and the dialogue ends
//! with a JSON object carrying the freshly assigned credential.

mod store;

pub use store::TokenStore;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ChatError;
use crate::message::Outbound;
use crate::network::{Connection, ConnectionInfo};

/// The server's reply to an unrecognized token, as a bare line.
const NULL_REPLY: &str = "null";

// ── Token ────────────────────────────────────────────────────────

/// Opaque session credential. Immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

// ── Wire payloads ────────────────────────────────────────────────

/// The user object returned on successful authentication.
#[derive(Debug, Deserialize)]
struct UserReply {
    nickname: String,
}

/// The account object returned at the end of registration.
#[derive(Debug, Deserialize)]
struct AccountReply {
    account_hash: String,
}

// ── Operations ───────────────────────────────────────────────────

/// Authenticate on an already-open lease.
///
/// Writes the token line and reads one reply. The `null` sentinel maps to
/// [`ChatError::TokenRejected`] — an expected outcome the caller turns
/// into user-facing policy, not a broken connection. Otherwise the JSON
/// user object is parsed, one further welcome line is consumed so the
/// stream is aligned for the session loops, and the nickname is returned.
///
/// Malformed JSON surfaces as [`ChatError::BadReply`]; the server hanging
/// up mid-handshake is a connect-class failure for this lease.
pub async fn authenticate(conn: &mut Connection, token: &Token) -> Result<String, ChatError> {
    conn.send(Outbound::Line(token.as_str().to_string())).await?;

    let reply = conn.read_line().await?.ok_or_else(closed_during_handshake)?;
    if reply.trim() == NULL_REPLY {
        return Err(ChatError::TokenRejected);
    }

    let user: UserReply = serde_json::from_str(&reply)?;
    debug!(nickname = %user.nickname, "authorized");

    // Welcome line; consumed so the session loops start on a clean stream.
    conn.read_line().await?.ok_or_else(closed_during_handshake)?;

    Ok(user.nickname)
}

/// Register a new account and persist its credential.
///
/// Runs on its own short-lived lease: greeting, empty token line to enter
/// registration mode, prompt, username, JSON account object. The assigned
/// token is saved through `store` before being returned; a reply that
/// fails to parse is fatal to this registration attempt only.
pub async fn register(
    info: &ConnectionInfo,
    username: &str,
    store: &dyn TokenStore,
) -> Result<Token, ChatError> {
    let mut conn = Connection::open(info).await?;

    // Greeting.
    conn.read_line().await?.ok_or_else(closed_during_handshake)?;
    conn.send(Outbound::Line(String::new())).await?;

    // Nickname prompt.
    conn.read_line().await?.ok_or_else(closed_during_handshake)?;
    conn.send(Outbound::Line(username.to_string())).await?;

    let reply = conn.read_line().await?.ok_or_else(closed_during_handshake)?;
    let account: AccountReply = serde_json::from_str(&reply)?;

    let token = Token::new(account.account_hash);
    store.save(&token).await?;
    info!(%username, "registered new account");

    Ok(token)
}

fn closed_during_handshake() -> ChatError {
    ChatError::Connect(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "server closed the stream during the handshake",
    ))
}
