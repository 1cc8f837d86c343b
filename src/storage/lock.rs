use std::fmt::Display;

use uuid::Uuid;

/// First character of a lock line at the top of a table file.
pub const LOCK_SENTINEL: char = '&';

/// Opaque token identifying the transaction that holds a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Fresh random token for a new transaction
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders the lock line for a token, e.g. `&3f2c...`.
pub fn encode_marker(token: &LockToken) -> String {
    format!("{}{}", LOCK_SENTINEL, token)
}

/// Returns the token if the line is a lock line.
pub fn parse_marker(line: &str) -> Option<LockToken> {
    line.strip_prefix(LOCK_SENTINEL).map(LockToken::new)
}
