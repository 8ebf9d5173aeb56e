//! Request correlation
//!
//! Every inbound HTTP request gets a `RequestId`. It is recorded on the
//! request span and echoed back to the caller so a client report can be
//! matched to a log line.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest inbound request id we are willing to adopt verbatim
const MAX_INBOUND_ID_LEN: usize = 128;

/// Unique identifier for a single inbound request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Adopt a caller-supplied id (e.g. an `x-request-id` header).
    ///
    /// Returns `None` when the value is empty, too long, or contains
    /// anything other than ASCII alphanumerics, `-`, `_` and `.`, so that a
    /// hostile header can never inject into log lines.
    pub fn from_inbound(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_INBOUND_ID_LEN {
            return None;
        }
        let clean = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        clean.then(|| Self(trimmed.to_string()))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
