use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Read-only snapshot of the bank credential's health, re-fetched per screen
/// visit. There is no client-side expiry timer; `expires_at` is informational.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenStatus {
    #[serde(rename = "isTokenValid")]
    pub is_valid: bool,
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: String,
}

impl TokenStatus {
    /// Snapshot representing an unusable credential, used when the status
    /// query itself failed.
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            expires_at: None,
            message: message.into(),
        }
    }
}
