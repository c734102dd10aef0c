use serde::Serialize;

/// Unified error type for the payment subsystem.
///
/// Every network or validation failure is caught at the orchestration boundary
/// and collapsed into a single user-facing message via [`PaymentError::user_message`];
/// nothing propagates uncaught into the UI layer.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Credential unhealthy: {0}")]
    CredentialUnhealthy(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(
        #[from]
        #[serde(skip)]
        config::ConfigError,
    ),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for PaymentError {
    fn from(err: validator::ValidationErrors) -> Self {
        PaymentError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::Network(err.to_string())
    }
}

impl PaymentError {
    /// Returns the message suitable for showing to the user.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn user_message(&self) -> String {
        match self {
            // The provider's own message is what the user needs to see
            Self::Gateway(msg) => msg.clone(),
            Self::Validation(msg) => msg.clone(),
            Self::CredentialUnhealthy(msg) => msg.clone(),
            Self::Network(_) => "Could not reach the payment service. Check your connection and try again.".to_string(),
            Self::Persistence(_) | Self::Config(_) | Self::Internal(_) | Self::Other(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// True when the failure happened before any order was created, so the
    /// pay action can simply be re-enabled.
    pub fn is_pre_order(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::CredentialUnhealthy(_))
    }
}
