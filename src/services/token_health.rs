use tracing::{info, instrument, warn};

use crate::errors::PaymentError;
use crate::events::{Event, EventSender};
use crate::models::TokenStatus;
use crate::services::gateway::GatewayClient;

/// Gates payment initiation on the bank credential's health. The UI consumes
/// this to enable or disable the pay action, re-checking on each screen
/// focus. No background polling, no TTL-based auto-refresh.
pub struct TokenHealthService {
    gateway: GatewayClient,
    events: EventSender,
}

impl TokenHealthService {
    pub fn new(gateway: GatewayClient, events: EventSender) -> Self {
        Self { gateway, events }
    }

    /// Queries credential health. Never fails: any transport or gateway
    /// error degrades to an unhealthy snapshot carrying the error text, so
    /// callers never need to catch.
    #[instrument(skip(self))]
    pub async fn check_status(&self) -> TokenStatus {
        let status = match self.gateway.token_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "credential status check failed");
                TokenStatus::unhealthy(e.user_message())
            }
        };

        info!(is_valid = status.is_valid, "credential status fetched");
        self.events.send_detached(Event::TokenStatusChecked {
            is_valid: status.is_valid,
        });
        status
    }

    /// Invalidates the server-side cached credential. Recovery action only;
    /// nothing invokes this automatically.
    #[instrument(skip(self))]
    pub async fn clear_cache(&self) -> Result<(), PaymentError> {
        self.gateway.invalidate_token().await?;
        info!("credential cache invalidated");
        self.events.send_detached(Event::TokenCacheCleared);
        Ok(())
    }
}
