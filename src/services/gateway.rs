use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::errors::PaymentError;
use crate::models::{OrderRequest, OrderResult, OrderStatus, TokenStatus};

/// Error body shape the proxy uses for non-success responses.
#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP client for the bank payment proxy. Both the token health gate and the
/// order orchestrator layer their semantics over this one client so the
/// endpoint surface lives in a single place.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PaymentError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query credential health.
    pub async fn token_status(&self) -> Result<TokenStatus, PaymentError> {
        let response = self
            .client
            .get(self.url("/bank/token/status"))
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Invalidate the server-side cached credential.
    pub async fn invalidate_token(&self) -> Result<(), PaymentError> {
        let response = self
            .client
            .post(self.url("/bank/token/invalidate"))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// Create a payment order. The request must already be validated.
    pub async fn create_order(&self, request: &OrderRequest) -> Result<OrderResult, PaymentError> {
        let response = self
            .client
            .post(self.url("/bank/orders"))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Query payment details by order id. Diagnostics only, never on the
    /// happy path.
    pub async fn order_status(&self, order_id: &str) -> Result<OrderStatus, PaymentError> {
        let response = self
            .client
            .get(self.url(&format!("/bank/orders/{}", order_id)))
            .send()
            .await?;
        Self::read_json(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, PaymentError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn ensure_success(response: Response) -> Result<Response, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = Self::error_message(status, response).await;
        debug!(status = %status, message = %message, "gateway returned non-success");
        Err(PaymentError::Gateway(message))
    }

    /// Pulls the provider's message out of an error body, falling back to the
    /// status line when the body is empty or not the expected shape.
    async fn error_message(status: StatusCode, response: Response) -> String {
        let fallback = format!(
            "payment gateway returned {}",
            status.canonical_reason().unwrap_or_else(|| status.as_str())
        );

        let body = match response.text().await {
            Ok(body) if !body.trim().is_empty() => body,
            _ => return fallback,
        };

        match serde_json::from_str::<GatewayErrorBody>(&body) {
            Ok(parsed) if !parsed.message.is_empty() => parsed.message,
            _ => fallback,
        }
    }
}
