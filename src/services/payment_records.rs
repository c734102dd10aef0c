use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::config::GatewayConfig;
use crate::errors::PaymentError;
use crate::events::{Event, EventSender};
use crate::models::PaymentRecord;

/// Best-effort writer of local payment records. Detached from the critical
/// path: failures are logged and surfaced on the event bus only, never shown
/// to the user and never used to reverse an already-shown success state. The
/// payment already happened at the provider; this is bookkeeping.
#[derive(Clone)]
pub struct PaymentRecordService {
    client: Client,
    records_url: String,
    events: EventSender,
}

impl PaymentRecordService {
    pub fn new(config: &GatewayConfig, events: EventSender) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PaymentError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            records_url: config.records_url.trim_end_matches('/').to_string(),
            events,
        })
    }

    /// Writes the record asynchronously (fire-and-forget with logging).
    pub fn record_async(&self, record: PaymentRecord) {
        let service = self.clone();

        tokio::spawn(async move {
            let order_id = record.order_id.clone();
            match service.record_payment(&record).await {
                Ok(()) => {
                    info!(%order_id, "payment record written");
                    if let Err(e) = service.events.send(Event::PaymentRecorded { order_id }).await {
                        error!(error = %e, "failed to publish payment-recorded event");
                    }
                }
                Err(e) => {
                    error!(%order_id, error = %e, "payment record write failed");
                    let _ = service
                        .events
                        .send(Event::PaymentRecordFailed {
                            order_id,
                            reason: e.to_string(),
                        })
                        .await;
                }
            }
        });
    }

    #[instrument(skip(self, record), fields(order_id = %record.order_id))]
    async fn record_payment(&self, record: &PaymentRecord) -> Result<(), PaymentError> {
        let response = self
            .client
            .post(format!("{}/payments", self.records_url))
            .json(record)
            .send()
            .await
            .map_err(|e| PaymentError::Persistence(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Persistence(format!(
                "records backend returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
