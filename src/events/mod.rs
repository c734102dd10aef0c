use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event from a synchronous context (fire-and-forget with logging).
    pub fn send_detached(&self, event: Event) {
        let sender = self.clone();
        tokio::spawn(async move {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "Failed to send detached event");
            }
        });
    }
}

// Define the various events that can occur in the payment flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Credential events
    TokenStatusChecked { is_valid: bool },
    TokenCacheCleared,

    // Order events
    OrderCreated {
        order_id: String,
        amount: Decimal,
        currency: String,
    },

    // Checkout session events
    CheckoutOpened { order_id: String },
    PaymentSucceeded { order_id: String },
    PaymentFailed { order_id: String, reason: String },
    PaymentCancelled { order_id: String },

    // Bookkeeping events
    PaymentRecorded { order_id: String },
    PaymentRecordFailed { order_id: String, reason: String },

    // Post-payment events
    PostPaymentActionConfirmed { order_id: String },
}

/// Processes events from the receiver until the channel closes.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processing loop started");

    while let Some(event) = receiver.recv().await {
        match &event {
            Event::TokenStatusChecked { is_valid } => {
                info!("Credential status checked: valid={}", is_valid);
            }
            Event::TokenCacheCleared => {
                info!("Credential cache cleared");
            }
            Event::OrderCreated {
                order_id,
                amount,
                currency,
            } => {
                info!(
                    "Payment order created: {} ({} {})",
                    order_id, amount, currency
                );
            }
            Event::CheckoutOpened { order_id } => {
                info!("Checkout opened for order {}", order_id);
            }
            Event::PaymentSucceeded { order_id } => {
                info!("Payment succeeded: {}", order_id);
            }
            Event::PaymentFailed { order_id, reason } => {
                warn!("Payment failed: {} ({})", order_id, reason);
            }
            Event::PaymentCancelled { order_id } => {
                info!("Payment cancelled by user: {}", order_id);
            }
            Event::PaymentRecorded { order_id } => {
                info!("Payment record written for order {}", order_id);
            }
            Event::PaymentRecordFailed { order_id, reason } => {
                warn!(
                    "Payment record write failed for order {}: {}",
                    order_id, reason
                );
            }
            Event::PostPaymentActionConfirmed { order_id } => {
                info!("Post-payment action confirmed for order {}", order_id);
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderCreated {
                order_id: "ord-1".into(),
                amount: dec!(150.00),
                currency: "RUB".into(),
            })
            .await
            .unwrap();
        sender
            .send(Event::PaymentSucceeded {
                order_id: "ord-1".into(),
            })
            .await
            .unwrap();

        assert!(matches!(rx.recv().await, Some(Event::OrderCreated { .. })));
        assert!(matches!(
            rx.recv().await,
            Some(Event::PaymentSucceeded { .. })
        ));
    }

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::TokenCacheCleared).await.is_err());
    }
}
