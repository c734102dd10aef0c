use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use crate::errors::PaymentError;
use crate::events::{Event, EventSender};
use crate::models::{OrderRequest, OrderResult, OrderStatus, SessionUser};
use crate::services::gateway::GatewayClient;

/// Builds and submits payment orders to the provider's backend proxy.
/// Creating an order has no local side effects; nothing is recorded until the
/// checkout session later confirms success.
pub struct OrderService {
    gateway: GatewayClient,
    events: EventSender,
}

impl OrderService {
    pub fn new(gateway: GatewayClient, events: EventSender) -> Self {
        Self { gateway, events }
    }

    /// Creates a payment order. Validation runs before any network call;
    /// a non-positive amount never reaches the wire.
    #[instrument(skip(self, request), fields(user_id = %user.id))]
    pub async fn create_order(
        &self,
        user: &SessionUser,
        mut request: OrderRequest,
    ) -> Result<OrderResult, PaymentError> {
        request.validate()?;

        if request.external_order_id.is_none() {
            request.external_order_id = Some(synthesize_external_id(&user.id));
        }

        info!(
            amount = %request.amount,
            currency = %request.currency,
            context = %request.product_context,
            "creating payment order"
        );

        let result = self.gateway.create_order(&request).await?;

        info!(order_id = %result.order_id, "payment order created");
        self.events.send_detached(Event::OrderCreated {
            order_id: result.order_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
        });

        Ok(result)
    }

    /// Queries order status by id. Diagnostics only.
    #[instrument(skip(self))]
    pub async fn order_status(&self, order_id: &str) -> Result<OrderStatus, PaymentError> {
        self.gateway.order_status(order_id).await
    }
}

/// Composite of timestamp and user id. Reduces collision risk between
/// attempts, it does not eliminate it.
fn synthesize_external_id(user_id: &str) -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), user_id)
}
