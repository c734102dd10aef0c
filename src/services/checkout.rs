use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::config::GatewayConfig;
use crate::errors::PaymentError;
use crate::events::EventSender;
use crate::models::{OrderRequest, PaymentMethod, ProductContext, SessionUser};
use crate::services::orders::OrderService;
use crate::services::payment_records::PaymentRecordService;
use crate::services::token_health::TokenHealthService;
use crate::session::follow_up::FollowUpPlan;
use crate::session::{CheckoutSession, SessionHooks, SessionParams, SurfaceCommand};

/// What the UI passes when the user taps "Pay".
pub struct PaymentIntent {
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub context: ProductContext,
    pub method: PaymentMethod,
    pub external_order_id: Option<String>,
}

/// Orchestration boundary for the whole flow: credential gate, then order
/// creation, then the embedded checkout session. This is the single place
/// where network and validation failures are converted into one user-facing
/// message.
pub struct CheckoutService {
    config: GatewayConfig,
    tokens: Arc<TokenHealthService>,
    orders: Arc<OrderService>,
    records: PaymentRecordService,
    events: EventSender,
}

impl CheckoutService {
    pub fn new(
        config: GatewayConfig,
        tokens: Arc<TokenHealthService>,
        orders: Arc<OrderService>,
        records: PaymentRecordService,
        events: EventSender,
    ) -> Self {
        Self {
            config,
            tokens,
            orders,
            records,
            events,
        }
    }

    /// Runs the gate and order creation, then opens the checkout session.
    /// Both remote calls are awaited sequentially and block the pay action.
    #[instrument(skip(self, intent, plan, hooks), fields(user_id = %user.id))]
    pub async fn start(
        &self,
        user: &SessionUser,
        intent: PaymentIntent,
        plan: FollowUpPlan,
        hooks: SessionHooks,
    ) -> Result<(Arc<CheckoutSession>, mpsc::UnboundedReceiver<SurfaceCommand>), PaymentError>
    {
        let status = self.tokens.check_status().await;
        if !status.is_valid {
            let message = if status.message.is_empty() {
                "Payments are temporarily unavailable.".to_string()
            } else {
                status.message
            };
            return Err(PaymentError::CredentialUnhealthy(message));
        }

        let request = OrderRequest {
            external_order_id: intent.external_order_id,
            amount: intent.amount,
            currency: intent.currency.clone(),
            description: intent.description.clone(),
            product_context: intent.context,
            success_url: self.config.success_url.clone(),
            fail_url: self.config.fail_url.clone(),
            callback_url: self.config.callback_url.clone(),
        };

        let order = self.orders.create_order(user, request).await?;
        info!(order_id = %order.order_id, "opening embedded checkout");

        Ok(CheckoutSession::open(
            SessionParams {
                order,
                user: user.clone(),
                amount: intent.amount,
                currency: intent.currency,
                method: intent.method,
                context: intent.context,
                description: intent.description,
                plan,
                hooks,
            },
            self.records.clone(),
            self.events.clone(),
        ))
    }
}
