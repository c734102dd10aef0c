//! DriveHub Payments
//!
//! Payment gateway orchestration and embedded-checkout result detection for
//! the DriveHub car-services platform: credential health gating, order
//! creation through the bank proxy, and inference of the payment outcome
//! from navigation events inside the embedded checkout browser.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod services;
pub mod session;

use std::sync::Arc;

use config::GatewayConfig;
use errors::PaymentError;
use events::EventSender;
use services::checkout::CheckoutService;
use services::gateway::GatewayClient;
use services::orders::OrderService;
use services::payment_records::PaymentRecordService;
use services::token_health::TokenHealthService;

/// Wired-up service graph for the payment subsystem. The host app builds one
/// of these at startup and hands out references to its screens.
#[derive(Clone)]
pub struct PaymentContext {
    pub config: GatewayConfig,
    pub event_sender: EventSender,
    pub tokens: Arc<TokenHealthService>,
    pub orders: Arc<OrderService>,
    pub records: PaymentRecordService,
    pub checkout: Arc<CheckoutService>,
}

impl PaymentContext {
    pub fn new(config: GatewayConfig, event_sender: EventSender) -> Result<Self, PaymentError> {
        let gateway = GatewayClient::new(&config)?;

        let tokens = Arc::new(TokenHealthService::new(
            gateway.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(OrderService::new(gateway, event_sender.clone()));
        let records = PaymentRecordService::new(&config, event_sender.clone())?;

        let checkout = Arc::new(CheckoutService::new(
            config.clone(),
            tokens.clone(),
            orders.clone(),
            records.clone(),
            event_sender.clone(),
        ));

        Ok(Self {
            config,
            event_sender,
            tokens,
            orders,
            records,
            checkout,
        })
    }
}
