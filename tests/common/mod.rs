//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use drivehub_payments::config::GatewayConfig;
use drivehub_payments::events::{Event, EventSender};
use drivehub_payments::models::{OrderResult, PaymentMethod, ProductContext, SessionUser};
use drivehub_payments::services::payment_records::PaymentRecordService;
use drivehub_payments::session::follow_up::FollowUpPlan;
use drivehub_payments::session::{
    CheckoutSession, SessionHooks, SessionParams, SurfaceCommand,
};

/// A gateway/records endpoint that nothing listens on.
pub const DEAD_END: &str = "http://127.0.0.1:9";

pub fn test_config(gateway_url: &str, records_url: &str) -> GatewayConfig {
    GatewayConfig {
        gateway_url: gateway_url.to_string(),
        records_url: records_url.to_string(),
        callback_url: "https://api.drivehub.app/bank/callback".to_string(),
        success_url: "https://app.drivehub.app/payment/success".to_string(),
        fail_url: "https://app.drivehub.app/payment/fail".to_string(),
        request_timeout_secs: 5,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        log_json: false,
    }
}

pub fn test_user() -> SessionUser {
    SessionUser {
        id: "u-100".to_string(),
        name: "A. Driver".to_string(),
        phone: "+70000000000".to_string(),
        email: Some("driver@example.com".to_string()),
    }
}

/// Counts hook invocations and records their payloads.
#[derive(Clone, Default)]
pub struct HookProbe {
    pub success_calls: Arc<AtomicUsize>,
    pub failure_calls: Arc<AtomicUsize>,
    pub cancelled_calls: Arc<AtomicUsize>,
    pub last_success_order: Arc<Mutex<Option<String>>>,
    pub last_failure_reason: Arc<Mutex<Option<String>>>,
    pub fired: Arc<Mutex<Option<mpsc::UnboundedSender<()>>>>,
}

impl HookProbe {
    /// Returns the probe, the hooks to hand to the session, and a receiver
    /// that gets one message per hook invocation.
    pub fn new() -> (Self, SessionHooks, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let probe = Self {
            fired: Arc::new(Mutex::new(Some(tx))),
            ..Self::default()
        };

        let hooks = {
            let success = probe.clone();
            let failure = probe.clone();
            let cancelled = probe.clone();
            SessionHooks {
                on_success: Box::new(move |order_id| {
                    success.success_calls.fetch_add(1, Ordering::SeqCst);
                    *success.last_success_order.lock().unwrap() = Some(order_id);
                    success.ping();
                }),
                on_failure: Box::new(move |reason| {
                    failure.failure_calls.fetch_add(1, Ordering::SeqCst);
                    *failure.last_failure_reason.lock().unwrap() = Some(reason);
                    failure.ping();
                }),
                on_cancelled: Box::new(move || {
                    cancelled.cancelled_calls.fetch_add(1, Ordering::SeqCst);
                    cancelled.ping();
                }),
            }
        };

        (probe, hooks, rx)
    }

    fn ping(&self) {
        if let Some(tx) = self.fired.lock().unwrap().as_ref() {
            let _ = tx.send(());
        }
    }
}

pub struct SessionFixture {
    pub session: Arc<CheckoutSession>,
    pub commands: mpsc::UnboundedReceiver<SurfaceCommand>,
    pub probe: HookProbe,
    pub hook_fired: mpsc::UnboundedReceiver<()>,
    pub events: mpsc::Receiver<Event>,
}

/// Opens a session against a records backend at `records_url` (use
/// [`DEAD_END`] when record writes do not matter).
pub fn open_session(records_url: &str, plan: FollowUpPlan) -> SessionFixture {
    let config = test_config(DEAD_END, records_url);
    let (event_tx, events) = mpsc::channel(256);
    let event_sender = EventSender::new(event_tx);
    let records =
        PaymentRecordService::new(&config, event_sender.clone()).expect("record service");

    let (probe, hooks, hook_fired) = HookProbe::new();
    let (session, commands) = CheckoutSession::open(
        SessionParams {
            order: OrderResult {
                order_id: "ord-1".to_string(),
                checkout_url: "https://pay.example.com/c/ord-1".to_string(),
            },
            user: test_user(),
            amount: dec!(1290.00),
            currency: "RUB".to_string(),
            method: PaymentMethod::BankCard,
            context: ProductContext::ServiceBooking,
            description: "Annual service".to_string(),
            plan,
            hooks,
        },
        records,
        event_sender,
    );

    SessionFixture {
        session,
        commands,
        probe,
        hook_fired,
        events,
    }
}

/// Drains every command currently queued on the surface channel.
pub fn drain_commands(rx: &mut mpsc::UnboundedReceiver<SurfaceCommand>) -> Vec<SurfaceCommand> {
    let mut out = Vec::new();
    while let Ok(cmd) = rx.try_recv() {
        out.push(cmd);
    }
    out
}

pub fn count_close_browser(commands: &[SurfaceCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, SurfaceCommand::CloseBrowser))
        .count()
}

pub fn count_acks(commands: &[SurfaceCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, SurfaceCommand::ShowAcknowledgment { .. }))
        .count()
}
