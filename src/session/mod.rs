//! Embedded-browser checkout session.
//!
//! The session hosts the provider's checkout URL and resolves exactly one
//! terminal [`Outcome`] from three independently firing observation
//! channels: the pre-navigation intercept, the post-navigation state change,
//! and the in-page message bridge. The first terminal classification from
//! any channel wins; everything after it is a no-op.

pub mod classifier;
pub mod follow_up;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::{Event, EventSender};
use crate::models::{OrderResult, PaymentMethod, PaymentRecord, PaymentStatus, ProductContext, SessionUser};
use crate::services::payment_records::PaymentRecordService;
use self::follow_up::{FollowUpCoordinator, FollowUpPlan, PendingConfirmation};

/// How long the transient success/failure acknowledgment stays on screen
/// before the flow dismisses itself.
pub const ACK_DISMISS_DELAY: Duration = Duration::from_millis(2000);

/// Which observation channel produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Intercept,
    StateChange,
    Message,
}

/// One observed navigation. Ephemeral; discarded after classification.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub url: String,
    pub channel: Channel,
    pub timestamp: DateTime<Utc>,
}

impl NavigationEvent {
    fn now(url: &str, channel: Channel) -> Self {
        Self {
            url: url.to_string(),
            channel,
            timestamp: Utc::now(),
        }
    }
}

/// Session outcome. Once non-Pending it is immutable for the lifetime of the
/// session; a fresh session always starts from Pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    /// The order id is the one echoed by the provider's return URL, when
    /// present; the session substitutes its own otherwise.
    Success { order_id: Option<String> },
    Failure { reason: String },
    Cancelled,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

/// Verdict for a pre-navigation intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Suppress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckKind {
    Success,
    Failure,
}

/// Commands the session pushes to the embedded-browser host. The host drains
/// these on the UI thread; the session never touches the surface directly.
#[derive(Debug)]
pub enum SurfaceCommand {
    CloseBrowser,
    ShowAcknowledgment {
        kind: AckKind,
        auto_dismiss: Duration,
    },
    /// Ask the user to confirm an early close; a payment may be completing
    /// server-side even though no redirect has been observed yet.
    ConfirmClose,
    /// Hold the UI in the post-payment confirm state.
    AwaitConfirmation,
    Dismiss,
}

/// Structured message pushed from script running inside the checkout page.
/// Unrecognized tags fail to parse and are explicitly ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    #[serde(rename = "payment_success")]
    Success,
    #[serde(rename = "payment_error")]
    Error {
        #[serde(default)]
        error: String,
    },
}

/// Hooks fired when the session reaches a terminal outcome. Each fires at
/// most once per session, across all channels.
pub struct SessionHooks {
    pub on_success: Box<dyn FnOnce(String) + Send>,
    pub on_failure: Box<dyn FnOnce(String) + Send>,
    pub on_cancelled: Box<dyn FnOnce() + Send>,
}

/// Everything the session needs to open.
pub struct SessionParams {
    pub order: OrderResult,
    pub user: SessionUser,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub context: ProductContext,
    pub description: String,
    pub plan: FollowUpPlan,
    pub hooks: SessionHooks,
}

struct SessionState {
    outcome: Outcome,
    hooks: Option<SessionHooks>,
    close_prompt_open: bool,
}

/// Controller for one embedded checkout session. Created per payment
/// attempt, torn down with the surface; never reused.
pub struct CheckoutSession {
    id: Uuid,
    order: OrderResult,
    user: SessionUser,
    amount: Decimal,
    currency: String,
    method: PaymentMethod,
    context: ProductContext,
    description: String,
    plan: FollowUpPlan,
    state: Mutex<SessionState>,
    commands: mpsc::UnboundedSender<SurfaceCommand>,
    events: EventSender,
    records: PaymentRecordService,
    follow_up: FollowUpCoordinator,
}

impl std::fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl CheckoutSession {
    /// Opens a session. The returned receiver carries surface commands for
    /// the embedded-browser host.
    pub fn open(
        params: SessionParams,
        records: PaymentRecordService,
        events: EventSender,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SurfaceCommand>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        info!(session_id = %id, order_id = %params.order.order_id, "checkout session opened");
        events.send_detached(Event::CheckoutOpened {
            order_id: params.order.order_id.clone(),
        });

        let session = Arc::new(Self {
            id,
            follow_up: FollowUpCoordinator::new(commands.clone(), events.clone()),
            order: params.order,
            user: params.user,
            amount: params.amount,
            currency: params.currency,
            method: params.method,
            context: params.context,
            description: params.description,
            plan: params.plan,
            state: Mutex::new(SessionState {
                outcome: Outcome::Pending,
                hooks: Some(params.hooks),
                close_prompt_open: false,
            }),
            commands,
            events,
            records,
        });

        (session, receiver)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// URL the host should load into the embedded browser.
    pub fn checkout_url(&self) -> &str {
        &self.order.checkout_url
    }

    pub fn order_id(&self) -> &str {
        &self.order.order_id
    }

    /// Current outcome snapshot.
    pub fn outcome(&self) -> Outcome {
        self.lock_state().outcome.clone()
    }

    pub fn is_finalized(&self) -> bool {
        self.lock_state().outcome.is_terminal()
    }

    /// Pre-navigation intercept. May veto the navigation: redirect wrappers
    /// and terminal return URLs are suppressed so the user never sees an
    /// intermediate blank page.
    pub fn on_navigation_request(&self, url: &str) -> NavigationDecision {
        if self.is_finalized() {
            return NavigationDecision::Suppress;
        }

        let event = NavigationEvent::now(url, Channel::Intercept);
        let outcome = classifier::classify(&event.url, event.channel);
        debug!(url = %event.url, channel = ?event.channel, outcome = ?outcome, "navigation intercepted");

        if outcome.is_terminal() {
            self.try_finalize(outcome, event.channel);
            return NavigationDecision::Suppress;
        }

        if classifier::is_wrapper(url) {
            NavigationDecision::Suppress
        } else {
            NavigationDecision::Allow
        }
    }

    /// Post-navigation state change. Cannot veto; fallback in case the
    /// intercept channel missed the URL.
    pub fn on_navigation_committed(&self, url: &str) {
        let event = NavigationEvent::now(url, Channel::StateChange);
        let outcome = classifier::classify(&event.url, event.channel);
        debug!(url = %event.url, channel = ?event.channel, outcome = ?outcome, "navigation committed");

        if outcome.is_terminal() {
            self.try_finalize(outcome, event.channel);
        }
    }

    /// In-page message channel. The payload is validated at the boundary;
    /// unrecognized tags are logged and ignored, never silently swallowed.
    pub fn on_bridge_message(&self, raw: &str) {
        match serde_json::from_str::<BridgeMessage>(raw) {
            Ok(BridgeMessage::Success) => {
                self.try_finalize(Outcome::Success { order_id: None }, Channel::Message);
            }
            Ok(BridgeMessage::Error { error }) => {
                let reason = if error.is_empty() {
                    "payment failed".to_string()
                } else {
                    error
                };
                self.try_finalize(Outcome::Failure { reason }, Channel::Message);
            }
            Err(e) => {
                warn!(error = %e, "ignoring unrecognized bridge message");
            }
        }
    }

    /// User-initiated close (back gesture / overlay tap) before a terminal
    /// outcome. Asks for confirmation first; closing blind risks losing a
    /// result that is still completing server-side.
    pub fn on_close_requested(&self) {
        let mut state = self.lock_state();
        if state.outcome.is_terminal() || state.close_prompt_open {
            return;
        }
        state.close_prompt_open = true;
        drop(state);

        let _ = self.commands.send(SurfaceCommand::ConfirmClose);
    }

    /// User confirmed the close prompt: the session ends as Cancelled.
    pub fn on_close_confirmed(&self) {
        self.try_finalize(Outcome::Cancelled, Channel::Intercept);
    }

    /// User dismissed the close prompt and keeps waiting.
    pub fn on_close_dismissed(&self) {
        self.lock_state().close_prompt_open = false;
    }

    /// True while a post-payment confirmation is waiting for the user.
    pub fn awaiting_confirmation(&self) -> bool {
        self.follow_up.has_pending()
    }

    /// Commits the armed post-payment action on explicit user confirmation.
    pub async fn confirm_follow_up(&self) -> Result<(), crate::errors::PaymentError> {
        self.follow_up.confirm().await
    }

    /// The at-most-once guard. Flips the outcome synchronously, before any
    /// spawned or awaited work, so a same-tick event from another channel is
    /// a guaranteed no-op. Returns false when the session was already
    /// finalized.
    fn try_finalize(&self, outcome: Outcome, channel: Channel) -> bool {
        let hooks = {
            let mut state = self.lock_state();
            if state.outcome.is_terminal() {
                debug!(channel = ?channel, late = ?outcome, "ignoring event after terminal outcome");
                return false;
            }
            state.outcome = outcome.clone();
            state.close_prompt_open = false;
            state.hooks.take()
        };

        let Some(hooks) = hooks else {
            return false;
        };

        match outcome {
            Outcome::Success { order_id } => {
                let order_id = order_id.unwrap_or_else(|| self.order.order_id.clone());
                self.finalize_success(order_id, hooks, channel);
            }
            Outcome::Failure { reason } => self.finalize_failure(reason, hooks, channel),
            Outcome::Cancelled => self.finalize_cancelled(hooks),
            Outcome::Pending => {}
        }

        true
    }

    fn finalize_success(&self, order_id: String, hooks: SessionHooks, channel: Channel) {
        info!(session_id = %self.id, %order_id, channel = ?channel, "checkout finished: success");

        let _ = self.commands.send(SurfaceCommand::CloseBrowser);
        let _ = self.commands.send(SurfaceCommand::ShowAcknowledgment {
            kind: AckKind::Success,
            auto_dismiss: ACK_DISMISS_DELAY,
        });

        self.events.send_detached(Event::PaymentSucceeded {
            order_id: order_id.clone(),
        });
        self.records.record_async(self.build_record(&order_id));

        match &self.plan {
            FollowUpPlan::AutoDismiss => {
                let commands = self.commands.clone();
                let on_success = hooks.on_success;
                tokio::spawn(async move {
                    tokio::time::sleep(ACK_DISMISS_DELAY).await;
                    let _ = commands.send(SurfaceCommand::Dismiss);
                    on_success(order_id);
                });
            }
            FollowUpPlan::ConfirmAction { action } => {
                self.follow_up.arm(PendingConfirmation {
                    order_id,
                    action: action.clone(),
                    on_success: hooks.on_success,
                });
            }
        }
    }

    fn finalize_failure(&self, reason: String, hooks: SessionHooks, channel: Channel) {
        warn!(order_id = %self.order.order_id, %reason, channel = ?channel, "checkout finished: failure");

        let _ = self.commands.send(SurfaceCommand::CloseBrowser);
        let _ = self.commands.send(SurfaceCommand::ShowAcknowledgment {
            kind: AckKind::Failure,
            auto_dismiss: ACK_DISMISS_DELAY,
        });

        self.events.send_detached(Event::PaymentFailed {
            order_id: self.order.order_id.clone(),
            reason: reason.clone(),
        });

        let commands = self.commands.clone();
        let on_failure = hooks.on_failure;
        tokio::spawn(async move {
            tokio::time::sleep(ACK_DISMISS_DELAY).await;
            let _ = commands.send(SurfaceCommand::Dismiss);
            on_failure(reason);
        });
    }

    fn finalize_cancelled(&self, hooks: SessionHooks) {
        info!(order_id = %self.order.order_id, "checkout finished: cancelled by user");

        let _ = self.commands.send(SurfaceCommand::CloseBrowser);
        let _ = self.commands.send(SurfaceCommand::Dismiss);

        self.events.send_detached(Event::PaymentCancelled {
            order_id: self.order.order_id.clone(),
        });

        (hooks.on_cancelled)();
    }

    fn build_record(&self, order_id: &str) -> PaymentRecord {
        PaymentRecord {
            user_id: self.user.id.clone(),
            order_id: order_id.to_string(),
            amount: self.amount,
            currency: self.currency.clone(),
            method: self.method,
            status: PaymentStatus::Succeeded,
            context: self.context,
            metadata: serde_json::json!({
                "userName": self.user.name,
                "phone": self.user.phone,
                "email": self.user.email,
                "description": self.description,
            }),
            timestamp: Utc::now(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
