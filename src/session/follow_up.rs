use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::SurfaceCommand;
use crate::errors::PaymentError;
use crate::events::{Event, EventSender};

/// Secondary domain action committed after a successful payment, e.g.
/// finalizing a garage-service booking. Payment success and resource
/// commitment are deliberately decoupled: a user may pay, then still need to
/// confirm details before anything is reserved.
#[async_trait]
pub trait PostPaymentAction: Send + Sync {
    async fn commit(&self) -> Result<(), PaymentError>;
}

/// What happens once the session confirms success.
#[derive(Clone)]
pub enum FollowUpPlan {
    /// Dismiss after the acknowledgment delay; nothing else to commit.
    AutoDismiss,
    /// Hold the UI in a confirm state; commit `action` only on explicit user
    /// confirmation.
    ConfirmAction { action: Arc<dyn PostPaymentAction> },
}

pub(crate) struct PendingConfirmation {
    pub order_id: String,
    pub action: Arc<dyn PostPaymentAction>,
    pub on_success: Box<dyn FnOnce(String) + Send>,
}

/// Holds the armed confirmation and commits it exactly once. A second
/// confirm while a commit is in flight is a no-op; a failed commit re-arms
/// so the user may retry.
pub struct FollowUpCoordinator {
    pending: Mutex<Option<PendingConfirmation>>,
    commands: mpsc::UnboundedSender<SurfaceCommand>,
    events: EventSender,
}

impl FollowUpCoordinator {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<SurfaceCommand>,
        events: EventSender,
    ) -> Self {
        Self {
            pending: Mutex::new(None),
            commands,
            events,
        }
    }

    pub(crate) fn arm(&self, pending: PendingConfirmation) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(pending);
        drop(slot);
        let _ = self.commands.send(SurfaceCommand::AwaitConfirmation);
    }

    /// True while an armed confirmation is waiting for the user.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Commits the held action on explicit user confirmation, then dismisses
    /// the flow and fires the success hook.
    pub async fn confirm(&self) -> Result<(), PaymentError> {
        let taken = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(pending) = taken else {
            return Ok(());
        };

        info!(order_id = %pending.order_id, "committing post-payment action");
        match pending.action.commit().await {
            Ok(()) => {
                let order_id = pending.order_id;
                if let Err(e) = self
                    .events
                    .send(Event::PostPaymentActionConfirmed {
                        order_id: order_id.clone(),
                    })
                    .await
                {
                    warn!(error = %e, "failed to publish confirmation event");
                }
                let _ = self.commands.send(SurfaceCommand::Dismiss);
                (pending.on_success)(order_id);
                Ok(())
            }
            Err(e) => {
                warn!(order_id = %pending.order_id, error = %e, "post-payment action failed");
                let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
                *slot = Some(pending);
                Err(e)
            }
        }
    }
}
