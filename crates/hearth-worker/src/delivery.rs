//! One email delivery: claim, resolve the recipient, send, record.

use std::fmt;

use tokio::time::Instant;

use hearth_core::types::NotificationId;
use hearth_dispatch::DeliveryError;
use hearth_entity::DeliveryChannel;

use crate::runner::EmailDeliveryWorker;

/// What happened to one notification in a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Email accepted by the relay, marked Sent
    Delivered,
    /// Email excluded by the notification or the user, marked Sent
    NothingToSend,
    /// Transient failure, released to Pending
    Retrying {
        /// Transient failures so far
        attempt: u32,
    },
    /// Marked Failed
    Failed(String),
    /// Not claimed: deferred, leased elsewhere, already finished or gone
    Skipped,
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::NothingToSend => write!(f, "nothing to send"),
            Self::Retrying { attempt } => write!(f, "retrying after attempt {attempt}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl EmailDeliveryWorker {
    /// Claim and deliver one notification
    pub async fn deliver(&mut self, id: NotificationId) -> DeliveryOutcome {
        if self.ledger.is_deferred(id, Instant::now()) {
            tracing::trace!("Notification {} is waiting for its retry time", id);
            return DeliveryOutcome::Skipped;
        }

        let notification = match self
            .service
            .try_claim_email_delivery(id, self.config.lease())
            .await
        {
            Ok(notification) => notification,
            Err(e) if e.is_not_claimable() => {
                tracing::debug!("Notification {} already claimed or finished", id);
                return DeliveryOutcome::Skipped;
            }
            Err(e) if e.is_not_found() => {
                self.ledger.clear(id);
                return DeliveryOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!("Failed to claim notification {}: {}", id, e);
                return DeliveryOutcome::Skipped;
            }
        };

        if !notification.allows_email() {
            return self.finish_without_sending(id).await;
        }

        let recipient = match self.recipients.find_recipient(notification.user_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                return self
                    .fail(id, format!("user {} has no delivery profile", notification.user_id))
                    .await;
            }
            Err(e) => {
                return self
                    .retry(id, DeliveryError::Transient(format!("recipient lookup failed: {e}")))
                    .await;
            }
        };

        if !recipient.wants_email() {
            return self.finish_without_sending(id).await;
        }
        if recipient.address_for(DeliveryChannel::Email).is_none() {
            return self
                .fail(id, format!("user {} has no email address", recipient.user_id))
                .await;
        }

        match self.email.send(&notification, &recipient).await {
            Ok(receipt) => {
                self.ledger.clear(id);
                self.record(id, self.service.mark_email_delivery_succeeded(id).await);
                tracing::info!(
                    "Email for notification {} delivered (message id: {})",
                    id,
                    receipt.provider_message_id.as_deref().unwrap_or("-")
                );
                DeliveryOutcome::Delivered
            }
            Err(err @ DeliveryError::Transient(_)) => self.retry(id, err).await,
            Err(DeliveryError::Permanent(reason)) => self.fail(id, reason).await,
        }
    }

    async fn finish_without_sending(&mut self, id: NotificationId) -> DeliveryOutcome {
        self.ledger.clear(id);
        self.record(id, self.service.mark_email_delivery_succeeded(id).await);
        tracing::debug!("Notification {} does not go out by email", id);
        DeliveryOutcome::NothingToSend
    }

    async fn retry(&mut self, id: NotificationId, err: DeliveryError) -> DeliveryOutcome {
        let attempt = self
            .ledger
            .record_failure(id, Instant::now(), self.config.lease());

        if attempt >= self.config.max_attempts {
            return self
                .fail(id, format!("gave up after {attempt} attempts: {err}"))
                .await;
        }

        tracing::warn!(
            "Email for notification {} failed (attempt {}/{}): {}",
            id,
            attempt,
            self.config.max_attempts,
            err
        );
        self.record(id, self.service.mark_email_delivery_as_pending(id).await);
        DeliveryOutcome::Retrying { attempt }
    }

    async fn fail(&mut self, id: NotificationId, reason: String) -> DeliveryOutcome {
        self.ledger.clear(id);
        tracing::error!("Email for notification {} failed permanently: {}", id, reason);
        self.record(id, self.service.mark_email_delivery_as_failed(id).await);
        DeliveryOutcome::Failed(reason)
    }

    /// A failed status write leaves the row leased; it is picked up again
    /// once the lease runs out
    fn record(&self, id: NotificationId, result: hearth_core::AppResult<()>) {
        if let Err(e) = result {
            tracing::error!("Failed to record email outcome for notification {}: {}", id, e);
        }
    }
}
