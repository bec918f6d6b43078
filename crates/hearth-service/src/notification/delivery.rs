//! Email delivery claim protocol.
//!
//! `Pending → Processing → {Sent, Failed, Pending}`. A row in
//! `Processing` whose lease has run out can be claimed again, which is how
//! work abandoned by a crashed worker is recovered.

use std::time::Duration;

use tracing::{debug, instrument};

use hearth_core::error::AppError;
use hearth_core::result::AppResult;
use hearth_core::types::NotificationId;
use hearth_entity::{EmailDeliveryStatus, Notification};

use super::service::NotificationService;

impl NotificationService {
    /// Ids of notifications awaiting email delivery, oldest first.
    pub async fn get_email_delivery_candidates(
        &self,
        batch_size: u32,
    ) -> AppResult<Vec<NotificationId>> {
        self.store.find_email_candidates(batch_size).await
    }

    /// Claim a notification for email delivery with a lease of `lease`.
    ///
    /// Exactly one of any number of concurrent callers succeeds. The
    /// others get `NotClaimable`; an unknown id is `NotFound`.
    #[instrument(skip(self))]
    pub async fn try_claim_email_delivery(
        &self,
        id: NotificationId,
        lease: Duration,
    ) -> AppResult<Notification> {
        let claimed = self.store.try_claim_email(id, lease).await?;
        debug!(locked_until = ?claimed.email_locked_until, "Email delivery claimed");
        Ok(claimed)
    }

    /// Record a delivered email.
    pub async fn mark_email_delivery_succeeded(&self, id: NotificationId) -> AppResult<()> {
        self.set_email_status(id, EmailDeliveryStatus::Sent).await
    }

    /// Release a claim so the notification is retried.
    pub async fn mark_email_delivery_as_pending(&self, id: NotificationId) -> AppResult<()> {
        self.set_email_status(id, EmailDeliveryStatus::Pending).await
    }

    /// Give up on a notification's email.
    pub async fn mark_email_delivery_as_failed(&self, id: NotificationId) -> AppResult<()> {
        self.set_email_status(id, EmailDeliveryStatus::Failed).await
    }

    async fn set_email_status(&self, id: NotificationId, status: EmailDeliveryStatus) -> AppResult<()> {
        if self.store.set_email_status(id, status).await? {
            debug!(notification_id = %id, status = %status, "Email delivery status updated");
            Ok(())
        } else {
            Err(AppError::not_found(format!("Notification {id} not found")))
        }
    }
}
