//! Storage contracts used by the notification service and worker.

use std::time::Duration;

use async_trait::async_trait;

use hearth_core::result::AppResult;
use hearth_core::types::{NotificationId, UserId};
use hearth_entity::{EmailDeliveryStatus, Notification, NotificationCategory, Recipient};

/// Persistence operations for notifications.
///
/// Every write is a single atomic statement. The email claim in
/// particular must never be split into a read followed by a write.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new notification and return the stored row.
    async fn insert(&self, notification: &Notification) -> AppResult<Notification>;

    /// Find a notification by id.
    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>>;

    /// All notifications of a user, newest first.
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Notification>>;

    /// Unread notifications of a user, newest first, optionally of one category.
    async fn find_unread(
        &self,
        user_id: UserId,
        category: Option<NotificationCategory>,
    ) -> AppResult<Vec<Notification>>;

    /// Number of unread notifications of a user.
    async fn count_unread(&self, user_id: UserId) -> AppResult<u64>;

    /// Set the read flag. Returns `false` if the row does not exist.
    async fn mark_read(&self, id: NotificationId) -> AppResult<bool>;

    /// Ids eligible for email delivery, oldest first, at most `limit`.
    ///
    /// Eligible rows are `Pending`, or `Processing` with an absent or
    /// expired lease.
    async fn find_email_candidates(&self, limit: u32) -> AppResult<Vec<NotificationId>>;

    /// Atomically move an eligible row to `Processing` with a lease of
    /// `lease` from now.
    ///
    /// Fails with `NotFound` if the row does not exist and with
    /// `NotClaimable` if it is not eligible (already sent, failed, or
    /// leased by someone else).
    async fn try_claim_email(&self, id: NotificationId, lease: Duration) -> AppResult<Notification>;

    /// Record an email outcome and clear the lease. Returns `false` if the
    /// row does not exist.
    async fn set_email_status(
        &self,
        id: NotificationId,
        status: EmailDeliveryStatus,
    ) -> AppResult<bool>;
}

/// Read access to user delivery profiles.
#[async_trait]
pub trait RecipientDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Find the delivery profile of a user.
    async fn find_recipient(&self, user_id: UserId) -> AppResult<Option<Recipient>>;
}
