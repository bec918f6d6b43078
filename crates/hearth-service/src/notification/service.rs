//! Notification creation and read-state transitions.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use hearth_core::error::AppError;
use hearth_core::result::AppResult;
use hearth_core::types::{NotificationId, UserId};
use hearth_database::{NotificationStore, RecipientDirectory};
use hearth_dispatch::ChannelDispatcher;
use hearth_entity::{
    NewNotification, Notification, NotificationCategory, NotificationChannels, NotificationType,
};

use crate::intake::DeliveryIntake;

/// Creates notifications and manages their lifecycle.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Notification persistence.
    pub(crate) store: Arc<dyn NotificationStore>,
    /// User delivery profiles.
    recipients: Arc<dyn RecipientDirectory>,
    /// Non-email fan-out.
    dispatcher: Arc<ChannelDispatcher>,
    /// Wakes the email worker.
    intake: DeliveryIntake,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        recipients: Arc<dyn RecipientDirectory>,
        dispatcher: Arc<ChannelDispatcher>,
        intake: DeliveryIntake,
    ) -> Self {
        Self {
            store,
            recipients,
            dispatcher,
            intake,
        }
    }

    /// Validate, store and announce a new notification.
    ///
    /// After the row is stored the id is published to the email worker and
    /// every non-email channel is attempted. Fan-out problems are logged and
    /// never fail the call.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, notification_type = %input.notification_type))]
    pub async fn create_notification(&self, input: NewNotification) -> AppResult<Notification> {
        let now = Utc::now();
        input.validate_at(now.date_naive())?;

        let notification = self.store.insert(&input.into_notification(now)).await?;
        info!(notification_id = %notification.id, "Notification created");

        self.intake.publish(notification.id);
        self.fan_out(&notification).await;

        Ok(notification)
    }

    async fn fan_out(&self, notification: &Notification) {
        let recipient = match self.recipients.find_recipient(notification.user_id).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                debug!(user_id = %notification.user_id, "No delivery profile, skipping fan-out");
                return;
            }
            Err(e) => {
                warn!(notification_id = %notification.id, error = %e, "Recipient lookup failed, skipping fan-out");
                return;
            }
        };

        let report = self
            .dispatcher
            .send_excluding(notification, &recipient, NotificationChannels::EMAIL)
            .await;
        if let Err(e) = report.into_result() {
            warn!(notification_id = %notification.id, error = %e, failures = ?e.details, "Fan-out failed");
        }
    }

    /// Every notification of a user, newest first.
    pub async fn get_all_for_user(&self, user_id: UserId) -> AppResult<Vec<Notification>> {
        self.store.find_by_user(user_id).await
    }

    /// Unread notifications of a user, optionally of one category.
    pub async fn get_unread(
        &self,
        user_id: UserId,
        category: Option<NotificationCategory>,
    ) -> AppResult<Vec<Notification>> {
        self.store.find_unread(user_id, category).await
    }

    /// Fetch one notification.
    pub async fn get_by_id(&self, id: NotificationId) -> AppResult<Notification> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// Number of unread notifications of a user.
    pub async fn count_unread(&self, user_id: UserId) -> AppResult<u64> {
        self.store.count_unread(user_id).await
    }

    /// Mark one notification as read.
    ///
    /// Notifications owned by someone else are reported as missing.
    /// Action-required notifications can only be cleared through
    /// [`action_made`](Self::action_made).
    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, user_id: UserId, id: NotificationId) -> AppResult<()> {
        let notification = self
            .store
            .find_by_id(id)
            .await?
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;

        if notification.is_action_required {
            return Err(AppError::action_required(format!(
                "Notification {id} requires an action before it can be read"
            )));
        }

        if !self.store.mark_read(id).await? {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }

    /// Mark every unread, non-action notification of a user as read.
    ///
    /// Returns how many rows were updated. Rows that fail are collected
    /// and reported together; rows already updated stay updated.
    #[instrument(skip(self))]
    pub async fn mark_all_as_read(&self, user_id: UserId) -> AppResult<u64> {
        let targets: Vec<NotificationId> = self
            .store
            .find_unread(user_id, None)
            .await?
            .into_iter()
            .filter(|n| !n.is_action_required)
            .map(|n| n.id)
            .collect();

        self.mark_each_read(targets).await
    }

    /// The user completed the action behind every unread notification of
    /// `notification_type`; mark those as read.
    #[instrument(skip(self))]
    pub async fn action_made(
        &self,
        user_id: UserId,
        notification_type: NotificationType,
    ) -> AppResult<u64> {
        let targets: Vec<NotificationId> = self
            .store
            .find_unread(user_id, None)
            .await?
            .into_iter()
            .filter(|n| n.is_action_required && n.notification_type == notification_type)
            .map(|n| n.id)
            .collect();

        self.mark_each_read(targets).await
    }

    async fn mark_each_read(&self, ids: Vec<NotificationId>) -> AppResult<u64> {
        let total = ids.len();
        let mut marked = 0u64;
        let mut failures = Vec::new();

        for id in ids {
            match self.store.mark_read(id).await {
                Ok(true) => marked += 1,
                Ok(false) => failures.push(format!("{id}: not found")),
                Err(e) => failures.push(format!("{id}: {e}")),
            }
        }

        if failures.is_empty() {
            debug!(marked, "Notifications marked as read");
            return Ok(marked);
        }

        warn!(marked, failed = failures.len(), "Some notifications could not be marked as read");
        Err(AppError::aggregate(
            format!("{} of {total} notifications could not be marked as read", failures.len()),
            failures,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use hearth_core::ErrorKind;
    use hearth_database::{MemoryNotificationStore, MemoryRecipientDirectory};
    use hearth_entity::EmailDeliveryStatus;

    use crate::intake::delivery_intake;

    /// Memory store whose `mark_read` errors for one chosen row
    #[derive(Debug, Default)]
    struct BrokenRowStore {
        inner: MemoryNotificationStore,
        broken: Mutex<Option<NotificationId>>,
    }

    impl BrokenRowStore {
        fn break_row(&self, id: NotificationId) {
            *self.broken.lock().unwrap() = Some(id);
        }
    }

    #[async_trait]
    impl NotificationStore for BrokenRowStore {
        async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
            self.inner.insert(notification).await
        }

        async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Notification>> {
            self.inner.find_by_user(user_id).await
        }

        async fn find_unread(
            &self,
            user_id: UserId,
            category: Option<NotificationCategory>,
        ) -> AppResult<Vec<Notification>> {
            self.inner.find_unread(user_id, category).await
        }

        async fn count_unread(&self, user_id: UserId) -> AppResult<u64> {
            self.inner.count_unread(user_id).await
        }

        async fn mark_read(&self, id: NotificationId) -> AppResult<bool> {
            if *self.broken.lock().unwrap() == Some(id) {
                return Err(AppError::database("connection reset by peer"));
            }
            self.inner.mark_read(id).await
        }

        async fn find_email_candidates(&self, limit: u32) -> AppResult<Vec<NotificationId>> {
            self.inner.find_email_candidates(limit).await
        }

        async fn try_claim_email(
            &self,
            id: NotificationId,
            lease: Duration,
        ) -> AppResult<Notification> {
            self.inner.try_claim_email(id, lease).await
        }

        async fn set_email_status(
            &self,
            id: NotificationId,
            status: EmailDeliveryStatus,
        ) -> AppResult<bool> {
            self.inner.set_email_status(id, status).await
        }
    }

    fn service_over(
        store: Arc<dyn NotificationStore>,
    ) -> (NotificationService, crate::intake::IntakeReceiver) {
        let (intake, receiver) = delivery_intake();
        let service = NotificationService::new(
            store,
            Arc::new(MemoryRecipientDirectory::new()),
            Arc::new(ChannelDispatcher::default()),
            intake,
        );
        (service, receiver)
    }

    fn service() -> (NotificationService, crate::intake::IntakeReceiver) {
        service_over(Arc::new(MemoryNotificationStore::new()))
    }

    fn input(user_id: UserId) -> NewNotification {
        NewNotification {
            user_id,
            notification_type: NotificationType::Information,
            category: NotificationCategory::System,
            code_message: "notifications.monthly_summary".to_string(),
            ..NewNotification::default()
        }
    }

    #[tokio::test]
    async fn test_create_publishes_to_intake() {
        let (service, mut receiver) = service();
        let created = service.create_notification(input(UserId::new())).await.unwrap();

        assert_eq!(receiver.drain(), vec![created.id]);
        assert!(!created.is_read);
    }

    #[tokio::test]
    async fn test_mark_as_read_hides_foreign_rows() {
        let (service, _receiver) = service();
        let created = service.create_notification(input(UserId::new())).await.unwrap();

        let err = service
            .mark_as_read(UserId::new(), created.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        service.mark_as_read(created.user_id, created.id).await.unwrap();
        assert!(service.get_by_id(created.id).await.unwrap().is_read);
    }

    #[tokio::test]
    async fn test_action_made_only_touches_matching_type() {
        let (service, _receiver) = service();
        let user = UserId::new();
        let confirm = service
            .create_notification(NewNotification {
                notification_type: NotificationType::EmailConfirmation,
                category: NotificationCategory::Security,
                action_label_code: Some("notifications.confirm_email".to_string()),
                ..input(user)
            })
            .await
            .unwrap();
        let invite = service
            .create_notification(NewNotification {
                notification_type: NotificationType::ProjectInvitation,
                action_label_code: Some("notifications.accept".to_string()),
                ..input(user)
            })
            .await
            .unwrap();

        let marked = service
            .action_made(user, NotificationType::EmailConfirmation)
            .await
            .unwrap();
        assert_eq!(marked, 1);
        assert!(service.get_by_id(confirm.id).await.unwrap().is_read);
        assert!(!service.get_by_id(invite.id).await.unwrap().is_read);
    }

    #[tokio::test]
    async fn test_mark_all_as_read_reports_failed_rows_and_keeps_the_rest() {
        let store = Arc::new(BrokenRowStore::default());
        let (service, _receiver) = service_over(store.clone());
        let user = UserId::new();

        let mut created = Vec::new();
        for _ in 0..3 {
            created.push(service.create_notification(input(user)).await.unwrap());
        }
        store.break_row(created[1].id);

        let err = service.mark_all_as_read(user).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Aggregate);
        assert_eq!(err.details.len(), 1);
        assert!(err.details[0].starts_with(&created[1].id.to_string()));

        assert!(service.get_by_id(created[0].id).await.unwrap().is_read);
        assert!(!service.get_by_id(created[1].id).await.unwrap().is_read);
        assert!(service.get_by_id(created[2].id).await.unwrap().is_read);
        assert_eq!(service.count_unread(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_action_made_aggregates_failures() {
        let store = Arc::new(BrokenRowStore::default());
        let (service, _receiver) = service_over(store.clone());
        let user = UserId::new();
        let invitation = || NewNotification {
            notification_type: NotificationType::ProjectInvitation,
            action_label_code: Some("notifications.accept".to_string()),
            ..input(user)
        };

        let first = service.create_notification(invitation()).await.unwrap();
        let second = service.create_notification(invitation()).await.unwrap();
        store.break_row(first.id);

        let err = service
            .action_made(user, NotificationType::ProjectInvitation)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Aggregate);
        assert_eq!(err.details.len(), 1);
        assert!(!service.get_by_id(first.id).await.unwrap().is_read);
        assert!(service.get_by_id(second.id).await.unwrap().is_read);
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let (service, _receiver) = service();
        let err = service.get_by_id(NotificationId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
