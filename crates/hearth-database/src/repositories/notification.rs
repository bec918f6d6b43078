//! PostgreSQL notification repository.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use hearth_core::error::{AppError, ErrorKind};
use hearth_core::result::AppResult;
use hearth_core::types::{NotificationId, UserId};
use hearth_entity::{EmailDeliveryStatus, Notification, NotificationCategory};

use crate::store::NotificationStore;

/// Repository for notification rows and the email claim protocol.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: NotificationId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM notifications WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to look up notification", e))
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, n: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, notification_type, category, code_message, \
             action_label_code, is_action_required, is_read, is_sticky, limit_notification_channels, \
             expires_at, metadata, email_status, email_locked_until, created_at, modified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) RETURNING *",
        )
        .bind(n.id)
        .bind(n.user_id)
        .bind(n.notification_type)
        .bind(n.category)
        .bind(&n.code_message)
        .bind(&n.action_label_code)
        .bind(n.is_action_required)
        .bind(n.is_read)
        .bind(n.is_sticky)
        .bind(n.limit_notification_channels)
        .bind(n.expires_at)
        .bind(&n.metadata)
        .bind(n.email_status)
        .bind(n.email_locked_until)
        .bind(n.created_at)
        .bind(n.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find notification", e))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))
    }

    async fn find_unread(
        &self,
        user_id: UserId,
        category: Option<NotificationCategory>,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE user_id = $1 AND is_read = FALSE AND ($2::INT4 IS NULL OR category = $2) \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list unread notifications", e))
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))?;
        Ok(count.max(0) as u64)
    }

    async fn mark_read(&self, id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, modified_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_email_candidates(&self, limit: u32) -> AppResult<Vec<NotificationId>> {
        sqlx::query_scalar::<_, NotificationId>(
            "SELECT id FROM notifications \
             WHERE email_status = $1 \
                OR (email_status = $2 AND (email_locked_until IS NULL OR email_locked_until <= NOW())) \
             ORDER BY created_at ASC \
             LIMIT $3",
        )
        .bind(EmailDeliveryStatus::Pending)
        .bind(EmailDeliveryStatus::Processing)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list email candidates", e))
    }

    async fn try_claim_email(&self, id: NotificationId, lease: Duration) -> AppResult<Notification> {
        let claimed = sqlx::query_as::<_, Notification>(
            "UPDATE notifications \
             SET email_status = $2, \
                 email_locked_until = NOW() + make_interval(secs => $3), \
                 modified_at = NOW() \
             WHERE id = $1 \
               AND (email_status = $4 \
                    OR (email_status = $2 AND (email_locked_until IS NULL OR email_locked_until <= NOW()))) \
             RETURNING *",
        )
        .bind(id)
        .bind(EmailDeliveryStatus::Processing)
        .bind(lease.as_secs_f64())
        .bind(EmailDeliveryStatus::Pending)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim notification", e))?;

        match claimed {
            Some(notification) => Ok(notification),
            None if self.exists(id).await? => {
                debug!(notification_id = %id, "Email delivery claim lost");
                Err(AppError::not_claimable(format!(
                    "Notification {id} is not claimable for email delivery"
                )))
            }
            None => Err(AppError::not_found(format!("Notification {id} not found"))),
        }
    }

    async fn set_email_status(
        &self,
        id: NotificationId,
        status: EmailDeliveryStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET email_status = $2, email_locked_until = NULL, modified_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update email status", e))?;
        Ok(result.rows_affected() > 0)
    }
}
