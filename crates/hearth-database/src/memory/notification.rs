//! In-memory notification store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use hearth_core::error::AppError;
use hearth_core::result::AppResult;
use hearth_core::types::{NotificationId, UserId};
use hearth_entity::{EmailDeliveryStatus, Notification, NotificationCategory};

use crate::store::NotificationStore;

/// Notification store keeping rows in a concurrent map.
///
/// Conditional updates run while holding the row's map entry, so a claim
/// is as atomic as the PostgreSQL conditional `UPDATE`.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    rows: Arc<DashMap<NotificationId, Notification>>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notifications.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store holds no notifications.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Overwrite the email lease of a row. Returns `false` if the row does
    /// not exist.
    pub fn set_email_locked_until(&self, id: NotificationId, until: Option<DateTime<Utc>>) -> bool {
        match self.rows.get_mut(&id) {
            Some(mut row) => {
                row.email_locked_until = until;
                true
            }
            None => false,
        }
    }

    fn collect_for_user<F>(&self, user_id: UserId, filter: F) -> Vec<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        let mut rows: Vec<Notification> = self
            .rows
            .iter()
            .filter(|entry| entry.user_id == user_id && filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        match self.rows.entry(notification.id) {
            Entry::Occupied(_) => Err(AppError::database(format!(
                "Notification {} already exists",
                notification.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(notification.clone());
                Ok(notification.clone())
            }
        }
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        Ok(self.rows.get(&id).map(|row| row.value().clone()))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Notification>> {
        Ok(self.collect_for_user(user_id, |_| true))
    }

    async fn find_unread(
        &self,
        user_id: UserId,
        category: Option<NotificationCategory>,
    ) -> AppResult<Vec<Notification>> {
        Ok(self.collect_for_user(user_id, |n| {
            n.is_unread() && category.is_none_or(|c| n.category == c)
        }))
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<u64> {
        let count = self
            .rows
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.is_unread())
            .count();
        Ok(count as u64)
    }

    async fn mark_read(&self, id: NotificationId) -> AppResult<bool> {
        match self.rows.get_mut(&id) {
            Some(mut row) => {
                row.mark_read(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_email_candidates(&self, limit: u32) -> AppResult<Vec<NotificationId>> {
        let now = Utc::now();
        let mut candidates: Vec<(DateTime<Utc>, NotificationId)> = self
            .rows
            .iter()
            .filter(|entry| entry.is_email_candidate(now))
            .map(|entry| (entry.created_at, entry.id))
            .collect();
        candidates.sort();
        Ok(candidates
            .into_iter()
            .take(limit as usize)
            .map(|(_, id)| id)
            .collect())
    }

    async fn try_claim_email(&self, id: NotificationId, lease: Duration) -> AppResult<Notification> {
        let Some(mut row) = self.rows.get_mut(&id) else {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        };

        let now = Utc::now();
        if !row.is_email_candidate(now) {
            debug!(notification_id = %id, "Email delivery claim lost");
            return Err(AppError::not_claimable(format!(
                "Notification {id} is not claimable for email delivery"
            )));
        }

        let lease = chrono::Duration::from_std(lease)
            .map_err(|e| AppError::internal(format!("Lease out of range: {e}")))?;
        row.claim_email(now + lease, now);
        Ok(row.value().clone())
    }

    async fn set_email_status(
        &self,
        id: NotificationId,
        status: EmailDeliveryStatus,
    ) -> AppResult<bool> {
        match self.rows.get_mut(&id) {
            Some(mut row) => {
                row.set_email_status(status, Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
