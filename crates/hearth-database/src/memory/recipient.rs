//! In-memory recipient directory.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use hearth_core::result::AppResult;
use hearth_core::types::UserId;
use hearth_entity::Recipient;

use crate::store::RecipientDirectory;

/// Recipient profiles kept in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecipientDirectory {
    recipients: Arc<DashMap<UserId, Recipient>>,
}

impl MemoryRecipientDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub fn upsert(&self, recipient: Recipient) {
        self.recipients.insert(recipient.user_id, recipient);
    }

    /// Copy of a stored profile.
    pub fn get(&self, user_id: UserId) -> Option<Recipient> {
        self.recipients.get(&user_id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl RecipientDirectory for MemoryRecipientDirectory {
    async fn find_recipient(&self, user_id: UserId) -> AppResult<Option<Recipient>> {
        Ok(self.get(user_id))
    }
}
