//! PostgreSQL recipient lookup.

use async_trait::async_trait;
use sqlx::PgPool;

use hearth_core::error::{AppError, ErrorKind};
use hearth_core::result::AppResult;
use hearth_core::types::UserId;
use hearth_entity::Recipient;

use crate::store::RecipientDirectory;

/// Reads delivery profiles from the tracker's `users` table.
#[derive(Debug, Clone)]
pub struct RecipientRepository {
    pool: PgPool,
}

impl RecipientRepository {
    /// Create a new recipient repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for RecipientRepository {
    async fn find_recipient(&self, user_id: UserId) -> AppResult<Option<Recipient>> {
        sqlx::query_as::<_, Recipient>(
            "SELECT id AS user_id, email, phone_number, push_token, web_push_endpoint, \
             notification_channels \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find recipient", e))
    }
}
