//! Email delivery status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-notification email delivery state.
///
/// ```text
/// Pending ──claim──▶ Processing ──▶ Sent
///    ▲                   │    └───▶ Failed
///    └──── release ──────┘
/// ```
///
/// A `Processing` row whose lease has run out is claimable again.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum EmailDeliveryStatus {
    /// Waiting for a worker.
    #[default]
    Pending = 0,
    /// Claimed by a worker; see `email_locked_until`.
    Processing = 1,
    /// Delivered (or nothing to deliver).
    Sent = 2,
    /// Given up.
    Failed = 3,
}

impl EmailDeliveryStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EmailDeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
