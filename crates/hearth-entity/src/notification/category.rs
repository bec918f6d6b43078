//! Notification category enumeration.

use serde::{Deserialize, Serialize};

/// Category of a notification, used by the tracker UI for filtering.
///
/// `None` is the unset sentinel and never passes validation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Unset.
    #[default]
    None = 0,
    /// Account and project lifecycle messages.
    System = 1,
    /// Sign-in, password and email-confirmation messages.
    Security = 2,
}

impl NotificationCategory {
    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::System => "system",
            Self::Security => "security",
        }
    }

    /// Whether this is the unset sentinel.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
