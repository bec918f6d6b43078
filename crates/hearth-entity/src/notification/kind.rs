//! Notification type enumeration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The semantic kind of a notification.
///
/// Action-required notifications are cleared per type through
/// `action_made`, e.g. every pending `EmailConfirmation` reminder is
/// marked read once the address is confirmed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Unset.
    #[default]
    None = 0,
    /// The user still has to confirm their email address.
    EmailConfirmation = 1,
    /// Plain informational message.
    Information = 2,
    /// Security-relevant account event.
    Security = 3,
    /// The user was invited to collaborate on a project.
    ProjectInvitation = 4,
    /// A project budget crossed a spending threshold.
    BudgetThreshold = 5,
    /// Scheduled announcement from the operators.
    Announcement = 6,
}

impl NotificationType {
    /// Return the type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::EmailConfirmation => "email_confirmation",
            Self::Information => "information",
            Self::Security => "security",
            Self::ProjectInvitation => "project_invitation",
            Self::BudgetThreshold => "budget_threshold",
            Self::Announcement => "announcement",
        }
    }

    /// Whether this is the unset sentinel.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
