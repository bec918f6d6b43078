//! Notification entity model.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError, ValidationErrors};

use hearth_core::types::{NotificationId, UserId};

use super::category::NotificationCategory;
use super::channel::NotificationChannels;
use super::delivery::EmailDeliveryStatus;
use super::kind::NotificationType;

/// A notification row, including its email delivery sub-state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Owning user.
    pub user_id: UserId,
    /// Semantic kind.
    pub notification_type: NotificationType,
    /// UI category.
    pub category: NotificationCategory,
    /// Localisation key for the message body.
    pub code_message: String,
    /// Localisation key for the call-to-action label.
    pub action_label_code: Option<String>,
    /// Derived from `action_label_code`.
    pub is_action_required: bool,
    /// Whether the owner has read the notification.
    pub is_read: bool,
    /// Whether the notification stays pinned in the UI.
    pub is_sticky: bool,
    /// Channel limit; empty means every channel.
    pub limit_notification_channels: NotificationChannels,
    /// Last day the notification is relevant.
    pub expires_at: Option<NaiveDate>,
    /// Free-form template data (usually JSON).
    pub metadata: Option<String>,
    /// Email delivery state.
    pub email_status: EmailDeliveryStatus,
    /// Lease expiry while `email_status` is `Processing`.
    pub email_locked_until: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was last modified.
    pub modified_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the email lease is absent or has run out.
    pub fn is_lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.email_locked_until.is_none_or(|until| until <= now)
    }

    /// Whether a worker may claim this notification for email delivery.
    pub fn is_email_candidate(&self, now: DateTime<Utc>) -> bool {
        match self.email_status {
            EmailDeliveryStatus::Pending => true,
            EmailDeliveryStatus::Processing => self.is_lease_expired(now),
            EmailDeliveryStatus::Sent | EmailDeliveryStatus::Failed => false,
        }
    }

    /// Whether the channel limit allows email.
    pub fn allows_email(&self) -> bool {
        self.limit_notification_channels.is_empty()
            || self
                .limit_notification_channels
                .contains(NotificationChannels::EMAIL)
    }

    /// Whether the notification is unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Replace the action label and recompute `is_action_required`.
    pub fn set_action_label_code(&mut self, code: Option<String>) {
        self.is_action_required = requires_action(code.as_deref());
        self.action_label_code = code;
    }

    /// Set the read flag.
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        self.is_read = true;
        self.modified_at = now;
    }

    /// Take the email lease until `until`.
    pub fn claim_email(&mut self, until: DateTime<Utc>, now: DateTime<Utc>) {
        self.email_status = EmailDeliveryStatus::Processing;
        self.email_locked_until = Some(until);
        self.modified_at = now;
    }

    /// Record a delivery outcome and release the lease.
    pub fn set_email_status(&mut self, status: EmailDeliveryStatus, now: DateTime<Utc>) {
        self.email_status = status;
        self.email_locked_until = None;
        self.modified_at = now;
    }
}

/// Data required to create a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewNotification {
    /// Owning user.
    #[validate(custom(function = "validate_owner"))]
    pub user_id: UserId,
    /// Semantic kind.
    #[validate(custom(function = "validate_type"))]
    pub notification_type: NotificationType,
    /// UI category.
    #[validate(custom(function = "validate_category"))]
    pub category: NotificationCategory,
    /// Localisation key for the message body.
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub code_message: String,
    /// Localisation key for the call-to-action label.
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub action_label_code: Option<String>,
    /// Pin the notification in the UI.
    #[serde(default)]
    pub is_sticky: bool,
    /// Channel limit; empty means every channel.
    #[serde(default)]
    pub limit_notification_channels: NotificationChannels,
    /// Last day the notification is relevant.
    pub expires_at: Option<NaiveDate>,
    /// Free-form template data.
    pub metadata: Option<String>,
}

impl NewNotification {
    /// Run every field check, including that `expires_at` lies strictly
    /// after `today`.
    pub fn validate_at(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let Some(expires_at) = self.expires_at
            && expires_at <= today
        {
            errors.add(
                "expires_at",
                ValidationError::new("expiry").with_message(Cow::Borrowed("must be in the future")),
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build the row that will be persisted.
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        let is_action_required = requires_action(self.action_label_code.as_deref());
        Notification {
            id: NotificationId::new(),
            user_id: self.user_id,
            notification_type: self.notification_type,
            category: self.category,
            code_message: self.code_message,
            action_label_code: self.action_label_code,
            is_action_required,
            is_read: false,
            is_sticky: self.is_sticky,
            limit_notification_channels: self.limit_notification_channels,
            expires_at: self.expires_at,
            metadata: self.metadata,
            email_status: EmailDeliveryStatus::Pending,
            email_locked_until: None,
            created_at: now,
            modified_at: now,
        }
    }
}

fn requires_action(code: Option<&str>) -> bool {
    code.is_some_and(|code| !code.trim().is_empty())
}

fn validate_owner(user_id: &UserId) -> Result<(), ValidationError> {
    if user_id.is_nil() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("is required")));
    }
    Ok(())
}

fn validate_type(kind: &NotificationType) -> Result<(), ValidationError> {
    if kind.is_none() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("must be set")));
    }
    Ok(())
}

fn validate_category(category: &NotificationCategory) -> Result<(), ValidationError> {
    if category.is_none() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("must be set")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn valid() -> NewNotification {
        NewNotification {
            user_id: UserId::new(),
            notification_type: NotificationType::Information,
            category: NotificationCategory::System,
            code_message: "notifications.welcome".to_string(),
            ..NewNotification::default()
        }
    }

    #[test]
    fn test_valid_notification_passes() {
        assert!(valid().validate_at(today()).is_ok());
    }

    #[test]
    fn test_every_violation_is_reported_per_field() {
        let input = NewNotification {
            user_id: UserId::from_uuid(Uuid::nil()),
            notification_type: NotificationType::None,
            category: NotificationCategory::None,
            code_message: String::new(),
            action_label_code: Some("x".repeat(101)),
            expires_at: Some(today()),
            ..NewNotification::default()
        };

        let errors = input.validate_at(today()).unwrap_err();
        let fields = errors.field_errors();
        for field in [
            "user_id",
            "notification_type",
            "category",
            "code_message",
            "action_label_code",
            "expires_at",
        ] {
            assert!(fields.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_default_input_has_no_owner() {
        let input = NewNotification {
            user_id: NewNotification::default().user_id,
            ..valid()
        };

        let errors = input.validate_at(today()).unwrap_err();
        assert!(errors.field_errors().contains_key("user_id"));
    }

    #[test]
    fn test_future_expiry_is_accepted() {
        let input = NewNotification {
            expires_at: Some(today() + Duration::days(1)),
            ..valid()
        };
        assert!(input.validate_at(today()).is_ok());
    }

    #[test]
    fn test_action_label_derives_action_required() {
        let now = Utc::now();
        let mut n = NewNotification {
            action_label_code: Some("notifications.confirm".to_string()),
            ..valid()
        }
        .into_notification(now);
        assert!(n.is_action_required);
        assert_eq!(n.email_status, EmailDeliveryStatus::Pending);

        n.set_action_label_code(Some("   ".to_string()));
        assert!(!n.is_action_required);
    }

    #[test]
    fn test_candidate_rules() {
        let now = Utc::now();
        let mut n = valid().into_notification(now);
        assert!(n.is_email_candidate(now));

        n.claim_email(now + Duration::minutes(2), now);
        assert!(!n.is_email_candidate(now));
        assert!(n.is_email_candidate(now + Duration::minutes(3)));

        n.set_email_status(EmailDeliveryStatus::Sent, now);
        assert!(n.email_locked_until.is_none());
        assert!(!n.is_email_candidate(now + Duration::days(1)));
    }

    #[test]
    fn test_allows_email() {
        let mut n = valid().into_notification(Utc::now());
        assert!(n.allows_email());
        n.limit_notification_channels = NotificationChannels::SMS;
        assert!(!n.allows_email());
    }
}
