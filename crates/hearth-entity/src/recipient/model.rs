//! Recipient delivery profile.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hearth_core::types::UserId;

use crate::notification::{DeliveryChannel, NotificationChannels};

/// Where and how a user can be reached.
///
/// Read from the tracker's `users` table, which belongs to the identity
/// system and is never written by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipient {
    /// The user.
    pub user_id: UserId,
    /// Email address, if confirmed or pending confirmation.
    pub email: Option<String>,
    /// Phone number in E.164 form.
    pub phone_number: Option<String>,
    /// Native push device token.
    pub push_token: Option<String>,
    /// Browser push subscription endpoint.
    pub web_push_endpoint: Option<String>,
    /// Channels the user opted into.
    pub notification_channels: NotificationChannels,
}

impl Recipient {
    /// The address used for `channel`, if the user has one.
    ///
    /// In-app delivery needs no address and always yields the user id.
    pub fn address_for(&self, channel: DeliveryChannel) -> Option<String> {
        let value = match channel {
            DeliveryChannel::InApp => return Some(self.user_id.to_string()),
            DeliveryChannel::Email => self.email.as_deref(),
            DeliveryChannel::Sms => self.phone_number.as_deref(),
            DeliveryChannel::Push => self.push_token.as_deref(),
            DeliveryChannel::WebPush => self.web_push_endpoint.as_deref(),
        };
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Whether the user opted into email.
    pub fn wants_email(&self) -> bool {
        self.notification_channels
            .contains(NotificationChannels::EMAIL)
    }
}
