//! Delivery channels and the channel bitset.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Set of delivery channels, stored as a plain `INT4` bitmask.
    ///
    /// Used both for a user's channel preferences and for a
    /// notification's channel limit. As a limit, the empty set means
    /// "no restriction".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NotificationChannels: i32 {
        /// Notification list inside the tracker.
        const IN_APP = 1;
        /// Email relay.
        const EMAIL = 1 << 1;
        /// SMS gateway.
        const SMS = 1 << 2;
        /// Native mobile push.
        const PUSH = 1 << 3;
        /// Browser web push.
        const WEB_PUSH = 1 << 4;
    }
}

impl NotificationChannels {
    /// Narrow `self` by a per-notification limit. An empty limit leaves
    /// the set untouched.
    pub fn restrict(self, limit: NotificationChannels) -> NotificationChannels {
        if limit.is_empty() { self } else { self & limit }
    }

    /// Whether the set allows `channel`.
    pub fn allows(self, channel: DeliveryChannel) -> bool {
        self.contains(channel.as_flag())
    }

    /// The individual channels in the set, in bit order.
    pub fn channels(self) -> Vec<DeliveryChannel> {
        DeliveryChannel::ALL
            .into_iter()
            .filter(|channel| self.allows(*channel))
            .collect()
    }
}

impl Serialize for NotificationChannels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.bits())
    }
}

impl<'de> Deserialize<'de> for NotificationChannels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = i32::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

impl sqlx::Type<sqlx::Postgres> for NotificationChannels {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for NotificationChannels {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.bits(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for NotificationChannels {
    fn decode(
        value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        <i32 as sqlx::Decode<'r, sqlx::Postgres>>::decode(value).map(Self::from_bits_truncate)
    }
}

/// A single delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    InApp,
    Email,
    Sms,
    Push,
    WebPush,
}

impl DeliveryChannel {
    /// Every channel, in bit order.
    pub const ALL: [DeliveryChannel; 5] = [
        Self::InApp,
        Self::Email,
        Self::Sms,
        Self::Push,
        Self::WebPush,
    ];

    /// The bit for this channel.
    pub fn as_flag(self) -> NotificationChannels {
        match self {
            Self::InApp => NotificationChannels::IN_APP,
            Self::Email => NotificationChannels::EMAIL,
            Self::Sms => NotificationChannels::SMS,
            Self::Push => NotificationChannels::PUSH,
            Self::WebPush => NotificationChannels::WEB_PUSH,
        }
    }

    /// Return the channel as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
            Self::WebPush => "web_push",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_limit_is_no_restriction() {
        let prefs = NotificationChannels::EMAIL | NotificationChannels::SMS;
        assert_eq!(prefs.restrict(NotificationChannels::empty()), prefs);
        assert_eq!(
            prefs.restrict(NotificationChannels::SMS | NotificationChannels::PUSH),
            NotificationChannels::SMS
        );
    }

    #[test]
    fn test_channels_in_bit_order() {
        let set = NotificationChannels::WEB_PUSH | NotificationChannels::IN_APP;
        assert_eq!(
            set.channels(),
            vec![DeliveryChannel::InApp, DeliveryChannel::WebPush]
        );
    }

    #[test]
    fn test_serde_as_bits() {
        let set = NotificationChannels::EMAIL | NotificationChannels::PUSH;
        assert_eq!(serde_json::to_string(&set).unwrap(), "10");

        let parsed: NotificationChannels = serde_json::from_str("130").unwrap();
        assert_eq!(parsed, NotificationChannels::EMAIL);
    }
}
