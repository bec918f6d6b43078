//! Gateway-backed channel senders.
//!
//! - **Email**: transactional email relay
//! - **SMS**: SMS gateway
//! - **Push**: native mobile push gateway
//! - **WebPush**: browser push gateway, signed with VAPID keys

mod email;
mod push;
mod sms;
mod web_push;

pub use email::EmailSender;
pub use push::PushSender;
pub use sms::SmsSender;
pub use web_push::WebPushSender;

use hearth_entity::{DeliveryChannel, Recipient};

use crate::error::DeliveryError;

/// The recipient's address for `channel`, or a permanent error.
pub(crate) fn require_address(
    recipient: &Recipient,
    channel: DeliveryChannel,
) -> Result<String, DeliveryError> {
    recipient.address_for(channel).ok_or_else(|| {
        DeliveryError::Permanent(format!(
            "user {} has no {channel} address",
            recipient.user_id
        ))
    })
}
