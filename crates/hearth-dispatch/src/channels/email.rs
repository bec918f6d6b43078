//! Email relay channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use hearth_core::config::EmailChannelConfig;
use hearth_core::result::AppResult;
use hearth_entity::{DeliveryChannel, Notification, Recipient};

use super::require_address;
use crate::error::DeliveryError;
use crate::gateway::{DeliveryRequest, GatewayClient};
use crate::sender::{ChannelReceipt, ChannelSender};

/// Sends notifications through the transactional email relay.
#[derive(Debug, Clone)]
pub struct EmailSender {
    gateway: GatewayClient,
    from_address: String,
    from_name: String,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    #[serde(flatten)]
    base: DeliveryRequest<'a>,
    from: Sender<'a>,
}

#[derive(Serialize)]
struct Sender<'a> {
    address: &'a str,
    name: &'a str,
}

impl EmailSender {
    /// Build the sender from configuration.
    pub fn from_config(config: &EmailChannelConfig) -> AppResult<Self> {
        Ok(Self {
            gateway: GatewayClient::from_config(&config.gateway)?,
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
        })
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    fn name(&self) -> &str {
        "email"
    }

    async fn send(
        &self,
        notification: &Notification,
        recipient: &Recipient,
    ) -> Result<ChannelReceipt, DeliveryError> {
        let to = require_address(recipient, DeliveryChannel::Email)?;
        debug!(
            notification_id = %notification.id,
            from = %self.from_address,
            "Sending email"
        );

        let request = EmailRequest {
            base: DeliveryRequest::new(DeliveryChannel::Email, notification, &to),
            from: Sender {
                address: &self.from_address,
                name: &self.from_name,
            },
        };
        let message_id = self.gateway.post(&request).await?;

        info!(
            notification_id = %notification.id,
            message_id = message_id.as_deref().unwrap_or("-"),
            "Email accepted by relay"
        );
        Ok(ChannelReceipt {
            channel: DeliveryChannel::Email,
            provider_message_id: message_id,
        })
    }
}
