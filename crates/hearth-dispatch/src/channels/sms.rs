//! SMS gateway channel.

use async_trait::async_trait;
use tracing::info;

use hearth_core::config::GatewayConfig;
use hearth_core::result::AppResult;
use hearth_entity::{DeliveryChannel, Notification, Recipient};

use super::require_address;
use crate::error::DeliveryError;
use crate::gateway::{DeliveryRequest, GatewayClient};
use crate::sender::{ChannelReceipt, ChannelSender};

/// Sends notifications as text messages.
#[derive(Debug, Clone)]
pub struct SmsSender {
    gateway: GatewayClient,
}

impl SmsSender {
    /// Build the sender from configuration.
    pub fn from_config(config: &GatewayConfig) -> AppResult<Self> {
        Ok(Self {
            gateway: GatewayClient::from_config(config)?,
        })
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Sms
    }

    fn name(&self) -> &str {
        "sms"
    }

    async fn send(
        &self,
        notification: &Notification,
        recipient: &Recipient,
    ) -> Result<ChannelReceipt, DeliveryError> {
        let to = require_address(recipient, DeliveryChannel::Sms)?;
        let request = DeliveryRequest::new(DeliveryChannel::Sms, notification, &to);
        let message_id = self.gateway.post(&request).await?;

        info!(notification_id = %notification.id, "SMS accepted by gateway");
        Ok(ChannelReceipt {
            channel: DeliveryChannel::Sms,
            provider_message_id: message_id,
        })
    }
}
