//! Native push channel.

use async_trait::async_trait;
use tracing::info;

use hearth_core::config::GatewayConfig;
use hearth_core::result::AppResult;
use hearth_entity::{DeliveryChannel, Notification, Recipient};

use super::require_address;
use crate::error::DeliveryError;
use crate::gateway::{DeliveryRequest, GatewayClient};
use crate::sender::{ChannelReceipt, ChannelSender};

/// Sends notifications to the user's mobile device token.
#[derive(Debug, Clone)]
pub struct PushSender {
    gateway: GatewayClient,
}

impl PushSender {
    /// Build the sender from configuration.
    pub fn from_config(config: &GatewayConfig) -> AppResult<Self> {
        Ok(Self {
            gateway: GatewayClient::from_config(config)?,
        })
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Push
    }

    fn name(&self) -> &str {
        "push"
    }

    async fn send(
        &self,
        notification: &Notification,
        recipient: &Recipient,
    ) -> Result<ChannelReceipt, DeliveryError> {
        let token = require_address(recipient, DeliveryChannel::Push)?;
        let request = DeliveryRequest::new(DeliveryChannel::Push, notification, &token);
        let message_id = self.gateway.post(&request).await?;

        info!(notification_id = %notification.id, "Push accepted by gateway");
        Ok(ChannelReceipt {
            channel: DeliveryChannel::Push,
            provider_message_id: message_id,
        })
    }
}
