//! Browser web push channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use hearth_core::config::WebPushChannelConfig;
use hearth_core::error::AppError;
use hearth_core::result::AppResult;
use hearth_entity::{DeliveryChannel, Notification, Recipient};

use super::require_address;
use crate::error::DeliveryError;
use crate::gateway::{DeliveryRequest, GatewayClient};
use crate::sender::{ChannelReceipt, ChannelSender};

/// Sends notifications to a browser push subscription.
///
/// The gateway signs each message with the VAPID key pair it receives.
#[derive(Debug, Clone)]
pub struct WebPushSender {
    gateway: GatewayClient,
    vapid: VapidKeys,
}

#[derive(Debug, Clone, Serialize)]
struct VapidKeys {
    public_key: String,
    private_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
}

#[derive(Serialize)]
struct WebPushRequest<'a> {
    #[serde(flatten)]
    base: DeliveryRequest<'a>,
    vapid: &'a VapidKeys,
}

impl WebPushSender {
    /// Build the sender from configuration. Both VAPID keys are required.
    pub fn from_config(config: &WebPushChannelConfig) -> AppResult<Self> {
        let (Some(public_key), Some(private_key)) = (
            config.vapid_public_key.clone(),
            config.vapid_private_key.clone(),
        ) else {
            return Err(AppError::configuration(
                "Web push requires vapid_public_key and vapid_private_key",
            ));
        };

        Ok(Self {
            gateway: GatewayClient::from_config(&config.gateway)?,
            vapid: VapidKeys {
                public_key,
                private_key,
                subject: config.vapid_subject.clone(),
            },
        })
    }
}

#[async_trait]
impl ChannelSender for WebPushSender {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::WebPush
    }

    fn name(&self) -> &str {
        "web_push"
    }

    async fn send(
        &self,
        notification: &Notification,
        recipient: &Recipient,
    ) -> Result<ChannelReceipt, DeliveryError> {
        let endpoint = require_address(recipient, DeliveryChannel::WebPush)?;
        let request = WebPushRequest {
            base: DeliveryRequest::new(DeliveryChannel::WebPush, notification, &endpoint),
            vapid: &self.vapid,
        };
        let message_id = self.gateway.post(&request).await?;

        info!(notification_id = %notification.id, "Web push accepted by gateway");
        Ok(ChannelReceipt {
            channel: DeliveryChannel::WebPush,
            provider_message_id: message_id,
        })
    }
}
