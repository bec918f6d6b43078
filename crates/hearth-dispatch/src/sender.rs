//! The channel sender contract.

use async_trait::async_trait;
use serde::Serialize;

use hearth_entity::{DeliveryChannel, Notification, Recipient};

use crate::error::DeliveryError;

/// Proof of a successful channel send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReceipt {
    /// Channel that delivered.
    pub channel: DeliveryChannel,
    /// Message id assigned by the gateway, when it returns one.
    pub provider_message_id: Option<String>,
}

impl ChannelReceipt {
    /// Receipt without a provider id.
    pub fn new(channel: DeliveryChannel) -> Self {
        Self {
            channel,
            provider_message_id: None,
        }
    }
}

/// One outbound delivery channel.
///
/// Implementations are stateless apart from their HTTP client and can be
/// called concurrently.
#[async_trait]
pub trait ChannelSender: Send + Sync + std::fmt::Debug {
    /// Channel this sender delivers on.
    fn channel(&self) -> DeliveryChannel;

    /// Name used in logs and dispatch warnings.
    fn name(&self) -> &str;

    /// Deliver `notification` to `recipient`.
    async fn send(
        &self,
        notification: &Notification,
        recipient: &Recipient,
    ) -> Result<ChannelReceipt, DeliveryError>;
}
