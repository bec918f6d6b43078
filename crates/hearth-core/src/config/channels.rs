//! Outbound delivery channel configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration for every outbound channel gateway.
///
/// A channel takes part in delivery only when it is *configured*: enabled,
/// with an endpoint, and (for web push) a VAPID key pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ChannelsConfig {
    /// Email relay.
    #[serde(default)]
    #[validate(nested)]
    pub email: EmailChannelConfig,
    /// SMS gateway.
    #[serde(default)]
    #[validate(nested)]
    pub sms: GatewayConfig,
    /// Native (mobile) push gateway.
    #[serde(default)]
    #[validate(nested)]
    pub push: GatewayConfig,
    /// Browser web push gateway.
    #[serde(default)]
    #[validate(nested)]
    pub web_push: WebPushChannelConfig,
}

/// HTTP gateway settings shared by all channels.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GatewayConfig {
    /// Whether the channel is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Gateway URL that accepts JSON delivery requests.
    #[serde(default)]
    #[validate(url)]
    pub endpoint: Option<String>,
    /// Bearer token sent to the gateway.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 100, max = 120_000))]
    pub timeout_ms: u64,
}

impl GatewayConfig {
    /// Whether the gateway can be used.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && self
                .endpoint
                .as_deref()
                .is_some_and(|endpoint| !endpoint.trim().is_empty())
    }

    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Email relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmailChannelConfig {
    /// Relay gateway.
    #[serde(default)]
    #[validate(nested)]
    pub gateway: GatewayConfig,
    /// Sender address.
    #[serde(default = "default_from_address")]
    #[validate(email)]
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for EmailChannelConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            from_address: default_from_address(),
            from_name: default_from_name(),
        }
    }
}

/// Browser web push configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct WebPushChannelConfig {
    /// Web push gateway.
    #[serde(default)]
    #[validate(nested)]
    pub gateway: GatewayConfig,
    /// VAPID public key (URL-safe base64).
    #[serde(default)]
    pub vapid_public_key: Option<String>,
    /// VAPID private key (URL-safe base64).
    #[serde(default)]
    pub vapid_private_key: Option<String>,
    /// VAPID subject, usually a `mailto:` contact.
    #[serde(default)]
    pub vapid_subject: Option<String>,
}

impl WebPushChannelConfig {
    /// Web push is usable only with a complete VAPID key pair.
    pub fn is_configured(&self) -> bool {
        let present = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.trim().is_empty());
        self.gateway.is_configured()
            && present(&self.vapid_public_key)
            && present(&self.vapid_private_key)
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_from_address() -> String {
    "no-reply@hearth.local".to_string()
}

fn default_from_name() -> String {
    "Hearth".to_string()
}
