//! JSON-over-HTTP client shared by every gateway-backed channel.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use hearth_core::config::GatewayConfig;
use hearth_core::error::{AppError, ErrorKind};
use hearth_entity::{DeliveryChannel, Notification};

use crate::error::DeliveryError;

/// Longest gateway error body kept in a delivery error.
const MAX_ERROR_BODY: usize = 256;

/// Posts delivery requests to one channel gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

/// Optional acknowledgement body returned by gateways.
#[derive(Debug, Deserialize)]
struct GatewayAck {
    #[serde(alias = "message_id")]
    id: Option<String>,
}

impl GatewayClient {
    /// Build a client from gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, AppError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AppError::configuration("Gateway endpoint is not set"))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// POST `body` and return the gateway's message id, if any.
    pub async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<Option<String>, DeliveryError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            let ack = response.json::<GatewayAck>().await.ok();
            return Ok(ack.and_then(|a| a.id));
        }

        let text: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY)
            .collect();
        debug!(endpoint = %self.endpoint, status = %status, "Gateway rejected request");
        Err(classify_status(status, &text))
    }
}

/// Map a non-success HTTP status to a delivery error.
pub fn classify_status(status: StatusCode, body: &str) -> DeliveryError {
    let message = if body.is_empty() {
        format!("gateway returned {status}")
    } else {
        format!("gateway returned {status}: {body}")
    };

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        DeliveryError::Transient(message)
    } else {
        DeliveryError::Permanent(message)
    }
}

/// Fields every channel request carries.
#[derive(Debug, Serialize)]
pub struct DeliveryRequest<'a> {
    /// Notification id, used by gateways for idempotency.
    pub notification_id: String,
    /// Owner.
    pub user_id: String,
    /// Channel name.
    pub channel: DeliveryChannel,
    /// Channel address.
    pub to: &'a str,
    /// Notification kind.
    pub notification_type: &'static str,
    /// Notification category.
    pub category: &'static str,
    /// Message template key.
    pub code_message: &'a str,
    /// Action label template key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_label_code: Option<&'a str>,
    /// Template data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl<'a> DeliveryRequest<'a> {
    /// Build the common request body for `notification` sent to `to`.
    pub fn new(channel: DeliveryChannel, notification: &'a Notification, to: &'a str) -> Self {
        Self {
            notification_id: notification.id.to_string(),
            user_id: notification.user_id.to_string(),
            channel,
            to,
            notification_type: notification.notification_type.as_str(),
            category: notification.category.as_str(),
            code_message: &notification.code_message,
            action_label_code: notification.action_label_code.as_deref(),
            metadata: notification.metadata.as_deref().map(metadata_value),
        }
    }
}

/// Metadata is forwarded as JSON when it parses, as a string otherwise.
fn metadata_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
