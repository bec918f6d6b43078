//! Concurrent fan-out over the configured channel senders.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use hearth_core::config::ChannelsConfig;
use hearth_core::error::AppError;
use hearth_core::result::AppResult;
use hearth_entity::{DeliveryChannel, Notification, NotificationChannels, Recipient};

use crate::channels::{EmailSender, PushSender, SmsSender, WebPushSender};
use crate::error::DeliveryError;
use crate::sender::{ChannelReceipt, ChannelSender};

/// Result of one sender within a dispatch.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    /// Channel attempted.
    pub channel: DeliveryChannel,
    /// Sender name.
    pub sender: String,
    /// What happened.
    pub result: Result<ChannelReceipt, DeliveryError>,
}

impl ChannelOutcome {
    fn failure_message(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|e| format!("{}: {e}", self.sender))
    }
}

/// Aggregated outcome of a fan-out.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// One entry per attempted channel.
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    /// Whether at least one channel delivered, or none were eligible.
    pub fn succeeded(&self) -> bool {
        self.outcomes.is_empty() || self.outcomes.iter().any(|o| o.result.is_ok())
    }

    /// Channels that delivered.
    pub fn delivered(&self) -> Vec<DeliveryChannel> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.channel)
            .collect()
    }

    /// One message per failed channel.
    pub fn warnings(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(ChannelOutcome::failure_message)
            .collect()
    }

    /// Keep the report when it succeeded, otherwise turn it into a
    /// `ChannelDelivery` error listing every channel failure.
    pub fn into_result(self) -> AppResult<Self> {
        if self.succeeded() {
            return Ok(self);
        }
        let failures = self.warnings();
        Err(AppError::channel_delivery(format!(
            "All {} channel(s) failed",
            failures.len()
        ))
        .with_details(failures))
    }
}

/// Fans a notification out to every eligible channel.
///
/// The sender list is fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct ChannelDispatcher {
    senders: Vec<Arc<dyn ChannelSender>>,
}

impl ChannelDispatcher {
    /// Create a dispatcher over an explicit sender list.
    pub fn new(senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        Self { senders }
    }

    /// Build one sender per completely configured channel.
    pub fn from_config(config: &ChannelsConfig) -> AppResult<Self> {
        let mut senders: Vec<Arc<dyn ChannelSender>> = Vec::new();

        if config.email.gateway.is_configured() {
            senders.push(Arc::new(EmailSender::from_config(&config.email)?));
        }
        if config.sms.is_configured() {
            senders.push(Arc::new(SmsSender::from_config(&config.sms)?));
        }
        if config.push.is_configured() {
            senders.push(Arc::new(PushSender::from_config(&config.push)?));
        }
        if config.web_push.is_configured() {
            senders.push(Arc::new(WebPushSender::from_config(&config.web_push)?));
        } else if config.web_push.gateway.is_configured() {
            warn!("Web push gateway is enabled without a VAPID key pair, channel disabled");
        }

        let dispatcher = Self::new(senders);
        info!(
            channels = ?dispatcher.configured_channels().channels(),
            "Channel dispatcher ready"
        );
        Ok(dispatcher)
    }

    /// Channels that have a sender.
    pub fn configured_channels(&self) -> NotificationChannels {
        self.senders
            .iter()
            .fold(NotificationChannels::empty(), |acc, s| acc | s.channel().as_flag())
    }

    /// The sender for `channel`, if configured.
    pub fn sender_for(&self, channel: DeliveryChannel) -> Option<Arc<dyn ChannelSender>> {
        self.senders.iter().find(|s| s.channel() == channel).cloned()
    }

    /// Channels a dispatch would use: the recipient's preferences, narrowed
    /// by the notification's limit, restricted to configured senders, minus
    /// `excluded`.
    pub fn eligible_channels(
        &self,
        notification: &Notification,
        recipient: &Recipient,
        excluded: NotificationChannels,
    ) -> NotificationChannels {
        recipient
            .notification_channels
            .restrict(notification.limit_notification_channels)
            & self.configured_channels()
            & !excluded
    }

    /// Send on every eligible channel.
    pub async fn send(&self, notification: &Notification, recipient: &Recipient) -> DispatchReport {
        self.send_excluding(notification, recipient, NotificationChannels::empty())
            .await
    }

    /// Send on every eligible channel except `excluded`.
    ///
    /// All senders run concurrently and are all awaited; one failing
    /// sender never prevents the others from completing.
    pub async fn send_excluding(
        &self,
        notification: &Notification,
        recipient: &Recipient,
        excluded: NotificationChannels,
    ) -> DispatchReport {
        let eligible = self.eligible_channels(notification, recipient, excluded);
        let targets: Vec<&Arc<dyn ChannelSender>> = self
            .senders
            .iter()
            .filter(|s| eligible.allows(s.channel()))
            .collect();

        if targets.is_empty() {
            debug!(notification_id = %notification.id, "No eligible channels");
            return DispatchReport::default();
        }

        let start = Instant::now();
        let sends = targets.into_iter().map(|sender| async move {
            let result = AssertUnwindSafe(sender.send(notification, recipient))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    error!(sender = sender.name(), "Channel sender panicked");
                    Err(DeliveryError::Permanent(format!(
                        "sender panicked: {}",
                        panic_message(panic.as_ref())
                    )))
                });
            ChannelOutcome {
                channel: sender.channel(),
                sender: sender.name().to_string(),
                result,
            }
        });
        let report = DispatchReport {
            outcomes: join_all(sends).await,
        };

        log_report(notification, &report, start.elapsed().as_millis());
        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn log_report(notification: &Notification, report: &DispatchReport, duration_ms: u128) {
    let delivered = report.delivered();
    let warnings = report.warnings();

    if warnings.is_empty() {
        info!(
            notification_id = %notification.id,
            channels = ?delivered,
            duration_ms,
            "Notification dispatched"
        );
    } else if report.succeeded() {
        warn!(
            notification_id = %notification.id,
            delivered = ?delivered,
            warnings = ?warnings,
            duration_ms,
            "Notification partially dispatched"
        );
    } else {
        error!(
            notification_id = %notification.id,
            failures = ?warnings,
            duration_ms,
            "Notification dispatch failed on every channel"
        );
    }
}
