//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use hearth_core::config::WorkerConfig;
use hearth_core::types::UserId;
use hearth_database::{MemoryNotificationStore, MemoryRecipientDirectory};
use hearth_dispatch::{ChannelDispatcher, ChannelReceipt, ChannelSender, DeliveryError};
use hearth_entity::{
    DeliveryChannel, NewNotification, Notification, NotificationCategory, NotificationChannels,
    NotificationType, Recipient,
};
use hearth_service::{IntakeReceiver, NotificationService, delivery_intake};
use hearth_worker::EmailDeliveryWorker;

/// Sender that always answers the same way and counts its calls
#[derive(Debug)]
pub struct ScriptedSender {
    channel: DeliveryChannel,
    failure: Option<DeliveryError>,
    calls: AtomicUsize,
}

impl ScriptedSender {
    pub fn succeeding(channel: DeliveryChannel) -> Arc<Self> {
        Arc::new(Self {
            channel,
            failure: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(channel: DeliveryChannel, failure: DeliveryError) -> Arc<Self> {
        Arc::new(Self {
            channel,
            failure: Some(failure),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelSender for ScriptedSender {
    fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    fn name(&self) -> &str {
        self.channel.as_str()
    }

    async fn send(
        &self,
        _notification: &Notification,
        _recipient: &Recipient,
    ) -> Result<ChannelReceipt, DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(ChannelReceipt {
                channel: self.channel,
                provider_message_id: Some(format!("{}-1", self.channel)),
            }),
        }
    }
}

/// Test application context backed by the in-memory store
pub struct TestApp {
    pub store: Arc<MemoryNotificationStore>,
    pub recipients: Arc<MemoryRecipientDirectory>,
    pub service: Arc<NotificationService>,
    pub intake: Option<IntakeReceiver>,
}

impl TestApp {
    /// App without any channel senders
    pub fn new() -> Self {
        Self::with_senders(Vec::new())
    }

    /// App whose dispatcher uses `senders`
    pub fn with_senders(senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        let store = Arc::new(MemoryNotificationStore::new());
        let recipients = Arc::new(MemoryRecipientDirectory::new());
        let (intake, receiver) = delivery_intake();
        let service = Arc::new(NotificationService::new(
            store.clone(),
            recipients.clone(),
            Arc::new(ChannelDispatcher::new(senders)),
            intake,
        ));

        Self {
            store,
            recipients,
            service,
            intake: Some(receiver),
        }
    }

    /// Register a user with an email address and the given preferences
    pub fn add_user(&self, channels: NotificationChannels) -> UserId {
        let user_id = UserId::new();
        self.recipients.upsert(Recipient {
            user_id,
            email: Some(format!("{user_id}@example.com")),
            phone_number: Some("+15550100".to_string()),
            push_token: Some("device-token".to_string()),
            web_push_endpoint: None,
            notification_channels: channels,
        });
        user_id
    }

    /// Create a plain informational notification
    pub async fn notify(&self, user_id: UserId) -> Notification {
        self.service
            .create_notification(information(user_id))
            .await
            .expect("notification should be created")
    }

    /// Build an email worker over this app
    pub fn worker(&mut self, email: Arc<dyn ChannelSender>, config: WorkerConfig) -> EmailDeliveryWorker {
        let intake = self.intake.take().expect("intake already taken");
        EmailDeliveryWorker::new(
            self.service.clone(),
            self.recipients.clone(),
            email,
            intake,
            config,
        )
    }
}

/// Erase scripted senders into dispatcher senders
pub fn senders(list: &[&Arc<ScriptedSender>]) -> Vec<Arc<dyn ChannelSender>> {
    list.iter()
        .map(|sender| Arc::clone(sender) as Arc<dyn ChannelSender>)
        .collect()
}

/// A valid informational notification for `user_id`
pub fn information(user_id: UserId) -> NewNotification {
    NewNotification {
        user_id,
        notification_type: NotificationType::Information,
        category: NotificationCategory::System,
        code_message: "notifications.budget_summary".to_string(),
        ..NewNotification::default()
    }
}

/// Worker configuration with short timings
pub fn worker_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval_seconds: 60,
        batch_size: 10,
        lease_seconds: 5,
        max_attempts: 3,
        ..WorkerConfig::default()
    }
}
