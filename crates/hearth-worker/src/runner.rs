//! Worker runner: waits for new notifications or the poll timer and
//! delivers their email.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{self, Instant};

use hearth_core::config::WorkerConfig;
use hearth_core::types::NotificationId;
use hearth_database::RecipientDirectory;
use hearth_dispatch::ChannelSender;
use hearth_service::{IntakeReceiver, NotificationService};

use crate::delivery::DeliveryOutcome;
use crate::ledger::RetryLedger;

/// Drives the email claim protocol in the background
#[derive(Debug)]
pub struct EmailDeliveryWorker {
    /// Claim protocol and status updates
    pub(crate) service: Arc<NotificationService>,
    /// Recipient lookup
    pub(crate) recipients: Arc<dyn RecipientDirectory>,
    /// Email channel sender
    pub(crate) email: Arc<dyn ChannelSender>,
    /// New-notification signals
    intake: IntakeReceiver,
    /// Set once every intake producer is gone
    intake_closed: bool,
    /// Worker configuration
    pub(crate) config: WorkerConfig,
    /// Transient failure bookkeeping
    pub(crate) ledger: RetryLedger,
}

impl EmailDeliveryWorker {
    /// Create a new worker
    pub fn new(
        service: Arc<NotificationService>,
        recipients: Arc<dyn RecipientDirectory>,
        email: Arc<dyn ChannelSender>,
        intake: IntakeReceiver,
        config: WorkerConfig,
    ) -> Self {
        Self {
            service,
            recipients,
            email,
            intake,
            intake_closed: false,
            config,
            ledger: RetryLedger::new(),
        }
    }

    /// Retry bookkeeping, exposed for inspection
    pub fn ledger(&self) -> &RetryLedger {
        &self.ledger
    }

    /// Run until the cancel signal is received
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Email delivery worker started with poll_interval={}s, batch_size={}, lease={}s, max_attempts={}",
            self.config.poll_interval_seconds,
            self.config.batch_size,
            self.config.lease_seconds,
            self.config.max_attempts
        );

        let poll_interval = self.config.poll_interval();
        let mut signalled = Vec::new();

        loop {
            if *cancel.borrow() {
                break;
            }

            self.run_cycle(std::mem::take(&mut signalled), &cancel).await;

            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Email delivery worker received shutdown signal");
                        break;
                    }
                }
                id = self.intake.recv(), if !self.intake_closed => match id {
                    Some(id) => signalled.push(id),
                    None => {
                        tracing::warn!("Delivery intake closed, falling back to polling only");
                        self.intake_closed = true;
                    }
                },
                _ = time::sleep(poll_interval) => {}
            }
        }

        tracing::info!("Email delivery worker shut down complete");
    }

    /// One pass: queued signals first, then polled candidates
    ///
    /// Stops between notifications once `cancel` is set. Returns the
    /// outcome for every notification looked at.
    pub async fn run_cycle(
        &mut self,
        mut signalled: Vec<NotificationId>,
        cancel: &watch::Receiver<bool>,
    ) -> Vec<(NotificationId, DeliveryOutcome)> {
        signalled.extend(self.intake.drain());
        let candidates = match self
            .service
            .get_email_delivery_candidates(self.config.batch_size)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!("Failed to load email delivery candidates: {}", e);
                Vec::new()
            }
        };

        let waiting: HashSet<NotificationId> = candidates.iter().copied().collect();
        self.ledger.prune(Instant::now(), self.config.retry_horizon(), |id| {
            waiting.contains(&id)
        });
        signalled.extend(candidates);

        let mut seen = HashSet::new();
        let mut outcomes = Vec::new();
        for id in signalled {
            if *cancel.borrow() {
                tracing::info!("Email delivery cycle interrupted by shutdown");
                break;
            }
            if !seen.insert(id) {
                continue;
            }
            let outcome = self.deliver(id).await;
            outcomes.push((id, outcome));
        }

        let handled = outcomes
            .iter()
            .filter(|(_, o)| *o != DeliveryOutcome::Skipped)
            .count();
        if handled > 0 {
            tracing::info!("Email delivery cycle handled {} notification(s)", handled);
        }
        outcomes
    }
}
