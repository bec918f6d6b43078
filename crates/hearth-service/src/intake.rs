//! In-process queue announcing new notifications to the delivery worker.

use tokio::sync::mpsc;
use tracing::warn;

use hearth_core::types::NotificationId;

/// Create a connected intake handle and receiver.
pub fn delivery_intake() -> (DeliveryIntake, IntakeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliveryIntake { tx }, IntakeReceiver { rx })
}

/// Producer side of the intake queue. Publishing never blocks.
#[derive(Debug, Clone)]
pub struct DeliveryIntake {
    tx: mpsc::UnboundedSender<NotificationId>,
}

impl DeliveryIntake {
    /// Announce a stored notification. If the worker is gone the id is
    /// dropped; the poll loop of the next worker picks the row up.
    pub fn publish(&self, id: NotificationId) {
        if self.tx.send(id).is_err() {
            warn!(notification_id = %id, "Delivery intake closed, notification left for polling");
        }
    }

    /// Whether the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the intake queue, owned by the worker.
#[derive(Debug)]
pub struct IntakeReceiver {
    rx: mpsc::UnboundedReceiver<NotificationId>,
}

impl IntakeReceiver {
    /// Wait for the next id. Returns `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<NotificationId> {
        self.rx.recv().await
    }

    /// Take every id that is already queued.
    pub fn drain(&mut self) -> Vec<NotificationId> {
        let mut ids = Vec::new();
        while let Ok(id) = self.rx.try_recv() {
            ids.push(id);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_then_drain() {
        let (intake, mut receiver) = delivery_intake();
        let first = NotificationId::new();
        let second = NotificationId::new();
        intake.publish(first);
        intake.publish(second);

        assert_eq!(receiver.drain(), vec![first, second]);
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn test_publish_after_close_is_ignored() {
        let (intake, receiver) = delivery_intake();
        drop(receiver);
        assert!(intake.is_closed());
        intake.publish(NotificationId::new());
    }
}
