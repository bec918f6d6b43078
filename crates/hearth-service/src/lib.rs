//! # hearth-service
//!
//! The notification service. It validates and stores new notifications,
//! manages their read state, and exposes the email claim protocol that the
//! delivery worker drives.
//!
//! Dependencies are injected at construction as `Arc` handles.

pub mod intake;
pub mod notification;

pub use intake::{DeliveryIntake, IntakeReceiver, delivery_intake};
pub use notification::NotificationService;
