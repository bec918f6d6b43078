//! # hearth-entity
//!
//! Domain entity models for the Hearth notification pipeline. Every struct
//! in this crate represents a database table row or a domain value object.
//! Row entities additionally derive `sqlx::FromRow`.

pub mod notification;
pub mod recipient;

pub use notification::{
    DeliveryChannel, EmailDeliveryStatus, NewNotification, Notification, NotificationCategory,
    NotificationChannels, NotificationType,
};
pub use recipient::Recipient;
