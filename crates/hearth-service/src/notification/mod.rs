//! Notification service: creation, read state and email delivery claims.

pub mod delivery;
pub mod service;

pub use service::NotificationService;
