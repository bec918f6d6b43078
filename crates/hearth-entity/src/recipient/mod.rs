//! Notification recipients.

pub mod model;

pub use model::Recipient;
