//! Notification domain entities.

pub mod category;
pub mod channel;
pub mod delivery;
pub mod kind;
pub mod model;

pub use category::NotificationCategory;
pub use channel::{DeliveryChannel, NotificationChannels};
pub use delivery::EmailDeliveryStatus;
pub use kind::NotificationType;
pub use model::{NewNotification, Notification};
