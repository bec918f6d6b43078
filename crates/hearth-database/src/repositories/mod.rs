//! PostgreSQL implementations of the store contracts.

pub mod notification;
pub mod recipient;

pub use notification::NotificationRepository;
pub use recipient::RecipientRepository;
