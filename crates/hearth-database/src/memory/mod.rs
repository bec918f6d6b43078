//! In-memory store implementations backed by `dashmap`.

pub mod notification;
pub mod recipient;

pub use notification::MemoryNotificationStore;
pub use recipient::MemoryRecipientDirectory;
