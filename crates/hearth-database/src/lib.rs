//! # hearth-database
//!
//! Persistence for the notification pipeline: the [`NotificationStore`]
//! and [`RecipientDirectory`] contracts, their PostgreSQL repositories and
//! an in-memory implementation used by tests and the `memory` provider.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryNotificationStore, MemoryRecipientDirectory};
pub use repositories::{NotificationRepository, RecipientRepository};
pub use store::{NotificationStore, RecipientDirectory};
