//! Background email delivery for Hearth.
//!
//! This crate provides:
//! - A worker runner that wakes on new notifications or a poll timer
//! - The per-notification delivery step driving the claim protocol
//! - An in-process retry ledger that spaces out transient failures

pub mod delivery;
pub mod ledger;
pub mod runner;

pub use delivery::DeliveryOutcome;
pub use ledger::RetryLedger;
pub use runner::EmailDeliveryWorker;
