//! # hearth-dispatch
//!
//! Delivery channels for notifications. Each channel is a
//! [`ChannelSender`]; the [`ChannelDispatcher`] fans a notification out to
//! every eligible sender concurrently and aggregates the outcomes into a
//! [`DispatchReport`].

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod sender;

pub use dispatcher::{ChannelDispatcher, ChannelOutcome, DispatchReport};
pub use error::DeliveryError;
pub use sender::{ChannelReceipt, ChannelSender};
