//! Per-channel delivery errors.

use thiserror::Error;

/// Why a single channel send failed.
///
/// The split mirrors the retry decision: transient failures may succeed
/// later, permanent ones never will.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Gateway unavailable, throttled or timed out.
    #[error("transient delivery failure: {0}")]
    Transient(String),
    /// Rejected request or unusable recipient.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl DeliveryError {
    /// Whether retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Permanent(format!("invalid gateway request: {err}"))
        } else {
            Self::Transient(format!("gateway request failed: {err}"))
        }
    }
}
