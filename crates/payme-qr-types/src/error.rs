//! Validation errors for payment parameters.

use std::convert::Infallible;

/// Rejection raised synchronously by a setter or by [`PaymentParams::new`](crate::params::PaymentParams::new).
///
/// The rejected call leaves the parameters untouched, so the caller can fix the
/// input and try again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The payee identifier is empty or does not look like `local-part@handle`.
    #[error("Invalid or missing UPI ID")]
    InvalidPayeeId,
    /// The payee name is shorter than two characters once trimmed.
    #[error("Invalid payee name")]
    InvalidPayeeName,
    /// The amount is not a number, not finite, or not strictly positive.
    #[error("Invalid amount")]
    InvalidAmount,
    /// The note is longer than [`MAX_NOTE_CHARS`](crate::params::MAX_NOTE_CHARS) characters.
    #[error("Note must be a string up to 80 characters")]
    InvalidNote,
    /// The currency is not the one supported by the `upi://pay` scheme.
    #[error("Unsupported currency {0}")]
    UnsupportedCurrency(String),
}

impl From<Infallible> for ValidationError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}
