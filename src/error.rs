//! Error taxonomy for QR generation.
//!
//! | error | raised when | retry |
//! |---|---|---|
//! | [`ValidationError`] | a payment field is rejected | after fixing the input |
//! | [`EnvironmentError`] | the operation does not fit the detected environment | no |
//! | [`DependencyLoadError`] | the browser encoder script could not be loaded | yes, failures are not cached |
//! | [`EncodingError`] | the encoder rejected the link or blew up | if the cause is transient |

pub use payme_qr_types::error::ValidationError;

use crate::environment::Environment;

/// Top-level error returned by [`ImageProducer`](crate::producer::ImageProducer) operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QrError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error(transparent)]
    DependencyLoad(#[from] DependencyLoadError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// The requested operation cannot run in the detected environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Unsupported environment for QR generation")]
    Unsupported,
    #[error("{operation} is only available in the {required} environment (detected: {detected})")]
    WrongEnvironment {
        operation: &'static str,
        required: Environment,
        detected: Environment,
    },
    #[error("Browser environment detected but no page is attached to the encoder locator")]
    NoBrowserPage,
}

/// The browser encoder script failed to load.
///
/// Cloneable so every caller waiting on the same load attempt receives it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyLoadError {
    /// A script injected by the locator failed (network error, 404, CSP block).
    #[error("Failed to load QRCode library from {src}: {reason}. Please check your connection.")]
    Injected { src: String, reason: String },
    /// A script that was already on the page failed.
    #[error("QRCode library failed to load from {src}: {reason}")]
    Existing { src: String, reason: String },
    /// The script finished loading but never defined the global encoder.
    #[error("QRCode library loaded from {src} but did not define the global encoder")]
    MissingGlobal { src: String },
}

/// The encoder failed while turning a link into an image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: {message}")]
pub struct EncodingError {
    context: &'static str,
    message: String,
}

impl EncodingError {
    pub(crate) const IMAGE: &'static str = "Failed to generate QR code";
    pub(crate) const BUFFER: &'static str = "Failed to generate QR code buffer";

    pub(crate) fn new(context: &'static str, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    /// The message reported by the underlying encoder.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error reported by an encoder implementation.
///
/// Encoders are external collaborators, so their failures are carried as text and
/// re-raised by the producer as [`EncodingError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EncoderError(String);

impl EncoderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<qrcode::types::QrError> for EncoderError {
    fn from(error: qrcode::types::QrError) -> Self {
        Self(error.to_string())
    }
}

impl From<image::ImageError> for EncoderError {
    fn from(error: image::ImageError) -> Self {
        Self(error.to_string())
    }
}
