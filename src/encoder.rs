//! Encoder contracts.
//!
//! The pixel-level QR algorithm is an external collaborator. It is consumed
//! through two traits:
//!
//! - [`DataUrlEncoder`]: text in, inline `data:` URL out. This is all a browser page
//!   exposes once its encoder script has loaded.
//! - [`BufferEncoder`]: additionally produces raw image bytes. Server hosts provide
//!   this; [`PngQrEncoder`](crate::render::PngQrEncoder) is the bundled implementation.

use async_trait::async_trait;

use crate::error::EncoderError;

/// Produces an inline encoded image from text.
#[async_trait]
pub trait DataUrlEncoder: Send + Sync {
    async fn to_data_url(&self, text: &str) -> Result<String, EncoderError>;
}

/// Produces either an inline encoded image or the raw image bytes from text.
#[async_trait]
pub trait BufferEncoder: DataUrlEncoder {
    async fn to_buffer(&self, text: &str) -> Result<Vec<u8>, EncoderError>;
}
