//! UPI payment QR codes.
//!
//! This crate turns validated payment parameters into a scannable QR image of the
//! `upi://pay` deep link, adapting to the environment it runs in.
//!
//! # Overview
//!
//! Payment data lives in the [`payme_qr_types`] crate: [`PaymentParams`] validates
//! and accumulates the fields, [`DeepLink`] serializes them into the canonical link.
//! This crate decides how the link becomes an image:
//!
//! - **Server**: a host-provided encoder renders the link, by default the bundled
//!   [`PngQrEncoder`](render::PngQrEncoder). Both inline data URLs and raw PNG bytes
//!   are available.
//! - **Browser**: the encoder is a page global defined by a CDN script. The
//!   [`EncoderLocator`] loads that script on first use, sharing one load between
//!   concurrent callers, and the result is an [`ImageElement`](producer::ImageElement).
//!
//! # Modules
//!
//! - [`config`] - Encoder script location, image attributes and render settings.
//! - [`encoder`] - The [`DataUrlEncoder`](encoder::DataUrlEncoder) and
//!   [`BufferEncoder`](encoder::BufferEncoder) contracts.
//! - [`environment`] - Runtime environment detection.
//! - [`error`] - Error types returned by producer and locator operations.
//! - [`locator`] - Encoder acquisition, including the browser script loader.
//! - [`producer`] - [`ImageProducer`], the entry point for QR images.
//! - [`render`] - The bundled PNG encoder.
//!
//! # Example
//!
//! ```
//! use payme_qr::{EncoderLocator, ImageProducer, PaymentParams, QrConfig};
//! use payme_qr::environment::HostCapabilities;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), payme_qr::QrError> {
//! let config = QrConfig::default();
//! let locator = EncoderLocator::detect(&HostCapabilities::native(), &config);
//! let producer = ImageProducer::new(Arc::new(locator), &config);
//!
//! let mut params = PaymentParams::new("creator@upi")?;
//! params.set_payee_name("Jane Doe")?.set_amount(250)?;
//!
//! let png = producer.create_buffer_result(&params).await?;
//! assert_eq!(&png[1..4], b"PNG");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod environment;
pub mod error;
pub mod locator;
pub mod producer;
pub mod render;

pub use config::QrConfig;
pub use environment::Environment;
pub use error::QrError;
pub use locator::EncoderLocator;
pub use payme_qr_types::params::PaymentParams;
pub use payme_qr_types::uri::DeepLink;
pub use producer::{ImageProducer, QrImage};
