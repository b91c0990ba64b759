//! Utility types for payme-qr.
//!
//! - [`data_url`] - `data:` URL encoding and decoding of rendered images

pub mod data_url;

pub use data_url::*;
