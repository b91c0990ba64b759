#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for UPI payment links.
//!
//! This crate provides the data side of `payme-qr`: everything needed to turn a
//! handful of payment fields into the canonical `upi://pay` deep link, with no I/O
//! and no knowledge of how the link is later rendered into a QR image.
//!
//! # Overview
//!
//! A UPI deep link is a URI that payment apps intercept to start a transfer. It
//! carries the payee identifier (`pa`), the currency (`cu`), and optionally the
//! payee name (`pn`), a fixed amount (`am`) and a transaction note (`tn`).
//!
//! ```
//! use payme_qr_types::params::PaymentParams;
//!
//! let mut params = PaymentParams::new("  creator@upi ").unwrap();
//! params.set_payee_name("Jane Doe").unwrap().set_amount(250).unwrap();
//!
//! assert_eq!(
//!     params.to_deep_link().as_str(),
//!     "upi://pay?pa=creator%40upi&cu=INR&pn=Jane+Doe&am=250.00"
//! );
//! ```
//!
//! # Modules
//!
//! - [`amount`] - Positive amounts with fixed two-decimal formatting
//! - [`config`] - Environment variable resolution for configuration values
//! - [`error`] - Validation errors raised by the setters
//! - [`params`] - The accumulating, validated payment parameters
//! - [`payee`] - Payee identifier (`local-part@handle`) and currency
//! - [`uri`] - Canonical deep link serialization
//! - [`util`] - Data URL helpers

pub mod amount;
pub mod config;
pub mod error;
pub mod params;
pub mod payee;
pub mod uri;
pub mod util;
