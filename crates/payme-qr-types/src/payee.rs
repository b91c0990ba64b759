//! Payee identifier and currency types.
//!
//! A UPI payee identifier (a "VPA") has the shape `local-part@handle`:
//!
//! - **Local part**: 2 to 256 characters out of letters, digits, `.`, `-` and `_`
//! - **Handle**: 1 to 64 ASCII letters naming the provider (e.g. `upi`, `okaxis`)
//!
//! Only the syntactic shape is checked; nothing here asks a bank whether the
//! identifier exists.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::ValidationError;

static PAYEE_ID_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.\-_]{2,256}@[a-zA-Z]{1,64}$").expect("valid payee id regex")
});

/// A syntactically valid, trimmed payee identifier.
///
/// # Example
///
/// ```
/// use payme_qr_types::payee::PayeeId;
///
/// let payee = PayeeId::parse(" shop.owner@okaxis ").unwrap();
/// assert_eq!(payee.as_str(), "shop.owner@okaxis");
/// assert_eq!(payee.handle(), "okaxis");
///
/// assert!(PayeeId::parse("shop.owner").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayeeId(String);

impl PayeeId {
    /// Trims the input and checks it against the `local-part@handle` shape.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !PAYEE_ID_SHAPE.is_match(trimmed) {
            return Err(ValidationError::InvalidPayeeId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `@`.
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map(|(local, _)| local).unwrap_or(&self.0)
    }

    /// The provider handle after `@`.
    pub fn handle(&self) -> &str {
        self.0.split_once('@').map(|(_, handle)| handle).unwrap_or("")
    }
}

impl fmt::Display for PayeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PayeeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PayeeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PayeeId::parse(s)
    }
}

impl Serialize for PayeeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PayeeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PayeeId::parse(&s).map_err(de::Error::custom)
    }
}

/// Currency of a UPI payment. The scheme only settles in Indian rupees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,
}

impl Currency {
    /// ISO 4217 code as it appears in the `cu` field.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INR" => Ok(Currency::Inr),
            other => Err(ValidationError::UnsupportedCurrency(other.to_string())),
        }
    }
}
