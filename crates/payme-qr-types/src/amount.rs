//! Fixed payment amounts.
//!
//! This module provides [`Amount`], a strictly positive rupee amount that always
//! renders with exactly two decimal places, the form payment apps expect in the
//! `am` field of a deep link.
//!
//! # Supported Inputs
//!
//! - Integers and floats: `10`, `10.5`
//! - Numeric strings: `"10"`, `" 0.75 "`, `"1e3"`
//! - [`Decimal`] values
//!
//! Strings and floats follow the same rule: the value is read as an `f64` and
//! rounded from its exact binary value, so `"1.005"` and `1.005` both give `1.00`.
//! [`Decimal`] and integer inputs are exact.
//!
//! # Example
//!
//! ```rust
//! use payme_qr_types::amount::Amount;
//!
//! let amount = Amount::try_from(10.5).unwrap();
//! assert_eq!(amount.to_string(), "10.50");
//!
//! let amount: Amount = " 1250 ".parse().unwrap();
//! assert_eq!(amount.to_string(), "1250.00");
//!
//! assert!("1,250".parse::<Amount>().is_err());
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ValidationError;

/// Number of decimals kept in the `am` field.
pub const AMOUNT_SCALE: u32 = 2;

/// A positive amount rounded to two decimals.
///
/// Rounding is half away from zero on the exact input value. Floats are taken at
/// their exact binary value, so `1.005` (stored as `1.00499…`) becomes `1.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    /// Builds an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAmount`] if the value is zero or negative.
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount);
        }
        let mut rounded = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(AMOUNT_SCALE);
        Ok(Amount(rounded))
    }

    /// Parses a textual amount.
    ///
    /// Surrounding whitespace is ignored; the rest must be a complete number in
    /// plain or scientific notation. Separators, currency signs and trailing text
    /// are rejected rather than guessed at.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let value: f64 = input.trim().parse().map_err(|_| ValidationError::InvalidAmount)?;
        Amount::try_from(value)
    }

    /// The rounded value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl TryFrom<&str> for Amount {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Amount::parse(value)
    }
}

impl TryFrom<String> for Amount {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::parse(&value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl TryFrom<f64> for Amount {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let decimal = Decimal::from_f64_retain(value).ok_or(ValidationError::InvalidAmount)?;
        Amount::new(decimal)
    }
}

impl TryFrom<f32> for Amount {
    type Error = ValidationError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        let decimal = Decimal::from_f32_retain(value).ok_or(ValidationError::InvalidAmount)?;
        Amount::new(decimal)
    }
}

macro_rules! amount_from_integer {
    ($($int:ty),*) => {
        $(
            impl TryFrom<$int> for Amount {
                type Error = ValidationError;

                fn try_from(value: $int) -> Result<Self, Self::Error> {
                    Amount::new(Decimal::from(value))
                }
            }
        )*
    };
}

amount_from_integer!(i32, i64, u32, u64);

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Amount::parse(&text),
            Raw::Number(number) => Amount::try_from(number),
        }
        .map_err(serde::de::Error::custom)
    }
}
