//! Accumulating, validated payment parameters.
//!
//! [`PaymentParams`] is built from a payee identifier and then refined through
//! chained setters. Each setter validates its own input and either updates exactly
//! one field or returns a [`ValidationError`] leaving everything unchanged.
//!
//! ```
//! use payme_qr_types::params::PaymentParams;
//!
//! let mut params = PaymentParams::new("cafe@upi")?;
//! params
//!     .set_payee_name("Corner Cafe")?
//!     .set_amount("120")?
//!     .set_note("Table 4")?;
//!
//! assert_eq!(params.amount().map(|a| a.to_string()).as_deref(), Some("120.00"));
//! # Ok::<(), payme_qr_types::error::ValidationError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::ValidationError;
use crate::payee::{Currency, PayeeId};
use crate::uri::DeepLink;

/// Longest note accepted by [`PaymentParams::set_note`], counted before trimming.
pub const MAX_NOTE_CHARS: usize = 80;

/// Shortest payee name accepted by [`PaymentParams::set_payee_name`], counted after trimming.
pub const MIN_PAYEE_NAME_CHARS: usize = 2;

/// Payment fields carried by a UPI deep link.
///
/// Serializes with the deep-link keys (`pa`, `cu`, `pn`, `am`, `tn`). Deserialization
/// applies the same validation as the setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPaymentParams")]
pub struct PaymentParams {
    #[serde(rename = "pa")]
    payee_id: PayeeId,
    #[serde(rename = "cu")]
    currency: Currency,
    #[serde(rename = "pn", skip_serializing_if = "Option::is_none")]
    payee_name: Option<String>,
    #[serde(rename = "am", skip_serializing_if = "Option::is_none")]
    amount: Option<Amount>,
    #[serde(rename = "tn", skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl PaymentParams {
    /// Starts a payment request for the given payee, in rupees.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPayeeId`] if the trimmed identifier is empty
    /// or is not shaped like `local-part@handle`.
    pub fn new(payee_id: &str) -> Result<Self, ValidationError> {
        let payee_id = PayeeId::parse(payee_id)?;
        Ok(Self::for_payee(payee_id))
    }

    /// Starts a payment request for an already validated payee.
    pub fn for_payee(payee_id: PayeeId) -> Self {
        Self {
            payee_id,
            currency: Currency::Inr,
            payee_name: None,
            amount: None,
            note: None,
        }
    }

    /// Sets the name payment apps display for the payee.
    ///
    /// The name is trimmed and must keep at least two characters.
    pub fn set_payee_name(&mut self, name: &str) -> Result<&mut Self, ValidationError> {
        let trimmed = name.trim();
        if trimmed.chars().count() < MIN_PAYEE_NAME_CHARS {
            return Err(ValidationError::InvalidPayeeName);
        }
        self.payee_name = Some(trimmed.to_string());
        Ok(self)
    }

    /// Sets a fixed amount, replacing any amount set before.
    ///
    /// Accepts integers, floats, [`Decimal`](rust_decimal::Decimal) values and numeric
    /// strings. The value must be strictly positive and is kept with two decimals.
    pub fn set_amount<A>(&mut self, amount: A) -> Result<&mut Self, ValidationError>
    where
        A: TryInto<Amount>,
        A::Error: Into<ValidationError>,
    {
        let amount = amount.try_into().map_err(Into::into)?;
        self.amount = Some(amount);
        Ok(self)
    }

    /// Sets the transaction note, e.g. `"Invoice #123"`.
    ///
    /// The length limit applies to the raw input; the stored note is trimmed.
    pub fn set_note(&mut self, note: &str) -> Result<&mut Self, ValidationError> {
        if note.chars().count() > MAX_NOTE_CHARS {
            return Err(ValidationError::InvalidNote);
        }
        self.note = Some(note.trim().to_string());
        Ok(self)
    }

    pub fn payee_id(&self) -> &PayeeId {
        &self.payee_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn payee_name(&self) -> Option<&str> {
        self.payee_name.as_deref()
    }

    pub fn amount(&self) -> Option<&Amount> {
        self.amount.as_ref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Serializes these parameters into the canonical `upi://pay` link.
    pub fn to_deep_link(&self) -> DeepLink {
        DeepLink::encode(self)
    }
}

/// Unvalidated mirror of [`PaymentParams`] used during deserialization.
#[derive(Deserialize)]
struct RawPaymentParams {
    pa: String,
    #[serde(default)]
    cu: Option<Currency>,
    #[serde(default)]
    pn: Option<String>,
    #[serde(default)]
    am: Option<Amount>,
    #[serde(default)]
    tn: Option<String>,
}

impl TryFrom<RawPaymentParams> for PaymentParams {
    type Error = ValidationError;

    fn try_from(raw: RawPaymentParams) -> Result<Self, Self::Error> {
        let mut params = PaymentParams::new(&raw.pa)?;
        if let Some(currency) = raw.cu {
            params.currency = currency;
        }
        if let Some(name) = raw.pn {
            params.set_payee_name(&name)?;
        }
        if let Some(amount) = raw.am {
            params.set_amount(amount)?;
        }
        if let Some(note) = raw.tn {
            params.set_note(&note)?;
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PaymentParams {
        PaymentParams::new("xy@upi").unwrap()
    }

    #[test]
    fn test_new_stores_trimmed_payee_and_inr() {
        let params = PaymentParams::new("  donate.me@ybl ").unwrap();
        assert_eq!(params.payee_id().as_str(), "donate.me@ybl");
        assert_eq!(params.currency(), Currency::Inr);
        assert!(params.payee_name().is_none());
        assert!(params.amount().is_none());
        assert!(params.note().is_none());
    }

    #[test]
    fn test_new_rejects_bad_payee() {
        assert_eq!(PaymentParams::new("donate.me").unwrap_err(), ValidationError::InvalidPayeeId);
        assert_eq!(PaymentParams::new("").unwrap_err(), ValidationError::InvalidPayeeId);
    }

    #[test]
    fn test_payee_name_trimmed_and_min_length() {
        let mut params = params();
        params.set_payee_name("  Jo ").unwrap();
        assert_eq!(params.payee_name(), Some("Jo"));

        assert_eq!(params.set_payee_name(" J ").unwrap_err(), ValidationError::InvalidPayeeName);
        assert_eq!(params.set_payee_name("   ").unwrap_err(), ValidationError::InvalidPayeeName);
        // rejection keeps the previous value
        assert_eq!(params.payee_name(), Some("Jo"));
    }

    #[test]
    fn test_amount_replaced_not_duplicated() {
        let mut params = params();
        params.set_amount(10).unwrap();
        params.set_amount(10.5).unwrap();
        assert_eq!(params.amount().unwrap().to_string(), "10.50");
        assert_eq!(params.to_deep_link().as_str().matches("am=").count(), 1);
    }

    #[test]
    fn test_amount_rejects_zero_and_negative() {
        let mut params = params();
        assert_eq!(params.set_amount(0).unwrap_err(), ValidationError::InvalidAmount);
        assert_eq!(params.set_amount(-1).unwrap_err(), ValidationError::InvalidAmount);
        assert_eq!(params.set_amount("free").unwrap_err(), ValidationError::InvalidAmount);
        assert!(params.amount().is_none());
    }

    #[test]
    fn test_amount_accepts_prevalidated_amount() {
        let mut params = params();
        let amount = Amount::try_from(3).unwrap();
        params.set_amount(amount).unwrap();
        assert_eq!(params.amount(), Some(&amount));
    }

    #[test]
    fn test_note_length_checked_before_trim() {
        let mut params = params();
        let too_long = "n".repeat(81);
        assert_eq!(params.set_note(&too_long).unwrap_err(), ValidationError::InvalidNote);

        let padded = format!(" {} ", "n".repeat(78));
        assert_eq!(padded.chars().count(), 80);
        params.set_note(&padded).unwrap();
        assert_eq!(params.note(), Some("n".repeat(78).as_str()));

        let padded_too_long = format!(" {} ", "n".repeat(79));
        assert!(params.set_note(&padded_too_long).is_err());
    }

    #[test]
    fn test_note_counts_characters_not_bytes() {
        let mut params = params();
        let note = "₹".repeat(80);
        params.set_note(&note).unwrap();
        assert_eq!(params.note(), Some(note.as_str()));
    }

    #[test]
    fn test_chained_configuration() {
        let mut params = params();
        params
            .set_payee_name("Jane")
            .unwrap()
            .set_amount("99")
            .unwrap()
            .set_note("Thanks")
            .unwrap();
        assert_eq!(params.payee_name(), Some("Jane"));
        assert_eq!(params.amount().unwrap().to_string(), "99.00");
        assert_eq!(params.note(), Some("Thanks"));
    }

    #[test]
    fn test_serde_uses_link_keys() {
        let mut params = params();
        params.set_payee_name("Jane").unwrap().set_amount(5).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"pa":"xy@upi","cu":"INR","pn":"Jane","am":"5.00"}"#);

        let back: PaymentParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_deserialize_validates_fields() {
        let ok: PaymentParams = serde_json::from_str(r#"{"pa":" xy@upi ","am":7}"#).unwrap();
        assert_eq!(ok.payee_id().as_str(), "xy@upi");
        assert_eq!(ok.amount().unwrap().to_string(), "7.00");

        assert!(serde_json::from_str::<PaymentParams>(r#"{"pa":"x"}"#).is_err());
        assert!(serde_json::from_str::<PaymentParams>(r#"{"pa":"xy@upi","pn":"J"}"#).is_err());
        assert!(serde_json::from_str::<PaymentParams>(r#"{"pa":"xy@upi","cu":"USD"}"#).is_err());
        let long_note = format!(r#"{{"pa":"xy@upi","tn":"{}"}}"#, "n".repeat(81));
        assert!(serde_json::from_str::<PaymentParams>(&long_note).is_err());
    }
}
