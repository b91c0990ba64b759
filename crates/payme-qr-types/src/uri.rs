//! Canonical `upi://pay` deep links.
//!
//! The query string is serialized as `application/x-www-form-urlencoded`, the same
//! algorithm browsers use for `URLSearchParams`: `@` becomes `%40`, spaces become `+`.
//! Fields always appear in the order `pa`, `cu`, `pn`, `am`, `tn`, and fields that are
//! unset or empty are left out, so equal parameters always produce byte-identical links.

use std::fmt;
use url::form_urlencoded;

use crate::params::PaymentParams;

/// Scheme intercepted by UPI payment apps.
pub const UPI_SCHEME: &str = "upi";
/// Authority of the payment intent.
pub const PAY_AUTHORITY: &str = "pay";

/// A serialized UPI payment link.
///
/// # Example
///
/// ```
/// use payme_qr_types::params::PaymentParams;
/// use payme_qr_types::uri::DeepLink;
///
/// let params = PaymentParams::new("xy@upi").unwrap();
/// assert_eq!(DeepLink::encode(&params).as_str(), "upi://pay?pa=xy%40upi&cu=INR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeepLink(String);

impl DeepLink {
    pub fn encode(params: &PaymentParams) -> Self {
        let amount = params.amount().map(|amount| amount.to_string());
        let fields = [
            ("pa", Some(params.payee_id().as_str())),
            ("cu", Some(params.currency().code())),
            ("pn", params.payee_name()),
            ("am", amount.as_deref()),
            ("tn", params.note()),
        ];

        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                query.append_pair(key, value);
            }
        }
        DeepLink(format!("{UPI_SCHEME}://{PAY_AUTHORITY}?{}", query.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DeepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeepLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<DeepLink> for String {
    fn from(value: DeepLink) -> Self {
        value.0
    }
}
