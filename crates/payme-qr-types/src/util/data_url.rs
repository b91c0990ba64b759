//! Base64 `data:` URLs.
//!
//! Encoders hand rendered images around as inline `data:image/png;base64,...`
//! strings. [`DataUrl`] builds those strings from raw bytes and decodes them back
//! when a caller needs the binary payload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use std::fmt::Display;
use std::str::FromStr;

/// MIME type of the images produced by the QR encoders.
pub const PNG_MIME: &str = "image/png";

/// A base64 `data:` URL.
///
/// # Example
///
/// ```rust
/// use payme_qr_types::util::DataUrl;
///
/// let url = DataUrl::png(b"hello world");
/// assert_eq!(url.to_string(), "data:image/png;base64,aGVsbG8gd29ybGQ=");
///
/// let decoded = url.decode().unwrap();
/// assert_eq!(decoded, b"hello world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime: String,
    payload: String,
}

/// Errors raised when reading a `data:` URL.
#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    #[error("Not a base64 data URL")]
    Malformed,
    #[error("Invalid base64 payload: {0}")]
    Payload(#[from] base64::DecodeError),
}

impl DataUrl {
    /// Encodes raw bytes under the given MIME type.
    pub fn encode<T: AsRef<[u8]>>(mime: &str, bytes: T) -> Self {
        Self {
            mime: mime.to_string(),
            payload: b64.encode(bytes.as_ref()),
        }
    }

    /// Encodes PNG bytes.
    pub fn png<T: AsRef<[u8]>>(bytes: T) -> Self {
        Self::encode(PNG_MIME, bytes)
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The base64 text after the comma.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Decodes the payload to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        Ok(b64.decode(&self.payload)?)
    }
}

impl FromStr for DataUrl {
    type Err = DataUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("data:").ok_or(DataUrlError::Malformed)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::Malformed)?;
        let mime = header.strip_suffix(";base64").ok_or(DataUrlError::Malformed)?;
        Ok(Self {
            mime: mime.to_string(),
            payload: payload.to_string(),
        })
    }
}

impl Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.payload)
    }
}
