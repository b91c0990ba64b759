//! QR image production.
//!
//! [`ImageProducer`] turns [`PaymentParams`] into an image: it encodes the deep
//! link, asks the [`EncoderLocator`] for the encoder of the detected environment
//! and runs it. Encoder failures, including panics inside the encoder, surface as
//! [`EncodingError`].

use futures_util::FutureExt;
use payme_qr_types::params::PaymentParams;
use payme_qr_types::uri::DeepLink;
use payme_qr_types::util::{DataUrl, DataUrlError};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::{ImageConfig, LoadingHint, QrConfig};
use crate::environment::Environment;
use crate::error::{EncoderError, EncodingError, EnvironmentError, QrError};
use crate::locator::EncoderLocator;

/// Displayable result of [`ImageProducer::create_display_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrImage {
    /// Inline PNG, produced on the server.
    DataUrl(String),
    /// Image object, produced in the browser.
    Element(ImageElement),
}

impl QrImage {
    /// The inline image, whichever variant holds it.
    pub fn data_url(&self) -> &str {
        match self {
            QrImage::DataUrl(url) => url,
            QrImage::Element(element) => &element.src,
        }
    }

    /// Decodes the inline image into raw PNG bytes.
    pub fn decode_png(&self) -> Result<Vec<u8>, DataUrlError> {
        self.data_url().parse::<DataUrl>()?.decode()
    }
}

/// An `<img>` ready to be attached to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    pub src: String,
    pub alt: String,
    pub loading: LoadingHint,
}

impl ImageElement {
    /// Renders the element as HTML markup.
    pub fn to_html(&self) -> String {
        format!(
            r#"<img src="{}" alt="{}" loading="{}">"#,
            escape_attribute(&self.src),
            escape_attribute(&self.alt),
            self.loading.as_str()
        )
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Produces QR images for payment parameters.
#[derive(Debug, Clone)]
pub struct ImageProducer {
    locator: Arc<EncoderLocator>,
    image: ImageConfig,
}

impl ImageProducer {
    /// Creates a producer backed by a shared locator.
    pub fn new(locator: Arc<EncoderLocator>, config: &QrConfig) -> Self {
        Self {
            locator,
            image: config.image.clone(),
        }
    }

    pub fn locator(&self) -> &Arc<EncoderLocator> {
        &self.locator
    }

    /// Produces an image suited to the environment.
    ///
    /// On the server this is a `data:image/png;base64,…` URL; in the browser it is an
    /// [`ImageElement`] whose `src` is that URL. The browser encoder script is loaded
    /// first when the page does not define it yet.
    ///
    /// # Errors
    ///
    /// - [`EnvironmentError::Unsupported`] outside a server or browser.
    /// - [`DependencyLoadError`](crate::error::DependencyLoadError) if the browser
    ///   encoder script cannot be loaded.
    /// - [`EncodingError`] if the encoder fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "payme_qr.producer.create_display_result", skip_all, err)
    )]
    pub async fn create_display_result(&self, params: &PaymentParams) -> Result<QrImage, QrError> {
        let link = DeepLink::encode(params);
        match self.locator.environment() {
            Environment::Server => {
                let encoder = self.locator.server_encoder()?;
                let url = run_encoder(EncodingError::IMAGE, encoder.to_data_url(link.as_str())).await?;
                Ok(QrImage::DataUrl(url))
            }
            Environment::Browser => {
                let encoder = self.locator.browser_encoder().await?;
                let src = run_encoder(EncodingError::IMAGE, encoder.to_data_url(link.as_str())).await?;
                Ok(QrImage::Element(ImageElement {
                    src,
                    alt: self.image.alt.clone(),
                    loading: self.image.loading,
                }))
            }
            Environment::Unsupported => Err(EnvironmentError::Unsupported.into()),
        }
    }

    /// Produces raw PNG bytes. Server only.
    ///
    /// The environment is checked before any encoder is requested, so calling this
    /// in a browser never triggers a script load.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "payme_qr.producer.create_buffer_result", skip_all, err)
    )]
    pub async fn create_buffer_result(&self, params: &PaymentParams) -> Result<Vec<u8>, QrError> {
        let environment = self.locator.environment();
        if environment != Environment::Server {
            return Err(EnvironmentError::WrongEnvironment {
                operation: "create_buffer_result",
                required: Environment::Server,
                detected: environment,
            }
            .into());
        }
        let link = DeepLink::encode(params);
        let encoder = self.locator.server_encoder()?;
        let png = run_encoder(EncodingError::BUFFER, encoder.to_buffer(link.as_str())).await?;
        Ok(png)
    }
}

async fn run_encoder<T, F>(context: &'static str, encode: F) -> Result<T, EncodingError>
where
    F: Future<Output = Result<T, EncoderError>>,
{
    let message = match AssertUnwindSafe(encode).catch_unwind().await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error.message().to_string(),
        Err(panic) => panic_message(panic.as_ref()),
    };
    tracing::warn!(%message, "{context}");
    Err(EncodingError::new(context, message))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "encoder panicked".to_string()
    }
}
