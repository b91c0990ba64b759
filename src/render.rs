//! Bundled server-side encoder.
//!
//! [`PngQrEncoder`] builds the module matrix with `qrcode` and writes it as an
//! 8-bit grayscale PNG with `image`. Defaults match what payment apps scan
//! comfortably: error correction level M, 4 pixels per module, a 4-module quiet zone.

use async_trait::async_trait;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};
use payme_qr_types::util::DataUrl;
use qrcode::{Color, QrCode};

use crate::config::RenderConfig;
use crate::encoder::{BufferEncoder, DataUrlEncoder};
use crate::error::EncoderError;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// PNG QR encoder available in the server environment.
#[derive(Debug, Clone, Default)]
pub struct PngQrEncoder {
    settings: RenderConfig,
}

impl PngQrEncoder {
    pub fn new(settings: RenderConfig) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderConfig {
        &self.settings
    }

    /// Renders `text` into PNG bytes.
    pub fn render_png(&self, text: &str) -> Result<Vec<u8>, EncoderError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), self.settings.error_correction.into())?;
        let image = self.rasterize(&code)?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        )?;
        Ok(png)
    }

    fn rasterize(&self, code: &QrCode) -> Result<GrayImage, EncoderError> {
        let scale = self.settings.module_size.max(1);
        let border = self.settings.quiet_zone;
        let width = u32::try_from(code.width()).map_err(|_| EncoderError::new("QR symbol too large"))?;
        let side = width
            .checked_add(border.saturating_mul(2))
            .and_then(|modules| modules.checked_mul(scale))
            .ok_or_else(|| EncoderError::new("Rendered image dimensions overflow"))?;

        let colors = code.to_colors();
        let image = GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / scale, y / scale);
            let inside = (border..border + width).contains(&mx) && (border..border + width).contains(&my);
            if !inside {
                return LIGHT;
            }
            let index = ((my - border) * width + (mx - border)) as usize;
            match colors[index] {
                Color::Dark => DARK,
                Color::Light => LIGHT,
            }
        });
        Ok(image)
    }
}

#[async_trait]
impl DataUrlEncoder for PngQrEncoder {
    async fn to_data_url(&self, text: &str) -> Result<String, EncoderError> {
        let png = self.render_png(text)?;
        Ok(DataUrl::png(png).to_string())
    }
}

#[async_trait]
impl BufferEncoder for PngQrEncoder {
    async fn to_buffer(&self, text: &str) -> Result<Vec<u8>, EncoderError> {
        self.render_png(text)
    }
}
