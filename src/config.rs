//! Configuration for QR generation.
//!
//! Every field has a default, so a configuration file is optional. When present it
//! is a JSON document such as:
//!
//! ```json
//! {
//!   "loader": { "url": "$QR_LOADER_URL", "script_marker": "qrcode.min.js" },
//!   "image": { "alt": "Pay with UPI", "loading": "eager" },
//!   "render": { "module_size": 8, "quiet_zone": 2, "error_correction": "quartile" }
//! }
//! ```
//!
//! [`QrConfig::from_env`] loads `.env`, then reads the file named by
//! `PAYME_QR_CONFIG`, or falls back to the defaults.

use payme_qr_types::config::LiteralOrEnv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable naming the JSON configuration file.
pub const ENV_CONFIG_PATH: &str = "PAYME_QR_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QrConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Where the browser encoder script comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Version-pinned location of the encoder script.
    #[serde(default = "config_defaults::loader_url")]
    pub url: LiteralOrEnv<Url>,
    /// Substring identifying an already present encoder `<script>` by its `src`.
    #[serde(default = "config_defaults::script_marker")]
    pub script_marker: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            url: config_defaults::loader_url(),
            script_marker: config_defaults::script_marker(),
        }
    }
}

/// Attributes of the image object returned in the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "config_defaults::alt")]
    pub alt: String,
    #[serde(default)]
    pub loading: LoadingHint,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            alt: config_defaults::alt(),
            loading: LoadingHint::default(),
        }
    }
}

/// The image `loading` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingHint {
    #[default]
    Lazy,
    Eager,
}

impl LoadingHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadingHint::Lazy => "lazy",
            LoadingHint::Eager => "eager",
        }
    }
}

/// Rendering settings of the bundled PNG encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Pixels per QR module.
    #[serde(default = "config_defaults::module_size")]
    pub module_size: u32,
    /// Light border around the symbol, in modules.
    #[serde(default = "config_defaults::quiet_zone")]
    pub quiet_zone: u32,
    #[serde(default)]
    pub error_correction: ErrorCorrection,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            module_size: config_defaults::module_size(),
            quiet_zone: config_defaults::quiet_zone(),
            error_correction: ErrorCorrection::default(),
        }
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCorrection {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(value: ErrorCorrection) -> Self {
        match value {
            ErrorCorrection::Low => qrcode::EcLevel::L,
            ErrorCorrection::Medium => qrcode::EcLevel::M,
            ErrorCorrection::Quartile => qrcode::EcLevel::Q,
            ErrorCorrection::High => qrcode::EcLevel::H,
        }
    }
}

pub mod config_defaults {
    use payme_qr_types::config::LiteralOrEnv;
    use url::Url;

    pub const LOADER_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/qrcode/1.5.1/qrcode.min.js";
    pub const SCRIPT_MARKER: &str = "qrcode.min.js";
    pub const ALT: &str = "UPI QR Code";
    pub const MODULE_SIZE: u32 = 4;
    pub const QUIET_ZONE: u32 = 4;

    pub fn loader_url() -> LiteralOrEnv<Url> {
        LiteralOrEnv::from_literal(Url::parse(LOADER_URL).expect("valid default loader url"))
    }

    pub fn script_marker() -> String {
        SCRIPT_MARKER.to_string()
    }

    pub fn alt() -> String {
        ALT.to_string()
    }

    pub fn module_size() -> u32 {
        MODULE_SIZE
    }

    pub fn quiet_zone() -> u32 {
        QUIET_ZONE
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

impl QrConfig {
    /// Loads `.env`, then the file named by `PAYME_QR_CONFIG` if set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        match env::var_os(ENV_CONFIG_PATH) {
            Some(path) => Self::load_from_path(path),
            None => {
                tracing::debug!("{ENV_CONFIG_PATH} not set, using default QR configuration");
                Ok(Self::default())
            }
        }
    }

    /// Loads configuration from a JSON file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), "loaded QR configuration");
        Ok(config)
    }

    /// Parses configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: QrConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.render.module_size == 0 {
            return Err(ConfigError::Invalid("module_size must be at least 1"));
        }
        if self.loader.script_marker.is_empty() {
            return Err(ConfigError::Invalid("script_marker must not be empty"));
        }
        Ok(())
    }
}
