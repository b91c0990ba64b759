//! Runtime environment detection.
//!
//! QR images are produced differently depending on where the crate runs:
//!
//! - [`Environment::Server`]: the host provides an encoder directly (the bundled
//!   [`PngQrEncoder`](crate::render::PngQrEncoder) by default), and raw PNG bytes
//!   can be produced.
//! - [`Environment::Browser`]: the encoder is a page global that may have to be
//!   fetched from a CDN first; only inline images can be produced.
//! - [`Environment::Unsupported`]: neither capability is present.
//!
//! Detection happens once, from a [`HostProbe`], and the resulting value is handed
//! to the [`EncoderLocator`](crate::locator::EncoderLocator). Nothing re-queries
//! the host afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where QR generation is taking place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Browser,
    Server,
    Unsupported,
}

impl Environment {
    /// Classifies the host.
    ///
    /// A window-like global wins over a module loader, so a page that also
    /// exposes `require` is still treated as a browser.
    pub fn detect<P: HostProbe + ?Sized>(probe: &P) -> Self {
        let environment = if probe.has_window() {
            Environment::Browser
        } else if probe.has_module_loader() {
            Environment::Server
        } else {
            Environment::Unsupported
        };
        tracing::debug!(%environment, "detected QR environment");
        environment
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Browser => "browser",
            Environment::Server => "server",
            Environment::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities of the host used to pick an [`Environment`].
pub trait HostProbe {
    /// Whether a window-like global is present.
    fn has_window(&self) -> bool;
    /// Whether the host can load encoder modules on its own.
    fn has_module_loader(&self) -> bool;
}

/// Plain-value [`HostProbe`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    pub window: bool,
    pub module_loader: bool,
}

impl HostCapabilities {
    /// A native process: no window, encoders linked in.
    pub const fn native() -> Self {
        Self {
            window: false,
            module_loader: true,
        }
    }

    /// A browser page.
    pub const fn browser() -> Self {
        Self {
            window: true,
            module_loader: false,
        }
    }
}

impl HostProbe for HostCapabilities {
    fn has_window(&self) -> bool {
        self.window
    }

    fn has_module_loader(&self) -> bool {
        self.module_loader
    }
}
