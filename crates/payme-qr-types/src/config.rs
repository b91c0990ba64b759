//! Environment-aware configuration values.
//!
//! The [`LiteralOrEnv`] wrapper lets a configuration value be written either
//! literally or as a reference to an environment variable:
//!
//! ```json
//! {
//!   "url": "https://cdn.example.com/qrcode.min.js",   // Literal value
//!   "url": "$QR_LOADER_URL",                           // Simple env var
//!   "url": "${QR_LOADER_URL}"                          // Braced env var
//! }
//! ```
//!
//! This keeps deployment-specific locations (a self-hosted mirror of the encoder
//! script, for instance) out of checked-in configuration files.

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"https://cdnjs.cloudflare.com/..."`
/// - Simple env var: `"$QR_LOADER_URL"`
/// - Braced env var: `"${QR_LOADER_URL}"`
///
/// Serialization always writes the resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if `s` uses the `$VAR` or `${VAR}` syntax.
    fn env_var_name(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            return Some(braced);
        }
        let bare = s.strip_prefix('$')?;
        let is_name = !bare.is_empty() && bare.chars().all(|c| c.is_alphanumeric() || c == '_');
        is_name.then_some(bare)
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::env_var_name(&s) {
            Some(var_name) => {
                tracing::trace!(var = var_name, "resolving configuration value from environment");
                std::env::var(var_name).map_err(|_| {
                    serde::de::Error::custom(format!(
                        "Environment variable '{}' not found (referenced as '{}')",
                        var_name, s
                    ))
                })?
            }
            None => s,
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
