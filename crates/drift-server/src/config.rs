//! Configuration loading and validation for the drift server.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;
use zeroize::Zeroizing;

/// Validated server configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Operator secret the field key is derived from. **Required.**
    /// Must be at least 32 bytes; checked again when the encryptor is built.
    pub encryption_key: Zeroizing<String>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment (`"production"`, `"development"`, ...).
    #[serde(default = "default_env")]
    pub env: String,

    /// Tracing log level. Defaults to `info` in production, `debug` elsewhere.
    #[serde(default)]
    pub log_level: Option<String>,

    /// OTLP endpoint for span export. Export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    8080
}
fn default_env() -> String {
    "development".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Effective log level after applying the environment default.
    pub fn effective_log_level(&self) -> &str {
        match &self.log_level {
            Some(level) if !level.trim().is_empty() => level.as_str(),
            _ if self.is_production() => "info",
            _ => "debug",
        }
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.encryption_key.len() < fieldcrypt::MIN_SECRET_LEN {
            anyhow::bail!(
                "ENCRYPTION_KEY must be at least {} bytes",
                fieldcrypt::MIN_SECRET_LEN
            );
        }
        if self.port == 0 {
            anyhow::bail!("PORT must be > 0");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            if endpoint.trim().is_empty() {
                anyhow::bail!("OTEL_EXPORTER_OTLP_ENDPOINT must not be empty when set");
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("encryption_key", &"[REDACTED]")
            .field("port", &self.port)
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .finish()
    }
}
