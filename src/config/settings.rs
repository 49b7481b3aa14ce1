use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::ScryptParams;
use crate::errors::{KeepsakeError, Result};

/// Client configuration, loaded from `.keepsake.toml`.
///
/// Every field has a sensible default so Keepsake works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Where the remote store listens (`host:port` or a full URL).
    #[serde(default = "default_server_address")]
    pub server_address: String,

    /// Per-call deadline in seconds (default: 5).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Salt mixed into the key derivation (default: empty).
    ///
    /// Changing it changes every key: existing secrets become unreadable.
    #[serde(default)]
    pub kdf_salt: String,

    /// scrypt log2(N) (default: 15).
    #[serde(default = "default_scrypt_log_n")]
    pub scrypt_log_n: u8,

    /// scrypt block size r (default: 8).
    #[serde(default = "default_scrypt_r")]
    pub scrypt_r: u32,

    /// scrypt parallelism p (default: 1).
    #[serde(default = "default_scrypt_p")]
    pub scrypt_p: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_server_address() -> String {
    "http://127.0.0.1:50051".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_scrypt_log_n() -> u8 {
    15
}

fn default_scrypt_r() -> u32 {
    8
}

fn default_scrypt_p() -> u32 {
    1
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            request_timeout_secs: default_request_timeout_secs(),
            kdf_salt: String::new(),
            scrypt_log_n: default_scrypt_log_n(),
            scrypt_r: default_scrypt_r(),
            scrypt_p: default_scrypt_p(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = ".keepsake.toml";

    /// Load settings from `<dir>/.keepsake.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            KeepsakeError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        tracing::debug!(path = %config_path.display(), "config loaded");
        Ok(settings)
    }

    /// Replace the server address when an override (flag or
    /// `KEEPSAKE_ADDRESS`) is present and non-empty.
    pub fn with_server_address(mut self, address: Option<&str>) -> Self {
        if let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) {
            self.server_address = address.to_string();
        }
        self
    }

    /// The per-call deadline as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Convert the scrypt settings into crypto-layer params.
    pub fn scrypt_params(&self) -> ScryptParams {
        ScryptParams {
            log_n: self.scrypt_log_n,
            r: self.scrypt_r,
            p: self.scrypt_p,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
