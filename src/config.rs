//! Legacy TOML configuration (`/etc/rhc/config.toml`).
//!
//! Besides host settings, the file may carry a `features` table with the
//! same keys as the preference file:
//!
//! ```toml
//! cert-file = "/etc/pki/consumer/cert.pem"
//! log-level = "debug"
//!
//! [features]
//! content = true
//! remote-management = false
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{FeatureError, Result};
use crate::models::FeaturePreferences;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/rhc/config.toml";
const DEFAULT_CERT_FILE: &str = "/etc/pki/consumer/cert.pem";
const DEFAULT_KEY_FILE: &str = "/etc/pki/consumer/key.pem";
const DEFAULT_CA_DIR: &str = "/etc/rhsm/ca";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    cert_file: Option<PathBuf>,
    key_file: Option<PathBuf>,
    log_level: Option<String>,
    ca_dir: Option<PathBuf>,
    features: Option<toml::Table>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Consumer certificate. Its presence marks the host as registered.
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: Option<String>,
    pub ca_dir: PathBuf,
    /// Preferences from the `features` table.
    pub features: FeaturePreferences,
    /// Keys under `features` that name no known feature, as `features.<key>`.
    pub unknown_feature_keys: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cert_file: PathBuf::from(DEFAULT_CERT_FILE),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            log_level: None,
            ca_dir: PathBuf::from(DEFAULT_CA_DIR),
            features: FeaturePreferences::default(),
            unknown_feature_keys: Vec::new(),
        }
    }
}

impl Config {
    /// Load the configuration file, falling back to defaults when it does
    /// not exist. `known_ids` is the catalog's ID list; keys under
    /// `features` outside of it are collected in `unknown_feature_keys`.
    pub fn load(path: &Path, known_ids: &[&str]) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("config file '{}' not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(FeatureError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&content, known_ids).map_err(|message| FeatureError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Log a warning for every unknown key found under `features`.
    ///
    /// Kept apart from [`Config::load`] because the configuration is read
    /// before logging is set up.
    pub fn warn_unknown_feature_keys(&self, path: &Path) {
        for key in &self.unknown_feature_keys {
            tracing::warn!("unknown key '{}' in config file '{}'", key, path.display());
        }
    }

    fn parse(content: &str, known_ids: &[&str]) -> std::result::Result<Self, String> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        let defaults = Self::default();

        let mut features = FeaturePreferences::default();
        let mut unknown_feature_keys = Vec::new();
        for (key, value) in raw.features.unwrap_or_default() {
            if !known_ids.contains(&key.as_str()) {
                unknown_feature_keys.push(format!("features.{key}"));
                continue;
            }
            let Some(enabled) = value.as_bool() else {
                return Err(format!(
                    "features.{key} must be a boolean, found {}",
                    value.type_str()
                ));
            };
            if !features.set(&key, enabled) {
                unknown_feature_keys.push(format!("features.{key}"));
            }
        }

        Ok(Self {
            cert_file: raw.cert_file.unwrap_or(defaults.cert_file),
            key_file: raw.key_file.unwrap_or(defaults.key_file),
            log_level: raw.log_level,
            ca_dir: raw.ca_dir.unwrap_or(defaults.ca_dir),
            features,
            unknown_feature_keys,
        })
    }
}
