//! Preference store: the JSON file recording feature preferences made while
//! the host is not registered.
//!
//! The file is a JSON object with optional boolean keys `content`,
//! `analytics` and `remote-management`. A missing file means "no preference".

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use crate::error::{FeatureError, Result};
use crate::models::{FeaturePreferences, PREFERENCE_KEYS};

pub const DEFAULT_PREFERENCES_PATH: &str = "/var/lib/rhc/rhc-connect-features-prefs.json";

/// Load preferences from `path`.
///
/// Returns `Ok(None)` when the file does not exist. Unknown keys are logged
/// as warnings.
pub fn load(path: &Path) -> Result<Option<FeaturePreferences>> {
    load_with_warnings(path).map(|(prefs, _)| prefs)
}

/// Like [`load`], but also returns the unknown keys found in the file.
pub fn load_with_warnings(path: &Path) -> Result<(Option<FeaturePreferences>, Vec<String>)> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("features preference file not found: '{}'", path.display());
            return Ok((None, Vec::new()));
        }
        Err(source) => {
            return Err(FeatureError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let (prefs, unknown) = parse(&content).map_err(|message| FeatureError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    for key in &unknown {
        tracing::warn!(
            "unknown key '{}' in preference file '{}' (known keys: {})",
            key,
            path.display(),
            PREFERENCE_KEYS.join(",")
        );
    }

    tracing::debug!("loaded features from preference file: {}", path.display());
    Ok((Some(prefs), unknown))
}

fn parse(content: &str) -> std::result::Result<(FeaturePreferences, Vec<String>), String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let Value::Object(map) = value else {
        return Err(format!(
            "expected a JSON object at the root, found {}",
            json_kind(&value)
        ));
    };

    let mut prefs = FeaturePreferences::default();
    let mut unknown = Vec::new();
    for (key, value) in map {
        if !PREFERENCE_KEYS.contains(&key.as_str()) {
            unknown.push(key);
            continue;
        }
        match value {
            Value::Bool(enabled) => {
                prefs.set(&key, enabled);
            }
            Value::Null => {}
            other => {
                return Err(format!(
                    "value of '{}' must be a boolean, found {}",
                    key,
                    json_kind(&other)
                ))
            }
        }
    }
    Ok((prefs, unknown))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write preferences to `path`, creating parent directories as needed.
pub fn save(path: &Path, prefs: &FeaturePreferences) -> Result<()> {
    let io_err = |source| FeatureError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            tracing::debug!("creating directory {}", parent.display());
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let content = serde_json::to_string_pretty(prefs).map_err(|e| FeatureError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, content).map_err(io_err)?;

    tracing::debug!("feature preferences saved in {}", path.display());
    Ok(())
}

/// Remove the preference file. A file that does not exist is left alone.
pub fn delete(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("removed preference file {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("preference file {} already absent", path.display());
            Ok(())
        }
        Err(source) => Err(FeatureError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
