// src/settings.rs
//
// Persistent settings for the console, stored as TOML under the user config
// directory. Command-line flags override whatever is on disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logs::DEFAULT_LOG_LIMIT;

fn default_baud_rate() -> u32 {
    9600
}

fn default_log_limit() -> usize {
    DEFAULT_LOG_LIMIT
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppSettings {
    /// Port to connect to when none is given on the command line,
    /// e.g. "/dev/rfcomm0".
    #[serde(default)]
    pub default_port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Retained lines per sensor log.
    #[serde(default = "default_log_limit")]
    pub log_limit: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            default_port: None,
            baud_rate: default_baud_rate(),
            log_limit: default_log_limit(),
        }
    }
}

/// Settings file path: `<config dir>/hc05-console/settings.toml`.
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hc05-console").join("settings.toml"))
}

/// Load settings from disk. A missing file yields the defaults; a file that
/// fails to parse is an error rather than silently ignored configuration.
pub fn load_settings() -> Result<AppSettings, String> {
    let Some(path) = settings_path() else {
        return Ok(AppSettings::default());
    };
    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let settings: AppSettings = toml::from_str("").unwrap();
        assert_eq!(settings.default_port, None);
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.log_limit, DEFAULT_LOG_LIMIT);
    }

    #[test]
    fn test_partial_file_keeps_field_defaults() {
        let settings: AppSettings = toml::from_str("default_port = \"/dev/rfcomm0\"").unwrap();
        assert_eq!(settings.default_port.as_deref(), Some("/dev/rfcomm0"));
        assert_eq!(settings.baud_rate, 9600);
    }

    #[test]
    fn test_round_trip() {
        let settings = AppSettings {
            default_port: Some("COM5".to_string()),
            baud_rate: 38400,
            log_limit: 200,
        };
        let raw = toml::to_string(&settings).unwrap();
        let parsed: AppSettings = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.baud_rate, 38400);
        assert_eq!(parsed.log_limit, 200);
        assert_eq!(parsed.default_port.as_deref(), Some("COM5"));
    }
}
