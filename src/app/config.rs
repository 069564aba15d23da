use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdbSettings {
    pub command_path: String,
    pub command_timeout_secs: u64,
    pub prop_timeout_secs: u64,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            command_path: String::new(),
            command_timeout_secs: 10,
            prop_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSettings {
    pub fetch_sizes: bool,
    pub show_offline_devices: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            fetch_sizes: false,
            show_offline_devices: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSettings {
    pub reports_dir: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            reports_dir: "reports".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub reports: ReportSettings,
    #[serde(default)]
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb: AdbSettings::default(),
            catalog: CatalogSettings::default(),
            reports: ReportSettings::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("APP_FREEZE_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".app_freeze_config.json")
}

pub fn load_config() -> AppConfig {
    load_config_from_path(&config_path())
}

/// Unreadable or unparsable config falls back to defaults; a broken
/// config file must never keep the tool from starting.
pub fn load_config_from_path(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }
    let Ok(raw) = fs::read_to_string(path) else {
        return AppConfig::default();
    };
    let config: AppConfig = serde_json::from_str(&raw).unwrap_or_default();
    validate_config(config)
}

pub fn save_config(config: &AppConfig) -> Result<(), std::io::Error> {
    save_config_to_path(config, &config_path())
}

pub fn save_config_to_path(config: &AppConfig, path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    fs::write(path, payload)
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    if config.adb.command_timeout_secs == 0 {
        config.adb.command_timeout_secs = 10;
    }
    if config.adb.prop_timeout_secs == 0 {
        config.adb.prop_timeout_secs = 5;
    }
    if config.reports.reports_dir.trim().is_empty() {
        config.reports.reports_dir = "reports".to_string();
    }
    config
}
