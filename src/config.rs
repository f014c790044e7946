//! Tray configuration persistence.
//!
//! Stores tray configuration in a JSON file with:
//! - Atomic writes (write temp, rename)
//! - Corruption fallback (regenerate defaults if parse fails)
//! - Platform-specific config paths

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::icons::IconStyle;

/// Current schema version.
const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "vpn-status-tray";

/// Config file name.
const CONFIG_FILE_NAME: &str = "tray.json";

const DEFAULT_APP_NAME: &str = "VPN Status";
const DEFAULT_SERVICE_NAME: &str = "Tailscale";

/// Root tray configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrayConfig {
    /// Schema version for migrations.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Name of the host application, used in tooltips.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Name of the VPN service the tray controls.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Text shown beside the tray icon, where the platform supports it.
    #[serde(default)]
    pub title: Option<String>,

    /// Embedded icon set.
    #[serde(default)]
    pub icon_style: IconStyle,

    /// Icon files overriding the embedded set.
    #[serde(default)]
    pub custom_icons: Option<CustomIcons>,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            app_name: default_app_name(),
            service_name: default_service_name(),
            title: None,
            icon_style: IconStyle::default(),
            custom_icons: None,
        }
    }
}

/// Per-slot icon overrides; unset slots keep the embedded icon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomIcons {
    #[serde(default)]
    pub active: Option<PathBuf>,
    #[serde(default)]
    pub inactive: Option<PathBuf>,
    #[serde(default)]
    pub exit_node: Option<PathBuf>,
}

impl TrayConfig {
    /// Replace blank values with defaults.
    pub fn validate_and_clamp(&mut self) {
        if self.app_name.trim().is_empty() {
            self.app_name = default_app_name();
        }
        if self.service_name.trim().is_empty() {
            self.service_name = default_service_name();
        }
        if self
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            self.title = None;
        }
    }

    /// Tooltip for the tray icon itself.
    pub fn tray_tooltip(&self) -> &str {
        &self.app_name
    }
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// Platform config directory for the tray, e.g. `~/.config/vpn-status-tray`
/// on Linux or `~/Library/Application Support/vpn-status-tray` on macOS.
///
/// Falls back to `$HOME/.config`, then to the working directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the full config file path.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Load configuration from disk.
///
/// If the config file doesn't exist or is corrupted, returns defaults.
/// Corrupted files are backed up for debugging.
pub fn load_config() -> TrayConfig {
    load_config_from_path(&config_path())
}

/// Load configuration from a specific path.
pub fn load_config_from_path(path: &Path) -> TrayConfig {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Value>(&content) {
            Ok(value) => {
                let mut config = parse_config(value);
                config.validate_and_clamp();
                config
            }
            Err(e) => {
                log::error!("Tray config parse error, using defaults: {}", e);
                let backup = path.with_extension("json.corrupt");
                if let Err(backup_err) = fs::rename(path, &backup) {
                    log::warn!("Failed to backup corrupt tray config: {}", backup_err);
                }
                TrayConfig::default()
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("No tray config file found, using defaults");
            TrayConfig::default()
        }
        Err(e) => {
            log::error!("Tray config read error, using defaults: {}", e);
            TrayConfig::default()
        }
    }
}

/// Save configuration to disk atomically.
pub fn save_config(config: &TrayConfig) -> Result<(), ConfigError> {
    save_config_to_path(config, &config_path())
}

/// Save configuration to a specific path.
///
/// Writes to a temp file first, then renames to the final path.
pub fn save_config_to_path(config: &TrayConfig, path: &Path) -> Result<(), ConfigError> {
    let temp = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    fs::write(&temp, &json)?;
    fs::rename(&temp, path)?;

    Ok(())
}

fn parse_config(config: Value) -> TrayConfig {
    let version = config["schema_version"]
        .as_u64()
        .unwrap_or(u64::from(CURRENT_SCHEMA_VERSION));
    if version > u64::from(CURRENT_SCHEMA_VERSION) {
        log::warn!(
            "Tray config schema v{} is newer than supported v{}, unknown fields are ignored",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    serde_json::from_value(config).unwrap_or_else(|e| {
        log::error!("Tray config has invalid values, using defaults: {}", e);
        TrayConfig::default()
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
