//! Configuration files
//!
//! TOML configuration that tells the settings layer where its table lives and
//! how to reach the hardware.

use crate::SettingsError;
use clickwheel_hal::DeviceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Standard configuration paths
pub const CONFIG_DIR: &str = "/etc/clickwheel";
pub const USER_CONFIG_DIR: &str = "/mnt/.clickwheel";

/// Settings storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Binary settings table
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

fn default_settings_path() -> PathBuf {
    Path::new(CONFIG_DIR).join("settings.bin")
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClickwheelConfig {
    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub device: DeviceConfig,
}

impl ClickwheelConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, SettingsError> {
        // Try user config first, then system config
        let user_config = Path::new(USER_CONFIG_DIR).join("config.toml");
        if user_config.exists() {
            return Self::load(&user_config);
        }

        let system_config = Path::new(CONFIG_DIR).join("config.toml");
        if system_config.exists() {
            return Self::load(&system_config);
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }
}
