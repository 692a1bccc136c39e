use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bridge::{
    BridgeOptions, EXTERNAL_API_MAX_RETRIES, EXTERNAL_API_POLL_INTERVAL,
    FALLBACK_BRIDGE_POLL_INTERVAL,
};
use crate::shell::window::WindowBounds;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub window: WindowConfig,
    /// Action name → accelerator keys, e.g. `play_pause = ["Alt", "P"]`.
    #[serde(default)]
    pub hotkeys: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: home.join(".ymusic"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    pub auto_start: bool,
    pub home_url: String,
    /// Custom global hotkeys need accessibility permission on some systems.
    pub trusted_accessibility: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            home_url: "https://music.yandex.ru".to_string(),
            trusted_accessibility: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub probe_interval_ms: u64,
    pub max_probe_retries: u32,
    pub poll_interval_ms: u64,
    pub fallback_polling: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: EXTERNAL_API_POLL_INTERVAL.as_millis() as u64,
            max_probe_retries: EXTERNAL_API_MAX_RETRIES,
            poll_interval_ms: FALLBACK_BRIDGE_POLL_INTERVAL.as_millis() as u64,
            fallback_polling: true,
        }
    }
}

impl BridgeConfig {
    pub fn options(&self) -> BridgeOptions {
        BridgeOptions {
            probe_interval: Duration::from_millis(self.probe_interval_ms.max(1)),
            max_probe_retries: self.max_probe_retries,
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            fallback_polling: self.fallback_polling,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default)]
    pub bounds: WindowBounds,
    /// Dark system theme: picks the window background.
    #[serde(default)]
    pub dark: bool,
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ymusic")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    config_dir.display()
                )
            })?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Keeps `bounds` for the next start unless the window was shrunk to
    /// nothing. Returns whether anything changed.
    pub fn remember_window_bounds(&mut self, bounds: WindowBounds) -> bool {
        if !bounds.worth_persisting() || self.window.bounds == bounds {
            return false;
        }
        self.window.bounds = bounds;
        true
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.storage.path
    }

    pub fn socket_path(&self) -> PathBuf {
        self.storage.path.join("ymusic.sock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.storage.path.join("ymusic.pid")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir()).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                self.data_dir().display()
            )
        })?;
        Ok(())
    }
}
