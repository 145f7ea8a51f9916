//! Bridge settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use link_mux::RouterConfig;
use link_sim::VirtualRadioConfig;
use serde::{Deserialize, Serialize};

/// Serial port configuration for one link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortSettings {
    /// Serial port path
    pub port: String,
    /// Baud rate
    #[serde(default = "default_baud")]
    pub baud_rate: u32,
}

/// Team re-announce interval for simulated radios; well inside the liveness timeout
const SIMULATED_REANNOUNCE_MS: u64 = 500;

fn default_baud() -> u32 {
    115_200
}

impl PortSettings {
    fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: default_baud(),
        }
    }
}

/// Bridge settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeSettings {
    /// Console link
    pub console: PortSettings,
    /// Radio link for channel A
    pub radio_a: PortSettings,
    /// Radio link for channel B
    pub radio_b: PortSettings,
    /// Use simulated links instead of serial ports
    pub simulate: bool,
    /// Simulated radio workers (used with `simulate`)
    pub virtual_radios: [VirtualRadioConfig; 2],
    /// Router tuning
    pub router: RouterConfig,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            console: PortSettings::new("/dev/ttyACM0"),
            radio_a: PortSettings::new("/dev/ttyUSB0"),
            radio_b: PortSettings::new("/dev/ttyUSB1"),
            simulate: false,
            virtual_radios: [
                VirtualRadioConfig {
                    id: "Worker A".to_string(),
                    ..Default::default()
                }
                .with_team("ALPHA")
                .with_reannounce_ms(SIMULATED_REANNOUNCE_MS),
                VirtualRadioConfig {
                    id: "Worker B".to_string(),
                    ..Default::default()
                }
                .with_team("BRAVO")
                .with_reannounce_ms(SIMULATED_REANNOUNCE_MS),
            ],
            router: RouterConfig::default(),
        }
    }
}

impl BridgeSettings {
    /// Get the XDG config directory for teamlink
    /// Uses $XDG_CONFIG_HOME/teamlink on Linux/macOS, falls back to ~/.config/teamlink
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("teamlink"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("teamlink"))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from `path`, or the default path when `None`
    ///
    /// A missing file yields defaults; an unreadable or malformed one is an
    /// error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Parse settings JSON and check the router configuration
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.router.validate()?;
        Ok(settings)
    }

    /// Save settings to `path`, or the default path when `None`
    pub fn save(&self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path().context("Could not determine settings path")?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(&path, json).context("Failed to write settings")?;

        Ok(path)
    }
}
