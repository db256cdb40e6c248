use crate::config::{HexbinConfig, HitTestConfig, PlacementConfig, SchemaConfig};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub hexbin: HexbinConfig,
    #[serde(default)]
    pub hit_test: HitTestConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub url: Option<String>,     // Remote node snapshot
    pub path: Option<PathBuf>,   // Local node snapshot, wins over url
    pub timeout_secs: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings text, falling back to defaults on error
    pub fn from_toml(content: &str) -> Self {
        toml::from_str(content).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed config: {}", e);
            Self::default()
        })
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nodeglobe")
            .join("config.toml")
    }
}
