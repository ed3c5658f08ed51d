//! Configuration for qrlink.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $QRLINK_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/qrlink/config.toml
//!   3. ~/.config/qrlink/config.toml
//!
//! This module also holds the slot store: a flat name → text mapping,
//! loaded and saved as a whole file, that callers use to keep previously
//! generated payload text around between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrlinkConfig {
    pub read: ReadSettings,
    pub send: SendSettings,
    pub slots: SlotsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadSettings {
    /// How often the receive worker polls the barcode source, in ms.
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendSettings {
    /// Delay between displayed parts, in ms.
    pub part_delay_ms: u64,
    /// Maximum barcode width in modules, for capacity-derived part sizing.
    pub max_width: u32,
    /// Chunk size in characters for the fixed-width text scheme.
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsSettings {
    /// Path of the slot store file.
    pub path: PathBuf,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for QrlinkConfig {
    fn default() -> Self {
        Self {
            read: ReadSettings::default(),
            send: SendSettings::default(),
            slots: SlotsSettings::default(),
        }
    }
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30,
        }
    }
}

impl Default for SendSettings {
    fn default() -> Self {
        Self {
            part_delay_ms: 300,
            max_width: 51,
            chunk_size: 100,
        }
    }
}

impl Default for SlotsSettings {
    fn default() -> Self {
        Self {
            path: data_dir().join("slots.toml"),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("qrlink")
}

fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("qrlink")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl QrlinkConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            QrlinkConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("QRLINK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&QrlinkConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply QRLINK_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QRLINK_READ__POLL_INTERVAL_MS") {
            if let Ok(ms) = v.parse() {
                self.read.poll_interval_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("QRLINK_SEND__PART_DELAY_MS") {
            if let Ok(ms) = v.parse() {
                self.send.part_delay_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("QRLINK_SEND__MAX_WIDTH") {
            if let Ok(w) = v.parse() {
                self.send.max_width = w;
            }
        }
        if let Ok(v) = std::env::var("QRLINK_SEND__CHUNK_SIZE") {
            if let Ok(c) = v.parse() {
                self.send.chunk_size = c;
            }
        }
        if let Ok(v) = std::env::var("QRLINK_SLOTS__PATH") {
            self.slots.path = PathBuf::from(v);
        }
    }
}

// ── Slot store ────────────────────────────────────────────────────────────────

/// Flat name → text mapping persisted as one TOML file. Used to save and
/// restore previously generated payload text by a caller-chosen slot name.
#[derive(Debug, Clone)]
pub struct SlotStore {
    path: PathBuf,
    slots: BTreeMap<String, String>,
}

impl SlotStore {
    /// Load the store from `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let slots = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            slots,
        })
    }

    /// Persist the whole store back to its file.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(self.path.clone(), e))?;
        }
        let text = toml::to_string_pretty(&self.slots).map_err(ConfigError::SerializeFailed)?;
        std::fs::write(&self.path, text)
            .map_err(|e| ConfigError::WriteFailed(self.path.clone(), e))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, text: &str) {
        self.slots.insert(name.to_string(), text.to_string());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.slots.remove(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}
