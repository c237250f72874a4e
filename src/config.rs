use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;
use crate::lighting::MappingConfig;

/// Hue bridge address and credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bridge IP or hostname, e.g. "192.168.1.2".
    pub address: String,
    /// Whitelisted bridge credential.
    pub username: String,
}

/// Whole-process configuration, loaded from a JSON file.
///
/// Every section and field carries a default, so a partial file (or none at
/// all) works; tests override individual values deterministically the same
/// way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub bridge: BridgeConfig,
    pub mapping: MappingConfig,
}

impl Config {
    /// Loads the config file, or returns defaults when it does not exist.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!("no config file at {path}, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config = serde_json::from_str(&raw).with_context(|| format!("parsing config {path}"))?;
        info!("loaded config from {path}");
        Ok(config)
    }
}
