//! Configuration management
//!
//! Loads an optional JSON configuration file; every section carries
//! serde defaults so a missing or partial file degrades to the
//! documented defaults instead of failing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        serde_json::from_str(&contents).context("Failed to parse config JSON")
    }
}

/// Simulated chain backend behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub connect_delay_ms: u64,
    pub deploy_delay_ms: u64,
    /// Draft deploys are a local save, much quicker than a chain write
    pub draft_save_delay_ms: u64,
    pub stop_delay_ms: u64,
    /// Probability in [0, 1] that a non-draft deploy fails
    pub failure_rate: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            connect_delay_ms: 1500,
            deploy_delay_ms: 2500,
            draft_save_delay_ms: 500,
            stop_delay_ms: 1500,
            failure_rate: 0.05,
        }
    }
}

impl ChainConfig {
    /// Zero-latency, always-successful variant for tests
    pub fn instant() -> Self {
        Self {
            connect_delay_ms: 0,
            deploy_delay_ms: 0,
            draft_save_delay_ms: 0,
            stop_delay_ms: 0,
            failure_rate: 0.0,
        }
    }
}

/// Where the file-backed store keeps its documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".strategy-forge"),
        }
    }
}

/// UI-imposed input constraints, enforced at the CLI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub max_input_chars: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 500,
        }
    }
}
