//! Runtime configuration loaded from defaults, an optional JSON file and the
//! process environment, in that order of precedence (environment wins).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::error::{PrepError, PrepResult};

pub const ENV_MODEL_PATH: &str = "PREPTIME_MODEL_PATH";
pub const ENV_LOG: &str = "PREPTIME_LOG";
pub const ENV_BOOTSTRAP_SEED: &str = "PREPTIME_BOOTSTRAP_SEED";

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppCfg {
    /// Where the persisted model artifact lives. Absence of a file here
    /// triggers the bootstrap model.
    pub model_path: PathBuf,
    /// Default `tracing` filter directive; `RUST_LOG` overrides it.
    pub log_filter: String,
    /// Seed for the bootstrap dataset.
    pub bootstrap_seed: u64,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            log_filter: "preptime=info".to_string(),
            bootstrap_seed: 42,
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> PrepResult<Self> {
        Self::default().overlay(|key| env::var(key).ok())
    }

    /// Read a JSON config file, then apply environment overrides on top.
    pub fn load_with_file(path: impl AsRef<Path>) -> PrepResult<Self> {
        Self::from_file(path)?.overlay(|key| env::var(key).ok())
    }

    /// Parse a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> PrepResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| PrepError::config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| PrepError::config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Build from defaults and an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> PrepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay(lookup)
    }

    /// Apply overrides from `lookup` to this snapshot.
    pub fn overlay<F>(mut self, lookup: F) -> PrepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_MODEL_PATH).filter(|v| !v.is_empty()) {
            self.model_path = PathBuf::from(path);
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_filter = filter;
        }
        if let Some(seed) = lookup(ENV_BOOTSTRAP_SEED) {
            self.bootstrap_seed = seed.trim().parse().map_err(|_| {
                PrepError::config(format!(
                    "{ENV_BOOTSTRAP_SEED} must be an unsigned integer, got {seed:?}"
                ))
            })?;
        }
        Ok(self)
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }
}
