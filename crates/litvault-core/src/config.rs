//! Engine configuration
//!
//! Loaded from `litvault.toml`. Configuration problems are fatal before any
//! vault mutation: an engine is never constructed from an invalid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::record::Library;
use crate::{Error, Result};

fn default_cooldown_secs() -> u64 {
    30
}

fn default_generator_budget_ms() -> u64 {
    1_000
}

/// Engine configuration for one vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding snapshot and status files
    pub store_dir: PathBuf,
    /// Root of the derived vault
    pub vault_root: PathBuf,
    /// Libraries to synchronize
    #[serde(default)]
    pub libraries: Vec<Library>,
    /// Seconds a timer trigger is suppressed after a finished pass
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Per-record generator time budget in milliseconds
    #[serde(default = "default_generator_budget_ms")]
    pub generator_budget_ms: u64,
}

impl EngineConfig {
    pub fn new(store_dir: impl Into<PathBuf>, vault_root: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            vault_root: vault_root.into(),
            libraries: Vec::new(),
            cooldown_secs: default_cooldown_secs(),
            generator_budget_ms: default_generator_budget_ms(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable before any mutation happens.
    pub fn validate(&self) -> Result<()> {
        if self.store_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "store_dir must not be empty".to_string(),
            });
        }
        if self.vault_root.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "vault_root must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn generator_budget(&self) -> Duration {
        Duration::from_millis(self.generator_budget_ms)
    }
}
