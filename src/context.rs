/*!
 * Run context built once at startup
 */

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{default_config_path, AppConfig};
use crate::error::Result;

/// Configuration and its location for one process run.
///
/// Commands receive the context by reference. Environment credentials and
/// per-invocation flags are applied to a copy from [`AppContext::run_config`],
/// so neither ever reaches the saved file.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: AppConfig,
    config_path: PathBuf,
}

impl AppContext {
    /// Load the configuration file, or defaults when it is missing
    pub fn load(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(default_config_path);
        let config = AppConfig::load_or_default(&config_path);
        debug!(path = %config_path.display(), config = ?config, "run context ready");
        Self {
            config,
            config_path,
        }
    }

    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Copy of the stored configuration with environment credentials applied
    pub fn run_config(&self) -> AppConfig {
        self.run_config_from(|name| std::env::var(name).ok())
    }

    /// Like [`AppContext::run_config`], reading credential overrides from `lookup`
    pub fn run_config_from<F>(&self, lookup: F) -> AppConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.config.clone();
        config.apply_credential_env(lookup);
        config
    }

    /// Apply `update` to the stored configuration and write it back to disk
    pub fn update<F>(&mut self, update: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig) -> Result<()>,
    {
        update(&mut self.config)?;
        self.config.to_file(&self.config_path)?;
        debug!(path = %self.config_path.display(), "configuration saved");
        Ok(())
    }
}
