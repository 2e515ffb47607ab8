use std::path::Path;

use antipat_core::WalkerConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Walker tuning layered from an optional settings file and `ANTIPAT_*`
/// environment variables; the environment wins on conflicts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanSettings {
    pub max_depth: Option<usize>,
    pub max_file_size: Option<u64>,
    pub exclude_dirs: Option<Vec<String>>,
}

impl ScanSettings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("ANTIPAT"));
        let config = builder
            .build()
            .context("failed to load scanner settings")?;
        config
            .try_deserialize()
            .context("invalid scanner settings")
    }

    /// Defaults from the core, overridden by whatever was configured.
    pub fn walker_config(&self) -> WalkerConfig {
        let mut config = WalkerConfig::default();
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(size) = self.max_file_size {
            config.max_file_size = size;
        }
        if let Some(dirs) = &self.exclude_dirs {
            config.exclude_dirs = dirs.clone();
        }
        config
    }
}
