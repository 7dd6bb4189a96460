//! Pool configuration loading for the CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use lockpool_core::config::PoolConfig;

/// Configuration source and overrides shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON pool configuration file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the minimum lock duration in seconds
    #[arg(long)]
    pub min_lock_secs: Option<u64>,

    /// Override the emergency exit penalty percentage (0-100)
    #[arg(long)]
    pub penalty_percent: Option<u8>,
}

impl ConfigArgs {
    /// Load the file (or defaults), apply overrides and validate.
    pub fn load(&self) -> Result<PoolConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => PoolConfig::default(),
        };
        if let Some(secs) = self.min_lock_secs {
            config.min_lock_secs = secs;
        }
        if let Some(pct) = self.penalty_percent {
            config.emergency_penalty_percent = pct;
        }
        config.validate().context("Invalid pool configuration")?;
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<PoolConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))
}
