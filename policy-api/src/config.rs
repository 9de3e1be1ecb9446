//! Server configuration (TOML).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// `card-policy-api` configuration.
///
/// Every field is optional in the file; missing fields take the defaults
/// below, and a missing file yields `ApiConfig::default()`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the server to.
    pub bind: String,

    /// Port to listen on.
    pub port: u16,

    /// Policy table file. The built-in reference table is used when unset.
    pub policy_table: Option<PathBuf>,

    /// Seed the in-memory card store with the demo portfolio
    /// (`User1`..`User3`, 21 cards each).
    pub seed_sample_cards: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3002,
            policy_table: None,
            seed_sample_cards: true,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bind.trim().is_empty() {
            return Err(anyhow!("bind must be a non-empty address"));
        }
        if self.port == 0 {
            return Err(anyhow!("port must be > 0"));
        }
        if let Some(path) = &self.policy_table
            && path.as_os_str().is_empty()
        {
            return Err(anyhow!("policy_table must not be empty when set"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ApiConfig::default()`.
pub fn load_config(path: &Path) -> Result<ApiConfig> {
    if !path.exists() {
        let cfg = ApiConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ApiConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
