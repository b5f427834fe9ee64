//! Server configuration: an optional TOML file overlaid with `TOPBREJA_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use config::{Config, ConfigBuilder, Environment, builder::DefaultState};
use serde::Deserialize;
use topbreja_core::{ranking::RankingWeights, session::DEFAULT_SESSION_TTL};

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Public base URL of the bucket holding beer images.
  pub image_base_url:   String,
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs: u64,
  #[serde(default)]
  pub ranking:          RankingWeights,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_session_ttl_secs() -> u64 { DEFAULT_SESSION_TTL.as_secs() }

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::build(Config::builder().add_source(config::File::from(path).required(false)))
  }

  fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let settings = builder
      .add_source(
        Environment::with_prefix("TOPBREJA")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read configuration")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.ranking.validate().context("invalid [ranking] weights")?;
    Ok(cfg)
  }

  pub fn session_ttl(&self) -> Duration { Duration::from_secs(self.session_ttl_secs) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
