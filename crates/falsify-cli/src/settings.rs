//! Layered configuration: TOML file, then `FALSIFY_*` environment variables,
//! then command-line flags.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, Result};
use config::{Config, Environment, File};
use falsify_client::ClientConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_server_url")]
  pub server_url:           String,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs: u64,
}

fn default_server_url() -> String { "http://localhost:5000".to_string() }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/falsify/history.db") }
fn default_request_timeout_secs() -> u64 { 30 }

/// Values given on the command line; they beat every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub server_url:           Option<String>,
  pub store_path:           Option<PathBuf>,
  pub request_timeout_secs: Option<u64>,
}

impl Settings {
  /// Read `file` if it exists, apply the environment and `overrides`, and
  /// expand a leading `~` in the store path.
  pub fn load(file: &Path, overrides: Overrides) -> Result<Self> {
    let config = Config::builder()
      .add_source(File::from(file).required(false))
      .add_source(Environment::with_prefix("FALSIFY").try_parsing(true))
      .set_override_option("server_url", overrides.server_url)?
      .set_override_option(
        "store_path",
        overrides
          .store_path
          .map(|p| p.to_string_lossy().into_owned()),
      )?
      .set_override_option("request_timeout_secs", overrides.request_timeout_secs)?
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    let mut settings: Settings = config
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }

  pub fn client_config(&self) -> ClientConfig {
    ClientConfig {
      base_url: self.server_url.clone(),
      timeout:  Duration::from_secs(self.request_timeout_secs),
    }
  }
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
