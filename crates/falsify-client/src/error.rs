use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("could not read {}: {source}", .path.display())]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{endpoint} request failed: {source}")]
  Http {
    endpoint: &'static str,
    #[source]
    source:   reqwest::Error,
  },

  #[error("{endpoint} → {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
  Status {
    endpoint: &'static str,
    status:   StatusCode,
    message:  Option<String>,
  },

  /// The backend answered 2xx but reported an error in the body.
  #[error("{endpoint}: {message}")]
  Backend { endpoint: &'static str, message: String },

  #[error("{endpoint} returned an unreadable body: {source}")]
  Decode {
    endpoint: &'static str,
    #[source]
    source:   serde_json::Error,
  },

  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
