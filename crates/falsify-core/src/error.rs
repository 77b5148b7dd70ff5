//! Error types for `falsify-core`.

use thiserror::Error;

use crate::category::Category;

#[derive(Debug, Error)]
pub enum Error {
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("malformed {category} result: {reason}")]
  MalformedPayload { category: Category, reason: String },

  #[error("unsupported file type: {0:?}")]
  UnsupportedFile(String),

  #[error("{filename:?} is not a {expected} file")]
  CategoryMismatch { filename: String, expected: Category },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a backend error into [`Error::Storage`].
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
