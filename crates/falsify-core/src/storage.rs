//! The `HistoryStorage` trait and an in-memory implementation.
//!
//! The ledger only ever reads, writes, or removes whole serialised tables, so
//! a backend is a plain string key-value store. Higher layers pick the
//! backend (`falsify-store-sqlite` for the CLI, [`MemoryStorage`] for tests).

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex, PoisonError},
};

/// Abstraction over a durable string key-value store.
///
/// Every write replaces the whole value for a key, so a reader sees either the
/// previous value or the new one, never a partial merge.
pub trait HistoryStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the value stored under `key`. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`, replacing any previous value.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete `key`. Removing an absent key is not an error.
  fn remove<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── MemoryStorage ───────────────────────────────────────────────────────────

/// A process-local [`HistoryStorage`].
///
/// Clones share the same map, so a test can keep a handle to inspect or
/// tamper with what the ledger persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
  entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
  pub fn new() -> Self { Self::default() }

  /// Seed `key` directly, bypassing the ledger.
  pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
    self.lock().insert(key.into(), value.into());
  }

  /// The raw value under `key`, if any.
  pub fn raw(&self, key: &str) -> Option<String> { self.lock().get(key).cloned() }

  pub fn contains_key(&self, key: &str) -> bool { self.lock().contains_key(key) }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl HistoryStorage for MemoryStorage {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
    Ok(self.raw(key))
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), Infallible> {
    self.insert_raw(key, value);
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), Infallible> {
    self.lock().remove(key);
    Ok(())
  }
}
