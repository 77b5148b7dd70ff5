//! [`HistoryLedger`]: the per-category, capacity-bounded history tables.
//!
//! Each table is kept in memory, most recent first, and mirrored to the
//! injected [`HistoryStorage`] as one JSON array under
//! [`Category::storage_key`]. Every mutation rewrites the whole table.

use std::collections::BTreeMap;

use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::{
  Error, Result,
  category::{Category, HistoryFilter},
  record::{AnalysisRecord, Feedback},
  stats::AggregateStats,
  storage::HistoryStorage,
};

/// Maximum number of records kept per category.
pub const HISTORY_CAPACITY: usize = 50;

pub struct HistoryLedger<S> {
  storage: S,
  tables:  BTreeMap<Category, Vec<AnalysisRecord>>,
}

impl<S: HistoryStorage> HistoryLedger<S> {
  /// Build a ledger over `storage` and restore every category from it.
  pub async fn open(storage: S) -> Self {
    let mut ledger = Self {
      storage,
      tables: Category::iter().map(|c| (c, Vec::new())).collect(),
    };
    for category in Category::iter() {
      ledger.restore(category).await;
    }
    ledger
  }

  pub fn storage(&self) -> &S { &self.storage }

  /// Reload `category` from storage, replacing the in-memory table.
  ///
  /// Missing, unreadable, or unparseable data leaves the table empty. Records
  /// whose own category differs from the table's are dropped, since feedback
  /// on them would be persisted to the other table.
  pub async fn restore(&mut self, category: Category) -> &[AnalysisRecord] {
    let key = category.storage_key();
    let mut records = match self.storage.get(&key).await {
      Ok(Some(raw)) => match serde_json::from_str::<Vec<AnalysisRecord>>(&raw) {
        Ok(records) => records,
        Err(e) => {
          warn!(%category, error = %e, "discarding unparseable history");
          Vec::new()
        }
      },
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(%category, error = %e, "could not read history");
        Vec::new()
      }
    };
    let stored = records.len();
    records.retain(|r| r.category == category);
    if records.len() < stored {
      warn!(
        %category,
        dropped = stored - records.len(),
        "discarding records filed under another category"
      );
    }
    debug!(%category, count = records.len(), "history restored");

    let table = self.tables.entry(category).or_default();
    *table = records;
    table
  }

  /// Insert `record` at the front of its category's table and persist it.
  ///
  /// An older record with the same id is dropped first, and the table is cut
  /// back to [`HISTORY_CAPACITY`]. If the write fails the in-memory table
  /// still holds the record.
  pub async fn append(&mut self, record: AnalysisRecord) -> Result<()> {
    let category = record.category;
    let fake = record.is_fake();
    debug!(%category, id = %record.id, fake, "appending analysis");

    let table = self.tables.entry(category).or_default();
    table.retain(|r| r.id != record.id);
    table.insert(0, record);
    table.truncate(HISTORY_CAPACITY);

    self.persist(category).await
  }

  /// The records of `category` that pass `filter`, most recent first.
  pub fn list(
    &self,
    category: Category,
    filter: HistoryFilter,
  ) -> Vec<&AnalysisRecord> {
    self
      .table(category)
      .iter()
      .filter(|r| filter.matches(r))
      .collect()
  }

  /// Empty `category` and delete its storage key.
  pub async fn clear(&mut self, category: Category) -> Result<()> {
    if let Some(table) = self.tables.get_mut(&category) {
      table.clear();
    }
    debug!(%category, "history cleared");
    self
      .storage
      .remove(&category.storage_key())
      .await
      .map_err(Error::storage)
  }

  /// Look `id` up in the image, video, then audio table.
  pub fn find(&self, id: &str) -> Option<&AnalysisRecord> {
    self.tables.values().flatten().find(|r| r.id == id)
  }

  /// Attach, overwrite, or (with `None`) remove the feedback on record `id`
  /// and persist its table. Returns `None` when no such record exists.
  pub async fn set_feedback(
    &mut self,
    id: &str,
    feedback: Option<Feedback>,
  ) -> Result<Option<&AnalysisRecord>> {
    let Some(record) = self
      .tables
      .values_mut()
      .flatten()
      .find(|r| r.id == id)
    else {
      return Ok(None);
    };
    record.feedback = feedback;
    let category = record.category;

    self.persist(category).await?;
    Ok(self.find(id))
  }

  pub fn stats(&self) -> AggregateStats {
    let mut stats = AggregateStats::default();
    for category in Category::iter() {
      stats.per_category.insert(category, 0);
    }
    for record in self.tables.values().flatten() {
      stats.add(record);
    }
    stats
  }

  fn table(&self, category: Category) -> &[AnalysisRecord] {
    self.tables.get(&category).map(Vec::as_slice).unwrap_or(&[])
  }

  async fn persist(&self, category: Category) -> Result<()> {
    let json = serde_json::to_string(self.table(category))?;
    self
      .storage
      .set(&category.storage_key(), &json)
      .await
      .map_err(Error::storage)
  }
}
