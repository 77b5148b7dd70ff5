//! Tests for `SqliteStorage`, alone and underneath a `HistoryLedger`.

use falsify_core::{
  Category, HistoryFilter, HistoryLedger,
  payload::{ImageDetection, ImageResults, RawResult},
  record::AnalysisRecord,
  storage::HistoryStorage,
};
use tempfile::TempDir;

use crate::SqliteStorage;

async fn store() -> SqliteStorage {
  SqliteStorage::open_in_memory()
    .await
    .expect("in-memory store")
}

fn record(id: &str, fake: bool) -> AnalysisRecord {
  AnalysisRecord::new(
    id,
    format!("{id}.jpg"),
    RawResult::Image(ImageResults {
      detections: vec![ImageDetection {
        is_fake: fake,
        confidence: Some(0.75),
        ..Default::default()
      }],
      summary:    None,
    }),
  )
}

// ─── Key-value behaviour ─────────────────────────────────────────────────────

#[tokio::test]
async fn get_missing_key_returns_none() {
  let s = store().await;
  assert!(s.get("imageHistory").await.unwrap().is_none());
  assert!(s.updated_at("imageHistory").await.unwrap().is_none());
}

#[tokio::test]
async fn set_then_get() {
  let s = store().await;
  s.set("videoHistory", "[]").await.unwrap();

  assert_eq!(s.get("videoHistory").await.unwrap().as_deref(), Some("[]"));
  assert!(s.updated_at("videoHistory").await.unwrap().is_some());
}

#[tokio::test]
async fn set_replaces_previous_value() {
  let s = store().await;
  s.set("audioHistory", "[1]").await.unwrap();
  s.set("audioHistory", "[2]").await.unwrap();

  assert_eq!(s.get("audioHistory").await.unwrap().as_deref(), Some("[2]"));
}

#[tokio::test]
async fn remove_deletes_and_tolerates_absent_keys() {
  let s = store().await;
  s.set("imageHistory", "[]").await.unwrap();

  s.remove("imageHistory").await.unwrap();
  s.remove("imageHistory").await.unwrap();

  assert!(s.get("imageHistory").await.unwrap().is_none());
}

// ─── On disk ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_creates_parent_directories() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("nested/deeper/history.db");

  SqliteStorage::open(&path).await.unwrap();

  assert!(path.exists());
}

#[tokio::test]
async fn ledger_survives_reopen() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("history.db");

  {
    let mut ledger = HistoryLedger::open(SqliteStorage::open(&path).await.unwrap()).await;
    ledger.append(record("1", true)).await.unwrap();
    ledger.append(record("2", false)).await.unwrap();
  }

  let ledger = HistoryLedger::open(SqliteStorage::open(&path).await.unwrap()).await;
  let ids: Vec<_> = ledger
    .list(Category::Image, HistoryFilter::All)
    .iter()
    .map(|r| r.id.as_str())
    .collect();
  assert_eq!(ids, ["2", "1"]);
  assert_eq!(ledger.list(Category::Image, HistoryFilter::Fake).len(), 1);
}

#[tokio::test]
async fn ledger_clear_removes_row() {
  let s = store().await;
  let mut ledger = HistoryLedger::open(s.clone()).await;
  ledger.append(record("1", false)).await.unwrap();
  assert!(s.get("imageHistory").await.unwrap().is_some());

  ledger.clear(Category::Image).await.unwrap();

  assert!(s.get("imageHistory").await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_row_restores_as_empty() {
  let s = store().await;
  s.set("videoHistory", "[{\"id\":").await.unwrap();

  let ledger = HistoryLedger::open(s).await;

  assert!(ledger.list(Category::Video, HistoryFilter::All).is_empty());
}
