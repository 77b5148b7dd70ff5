//! Tests for `BackendClient` against an in-process axum backend.

use std::{
  path::Path,
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Multipart, State},
  http::StatusCode,
  routing::post,
};
use chrono::Utc;
use falsify_core::{
  Category, HistoryLedger,
  feedback::{
    FeedbackInput, FeedbackNotice, FeedbackNotifier, FeedbackWorkflow, LearningUpdate,
  },
  record::{AnalysisRecord, Feedback},
  storage::MemoryStorage,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

use crate::{BackendClient, ClientConfig, Error};

// ─── Mock backend ────────────────────────────────────────────────────────────

/// JSON bodies received, tagged with the route that got them.
#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<(&'static str, Value)>>>);

impl Seen {
  fn push(&self, route: &'static str, body: Value) {
    self.0.lock().unwrap().push((route, body));
  }

  fn bodies(&self, route: &str) -> Vec<Value> {
    self
      .0
      .lock()
      .unwrap()
      .iter()
      .filter(|(r, _)| *r == route)
      .map(|(_, b)| b.clone())
      .collect()
  }
}

/// Mirrors the backend: a notice without `userFeedback.actualResult` is
/// rejected.
async fn feedback(State(seen): State<Seen>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
  let has_result = body
    .get("userFeedback")
    .and_then(|f| f.get("actualResult"))
    .is_some_and(Value::is_boolean);
  seen.push("feedback", body);
  if !has_result {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({ "error": "Missing user_correction" })),
    );
  }
  (
    StatusCode::OK,
    Json(json!({ "was_correct": false, "learning_updated": true })),
  )
}

async fn upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
  while let Ok(Some(field)) = multipart.next_field().await {
    if field.name() != Some("file") {
      continue;
    }
    let name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.unwrap_or_default();
    if bytes.is_empty() {
      return (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No file selected" })),
      );
    }
    return (
      StatusCode::OK,
      Json(json!({
        "results": [
          { "face_id": 0, "is_fake": true, "confidence": 0.9, "received": name }
        ],
        "analysis_id": 1_700_000_000_000u64
      })),
    );
  }
  (StatusCode::BAD_REQUEST, Json(json!({ "error": "No file part" })))
}

fn backend(seen: Seen) -> Router {
  Router::new()
    .route("/upload", post(upload))
    .route("/feedback", post(feedback))
    .route(
      "/update_learning",
      post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
        seen.push("update_learning", body);
        Json(json!({ "status": "success", "updated_count": 1 }))
      }),
    )
    .with_state(seen)
}

async fn serve(app: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}")
}

fn client(base_url: String) -> BackendClient {
  BackendClient::new(ClientConfig {
    base_url,
    timeout: Duration::from_secs(5),
  })
  .expect("client")
}

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
  let path = dir.path().join(name);
  std::fs::write(&path, contents).unwrap();
  path
}

fn notice() -> FeedbackNotice {
  let record = AnalysisRecord::from_backend(
    Category::Image,
    "face.jpg",
    Some("42".into()),
    json!([{ "face_id": 0, "is_fake": true, "confidence": 0.8 }]),
  )
  .unwrap();
  let feedback = Feedback {
    agrees_with_model:              false,
    corrected_label:                false,
    submitted_at:                   Utc::now(),
    confidence_at_time_of_feedback: 0.8,
  };
  FeedbackNotice::new(&record, &feedback)
}

// ─── Upload ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_sends_file_and_returns_results() {
  let base = serve(backend(Seen::default())).await;
  let dir = TempDir::new().unwrap();
  let path = write_file(&dir, "face.jpg", b"\xff\xd8\xff");

  let resp = client(base).upload(&path).await.unwrap();

  assert_eq!(resp.analysis_id.as_deref(), Some("1700000000000"));
  assert_eq!(resp.results[0]["received"], "face.jpg");

  let record = AnalysisRecord::from_backend(
    Category::Image,
    "face.jpg",
    resp.analysis_id,
    resp.results,
  )
  .unwrap();
  assert_eq!(record.id, "1700000000000");
  assert!(record.is_fake());
}

#[tokio::test]
async fn upload_error_status_carries_message() {
  let base = serve(backend(Seen::default())).await;
  let dir = TempDir::new().unwrap();
  let path = write_file(&dir, "empty.jpg", b"");

  let err = client(base).upload(&path).await.unwrap_err();

  match err {
    Error::Status { status, message, .. } => {
      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert_eq!(message.as_deref(), Some("No file selected"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[tokio::test]
async fn upload_error_body_is_an_error() {
  let app = Router::new().route(
    "/upload",
    post(|| async { Json(json!({ "error": "Unsupported file type" })) }),
  );
  let base = serve(app).await;
  let dir = TempDir::new().unwrap();
  let path = write_file(&dir, "clip.mp4", b"data");

  let err = client(base).upload(&path).await.unwrap_err();

  assert!(
    matches!(&err, Error::Backend { message, .. } if message == "Unsupported file type"),
    "{err}"
  );
}

#[tokio::test]
async fn upload_non_json_body_is_a_decode_error() {
  let app = Router::new().route("/upload", post(|| async { "<html>oops</html>" }));
  let base = serve(app).await;
  let dir = TempDir::new().unwrap();
  let path = write_file(&dir, "voice.wav", b"RIFF");

  let err = client(base).upload(&path).await.unwrap_err();

  assert!(matches!(err, Error::Decode { .. }), "{err}");
}

#[tokio::test]
async fn upload_missing_file_fails_before_any_request() {
  let err = client("http://127.0.0.1:9".into())
    .upload(Path::new("/definitely/not/here.png"))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Read { .. }), "{err}");
}

#[tokio::test]
async fn unreachable_backend_is_an_http_error() {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let err = client(format!("http://{addr}"))
    .send_feedback(notice())
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Http { .. }), "{err}");
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_body_is_accepted_by_backend() {
  let seen = Seen::default();
  let base = serve(backend(seen.clone())).await;

  client(base).send_feedback(notice()).await.unwrap();

  let bodies = seen.bodies("feedback");
  assert_eq!(bodies.len(), 1);
  let body = &bodies[0];
  assert_eq!(body["analysisId"], "42");
  assert_eq!(body["type"], "image");
  assert_eq!(body["aiPrediction"], true);
  assert_eq!(body["userFeedback"]["isCorrect"], false);
  assert_eq!(body["userFeedback"]["actualResult"], false);
  assert_eq!(body["userFeedback"]["confidence"], 0.8);
}

#[tokio::test]
async fn feedback_without_actual_result_is_rejected() {
  let base = serve(backend(Seen::default())).await;
  let http = reqwest::Client::new();

  let resp = http
    .post(format!("{base}/feedback"))
    .json(&json!({ "analysisId": "42", "userFeedback": { "correctedLabel": false } }))
    .send()
    .await
    .unwrap();

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn learning_failure_carries_message() {
  let app = Router::new().route(
    "/update_learning",
    post(|| async {
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to update learning system" })),
      )
    }),
  );
  let base = serve(app).await;
  let record = AnalysisRecord::from_backend(
    Category::Image,
    "face.jpg",
    Some("7".into()),
    json!([{ "face_id": 0, "is_fake": false, "confidence": 0.6 }]),
  )
  .unwrap();
  let update = LearningUpdate {
    analysis_id:   record.id.clone(),
    filename:      record.filename.clone(),
    category:      record.category,
    user_feedback: notice().user_feedback,
    timestamp:     record.created_at,
  };

  let err = client(base).update_learning(update).await.unwrap_err();

  assert!(err.to_string().contains("Failed to update learning system"), "{err}");
}

#[tokio::test]
async fn workflow_delivers_both_notifications() {
  let seen = Seen::default();
  let base = serve(backend(seen.clone())).await;
  let backend = Arc::new(client(base));
  let dir = TempDir::new().unwrap();
  let path = write_file(&dir, "face.jpg", b"\xff\xd8\xff");

  let resp = backend.upload(&path).await.unwrap();
  let record = AnalysisRecord::from_backend(
    Category::Image,
    "face.jpg",
    resp.analysis_id,
    resp.results,
  )
  .unwrap();
  let id = record.id.clone();
  let mut ledger = HistoryLedger::open(MemoryStorage::new()).await;
  ledger.append(record).await.unwrap();

  let receipt = FeedbackWorkflow::new(backend)
    .submit_feedback(&mut ledger, &id, FeedbackInput::Correct { actually_fake: false })
    .await
    .unwrap()
    .expect("record exists");
  receipt.notification.await.unwrap();
  receipt.learning.expect("correction").await.unwrap().unwrap();

  assert_eq!(seen.bodies("feedback").len(), 1);
  let updates = seen.bodies("update_learning");
  assert_eq!(updates.len(), 1);
  assert_eq!(updates[0]["analysisId"], id.as_str());
  assert_eq!(updates[0]["userFeedback"]["actualResult"], false);
}
