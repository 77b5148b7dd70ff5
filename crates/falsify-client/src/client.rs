//! Async HTTP client wrapping the detection backend's endpoints.

use std::{path::Path, time::Duration};

use falsify_core::feedback::{FeedbackNotice, FeedbackNotifier, LearningUpdate};
use reqwest::{
  Client, RequestBuilder,
  multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:5000".to_string(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// What `POST /upload` hands back on success.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResponse {
  /// Category-specific analysis payload, not yet decoded.
  pub results:     Value,
  /// Backend-assigned id, when the backend supplied a usable one.
  pub analysis_id: Option<String>,
}

/// Every endpoint answers with some subset of these fields.
#[derive(Debug, Default, Deserialize)]
struct Reply {
  #[serde(default)]
  results:     Option<Value>,
  #[serde(default)]
  analysis_id: Option<Value>,
  #[serde(default)]
  error:       Option<String>,
}

/// Async client for the detection backend.
///
/// Cheap to clone, the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct BackendClient {
  client: Client,
  config: ClientConfig,
}

impl BackendClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(Error::Build)?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Analysis ──────────────────────────────────────────────────────────────

  /// `POST /upload` with the file at `path` as multipart field `file`.
  pub async fn upload(&self, path: &Path) -> Result<UploadResponse> {
    const ENDPOINT: &str = "POST /upload";

    let bytes = tokio::fs::read(path).await.map_err(|source| Error::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());
    debug!(file = %name, size = bytes.len(), "uploading");

    let form = Form::new().part("file", Part::bytes(bytes).file_name(name));
    let reply = self
      .send(ENDPOINT, self.client.post(self.url("/upload")).multipart(form))
      .await?;

    let results = reply.results.ok_or_else(|| Error::Backend {
      endpoint: ENDPOINT,
      message:  "response carried no results".to_string(),
    })?;
    Ok(UploadResponse {
      results,
      analysis_id: reply.analysis_id.and_then(id_string),
    })
  }

  // ── Plumbing ──────────────────────────────────────────────────────────────

  async fn post_json<T: Serialize>(
    &self,
    endpoint: &'static str,
    path: &str,
    body: &T,
  ) -> Result<()> {
    self
      .send(endpoint, self.client.post(self.url(path)).json(body))
      .await
      .map(drop)
  }

  /// Send `req` and turn non-2xx statuses and `{error}` bodies into errors.
  async fn send(
    &self,
    endpoint: &'static str,
    req: RequestBuilder,
  ) -> Result<Reply> {
    let resp = req
      .send()
      .await
      .map_err(|source| Error::Http { endpoint, source })?;
    let status = resp.status();
    let body = resp
      .text()
      .await
      .map_err(|source| Error::Http { endpoint, source })?;

    let reply = if body.trim().is_empty() {
      Ok(Reply::default())
    } else {
      serde_json::from_str::<Reply>(&body)
    };

    if !status.is_success() {
      return Err(Error::Status {
        endpoint,
        status,
        message: reply.ok().and_then(|r| r.error),
      });
    }

    let reply = reply.map_err(|source| Error::Decode { endpoint, source })?;
    if let Some(message) = reply.error {
      return Err(Error::Backend { endpoint, message });
    }
    debug!(endpoint, %status, "backend replied");
    Ok(reply)
  }
}

impl FeedbackNotifier for BackendClient {
  type Error = Error;

  /// `POST /feedback`
  async fn send_feedback(&self, notice: FeedbackNotice) -> Result<()> {
    self.post_json("POST /feedback", "/feedback", &notice).await
  }

  /// `POST /update_learning`
  async fn update_learning(&self, update: LearningUpdate) -> Result<()> {
    self
      .post_json("POST /update_learning", "/update_learning", &update)
      .await
  }
}

/// Backends send the id as either a number or a string.
fn id_string(value: Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}
