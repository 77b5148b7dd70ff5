//! Analysis records, the unit stored in a history table.
//!
//! A record is created exactly once per successful upload. Its identity,
//! category, payload, and summary never change afterwards; only the
//! [`Feedback`] annotation is attached, overwritten, or cleared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, category::Category, payload::RawResult};

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Verdict derived from a [`RawResult`] at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub overall_fake: bool,
  /// Always within `[0, 1]`.
  pub confidence:   f64,
  pub details:      SummaryDetail,
}

/// Category-specific figures that accompany the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SummaryDetail {
  Image(ImageSummary),
  Video(VideoSummary),
  Audio(AudioSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
  /// Detections that carry a face id.
  pub total_faces:           usize,
  pub fake_faces:            usize,
  pub ai_generated_content:  usize,
  pub deepfake_detected:     bool,
  pub ai_generated_detected: bool,
  pub overall_ai_score:      f64,
  pub generation_method:     String,
  pub authenticity:          String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
  pub total_frames:          usize,
  pub fake_frames:           usize,
  pub ai_generated_frames:   usize,
  pub deepfake_detected:     bool,
  pub ai_generated_detected: bool,
  pub overall_ai_score:      f64,
  pub temporal_consistency:  f64,
  pub recommendation:        String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSummary {
  /// Clip length in seconds, when the backend reports it.
  pub duration:              Option<f64>,
  pub deepfake_detected:     bool,
  pub ai_generated_detected: bool,
  pub overall_ai_score:      f64,
  pub generation_method:     String,
  pub authenticity:          String,
  pub confidence_level:      String,
}

// ─── Feedback ────────────────────────────────────────────────────────────────

/// A user's confirmation or correction of a record's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub agrees_with_model:              bool,
  /// The label the user says is true: `true` means fake.
  pub corrected_label:                bool,
  pub submitted_at:                   DateTime<Utc>,
  pub confidence_at_time_of_feedback: f64,
}

// ─── AnalysisRecord ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
  pub id:         String,
  #[serde(rename = "type")]
  pub category:   Category,
  pub filename:   String,
  pub created_at: DateTime<Utc>,
  pub raw_result: RawResult,
  /// Absent only on records restored from data written without one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary:    Option<Summary>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub feedback:   Option<Feedback>,
}

impl AnalysisRecord {
  /// Build a record from an already-decoded payload, deriving its summary.
  pub fn new(
    id: impl Into<String>,
    filename: impl Into<String>,
    raw_result: RawResult,
  ) -> Self {
    let summary = raw_result.summarize();
    Self {
      id: id.into(),
      category: raw_result.category(),
      filename: filename.into(),
      created_at: Utc::now(),
      raw_result,
      summary: Some(summary),
      feedback: None,
    }
  }

  /// Decode a backend `results` payload for `category` and build the record.
  ///
  /// Uses `analysis_id` when the backend supplied a non-empty one, otherwise
  /// a millisecond timestamp.
  pub fn from_backend(
    category: Category,
    filename: impl Into<String>,
    analysis_id: Option<String>,
    results: serde_json::Value,
  ) -> Result<Self> {
    let raw = RawResult::decode(category, results)?;
    let id = analysis_id
      .filter(|id| !id.trim().is_empty())
      .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());
    Ok(Self::new(id, filename, raw))
  }

  pub fn is_fake(&self) -> bool {
    self.summary.as_ref().is_some_and(|s| s.overall_fake)
  }

  /// Whether the user confirmed the verdict, if feedback exists.
  pub fn model_was_right(&self) -> Option<bool> {
    self.feedback.as_ref().map(|f| f.corrected_label == self.is_fake())
  }
}
