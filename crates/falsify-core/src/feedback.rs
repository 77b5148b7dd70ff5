//! The feedback workflow: recording a user's verdict on a ledger record and
//! telling the backend about it.
//!
//! Two notifications leave the process after a submission, with different
//! failure semantics:
//!
//! | notification         | sent when          | on failure                         |
//! |----------------------|--------------------|------------------------------------|
//! | feedback collection  | every submission   | logged, never returned             |
//! | learning update      | corrections only   | returned through the join handle   |
//!
//! Neither outcome touches the ledger: feedback is durable locally as soon as
//! the owning table has been persisted.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
  Result,
  category::Category,
  ledger::HistoryLedger,
  record::{AnalysisRecord, Feedback},
  storage::HistoryStorage,
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// What the user said about a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackInput {
  /// The model was right.
  Agree,
  /// The model was wrong; the content is actually fake (`true`) or authentic.
  Correct { actually_fake: bool },
}

impl FeedbackInput {
  pub fn agrees(self) -> bool { matches!(self, Self::Agree) }
}

// ─── Wire payloads ───────────────────────────────────────────────────────────

/// The `userFeedback` object both endpoints read. The backend keys on
/// `actualResult` and rejects a notice without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPayload {
  pub is_correct:    bool,
  /// `true` means fake.
  pub actual_result: bool,
  pub timestamp:     DateTime<Utc>,
  pub confidence:    f64,
}

impl From<&Feedback> for FeedbackPayload {
  fn from(feedback: &Feedback) -> Self {
    Self {
      is_correct:    feedback.agrees_with_model,
      actual_result: feedback.corrected_label,
      timestamp:     feedback.submitted_at,
      confidence:    feedback.confidence_at_time_of_feedback,
    }
  }
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackNotice {
  pub analysis_id:   String,
  pub filename:      String,
  #[serde(rename = "type")]
  pub category:      Category,
  pub ai_prediction: bool,
  pub ai_confidence: f64,
  pub user_feedback: FeedbackPayload,
  /// When the analysis was recorded.
  pub timestamp:     DateTime<Utc>,
}

impl FeedbackNotice {
  pub fn new(record: &AnalysisRecord, feedback: &Feedback) -> Self {
    Self {
      analysis_id:   record.id.clone(),
      filename:      record.filename.clone(),
      category:      record.category,
      ai_prediction: record.is_fake(),
      ai_confidence: record.summary.as_ref().map_or(0.0, |s| s.confidence),
      user_feedback: feedback.into(),
      timestamp:     record.created_at,
    }
  }
}

/// Body of `POST /update_learning`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningUpdate {
  pub analysis_id:   String,
  pub filename:      String,
  #[serde(rename = "type")]
  pub category:      Category,
  pub user_feedback: FeedbackPayload,
  pub timestamp:     DateTime<Utc>,
}

impl LearningUpdate {
  pub fn new(record: &AnalysisRecord, feedback: &Feedback) -> Self {
    Self {
      analysis_id:   record.id.clone(),
      filename:      record.filename.clone(),
      category:      record.category,
      user_feedback: feedback.into(),
      timestamp:     record.created_at,
    }
  }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

/// The external collaborators that receive feedback.
pub trait FeedbackNotifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Deliver a notice to the feedback-collection endpoint.
  fn send_feedback(
    &self,
    notice: FeedbackNotice,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Tell the learning system about a correction.
  fn update_learning(
    &self,
    update: LearningUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Handles for a submission's notification tasks.
pub struct FeedbackReceipt<E> {
  /// The feedback now stored on the record.
  pub feedback:     Feedback,
  /// Fire-and-forget delivery. Awaiting it only waits for completion.
  pub notification: JoinHandle<()>,
  /// Learning-system update, present for corrections only.
  pub learning:     Option<JoinHandle<Result<(), E>>>,
}

pub struct FeedbackWorkflow<N> {
  notifier: Arc<N>,
}

impl<N> Clone for FeedbackWorkflow<N> {
  fn clone(&self) -> Self { Self { notifier: Arc::clone(&self.notifier) } }
}

impl<N> FeedbackWorkflow<N>
where
  N: FeedbackNotifier + 'static,
{
  pub fn new(notifier: Arc<N>) -> Self { Self { notifier } }

  /// Record `input` as the feedback on record `id`, overwriting any earlier
  /// feedback, persist the owning table, and spawn the notifications.
  ///
  /// Returns `Ok(None)` without side effects when `id` is unknown. Must be
  /// called from within a tokio runtime.
  pub async fn submit_feedback<S: HistoryStorage>(
    &self,
    ledger: &mut HistoryLedger<S>,
    id: &str,
    input: FeedbackInput,
  ) -> Result<Option<FeedbackReceipt<N::Error>>> {
    let Some(record) = ledger.find(id) else {
      debug!(id, "feedback for unknown record ignored");
      return Ok(None);
    };

    let (model_fake, confidence) = record
      .summary
      .as_ref()
      .map_or((false, 0.0), |s| (s.overall_fake, s.confidence));
    let feedback = Feedback {
      agrees_with_model:              input.agrees(),
      corrected_label:                match input {
        FeedbackInput::Agree => model_fake,
        FeedbackInput::Correct { actually_fake } => actually_fake,
      },
      submitted_at:                   Utc::now(),
      confidence_at_time_of_feedback: confidence,
    };
    let notice = FeedbackNotice::new(record, &feedback);
    let update = (!input.agrees()).then(|| LearningUpdate::new(record, &feedback));

    ledger.set_feedback(id, Some(feedback.clone())).await?;
    debug!(id, agrees = input.agrees(), "feedback recorded");

    let notifier = Arc::clone(&self.notifier);
    let notification = tokio::spawn(async move {
      let analysis_id = notice.analysis_id.clone();
      match notifier.send_feedback(notice).await {
        Ok(()) => debug!(%analysis_id, "feedback delivered"),
        Err(e) => warn!(%analysis_id, error = %e, "failed to deliver feedback"),
      }
    });

    let learning = update.map(|update| {
      let notifier = Arc::clone(&self.notifier);
      tokio::spawn(async move { notifier.update_learning(update).await })
    });

    Ok(Some(FeedbackReceipt { feedback, notification, learning }))
  }

  /// Remove the feedback from record `id` and persist the owning table.
  ///
  /// Returns `false` when `id` is unknown.
  pub async fn clear_feedback<S: HistoryStorage>(
    &self,
    ledger: &mut HistoryLedger<S>,
    id: &str,
  ) -> Result<bool> {
    let cleared = ledger.set_feedback(id, None).await?.is_some();
    if !cleared {
      debug!(id, "clearing feedback on unknown record ignored");
    }
    Ok(cleared)
  }
}
