//! Plain-text rendering of records, history lists, and statistics.

use chrono::{DateTime, Utc};
use falsify_core::{
  record::{AnalysisRecord, SummaryDetail},
  stats::AggregateStats,
};

/// `0.873` → `"87.3%"`.
pub fn percent(fraction: f64) -> String { format!("{:.1}%", fraction * 100.0) }

pub fn verdict(fake: bool) -> &'static str {
  if fake { "FAKE DETECTED" } else { "AUTHENTIC" }
}

fn label(fake: bool) -> &'static str { if fake { "FAKE" } else { "AUTHENTIC" } }

fn detected(flag: bool) -> &'static str { if flag { "DETECTED" } else { "CLEAR" } }

fn feedback_status(record: &AnalysisRecord) -> &'static str {
  match record.model_was_right() {
    Some(true) => "correct",
    Some(false) => "incorrect",
    None => "pending",
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

pub fn history_header() -> String {
  format!(
    "{:<15} {:<16}  {:<13} {:>6}  {:<9}  {}",
    "ID", "DATE", "VERDICT", "CONF", "FEEDBACK", "FILE"
  )
}

pub fn history_row(record: &AnalysisRecord) -> String {
  let confidence = record
    .summary
    .as_ref()
    .map_or_else(|| "-".to_string(), |s| percent(s.confidence));
  format!(
    "{:<15} {:<16}  {:<13} {:>6}  {:<9}  {}",
    record.id,
    record.created_at.format("%Y-%m-%d %H:%M"),
    verdict(record.is_fake()),
    confidence,
    feedback_status(record),
    record.filename,
  )
}

pub fn last_saved(at: DateTime<Utc>) -> String {
  format!("last saved {}", at.format("%Y-%m-%d %H:%M:%S UTC"))
}

// ─── Result card ─────────────────────────────────────────────────────────────

pub fn card(record: &AnalysisRecord) -> String {
  let mut lines = vec![
    format!("{} analysis of {}", record.category, record.filename),
    format!("  id:                   {}", record.id),
    format!(
      "  recorded:             {}",
      record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ),
  ];

  let Some(summary) = &record.summary else {
    lines.push("  verdict:              unavailable".to_string());
    return lines.join("\n");
  };

  lines.push(format!(
    "  verdict:              {} ({} confidence)",
    verdict(summary.overall_fake),
    percent(summary.confidence)
  ));

  match &summary.details {
    SummaryDetail::Image(s) => lines.extend([
      format!("  faces detected:       {}", s.total_faces),
      format!("  deepfake faces:       {}", s.fake_faces),
      format!("  ai-generated content: {}", s.ai_generated_content),
      format!("  overall ai score:     {}", percent(s.overall_ai_score)),
      format!("  generation method:    {}", s.generation_method),
      format!("  assessment:           {}", s.authenticity),
      format!("  deepfake detection:   {}", detected(s.deepfake_detected)),
      format!("  ai generation:        {}", detected(s.ai_generated_detected)),
    ]),
    SummaryDetail::Video(s) => lines.extend([
      format!("  frames analyzed:      {}", s.total_frames),
      format!("  deepfake frames:      {}", s.fake_frames),
      format!("  ai-generated frames:  {}", s.ai_generated_frames),
      format!("  overall ai score:     {}", percent(s.overall_ai_score)),
      format!("  temporal consistency: {}", percent(s.temporal_consistency)),
      format!("  assessment:           {}", s.recommendation),
      format!("  deepfake detection:   {}", detected(s.deepfake_detected)),
      format!("  ai generation:        {}", detected(s.ai_generated_detected)),
    ]),
    SummaryDetail::Audio(s) => lines.extend([
      format!(
        "  duration:             {}",
        s.duration
          .map_or_else(|| "N/A".to_string(), |d| format!("{d:.1}s"))
      ),
      format!("  overall ai score:     {}", percent(s.overall_ai_score)),
      format!("  generation method:    {}", s.generation_method),
      format!("  confidence level:     {}", s.confidence_level),
      format!("  assessment:           {}", s.authenticity),
      format!("  voice cloning:        {}", detected(s.deepfake_detected)),
      format!("  ai generation:        {}", detected(s.ai_generated_detected)),
    ]),
  }

  lines.push(match &record.feedback {
    None => "  feedback:             none yet".to_string(),
    Some(f) if f.agrees_with_model => {
      "  feedback:             model was correct".to_string()
    }
    Some(f) => format!(
      "  feedback:             model was incorrect, actually {}",
      label(f.corrected_label)
    ),
  });

  lines.join("\n")
}

// ─── Statistics ──────────────────────────────────────────────────────────────

pub fn stats(stats: &AggregateStats) -> String {
  let mut lines = vec![
    format!("total analyses:  {}", stats.total),
    format!("fake detected:   {}", stats.fake_detected),
  ];
  lines.extend(
    stats
      .per_category
      .iter()
      .map(|(category, count)| format!("  {:<14} {count}", format!("{category}:"))),
  );
  lines.push(format!(
    "feedback given:  {} ({} agreed)",
    stats.feedback_count, stats.agreed_count
  ));
  lines.push(format!(
    "model accuracy:  {}",
    stats.accuracy().map_or_else(|| "N/A".to_string(), percent)
  ));
  lines.join("\n")
}
