//! Backend result payloads and the summaries derived from them.
//!
//! The analysis backend answers with a differently shaped `results` value per
//! category. [`RawResult::decode`] validates that value at the boundary and
//! [`RawResult::summarize`] derives the record's verdict from it. Fields the
//! backend sends that are not modelled here are kept in `extra` maps so the
//! stored payload stays faithful.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  Error, Result,
  category::Category,
  record::{AudioSummary, ImageSummary, Summary, SummaryDetail, VideoSummary},
};

/// An AI-likelihood score above this marks content as generated.
pub const AI_SCORE_THRESHOLD: f64 = 0.7;

/// Share of frames that must be flagged before a whole video is flagged.
pub const FRAME_RATIO_THRESHOLD: f64 = 0.3;

// ─── RawResult ───────────────────────────────────────────────────────────────

/// The decoded backend payload, one variant per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum RawResult {
  Image(ImageResults),
  Video(VideoResults),
  Audio(AudioResults),
}

impl RawResult {
  /// Validate `value` against the shape expected for `category`.
  pub fn decode(category: Category, value: Value) -> Result<Self> {
    match category {
      Category::Image => decode_image(value).map(Self::Image),
      Category::Video => decode_video(value).map(Self::Video),
      Category::Audio => decode_audio(value).map(Self::Audio),
    }
  }

  pub fn category(&self) -> Category {
    match self {
      Self::Image(_) => Category::Image,
      Self::Video(_) => Category::Video,
      Self::Audio(_) => Category::Audio,
    }
  }

  pub fn summarize(&self) -> Summary {
    match self {
      Self::Image(r) => r.summarize(),
      Self::Video(r) => r.summarize(),
      Self::Audio(r) => r.summarize(),
    }
  }
}

fn malformed(category: Category, reason: impl ToString) -> Error {
  Error::MalformedPayload { category, reason: reason.to_string() }
}

/// Arithmetic mean; zero for an empty input.
fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
  let (sum, n) = values
    .into_iter()
    .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
  if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Clamp into `[0, 1]`, mapping NaN to zero.
fn unit(x: f64) -> f64 {
  if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

// ─── Image ───────────────────────────────────────────────────────────────────

/// One face or whole-image detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDetection {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub face_id:           Option<Value>,
  #[serde(default)]
  pub is_fake:           bool,
  #[serde(default)]
  pub ai_generated:      bool,
  #[serde(default)]
  pub is_ai_generated:   bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confidence:        Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_confidence:     Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub generation_method: Option<String>,
  #[serde(flatten)]
  pub extra:             Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSummaryBlock {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_generated_likelihood:    Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub detected_generation_method: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overall_authenticity:       Option<String>,
  #[serde(flatten)]
  pub extra:                      Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResults {
  pub detections: Vec<ImageDetection>,
  pub summary:    Option<ImageSummaryBlock>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImageItem {
  Summary { image_summary: ImageSummaryBlock },
  Detection(ImageDetection),
}

fn decode_image(value: Value) -> Result<ImageResults> {
  let items: Vec<ImageItem> = serde_json::from_value(value)
    .map_err(|e| malformed(Category::Image, e))?;

  let mut results = ImageResults::default();
  for item in items {
    match item {
      ImageItem::Summary { image_summary } => {
        results.summary.get_or_insert(image_summary);
      }
      ImageItem::Detection(d) => results.detections.push(d),
    }
  }
  Ok(results)
}

impl ImageResults {
  fn summarize(&self) -> Summary {
    let fake_faces = self.detections.iter().filter(|d| d.is_fake).count();
    let ai_generated_content = self
      .detections
      .iter()
      .filter(|d| d.ai_generated || d.is_ai_generated)
      .count();
    let average = mean(
      self
        .detections
        .iter()
        .flat_map(|d| d.confidence.into_iter().chain(d.ai_confidence)),
    );
    let block = self.summary.as_ref();
    let overall_ai_score = block
      .and_then(|s| s.ai_generated_likelihood)
      .unwrap_or(0.0);

    let deepfake_detected = fake_faces > 0;
    let ai_generated_detected =
      ai_generated_content > 0 || overall_ai_score > AI_SCORE_THRESHOLD;

    Summary {
      overall_fake: deepfake_detected || ai_generated_detected,
      confidence:   unit(average.max(overall_ai_score)),
      details:      SummaryDetail::Image(ImageSummary {
        total_faces: self
          .detections
          .iter()
          .filter(|d| d.face_id.is_some())
          .count(),
        fake_faces,
        ai_generated_content,
        deepfake_detected,
        ai_generated_detected,
        overall_ai_score,
        generation_method: block
          .and_then(|s| s.detected_generation_method.clone())
          .unwrap_or_else(|| "Unknown".into()),
        authenticity: block
          .and_then(|s| s.overall_authenticity.clone())
          .unwrap_or_else(|| "UNKNOWN".into()),
      }),
    }
  }
}

// ─── Video ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
  #[serde(default)]
  pub is_fake:    bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confidence: Option<f64>,
  #[serde(flatten)]
  pub extra:      Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAiDetail {
  #[serde(default)]
  pub is_ai_generated: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_confidence:   Option<f64>,
  #[serde(flatten)]
  pub extra:           Map<String, Value>,
}

/// Per-frame AI-generation signal. Older backends send a bare flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameAiSignal {
  Detailed(FrameAiDetail),
  Flag(bool),
}

impl FrameAiSignal {
  /// Only the detailed form counts towards the verdict.
  pub fn is_ai_generated(&self) -> bool {
    matches!(self, Self::Detailed(d) if d.is_ai_generated)
  }

  pub fn confidence(&self) -> Option<f64> {
    match self {
      Self::Detailed(d) => d.ai_confidence,
      Self::Flag(_) => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetection {
  pub frame:        u64,
  #[serde(default)]
  pub face:         Vec<FaceDetection>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_generated: Option<FrameAiSignal>,
  #[serde(flatten)]
  pub extra:        Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSummaryBlock {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overall_ai_score:           Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temporal_consistency_score: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub recommendation:             Option<String>,
  #[serde(flatten)]
  pub extra:                      Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoResults {
  pub frames:    Vec<FrameDetection>,
  pub summary:   Option<VideoSummaryBlock>,
  /// Items that are neither frames nor the summary, e.g. status notes.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub auxiliary: Vec<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VideoItem {
  Summary { video_summary: VideoSummaryBlock },
  Frame(FrameDetection),
  Other(Map<String, Value>),
}

fn decode_video(value: Value) -> Result<VideoResults> {
  let items: Vec<VideoItem> = serde_json::from_value(value)
    .map_err(|e| malformed(Category::Video, e))?;

  let mut results = VideoResults::default();
  for item in items {
    match item {
      VideoItem::Summary { video_summary } => {
        results.summary.get_or_insert(video_summary);
      }
      VideoItem::Frame(f) => results.frames.push(f),
      VideoItem::Other(m) => results.auxiliary.push(m),
    }
  }
  Ok(results)
}

impl VideoResults {
  fn summarize(&self) -> Summary {
    let total_frames = self.frames.len();
    let fake_frames = self
      .frames
      .iter()
      .filter(|f| f.face.iter().any(|face| face.is_fake))
      .count();
    let ai_generated_frames = self
      .frames
      .iter()
      .filter(|f| {
        f.ai_generated
          .as_ref()
          .is_some_and(FrameAiSignal::is_ai_generated)
      })
      .count();
    let average = mean(self.frames.iter().flat_map(|f| {
      f.face
        .iter()
        .filter_map(|face| face.confidence)
        .chain(f.ai_generated.as_ref().and_then(FrameAiSignal::confidence))
    }));
    let block = self.summary.as_ref();
    let overall_ai_score = block.and_then(|s| s.overall_ai_score).unwrap_or(0.0);

    let cutoff = total_frames as f64 * FRAME_RATIO_THRESHOLD;
    let deepfake_detected = fake_frames as f64 > cutoff;
    let ai_generated_detected = ai_generated_frames as f64 > cutoff;

    Summary {
      overall_fake: deepfake_detected
        || ai_generated_detected
        || overall_ai_score > AI_SCORE_THRESHOLD,
      confidence:   unit(average.max(overall_ai_score)),
      details:      SummaryDetail::Video(VideoSummary {
        total_frames,
        fake_frames,
        ai_generated_frames,
        deepfake_detected,
        ai_generated_detected,
        overall_ai_score,
        temporal_consistency: block
          .and_then(|s| s.temporal_consistency_score)
          .unwrap_or(0.0),
        recommendation: block
          .and_then(|s| s.recommendation.clone())
          .unwrap_or_else(|| "UNKNOWN".into()),
      }),
    }
  }
}

// ─── Audio ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioDetection {
  #[serde(default)]
  pub is_fake:           bool,
  #[serde(default)]
  pub ai_generated:      bool,
  #[serde(default)]
  pub is_ai_generated:   bool,
  #[serde(default)]
  pub confidence:        f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ai_confidence:     Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration:          Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub generation_method: Option<String>,
  #[serde(flatten)]
  pub extra:             Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSummaryBlock {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overall_ai_score:        Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub authenticity_assessment: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confidence_level:        Option<String>,
  #[serde(flatten)]
  pub extra:                   Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioResults {
  pub detection: AudioDetection,
  pub summary:   Option<AudioSummaryBlock>,
}

/// `{"audio": {...}, "audio_summary": {...}}`
#[derive(Deserialize)]
struct AudioObject {
  audio:         AudioDetection,
  #[serde(default)]
  audio_summary: Option<AudioSummaryBlock>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AudioItem {
  Summary { audio_summary: AudioSummaryBlock },
  Detection(AudioDetection),
}

fn decode_audio(value: Value) -> Result<AudioResults> {
  match value {
    Value::Object(_) => {
      let obj: AudioObject = serde_json::from_value(value)
        .map_err(|e| malformed(Category::Audio, e))?;
      Ok(AudioResults { detection: obj.audio, summary: obj.audio_summary })
    }
    Value::Array(_) => {
      let items: Vec<AudioItem> = serde_json::from_value(value)
        .map_err(|e| malformed(Category::Audio, e))?;

      let mut detection = None;
      let mut summary = None;
      for item in items {
        match item {
          AudioItem::Summary { audio_summary } => {
            summary.get_or_insert(audio_summary);
          }
          AudioItem::Detection(d) => {
            detection.get_or_insert(d);
          }
        }
      }
      let detection = detection
        .ok_or_else(|| malformed(Category::Audio, "no detection item"))?;
      Ok(AudioResults { detection, summary })
    }
    other => Err(malformed(
      Category::Audio,
      format!("expected an object or an array, got {other}"),
    )),
  }
}

impl AudioResults {
  fn summarize(&self) -> Summary {
    let d = &self.detection;
    let block = self.summary.as_ref();
    let deepfake_detected = d.is_fake;
    let ai_generated_detected = d.ai_generated || d.is_ai_generated;

    Summary {
      overall_fake: deepfake_detected || ai_generated_detected,
      confidence:   unit(d.confidence.max(d.ai_confidence.unwrap_or(0.0))),
      details:      SummaryDetail::Audio(AudioSummary {
        duration: d.duration,
        deepfake_detected,
        ai_generated_detected,
        overall_ai_score: block
          .and_then(|s| s.overall_ai_score)
          .unwrap_or(0.0),
        generation_method: d
          .generation_method
          .clone()
          .unwrap_or_else(|| "Unknown".into()),
        authenticity: block
          .and_then(|s| s.authenticity_assessment.clone())
          .unwrap_or_else(|| "UNKNOWN".into()),
        confidence_level: block
          .and_then(|s| s.confidence_level.clone())
          .unwrap_or_else(|| "MEDIUM".into()),
      }),
    }
  }
}
