//! Media categories and history filters.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{Error, Result, record::AnalysisRecord};

/// The kind of media an analysis was run on. Each category owns its own
/// history table.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
  Image,
  Video,
  Audio,
}

impl Category {
  /// File extensions accepted for this category, lowercase and without the
  /// leading dot.
  pub fn extensions(self) -> &'static [&'static str] {
    match self {
      Self::Image => &["png", "jpg", "jpeg", "gif", "bmp", "webp"],
      Self::Video => &["mp4", "avi", "mov", "webm"],
      Self::Audio => &["mp3", "wav", "ogg", "m4a"],
    }
  }

  /// The storage key the category's table is persisted under, e.g.
  /// `imageHistory`.
  pub fn storage_key(self) -> String { format!("{self}History") }

  /// Infer the category from a file name's extension.
  pub fn from_filename(filename: &str) -> Option<Self> {
    let ext = Path::new(filename)
      .extension()?
      .to_str()?
      .to_ascii_lowercase();
    Self::iter().find(|c| c.extensions().contains(&ext.as_str()))
  }

  /// Reject a file whose extension does not belong to this category.
  pub fn check_filename(self, filename: &str) -> Result<()> {
    match Self::from_filename(filename) {
      Some(c) if c == self => Ok(()),
      Some(_) => Err(Error::CategoryMismatch {
        filename: filename.to_owned(),
        expected: self,
      }),
      None => Err(Error::UnsupportedFile(filename.to_owned())),
    }
  }
}

/// Which records of a table to return from
/// [`HistoryLedger::list`](crate::HistoryLedger::list).
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HistoryFilter {
  #[default]
  All,
  /// Records whose summary reports fake content.
  Fake,
  /// Records whose summary reports authentic content.
  Real,
}

impl HistoryFilter {
  /// Records without a summary only ever match [`HistoryFilter::All`].
  pub fn matches(self, record: &AnalysisRecord) -> bool {
    match (self, &record.summary) {
      (Self::All, _) => true,
      (Self::Fake, Some(s)) => s.overall_fake,
      (Self::Real, Some(s)) => !s.overall_fake,
      (_, None) => false,
    }
  }
}
