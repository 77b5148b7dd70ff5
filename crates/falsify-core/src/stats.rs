//! Derived statistics, computed on demand and never stored.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{category::Category, record::AnalysisRecord};

/// Totals over every history table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
  pub total:          usize,
  pub fake_detected:  usize,
  /// Records carrying any feedback.
  pub feedback_count: usize,
  /// Records whose feedback agrees with the model.
  pub agreed_count:   usize,
  pub per_category:   BTreeMap<Category, usize>,
}

impl AggregateStats {
  pub(crate) fn add(&mut self, record: &AnalysisRecord) {
    self.total += 1;
    *self.per_category.entry(record.category).or_default() += 1;
    if record.is_fake() {
      self.fake_detected += 1;
    }
    if let Some(feedback) = &record.feedback {
      self.feedback_count += 1;
      if feedback.agrees_with_model {
        self.agreed_count += 1;
      }
    }
  }

  /// Share of feedback that agreed with the model, in `[0, 1]`. `None` until
  /// some feedback exists.
  pub fn accuracy(&self) -> Option<f64> {
    (self.feedback_count > 0)
      .then(|| self.agreed_count as f64 / self.feedback_count as f64)
  }
}
