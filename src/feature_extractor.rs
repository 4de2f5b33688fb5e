//! Feature extraction for heart disease model inference.
//!
//! Lays a [`FeatureRecord`] out in the column order the scaler and
//! classifier were fitted on.

use crate::types::patient::FeatureRecord;

/// Maps form records onto the expected-columns layout.
///
/// Columns the record does not supply are zero-filled; record fields that
/// are not expected columns are dropped.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    columns: Vec<String>,
}

impl FeatureExtractor {
    /// Create an extractor for an ordered column list.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Extract the feature row for a record.
    ///
    /// The returned vector always has exactly `feature_count()` entries,
    /// in `feature_names()` order.
    pub fn extract(&self, record: &FeatureRecord) -> Vec<f64> {
        self.columns
            .iter()
            .map(|column| record.get(column).map(|v| v.as_f64()).unwrap_or(0.0))
            .collect()
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> &[String] {
        &self.columns
    }

    /// Expected columns no form field supplies; these are always zero.
    pub fn zero_filled_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !FeatureRecord::FIELD_NAMES.iter().any(|field| field == c))
            .map(String::as_str)
            .collect()
    }

    /// Form fields the model never sees.
    pub fn dropped_fields(&self) -> Vec<&'static str> {
        FeatureRecord::FIELD_NAMES
            .iter()
            .copied()
            .filter(|field| !self.columns.iter().any(|c| c == field))
            .collect()
    }
}
