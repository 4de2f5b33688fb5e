//! Classifier abstraction shared by the model back-ends

use anyhow::Result;

/// A fitted binary classifier operating on scaled feature rows.
pub trait Classifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Row width the classifier was fitted on, if known
    fn n_features(&self) -> Option<usize>;

    /// Predict the label of a single scaled row
    fn predict(&self, row: &[f64]) -> Result<i64>;
}
