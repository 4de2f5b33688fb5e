//! Pre-fitted standardization of feature rows

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Standard scaler fitted offline: `(x - mean) / scale` per column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-column mean; centering is skipped when absent
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    /// Per-column scale; scaling is skipped when absent
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
    /// Column names seen at fit time, if recorded
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
}

impl StandardScaler {
    /// Number of columns the scaler was fitted on, if known
    pub fn n_features(&self) -> Option<usize> {
        self.mean
            .as_ref()
            .or(self.scale.as_ref())
            .map(Vec::len)
            .or_else(|| self.feature_names_in.as_ref().map(Vec::len))
    }

    /// Check the fitted parameters agree on the column count
    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("mean", self.mean.as_ref().map(Vec::len)),
            ("scale", self.scale.as_ref().map(Vec::len)),
            ("feature_names_in", self.feature_names_in.as_ref().map(Vec::len)),
        ];

        let mut fitted: Option<(&str, usize)> = None;
        for (field, len) in lengths {
            let Some(len) = len else { continue };
            match fitted {
                Some((first, n)) if n != len => {
                    bail!("scaler {} has {} entries but {} has {}", field, len, first, n);
                }
                Some(_) => {}
                None => fitted = Some((field, len)),
            }
        }
        Ok(())
    }

    /// Transform a row whose columns are named.
    ///
    /// When the scaler recorded its fit-time column names, `columns` must
    /// match them in order.
    pub fn transform_named(&self, columns: &[String], row: &[f64]) -> Result<Vec<f64>> {
        if let Some(names) = &self.feature_names_in {
            if names.as_slice() != columns {
                bail!(
                    "feature names differ from those seen at fit time: fitted {:?}, got {:?}",
                    names,
                    columns
                );
            }
        }
        self.transform(row)
    }

    /// Transform a single row.
    ///
    /// Fails when the row width disagrees with the fitted parameters.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if let Some(expected) = self.n_features() {
            if row.len() != expected {
                bail!(
                    "scaler expects {} features, got {}",
                    expected,
                    row.len()
                );
            }
        }

        let mut out = row.to_vec();

        if let Some(mean) = &self.mean {
            for (x, m) in out.iter_mut().zip(mean) {
                *x -= m;
            }
        }

        if let Some(scale) = &self.scale {
            for (x, &s) in out.iter_mut().zip(scale) {
                if s != 0.0 {
                    *x /= s;
                }
            }
        }

        Ok(out)
    }
}
