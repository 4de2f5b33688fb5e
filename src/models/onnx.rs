//! ONNX Runtime classifier back-end

use crate::models::classifier::Classifier;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Classifier exported to ONNX with an `int64` label output
pub struct OnnxClassifier {
    /// ONNX Runtime session (run needs exclusive access)
    session: RwLock<Session>,
    /// Input name for the model
    input_name: String,
    /// Output carrying predicted labels
    label_output: String,
}

impl OnnxClassifier {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx classifiers emit "output_label" ahead of the probabilities
        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_label".to_string());

        info!(
            input = %input_name,
            output = %label_output,
            "Model loaded successfully"
        );

        Ok(Self {
            session: RwLock::new(session),
            input_name,
            label_output,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, row: &[f64]) -> Result<i64> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, row.len() as i64];
        let data: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, data)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(self.label_output.as_str())
            .with_context(|| format!("model has no output named {}", self.label_output))?;
        let (_, labels) = output.try_extract_tensor::<i64>()?;
        let label = labels
            .first()
            .copied()
            .context("label output is empty")?;

        debug!(label = label, "ONNX prediction complete");

        Ok(label)
    }
}
