//! Inference engine: feature layout, scaling and classification

use crate::config::AppConfig;
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::Classifier;
use crate::models::loader::{ArtifactLoader, ModelArtifacts};
use crate::models::scaler::StandardScaler;
use crate::types::assessment::RiskAssessment;
use crate::types::patient::FeatureRecord;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Result of model inference
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Predicted label (1 = heart disease)
    pub label: i64,
    /// Row handed to the scaler, in expected-columns order
    pub features: Vec<f64>,
    /// Row handed to the classifier
    pub scaled: Vec<f64>,
}

impl PredictionResult {
    /// Convert prediction result to a displayable assessment
    pub fn to_assessment(&self, record: &FeatureRecord) -> RiskAssessment {
        RiskAssessment::new(self.label, record)
    }
}

/// Read-only inference state shared by all requests
pub struct InferenceEngine {
    extractor: FeatureExtractor,
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
}

impl InferenceEngine {
    /// Load artifacts as configured and build the engine
    pub fn new(config: &AppConfig) -> Result<Self> {
        let artifacts = ArtifactLoader::new(config.artifacts.model_format.clone())
            .with_threads(config.artifacts.onnx_threads)
            .load_all(&config.artifacts)
            .context("Failed to load model artifacts")?;
        Ok(Self::from_artifacts(artifacts))
    }

    /// Build the engine from already loaded artifacts.
    ///
    /// Shape disagreements between the artifacts are logged, not rejected;
    /// they fail the affected requests instead.
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Self {
        let extractor = FeatureExtractor::new(artifacts.columns);
        let width = extractor.feature_count();

        if let Some(n) = artifacts.scaler.n_features() {
            if n != width {
                warn!(columns = width, scaler = n, "Scaler width differs from expected columns");
            }
        }
        if let Some(n) = artifacts.classifier.n_features() {
            if n != width {
                warn!(columns = width, classifier = n, "Classifier width differs from expected columns");
            }
        }
        if let Some(names) = &artifacts.scaler.feature_names_in {
            if names.as_slice() != extractor.feature_names() {
                warn!("Scaler was fitted on a different column order; requests will fail");
            }
        }

        let zero_filled = extractor.zero_filled_columns();
        if !zero_filled.is_empty() {
            info!(columns = ?zero_filled, "Columns without a form field are zero-filled");
        }
        let dropped = extractor.dropped_fields();
        if !dropped.is_empty() {
            info!(fields = ?dropped, "Form fields not used by the model");
        }

        info!(
            classifier = artifacts.classifier.name(),
            features = width,
            "Inference engine initialized"
        );

        Self {
            extractor,
            scaler: artifacts.scaler,
            classifier: artifacts.classifier,
        }
    }

    pub fn feature_extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Run extract, transform and predict for one record
    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult> {
        let features = self.extractor.extract(record);
        let scaled = self
            .scaler
            .transform_named(self.extractor.feature_names(), &features)
            .context("Scaler transform failed")?;
        let label = self
            .classifier
            .predict(&scaled)
            .with_context(|| format!("{} prediction failed", self.classifier.name()))?;

        debug!(label = label, features = ?features, "Prediction complete");

        Ok(PredictionResult {
            label,
            features,
            scaled,
        })
    }
}
