//! Startup loader for the model artifacts

use crate::config::{ArtifactsConfig, ModelFormat};
use crate::models::classifier::Classifier;
use crate::models::knn::KnnClassifier;
use crate::models::scaler::StandardScaler;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

/// Everything inference needs, loaded once at startup
pub struct ModelArtifacts {
    /// Column order the scaler and classifier were fitted on
    pub columns: Vec<String>,
    pub scaler: StandardScaler,
    pub classifier: Box<dyn Classifier>,
}

/// Loader for the classifier, scaler and expected-columns artifacts.
///
/// Any missing or unreadable file is an error; there is no fallback.
pub struct ArtifactLoader {
    model_format: ModelFormat,
    /// Intra-op threads for ONNX sessions
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a loader for the given classifier format
    pub fn new(model_format: ModelFormat) -> Self {
        Self {
            model_format,
            onnx_threads: 1,
        }
    }

    /// Set the thread count used by ONNX sessions
    pub fn with_threads(mut self, onnx_threads: usize) -> Self {
        self.onnx_threads = onnx_threads.max(1);
        self
    }

    /// Load all three artifacts from the configured directory
    pub fn load_all(&self, config: &ArtifactsConfig) -> Result<ModelArtifacts> {
        let classifier = self.load_classifier(config.model_path(), &config.model_file)?;
        let scaler = self.load_scaler(config.scaler_path(), &config.scaler_file)?;
        let columns = self.load_columns(config.columns_path(), &config.columns_file)?;

        info!(
            dir = %config.dir,
            classifier = classifier.name(),
            columns = columns.len(),
            "Loaded model artifacts"
        );

        Ok(ModelArtifacts {
            columns,
            scaler,
            classifier,
        })
    }

    /// Load the ordered expected-columns list
    pub fn load_columns<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<Vec<String>> {
        let columns: Vec<String> = read_json(path.as_ref(), name)?;
        if columns.is_empty() {
            bail!("'{}' lists no columns", name);
        }
        Ok(columns)
    }

    /// Load the fitted scaler
    pub fn load_scaler<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<StandardScaler> {
        let scaler: StandardScaler = read_json(path.as_ref(), name)?;
        scaler
            .validate()
            .with_context(|| format!("Invalid scaler in '{}'", name))?;
        Ok(scaler)
    }

    /// Load the classifier in the configured format
    pub fn load_classifier<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
    ) -> Result<Box<dyn Classifier>> {
        let path = path.as_ref();
        require_file(path, name)?;

        info!(model = %name, format = ?self.model_format, path = %path.display(), "Loading classifier");

        match self.model_format {
            ModelFormat::Knn => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read '{}'", path.display()))?;
                let model = KnnClassifier::from_json(&json)
                    .with_context(|| format!("Invalid classifier in '{}'", name))?;
                Ok(Box::new(model))
            }
            ModelFormat::Onnx => {
                info!(threads = self.onnx_threads, "Creating ONNX session");
                self.load_onnx(path)
            }
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let model = crate::models::onnx::OnnxClassifier::load(path, self.onnx_threads)?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        bail!(
            "{} is an ONNX model but this build lacks the 'onnx' feature",
            path.display()
        )
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new(ModelFormat::Knn)
    }
}

fn require_file(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        bail!("Required file '{}' not found at: {}", name, path.display());
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, name: &str) -> Result<T> {
    require_file(path, name)?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_artifacts(dir: &Path) {
        fs::write(dir.join("columns.json"), r#"["age", "chol"]"#).unwrap();
        fs::write(
            dir.join("scaler.json"),
            r#"{"mean": [50.0, 200.0], "scale": [10.0, 50.0]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("knn.json"),
            r#"{"n_neighbors": 1, "fit_x": [[0.0, 0.0], [1.0, 1.0]], "fit_y": [0, 1]}"#,
        )
        .unwrap();
    }

    fn artifacts_config(dir: &Path) -> ArtifactsConfig {
        ArtifactsConfig {
            dir: dir.to_string_lossy().into_owned(),
            model_file: "knn.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            columns_file: "columns.json".to_string(),
            model_format: ModelFormat::Knn,
            onnx_threads: 1,
        }
    }

    #[test]
    fn test_load_all() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let artifacts = ArtifactLoader::default()
            .load_all(&artifacts_config(dir.path()))
            .unwrap();

        assert_eq!(artifacts.columns, vec!["age", "chol"]);
        assert_eq!(artifacts.scaler.n_features(), Some(2));
        assert_eq!(artifacts.classifier.name(), "knn");
        assert_eq!(artifacts.classifier.n_features(), Some(2));
    }

    #[test]
    fn test_each_missing_file_is_fatal() {
        for missing in ["columns.json", "scaler.json", "knn.json"] {
            let dir = tempfile::tempdir().unwrap();
            write_artifacts(dir.path());
            fs::remove_file(dir.path().join(missing)).unwrap();

            let err = ArtifactLoader::default()
                .load_all(&artifacts_config(dir.path()))
                .err()
                .unwrap();
            let message = err.to_string();
            assert!(message.contains(&format!("Required file '{}' not found", missing)));
            assert!(message.contains(&dir.path().display().to_string()));
        }
    }

    #[test]
    fn test_malformed_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        fs::write(dir.path().join("columns.json"), "{not json").unwrap();
        assert!(ArtifactLoader::default()
            .load_all(&artifacts_config(dir.path()))
            .is_err());

        fs::write(dir.path().join("columns.json"), "[]").unwrap();
        assert!(ArtifactLoader::default()
            .load_all(&artifacts_config(dir.path()))
            .is_err());
    }

    #[test]
    fn test_ragged_scaler_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        fs::write(
            dir.path().join("scaler.json"),
            r#"{"mean": [50.0, 200.0], "scale": [10.0]}"#,
        )
        .unwrap();

        let err = ArtifactLoader::default()
            .load_all(&artifacts_config(dir.path()))
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("Invalid scaler in 'scaler.json'"));
    }

    #[test]
    fn test_thread_count_is_at_least_one() {
        assert_eq!(ArtifactLoader::default().with_threads(4).onnx_threads, 4);
        assert_eq!(ArtifactLoader::default().with_threads(0).onnx_threads, 1);
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_requires_feature() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model.onnx"), b"onnx").unwrap();

        let err = ArtifactLoader::new(ModelFormat::Onnx)
            .load_classifier(dir.path().join("model.onnx"), "model.onnx")
            .err()
            .unwrap();
        assert!(err.to_string().contains("'onnx' feature"));
    }
}
