//! ML model inference components

pub mod classifier;
pub mod inference;
pub mod knn;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use classifier::Classifier;
pub use inference::InferenceEngine;
pub use knn::KnnClassifier;
pub use loader::{ArtifactLoader, ModelArtifacts};
pub use scaler::StandardScaler;
