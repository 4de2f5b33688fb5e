//! Heart Risk Server Library
//!
//! Serves a heart disease classifier behind a small web form: submitted
//! measurements are laid out in the trained column order, standardized,
//! classified, and rendered as a colored risk message.

pub mod config;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod render;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use types::{assessment::RiskAssessment, patient::FeatureRecord};
pub use web::{build_router, AppState};
