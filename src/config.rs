//! Configuration management for the heart risk server

use anyhow::{Context, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Serialized format of the classifier artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// k-nearest-neighbours model stored as JSON
    #[default]
    Knn,
    /// ONNX graph, requires the `onnx` feature
    Onnx,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Verbose logging and detailed error pages
    pub debug: bool,
    /// Page title shown on both pages
    pub title: String,
}

/// Startup artifact locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding the three artifacts
    pub dir: String,
    /// Classifier file name
    pub model_file: String,
    /// Scaler file name
    pub scaler_file: String,
    /// Expected-columns file name
    pub columns_file: String,
    /// How to interpret the classifier file
    #[serde(default)]
    pub model_format: ModelFormat,
    /// Intra-op threads for ONNX sessions
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

impl ArtifactsConfig {
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.scaler_file)
    }

    pub fn columns_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.columns_file)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between summaries; 0 disables periodic reporting
    pub report_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration, layering `config/config.toml` over the defaults when present
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path; a missing file leaves the defaults untouched
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8501,
                debug: true,
                title: "Heart Disease Prediction".to_string(),
            },
            artifacts: ArtifactsConfig {
                dir: "artifacts".to_string(),
                model_file: "knn.json".to_string(),
                scaler_file: "scaler.json".to_string(),
                columns_file: "columns.json".to_string(),
                model_format: ModelFormat::Knn,
                onnx_threads: default_onnx_threads(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            metrics: MetricsConfig {
                report_interval_secs: 300,
            },
        }
    }
}
