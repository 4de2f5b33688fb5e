//! Heart Risk Server - Main Entry Point
//!
//! Loads the classifier, scaler and expected columns, then serves the
//! prediction form over HTTP.

use anyhow::Result;
use heart_risk_server::{
    config::AppConfig,
    metrics::{MetricsReporter, ServiceMetrics},
    models::inference::InferenceEngine,
    web::{self, AppState},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config)?;

    info!("Starting Heart Risk Server");
    info!(
        debug = config.server.debug,
        artifacts_dir = %config.artifacts.dir,
        model_format = ?config.artifacts.model_format,
        "Configuration loaded"
    );

    // Missing artifacts abort startup
    let engine = Arc::new(InferenceEngine::new(&config)?);
    info!(
        classifier = engine.classifier_name(),
        features = ?engine.feature_extractor().feature_names(),
        "Model artifacts ready"
    );

    let metrics = Arc::new(ServiceMetrics::new());

    let reporter_metrics = metrics.clone();
    let interval = config.metrics.report_interval_secs;
    tokio::spawn(async move {
        MetricsReporter::new(reporter_metrics, interval).start().await;
    });

    let state = Arc::new(AppState {
        engine,
        metrics: metrics.clone(),
        title: config.server.title.clone(),
        debug: config.server.debug,
    });

    web::serve(&config.bind_addr(), state, shutdown_signal()).await?;

    // Print final summary
    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let level = if config.server.debug {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("heart_risk_server={}", level).parse()?)
        .add_directive(format!("tower_http={}", level).parse()?);

    if config.logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
