//! HTTP front end.
//!
//! ## Endpoints
//!
//! - `GET /`: landing form
//! - `POST /predict`: score a form submission and render the result

use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::render;
use crate::types::assessment::RiskAssessment;
use crate::types::patient::FeatureRecord;
use anyhow::{anyhow, Context, Result};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Largest urlencoded body accepted
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;

/// Shared application state available to all handlers.
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub metrics: Arc<ServiceMetrics>,
    /// Page title
    pub title: String,
    /// Include error chains in 500 responses
    pub debug: bool,
}

/// Build the router with both pages
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/predict", post(predict_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// `GET /`
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render::index_page(&state.title))
}

/// `POST /predict`
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Html<String>, AppError> {
    let start_time = Instant::now();

    let outcome = match read_form(request).await {
        Ok(form) => score_form(&state, form).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok((record, label)) => {
            let assessment = RiskAssessment::new(label, &record);
            let processing_time = start_time.elapsed();
            state
                .metrics
                .record_prediction(processing_time, assessment.is_high_risk());

            debug!(
                request_id = %assessment.request_id,
                label = assessment.label,
                result_type = assessment.result_type.as_str(),
                processing_time_us = processing_time.as_micros() as u64,
                "Prediction served"
            );

            Ok(Html(render::result_page(&state.title, &assessment)))
        }
        Err(e) => {
            state.metrics.record_failure();
            error!(error = %format!("{:#}", e), "Prediction request failed");
            Err(AppError {
                error: e,
                debug: state.debug,
            })
        }
    }
}

/// Collect the submitted fields; the first value wins for a repeated name.
///
/// Urlencoded and multipart bodies are parsed. Any other body, or none at
/// all, is an empty form.
async fn read_form(request: Request) -> Result<HashMap<String, String>> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let pairs = if content_type.starts_with("multipart/form-data") {
        read_multipart(request).await?
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let body = axum::body::to_bytes(request.into_body(), MAX_FORM_BYTES)
            .await
            .context("Failed to read form body")?;
        serde_urlencoded::from_bytes::<Vec<(String, String)>>(&body)
            .context("Malformed form body")?
    } else {
        Vec::new()
    };

    let mut form = HashMap::new();
    for (name, value) in pairs {
        form.entry(name).or_insert(value);
    }
    Ok(form)
}

async fn read_multipart(request: Request) -> Result<Vec<(String, String)>> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| anyhow!("Malformed multipart body: {}", e))?;

    let mut pairs = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .context("Malformed multipart body")?
    {
        // uploaded files are not form values
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field.text().await.context("Malformed multipart body")?;
        pairs.push((name, value));
    }
    Ok(pairs)
}

/// Parse the form and run inference off the async workers
async fn score_form(
    state: &AppState,
    form: HashMap<String, String>,
) -> Result<(FeatureRecord, i64)> {
    let record = FeatureRecord::from_form(&form)?;
    let engine = state.engine.clone();

    tokio::task::spawn_blocking(move || -> Result<(FeatureRecord, i64)> {
        let prediction = engine.predict(&record)?;
        Ok((record, prediction.label))
    })
    .await
    .context("Inference task panicked")?
}

/// Request failure rendered as a 500 page
#[derive(Debug)]
pub struct AppError {
    error: anyhow::Error,
    debug: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.debug {
            format!(
                "<!DOCTYPE html>\n<html><body><h1>Internal Server Error</h1><pre>{}</pre></body></html>\n",
                render::escape_html(&format!("{:?}", self.error))
            )
        } else {
            "<!DOCTYPE html>\n<html><body><h1>Internal Server Error</h1></body></html>\n"
                .to_string()
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::knn::KnnClassifier;
    use crate::models::loader::ModelArtifacts;
    use crate::models::scaler::StandardScaler;
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::sync::atomic::Ordering;
    use tower::util::ServiceExt;

    /// One training row per class on the age axis: old is high risk
    fn make_test_state(debug: bool) -> Arc<AppState> {
        let mut knn = KnnClassifier {
            n_neighbors: 1,
            weights: Default::default(),
            p: 2.0,
            classes: vec![0, 1],
            fit_x: vec![vec![-1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]],
            fit_y: vec![0, 1],
        };
        knn.validate().unwrap();

        let engine = InferenceEngine::from_artifacts(ModelArtifacts {
            columns: vec!["age".to_string(), "cp_2".to_string(), "chol".to_string()],
            scaler: StandardScaler {
                mean: Some(vec![50.0, 0.0, 200.0]),
                scale: Some(vec![10.0, 1.0, 50.0]),
                feature_names_in: None,
            },
            classifier: Box::new(knn),
        });

        Arc::new(AppState {
            engine: Arc::new(engine),
            metrics: Arc::new(ServiceMetrics::new()),
            title: "Heart Disease Prediction".to_string(),
            debug,
        })
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).into_owned()
    }

    #[tokio::test]
    async fn test_index_returns_form() {
        let app = build_router(make_test_state(true));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("Heart Disease Prediction"));
        assert!(text.contains(r#"action="/predict""#));
    }

    #[tokio::test]
    async fn test_predict_high_risk() {
        let state = make_test_state(true);
        let app = build_router(state.clone());

        let response = app
            .oneshot(form_request(
                "age=70&trestbps=150&chol=280&fbs=1&thalach=120&oldpeak=2.5&cp=3&sex=M&restecg=1&exang=1&slope=2&ca=2&thal=3",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("High risk"));
        assert!(text.contains("#f8d7da"));
        assert_eq!(state.metrics.high_risk.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_predict_low_risk() {
        let app = build_router(make_test_state(true));

        let response = app.oneshot(form_request("age=35&sex=F")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("Low risk"));
        assert!(text.contains("#d4edda"));
        assert!(text.contains("<strong>sex</strong>: 1"));
    }

    #[tokio::test]
    async fn test_empty_form_uses_defaults() {
        let state = make_test_state(true);
        let app = build_router(state.clone());

        let response = app.oneshot(form_request("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("Low risk"));
        assert!(text.contains("<strong>age</strong>: 40"));
        assert!(text.contains("<strong>chol</strong>: 200.0"));
        assert_eq!(state.metrics.predictions_served.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_malformed_number_is_server_error() {
        let state = make_test_state(true);
        let app = build_router(state.clone());

        let response = app.oneshot(form_request("age=old")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        assert!(text.contains("invalid integer for field &#39;age&#39;"));
        assert_eq!(state.metrics.failed_requests.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_error_detail_hidden_without_debug() {
        let app = build_router(make_test_state(false));

        let response = app.oneshot(form_request("chol=")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        assert!(text.contains("Internal Server Error"));
        assert!(!text.contains("chol"));
    }

    #[tokio::test]
    async fn test_bodyless_post_uses_defaults() {
        let app = build_router(make_test_state(true));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("Low risk"));
        assert!(text.contains("<strong>age</strong>: 40"));
    }

    #[tokio::test]
    async fn test_multipart_form() {
        let app = build_router(make_test_state(true));
        let body = concat!(
            "--heartform\r\n",
            "Content-Disposition: form-data; name=\"age\"\r\n\r\n",
            "70\r\n",
            "--heartform\r\n",
            "Content-Disposition: form-data; name=\"thal\"; filename=\"thal.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "3\r\n",
            "--heartform--\r\n",
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=heartform")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("High risk"));
        assert!(text.contains("<strong>age</strong>: 70"));
        assert!(text.contains("<strong>thal</strong>: 0"));
    }

    #[tokio::test]
    async fn test_repeated_field_keeps_first_value() {
        let app = build_router(make_test_state(true));

        let response = app.oneshot(form_request("age=30&age=70")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("Low risk"));
        assert!(text.contains("<strong>age</strong>: 30"));
    }

    #[tokio::test]
    async fn test_non_finite_number_is_server_error() {
        let state = make_test_state(true);
        let app = build_router(state.clone());

        let response = app.oneshot(form_request("chol=nan")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        assert!(text.contains("NaN or infinity"));
        assert_eq!(state.metrics.failed_requests.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_get_predict_not_allowed() {
        let app = build_router(make_test_state(true));

        let response = app
            .oneshot(Request::builder().uri("/predict").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
