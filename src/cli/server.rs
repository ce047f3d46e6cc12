//! HTTP server mode for generating, listing and downloading reports

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::engine::{EngineConfig, ReportEngine};
use crate::error::{Error, Result};
use crate::inventory::EmmaClient;
use crate::output::{list_reports, resolve_report};

/// App state shared across handlers
pub struct AppState {
    config: AppConfig,
    engine: ReportEngine,
}

impl AppState {
    /// State backed by the real upstream API
    pub fn new(config: AppConfig) -> Result<Self> {
        let source = EmmaClient::new(config.http_client_config())?;
        let engine = ReportEngine::new(Arc::new(source), EngineConfig::from(&config));
        Ok(Self::with_engine(config, engine))
    }

    /// State with a caller-provided engine
    pub fn with_engine(config: AppConfig, engine: ReportEngine) -> Self {
        Self { config, engine }
    }
}

/// Query string of the download endpoint
#[derive(Debug, Deserialize)]
struct DownloadQuery {
    file: Option<String>,
}

/// Error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Build the router
pub fn router(state: AppState) -> Router {
    // Build CORS layer - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/files", get(list_files))
        .route("/v1/generates", post(generate))
        .route("/v1/downloads", get(download))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Report names, empty when nothing was generated yet
fn report_names(state: &AppState) -> Result<Vec<String>> {
    match list_reports(&state.config.reports_dir) {
        Ok(files) => Ok(files),
        Err(Error::FileNotFound { .. }) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// List combined reports
async fn list_files(State(state): State<Arc<AppState>>) -> Response {
    match report_names(&state) {
        Ok(files) => (StatusCode::OK, Json(json!({ "files": files }))).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Run one report generation over the configured tenants
async fn generate(State(state): State<Arc<AppState>>) -> Response {
    let summary = match state.engine.generate(&state.config.credentials).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Report generation failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    match report_names(&state) {
        Ok(files) => (
            StatusCode::OK,
            Json(json!({
                "files": files,
                "report": summary.report_name(),
                "tenants": summary.tenants,
            })),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Stream a report back as an attachment
async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(name) = query.file.filter(|f| !f.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "file query parameter is required");
    };
    let Some(path) = resolve_report(&state.config.reports_dir, &name) else {
        return error_response(StatusCode::BAD_REQUEST, format!("invalid file name: {name}"));
    };

    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("{name} is a directory, not a file"),
            );
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return error_response(StatusCode::NOT_FOUND, format!("file not found: {name}"));
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={name}"),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
