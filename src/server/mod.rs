//! HTTP surface: the web form, its JSON API and the MCP endpoint.

pub mod mcp;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::analyzer::{AnalysisResult, Analyzer};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The loaded analyzer, read-only.
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    /// Shares `analyzer` with every handler.
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }
}

/// Runs one analysis on the blocking pool so inference never stalls the
/// async workers. The error is the message shown to the caller.
pub async fn analyze_blocking(
    analyzer: Arc<Analyzer>,
    text: String,
) -> Result<AnalysisResult, String> {
    tokio::task::spawn_blocking(move || analyzer.analyze(&text))
        .await
        .map_err(|e| format!("analysis task failed: {e}"))?
        .map_err(|e| e.to_string())
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/flag", post(routes::flag));

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/mcp", post(mcp::http_handler))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server until the process is stopped.
pub async fn run_server(analyzer: Arc<Analyzer>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(AppState::new(analyzer));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);
    tracing::info!("MCP endpoint at http://{}:{}/mcp", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
