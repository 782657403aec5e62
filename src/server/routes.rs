//! Route handlers for the web form and its JSON API.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{analyze_blocking, AppState};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Body of `POST /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Text to analyze. May be empty.
    pub text: String,
}

/// Body of `POST /api/flag`: a user report on an output they found wrong
/// or interesting.
#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    /// The text that was analyzed.
    pub input: String,
    /// The JSON the analyzer returned.
    pub output: String,
    /// Optional free-form note.
    #[serde(default)]
    pub reason: Option<String>,
}

/// GET / - Serve the analyzer form.
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// POST /api/analyze - Run both classifiers on the submitted text.
pub async fn analyze(State(state): State<AppState>, Json(req): Json<AnalyzeRequest>) -> Response {
    match analyze_blocking(state.analyzer.clone(), req.text).await {
        Ok(result) => Json(result).into_response(),
        Err(message) => {
            tracing::error!(error = %message, "analysis failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response()
        }
    }
}

/// POST /api/flag - Record a flagged output in the log. Nothing is stored.
pub async fn flag(Json(req): Json<FlagRequest>) -> StatusCode {
    tracing::warn!(
        target: "tone_analyzer::flag",
        input = %req.input,
        output = %req.output,
        reason = req.reason.as_deref().unwrap_or(""),
        "output flagged"
    );
    StatusCode::NO_CONTENT
}
