//! MCP server exposing the analyzer as the `analyze_text` tool.
//!
//! Speaks JSON-RPC 2.0, either over HTTP (`POST /mcp`) or over stdio with one
//! message per line.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{analyze_blocking, AppState};
use crate::analyzer::Analyzer;

/// Name the analyzer is published under.
pub const TOOL_NAME: &str = "analyze_text";

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC request structure. The `id` is read from the raw message so an
/// explicit `null` stays distinct from a missing field.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    #[serde(default)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Echo of the request id.
    pub id: Option<Value>,
    /// Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Standard JSON-RPC error code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Tool definition.
#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct AnalyzeTextArgs {
    text: String,
}

/// Handles one raw JSON-RPC message. Notifications (no `id` member) get no
/// response.
pub async fn handle_message(analyzer: &Arc<Analyzer>, raw: &str) -> Option<JsonRpcResponse> {
    let message: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            return Some(JsonRpcResponse::failure(
                None,
                JsonRpcError {
                    code: PARSE_ERROR,
                    message: format!("Parse error: {}", e),
                },
            ))
        }
    };

    let id = message.get("id").cloned();

    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(r) => r,
        Err(e) => {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError {
                    code: INVALID_REQUEST,
                    message: format!("Invalid request: {}", e),
                },
            ))
        }
    };

    let Some(id) = id else {
        tracing::debug!(method = %request.method, "mcp notification");
        return None;
    };

    Some(handle_request(analyzer, id, request).await)
}

async fn handle_request(
    analyzer: &Arc<Analyzer>,
    id: Value,
    request: JsonRpcRequest,
) -> JsonRpcResponse {
    tracing::debug!(method = %request.method, "mcp request");

    let result = match request.method.as_str() {
        "initialize" => Ok(handle_initialize()),
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => Ok(handle_tools_list()),
        "tools/call" => handle_tool_call(analyzer, request.params).await,
        _ => Err(JsonRpcError {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {}", request.method),
        }),
    };

    match result {
        Ok(r) => JsonRpcResponse::success(Some(id), r),
        Err(e) => JsonRpcResponse::failure(Some(id), e),
    }
}

fn handle_initialize() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": "tone-analyzer",
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {}
        }
    })
}

fn handle_tools_list() -> Value {
    let tools = vec![Tool {
        name: TOOL_NAME.to_string(),
        description: "Analyze sentiment and detect sarcasm in the given text. Returns a JSON \
                      string with assessment (positive/negative), confidence, \
                      sarcasm_detected and sarcasm_confidence."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze"
                }
            },
            "required": ["text"]
        }),
    }];

    serde_json::json!({ "tools": tools })
}

async fn handle_tool_call(
    analyzer: &Arc<Analyzer>,
    params: Option<Value>,
) -> Result<Value, JsonRpcError> {
    let invalid = |message: String| JsonRpcError {
        code: INVALID_PARAMS,
        message,
    };

    let params: ToolCallParams = params
        .ok_or_else(|| invalid("Missing params".to_string()))
        .and_then(|p| {
            serde_json::from_value(p).map_err(|e| invalid(format!("Invalid params: {}", e)))
        })?;

    if params.name != TOOL_NAME {
        return Err(invalid(format!("Unknown tool: {}", params.name)));
    }

    let args: AnalyzeTextArgs = serde_json::from_value(params.arguments)
        .map_err(|e| invalid(format!("Invalid arguments for {}: {}", TOOL_NAME, e)))?;

    // Classifier failures are tool errors, not protocol errors.
    let (text, is_error) = match analyze_blocking(analyzer.clone(), args.text).await {
        Ok(result) => (result.to_string(), false),
        Err(message) => (message, true),
    };

    Ok(serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    }))
}

/// POST /mcp - JSON-RPC over HTTP.
pub async fn http_handler(State(state): State<AppState>, body: String) -> Response {
    match handle_message(&state.analyzer, &body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Run the MCP server over stdio.
pub async fn run_stdio(analyzer: Arc<Analyzer>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = handle_message(&analyzer, &line).await {
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
