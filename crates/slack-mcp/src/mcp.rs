//! MCP JSON-RPC endpoint (streamable HTTP, JSON responses)
//!
//! The session id travels in the `Mcp-Session-Id` header. It is issued on
//! `initialize` and becomes the [`RequestContext`] every tool call runs under.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use sm_core::{AuthDenial, RequestContext, SESSION_HEADER, ToolError, ToolResult, error_payload};

use crate::server::AppState;

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2025-03-26";
const ERROR_PARSE: i64 = -32700;
const ERROR_INVALID_REQUEST: i64 = -32600;
const ERROR_METHOD_NOT_FOUND: i64 = -32601;
const ERROR_INVALID_PARAMS: i64 = -32602;

#[derive(Debug)]
struct RpcRequest {
    /// `None` for notifications
    id: Option<Value>,
    method: String,
    params: Map<String, Value>,
}

#[derive(Debug)]
struct RpcError {
    id: Value,
    code: i64,
    message: String,
}

impl RpcError {
    fn new(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            code,
            message: message.into(),
        }
    }
}

fn result_frame(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

fn error_frame(error: RpcError) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": error.id,
        "error": {
            "code": error.code,
            "message": error.message,
        }
    })
}

fn parse_request(body: &[u8]) -> Result<RpcRequest, RpcError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RpcError::new(Value::Null, ERROR_PARSE, format!("Parse error: {}", e)))?;

    let Some(object) = value.as_object() else {
        return Err(RpcError::new(
            Value::Null,
            ERROR_INVALID_REQUEST,
            "request must be a JSON object",
        ));
    };

    let id = object.get("id").cloned().filter(|id| !id.is_null());
    let error_id = id.clone().unwrap_or(Value::Null);

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(RpcError::new(
            error_id,
            ERROR_INVALID_REQUEST,
            format!("jsonrpc must be '{}'", JSONRPC_VERSION),
        ));
    }

    let method = object
        .get("method")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| RpcError::new(error_id.clone(), ERROR_INVALID_REQUEST, "method is required"))?
        .to_string();

    let params = match object.get("params") {
        Some(Value::Object(params)) => params.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(_) => {
            return Err(RpcError::new(
                error_id,
                ERROR_INVALID_PARAMS,
                "params must be an object",
            ));
        }
    };

    Ok(RpcRequest { id, method, params })
}

fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn json_response(body: Value, session_id: Option<&str>) -> Response {
    let mut response = Json(body).into_response();
    if let Some(value) = session_id.and_then(|sid| HeaderValue::from_str(sid).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// POST /mcp
pub async fn handle_mcp(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(error) => {
            debug!("Rejected JSON-RPC request: {}", error.message);
            return json_response(error_frame(error), None);
        }
    };

    let header_session = session_from_headers(&headers);

    let Some(id) = request.id.clone() else {
        debug!(method = %request.method, "Notification received");
        return StatusCode::ACCEPTED.into_response();
    };

    match request.method.as_str() {
        "initialize" => {
            let session_id = header_session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            info!(session_id = %session_id, "MCP session initialized");
            json_response(
                result_frame(id, initialize_result(&request.params)),
                Some(&session_id),
            )
        }
        "ping" => json_response(result_frame(id, json!({})), None),
        "tools/list" => json_response(result_frame(id, tools_list_result(&state)), None),
        "tools/call" => {
            let ctx = RequestContext::new(header_session);
            let frame = match call_tool(&state, &ctx, &request.params).await {
                Ok(result) => result_frame(id, result),
                Err(message) => error_frame(RpcError::new(id, ERROR_INVALID_PARAMS, message)),
            };
            json_response(frame, None)
        }
        other => json_response(
            error_frame(RpcError::new(
                id,
                ERROR_METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
            None,
        ),
    }
}

/// DELETE /mcp: the client is done with its session
pub async fn end_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    match session_from_headers(&headers) {
        Some(session_id) => {
            if state.store.evict_session(&session_id) {
                info!(session_id = %session_id, "MCP session ended by client");
            }
            StatusCode::NO_CONTENT
        }
        None => StatusCode::BAD_REQUEST,
    }
}

fn initialize_result(params: &Map<String, Value>) -> Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": protocol_version,
        "serverInfo": {
            "name": "slack-mcp",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": {"listChanged": false},
        },
    })
}

fn tools_list_result(state: &AppState) -> Value {
    json!({ "tools": state.tools.definitions() })
}

/// Run a tool. `Err` is a protocol error; tool failures are `isError` results.
async fn call_tool(
    state: &AppState,
    ctx: &RequestContext,
    params: &Map<String, Value>,
) -> Result<Value, String> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "tools/call requires a non-empty 'name'".to_string())?;

    if !state.tools.contains(name) {
        return Err(format!("Unknown tool: {}", name));
    }

    let arguments = match params.get("arguments") {
        Some(Value::Object(arguments)) => Value::Object(arguments.clone()),
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(_) => return Err("tools/call 'arguments' must be an object".to_string()),
    };

    let (content, result) = match state.tools.execute(name, ctx, arguments).await {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            (value, ToolResult::success(text))
        }
        Err(err) => {
            warn!(tool = %name, request_id = %ctx.request_id(), kind = err.kind(), "Tool failed: {}", err);
            let payload = failure_payload(state, ctx, &err);
            let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
            (payload, ToolResult::error(text))
        }
    };

    Ok(json!({
        "content": [{"type": "text", "text": result.output}],
        "isError": result.is_error,
        "structuredContent": content,
    }))
}

/// Error body, plus a sign-in link when the session can fix the denial by
/// authorizing. An expired token is renewed by signing in again as the same
/// Slack user; the store still refuses any other user for the session.
fn failure_payload(state: &AppState, ctx: &RequestContext, err: &ToolError) -> Value {
    let mut payload = error_payload(err);

    let message = match err {
        ToolError::Unauthorized(AuthDenial::SessionUnbound) => {
            "Open authorization_url to connect your Slack account, then retry."
        }
        ToolError::Unauthorized(AuthDenial::InvalidToken(_)) => {
            "Your Slack authorization is no longer valid. Open authorization_url to sign in again with the same Slack account, then retry."
        }
        _ => return payload,
    };
    let Some(session_id) = ctx.session_id() else {
        return payload;
    };

    match state.oauth.authorization_url(session_id) {
        Ok(url) => {
            payload["authorization_url"] = json!(url);
            payload["message"] = json!(message);
        }
        Err(e) => debug!("No authorization URL available: {}", e),
    }

    payload
}
