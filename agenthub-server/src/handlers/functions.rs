//! `POST /api/chaos/:action` and `POST /api/fault/:action`.
//!
//! Both forward `{"action": <action>, ...body}` to the configured Lambda and
//! return its JSON result unchanged.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use agenthub_core::FunctionKind;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub async fn chaos_handler(
    State(state): State<AppState>,
    Path(action): Path<String>,
    body: Bytes,
) -> ServerResult<Json<serde_json::Value>> {
    invoke(state, FunctionKind::Chaos, action, body).await
}

pub async fn fault_handler(
    State(state): State<AppState>,
    Path(action): Path<String>,
    body: Bytes,
) -> ServerResult<Json<serde_json::Value>> {
    invoke(state, FunctionKind::Fault, action, body).await
}

async fn invoke(
    state: AppState,
    kind: FunctionKind,
    action: String,
    body: Bytes,
) -> ServerResult<Json<serde_json::Value>> {
    let body = parse_body(&body)?;
    let result = state.hub.invoke_function(kind, &action, body).await?;
    Ok(Json(result))
}

/// Empty bodies are allowed.
fn parse_body(body: &[u8]) -> ServerResult<serde_json::Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| ServerError::InvalidRequest(format!("invalid JSON body: {}", e)))
}
