//! JSON-RPC request handlers, split by domain.

mod collections;
mod status;
mod vlo;
mod vocabulary;

use crate::server::AppState;
use crate::wrapper::{failure_body, wrap_response};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use collbank_core::CollbankError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error response whose `data` carries the failure body.
    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                data: Some(failure_body(&message)),
                message,
            }),
            id,
        }
    }
}

// ============================================================================
// Parameter extraction helpers
// ============================================================================

fn missing(name: &str) -> CollbankError {
    CollbankError::InvalidParams {
        message: format!("Missing required parameter: {}", name),
    }
}

/// Extract an optional string parameter, supporting both snake_case and camelCase.
pub(crate) fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> collbank_core::Result<String> {
    get_str_param(params, snake, camel)
        .map(String::from)
        .ok_or_else(|| missing(snake))
}

/// Extract an optional bool parameter, supporting both snake_case and camelCase.
pub(crate) fn get_bool_param(params: &Value, snake: &str, camel: &str) -> Option<bool> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_bool())
}

/// Extract an optional i64 parameter, supporting both snake_case and camelCase.
pub(crate) fn get_i64_param(params: &Value, snake: &str, camel: &str) -> Option<i64> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_i64())
}

/// Extract a required i64 parameter or return an error.
pub(crate) fn require_i64_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> collbank_core::Result<i64> {
    get_i64_param(params, snake, camel).ok_or_else(|| missing(snake))
}

/// Extract a required path parameter.
pub(crate) fn require_path_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> collbank_core::Result<PathBuf> {
    require_str_param(params, snake, camel).map(PathBuf::from)
}

/// Extract a required list of ids. Every entry must be an integer.
pub(crate) fn require_i64_list_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> collbank_core::Result<Vec<i64>> {
    let list = params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_array())
        .ok_or_else(|| missing(snake))?;
    list.iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| CollbankError::InvalidParams {
                message: format!("{} must hold integers, got {}", snake, v),
            })
        })
        .collect()
}

// ============================================================================
// HTTP endpoints
// ============================================================================

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}({:?})", method, params);

    match dispatch_method(&state, method, &params).await {
        Ok(value) => {
            let wrapped = wrap_response(method, value);
            (StatusCode::OK, Json(JsonRpcResponse::success(id, wrapped)))
        }
        Err(e) => {
            error!("RPC error for {}: {}", method, e);
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate domain handler.
pub(crate) async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> collbank_core::Result<Value> {
    match method {
        // Status
        "health_check" => status::health_check(state, params).await,

        // Collections
        "list_collections" => collections::list_collections(state, params).await,
        "get_collection" => collections::get_collection(state, params).await,
        "save_collection" => collections::save_collection(state, params).await,
        "delete_collection" => collections::delete_collection(state, params).await,
        "copy_collection" => collections::copy_collection(state, params).await,
        "export_collection" => collections::export_collection(state, params).await,
        "export_collections" => collections::export_collections(state, params).await,
        "validate_collection" => collections::validate_collection(state, params).await,
        "publish_collection" => collections::publish_collection(state, params).await,
        "evaluate_collection" => collections::evaluate_collection(state, params).await,
        "register_collection_pid" => collections::register_collection_pid(state, params).await,
        "import_cmdi" => collections::import_cmdi(state, params).await,

        // Vocabulary
        "get_choice_list" => vocabulary::get_choice_list(state, params).await,
        "import_vocabulary" => vocabulary::import_vocabulary(state, params).await,
        "import_code_list" => vocabulary::import_code_list(state, params).await,

        // VLO items
        "list_vlo_items" => vlo::list_vlo_items(state, params).await,
        "create_vlo_item" => vlo::create_vlo_item(state, params).await,
        "repair_item" => vlo::repair_item(state, params).await,
        "evaluate_item" => vlo::evaluate_item(state, params).await,
        "publish_item" => vlo::publish_item(state, params).await,
        "register_pid" => vlo::register_pid(state, params).await,

        // Unknown method
        _ => {
            warn!("Method not found: {}", method);
            Err(CollbankError::Other(format!("Method not found: {}", method)))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
