//! Collection handlers: catalogue, export, publication and import.

use super::{
    get_bool_param, get_str_param, require_i64_list_param, require_i64_param, require_path_param,
    require_str_param,
};
use crate::server::AppState;
use collbank_core::{ArchiveFormat, Collection, CollbankError, XmlSource};
use serde_json::{json, Value};

pub async fn list_collections(state: &AppState, _params: &Value) -> collbank_core::Result<Value> {
    Ok(serde_json::to_value(state.api.list_collections()?)?)
}

pub async fn get_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    Ok(serde_json::to_value(state.api.get_collection(id)?)?)
}

pub async fn save_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let body = params
        .get("collection")
        .cloned()
        .ok_or_else(|| CollbankError::InvalidParams {
            message: "Missing required parameter: collection".to_string(),
        })?;
    let coll: Collection = serde_json::from_value(body).map_err(|e| CollbankError::InvalidParams {
        message: format!("collection: {}", e),
    })?;
    let id = state.api.save_collection(coll)?;
    Ok(json!({ "collection_id": id }))
}

pub async fn delete_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    state.api.delete_collection(id)?;
    Ok(json!({ "collection_id": id }))
}

pub async fn copy_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    let copy = state.api.copy_collection(id)?;
    Ok(json!({
        "collection_id": copy.id,
        "identifier": copy.identifier,
    }))
}

pub async fn export_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    let full_header = get_bool_param(params, "full_header", "fullHeader").unwrap_or(false);
    let user = get_str_param(params, "user", "user");
    let exported = state.api.export_collection(id, full_header, user).await?;
    Ok(serde_json::to_value(exported)?)
}

pub async fn export_collections(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let ids = require_i64_list_param(params, "collection_ids", "collectionIds")?;
    let output_path = require_path_param(params, "output_path", "outputPath")?;
    let format = match get_str_param(params, "format", "format") {
        None => ArchiveFormat::default(),
        Some(raw) => ArchiveFormat::parse(raw).ok_or_else(|| CollbankError::InvalidParams {
            message: format!("Unknown export format '{}' (use xml, tar.gz or zip)", raw),
        })?,
    };
    let export = state.api.export_collections(&ids, &output_path, format).await?;
    Ok(serde_json::to_value(export)?)
}

pub async fn publish_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    let user = get_str_param(params, "user", "user");
    let report = state.api.publish_collection(id, user).await?;
    Ok(serde_json::to_value(report)?)
}

pub async fn validate_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    let user = get_str_param(params, "user", "user");
    let issues = state.api.validate_collection(id, user).await?;
    Ok(json!({
        "valid": issues.is_empty(),
        "issues": issues,
    }))
}

pub async fn evaluate_collection(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    let publication = state.api.evaluate_collection(id)?;
    Ok(json!({ "state": publication }))
}

pub async fn register_collection_pid(
    state: &AppState,
    params: &Value,
) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "collection_id", "collectionId")?;
    let registration = state.api.register_collection_pid(id).await?;
    Ok(serde_json::to_value(registration)?)
}

pub async fn import_cmdi(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let path = require_path_param(params, "path", "path")?;
    let collector = require_str_param(params, "collector", "collector")?;
    let outcome = state
        .api
        .import_cmdi(XmlSource::Path(path), &collector)
        .await?;
    Ok(serde_json::to_value(outcome)?)
}
