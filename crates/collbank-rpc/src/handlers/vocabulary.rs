//! Vocabulary handlers.

use super::{get_str_param, require_path_param, require_str_param};
use crate::server::AppState;
use collbank_core::ChoicePosition;
use serde_json::{json, Value};

pub async fn get_choice_list(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let field = require_str_param(params, "field", "field")?;
    let position = ChoicePosition::from_parts(
        get_str_param(params, "position", "position"),
        get_str_param(params, "subcategory", "subcategory"),
    );
    let choices = state.api.get_choice_list(&field, &position).await;
    Ok(serde_json::to_value(choices)?)
}

pub async fn import_vocabulary(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let path = require_path_param(params, "path", "path")?;
    let summary = state.api.import_vocabulary(&path).await?;
    Ok(serde_json::to_value(summary)?)
}

pub async fn import_code_list(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let path = require_path_param(params, "path", "path")?;
    let count = state.api.import_code_list(&path).await?;
    Ok(json!({ "count": count }))
}
