//! Response wrapping for RPC clients.
//!
//! Clients expect every result as `{success: bool, ...data}`. Handlers
//! return the raw core value and this module shapes it: lists get a named
//! field, objects get a `success` flag unless they already report one.

use serde_json::{json, Map, Value};

/// Body of a failed action.
pub fn failure_body(msg: &str) -> Value {
    json!({
        "success": false,
        "status": "error",
        "msg": msg,
    })
}

fn list_under(key: &str, result: Value) -> Value {
    let mut fields = Map::new();
    fields.insert("success".to_string(), Value::Bool(true));
    fields.insert(
        key.to_string(),
        if result.is_null() { json!([]) } else { result },
    );
    Value::Object(fields)
}

fn with_success(mut fields: Map<String, Value>, success: bool) -> Value {
    fields
        .entry("success")
        .or_insert(Value::Bool(success));
    Value::Object(fields)
}

/// Wrap a raw handler result for `method`.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // List wrappers
        "list_collections" => list_under("collections", result),
        "list_vlo_items" => list_under("items", result),
        "get_choice_list" => list_under("choices", result),

        // Single records
        "get_collection" => json!({
            "success": true,
            "collection": result
        }),

        // PID registration reports its own status
        "register_pid" | "register_collection_pid" => match result {
            Value::Object(fields) => {
                let ok = fields.get("status").and_then(|s| s.as_str()) == Some("ok");
                with_success(fields, ok)
            }
            other => other,
        },

        // Default: flag objects as successful, pass anything else through
        _ => match result {
            Value::Object(fields) => with_success(fields, true),
            Value::Null => json!({"success": true}),
            other => other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lists() {
        let wrapped = wrap_response("list_collections", json!([{"id": 1}]));
        assert_eq!(wrapped, json!({"success": true, "collections": [{"id": 1}]}));

        let wrapped = wrap_response("list_vlo_items", Value::Null);
        assert_eq!(wrapped, json!({"success": true, "items": []}));
    }

    #[test]
    fn test_publish_report_keeps_its_own_success() {
        let report = json!({"file_name": "x", "success": false, "files": []});
        assert_eq!(wrap_response("publish_item", report.clone()), report);
    }

    #[test]
    fn test_register_pid_error_status_is_not_success() {
        let wrapped = wrap_response(
            "register_pid",
            json!({"status": "error", "msg": "PID service not configured", "pidname": null}),
        );
        assert_eq!(wrapped["success"], json!(false));
        assert_eq!(wrapped["msg"], json!("PID service not configured"));

        let wrapped = wrap_response("register_pid", json!({"status": "ok", "msg": "unchanged"}));
        assert_eq!(wrapped["success"], json!(true));
    }

    #[test]
    fn test_failure_body() {
        assert_eq!(
            failure_body("boom"),
            json!({"success": false, "status": "error", "msg": "boom"})
        );
    }
}
