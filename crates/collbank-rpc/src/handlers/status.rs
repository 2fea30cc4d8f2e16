//! Status handlers.

use crate::server::AppState;
use serde_json::{json, Value};

pub async fn health_check(state: &AppState, _params: &Value) -> collbank_core::Result<Value> {
    Ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "pid_service": state.api.has_pid_service(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{call, create_test_state};
    use serde_json::json;

    #[tokio::test]
    async fn test_health_check() {
        let (state, _temp_dir) = create_test_state();
        let result = call(&state, "health_check", json!({})).await.unwrap();
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["status"], json!("ok"));
        assert_eq!(result["version"], json!(env!("CARGO_PKG_VERSION")));
        assert_eq!(result["pid_service"], json!(false));
    }
}
