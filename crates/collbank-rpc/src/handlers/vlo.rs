//! VLO item handlers.

use super::{get_bool_param, get_i64_param, get_str_param, require_i64_param, require_str_param};
use crate::server::AppState;
use collbank_core::{CollbankError, XmlSource};
use serde_json::{json, Value};
use std::path::PathBuf;

pub async fn list_vlo_items(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let orphans_only = get_bool_param(params, "orphans_only", "orphansOnly").unwrap_or(false);
    Ok(serde_json::to_value(state.api.list_vlo_items(orphans_only)?)?)
}

pub async fn create_vlo_item(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let abbr = require_str_param(params, "abbr", "abbr")?;
    let title = get_str_param(params, "title", "title").unwrap_or_default();
    let source = match (
        get_str_param(params, "xml", "xml"),
        get_str_param(params, "path", "path"),
    ) {
        (Some(xml), _) => XmlSource::Text(xml.to_string()),
        (None, Some(path)) => XmlSource::Path(PathBuf::from(path)),
        (None, None) => {
            return Err(CollbankError::InvalidParams {
                message: "Either xml or path is required".to_string(),
            })
        }
    };
    let collection_id = get_i64_param(params, "collection_id", "collectionId");
    let id = state
        .api
        .create_vlo_item(&abbr, title, source, collection_id)?;
    Ok(json!({ "item_id": id }))
}

pub async fn repair_item(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "item_id", "itemId")?;
    let self_link = get_str_param(params, "self_link", "selfLink");
    Ok(serde_json::to_value(state.api.repair_item(id, self_link)?)?)
}

pub async fn evaluate_item(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "item_id", "itemId")?;
    let publication = state.api.evaluate_item(id)?;
    Ok(json!({ "state": publication }))
}

pub async fn publish_item(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "item_id", "itemId")?;
    Ok(serde_json::to_value(state.api.publish_item(id)?)?)
}

pub async fn register_pid(state: &AppState, params: &Value) -> collbank_core::Result<Value> {
    let id = require_i64_param(params, "item_id", "itemId")?;
    let registration = state.api.register_pid(id).await?;
    Ok(serde_json::to_value(registration)?)
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{call, create_test_state, create_test_state_with_pid};
    use crate::server::AppState;
    use async_trait::async_trait;
    use collbank_core::pid::{PidReply, PidTarget};
    use collbank_core::{CollbankError, PidService};
    use serde_json::json;
    use std::sync::Arc;

    const ORAL_HISTORY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CMD xmlns="http://www.clarin.eu/cmd/">
  <Header>
    <MdProfile>clarin.eu:cr1:p_1</MdProfile>
  </Header>
  <Resources>
    <ResourceProxyList>
      <ResourceProxy id="x1">
        <ResourceType>LANDINGPAGE</ResourceType>
        <ResourceRef>https://example.org/oh/42</ResourceRef>
      </ResourceProxy>
    </ResourceProxyList>
  </Resources>
  <Components>
    <OralHistoryInterviewCRF>
      <ID>oh-42</ID>
      <Title>Voices of the dike</Title>
    </OralHistoryInterviewCRF>
  </Components>
</CMD>
"#;

    /// Handle service that always mints the same PID.
    struct MintingService;

    #[async_trait]
    impl PidService for MintingService {
        async fn get_pid(&self, _target: &PidTarget) -> collbank_core::Result<String> {
            Ok("-".to_string())
        }

        async fn create_pid(&self, _target: &PidTarget) -> collbank_core::Result<PidReply> {
            Ok(PidReply::ok(Some("21.11114/COLL-0000-0042".to_string())))
        }

        async fn check_and_update_pid(
            &self,
            pidname: &str,
            _target: &PidTarget,
        ) -> collbank_core::Result<PidReply> {
            Ok(PidReply::ok(Some(pidname.to_string())))
        }

        fn get_domain(&self) -> String {
            "21.11114".to_string()
        }
    }

    async fn created_item(state: &AppState) -> i64 {
        let result = call(
            state,
            "create_vlo_item",
            json!({"abbr": "oh", "xml": ORAL_HISTORY}),
        )
        .await
        .unwrap();
        result["item_id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (state, _temp_dir) = create_test_state();
        let id = created_item(&state).await;

        let listed = call(&state, "list_vlo_items", json!({"orphans_only": true}))
            .await
            .unwrap();
        let items = listed["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], json!(id));
        assert_eq!(items[0]["abbr"], json!("oh"));
    }

    #[tokio::test]
    async fn test_create_needs_a_document() {
        let (state, _temp_dir) = create_test_state();
        let err = call(&state, "create_vlo_item", json!({"abbr": "oh"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CollbankError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn test_repair_item() {
        let (state, _temp_dir) = create_test_state();
        let id = created_item(&state).await;

        let result = call(
            &state,
            "repair_item",
            json!({"item_id": id, "self_link": "hdl:21.11114/COLL-0000-0042"}),
        )
        .await
        .unwrap();
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["changed"], json!(true));
        assert_eq!(result["item_changed"], json!(true));
        let xml = result["xml"].as_str().unwrap();
        assert!(xml.contains(&format!("lp_ohmetadata_{:05}", id)));
        assert!(xml.contains("<MdSelfLink>hdl:21.11114/COLL-0000-0042</MdSelfLink>"));

        let again = call(&state, "repair_item", json!({"item_id": id, "self_link": "hdl:21.11114/COLL-0000-0042"}))
            .await
            .unwrap();
        assert_eq!(again["changed"], json!(false));
    }

    #[tokio::test]
    async fn test_repair_malformed_item_is_an_error() {
        let (state, _temp_dir) = create_test_state();
        let result = call(&state, "create_vlo_item", json!({"abbr": "oh", "xml": "<CMD><Header>"}))
            .await
            .unwrap();
        let id = result["item_id"].as_i64().unwrap();

        let err = call(&state, "repair_item", json!({"item_id": id})).await.unwrap_err();
        assert!(matches!(err, CollbankError::XmlParse { .. }));
    }

    #[tokio::test]
    async fn test_publish_then_evaluate() {
        let (state, temp_dir) = create_test_state();
        let id = created_item(&state).await;

        let before = call(&state, "evaluate_item", json!({"item_id": id})).await.unwrap();
        assert_eq!(before["state"], json!("unpublished"));

        let report = call(&state, "publish_item", json!({"item_id": id})).await.unwrap();
        assert_eq!(report["success"], json!(true));
        assert_eq!(report["files"].as_array().unwrap().len(), 2);
        assert!(temp_dir
            .path()
            .join("publish")
            .join(format!("oh_vlometadata_{:05}.cmdi.xml", id))
            .exists());

        let after = call(&state, "evaluate_item", json!({"item_id": id})).await.unwrap();
        assert_eq!(after["state"], json!("published"));
    }

    #[tokio::test]
    async fn test_register_pid_without_service() {
        let (state, _temp_dir) = create_test_state();
        let id = created_item(&state).await;
        let result = call(&state, "register_pid", json!({"item_id": id})).await.unwrap();
        assert_eq!(result["success"], json!(false));
        assert_eq!(result["status"], json!("error"));
    }

    #[tokio::test]
    async fn test_register_pid_stores_handle() {
        let (state, _temp_dir) = create_test_state_with_pid(Arc::new(MintingService));
        let id = created_item(&state).await;

        let result = call(&state, "register_pid", json!({"item_id": id})).await.unwrap();
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["pidname"], json!("COLL-0000-0042"));

        let item = state.api.get_vlo_item(id).unwrap();
        assert_eq!(item.pid.self_link().as_deref(), Some("hdl:21.11114/COLL-0000-0042"));
        assert_eq!(
            item.pid.url,
            format!("https://example.org/registry/oh_vlometadata_{:05}", id)
        );

        let again = call(&state, "register_pid", json!({"item_id": id})).await.unwrap();
        assert_eq!(again["msg"], json!("unchanged"));
    }
}
