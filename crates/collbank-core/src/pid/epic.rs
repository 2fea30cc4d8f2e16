//! ePIC handle API client.

use super::{PidReply, PidService, PidTarget};
use crate::config::{AppConfig, PidConfig};
use crate::error::{CollbankError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// One value of a handle record.
#[derive(Debug, Deserialize)]
struct HandleValue {
    #[serde(rename = "type")]
    value_type: String,
    #[serde(default)]
    parsed_data: Value,
}

#[derive(Debug, Deserialize)]
struct CreateReply {
    #[serde(rename = "epic-pid")]
    epic_pid: String,
}

/// Handle service speaking the ePIC v2 REST API with basic auth.
pub struct EpicPidService {
    client: Client,
    /// Handle collection URL, e.g. `https://epic.example.org/api/v2/handles/21.11114`.
    base_url: String,
    user: String,
    password: String,
    prefix: String,
}

impl EpicPidService {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        prefix: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(PidConfig::REQUEST_TIMEOUT)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| CollbankError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            password: password.into(),
            prefix: prefix.unwrap_or_else(|| PidConfig::DEFAULT_PREFIX.to_string()),
        })
    }

    fn lookup_url(&self, file_name: &str) -> String {
        format!("{}/?URL=*/{}", self.base_url, urlencoding::encode(file_name))
    }

    fn handle_url(&self, pidname: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(pidname))
    }

    fn url_payload(url: &str) -> Value {
        json!([{ "type": "URL", "parsed_data": url }])
    }

    /// URL a handle currently resolves to, empty when it has none.
    async fn current_url(&self, pidname: &str) -> Result<String> {
        let response = self
            .client
            .get(self.handle_url(pidname))
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Ok(String::new());
        }
        let values: Vec<HandleValue> = response.json().await?;
        Ok(url_from_values(&values))
    }
}

fn url_from_values(values: &[HandleValue]) -> String {
    values
        .iter()
        .find(|v| v.value_type == "URL")
        .and_then(|v| v.parsed_data.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Interpret the body of a lookup by URL.
fn parse_lookup(body: &str) -> Result<String> {
    if body.trim().is_empty() {
        return Ok(PidConfig::NOT_REGISTERED.to_string());
    }
    let hits: Vec<String> = serde_json::from_str(body)?;
    match hits.as_slice() {
        [] => Ok(PidConfig::NOT_REGISTERED.to_string()),
        [one] => Ok(one.clone()),
        many => Err(CollbankError::PidService {
            message: format!("{} handles point at the same file", many.len()),
        }),
    }
}

/// Last path segment of the service URL.
fn domain_of(base_url: &str) -> String {
    base_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl PidService for EpicPidService {
    async fn get_pid(&self, target: &PidTarget) -> Result<String> {
        let response = self
            .client
            .get(self.lookup_url(&target.file_name))
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(PidConfig::NOT_REGISTERED.to_string()),
            status if status.is_success() => parse_lookup(&response.text().await?),
            status => {
                debug!("PID lookup for {} returned {}", target.file_name, status);
                Ok(String::new())
            }
        }
    }

    async fn create_pid(&self, target: &PidTarget) -> Result<PidReply> {
        let response = self
            .client
            .post(format!("{}?prefix={}", self.base_url, urlencoding::encode(&self.prefix)))
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
            .json(&Self::url_payload(&target.url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(PidReply::error(format!("code {}", status.as_u16())));
        }
        let reply: CreateReply = response.json().await?;
        Ok(PidReply::ok(Some(reply.epic_pid)))
    }

    async fn check_and_update_pid(&self, pidname: &str, target: &PidTarget) -> Result<PidReply> {
        let current = self.current_url(pidname).await?;
        if current == target.url {
            return Ok(PidReply::ok(Some(pidname.to_string())));
        }

        debug!("Retargeting {} from '{}' to '{}'", pidname, current, target.url);
        let response = self
            .client
            .put(self.handle_url(pidname))
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
            .json(&Self::url_payload(&target.url))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(PidReply::ok(Some(pidname.to_string())))
        } else {
            Ok(PidReply::error(format!("code {}", status.as_u16())))
        }
    }

    fn get_domain(&self) -> String {
        domain_of(&self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EpicPidService {
        EpicPidService::new("https://epic.example.org/api/v2/handles/21.11114/", "u", "p", None).unwrap()
    }

    #[test]
    fn test_urls() {
        let service = service();
        assert_eq!(
            service.lookup_url("oh_vlometadata_00042"),
            "https://epic.example.org/api/v2/handles/21.11114/?URL=*/oh_vlometadata_00042"
        );
        assert_eq!(
            service.handle_url("COLL-0000-0001"),
            "https://epic.example.org/api/v2/handles/21.11114/COLL-0000-0001"
        );
        assert_eq!(service.get_domain(), "21.11114");
    }

    #[test]
    fn test_parse_lookup() {
        assert_eq!(parse_lookup("").unwrap(), "-");
        assert_eq!(parse_lookup("[]").unwrap(), "-");
        assert_eq!(parse_lookup(r#"["21.11114/COLL-1"]"#).unwrap(), "21.11114/COLL-1");
        assert!(parse_lookup(r#"["a", "b"]"#).is_err());
        assert!(parse_lookup("not json").is_err());
    }

    #[test]
    fn test_url_from_handle_values() {
        let values: Vec<HandleValue> = serde_json::from_str(
            r#"[{"type":"HS_ADMIN","parsed_data":{"index":200}},
                {"type":"URL","parsed_data":"https://example.org/registry/x"}]"#,
        )
        .unwrap();
        assert_eq!(url_from_values(&values), "https://example.org/registry/x");
        assert_eq!(url_from_values(&[]), "");
    }
}
