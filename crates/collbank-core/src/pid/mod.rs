//! Persistent identifier registration.
//!
//! The handle service is reached through [`PidService`]; [`register_pid`]
//! drives it to obtain or create a PID for a record and to point that PID
//! at the record's registry URL. Service trouble never aborts the caller:
//! it comes back as [`PidStatus::Error`] with the record untouched.

mod epic;

pub use epic::EpicPidService;

use crate::config::PidConfig;
use crate::error::{CollbankError, Result};
use crate::model::{PidRecord, Publishable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome reported by the PID service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PidStatus {
    Ok,
    Error,
}

/// What the service needs to know about a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidTarget {
    /// Registry file name the handle URL ends with.
    pub file_name: String,
    /// URL the handle should resolve to.
    pub url: String,
}

/// Reply of `create_pid` and `check_and_update_pid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidReply {
    pub status: PidStatus,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub msg: String,
}

impl PidReply {
    pub fn ok(pid: Option<String>) -> Self {
        Self {
            status: PidStatus::Ok,
            pid,
            msg: String::new(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: PidStatus::Error,
            pid: None,
            msg: msg.into(),
        }
    }
}

/// A handle service able to look up, mint and retarget PIDs.
#[async_trait]
pub trait PidService: Send + Sync {
    /// Existing PID pointing at `target.file_name`, or
    /// [`PidConfig::NOT_REGISTERED`] when there is none. An empty string
    /// signals a failed lookup.
    async fn get_pid(&self, target: &PidTarget) -> Result<String>;

    /// Mint a new PID resolving to `target.url`.
    async fn create_pid(&self, target: &PidTarget) -> Result<PidReply>;

    /// Make `pidname` resolve to `target.url`.
    async fn check_and_update_pid(&self, pidname: &str, target: &PidTarget) -> Result<PidReply>;

    /// Handle prefix, such as `21.11114`.
    fn get_domain(&self) -> String;
}

/// Result of [`register_pid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PidRegistration {
    pub status: PidStatus,
    pub msg: String,
    pub pidname: Option<String>,
    /// The record's PID fields were updated and need saving.
    pub changed: bool,
}

impl PidRegistration {
    pub(crate) fn failed(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        warn!("PID registration failed: {}", msg);
        Self {
            status: PidStatus::Error,
            msg,
            pidname: None,
            changed: false,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PidStatus::Ok
    }
}

/// Part of a handle after the last `/`.
fn bare_pidname(pid: &str) -> &str {
    pid.rsplit_once('/').map_or(pid, |(_, name)| name).trim()
}

async fn bounded<T>(limit: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| CollbankError::Timeout(limit))?
}

/// Obtain or create a PID for `item` and point it at `target_url`.
///
/// The item's PID fields are only written when the service confirmed the
/// target; [`PidRegistration::changed`] tells the caller to persist them.
pub async fn register_pid<P: Publishable + ?Sized>(
    service: &dyn PidService,
    item: &mut P,
    target_url: &str,
) -> PidRegistration {
    register_pid_within(service, item, target_url, PidConfig::REQUEST_TIMEOUT).await
}

/// [`register_pid`] with an explicit per-call time limit.
pub async fn register_pid_within<P: Publishable + ?Sized>(
    service: &dyn PidService,
    item: &mut P,
    target_url: &str,
    limit: Duration,
) -> PidRegistration {
    let target = PidTarget {
        file_name: item.registry_file_name(),
        url: target_url.to_string(),
    };

    let found = match bounded(limit, service.get_pid(&target)).await {
        Ok(found) => found,
        Err(e) => return PidRegistration::failed(format!("lookup of {}: {}", target.file_name, e)),
    };
    let found = found.trim();

    let full_pid = if found.is_empty() {
        return PidRegistration::failed(format!(
            "lookup of {} returned no answer",
            target.file_name
        ));
    } else if found == PidConfig::NOT_REGISTERED {
        debug!("No PID for {} yet, creating one", target.file_name);
        match bounded(limit, service.create_pid(&target)).await {
            Ok(PidReply {
                status: PidStatus::Ok,
                pid: Some(pid),
                ..
            }) if !pid.trim().is_empty() => pid,
            Ok(reply) => {
                return PidRegistration::failed(format!("creating PID: {}", reply.msg));
            }
            Err(e) => return PidRegistration::failed(format!("creating PID: {}", e)),
        }
    } else {
        found.to_string()
    };
    let pidname = bare_pidname(&full_pid).to_string();

    match bounded(limit, service.check_and_update_pid(&pidname, &target)).await {
        Ok(reply) if reply.status == PidStatus::Ok => {}
        Ok(reply) => {
            return PidRegistration::failed(format!("updating {}: {}", pidname, reply.msg));
        }
        Err(e) => return PidRegistration::failed(format!("updating {}: {}", pidname, e)),
    }

    let candidate = PidRecord {
        pidname: Some(pidname.clone()),
        handle_domain: service.get_domain(),
        url: target.url,
    };
    let changed = *item.pid() != candidate;
    if changed {
        *item.pid_mut() = candidate;
        info!("PID of {} is now {}", item.display_name(), pidname);
    }

    PidRegistration {
        status: PidStatus::Ok,
        msg: if changed { "registered" } else { "unchanged" }.to_string(),
        pidname: Some(pidname),
        changed,
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// In-memory handle service recording the calls it receives.
    #[derive(Default)]
    pub struct FakePidService {
        pub existing: Option<String>,
        pub lookup_fails: bool,
        pub update_fails: bool,
        pub delay: Option<Duration>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakePidService {
        fn record(&self, call: String) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl PidService for FakePidService {
        async fn get_pid(&self, target: &PidTarget) -> Result<String> {
            self.record(format!("get {}", target.file_name));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.lookup_fails {
                return Ok(String::new());
            }
            Ok(self
                .existing
                .clone()
                .unwrap_or_else(|| PidConfig::NOT_REGISTERED.to_string()))
        }

        async fn create_pid(&self, target: &PidTarget) -> Result<PidReply> {
            self.record(format!("create {}", target.url));
            Ok(PidReply::ok(Some("21.11114/COLL-0000-0001".into())))
        }

        async fn check_and_update_pid(&self, pidname: &str, target: &PidTarget) -> Result<PidReply> {
            self.record(format!("check {} {}", pidname, target.url));
            if self.update_fails {
                return Ok(PidReply::error("code 401"));
            }
            Ok(PidReply::ok(Some(pidname.to_string())))
        }

        fn get_domain(&self) -> String {
            "21.11114".into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakePidService;
    use super::*;
    use crate::model::VloItem;

    const URL: &str = "https://example.org/registry/oh_vlometadata_00042";

    fn item() -> VloItem {
        let mut item = VloItem::new("oh", "Oral history", "<CMD/>");
        item.id = Some(42);
        item
    }

    #[tokio::test]
    async fn test_creates_pid_when_none_exists() {
        let service = FakePidService::default();
        let mut item = item();
        let reg = register_pid(&service, &mut item, URL).await;

        assert!(reg.is_ok());
        assert!(reg.changed);
        assert_eq!(reg.pidname.as_deref(), Some("COLL-0000-0001"));
        assert_eq!(item.pid.self_link().as_deref(), Some("hdl:21.11114/COLL-0000-0001"));
        assert_eq!(item.pid.url, URL);
        assert_eq!(
            service.calls(),
            vec![
                "get oh_vlometadata_00042".to_string(),
                format!("create {}", URL),
                format!("check COLL-0000-0001 {}", URL),
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_pid_is_reused_and_unchanged_second_time() {
        let service = FakePidService {
            existing: Some("21.11114/COLL-0000-0009".into()),
            ..Default::default()
        };
        let mut item = item();
        assert!(register_pid(&service, &mut item, URL).await.changed);

        let again = register_pid(&service, &mut item, URL).await;
        assert!(again.is_ok());
        assert!(!again.changed);
        assert_eq!(again.msg, "unchanged");
        assert!(!service.calls().iter().any(|c| c.starts_with("create")));
    }

    #[tokio::test]
    async fn test_failures_leave_record_untouched() {
        for service in [
            FakePidService {
                lookup_fails: true,
                ..Default::default()
            },
            FakePidService {
                update_fails: true,
                ..Default::default()
            },
        ] {
            let mut item = item();
            let reg = register_pid(&service, &mut item, URL).await;
            assert_eq!(reg.status, PidStatus::Error);
            assert!(!reg.changed);
            assert_eq!(item.pid, PidRecord::default());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_service_times_out() {
        let service = FakePidService {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let mut item = item();
        let reg = register_pid_within(&service, &mut item, URL, Duration::from_secs(1)).await;
        assert_eq!(reg.status, PidStatus::Error);
        assert!(reg.msg.contains("Request timeout"), "{}", reg.msg);
    }

    #[test]
    fn test_bare_pidname() {
        assert_eq!(bare_pidname("21.11114/COLL-1"), "COLL-1");
        assert_eq!(bare_pidname("COLL-1"), "COLL-1");
    }
}
