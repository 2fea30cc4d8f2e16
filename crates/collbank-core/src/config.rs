//! Centralized configuration for the collbank catalogue.
//!
//! Compile-time constants are grouped in unit structs; the only runtime
//! configuration is [`PublishConfig`], which is read once at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Collbank";
    pub const USER_AGENT: &'static str = "Collbank/0.3";
}

/// CMDI output constants.
pub struct CmdiConfig;

impl CmdiConfig {
    pub const NAMESPACE: &'static str = "http://www.clarin.eu/cmd/";
    pub const XSD_NAMESPACE: &'static str = "http://www.w3.org/2001/XMLSchema/";
    pub const XSI_NAMESPACE: &'static str = "http://www.w3.org/2001/XMLSchema-instance/";
    pub const VERSION_ATTRIBUTE: &'static str = "CMDVersion";
    pub const VERSION: &'static str = "1.1";
    pub const PROFILE_ID: &'static str = "clarin.eu:cr1:p_1493735943947";
    pub const PROFILE_XSD_BASE: &'static str =
        "https://catalog.clarin.eu/ds/ComponentRegistry/rest/registry/1.1/profiles/";
    pub const COMPONENT_NAME: &'static str = "CorpusCollection";
    pub const DEFAULT_MIMETYPE: &'static str = "application/x-http";
    pub const RELATION_MIMETYPE: &'static str = "text/tab-separated-values";
    pub const SEARCH_MIMETYPE: &'static str = "application/sru+xml";
    pub const INDENT_SIZE: usize = 2;
    pub const MAX_IDENTIFIER_LENGTH: usize = 10;

    /// Value of `xsi:schemaLocation` on the root element.
    pub fn schema_location() -> String {
        format!(
            "{} {}{}/xsd/",
            Self::NAMESPACE,
            Self::PROFILE_XSD_BASE,
            Self::PROFILE_ID
        )
    }
}

/// PID (handle) service configuration.
pub struct PidConfig;

impl PidConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_PREFIX: &'static str = "COLL";
    /// Returned by `get_pid` when no handle points at the item yet.
    pub const NOT_REGISTERED: &'static str = "-";
}

/// SQLite catalogue configuration.
pub struct RegistryConfig;

impl RegistryConfig {
    pub const BUSY_TIMEOUT_MS: u32 = 5000;
    pub const DB_FILE_NAME: &'static str = "collbank.sqlite";
}

/// Shared directory and path configurations.
pub struct PathsConfig;

impl PathsConfig {
    pub const DATA_DIR_NAME: &'static str = "collbank";
    pub const REGISTRY_DIR_NAME: &'static str = "registry";
    pub const PUBLISH_DIR_NAME: &'static str = "publish";
    pub const FEED_SUFFIX: &'static str = ".cmdi.xml";
    pub const VLO_FILE_INFIX: &'static str = "vlometadata";
    /// Registry base URL used when none is configured.
    pub const DEFAULT_REGISTRY_URL: &'static str = "http://localhost:8000/registry/";
}

/// Output locations for published records.
///
/// Both directories are process-wide and never change after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Directory holding the plain registry copies.
    pub registry_dir: PathBuf,
    /// Directory holding the `.cmdi.xml` ingestion feed.
    pub publish_dir: PathBuf,
    /// Public base URL of the registry directory.
    pub registry_url: String,
}

impl PublishConfig {
    pub fn new(
        registry_dir: impl Into<PathBuf>,
        publish_dir: impl Into<PathBuf>,
        registry_url: impl Into<String>,
    ) -> Self {
        Self {
            registry_dir: registry_dir.into(),
            publish_dir: publish_dir.into(),
            registry_url: registry_url.into(),
        }
    }

    /// Layout rooted under a single data directory.
    pub fn under(data_dir: &Path, registry_url: impl Into<String>) -> Self {
        Self::new(
            data_dir.join(PathsConfig::REGISTRY_DIR_NAME),
            data_dir.join(PathsConfig::PUBLISH_DIR_NAME),
            registry_url,
        )
    }

    /// Public URL of a registry file.
    pub fn registry_url_for(&self, file_name: &str) -> String {
        if self.registry_url.ends_with('/') {
            format!("{}{}", self.registry_url, file_name)
        } else {
            format!("{}/{}", self.registry_url, file_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_location() {
        let loc = CmdiConfig::schema_location();
        assert!(loc.starts_with("http://www.clarin.eu/cmd/ https://catalog.clarin.eu/"));
        assert!(loc.ends_with("p_1493735943947/xsd/"));
    }

    #[test]
    fn test_registry_url_for() {
        let config = PublishConfig::new("/r", "/p", "https://example.org/registry");
        assert_eq!(
            config.registry_url_for("oh_vlometadata_00001"),
            "https://example.org/registry/oh_vlometadata_00001"
        );
        let config = PublishConfig::new("/r", "/p", "https://example.org/registry/");
        assert_eq!(
            config.registry_url_for("x"),
            "https://example.org/registry/x"
        );
    }
}
