//! Builder for configuring CollbankApi initialization.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{PathsConfig, PublishConfig};
use crate::error::{CollbankError, Result};
use crate::migrate::run_startup_migrations;
use crate::pid::PidService;
use crate::publish::PublicationTracker;
use crate::store::CatalogueStore;
use crate::vocabulary::{CodeList, Vocabulary};
use crate::CollbankApi;

/// Builder for configuring CollbankApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use collbank_core::{CollbankApi, EpicPidService};
/// use std::sync::Arc;
///
/// let epic = EpicPidService::new("https://epic.example.org/api/v2/handles/21.11114", "user", "secret", None)?;
/// let api = CollbankApi::builder("./data")
///     .registry_url("https://collbank.example.org/registry/")
///     .pid_service(Arc::new(epic))
///     .build()?;
/// ```
pub struct CollbankApiBuilder {
    data_dir: PathBuf,
    publish: Option<PublishConfig>,
    registry_url: Option<String>,
    pid_service: Option<Arc<dyn PidService>>,
    run_migrations: bool,
}

impl CollbankApiBuilder {
    /// Create a new builder with the data directory holding the catalogue.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            publish: None,
            registry_url: None,
            pid_service: None,
            run_migrations: true,
        }
    }

    /// Use explicit registry and feed directories.
    ///
    /// Default: `registry/` and `publish/` under the data directory.
    pub fn publish_config(mut self, config: PublishConfig) -> Self {
        self.publish = Some(config);
        self
    }

    /// Public base URL of the registry directory. Overrides the URL of
    /// [`publish_config`](Self::publish_config).
    pub fn registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = Some(url.into());
        self
    }

    /// Handle service used by PID registration.
    ///
    /// Without one, registration reports an error status.
    pub fn pid_service(mut self, service: Arc<dyn PidService>) -> Self {
        self.pid_service = Some(service);
        self
    }

    /// Run the startup data migrations when opening.
    ///
    /// Default: `true`
    pub fn run_migrations(mut self, enable: bool) -> Self {
        self.run_migrations = enable;
        self
    }

    /// Open the catalogue and build the CollbankApi instance.
    pub fn build(self) -> Result<CollbankApi> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| CollbankError::Io {
                message: format!("Failed to create data directory: {}", self.data_dir.display()),
                path: Some(self.data_dir.clone()),
                source: Some(e),
            })?;
        }

        let store = CatalogueStore::open_in(&self.data_dir)?;
        let vocab = Vocabulary::load(&store);
        if vocab.is_empty() {
            warn!("Vocabulary is empty; labels will fall back to placeholders");
        }
        let codes = store.code_list().unwrap_or_else(|e| {
            warn!("ISO code lists unavailable: {}", e);
            CodeList::default()
        });

        if self.run_migrations {
            let report = run_startup_migrations(&store, &vocab)?;
            if !report.is_noop() {
                info!("Startup migrations rewrote {} collections", report.collections_rewritten);
            }
        }

        let mut publish = self.publish.unwrap_or_else(|| {
            PublishConfig::under(&self.data_dir, PathsConfig::DEFAULT_REGISTRY_URL)
        });
        if let Some(url) = self.registry_url {
            publish.registry_url = url;
        }
        info!(
            "Publishing to {} and {}",
            publish.registry_dir.display(),
            publish.publish_dir.display()
        );
        if self.pid_service.is_none() {
            warn!("No PID service configured; handle registration is disabled");
        }

        Ok(CollbankApi {
            data_dir: self.data_dir,
            store,
            vocab: RwLock::new(Arc::new(vocab)),
            codes: RwLock::new(Arc::new(codes)),
            tracker: PublicationTracker::new(publish),
            pid_service: self.pid_service,
        })
    }
}
