//! Collbank Core - catalogue, CMDI export and publication for linguistic
//! resource collections.
//!
//! This crate holds the collection catalogue and everything needed to get
//! its records into the CLARIN infrastructure: exporting collections as
//! CMDI documents, repairing hand-made VLO records, publishing both to the
//! registry and harvester feed directories, and registering handles for
//! them. It can be used programmatically without the RPC server.
//!
//! # Example
//!
//! ```rust,ignore
//! use collbank_core::{CollbankApi, PublishConfig};
//!
//! #[tokio::main]
//! async fn main() -> collbank_core::Result<()> {
//!     let api = CollbankApi::builder("/srv/collbank")
//!         .publish_config(PublishConfig::under(
//!             "/srv/collbank".as_ref(),
//!             "https://collbank.example.org/registry",
//!         ))
//!         .build()?;
//!
//!     for summary in api.list_collections()? {
//!         let exported = api.export_collection(summary.id, false, None).await?;
//!         println!("{}: {} bytes", exported.file_name, exported.xml.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cmdi;
pub mod config;
pub mod error;
pub mod migrate;
pub mod model;
pub mod pid;
pub mod publish;
pub mod store;
pub mod vocabulary;

mod api;

pub use api::{CollbankApiBuilder, ExportedXml};
pub use cmdi::{
    ArchiveFormat, BulkExport, ExportOptions, ImportOutcome, ImportStatus, ProfileIssue, RepairOutcome,
    XmlDocument, XmlSource,
};
pub use config::PublishConfig;
pub use error::{CollbankError, Result};
pub use migrate::{run_startup_migrations, MigrationReport};
pub use model::{
    Collection, CollectionSummary, PidRecord, Publishable, RecordKind, SourceInfo, VloItem,
    VloItemSummary,
};
pub use pid::{register_pid, EpicPidService, PidRegistration, PidService, PidStatus};
pub use publish::{PublicationState, PublicationTracker, PublishReport};
pub use store::CatalogueStore;
pub use vocabulary::{Choice, ChoicePosition, CodeList, ImportSummary, Vocabulary};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main entry point for catalogue operations.
///
/// Owns the store, the publication tracker and the optional handle
/// service. The vocabulary and ISO code lists are loaded once and handed
/// out as `Arc` snapshots; importing a new fixture swaps the snapshot
/// rather than mutating it.
pub struct CollbankApi {
    data_dir: PathBuf,
    store: CatalogueStore,
    vocab: RwLock<Arc<Vocabulary>>,
    codes: RwLock<Arc<CodeList>>,
    tracker: PublicationTracker,
    pid_service: Option<Arc<dyn PidService>>,
}

impl CollbankApi {
    /// Create a builder for CollbankApi.
    ///
    /// Use the builder to set the publication directories, the registry
    /// URL and the handle service.
    pub fn builder(data_dir: impl Into<PathBuf>) -> CollbankApiBuilder {
        CollbankApiBuilder::new(data_dir)
    }

    /// Open the catalogue in `data_dir` with publication directories
    /// beneath it and no handle service.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(data_dir).build()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store(&self) -> &CatalogueStore {
        &self.store
    }

    pub fn tracker(&self) -> &PublicationTracker {
        &self.tracker
    }

    /// Whether a handle service was configured.
    pub fn has_pid_service(&self) -> bool {
        self.pid_service.is_some()
    }
}
