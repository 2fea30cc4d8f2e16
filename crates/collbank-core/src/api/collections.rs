//! Collection catalogue, export and publication methods.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::cmdi::{
    check_profile, export_collection, ArchiveFormat, BulkExport, CollectionExporter, ExportOptions,
    ImportOutcome, ProfileIssue, XmlSource,
};
use crate::error::{CollbankError, Result};
use crate::model::{Collection, CollectionSummary, Publishable};
use crate::pid::{register_pid, PidRegistration};
use crate::publish::{PublicationState, PublishReport};
use crate::CollbankApi;

/// A single exported CMDI document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedXml {
    pub xml: String,
    pub file_name: String,
}

impl CollbankApi {
    // ========================================
    // Catalogue
    // ========================================

    pub fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        self.store.list_collections()
    }

    pub fn get_collection(&self, id: i64) -> Result<Collection> {
        self.store.get_collection(id)
    }

    /// Insert or update a collection. Returns its id.
    pub fn save_collection(&self, mut coll: Collection) -> Result<i64> {
        coll.prune_blank();
        self.store.save_collection(&mut coll)
    }

    /// Store a deep copy of a collection, with a fresh identifier and no
    /// PID. Returns the copy.
    pub fn copy_collection(&self, id: i64) -> Result<Collection> {
        self.store.copy_collection(id)
    }

    /// Import a CMDI collection document.
    pub async fn import_cmdi(&self, source: XmlSource, collector: &str) -> Result<ImportOutcome> {
        let vocab = self.vocabulary().await;
        self.store.import_cmdi(source, &vocab, collector)
    }

    // ========================================
    // Export
    // ========================================

    /// Export one collection as CMDI.
    ///
    /// `full_header` adds the creator, self link and profile to the header,
    /// as written on publication.
    pub async fn export_collection(
        &self,
        id: i64,
        full_header: bool,
        user: Option<&str>,
    ) -> Result<ExportedXml> {
        let coll = self.store.get_collection(id)?;
        let options = self.export_options(full_header, user);
        let vocab = self.vocabulary().await;
        let codes = self.codes().await;
        let xml = export_collection(&coll, &vocab, &codes, &options)?;
        Ok(ExportedXml {
            xml,
            file_name: format!("{}.xml", coll.xml_file_name()),
        })
    }

    /// Export several collections into one file at `output_path`.
    pub async fn export_collections(
        &self,
        ids: &[i64],
        output_path: &Path,
        format: ArchiveFormat,
    ) -> Result<BulkExport> {
        let options = self.export_options(false, None);
        let vocab = self.vocabulary().await;
        let codes = self.codes().await;
        let export = self
            .store
            .export_collections(ids, &vocab, &codes, &options, output_path, format)?;
        info!(
            "Exported {} collections to {}",
            export.count,
            export.output_path.display()
        );
        Ok(export)
    }

    /// Check the document publication would write against the
    /// CorpusCollection profile. An empty list means it can be published.
    pub async fn validate_collection(&self, id: i64, user: Option<&str>) -> Result<Vec<ProfileIssue>> {
        let coll = self.store.get_collection(id)?;
        let options = self.export_options(true, user);
        let vocab = self.vocabulary().await;
        let codes = self.codes().await;
        let doc = CollectionExporter::new(&vocab, &codes, &options).export(&coll)?;
        Ok(check_profile(&doc))
    }

    fn export_options(&self, full_header: bool, user: Option<&str>) -> ExportOptions {
        ExportOptions {
            full_header,
            user: user.map(str::to_string),
            registry_url: self.tracker.config().registry_url.clone(),
        }
    }

    // ========================================
    // Publication
    // ========================================

    pub async fn publish_collection(&self, id: i64, user: Option<&str>) -> Result<PublishReport> {
        let coll = self.store.get_collection(id)?;
        let vocab = self.vocabulary().await;
        let codes = self.codes().await;
        self.tracker.publish_collection(&coll, &vocab, &codes, user)
    }

    pub fn evaluate_collection(&self, id: i64) -> Result<PublicationState> {
        let coll = self.store.get_collection(id)?;
        Ok(self.tracker.evaluate(&coll))
    }

    /// Obtain or refresh the handle of a collection and store it.
    pub async fn register_collection_pid(&self, id: i64) -> Result<PidRegistration> {
        let mut coll = self.store.get_collection(id)?;
        let Some(service) = self.pid_service.as_deref() else {
            return Ok(PidRegistration::failed("PID service not configured"));
        };

        let target_url = self.tracker.target_url(&coll);
        let registration = register_pid(service, &mut coll, &target_url).await;
        if registration.changed {
            self.store.update_pid(coll.record_kind(), id, &coll.pid)?;
        }
        Ok(registration)
    }

    /// Delete a collection. Published copies are left in place.
    pub fn delete_collection(&self, id: i64) -> Result<()> {
        if self.store.delete_collection(id)? {
            Ok(())
        } else {
            warn!("Delete of unknown collection {}", id);
            Err(CollbankError::not_found(format!("collection {}", id)))
        }
    }
}
