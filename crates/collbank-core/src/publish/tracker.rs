//! Publication state and the dual registry/feed write.

use super::atomic::{atomic_write, stage};
use crate::cmdi::{check_profile, CollectionExporter, ExportOptions};
use crate::config::{PathsConfig, PublishConfig};
use crate::error::{CollbankError, Result};
use crate::model::{Collection, Publishable, VloItem};
use crate::vocabulary::{keys, CodeList, Vocabulary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, info, warn};

/// Where a record stands relative to its registry copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationState {
    /// No registry file.
    Unpublished,
    /// The registry file could not be inspected.
    Unknown,
    Published,
    /// The record was edited after the registry file was written.
    Stale,
}

impl PublicationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationState::Unpublished => "unpublished",
            PublicationState::Unknown => "unknown",
            PublicationState::Published => "published",
            PublicationState::Stale => "stale",
        }
    }
}

impl std::fmt::Display for PublicationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the file at `path` against the record's last edit time.
pub fn state_for(path: &Path, updated_at: Option<DateTime<Utc>>) -> PublicationState {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return PublicationState::Unpublished,
        Err(e) => {
            warn!("Cannot inspect {}: {}", path.display(), e);
            return PublicationState::Unknown;
        }
    };

    let Some(edited) = updated_at else {
        return PublicationState::Published;
    };
    match meta.modified() {
        Ok(modified) => {
            let written: DateTime<Utc> = modified.into();
            if written < edited {
                PublicationState::Stale
            } else {
                PublicationState::Published
            }
        }
        Err(e) => {
            warn!("No modification time for {}: {}", path.display(), e);
            PublicationState::Unknown
        }
    }
}

/// Modification time for freshly published files: now, but never before
/// the record's last edit.
fn publish_time(updated_at: Option<DateTime<Utc>>) -> SystemTime {
    let now = SystemTime::now();
    match updated_at {
        Some(edited) => now.max(edited.into()),
        None => now,
    }
}

/// Result of writing one target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    fn ok(path: PathBuf) -> Self {
        Self {
            path,
            ok: true,
            error: None,
        }
    }

    fn failed(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            ok: false,
            error: Some(error.to_string()),
        }
    }
}

/// Outcome of one publish action, per target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub file_name: String,
    /// True when every file was written.
    pub success: bool,
    /// Registry copy first, then the feed copy, then any relation files.
    pub files: Vec<FileOutcome>,
    /// Hex SHA-256 of the published document.
    pub sha256: String,
}

/// Writes records to the registry and ingestion feed directories.
#[derive(Debug, Clone)]
pub struct PublicationTracker {
    config: PublishConfig,
}

impl PublicationTracker {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn registry_path(&self, file_name: &str) -> PathBuf {
        self.config.registry_dir.join(file_name)
    }

    pub fn feed_path(&self, file_name: &str) -> PathBuf {
        self.config
            .publish_dir
            .join(format!("{}{}", file_name, PathsConfig::FEED_SUFFIX))
    }

    /// Public URL the record's PID should resolve to.
    pub fn target_url<P: Publishable>(&self, item: &P) -> String {
        self.config.registry_url_for(&item.registry_file_name())
    }

    pub fn evaluate<P: Publishable>(&self, item: &P) -> PublicationState {
        state_for(&self.registry_path(&item.registry_file_name()), item.updated_at())
    }

    /// Write `xml` to the registry and feed paths of `file_name`.
    ///
    /// Both copies are staged before either is renamed into place; a stage
    /// failure leaves both targets untouched and is returned as an error.
    /// The files are stamped no earlier than `updated_at` so the record
    /// evaluates as published straight away.
    pub fn publish_document(
        &self,
        file_name: &str,
        xml: &str,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<PublishReport> {
        if xml.trim().is_empty() {
            return Err(CollbankError::validation("xmlcontent", "nothing to publish"));
        }
        let registry = self.registry_path(file_name);
        let feed = self.feed_path(file_name);

        let staged_registry = stage(&registry, xml.as_bytes())?;
        let staged_feed = stage(&feed, xml.as_bytes())?;

        let stamp = publish_time(updated_at);
        let mut files = Vec::with_capacity(2);
        for staged in [staged_registry, staged_feed] {
            let target = staged.target().to_path_buf();
            match staged.commit_stamped(stamp) {
                Ok(path) => files.push(FileOutcome::ok(path)),
                Err(e) => {
                    error!("Publishing {} failed: {}", target.display(), e);
                    files.push(FileOutcome::failed(target, e));
                }
            }
        }

        let report = PublishReport {
            file_name: file_name.to_string(),
            success: files.iter().all(|f| f.ok),
            files,
            sha256: hex::encode(Sha256::digest(xml.as_bytes())),
        };
        if report.success {
            info!("Published {}", file_name);
        } else {
            warn!("Published {} partially", file_name);
        }
        Ok(report)
    }

    /// Publish a VLO item's stored document.
    pub fn publish_item(&self, item: &VloItem) -> Result<PublishReport> {
        if item.id.is_none() {
            return Err(CollbankError::validation("id", "save the item before publishing"));
        }
        self.publish_document(&item.registry_file_name(), &item.xmlcontent, item.updated_at)
    }

    /// Export a collection with the full header, publish it and write its
    /// relation files into the registry directory.
    pub fn publish_collection(
        &self,
        coll: &Collection,
        vocab: &Vocabulary,
        codes: &CodeList,
        user: Option<&str>,
    ) -> Result<PublishReport> {
        if coll.id.is_none() {
            return Err(CollbankError::validation("id", "save the collection before publishing"));
        }
        let options = ExportOptions {
            full_header: true,
            user: user.map(str::to_string),
            registry_url: self.config.registry_url.clone(),
        };
        let doc = CollectionExporter::new(vocab, codes, &options).export(coll)?;
        let issues = check_profile(&doc);
        if !issues.is_empty() {
            warn!(
                "Refusing to publish {}: {} profile violation(s)",
                coll.registry_file_name(),
                issues.len()
            );
            let listed: Vec<String> = issues.iter().map(|issue| issue.to_string()).collect();
            return Err(CollbankError::validation(
                "cmdi",
                format!("{} profile violation(s): {}", issues.len(), listed.join("; ")),
            ));
        }
        let xml = doc.to_xml_string()?;
        let mut report = self.publish_document(&coll.registry_file_name(), &xml, coll.updated_at)?;

        for (index, relation) in coll.relations.iter().enumerate() {
            let label = relation
                .rtype
                .and_then(|mv| vocab.resolve_opt(keys::RELATION_TYPE, mv))
                .unwrap_or("");
            let path = self.registry_path(&coll.relation_file_name(index));
            let tsv = coll.relation_tsv(relation, label);
            match atomic_write(&path, tsv.as_bytes()) {
                Ok(()) => report.files.push(FileOutcome::ok(path)),
                Err(e) => {
                    error!("Writing relation file {} failed: {}", path.display(), e);
                    report.files.push(FileOutcome::failed(path, e));
                    report.success = false;
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Relation, Resource};
    use crate::vocabulary::FieldChoice;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn create_test_tracker() -> (PublicationTracker, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = PublishConfig::under(temp_dir.path(), "https://example.org/registry/");
        (PublicationTracker::new(config), temp_dir)
    }

    fn saved_item() -> VloItem {
        let mut item = VloItem::new("oh", "Oral history", "<CMD/>");
        item.id = Some(42);
        item.updated_at = Some(Utc::now());
        item
    }

    fn set_mtime(path: &Path, when: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    #[test]
    fn test_state_transitions() {
        let (tracker, _temp_dir) = create_test_tracker();
        let mut item = saved_item();
        assert_eq!(tracker.evaluate(&item), PublicationState::Unpublished);

        tracker.publish_item(&item).unwrap();
        let registry = tracker.registry_path("oh_vlometadata_00042");
        let edited: SystemTime = item.updated_at.unwrap().into();

        set_mtime(&registry, edited + Duration::from_secs(5));
        assert_eq!(tracker.evaluate(&item), PublicationState::Published);

        set_mtime(&registry, edited - Duration::from_secs(5));
        assert_eq!(tracker.evaluate(&item), PublicationState::Stale);

        item.updated_at = None;
        assert_eq!(tracker.evaluate(&item), PublicationState::Published);
    }

    #[test]
    fn test_published_right_after_edit() {
        let (tracker, _temp_dir) = create_test_tracker();
        for _ in 0..20 {
            let item = saved_item();
            tracker.publish_item(&item).unwrap();
            assert_eq!(tracker.evaluate(&item), PublicationState::Published);
        }
    }

    #[test]
    fn test_publish_time_never_precedes_edit() {
        let ahead = Utc::now() + chrono::Duration::seconds(60);
        let stamped: DateTime<Utc> = publish_time(Some(ahead)).into();
        assert_eq!(stamped, ahead);
        assert!(publish_time(None) <= SystemTime::now());
    }

    #[test]
    fn test_publish_writes_both_copies() {
        let (tracker, _temp_dir) = create_test_tracker();
        let item = saved_item();
        let report = tracker.publish_item(&item).unwrap();

        assert!(report.success);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].path, tracker.registry_path("oh_vlometadata_00042"));
        assert!(report.files[1].path.ends_with("publish/oh_vlometadata_00042.cmdi.xml"));
        for file in &report.files {
            assert_eq!(fs::read_to_string(&file.path).unwrap(), "<CMD/>");
        }
        assert_eq!(report.sha256.len(), 64);
    }

    #[test]
    fn test_empty_content_rejected() {
        let (tracker, _temp_dir) = create_test_tracker();
        let mut item = saved_item();
        item.xmlcontent = "  ".into();
        let err = tracker.publish_item(&item).unwrap_err();
        assert!(matches!(err, CollbankError::Validation { .. }));
        assert_eq!(tracker.evaluate(&item), PublicationState::Unpublished);
    }

    #[test]
    fn test_stage_failure_leaves_targets_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let registry_dir = temp_dir.path().join("registry");
        // a plain file where the feed directory should be
        let blocked = temp_dir.path().join("publish");
        fs::write(&blocked, "not a directory").unwrap();
        let tracker = PublicationTracker::new(PublishConfig::new(&registry_dir, &blocked, ""));

        let item = saved_item();
        assert!(tracker.publish_item(&item).is_err());
        assert_eq!(tracker.evaluate(&item), PublicationState::Unpublished);
        assert_eq!(fs::read_dir(&registry_dir).unwrap().count(), 0);
    }

    fn resource_vocab() -> Vocabulary {
        Vocabulary::from_choices([(keys::RESOURCE_TYPE, "text"), (keys::RESOURCE_MODALITY, "written")].map(
            |(field, label)| FieldChoice {
                field: field.into(),
                machine_value: 1,
                english_name: label.into(),
                dutch_name: String::new(),
            },
        ))
    }

    fn saved_collection() -> Collection {
        Collection {
            id: Some(3),
            identifier: "ABC12".into(),
            titles: vec!["Sample Corpus".into()],
            resources: vec![Resource {
                dc_type: Some(1),
                modalities: vec![1],
                ..Default::default()
            }],
            relations: vec![Relation {
                rtype: None,
                name: "Derived".into(),
                related: Some("XYZ".into()),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_publish_collection_with_relations() {
        let (tracker, _temp_dir) = create_test_tracker();
        let coll = saved_collection();
        let report = tracker
            .publish_collection(&coll, &resource_vocab(), &CodeList::default(), Some("editor"))
            .unwrap();
        assert!(report.success);
        assert_eq!(report.files.len(), 3);

        let xml = fs::read_to_string(tracker.registry_path("cbmetadata_00003")).unwrap();
        assert!(xml.contains("<MdCreator>editor</MdCreator>"));
        assert!(xml.contains("https://example.org/registry/cbrelation_3_1.tsv"));
        let tsv = fs::read_to_string(tracker.registry_path("cbrelation_3_1.tsv")).unwrap();
        assert!(tsv.starts_with("Collection\tType of relation\tCollection\n"));
        assert!(tsv.contains("XYZ"));
    }

    #[test]
    fn test_collection_outside_profile_is_not_published() {
        let (tracker, _temp_dir) = create_test_tracker();
        let coll = saved_collection();
        // without labels the resource loses its type and modality
        let err = tracker
            .publish_collection(&coll, &Vocabulary::unavailable(), &CodeList::default(), None)
            .unwrap_err();
        match err {
            CollbankError::Validation { field, message } => {
                assert_eq!(field, "cmdi");
                assert!(message.starts_with("2 profile violation(s)"), "{}", message);
                assert!(message.contains("missing required type"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(tracker.evaluate(&coll), PublicationState::Unpublished);
        assert!(!tracker.registry_path("cbrelation_3_1.tsv").exists());
    }

    #[test]
    fn test_missing_file_is_unpublished_not_unknown() {
        assert_eq!(
            state_for(Path::new("/nonexistent/registry/x"), Some(Utc::now())),
            PublicationState::Unpublished
        );
    }
}
