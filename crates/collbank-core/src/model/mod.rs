//! Catalogue entity graph.
//!
//! A [`Collection`] owns everything below it by value. Optional one-to-one
//! parts (linguality, access, ...) are persisted as separate component rows
//! and are `None` here when absent or when the stored reference dangles.

mod collection;
mod parts;
mod resource;
mod vlo;

pub use collection::{Collection, CollectionSummary, Relation, TotalSize};
pub use parts::{
    Access, AudioFormat, Contact, Documentation, GeographicProvenance, Linguality, Project,
    Provenance, ResourceCreator, SpeechCorpus, TemporalProvenance, Validation, WrittenCorpus,
};
pub use resource::{Annotation, Media, Resource};
pub use vlo::{SourceInfo, VloItem, VloItemSummary};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handle registration state shared by collections and VLO items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidRecord {
    /// Last segment of the handle (`COLL-0000-0001-...`).
    pub pidname: Option<String>,
    /// Handle prefix, e.g. `21.11114`.
    pub handle_domain: String,
    /// Public URL the handle resolves to.
    pub url: String,
}

impl PidRecord {
    /// `hdl:{domain}/{pidname}` once a PID is registered.
    pub fn self_link(&self) -> Option<String> {
        match self.pidname.as_deref() {
            Some(name) if !name.is_empty() => {
                Some(format!("hdl:{}/{}", self.handle_domain, name))
            }
            _ => None,
        }
    }
}

/// Which table a publishable record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Collection,
    VloItem,
}

impl RecordKind {
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Collection => "collections",
            RecordKind::VloItem => "vlo_items",
        }
    }
}

/// A record that can be written to the registry and carry a PID.
pub trait Publishable {
    fn record_kind(&self) -> RecordKind;

    /// Row id, `None` while unsaved.
    fn record_id(&self) -> Option<i64>;

    /// File name (without directory) of the registry copy.
    fn registry_file_name(&self) -> String;

    /// Last time the record was edited, if tracked.
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    fn pid(&self) -> &PidRecord;

    fn pid_mut(&mut self) -> &mut PidRecord;

    /// Title shown in log lines and reports.
    fn display_name(&self) -> String;
}
