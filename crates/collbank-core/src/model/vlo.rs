use super::{PidRecord, Publishable, RecordKind};
use crate::config::PathsConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A CMDI record prepared for the VLO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VloItem {
    pub id: Option<i64>,
    /// Short abbreviation used in file names and proxy ids.
    pub abbr: String,
    pub title: String,
    /// Raw CMDI document.
    pub xmlcontent: String,
    #[serde(flatten)]
    pub pid: PidRecord,
    /// Owning collection; `None` for orphans.
    pub collection_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row shown in VLO item listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VloItemSummary {
    pub id: i64,
    pub abbr: String,
    pub title: String,
    pub pidname: Option<String>,
    pub collection_id: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl VloItem {
    pub fn new(abbr: impl Into<String>, title: impl Into<String>, xmlcontent: impl Into<String>) -> Self {
        Self {
            abbr: abbr.into(),
            title: title.into(),
            xmlcontent: xmlcontent.into(),
            ..Default::default()
        }
    }

    pub fn is_orphan(&self) -> bool {
        self.collection_id.is_none()
    }

    pub fn summary(&self) -> VloItemSummary {
        VloItemSummary {
            id: self.id.unwrap_or_default(),
            abbr: self.abbr.clone(),
            title: self.title.clone(),
            pidname: self.pid.pidname.clone(),
            collection_id: self.collection_id,
            updated_at: self.updated_at,
        }
    }
}

impl Publishable for VloItem {
    fn record_kind(&self) -> RecordKind {
        RecordKind::VloItem
    }

    fn record_id(&self) -> Option<i64> {
        self.id
    }

    /// `{abbr}_vlometadata_{id:05}`
    fn registry_file_name(&self) -> String {
        format!(
            "{}_{}_{:05}",
            self.abbr,
            PathsConfig::VLO_FILE_INFIX,
            self.id.unwrap_or_default()
        )
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn pid(&self) -> &PidRecord {
        &self.pid
    }

    fn pid_mut(&mut self) -> &mut PidRecord {
        &mut self.pid
    }

    fn display_name(&self) -> String {
        if self.title.is_empty() {
            self.registry_file_name()
        } else {
            self.title.clone()
        }
    }
}

/// Audit record of one import action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceInfo {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub url: Option<String>,
    pub file: Option<String>,
    pub collector: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_file_name() {
        let mut item = VloItem::new("oh", "Oral history", "");
        item.id = Some(42);
        assert_eq!(item.registry_file_name(), "oh_vlometadata_00042");
        assert_eq!(item.display_name(), "Oral history");
        assert!(item.is_orphan());
    }
}
