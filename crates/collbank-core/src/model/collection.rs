use super::parts::{
    Access, Documentation, Linguality, Project, Provenance, ResourceCreator, SpeechCorpus,
    Validation, WrittenCorpus,
};
use super::resource::Resource;
use super::{PidRecord, Publishable, RecordKind};
use crate::config::CmdiConfig;
use crate::error::{CollbankError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root entity of the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection {
    /// Row id; `None` until first saved.
    pub id: Option<i64>,
    /// Unique short identifier (at most ten characters).
    pub identifier: String,
    pub description: String,
    pub clarin_centre: String,
    pub version: String,
    pub landing_page: String,
    pub search_page: String,
    #[serde(flatten)]
    pub pid: PidRecord,

    pub titles: Vec<String>,
    pub owners: Vec<String>,
    pub resources: Vec<Resource>,
    /// `genre.name` machine values.
    pub genres: Vec<i64>,
    pub provenances: Vec<Provenance>,
    /// `language.name` machine values.
    pub languages: Vec<i64>,
    pub language_disorders: Vec<String>,
    pub relations: Vec<Relation>,
    pub domains: Vec<String>,
    pub total_sizes: Vec<TotalSize>,
    pub pids: Vec<String>,
    pub resource_creators: Vec<ResourceCreator>,
    pub projects: Vec<Project>,

    pub linguality: Option<Linguality>,
    pub access: Option<Access>,
    pub documentation: Option<Documentation>,
    pub validation: Option<Validation>,
    pub written_corpus: Option<WrittenCorpus>,
    pub speech_corpus: Option<SpeechCorpus>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A size figure with its unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalSize {
    pub size: String,
    pub size_unit: String,
}

/// A typed link to another collection or an external resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    /// `relation.type` machine value.
    pub rtype: Option<i64>,
    pub name: String,
    /// Identifier of the related collection, if any.
    pub related: Option<String>,
}

/// Row shown in collection listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub id: i64,
    pub identifier: String,
    pub title: String,
    pub updated_at: Option<DateTime<Utc>>,
}

fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(CmdiConfig::MAX_IDENTIFIER_LENGTH)
        .collect()
}

impl Collection {
    /// Identifier used for export.
    ///
    /// Falls back to the shortest title, stripped to identifier-safe
    /// characters and cut to ten characters.
    pub fn resolve_identifier(&self) -> Result<String> {
        let own = self.identifier.trim();
        if !own.is_empty() && own != "-" {
            return Ok(own.to_string());
        }
        self.titles
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .min_by_key(|t| t.chars().count())
            .map(sanitize_identifier)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                CollbankError::validation("identifier", "collection has no identifier and no usable title")
            })
    }

    /// Check the invariants enforced before a collection is stored.
    pub fn validate(&self) -> Result<()> {
        let identifier = self.resolve_identifier()?;
        if identifier.chars().count() > CmdiConfig::MAX_IDENTIFIER_LENGTH {
            return Err(CollbankError::validation(
                "identifier",
                format!(
                    "'{}' is longer than {} characters",
                    identifier,
                    CmdiConfig::MAX_IDENTIFIER_LENGTH
                ),
            ));
        }
        Ok(())
    }

    /// Base name of the registry file: `cbmetadata_{id:05}`.
    pub fn xml_file_name(&self) -> String {
        format!("cbmetadata_{:05}", self.id.unwrap_or_default())
    }

    /// File name of the TSV written for the `index`-th relation.
    pub fn relation_file_name(&self, index: usize) -> String {
        format!("cbrelation_{}_{}.tsv", self.id.unwrap_or_default(), index + 1)
    }

    /// Tab-separated body describing one relation.
    pub fn relation_tsv(&self, relation: &Relation, rtype_label: &str) -> String {
        let related = relation
            .related
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("(No relation specified)");
        format!(
            "Collection\tType of relation\tCollection\n{}\t{}\t{}",
            self.identifier, rtype_label, related
        )
    }

    /// Titles joined for display.
    pub fn title_list(&self) -> String {
        self.titles.join(", ")
    }

    /// Drop sub-entities that carry no data at all.
    ///
    /// Returns the number of removed entries.
    pub fn prune_blank(&mut self) -> usize {
        let before = self.resources.len() + self.provenances.len() + self.projects.len();
        self.resources.retain(|r| !r.is_blank());
        self.provenances.retain(|p| !p.is_blank());
        self.projects.retain(|p| !p.is_blank());
        before - (self.resources.len() + self.provenances.len() + self.projects.len())
    }

    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            id: self.id.unwrap_or_default(),
            identifier: self.identifier.clone(),
            title: self.title_list(),
            updated_at: self.updated_at,
        }
    }
}

impl Publishable for Collection {
    fn record_kind(&self) -> RecordKind {
        RecordKind::Collection
    }

    fn record_id(&self) -> Option<i64> {
        self.id
    }

    fn registry_file_name(&self) -> String {
        self.xml_file_name()
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
        self.identifier.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_prefers_own_value() {
        let coll = Collection {
            identifier: "ABC12".into(),
            titles: vec!["Sample Corpus".into()],
            ..Default::default()
        };
        assert_eq!(coll.resolve_identifier().unwrap(), "ABC12");
    }

    #[test]
    fn test_identifier_falls_back_to_shortest_title() {
        let coll = Collection {
            identifier: "-".into(),
            titles: vec!["A much longer corpus title".into(), "Corpus Gesproken NL".into()],
            ..Default::default()
        };
        assert_eq!(coll.resolve_identifier().unwrap(), "CorpusGesp");
    }

    #[test]
    fn test_identifier_tie_keeps_first_title() {
        let coll = Collection {
            titles: vec!["Spoken Dutch".into(), "Written Frisian".into(), "Dutch Spoken".into()],
            ..Default::default()
        };
        assert_eq!(coll.resolve_identifier().unwrap(), "SpokenDutc");
    }

    #[test]
    fn test_identifier_missing_everywhere() {
        let coll = Collection {
            titles: vec!["  ".into(), "!!".into()],
            ..Default::default()
        };
        assert!(coll.resolve_identifier().is_err());
        assert!(coll.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_identifier() {
        let coll = Collection {
            identifier: "ELEVENCHARS".into(),
            ..Default::default()
        };
        assert!(matches!(
            coll.validate(),
            Err(CollbankError::Validation { .. })
        ));
    }

    #[test]
    fn test_file_names() {
        let coll = Collection {
            id: Some(42),
            identifier: "ABC".into(),
            ..Default::default()
        };
        assert_eq!(coll.xml_file_name(), "cbmetadata_00042");
        assert_eq!(coll.relation_file_name(0), "cbrelation_42_1.tsv");
    }

    #[test]
    fn test_prune_blank_children() {
        let mut coll = Collection {
            resources: vec![
                Resource::default(),
                Resource {
                    description: "kept".into(),
                    ..Default::default()
                },
            ],
            provenances: vec![Provenance::default()],
            projects: vec![Project::default()],
            ..Default::default()
        };
        assert_eq!(coll.prune_blank(), 3);
        assert_eq!(coll.resources.len(), 1);
    }

    #[test]
    fn test_self_link() {
        let mut coll = Collection::default();
        assert_eq!(coll.pid.self_link(), None);
        coll.pid.pidname = Some("COLL-0001".into());
        coll.pid.handle_domain = "21.11114".into();
        assert_eq!(coll.pid.self_link().as_deref(), Some("hdl:21.11114/COLL-0001"));
    }
}
