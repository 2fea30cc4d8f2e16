//! Read a `CorpusCollection` CMDI document back into a new collection.

use super::repair::XmlSource;
use super::tree::{Element, XmlDocument};
use crate::config::CmdiConfig;
use crate::error::{CollbankError, Result};
use crate::model::{Collection, PidRecord, SourceInfo};
use crate::store::CatalogueStore;
use crate::vocabulary::{keys, Vocabulary};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// A new collection was created.
    Ok,
    /// A collection with a matching identifier already exists.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<i64>,
    pub status: ImportStatus,
    pub msg: String,
    /// Genre labels with no vocabulary entry.
    pub unmatched_genres: Vec<String>,
}

fn texts_of(component: &Element, name: &str) -> Vec<String> {
    component
        .elements()
        .filter(|el| el.is(name))
        .map(|el| el.text())
        .filter(|t| !t.is_empty())
        .collect()
}

fn text_of(component: &Element, name: &str) -> String {
    texts_of(component, name).into_iter().next().unwrap_or_default()
}

/// `hdl:{domain}/{name}` back into a PID record.
fn pid_from_self_link(link: &str) -> Option<PidRecord> {
    let (domain, name) = link.trim().strip_prefix("hdl:")?.rsplit_once('/')?;
    if domain.is_empty() || name.is_empty() {
        return None;
    }
    Some(PidRecord {
        pidname: Some(name.to_string()),
        handle_domain: domain.to_string(),
        url: String::new(),
    })
}

/// Parse the collection fields of a CMDI document.
///
/// Returns the unsaved collection and the genre labels that could not be
/// mapped onto the vocabulary.
pub fn read_collection(doc: &XmlDocument, vocab: &Vocabulary) -> Result<(Collection, Vec<String>)> {
    let component = doc
        .root
        .find(&["Components", CmdiConfig::COMPONENT_NAME])
        .ok_or_else(|| {
            CollbankError::validation(
                "Components",
                format!("document has no {} component", CmdiConfig::COMPONENT_NAME),
            )
        })?;

    let titles = texts_of(component, "title");
    if titles.is_empty() {
        return Err(CollbankError::validation("title", "document has no title"));
    }

    let mut coll = Collection {
        titles,
        description: text_of(component, "description"),
        owners: texts_of(component, "owner"),
        language_disorders: texts_of(component, "languageDisorder"),
        domains: texts_of(component, "domain"),
        clarin_centre: text_of(component, "clarinCentre"),
        version: text_of(component, "version"),
        ..Default::default()
    };

    let mut unmatched = Vec::new();
    for label in texts_of(component, "genre") {
        match vocab.machine_value(keys::GENRE_NAME, &label) {
            Some(mv) => coll.genres.push(mv),
            None => unmatched.push(label),
        }
    }

    if let Some(pid) = doc
        .root
        .find(&["Header", "MdSelfLink"])
        .and_then(|el| pid_from_self_link(&el.text()))
    {
        coll.pid = pid;
    }
    Ok((coll, unmatched))
}

impl CatalogueStore {
    /// Import a CMDI collection document and record the import.
    ///
    /// Nothing is created when one of the titles, or the identifier
    /// derived from them, is already in use.
    pub fn import_cmdi(
        &self,
        source: XmlSource,
        vocab: &Vocabulary,
        collector: &str,
    ) -> Result<ImportOutcome> {
        let file = match &source {
            XmlSource::Path(path) => Some(path.display().to_string()),
            _ => None,
        };
        let text = source.load()?;
        let doc = XmlDocument::parse(&text)?;
        let (mut coll, unmatched_genres) = read_collection(&doc, vocab)?;

        let mut audit = SourceInfo {
            file,
            collector: collector.to_string(),
            ..Default::default()
        };
        self.record_source_info(&mut audit)?;

        let identifier = coll.resolve_identifier()?;
        let mut taken = None;
        for candidate in coll.titles.iter().chain(std::iter::once(&identifier)) {
            if self.identifier_exists(candidate)? {
                taken = Some(candidate.clone());
                break;
            }
        }
        if let Some(existing) = taken {
            info!("Skipping import of '{}': identifier already exists", existing);
            return Ok(ImportOutcome {
                collection_id: None,
                status: ImportStatus::Skipped,
                msg: format!("collection '{}' already exists", existing),
                unmatched_genres,
            });
        }

        let id = self.save_collection(&mut coll)?;
        if !unmatched_genres.is_empty() {
            warn!(
                "Imported collection {} with {} unknown genre(s): {}",
                id,
                unmatched_genres.len(),
                unmatched_genres.join(", ")
            );
        }
        info!("Imported collection {} as '{}'", id, coll.identifier);
        Ok(ImportOutcome {
            collection_id: Some(id),
            status: ImportStatus::Ok,
            msg: format!("created collection '{}'", coll.identifier),
            unmatched_genres,
        })
    }
}
