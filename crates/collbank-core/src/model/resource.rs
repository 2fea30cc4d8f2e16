use super::collection::TotalSize;
use crate::vocabulary::{keys, Vocabulary};
use serde::{Deserialize, Serialize};

/// One resource of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub description: String,
    /// Legacy single type value (`resource.type`).
    pub type_mv: Option<i64>,
    /// Category part of the type, as the machine value of its entry.
    pub dc_type: Option<i64>,
    /// Full `"category: value"` entry when a subtype is chosen.
    pub subtype: Option<i64>,
    pub modalities: Vec<i64>,
    pub annotations: Vec<Annotation>,
    pub media: Option<Media>,
    pub total_sizes: Vec<TotalSize>,
}

impl Resource {
    /// The type entry the resource currently stands for.
    pub fn effective_type(&self) -> Option<i64> {
        self.subtype.or(self.dc_type).or(self.type_mv)
    }

    /// Split the legacy type into DCtype and subtype.
    ///
    /// Returns `true` when the resource changed. Rows with a DCtype already
    /// set, or whose legacy value is unknown, are left alone.
    pub fn split_legacy_type(&mut self, vocab: &Vocabulary) -> bool {
        if self.dc_type.is_some() {
            return false;
        }
        let Some(type_mv) = self.type_mv else {
            return false;
        };
        let Some(label) = vocab.resolve_opt(keys::RESOURCE_TYPE, type_mv) else {
            return false;
        };
        let (prefix, has_sub) = match label.split_once(':') {
            Some((pre, _)) => (pre.trim(), true),
            None => (label.trim(), false),
        };
        let Some(dc_type) = vocab.dc_type_for(prefix) else {
            return false;
        };
        self.dc_type = Some(dc_type);
        self.subtype = if has_sub { Some(type_mv) } else { None };
        true
    }

    /// Set the type from a DCtype/subtype label pair.
    ///
    /// Keeps the legacy `type_mv` in step with the pair.
    pub fn set_type_labels(&mut self, vocab: &Vocabulary, dctype: &str, subtype: Option<&str>) -> bool {
        let Some(dc) = vocab.dc_type_for(dctype) else {
            return false;
        };
        self.dc_type = Some(dc);
        self.subtype = subtype.and_then(|s| vocab.subtype_for(dctype, s));
        self.type_mv = Some(self.subtype.unwrap_or(dc));
        true
    }

    /// True when nothing but defaults is filled in.
    pub fn is_blank(&self) -> bool {
        self.description.trim().is_empty()
            && self.effective_type().is_none()
            && self.modalities.is_empty()
            && self.annotations.is_empty()
            && self.media.as_ref().map_or(true, |m| m.formats.is_empty())
            && self.total_sizes.is_empty()
    }
}

/// One annotation layer of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    pub annotation_type: Option<i64>,
    pub mode: Option<i64>,
    /// Single format value kept from older records.
    pub legacy_format: Option<i64>,
    pub formats: Vec<i64>,
}

impl Annotation {
    /// Seed `formats` from the legacy scalar when the list is empty.
    pub fn materialize_formats(&mut self) -> bool {
        match self.legacy_format {
            Some(format) if self.formats.is_empty() => {
                self.formats.push(format);
                true
            }
            _ => false,
        }
    }
}

/// Carrier media of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    pub formats: Vec<i64>,
}
