//! Sub-entities hanging off a collection.
//!
//! Vocabulary-backed lists hold machine values; free-text lists hold strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provenance {
    pub temporal: Option<TemporalProvenance>,
    pub geographic: Vec<GeographicProvenance>,
}

impl Provenance {
    pub fn is_blank(&self) -> bool {
        self.temporal.is_none() && self.geographic.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalProvenance {
    pub start_year: String,
    pub end_year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeographicProvenance {
    /// `country.name` machine value.
    pub country: Option<i64>,
    pub cities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Linguality {
    pub types: Vec<i64>,
    pub nativeness: Vec<i64>,
    pub age_groups: Vec<i64>,
    pub statuses: Vec<i64>,
    pub variants: Vec<i64>,
    pub multilinguality_types: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Access {
    pub name: String,
    pub availability: Vec<i64>,
    pub license_names: Vec<String>,
    pub license_urls: Vec<String>,
    pub non_commercial_usage_only: Option<i64>,
    pub contacts: Vec<Contact>,
    pub websites: Vec<String>,
    pub isbn: String,
    pub islrn: String,
    pub media: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub person: String,
    pub address: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCreator {
    pub organizations: Vec<String>,
    pub persons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Documentation {
    pub types: Vec<i64>,
    pub files: Vec<String>,
    pub urls: Vec<String>,
    /// `language.name` machine values.
    pub languages: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Validation {
    pub validation_type: Option<i64>,
    pub methods: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub funders: Vec<String>,
    pub url: String,
}

impl Project {
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.funders.is_empty() && self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrittenCorpus {
    pub character_encodings: Vec<i64>,
    pub number_of_authors: String,
    pub author_demographics: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechCorpus {
    pub recording_environments: Vec<i64>,
    pub recording_conditions: Vec<String>,
    pub channels: Vec<i64>,
    pub social_contexts: Vec<i64>,
    pub planning_types: Vec<i64>,
    pub interactivities: Vec<i64>,
    pub involvements: Vec<i64>,
    pub audiences: Vec<i64>,
    pub conversational_types: Vec<i64>,
    pub duration_effective_speech: String,
    pub duration_full_database: String,
    pub number_of_speakers: String,
    pub speaker_demographics: String,
    pub audio_formats: Vec<AudioFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFormat {
    pub speech_coding: String,
    pub sampling_frequency: String,
    pub compression: String,
    pub bit_resolution: String,
}
