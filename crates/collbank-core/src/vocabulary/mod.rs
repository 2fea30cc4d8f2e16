//! Controlled vocabularies.
//!
//! Catalogue records store small integer machine values for every
//! controlled field. This module turns them back into labels, builds choice
//! lists for data entry, and loads the backing rows from tab-separated
//! fixtures.

mod codes;
mod fixture;
mod resolver;

pub use codes::{CodeKind, CodeList, CodeListEntry};
pub use fixture::{parse_code_list, parse_fixture, FixtureImport, ImportSummary};
pub use resolver::{Choice, ChoicePosition, FieldChoice, Vocabulary, EMPTY_LABEL};

/// Vocabulary field keys as stored in the `field_choices` table.
///
/// Keys are compared case-insensitively.
pub mod keys {
    pub const RESOURCE_TYPE: &str = "resource.type";
    pub const RESOURCE_MODALITY: &str = "resource.modality";
    pub const MEDIA_FORMAT: &str = "resource.media.format";
    pub const ANNOTATION_TYPE: &str = "resource.annotation.type";
    pub const ANNOTATION_MODE: &str = "resource.annotation.mode";
    pub const ANNOTATION_FORMAT: &str = "resource.annotation.format";
    pub const GENRE_NAME: &str = "genre.name";
    pub const COUNTRY_NAME: &str = "country.name";
    pub const LANGUAGE_NAME: &str = "language.name";
    pub const RELATION_TYPE: &str = "relation.type";
    pub const DOMAIN_NAME: &str = "domain.name";
    pub const CLARIN_CENTRE: &str = "clarincentre.name";
    pub const SIZE_UNIT: &str = "totalSize.sizeUnit";
    pub const LINGUALITY_TYPE: &str = "linguality.lingualitytype";
    pub const LINGUALITY_NATIVENESS: &str = "linguality.lingualitynativeness";
    pub const LINGUALITY_AGEGROUP: &str = "linguality.lingualityagegroup";
    pub const LINGUALITY_STATUS: &str = "linguality.lingualitystatus";
    pub const LINGUALITY_VARIANT: &str = "linguality.lingualityvariant";
    pub const LINGUALITY_MULTI: &str = "linguality.multilingualitytype";
    pub const ACCESS_AVAILABILITY: &str = "access.availability";
    pub const ACCESS_MEDIUM: &str = "access.medium.format";
    pub const ACCESS_NONCOMMERCIAL: &str = "access.nonCommercialUsageOnly";
    pub const DOCUMENTATION_TYPE: &str = "documentation.type";
    pub const VALIDATION_TYPE: &str = "validation.type";
    pub const VALIDATION_METHOD: &str = "validation.method";
    pub const CHARACTER_ENCODING: &str = "writtencorpus.characterencoding.name";
    pub const SPEECH_RECORDING_ENVIRONMENT: &str = "speechcorpus.recordingenvironment";
    pub const SPEECH_CHANNEL: &str = "speechcorpus.channel";
    pub const SPEECH_CONVERSATIONAL_TYPE: &str = "speechcorpus.conversationaltype";
    pub const SPEECH_SOCIAL_CONTEXT: &str = "speechcorpus.socialcontext.name";
    pub const SPEECH_PLANNING_TYPE: &str = "speechcorpus.planningtype.name";
    pub const SPEECH_AUDIENCE: &str = "speechcorpus.audience.type";
    pub const SPEECH_INTERACTIVITY: &str = "speechcorpus.interactivity.name";
    pub const SPEECH_INVOLVEMENT: &str = "speechcorpus.involvement.name";
}
