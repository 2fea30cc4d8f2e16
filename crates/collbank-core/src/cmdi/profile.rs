//! Structural check of collection documents against the CorpusCollection
//! profile.
//!
//! Every element that has children is listed with the sequence it may
//! contain. Children must appear in that order, within their cardinality.
//! Leaf content is not typed.

use super::export::Cardinality::{self, One, OneOrMore, ZeroOrMore, ZeroOrOne};
use super::tree::{Element, XmlDocument};
use crate::config::CmdiConfig;
use serde::Serialize;
use std::fmt;

type Sequence = &'static [(&'static str, Cardinality)];

const SEQUENCES: &[(&str, Sequence)] = &[
    ("CMD", &[("Header", One), ("Resources", One), ("Components", One)]),
    (
        "Header",
        &[("MdCreator", ZeroOrOne), ("MdSelfLink", ZeroOrOne), ("MdProfile", ZeroOrOne)],
    ),
    (
        "Resources",
        &[
            ("ResourceProxyList", One),
            ("JournalFileProxyList", One),
            ("ResourceRelationList", One),
        ],
    ),
    ("ResourceProxyList", &[("ResourceProxy", ZeroOrMore)]),
    ("ResourceProxy", &[("ResourceType", One), ("ResourceRef", One)]),
    ("Components", &[("CorpusCollection", One)]),
    (
        "CorpusCollection",
        &[
            ("title", OneOrMore),
            ("description", ZeroOrOne),
            ("owner", ZeroOrMore),
            ("resource", OneOrMore),
            ("genre", ZeroOrMore),
            ("provenance", ZeroOrMore),
            ("linguality", ZeroOrOne),
            ("Language", ZeroOrMore),
            ("languageDisorder", ZeroOrMore),
            ("dc-relation", ZeroOrMore),
            ("domain", ZeroOrMore),
            ("clarinCentre", ZeroOrOne),
            ("access", ZeroOrOne),
            ("totalSize", ZeroOrMore),
            ("PID", ZeroOrMore),
            ("version", ZeroOrOne),
            ("resourceCreator", ZeroOrMore),
            ("documentation", ZeroOrOne),
            ("validation", ZeroOrOne),
            ("project", ZeroOrMore),
            ("writtenCorpus", ZeroOrOne),
            ("speechCorpus", ZeroOrOne),
        ],
    ),
    (
        "resource",
        &[
            ("description", ZeroOrOne),
            ("type", One),
            ("modality", OneOrMore),
            ("annotation", ZeroOrMore),
            ("media", ZeroOrOne),
            ("totalSize", ZeroOrMore),
        ],
    ),
    ("annotation", &[("type", One), ("mode", One), ("format", OneOrMore)]),
    ("media", &[("format", ZeroOrMore)]),
    ("totalSize", &[("size", One), ("sizeUnit", One)]),
    (
        "provenance",
        &[("temporalProvenance", ZeroOrOne), ("geographicProvenance", ZeroOrMore)],
    ),
    ("temporalProvenance", &[("startYear", One), ("endYear", One)]),
    ("geographicProvenance", &[("Country", ZeroOrOne), ("place", ZeroOrMore)]),
    ("Country", &[("CountryName", One), ("CountryCoding", One)]),
    (
        "linguality",
        &[
            ("lingualityType", ZeroOrMore),
            ("lingualityNativeness", ZeroOrMore),
            ("lingualityAgeGroup", ZeroOrMore),
            ("lingualityStatus", ZeroOrMore),
            ("lingualityVariant", ZeroOrMore),
            ("multilingualityType", ZeroOrMore),
        ],
    ),
    ("Language", &[("LanguageName", One), ("ISO639", One)]),
    ("ISO639", &[("iso-639-3-code", One)]),
    ("dc-relation", &[("relation", One)]),
    (
        "access",
        &[
            ("name", ZeroOrOne),
            ("availability", ZeroOrMore),
            ("licenseName", ZeroOrMore),
            ("licenseURL", ZeroOrMore),
            ("nonCommercialUsageOnly", ZeroOrOne),
            ("contact", ZeroOrMore),
            ("website", ZeroOrMore),
            ("ISBN", ZeroOrOne),
            ("ISLRN", ZeroOrOne),
            ("medium", ZeroOrMore),
        ],
    ),
    ("contact", &[("person", One), ("address", One), ("email", One)]),
    ("resourceCreator", &[("organization", ZeroOrMore), ("person", ZeroOrMore)]),
    (
        "documentation",
        &[
            ("documentationType", ZeroOrMore),
            ("fileName", ZeroOrMore),
            ("url", ZeroOrMore),
            ("Language", ZeroOrMore),
        ],
    ),
    ("validation", &[("type", ZeroOrOne), ("method", ZeroOrMore)]),
    ("project", &[("title", ZeroOrOne), ("funder", ZeroOrMore), ("url", ZeroOrOne)]),
    (
        "writtenCorpus",
        &[
            ("characterEncoding", ZeroOrMore),
            ("numberOfAuthors", ZeroOrOne),
            ("authorDemographics", ZeroOrOne),
        ],
    ),
    (
        "speechCorpus",
        &[
            ("recordingEnvironment", ZeroOrMore),
            ("recordingConditions", ZeroOrMore),
            ("channel", ZeroOrMore),
            ("socialContext", ZeroOrMore),
            ("planningType", ZeroOrMore),
            ("interactivity", ZeroOrMore),
            ("involvement", ZeroOrMore),
            ("audience", ZeroOrMore),
            ("conversationalType", ZeroOrMore),
            ("durationOfEffectiveSpeech", ZeroOrOne),
            ("durationOfFullDatabase", ZeroOrOne),
            ("numberOfSpeakers", ZeroOrOne),
            ("speakerDemographics", ZeroOrOne),
            ("audioFormat", ZeroOrMore),
        ],
    ),
    (
        "audioFormat",
        &[
            ("speechCoding", ZeroOrOne),
            ("samplingFrequency", ZeroOrOne),
            ("compression", ZeroOrOne),
            ("bitResolution", ZeroOrOne),
        ],
    ),
];

/// One place where a document departs from the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileIssue {
    /// Slash-separated element path, e.g. `CMD/Components/CorpusCollection/resource[2]`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ProfileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn sequence_of(name: &str) -> Option<Sequence> {
    SEQUENCES
        .iter()
        .find(|(parent, _)| *parent == name)
        .map(|(_, sequence)| *sequence)
}

fn min_count(cardinality: Cardinality) -> usize {
    match cardinality {
        One | OneOrMore => 1,
        ZeroOrOne | ZeroOrMore => 0,
    }
}

/// Check `doc` against the profile. An empty list means it conforms.
pub fn check_profile(doc: &XmlDocument) -> Vec<ProfileIssue> {
    let mut issues = Vec::new();
    let root = &doc.root;
    if !root.is("CMD") {
        issues.push(ProfileIssue {
            path: root.local_name().to_string(),
            message: "root element must be CMD".to_string(),
        });
        return issues;
    }
    if root.attr(CmdiConfig::VERSION_ATTRIBUTE) != Some(CmdiConfig::VERSION) {
        issues.push(ProfileIssue {
            path: "CMD".to_string(),
            message: format!(
                "{} must be {}",
                CmdiConfig::VERSION_ATTRIBUTE,
                CmdiConfig::VERSION
            ),
        });
    }
    check_element(root, "CMD", &mut issues);
    issues
}

fn check_element(el: &Element, path: &str, issues: &mut Vec<ProfileIssue>) {
    if el.is("ResourceProxy") && el.attr("id").map_or(true, |id| id.trim().is_empty()) {
        issues.push(ProfileIssue {
            path: path.to_string(),
            message: "ResourceProxy needs an id".to_string(),
        });
    }
    let Some(sequence) = sequence_of(el.local_name()) else {
        return;
    };

    let mut counts = vec![0usize; sequence.len()];
    let mut slot = 0;
    for child in el.elements() {
        let name = child.local_name();
        let Some(index) = sequence.iter().position(|(n, _)| *n == name) else {
            issues.push(ProfileIssue {
                path: format!("{}/{}", path, name),
                message: format!("{} is not allowed in {}", name, el.local_name()),
            });
            continue;
        };
        if index < slot {
            issues.push(ProfileIssue {
                path: format!("{}/{}", path, name),
                message: format!("{} must come before {}", name, sequence[slot].0),
            });
            continue;
        }
        slot = index;
        counts[index] += 1;

        let cardinality = sequence[index].1;
        let child_path = if cardinality.is_plural() {
            format!("{}/{}[{}]", path, name, counts[index])
        } else {
            format!("{}/{}", path, name)
        };
        if !cardinality.is_plural() && counts[index] > 1 {
            issues.push(ProfileIssue {
                path: child_path,
                message: format!("{} may occur only once", name),
            });
            continue;
        }
        check_element(child, &child_path, issues);
    }

    for ((name, cardinality), count) in sequence.iter().zip(&counts) {
        if *count < min_count(*cardinality) {
            issues.push(ProfileIssue {
                path: path.to_string(),
                message: format!("missing required {}", name),
            });
        }
    }
}
