//! Collection to CMDI serialization.
//!
//! The element order below is fixed by the CorpusCollection profile; every
//! level is built with [`CollectionExporter::add_element`].

use super::tree::{Element, XmlDocument};
use crate::config::CmdiConfig;
use crate::error::Result;
use crate::model::{
    Access, Annotation, Collection, Documentation, GeographicProvenance, Linguality, Project,
    Provenance, Resource, SpeechCorpus, TotalSize, Validation, WrittenCorpus,
};
use crate::vocabulary::{keys, CodeList, Vocabulary};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many times an element may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `1`
    One,
    /// `0-1`
    ZeroOrOne,
    /// `1-n`
    OneOrMore,
    /// `0-n`
    ZeroOrMore,
}

impl Cardinality {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "1" => Some(Cardinality::One),
            "0-1" => Some(Cardinality::ZeroOrOne),
            "1-n" => Some(Cardinality::OneOrMore),
            "0-n" => Some(Cardinality::ZeroOrMore),
            _ => None,
        }
    }

    pub fn is_plural(&self) -> bool {
        matches!(self, Cardinality::OneOrMore | Cardinality::ZeroOrMore)
    }
}

/// A value to emit: free text, or a machine value of a vocabulary field.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Choice(&'static str, i64),
}

fn texts(values: &[String]) -> impl Iterator<Item = FieldValue<'_>> {
    values.iter().map(|v| FieldValue::Text(v))
}

fn choices<'a>(field: &'static str, values: &'a [i64]) -> impl Iterator<Item = FieldValue<'a>> {
    values.iter().map(move |mv| FieldValue::Choice(field, *mv))
}

fn text(value: &str) -> std::iter::Once<FieldValue<'_>> {
    std::iter::once(FieldValue::Text(value))
}

fn choice(field: &'static str, value: Option<i64>) -> impl Iterator<Item = FieldValue<'static>> {
    value.map(|mv| FieldValue::Choice(field, mv)).into_iter()
}

/// Export switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Fill the header with creator, self link and profile.
    pub full_header: bool,
    /// Name written to `MdCreator`.
    pub user: Option<String>,
    /// Public base URL that relation files are served from.
    pub registry_url: String,
}

/// Stateless walker from a [`Collection`] to its CMDI document.
pub struct CollectionExporter<'a> {
    vocab: &'a Vocabulary,
    codes: &'a CodeList,
    options: &'a ExportOptions,
}

impl<'a> CollectionExporter<'a> {
    pub fn new(vocab: &'a Vocabulary, codes: &'a CodeList, options: &'a ExportOptions) -> Self {
        Self {
            vocab,
            codes,
            options,
        }
    }

    fn resolve(&self, value: FieldValue<'_>) -> Option<String> {
        let resolved = match value {
            FieldValue::Text(t) => t.trim(),
            FieldValue::Choice(field, mv) => self.vocab.resolve_opt(field, mv)?.trim(),
        };
        (!resolved.is_empty()).then(|| resolved.to_string())
    }

    /// Emit `name` children of `parent`.
    ///
    /// Singular cardinalities look at the first value only; plural ones emit
    /// one child per value in order. A value that is empty, or a machine
    /// value missing from the vocabulary, produces no element. Returns the
    /// number of elements written.
    pub fn add_element<'v>(
        &self,
        parent: &mut Element,
        cardinality: Cardinality,
        name: &str,
        values: impl IntoIterator<Item = FieldValue<'v>>,
    ) -> usize {
        let mut values = values.into_iter();
        let mut written = 0;
        if cardinality.is_plural() {
            for value in values {
                if let Some(resolved) = self.resolve(value) {
                    parent.push(Element::with_text(name, resolved));
                    written += 1;
                }
            }
        } else if let Some(resolved) = values.next().and_then(|v| self.resolve(v)) {
            parent.push(Element::with_text(name, resolved));
            written = 1;
        }
        written
    }

    /// Build the full document for one collection.
    pub fn export(&self, coll: &Collection) -> Result<XmlDocument> {
        let identifier = coll.resolve_identifier()?;
        let file_name = coll.xml_file_name();

        let mut root = Element::new("CMD");
        root.set_attr("xmlns", CmdiConfig::NAMESPACE);
        root.set_attr("xmlns:xsd", CmdiConfig::XSD_NAMESPACE);
        root.set_attr("xmlns:xsi", CmdiConfig::XSI_NAMESPACE);
        root.set_attr("xsi:schemaLocation", CmdiConfig::schema_location());
        root.set_attr(CmdiConfig::VERSION_ATTRIBUTE, CmdiConfig::VERSION);

        root.push(self.header(coll));
        root.push(self.resources(coll, &file_name));

        let mut body = Element::new(CmdiConfig::COMPONENT_NAME);
        self.collection_body(coll, &mut body);
        let mut components = Element::new("Components");
        components.push(body);
        root.push(components);

        debug!("Exported collection {} as {}", identifier, file_name);
        Ok(XmlDocument::new(root))
    }

    fn header(&self, coll: &Collection) -> Element {
        let mut header = Element::new("Header");
        if !self.options.full_header {
            return header;
        }
        let user = self.options.user.clone().unwrap_or_default();
        self.add_element(&mut header, Cardinality::ZeroOrOne, "MdCreator", text(&user));
        let self_link = coll.pid.self_link().unwrap_or_default();
        self.add_element(&mut header, Cardinality::ZeroOrOne, "MdSelfLink", text(&self_link));
        self.add_element(&mut header, Cardinality::One, "MdProfile", text(CmdiConfig::PROFILE_ID));
        header
    }

    fn resources(&self, coll: &Collection, file_name: &str) -> Element {
        let mut list = Element::new("ResourceProxyList");

        if !coll.landing_page.trim().is_empty() {
            list.push(proxy(
                format!("lp_{}", file_name),
                CmdiConfig::DEFAULT_MIMETYPE,
                "LandingPage",
                coll.landing_page.trim(),
            ));
        }
        for (index, relation) in coll.relations.iter().enumerate() {
            let rtype = relation
                .rtype
                .and_then(|mv| self.vocab.resolve_opt(keys::RELATION_TYPE, mv))
                .map(id_fragment)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unspecified".to_string());
            let reference = format!(
                "{}/{}",
                self.options.registry_url.trim_end_matches('/'),
                coll.relation_file_name(index)
            );
            list.push(proxy(
                format!("rel_{}_{}", rtype, index + 1),
                CmdiConfig::RELATION_MIMETYPE,
                "Resource",
                &reference,
            ));
        }
        if !coll.search_page.trim().is_empty() {
            list.push(proxy(
                format!("sru_{}", file_name),
                CmdiConfig::SEARCH_MIMETYPE,
                "SearchService",
                coll.search_page.trim(),
            ));
        }

        let mut resources = Element::new("Resources");
        resources.push(list);
        resources.push(Element::new("JournalFileProxyList"));
        resources.push(Element::new("ResourceRelationList"));
        resources
    }

    fn collection_body(&self, coll: &Collection, crp: &mut Element) {
        use Cardinality::*;

        self.add_element(crp, OneOrMore, "title", texts(&coll.titles));
        self.add_element(crp, ZeroOrOne, "description", text(&coll.description));
        self.add_element(crp, ZeroOrMore, "owner", texts(&coll.owners));
        for resource in &coll.resources {
            crp.push(self.resource(resource));
        }
        self.add_element(crp, ZeroOrMore, "genre", choices(keys::GENRE_NAME, &coll.genres));
        for provenance in &coll.provenances {
            crp.push(self.provenance(provenance));
        }
        if let Some(linguality) = &coll.linguality {
            crp.push(self.linguality(linguality));
        }
        for mv in &coll.languages {
            if let Some(language) = self.language(*mv) {
                crp.push(language);
            }
        }
        self.add_element(crp, ZeroOrMore, "languageDisorder", texts(&coll.language_disorders));
        for relation in &coll.relations {
            let mut wrapper = Element::new("dc-relation");
            if self.add_element(&mut wrapper, One, "relation", text(&relation.name)) > 0 {
                crp.push(wrapper);
            }
        }
        self.add_element(crp, ZeroOrMore, "domain", texts(&coll.domains));
        self.add_element(crp, ZeroOrOne, "clarinCentre", text(&coll.clarin_centre));
        if let Some(access) = &coll.access {
            crp.push(self.access(access));
        }
        for size in &coll.total_sizes {
            crp.push(self.total_size(size));
        }
        self.add_element(crp, ZeroOrMore, "PID", texts(&coll.pids));
        self.add_element(crp, ZeroOrOne, "version", text(&coll.version));
        for creator in &coll.resource_creators {
            let mut el = Element::new("resourceCreator");
            self.add_element(&mut el, ZeroOrMore, "organization", texts(&creator.organizations));
            self.add_element(&mut el, ZeroOrMore, "person", texts(&creator.persons));
            crp.push(el);
        }
        if let Some(documentation) = &coll.documentation {
            crp.push(self.documentation(documentation));
        }
        if let Some(validation) = &coll.validation {
            crp.push(self.validation(validation));
        }
        for project in &coll.projects {
            crp.push(self.project(project));
        }
        if let Some(written) = &coll.written_corpus {
            crp.push(self.written_corpus(written));
        }
        if let Some(speech) = &coll.speech_corpus {
            crp.push(self.speech_corpus(speech));
        }
    }

    fn resource(&self, resource: &Resource) -> Element {
        use Cardinality::*;
        let mut el = Element::new("resource");
        self.add_element(&mut el, ZeroOrOne, "description", text(&resource.description));
        self.add_element(
            &mut el,
            One,
            "type",
            choice(keys::RESOURCE_TYPE, resource.effective_type()),
        );
        self.add_element(
            &mut el,
            OneOrMore,
            "modality",
            choices(keys::RESOURCE_MODALITY, &resource.modalities),
        );
        for annotation in &resource.annotations {
            el.push(self.annotation(annotation));
        }
        if let Some(media) = &resource.media {
            let mut med = Element::new("media");
            self.add_element(&mut med, ZeroOrMore, "format", choices(keys::MEDIA_FORMAT, &media.formats));
            el.push(med);
        }
        for size in &resource.total_sizes {
            el.push(self.total_size(size));
        }
        el
    }

    fn annotation(&self, annotation: &Annotation) -> Element {
        use Cardinality::*;
        let mut el = Element::new("annotation");
        self.add_element(&mut el, One, "type", choice(keys::ANNOTATION_TYPE, annotation.annotation_type));
        self.add_element(&mut el, One, "mode", choice(keys::ANNOTATION_MODE, annotation.mode));
        // older records only carry the scalar format
        let formats: Vec<i64> = if annotation.formats.is_empty() {
            annotation.legacy_format.into_iter().collect()
        } else {
            annotation.formats.clone()
        };
        self.add_element(&mut el, OneOrMore, "format", choices(keys::ANNOTATION_FORMAT, &formats));
        el
    }

    fn total_size(&self, size: &TotalSize) -> Element {
        let mut el = Element::new("totalSize");
        self.add_element(&mut el, Cardinality::One, "size", text(&size.size));
        self.add_element(&mut el, Cardinality::One, "sizeUnit", text(&size.size_unit));
        el
    }

    fn provenance(&self, provenance: &Provenance) -> Element {
        let mut el = Element::new("provenance");
        if let Some(temporal) = &provenance.temporal {
            let mut temp = Element::new("temporalProvenance");
            self.add_element(&mut temp, Cardinality::One, "startYear", text(&temporal.start_year));
            self.add_element(&mut temp, Cardinality::One, "endYear", text(&temporal.end_year));
            el.push(temp);
        }
        for geographic in &provenance.geographic {
            el.push(self.geographic(geographic));
        }
        el
    }

    fn geographic(&self, geographic: &GeographicProvenance) -> Element {
        let mut el = Element::new("geographicProvenance");
        let country = geographic
            .country
            .and_then(|mv| self.vocab.resolve_opt(keys::COUNTRY_NAME, mv))
            .and_then(|label| self.codes.country(label));
        if let Some((name, code)) = country {
            let mut cnt = Element::new("Country");
            cnt.push(Element::with_text("CountryName", name));
            cnt.push(Element::with_text("CountryCoding", code));
            el.push(cnt);
        }
        self.add_element(&mut el, Cardinality::ZeroOrMore, "place", texts(&geographic.cities));
        el
    }

    fn linguality(&self, linguality: &Linguality) -> Element {
        use Cardinality::ZeroOrMore;
        let mut el = Element::new("linguality");
        self.add_element(&mut el, ZeroOrMore, "lingualityType", choices(keys::LINGUALITY_TYPE, &linguality.types));
        self.add_element(
            &mut el,
            ZeroOrMore,
            "lingualityNativeness",
            choices(keys::LINGUALITY_NATIVENESS, &linguality.nativeness),
        );
        self.add_element(
            &mut el,
            ZeroOrMore,
            "lingualityAgeGroup",
            choices(keys::LINGUALITY_AGEGROUP, &linguality.age_groups),
        );
        self.add_element(
            &mut el,
            ZeroOrMore,
            "lingualityStatus",
            choices(keys::LINGUALITY_STATUS, &linguality.statuses),
        );
        self.add_element(
            &mut el,
            ZeroOrMore,
            "lingualityVariant",
            choices(keys::LINGUALITY_VARIANT, &linguality.variants),
        );
        self.add_element(
            &mut el,
            ZeroOrMore,
            "multilingualityType",
            choices(keys::LINGUALITY_MULTI, &linguality.multilinguality_types),
        );
        el
    }

    /// `Language` block, or `None` when no ISO 639-3 code is known.
    fn language(&self, mv: i64) -> Option<Element> {
        let name = self.vocab.resolve_opt(keys::LANGUAGE_NAME, mv)?;
        let code = self.codes.language_code(name)?;
        let mut el = Element::new("Language");
        el.push(Element::with_text("LanguageName", name.trim()));
        let mut iso = Element::new("ISO639");
        iso.push(Element::with_text("iso-639-3-code", code));
        el.push(iso);
        Some(el)
    }

    fn access(&self, access: &Access) -> Element {
        use Cardinality::*;
        let mut el = Element::new("access");
        self.add_element(&mut el, ZeroOrOne, "name", text(&access.name));
        self.add_element(
            &mut el,
            ZeroOrMore,
            "availability",
            choices(keys::ACCESS_AVAILABILITY, &access.availability),
        );
        self.add_element(&mut el, ZeroOrMore, "licenseName", texts(&access.license_names));
        self.add_element(&mut el, ZeroOrMore, "licenseURL", texts(&access.license_urls));
        self.add_element(
            &mut el,
            ZeroOrOne,
            "nonCommercialUsageOnly",
            choice(keys::ACCESS_NONCOMMERCIAL, access.non_commercial_usage_only),
        );
        for contact in &access.contacts {
            let mut cnt = Element::new("contact");
            self.add_element(&mut cnt, One, "person", text(&contact.person));
            self.add_element(&mut cnt, One, "address", text(&contact.address));
            self.add_element(&mut cnt, One, "email", text(&contact.email));
            el.push(cnt);
        }
        self.add_element(&mut el, ZeroOrMore, "website", texts(&access.websites));
        self.add_element(&mut el, ZeroOrOne, "ISBN", text(&access.isbn));
        self.add_element(&mut el, ZeroOrOne, "ISLRN", text(&access.islrn));
        self.add_element(&mut el, ZeroOrMore, "medium", choices(keys::ACCESS_MEDIUM, &access.media));
        el
    }

    fn documentation(&self, documentation: &Documentation) -> Element {
        use Cardinality::ZeroOrMore;
        let mut el = Element::new("documentation");
        self.add_element(
            &mut el,
            ZeroOrMore,
            "documentationType",
            choices(keys::DOCUMENTATION_TYPE, &documentation.types),
        );
        self.add_element(&mut el, ZeroOrMore, "fileName", texts(&documentation.files));
        self.add_element(&mut el, ZeroOrMore, "url", texts(&documentation.urls));
        for mv in &documentation.languages {
            if let Some(language) = self.language(*mv) {
                el.push(language);
            }
        }
        el
    }

    fn validation(&self, validation: &Validation) -> Element {
        let mut el = Element::new("validation");
        self.add_element(
            &mut el,
            Cardinality::ZeroOrOne,
            "type",
            choice(keys::VALIDATION_TYPE, validation.validation_type),
        );
        self.add_element(
            &mut el,
            Cardinality::ZeroOrMore,
            "method",
            choices(keys::VALIDATION_METHOD, &validation.methods),
        );
        el
    }

    fn project(&self, project: &Project) -> Element {
        let mut el = Element::new("project");
        self.add_element(&mut el, Cardinality::ZeroOrOne, "title", text(&project.title));
        self.add_element(&mut el, Cardinality::ZeroOrMore, "funder", texts(&project.funders));
        self.add_element(&mut el, Cardinality::ZeroOrOne, "url", text(&project.url));
        el
    }

    fn written_corpus(&self, written: &WrittenCorpus) -> Element {
        let mut el = Element::new("writtenCorpus");
        self.add_element(
            &mut el,
            Cardinality::ZeroOrMore,
            "characterEncoding",
            choices(keys::CHARACTER_ENCODING, &written.character_encodings),
        );
        self.add_element(&mut el, Cardinality::ZeroOrOne, "numberOfAuthors", text(&written.number_of_authors));
        self.add_element(
            &mut el,
            Cardinality::ZeroOrOne,
            "authorDemographics",
            text(&written.author_demographics),
        );
        el
    }

    fn speech_corpus(&self, speech: &SpeechCorpus) -> Element {
        use Cardinality::*;
        let mut el = Element::new("speechCorpus");
        self.add_element(
            &mut el,
            ZeroOrMore,
            "recordingEnvironment",
            choices(keys::SPEECH_RECORDING_ENVIRONMENT, &speech.recording_environments),
        );
        self.add_element(&mut el, ZeroOrMore, "recordingConditions", texts(&speech.recording_conditions));
        self.add_element(&mut el, ZeroOrMore, "channel", choices(keys::SPEECH_CHANNEL, &speech.channels));
        self.add_element(
            &mut el,
            ZeroOrMore,
            "socialContext",
            choices(keys::SPEECH_SOCIAL_CONTEXT, &speech.social_contexts),
        );
        self.add_element(
            &mut el,
            ZeroOrMore,
            "planningType",
            choices(keys::SPEECH_PLANNING_TYPE, &speech.planning_types),
        );
        self.add_element(
            &mut el,
            ZeroOrMore,
            "interactivity",
            choices(keys::SPEECH_INTERACTIVITY, &speech.interactivities),
        );
        self.add_element(
            &mut el,
            ZeroOrMore,
            "involvement",
            choices(keys::SPEECH_INVOLVEMENT, &speech.involvements),
        );
        self.add_element(&mut el, ZeroOrMore, "audience", choices(keys::SPEECH_AUDIENCE, &speech.audiences));
        self.add_element(
            &mut el,
            ZeroOrMore,
            "conversationalType",
            choices(keys::SPEECH_CONVERSATIONAL_TYPE, &speech.conversational_types),
        );
        self.add_element(
            &mut el,
            ZeroOrOne,
            "durationOfEffectiveSpeech",
            text(&speech.duration_effective_speech),
        );
        self.add_element(&mut el, ZeroOrOne, "durationOfFullDatabase", text(&speech.duration_full_database));
        self.add_element(&mut el, ZeroOrOne, "numberOfSpeakers", text(&speech.number_of_speakers));
        self.add_element(&mut el, ZeroOrOne, "speakerDemographics", text(&speech.speaker_demographics));
        for format in &speech.audio_formats {
            let mut af = Element::new("audioFormat");
            self.add_element(&mut af, ZeroOrOne, "speechCoding", text(&format.speech_coding));
            self.add_element(&mut af, ZeroOrOne, "samplingFrequency", text(&format.sampling_frequency));
            self.add_element(&mut af, ZeroOrOne, "compression", text(&format.compression));
            self.add_element(&mut af, ZeroOrOne, "bitResolution", text(&format.bit_resolution));
            el.push(af);
        }
        el
    }
}

fn proxy(id: String, mimetype: &str, resource_type: &str, reference: &str) -> Element {
    let mut el = Element::new("ResourceProxy");
    el.set_attr("id", id);
    let mut rtype = Element::with_text("ResourceType", resource_type);
    rtype.set_attr("mimetype", mimetype);
    el.push(rtype);
    el.push(Element::with_text("ResourceRef", reference));
    el
}

/// Reduce a label to characters allowed in an `xs:ID`.
fn id_fragment(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Export one collection to pretty-printed CMDI text.
pub fn export_collection(
    coll: &Collection,
    vocab: &Vocabulary,
    codes: &CodeList,
    options: &ExportOptions,
) -> Result<String> {
    CollectionExporter::new(vocab, codes, options)
        .export(coll)?
        .to_xml_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Contact, Media, PidRecord, Relation, TemporalProvenance};
    use crate::vocabulary::{CodeKind, CodeListEntry, FieldChoice};

    fn vocab() -> Vocabulary {
        let rows: &[(&str, i64, &str)] = &[
            (keys::RESOURCE_TYPE, 1, "text"),
            (keys::RESOURCE_TYPE, 2, "text: corpus"),
            (keys::RESOURCE_MODALITY, 1, "written"),
            (keys::GENRE_NAME, 1, "poetry"),
            (keys::GENRE_NAME, 2, "drama"),
            (keys::LANGUAGE_NAME, 1, "Dutch"),
            (keys::LANGUAGE_NAME, 2, "Klingon"),
            (keys::COUNTRY_NAME, 1, "Netherlands"),
            (keys::RELATION_TYPE, 1, "is part of"),
            (keys::ACCESS_AVAILABILITY, 1, "public"),
            (keys::ANNOTATION_TYPE, 1, "syntax"),
            (keys::ANNOTATION_MODE, 1, "manual"),
            (keys::ANNOTATION_FORMAT, 1, "FoLiA"),
        ];
        Vocabulary::from_choices(rows.iter().map(|(field, mv, label)| FieldChoice {
            field: (*field).into(),
            machine_value: *mv,
            english_name: (*label).into(),
            dutch_name: String::new(),
        }))
    }

    fn codes() -> CodeList {
        CodeList::from_entries([
            CodeListEntry {
                kind: CodeKind::Country,
                code: "NL".into(),
                name: "Netherlands (the)".into(),
            },
            CodeListEntry {
                kind: CodeKind::Language,
                code: "nld".into(),
                name: "Dutch".into(),
            },
        ])
    }

    fn sample() -> Collection {
        Collection {
            id: Some(7),
            identifier: "ABC12".into(),
            titles: vec!["Sample Corpus".into()],
            resources: vec![Resource {
                dc_type: Some(1),
                subtype: Some(2),
                modalities: vec![1],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn export(coll: &Collection, options: &ExportOptions) -> String {
        export_collection(coll, &vocab(), &codes(), options).unwrap()
    }

    fn pos(xml: &str, needle: &str) -> usize {
        xml.find(needle)
            .unwrap_or_else(|| panic!("{} not found in\n{}", needle, xml))
    }

    #[test]
    fn test_sample_collection() {
        let xml = export(&sample(), &ExportOptions::default());
        assert!(pos(&xml, "<title>Sample Corpus</title>") < pos(&xml, "<type>text: corpus</type>"));
        assert!(pos(&xml, "<type>text: corpus</type>") < pos(&xml, "<modality>written</modality>"));
        assert!(!xml.contains("<owner>"));
        assert!(xml.contains("<Header/>"));
        assert!(xml.contains("CMDVersion=\"1.1\""));
        assert!(xml.contains("xmlns=\"http://www.clarin.eu/cmd/\""));
        assert!(xml.contains("<Components>\n    <CorpusCollection>"));
    }

    #[test]
    fn test_export_is_deterministic() {
        let options = ExportOptions {
            full_header: true,
            user: Some("editor".into()),
            registry_url: "https://example.org/registry/".into(),
        };
        assert_eq!(export(&sample(), &options), export(&sample(), &options));
    }

    #[test]
    fn test_schema_order_independent_of_field_fill_order() {
        let mut coll = sample();
        coll.speech_corpus = Some(SpeechCorpus {
            number_of_speakers: "3".into(),
            ..Default::default()
        });
        coll.version = "2.0".into();
        coll.genres = vec![2, 1];
        coll.owners = vec!["CLST".into()];
        coll.clarin_centre = "CLARIN-NL".into();
        coll.provenances = vec![Provenance {
            temporal: Some(TemporalProvenance {
                start_year: "1990".into(),
                end_year: "2000".into(),
            }),
            geographic: vec![GeographicProvenance {
                country: Some(1),
                cities: vec!["Nijmegen".into()],
            }],
        }];
        coll.languages = vec![1];

        let xml = export(&coll, &ExportOptions::default());
        let order = [
            "<title>",
            "<owner>",
            "<resource>",
            "<genre>drama</genre>",
            "<genre>poetry</genre>",
            "<provenance>",
            "<startYear>1990</startYear>",
            "<CountryCoding>NL</CountryCoding>",
            "<place>Nijmegen</place>",
            "<iso-639-3-code>nld</iso-639-3-code>",
            "<clarinCentre>",
            "<version>",
            "<speechCorpus>",
        ];
        let positions: Vec<usize> = order.iter().map(|n| pos(&xml, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", xml);
    }

    #[test]
    fn test_unknown_values_and_missing_codes_are_skipped() {
        let mut coll = sample();
        coll.genres = vec![99];
        coll.languages = vec![2];
        coll.resources[0].modalities = vec![42];
        let xml = export(&coll, &ExportOptions::default());
        assert!(!xml.contains("<genre>"));
        assert!(!xml.contains("<Language>"));
        assert!(!xml.contains("<modality>"));
        assert!(!xml.contains(crate::vocabulary::EMPTY_LABEL));
    }

    #[test]
    fn test_full_header_and_proxies() {
        let mut coll = sample();
        coll.pid = PidRecord {
            pidname: Some("COLL-0001".into()),
            handle_domain: "21.11114".into(),
            url: String::new(),
        };
        coll.landing_page = "https://example.org/abc".into();
        coll.search_page = "https://example.org/sru".into();
        coll.relations = vec![Relation {
            rtype: Some(1),
            name: "Part of CGN".into(),
            related: Some("CGN".into()),
        }];
        let options = ExportOptions {
            full_header: true,
            user: Some("editor".into()),
            registry_url: "https://example.org/registry".into(),
        };
        let xml = export(&coll, &options);
        assert!(xml.contains("<MdCreator>editor</MdCreator>"));
        assert!(xml.contains("<MdSelfLink>hdl:21.11114/COLL-0001</MdSelfLink>"));
        assert!(xml.contains("<MdProfile>clarin.eu:cr1:p_1493735943947</MdProfile>"));
        assert!(pos(&xml, "id=\"lp_cbmetadata_00007\"") < pos(&xml, "id=\"rel_is_part_of_1\""));
        assert!(pos(&xml, "id=\"rel_is_part_of_1\"") < pos(&xml, "id=\"sru_cbmetadata_00007\""));
        assert!(xml.contains("<ResourceRef>https://example.org/registry/cbrelation_7_1.tsv</ResourceRef>"));
        let relation = pos(&xml, "<relation>Part of CGN</relation>");
        assert!(pos(&xml, "<dc-relation>") < relation);
        assert!(relation < pos(&xml, "</dc-relation>"));
        assert!(pos(&xml, "</Resources>") < pos(&xml, "<Components>"));
    }

    #[test]
    fn test_access_and_annotation_blocks() {
        let mut coll = sample();
        coll.resources[0].annotations = vec![Annotation {
            annotation_type: Some(1),
            mode: Some(1),
            legacy_format: Some(1),
            formats: vec![],
        }];
        coll.resources[0].media = Some(Media { formats: vec![] });
        coll.access = Some(Access {
            name: "Open".into(),
            availability: vec![1],
            license_urls: vec!["https://creativecommons.org/".into()],
            contacts: vec![Contact {
                person: "J. Doe".into(),
                address: String::new(),
                email: "j@example.org".into(),
            }],
            isbn: "978".into(),
            ..Default::default()
        });
        let xml = export(&coll, &ExportOptions::default());
        assert!(xml.contains("<format>FoLiA</format>"));
        assert!(xml.contains("<media/>"));
        assert!(pos(&xml, "<availability>public</availability>") < pos(&xml, "<licenseURL>"));
        assert!(pos(&xml, "<contact>") < pos(&xml, "<ISBN>978</ISBN>"));
        assert!(!xml.contains("<address>"));
    }

    #[test]
    fn test_filled_export_matches_profile() {
        let mut coll = sample();
        coll.owners = vec!["CLST".into()];
        coll.genres = vec![1];
        coll.languages = vec![1];
        coll.relations = vec![Relation {
            rtype: Some(1),
            name: "Part of CGN".into(),
            related: None,
        }];
        coll.resources[0].annotations = vec![Annotation {
            annotation_type: Some(1),
            mode: Some(1),
            legacy_format: None,
            formats: vec![1],
        }];
        coll.access = Some(Access {
            name: "Open".into(),
            availability: vec![1],
            contacts: vec![Contact {
                person: "J. Doe".into(),
                address: "Erasmusplein 1".into(),
                email: "j@example.org".into(),
            }],
            ..Default::default()
        });
        coll.landing_page = "https://example.org/abc".into();
        let options = ExportOptions {
            full_header: true,
            user: Some("editor".into()),
            registry_url: "https://example.org/registry".into(),
        };
        let (vocab, codes) = (vocab(), codes());
        let doc = CollectionExporter::new(&vocab, &codes, &options)
            .export(&coll)
            .unwrap();
        assert_eq!(crate::cmdi::check_profile(&doc), vec![]);

        coll.resources[0].modalities.clear();
        let doc = CollectionExporter::new(&vocab, &codes, &options)
            .export(&coll)
            .unwrap();
        let issues = crate::cmdi::check_profile(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "missing required modality");
    }

    #[test]
    fn test_collection_without_identifier_fails() {
        let coll = Collection::default();
        assert!(export_collection(&coll, &vocab(), &codes(), &ExportOptions::default()).is_err());
    }

    #[test]
    fn test_cardinality_tags() {
        assert_eq!(Cardinality::parse("0-n"), Some(Cardinality::ZeroOrMore));
        assert!(Cardinality::parse("1-n").unwrap().is_plural());
        assert!(!Cardinality::parse("0-1").unwrap().is_plural());
        assert_eq!(Cardinality::parse("2"), None);
    }
}
