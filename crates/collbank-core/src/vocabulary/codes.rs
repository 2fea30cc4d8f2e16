//! ISO code lists for countries and languages.
//!
//! The country and language vocabularies hold display names only; the CMDI
//! profile also wants the ISO 3166 alpha-2 and ISO 639-3 codes, which come
//! from these lists.

use serde::{Deserialize, Serialize};

/// Which code list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Country,
    Language,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Country => "country",
            CodeKind::Language => "language",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "country" => Some(CodeKind::Country),
            "language" => Some(CodeKind::Language),
            _ => None,
        }
    }
}

/// One code list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListEntry {
    pub kind: CodeKind,
    pub code: String,
    pub name: String,
}

/// In-memory code lists.
#[derive(Debug, Clone, Default)]
pub struct CodeList {
    countries: Vec<(String, String)>,
    languages: Vec<(String, String)>,
}

impl CodeList {
    pub fn from_entries(entries: impl IntoIterator<Item = CodeListEntry>) -> Self {
        let mut list = Self::default();
        for entry in entries {
            let pair = (entry.code, entry.name);
            match entry.kind {
                CodeKind::Country => list.countries.push(pair),
                CodeKind::Language => list.languages.push(pair),
            }
        }
        list
    }

    /// Country name and alpha-2 code for a vocabulary label.
    ///
    /// Names such as "Netherlands (the)" match the plain label too.
    pub fn country(&self, label: &str) -> Option<(&str, &str)> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let alternative = format!("{} (the)", label);
        self.countries
            .iter()
            .find(|(_, name)| name == label || *name == alternative)
            .map(|(code, name)| (name.as_str(), code.as_str()))
    }

    /// ISO 639-3 code for a language name (case-insensitive, full match).
    pub fn language_code(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.languages
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(code, _)| code.as_str())
            .filter(|code| !code.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: CodeKind, code: &str, name: &str) -> CodeListEntry {
        CodeListEntry {
            kind,
            code: code.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_country_lookup_with_article() {
        let list = CodeList::from_entries(vec![
            entry(CodeKind::Country, "NL", "Netherlands (the)"),
            entry(CodeKind::Country, "BE", "Belgium"),
        ]);
        assert_eq!(list.country("Netherlands"), Some(("Netherlands (the)", "NL")));
        assert_eq!(list.country("Belgium"), Some(("Belgium", "BE")));
        assert_eq!(list.country("Atlantis"), None);
    }

    #[test]
    fn test_language_lookup() {
        let list = CodeList::from_entries(vec![
            entry(CodeKind::Language, "nld", "Dutch"),
            entry(CodeKind::Language, "", "Unnamed"),
        ]);
        assert_eq!(list.language_code("dutch"), Some("nld"));
        assert_eq!(list.language_code("Unnamed"), None);
        assert_eq!(list.language_code(""), None);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(CodeKind::parse(" Country "), Some(CodeKind::Country));
        assert_eq!(CodeKind::parse("script"), None);
    }
}
