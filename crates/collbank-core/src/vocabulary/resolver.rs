//! Machine value to label resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label returned for a machine value that is not in the table.
pub const EMPTY_LABEL: &str = "(empty)";

/// One row of the `field_choices` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChoice {
    pub field: String,
    pub machine_value: i64,
    pub english_name: String,
    pub dutch_name: String,
}

/// A (machine value, label) pair offered to data entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub machine_value: i64,
    pub label: String,
}

impl Choice {
    fn new(machine_value: i64, label: impl Into<String>) -> Self {
        Self {
            machine_value,
            label: label.into(),
        }
    }
}

/// Which part of a compound `"category: value"` label a choice list shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChoicePosition {
    /// The full label.
    #[default]
    Full,
    /// The part before the first `:` (the DCtype of a resource type).
    Before,
    /// The part after the `:` for labels whose prefix equals the category.
    After(String),
}

impl ChoicePosition {
    /// Parse the `position`/`subcategory` pair used by the RPC layer.
    pub fn from_parts(position: Option<&str>, subcategory: Option<&str>) -> Self {
        match (position, subcategory) {
            (Some("before"), _) => ChoicePosition::Before,
            (Some("after"), Some(sub)) => ChoicePosition::After(sub.to_string()),
            _ => ChoicePosition::Full,
        }
    }
}

/// Immutable view of the controlled vocabulary table.
///
/// Built once at startup; lookups never fail. An unknown machine value
/// resolves to [`EMPTY_LABEL`], and a vocabulary whose backing store could
/// not be read hands out the two-entry default choice list.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    /// Rows per lower-cased field key, ordered by machine value.
    fields: HashMap<String, Vec<FieldChoice>>,
    available: bool,
}

impl Vocabulary {
    /// Build a vocabulary from table rows.
    pub fn from_choices(choices: impl IntoIterator<Item = FieldChoice>) -> Self {
        let mut fields: HashMap<String, Vec<FieldChoice>> = HashMap::new();
        for choice in choices {
            fields
                .entry(choice.field.to_lowercase())
                .or_default()
                .push(choice);
        }
        for rows in fields.values_mut() {
            rows.sort_by_key(|c| c.machine_value);
        }
        Self {
            fields,
            available: true,
        }
    }

    /// A vocabulary standing in for a backing store that could not be read.
    pub fn unavailable() -> Self {
        Self {
            fields: HashMap::new(),
            available: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Number of rows across all fields.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All rows of one field, ordered by machine value.
    pub fn choices(&self, field: &str) -> &[FieldChoice] {
        self.fields
            .get(&field.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn find(&self, field: &str, machine_value: i64) -> Option<&FieldChoice> {
        self.choices(field)
            .iter()
            .find(|c| c.machine_value == machine_value)
    }

    /// English label of a machine value, or [`EMPTY_LABEL`] when unknown.
    pub fn resolve(&self, field: &str, machine_value: i64) -> String {
        self.resolve_opt(field, machine_value)
            .unwrap_or(EMPTY_LABEL)
            .to_string()
    }

    /// English label of a machine value, `None` when unknown.
    pub fn resolve_opt(&self, field: &str, machine_value: i64) -> Option<&str> {
        self.find(field, machine_value)
            .map(|c| c.english_name.as_str())
    }

    /// Dutch label of a machine value, or [`EMPTY_LABEL`] when unknown.
    pub fn resolve_dutch(&self, field: &str, machine_value: i64) -> String {
        self.find(field, machine_value)
            .map(|c| c.dutch_name.clone())
            .unwrap_or_else(|| EMPTY_LABEL.to_string())
    }

    /// Reverse lookup by English label (case-insensitive).
    pub fn machine_value(&self, field: &str, label: &str) -> Option<i64> {
        let label = label.trim();
        self.choices(field)
            .iter()
            .find(|c| c.english_name.trim().eq_ignore_ascii_case(label))
            .map(|c| c.machine_value)
    }

    /// Machine value of the resource type entry matching a DCtype label.
    ///
    /// An exact label match wins; otherwise the first entry whose label
    /// starts with `"{dctype}:"` stands for the category.
    pub fn dc_type_for(&self, dctype: &str) -> Option<i64> {
        let dctype = dctype.trim();
        if dctype.is_empty() {
            return None;
        }
        let field = super::keys::RESOURCE_TYPE;
        if let Some(mv) = self.machine_value(field, dctype) {
            return Some(mv);
        }
        let starting = format!("{}:", dctype.to_lowercase());
        self.choices(field)
            .iter()
            .find(|c| c.english_name.to_lowercase().starts_with(&starting))
            .map(|c| c.machine_value)
    }

    /// Machine value of the resource type entry `"{dctype}:{subtype}"`.
    pub fn subtype_for(&self, dctype: &str, subtype: &str) -> Option<i64> {
        let (dctype, subtype) = (dctype.trim(), subtype.trim());
        if dctype.is_empty() || subtype.is_empty() {
            return None;
        }
        self.choices(super::keys::RESOURCE_TYPE)
            .iter()
            .find(|c| match c.english_name.split_once(':') {
                Some((pre, post)) => {
                    pre.trim().eq_ignore_ascii_case(dctype)
                        && post.trim().eq_ignore_ascii_case(subtype)
                }
                None => false,
            })
            .map(|c| c.machine_value)
    }

    /// Sorted, de-duplicated choice list for a field.
    ///
    /// Labels are cut according to `position`; entries whose cut label is
    /// empty are dropped, and the first entry producing a given label wins.
    pub fn build_choice_list(&self, field: &str, position: &ChoicePosition) -> Vec<Choice> {
        if !self.available {
            return default_choice_list();
        }

        let mut list: Vec<Choice> = Vec::new();
        for choice in self.choices(field) {
            let label = match position {
                ChoicePosition::Full => choice.english_name.trim(),
                ChoicePosition::Before => choice
                    .english_name
                    .split(':')
                    .next()
                    .unwrap_or_default()
                    .trim(),
                ChoicePosition::After(subcategory) => match choice.english_name.split_once(':') {
                    Some((pre, post)) if pre.trim() == subcategory.trim() => post.trim(),
                    _ => "",
                },
            };
            if !label.is_empty() && !list.iter().any(|c| c.label == label) {
                list.push(Choice::new(choice.machine_value, label));
            }
        }
        list.sort_by(|a, b| a.label.cmp(&b.label));
        list
    }
}

/// Choice list handed out when the vocabulary table cannot be read.
pub fn default_choice_list() -> Vec<Choice> {
    vec![Choice::new(0, "-"), Choice::new(1, "N/A")]
}
