//! Tab-separated vocabulary fixtures.
//!
//! A fixture has a header line naming its columns (`field`, `english_name`,
//! `dutch_name` and optionally `machine_value`) followed by one row per
//! choice. Blank machine values are numbered per field, continuing after the
//! highest value already seen for that field.

use super::codes::{CodeKind, CodeListEntry};
use super::resolver::FieldChoice;
use crate::error::{CollbankError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Parsed fixture rows plus book-keeping.
#[derive(Debug, Clone, Default)]
pub struct FixtureImport {
    pub choices: Vec<FieldChoice>,
    pub summary: ImportSummary,
}

/// Counts reported back after an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub skipped: usize,
    pub per_field: BTreeMap<String, usize>,
}

fn column_index(header: &[&str], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.trim_start_matches('\u{feff}')
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim_matches(|c| c == ' ' || c == '\r')))
        .filter(|(_, line)| !line.is_empty())
}

/// Parse a vocabulary fixture.
pub fn parse_fixture(text: &str) -> Result<FixtureImport> {
    let mut lines = data_lines(text);
    let (_, header_line) = lines
        .next()
        .ok_or_else(|| CollbankError::validation("fixture", "file is empty"))?;
    let header: Vec<&str> = header_line.split('\t').collect();

    let field_col = column_index(&header, "field")
        .ok_or_else(|| CollbankError::validation("fixture", "missing 'field' column"))?;
    let english_col = column_index(&header, "english_name")
        .ok_or_else(|| CollbankError::validation("fixture", "missing 'english_name' column"))?;
    let dutch_col = column_index(&header, "dutch_name");
    let mv_col = column_index(&header, "machine_value");

    let mut import = FixtureImport::default();
    let mut next_value: HashMap<String, i64> = HashMap::new();

    for (line_no, line) in lines {
        let parts: Vec<&str> = line.split('\t').collect();
        let cell = |idx: Option<usize>| idx.and_then(|i| parts.get(i)).map(|s| s.trim()).unwrap_or("");

        let field = cell(Some(field_col));
        let english = cell(Some(english_col));
        if field.is_empty() || english.is_empty() {
            warn!("Skipping fixture line {}: field or english_name empty", line_no);
            import.summary.skipped += 1;
            continue;
        }

        let key = field.to_lowercase();
        let next = next_value.entry(key).or_insert(1);
        let machine_value = match cell(mv_col) {
            "" => {
                let mv = *next;
                *next += 1;
                mv
            }
            raw => match raw.parse::<i64>() {
                Ok(mv) => {
                    if mv >= *next {
                        *next = mv + 1;
                    }
                    mv
                }
                Err(_) => {
                    warn!("Skipping fixture line {}: bad machine_value '{}'", line_no, raw);
                    import.summary.skipped += 1;
                    continue;
                }
            },
        };

        import.choices.push(FieldChoice {
            field: field.to_string(),
            machine_value,
            english_name: english.to_string(),
            dutch_name: cell(dutch_col).to_string(),
        });
        *import
            .summary
            .per_field
            .entry(field.to_string())
            .or_insert(0) += 1;
        import.summary.rows += 1;
    }

    debug!(
        "Parsed fixture: {} rows, {} skipped",
        import.summary.rows, import.summary.skipped
    );
    Ok(import)
}

/// Parse a code list file with `kind`, `code` and `name` columns.
pub fn parse_code_list(text: &str) -> Result<Vec<CodeListEntry>> {
    let mut lines = data_lines(text);
    let (_, header_line) = lines
        .next()
        .ok_or_else(|| CollbankError::validation("code_list", "file is empty"))?;
    let header: Vec<&str> = header_line.split('\t').collect();
    let (Some(kind_col), Some(code_col), Some(name_col)) = (
        column_index(&header, "kind"),
        column_index(&header, "code"),
        column_index(&header, "name"),
    ) else {
        return Err(CollbankError::validation(
            "code_list",
            "header must name 'kind', 'code' and 'name'",
        ));
    };

    let mut entries = Vec::new();
    for (line_no, line) in lines {
        let parts: Vec<&str> = line.split('\t').collect();
        let get = |i: usize| parts.get(i).map(|s| s.trim()).unwrap_or("");
        match CodeKind::parse(get(kind_col)) {
            Some(kind) if !get(name_col).is_empty() => entries.push(CodeListEntry {
                kind,
                code: get(code_col).to_string(),
                name: get(name_col).to_string(),
            }),
            _ => warn!("Skipping code list line {}", line_no),
        }
    }
    Ok(entries)
}
