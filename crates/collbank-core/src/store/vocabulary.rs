//! Vocabulary rows and ISO code lists.

use super::CatalogueStore;
use crate::error::Result;
use crate::vocabulary::{
    parse_code_list, parse_fixture, CodeKind, CodeList, CodeListEntry, FieldChoice, ImportSummary,
    Vocabulary,
};
use rusqlite::params;
use tracing::{info, warn};

impl CatalogueStore {
    // ========================================
    // Controlled vocabulary
    // ========================================

    /// Insert or replace vocabulary rows. Returns the number written.
    pub fn upsert_field_choices(&self, choices: &[FieldChoice]) -> Result<usize> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO field_choices (field, machine_value, english_name, dutch_name)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(field, machine_value) DO UPDATE SET
                    english_name = excluded.english_name,
                    dutch_name = excluded.dutch_name",
            )?;
            for choice in choices {
                stmt.execute(params![
                    choice.field,
                    choice.machine_value,
                    choice.english_name,
                    choice.dutch_name
                ])?;
            }
        }
        tx.commit()?;
        Ok(choices.len())
    }

    /// All vocabulary rows ordered by field and machine value.
    pub fn field_choices(&self) -> Result<Vec<FieldChoice>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT field, machine_value, english_name, dutch_name
             FROM field_choices ORDER BY field, machine_value",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(FieldChoice {
                field: row.get(0)?,
                machine_value: row.get(1)?,
                english_name: row.get(2)?,
                dutch_name: row.get(3)?,
            })
        })?;

        let mut choices = Vec::new();
        for row in rows {
            choices.push(row?);
        }
        Ok(choices)
    }

    /// Parse a tab-separated fixture and upsert its rows.
    pub fn import_fixture(&self, text: &str) -> Result<ImportSummary> {
        let import = parse_fixture(text)?;
        self.upsert_field_choices(&import.choices)?;
        info!(
            "Imported {} vocabulary rows across {} fields ({} skipped)",
            import.summary.rows,
            import.summary.per_field.len(),
            import.summary.skipped
        );
        Ok(import.summary)
    }

    // ========================================
    // ISO code lists
    // ========================================

    pub fn upsert_code_list(&self, entries: &[CodeListEntry]) -> Result<usize> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO code_lists (kind, code, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(kind, code) DO UPDATE SET name = excluded.name",
            )?;
            for entry in entries {
                stmt.execute(params![entry.kind.as_str(), entry.code, entry.name])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    /// Parse a code list file and upsert it. Returns the number of entries.
    pub fn import_code_list(&self, text: &str) -> Result<usize> {
        let entries = parse_code_list(text)?;
        let count = self.upsert_code_list(&entries)?;
        info!("Imported {} code list entries", count);
        Ok(count)
    }

    pub fn code_list(&self) -> Result<CodeList> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT kind, code, name FROM code_lists ORDER BY kind, name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (kind, code, name) = row?;
            match CodeKind::parse(&kind) {
                Some(kind) => entries.push(CodeListEntry { kind, code, name }),
                None => warn!("Ignoring code list row of unknown kind '{}'", kind),
            }
        }
        Ok(CodeList::from_entries(entries))
    }
}

impl Vocabulary {
    /// Build the vocabulary from the store.
    ///
    /// A read failure is logged and yields [`Vocabulary::unavailable`].
    pub fn load(store: &CatalogueStore) -> Self {
        match store.field_choices() {
            Ok(choices) => Vocabulary::from_choices(choices),
            Err(e) => {
                warn!("Vocabulary table unavailable: {}", e);
                Vocabulary::unavailable()
            }
        }
    }
}
