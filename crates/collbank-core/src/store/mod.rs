//! SQLite-backed catalogue store.
//!
//! One database file holds collections, their optional one-to-one
//! components, VLO items, import audit rows, the controlled vocabulary and
//! the ISO code lists. Many-valued children of a collection are kept as a
//! JSON body on the collection row; the optional parts live in the
//! `components` table so that a dangling reference can be detected and
//! skipped on load.

mod collections;
mod vlo;
mod vocabulary;

use crate::config::RegistryConfig;
use crate::error::{CollbankError, Result};
use crate::model::{PidRecord, RecordKind};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Catalogue database.
///
/// Uses WAL mode and `Arc<Mutex<Connection>>`, so clones share one
/// connection.
#[derive(Clone)]
pub struct CatalogueStore {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogueStore {
    /// Open the store at a specific path.
    ///
    /// Creates the database and parent directories if they don't exist.
    pub fn open_at(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| CollbankError::Io {
                    message: format!("Failed to create catalogue directory: {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;
        debug!("Opened catalogue at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the store in `data_dir` under its default file name.
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        Self::open_at(&data_dir.join(RegistryConfig::DB_FILE_NAME))
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA busy_timeout={};\n\
             PRAGMA synchronous=NORMAL;\n\
             PRAGMA foreign_keys=ON;\n\
             PRAGMA temp_store=MEMORY;",
            RegistryConfig::BUSY_TIMEOUT_MS,
        ))?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                identifier TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                clarin_centre TEXT NOT NULL DEFAULT '',
                version TEXT NOT NULL DEFAULT '',
                landing_page TEXT NOT NULL DEFAULT '',
                search_page TEXT NOT NULL DEFAULT '',
                pidname TEXT,
                handle_domain TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL DEFAULT '{}',
                linguality_id INTEGER,
                access_id INTEGER,
                documentation_id INTEGER,
                validation_id INTEGER,
                written_corpus_id INTEGER,
                speech_corpus_id INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE TABLE IF NOT EXISTS components (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vlo_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                abbr TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                xmlcontent TEXT NOT NULL DEFAULT '',
                pidname TEXT,
                handle_domain TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                collection_id INTEGER REFERENCES collections(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE TABLE IF NOT EXISTS source_info (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT,
                url TEXT,
                file TEXT,
                collector TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS field_choices (
                field TEXT NOT NULL COLLATE NOCASE,
                machine_value INTEGER NOT NULL,
                english_name TEXT NOT NULL,
                dutch_name TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (field, machine_value)
            );

            CREATE TABLE IF NOT EXISTS code_lists (
                kind TEXT NOT NULL,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (kind, code)
            );

            CREATE INDEX IF NOT EXISTS idx_vlo_items_collection ON vlo_items(collection_id);",
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CollbankError::Database {
            message: "Failed to acquire catalogue connection lock".to_string(),
            source: None,
        })
    }

    // ========================================
    // PID bookkeeping
    // ========================================

    /// Store the PID triple of a collection or VLO item.
    ///
    /// Leaves `updated_at` alone: a handle update is not a content edit and
    /// must not turn a published record stale.
    pub fn update_pid(&self, kind: RecordKind, id: i64, pid: &PidRecord) -> Result<()> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "UPDATE {} SET pidname = ?1, handle_domain = ?2, url = ?3 WHERE id = ?4",
            kind.table()
        );
        let rows = conn.execute(&sql, params![pid.pidname, pid.handle_domain, pid.url, id])?;
        if rows == 0 {
            return Err(CollbankError::not_found(format!("{} {}", kind.table(), id)));
        }
        debug!("Updated PID of {} {}", kind.table(), id);
        Ok(())
    }
}

// ========================================
// Timestamp helpers
// ========================================

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Current time at the precision the store keeps.
pub(crate) fn now() -> DateTime<Utc> {
    parse_ts(Some(format_ts(Utc::now()))).unwrap_or_else(Utc::now)
}


#[cfg(test)]
mod tests {
    use super::test_support::create_test_store;
    use super::*;

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("catalogue.sqlite");
        CatalogueStore::open_at(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_reopen_keeps_schema() {
        let (store, temp_dir) = create_test_store();
        drop(store);
        let db_path = temp_dir.path().join("test-catalogue.sqlite");
        CatalogueStore::open_at(&db_path).unwrap();
    }

    #[test]
    fn test_update_pid_missing_row() {
        let (store, _temp_dir) = create_test_store();
        let err = store
            .update_pid(RecordKind::VloItem, 99, &PidRecord::default())
            .unwrap_err();
        assert!(matches!(err, CollbankError::NotFound { .. }));
    }

    #[test]
    fn test_timestamp_round_trip_precision() {
        let ts = now();
        assert_eq!(parse_ts(Some(format_ts(ts))), Some(ts));
        assert_eq!(parse_ts(Some("garbage".into())), None);
    }
}
