//! VLO items and import audit rows.

use super::{format_ts, now, parse_ts, CatalogueStore};
use crate::error::{CollbankError, Result};
use crate::model::{PidRecord, SourceInfo, VloItem, VloItemSummary};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

const SELECT_ITEM: &str = "SELECT id, abbr, title, xmlcontent, pidname, handle_domain, url,
        collection_id, created_at, updated_at
     FROM vlo_items";

fn read_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<VloItem> {
    Ok(VloItem {
        id: Some(row.get(0)?),
        abbr: row.get(1)?,
        title: row.get(2)?,
        xmlcontent: row.get(3)?,
        pid: PidRecord {
            pidname: row.get(4)?,
            handle_domain: row.get(5)?,
            url: row.get(6)?,
        },
        collection_id: row.get(7)?,
        created_at: parse_ts(row.get(8)?),
        updated_at: parse_ts(row.get(9)?),
    })
}

impl CatalogueStore {
    // ========================================
    // VLO items
    // ========================================

    /// Insert or update a VLO item and stamp `updated_at`.
    pub fn save_vlo_item(&self, item: &mut VloItem) -> Result<i64> {
        let abbr = item.abbr.trim();
        if abbr.is_empty() {
            return Err(CollbankError::validation("abbr", "abbreviation is required"));
        }
        if abbr.contains(['/', '\\']) {
            return Err(CollbankError::validation(
                "abbr",
                format!("'{}' cannot be used in a file name", abbr),
            ));
        }
        item.abbr = abbr.to_string();

        let conn = self.lock_conn()?;
        let stamp = now();
        let id = match item.id {
            Some(id) => {
                let rows = conn.execute(
                    "UPDATE vlo_items SET abbr = ?1, title = ?2, xmlcontent = ?3, pidname = ?4,
                        handle_domain = ?5, url = ?6, collection_id = ?7, updated_at = ?8
                     WHERE id = ?9",
                    params![
                        item.abbr,
                        item.title,
                        item.xmlcontent,
                        item.pid.pidname,
                        item.pid.handle_domain,
                        item.pid.url,
                        item.collection_id,
                        format_ts(stamp),
                        id
                    ],
                )?;
                if rows == 0 {
                    return Err(CollbankError::not_found(format!("VLO item {}", id)));
                }
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO vlo_items (abbr, title, xmlcontent, pidname, handle_domain, url,
                        collection_id, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                    params![
                        item.abbr,
                        item.title,
                        item.xmlcontent,
                        item.pid.pidname,
                        item.pid.handle_domain,
                        item.pid.url,
                        item.collection_id,
                        format_ts(stamp)
                    ],
                )?;
                item.created_at = Some(stamp);
                conn.last_insert_rowid()
            }
        };

        item.id = Some(id);
        item.updated_at = Some(stamp);
        debug!("Saved VLO item {} ({})", id, item.abbr);
        Ok(id)
    }

    pub fn get_vlo_item(&self, id: i64) -> Result<VloItem> {
        let conn = self.lock_conn()?;
        conn.query_row(&format!("{} WHERE id = ?1", SELECT_ITEM), params![id], read_item)
            .optional()?
            .ok_or_else(|| CollbankError::not_found(format!("VLO item {}", id)))
    }

    /// Listing rows ordered by id; `orphans_only` keeps items without a
    /// collection.
    pub fn list_vlo_items(&self, orphans_only: bool) -> Result<Vec<VloItemSummary>> {
        let conn = self.lock_conn()?;
        let filter = if orphans_only {
            " WHERE collection_id IS NULL"
        } else {
            ""
        };
        let mut stmt = conn.prepare(&format!("{}{} ORDER BY id", SELECT_ITEM, filter))?;
        let rows = stmt.query_map([], read_item)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.summary());
        }
        Ok(items)
    }

    /// Attach an item to a collection, or detach it with `None`.
    pub fn attach_vlo_item(&self, item_id: i64, collection_id: Option<i64>) -> Result<()> {
        let conn = self.lock_conn()?;
        let rows = conn.execute(
            "UPDATE vlo_items SET collection_id = ?1 WHERE id = ?2",
            params![collection_id, item_id],
        )?;
        if rows == 0 {
            return Err(CollbankError::not_found(format!("VLO item {}", item_id)));
        }
        Ok(())
    }

    // ========================================
    // Import audit
    // ========================================

    pub fn record_source_info(&self, info: &mut SourceInfo) -> Result<i64> {
        let conn = self.lock_conn()?;
        let stamp = info.created_at.unwrap_or_else(now);
        conn.execute(
            "INSERT INTO source_info (code, url, file, collector, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![info.code, info.url, info.file, info.collector, format_ts(stamp)],
        )?;
        let id = conn.last_insert_rowid();
        info.id = Some(id);
        info.created_at = Some(stamp);
        Ok(id)
    }

    /// Audit rows, newest first.
    pub fn list_source_info(&self) -> Result<Vec<SourceInfo>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, code, url, file, collector, created_at
             FROM source_info ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceInfo {
                id: Some(row.get(0)?),
                code: row.get(1)?,
                url: row.get(2)?,
                file: row.get(3)?,
                collector: row.get(4)?,
                created_at: parse_ts(row.get(5)?),
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}
