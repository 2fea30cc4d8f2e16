//! Collection persistence.

use super::{format_ts, now, parse_ts, CatalogueStore};
use crate::config::CmdiConfig;
use crate::error::{CollbankError, Result};
use crate::model::{
    Collection, CollectionSummary, PidRecord, Project, Provenance, Relation, Resource,
    ResourceCreator, TotalSize,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Many-valued children stored as the JSON body of a collection row.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CollectionBody {
    titles: Vec<String>,
    owners: Vec<String>,
    resources: Vec<Resource>,
    genres: Vec<i64>,
    provenances: Vec<Provenance>,
    languages: Vec<i64>,
    language_disorders: Vec<String>,
    relations: Vec<Relation>,
    domains: Vec<String>,
    total_sizes: Vec<TotalSize>,
    pids: Vec<String>,
    resource_creators: Vec<ResourceCreator>,
    projects: Vec<Project>,
}

impl CollectionBody {
    fn of(coll: &Collection) -> Self {
        Self {
            titles: coll.titles.clone(),
            owners: coll.owners.clone(),
            resources: coll.resources.clone(),
            genres: coll.genres.clone(),
            provenances: coll.provenances.clone(),
            languages: coll.languages.clone(),
            language_disorders: coll.language_disorders.clone(),
            relations: coll.relations.clone(),
            domains: coll.domains.clone(),
            total_sizes: coll.total_sizes.clone(),
            pids: coll.pids.clone(),
            resource_creators: coll.resource_creators.clone(),
            projects: coll.projects.clone(),
        }
    }

    fn apply_to(self, coll: &mut Collection) {
        coll.titles = self.titles;
        coll.owners = self.owners;
        coll.resources = self.resources;
        coll.genres = self.genres;
        coll.provenances = self.provenances;
        coll.languages = self.languages;
        coll.language_disorders = self.language_disorders;
        coll.relations = self.relations;
        coll.domains = self.domains;
        coll.total_sizes = self.total_sizes;
        coll.pids = self.pids;
        coll.resource_creators = self.resource_creators;
        coll.projects = self.projects;
    }
}

#[derive(Deserialize)]
struct TitlesOnly {
    #[serde(default)]
    titles: Vec<String>,
}

/// Optional one-to-one parts, in the order of their reference columns.
const COMPONENTS: [&str; 6] = [
    "linguality",
    "access",
    "documentation",
    "validation",
    "written_corpus",
    "speech_corpus",
];

type ComponentRefs = [Option<i64>; 6];

const SELECT_COLLECTION: &str = "SELECT id, identifier, description, clarin_centre, version,
        landing_page, search_page, pidname, handle_domain, url, body,
        linguality_id, access_id, documentation_id, validation_id,
        written_corpus_id, speech_corpus_id, created_at, updated_at
     FROM collections";

/// Scalar columns of a collection row, before the body and parts are decoded.
struct CollectionRow {
    coll: Collection,
    body: String,
    refs: ComponentRefs,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CollectionRow> {
    let coll = Collection {
        id: Some(row.get(0)?),
        identifier: row.get(1)?,
        description: row.get(2)?,
        clarin_centre: row.get(3)?,
        version: row.get(4)?,
        landing_page: row.get(5)?,
        search_page: row.get(6)?,
        pid: PidRecord {
            pidname: row.get(7)?,
            handle_domain: row.get(8)?,
            url: row.get(9)?,
        },
        created_at: parse_ts(row.get(17)?),
        updated_at: parse_ts(row.get(18)?),
        ..Default::default()
    };
    Ok(CollectionRow {
        coll,
        body: row.get(10)?,
        refs: [
            row.get(11)?,
            row.get(12)?,
            row.get(13)?,
            row.get(14)?,
            row.get(15)?,
            row.get(16)?,
        ],
    })
}

fn load_component<T: DeserializeOwned>(
    conn: &Connection,
    owner: i64,
    slot: usize,
    id: Option<i64>,
) -> Result<Option<T>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let kind = COMPONENTS[slot];
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM components WHERE id = ?1 AND kind = ?2",
            params![id, kind],
            |row| row.get(0),
        )
        .optional()?;
    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => {
            warn!("Collection {} references missing {} component {}", owner, kind, id);
            Ok(None)
        }
    }
}

fn store_component<T: Serialize>(
    conn: &Connection,
    slot: usize,
    existing: Option<i64>,
    value: Option<&T>,
) -> Result<Option<i64>> {
    let kind = COMPONENTS[slot];
    match (value, existing) {
        (Some(value), existing) => {
            let body = serde_json::to_string(value)?;
            if let Some(id) = existing {
                let rows = conn.execute(
                    "UPDATE components SET body = ?1 WHERE id = ?2 AND kind = ?3",
                    params![body, id, kind],
                )?;
                if rows > 0 {
                    return Ok(Some(id));
                }
            }
            conn.execute(
                "INSERT INTO components (kind, body) VALUES (?1, ?2)",
                params![kind, body],
            )?;
            Ok(Some(conn.last_insert_rowid()))
        }
        (None, Some(id)) => {
            conn.execute("DELETE FROM components WHERE id = ?1", params![id])?;
            Ok(None)
        }
        (None, None) => Ok(None),
    }
}

fn hydrate(conn: &Connection, row: CollectionRow) -> Result<Collection> {
    let CollectionRow { mut coll, body, refs } = row;
    let owner = coll.id.unwrap_or_default();
    let body: CollectionBody = serde_json::from_str(&body)?;
    body.apply_to(&mut coll);
    coll.linguality = load_component(conn, owner, 0, refs[0])?;
    coll.access = load_component(conn, owner, 1, refs[1])?;
    coll.documentation = load_component(conn, owner, 2, refs[2])?;
    coll.validation = load_component(conn, owner, 3, refs[3])?;
    coll.written_corpus = load_component(conn, owner, 4, refs[4])?;
    coll.speech_corpus = load_component(conn, owner, 5, refs[5])?;
    Ok(coll)
}

/// Insert or update the row of `coll` under `identifier` inside `tx`.
///
/// Returns the row id and the `updated_at` that was written. Sets
/// `created_at` on insert.
fn write_collection_row(
    tx: &Transaction<'_>,
    coll: &mut Collection,
    identifier: &str,
    touch: bool,
) -> Result<(i64, Option<DateTime<Utc>>)> {
    let clash: Option<i64> = tx
        .query_row(
            "SELECT id FROM collections WHERE identifier = ?1 AND id IS NOT ?2",
            params![identifier, coll.id],
            |row| row.get(0),
        )
        .optional()?;
    if clash.is_some() {
        return Err(CollbankError::validation(
            "identifier",
            format!("'{}' is already in use", identifier),
        ));
    }

    let existing: ComponentRefs = match coll.id {
        Some(id) => tx
            .query_row(
                "SELECT linguality_id, access_id, documentation_id, validation_id,
                        written_corpus_id, speech_corpus_id
                 FROM collections WHERE id = ?1",
                params![id],
                |row| {
                    Ok([
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ])
                },
            )
            .optional()?
            .ok_or_else(|| CollbankError::not_found(format!("collection {}", id)))?,
        None => [None; 6],
    };

    let refs: ComponentRefs = [
        store_component(tx, 0, existing[0], coll.linguality.as_ref())?,
        store_component(tx, 1, existing[1], coll.access.as_ref())?,
        store_component(tx, 2, existing[2], coll.documentation.as_ref())?,
        store_component(tx, 3, existing[3], coll.validation.as_ref())?,
        store_component(tx, 4, existing[4], coll.written_corpus.as_ref())?,
        store_component(tx, 5, existing[5], coll.speech_corpus.as_ref())?,
    ];
    let body = serde_json::to_string(&CollectionBody::of(coll))?;
    let stamp = now();
    let updated_at = if touch { Some(stamp) } else { coll.updated_at };

    let id = match coll.id {
        Some(id) => {
            tx.execute(
                "UPDATE collections SET identifier = ?1, description = ?2, clarin_centre = ?3,
                    version = ?4, landing_page = ?5, search_page = ?6, pidname = ?7,
                    handle_domain = ?8, url = ?9, body = ?10, linguality_id = ?11,
                    access_id = ?12, documentation_id = ?13, validation_id = ?14,
                    written_corpus_id = ?15, speech_corpus_id = ?16, updated_at = ?17
                 WHERE id = ?18",
                params![
                    identifier,
                    coll.description,
                    coll.clarin_centre,
                    coll.version,
                    coll.landing_page,
                    coll.search_page,
                    coll.pid.pidname,
                    coll.pid.handle_domain,
                    coll.pid.url,
                    body,
                    refs[0],
                    refs[1],
                    refs[2],
                    refs[3],
                    refs[4],
                    refs[5],
                    updated_at.map(format_ts),
                    id
                ],
            )?;
            id
        }
        None => {
            tx.execute(
                "INSERT INTO collections (identifier, description, clarin_centre, version,
                    landing_page, search_page, pidname, handle_domain, url, body,
                    linguality_id, access_id, documentation_id, validation_id,
                    written_corpus_id, speech_corpus_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    identifier,
                    coll.description,
                    coll.clarin_centre,
                    coll.version,
                    coll.landing_page,
                    coll.search_page,
                    coll.pid.pidname,
                    coll.pid.handle_domain,
                    coll.pid.url,
                    body,
                    refs[0],
                    refs[1],
                    refs[2],
                    refs[3],
                    refs[4],
                    refs[5],
                    format_ts(stamp),
                    updated_at.map(format_ts)
                ],
            )?;
            coll.created_at = Some(stamp);
            tx.last_insert_rowid()
        }
    };
    Ok((id, updated_at))
}

/// `{stem}_{id}`, with the stem shortened so the whole fits the limit.
fn copy_identifier(identifier: &str, id: i64) -> String {
    let suffix = format!("_{}", id);
    let keep = CmdiConfig::MAX_IDENTIFIER_LENGTH.saturating_sub(suffix.len());
    let stem: String = identifier.chars().take(keep).collect();
    format!("{}{}", stem, suffix)
}

impl CatalogueStore {
    // ========================================
    // Collection CRUD
    // ========================================

    /// Insert or update a collection and stamp `updated_at`.
    ///
    /// Fills in `id`, the resolved `identifier` and the timestamps on
    /// success. Returns the row id.
    pub fn save_collection(&self, coll: &mut Collection) -> Result<i64> {
        self.write_collection(coll, true)
    }

    /// Update a stored collection without touching `updated_at`.
    ///
    /// Used by data repairs that must not mark published records stale.
    pub fn rewrite_collection(&self, coll: &mut Collection) -> Result<i64> {
        if coll.id.is_none() {
            return Err(CollbankError::validation("id", "only stored collections can be rewritten"));
        }
        self.write_collection(coll, false)
    }

    fn write_collection(&self, coll: &mut Collection, touch: bool) -> Result<i64> {
        coll.validate()?;
        let identifier = coll.resolve_identifier()?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let (id, updated_at) = write_collection_row(&tx, coll, &identifier, touch)?;
        tx.commit()?;

        coll.id = Some(id);
        coll.identifier = identifier;
        coll.updated_at = updated_at;
        debug!("Saved collection {} ({})", id, coll.identifier);
        Ok(id)
    }

    /// Store a deep copy of a collection under a new id.
    ///
    /// The copy gets its own component rows, the identifier
    /// `{identifier}_{new id}` (the stem cut to fit the length limit) and a
    /// cleared PID; only the handle domain is carried over.
    pub fn copy_collection(&self, id: i64) -> Result<Collection> {
        let source = self.get_collection(id)?;
        let mut copy = Collection {
            id: None,
            pid: PidRecord {
                handle_domain: source.pid.handle_domain.clone(),
                ..Default::default()
            },
            created_at: None,
            updated_at: None,
            ..source.clone()
        };

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        // blank until the row id is known; no saved collection has a blank identifier
        let (new_id, updated_at) = write_collection_row(&tx, &mut copy, "", true)?;
        let identifier = copy_identifier(&source.identifier, new_id);
        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM collections WHERE identifier = ?1",
                params![identifier],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(CollbankError::validation(
                "identifier",
                format!("'{}' is already in use", identifier),
            ));
        }
        tx.execute(
            "UPDATE collections SET identifier = ?1 WHERE id = ?2",
            params![identifier, new_id],
        )?;
        tx.commit()?;

        copy.id = Some(new_id);
        copy.identifier = identifier;
        copy.updated_at = updated_at;
        info!("Copied collection {} to {} ({})", id, new_id, copy.identifier);
        Ok(copy)
    }

    /// Load a collection with all of its parts.
    pub fn get_collection(&self, id: i64) -> Result<Collection> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_COLLECTION), params![id], read_row)
            .optional()?
            .ok_or_else(|| CollbankError::not_found(format!("collection {}", id)))?;
        hydrate(&conn, row)
    }

    /// Load a collection by its short identifier.
    pub fn find_collection(&self, identifier: &str) -> Result<Option<Collection>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!("{} WHERE identifier = ?1", SELECT_COLLECTION),
                params![identifier.trim()],
                read_row,
            )
            .optional()?;
        row.map(|row| hydrate(&conn, row)).transpose()
    }

    /// All collections, ordered by id.
    pub fn all_collections(&self) -> Result<Vec<Collection>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLLECTION))?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(|row| hydrate(&conn, row)).collect()
    }

    /// Listing rows, ordered by identifier.
    pub fn list_collections(&self) -> Result<Vec<CollectionSummary>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, identifier, body, updated_at FROM collections ORDER BY identifier",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, identifier, body, updated_at) = row?;
            let titles: TitlesOnly = serde_json::from_str(&body)?;
            summaries.push(CollectionSummary {
                id,
                identifier,
                title: titles.titles.join(", "),
                updated_at: parse_ts(updated_at),
            });
        }
        Ok(summaries)
    }

    /// True when any collection uses `identifier`.
    pub fn identifier_exists(&self, identifier: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM collections WHERE identifier = ?1",
                params![identifier.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Delete a collection and its parts. VLO items attached to it become
    /// orphans.
    pub fn delete_collection(&self, id: i64) -> Result<bool> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let refs: Option<ComponentRefs> = tx
            .query_row(
                "SELECT linguality_id, access_id, documentation_id, validation_id,
                        written_corpus_id, speech_corpus_id
                 FROM collections WHERE id = ?1",
                params![id],
                |row| {
                    Ok([
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ])
                },
            )
            .optional()?;
        let Some(refs) = refs else {
            return Ok(false);
        };
        for component in refs.into_iter().flatten() {
            tx.execute("DELETE FROM components WHERE id = ?1", params![component])?;
        }
        tx.execute(
            "UPDATE vlo_items SET collection_id = NULL WHERE collection_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM collections WHERE id = ?1", params![id])?;
        tx.commit()?;
        debug!("Deleted collection {}", id);
        Ok(true)
    }
}
