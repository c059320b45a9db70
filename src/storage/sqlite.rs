//! `SQLite` search store: schema, pragmas, import and lookup.

use crate::model::types::{Category, RawResults, ResultItem, SessionIdentity};
use crate::search::provider::{LookupError, SearchProvider};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Owner value for entries every identity can see (market articles).
pub const SHARED_OWNER: &str = "*";

pub const SCHEMA_VERSION: i64 = 2;

const MIGRATION_V1: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    owner TEXT NOT NULL,
    category TEXT NOT NULL,
    id TEXT NOT NULL,
    title TEXT NOT NULL,
    subtitle TEXT NOT NULL DEFAULT '',
    href TEXT NOT NULL,
    icon TEXT,
    external INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (owner, category, id)
);

CREATE INDEX IF NOT EXISTS idx_entries_owner_category ON entries(owner, category);
";

// Unicode-lowercased copies for matching; SQLite's LIKE only folds ASCII.
const MIGRATION_V2: &str = r"
ALTER TABLE entries ADD COLUMN title_folded TEXT NOT NULL DEFAULT '';
ALTER TABLE entries ADD COLUMN subtitle_folded TEXT NOT NULL DEFAULT '';
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unsupported schema version {0}")]
    UnsupportedSchema(i64),
}

/// Entry as it appears in an import file. The bucket decides the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub href: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub external: bool,
}

/// Entries owned by one identity (or [`SHARED_OWNER`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportBundle {
    pub owner: String,
    pub portfolios: Vec<ImportItem>,
    pub assets: Vec<ImportItem>,
    pub documents: Vec<ImportItem>,
    pub articles: Vec<ImportItem>,
}

impl ImportBundle {
    fn buckets(&self) -> [(Category, &[ImportItem]); 4] {
        [
            (Category::Portfolio, self.portfolios.as_slice()),
            (Category::Asset, self.assets.as_slice()),
            (Category::Document, self.documents.as_slice()),
            (Category::Article, self.articles.as_slice()),
        ]
    }
}

/// An import file holds one bundle or an array of bundles.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportFile {
    Many(Vec<ImportBundle>),
    One(ImportBundle),
}

impl ImportFile {
    pub fn into_bundles(self) -> Vec<ImportBundle> {
        match self {
            ImportFile::Many(v) => v,
            ImportFile::One(b) => vec![b],
        }
    }
}

pub struct SqliteSearchStore {
    conn: Connection,
    per_category_limit: usize,
}

impl SqliteSearchStore {
    pub fn open(path: &Path, per_category_limit: usize) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        apply_pragmas(&conn)?;
        migrate(&mut conn)?;
        debug!(path = %path.display(), "search store opened");

        Ok(Self {
            conn,
            per_category_limit: per_category_limit.max(1),
        })
    }

    /// Upsert every entry of `bundles` in one transaction. Returns the entry count.
    pub fn import(&mut self, bundles: &[ImportBundle]) -> Result<usize, StoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        let tx = self.conn.transaction()?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (owner, category, id, title, subtitle, href, icon, external, updated_at,
                                      title_folded, subtitle_folded)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(owner, category, id) DO UPDATE SET
                    title = excluded.title,
                    subtitle = excluded.subtitle,
                    title_folded = excluded.title_folded,
                    subtitle_folded = excluded.subtitle_folded,
                    href = excluded.href,
                    icon = excluded.icon,
                    external = excluded.external,
                    updated_at = excluded.updated_at",
            )?;
            for bundle in bundles {
                let owner = bundle.owner.trim();
                let owner = if owner.is_empty() { SHARED_OWNER } else { owner };
                for (category, items) in bundle.buckets() {
                    for item in items {
                        stmt.execute(params![
                            owner,
                            category.as_str(),
                            item.id,
                            item.title,
                            item.subtitle,
                            item.href,
                            item.icon,
                            item.external,
                            now,
                            item.title.to_lowercase(),
                            item.subtitle.to_lowercase(),
                        ])?;
                        written += 1;
                    }
                }
            }
        }
        tx.commit()?;
        info!(entries = written, bundles = bundles.len(), "import complete");
        Ok(written)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Case-insensitive lookup across all categories visible to `identity`.
    pub fn search_entries(
        &self,
        term: &str,
        identity: &SessionIdentity,
    ) -> Result<RawResults, StoreError> {
        let term = term.trim();
        let mut out = RawResults::default();
        if term.is_empty() {
            return Ok(out);
        }
        let escaped = escape_like(&term.to_lowercase());
        let contains = format!("%{escaped}%");
        let prefix = format!("{escaped}%");
        let limit = i64::try_from(self.per_category_limit).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare_cached(
            r"SELECT id, title, subtitle, href, icon, external
              FROM entries
              WHERE category = ?1
                AND owner IN (?2, ?6)
                AND (title_folded LIKE ?3 ESCAPE '\' OR subtitle_folded LIKE ?3 ESCAPE '\')
              ORDER BY CASE
                    WHEN title_folded LIKE ?4 ESCAPE '\' THEN 0
                    WHEN title_folded LIKE ?3 ESCAPE '\' THEN 1
                    ELSE 2
                END,
                title_folded,
                id
              LIMIT ?5",
        )?;

        for category in Category::PRIORITY {
            let rows = stmt.query_map(
                params![
                    category.as_str(),
                    identity.as_str(),
                    contains,
                    prefix,
                    limit,
                    SHARED_OWNER
                ],
                |row| {
                    Ok(ResultItem {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        subtitle: row.get(2)?,
                        href: row.get(3)?,
                        icon: row.get(4)?,
                        category,
                        external: row.get(5)?,
                    })
                },
            )?;
            let bucket = out.bucket_mut(category);
            for row in rows {
                bucket.push(row?);
            }
        }
        Ok(out)
    }

    pub fn data_version(&self) -> Result<u64, StoreError> {
        let v: i64 = self
            .conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(u64::try_from(v).unwrap_or(0))
    }
}

impl SearchProvider for SqliteSearchStore {
    fn search(&self, term: &str, identity: &SessionIdentity) -> Result<RawResults, LookupError> {
        self.search_entries(term, identity)
            .map_err(|e| LookupError::Query(e.to_string()))
    }

    fn data_version(&self) -> Result<u64, LookupError> {
        SqliteSearchStore::data_version(self).map_err(|e| LookupError::Unavailable(e.to_string()))
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn apply_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        r"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;
    let current: i64 = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?
        .unwrap_or(0);

    if current == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    match current {
        0 => {
            tx.execute_batch(MIGRATION_V1)?;
            tx.execute_batch(MIGRATION_V2)?;
        }
        1 => {
            tx.execute_batch(MIGRATION_V2)?;
            backfill_folded(&tx)?;
        }
        v => return Err(StoreError::UnsupportedSchema(v)),
    }
    tx.execute(
        "INSERT INTO meta(key, value) VALUES('schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![SCHEMA_VERSION.to_string()],
    )?;
    tx.commit()?;
    info!(version = SCHEMA_VERSION, "search store migrated");
    Ok(())
}

fn backfill_folded(conn: &Connection) -> Result<(), StoreError> {
    let rows = {
        let mut stmt = conn.prepare("SELECT rowid, title, subtitle FROM entries")?;
        let mapped = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        mapped.collect::<Result<Vec<_>, _>>()?
    };
    let mut update =
        conn.prepare("UPDATE entries SET title_folded = ?2, subtitle_folded = ?3 WHERE rowid = ?1")?;
    for (rowid, title, subtitle) in &rows {
        update.execute(params![rowid, title.to_lowercase(), subtitle.to_lowercase()])?;
    }
    debug!(rows = rows.len(), "folded search columns backfilled");
    Ok(())
}
