//! SQLite-backed implementation of the [`Store`] trait.
//!
//! Schema, migrations, and the connection live here; read queries are in
//! [`crate::sqlite_queries`] and the per-file write path in
//! [`crate::sqlite_batch`] — kept separate because each grows independently
//! as operations are added.

use rusqlite::Connection;

use crate::error::PuiError;
use crate::types::{Callsite, Edge, EdgeKind, Provenance, Symbol, SymbolKind};

pub const SCHEMA_VERSION: u32 = 1;

/// SQLite-backed implementation of [`crate::store::Store`].
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open or create an index database at the given path.
    pub fn open(path: &str) -> Result<Self, PuiError> {
        let conn = Connection::open(path)?;
        let store = SqliteStore { conn };
        store.configure_connection()?;
        store.run_migrations()?;
        Ok(store)
    }

    /// Create an in-memory index database (for testing and stats-only runs).
    pub fn in_memory() -> Result<Self, PuiError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn };
        store.configure_connection()?;
        store.run_migrations()?;
        Ok(store)
    }

    fn configure_connection(&self) -> Result<(), PuiError> {
        // WAL lets readers run concurrently with the single writer (spec §5).
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(())
    }

    /// Read `schema_version`, apply ordered idempotent migrations, and abort
    /// with `SchemaTooNew` if the stored version is ahead of what this build
    /// understands (spec §4.6).
    fn run_migrations(&self) -> Result<(), PuiError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .ok();

        if let Some(found) = &found {
            let found_version: u32 = found.parse().map_err(|_| {
                PuiError::StoreCorrupt(format!("non-numeric schema_version {found:?}"))
            })?;
            if found_version > SCHEMA_VERSION {
                return Err(PuiError::SchemaTooNew {
                    found: found_version,
                    supported: SCHEMA_VERSION,
                });
            }
        }

        self.apply_schema_v1()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
            [SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    fn apply_schema_v1(&self) -> Result<(), PuiError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS files (
                path TEXT PRIMARY KEY,
                language TEXT,
                content_hash TEXT NOT NULL,
                size INTEGER NOT NULL,
                mtime INTEGER NOT NULL,
                indexed_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_files_language ON files(language);

            CREATE TABLE IF NOT EXISTS symbols (
                id INTEGER PRIMARY KEY,
                stable_id TEXT NOT NULL UNIQUE,
                file_path TEXT NOT NULL REFERENCES files(path) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                qualified_name TEXT NOT NULL,
                line_start INTEGER NOT NULL,
                line_end INTEGER NOT NULL,
                col_start INTEGER NOT NULL,
                col_end INTEGER NOT NULL,
                signature TEXT NOT NULL DEFAULT '',
                docstring TEXT,
                parent_id INTEGER REFERENCES symbols(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_symbols_file_path ON symbols(file_path);
            CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);

            CREATE TABLE IF NOT EXISTS callsites (
                id INTEGER PRIMARY KEY,
                file_path TEXT NOT NULL REFERENCES files(path) ON DELETE CASCADE,
                line INTEGER NOT NULL,
                col INTEGER NOT NULL,
                callee_text TEXT NOT NULL,
                enclosing_symbol_id INTEGER REFERENCES symbols(id) ON DELETE CASCADE,
                imports_in_scope TEXT NOT NULL DEFAULT '[]'
            );
            CREATE INDEX IF NOT EXISTS idx_callsites_file_path ON callsites(file_path);

            CREATE TABLE IF NOT EXISTS edges (
                id INTEGER PRIMARY KEY,
                source_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
                target_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                confidence REAL NOT NULL,
                provenance TEXT NOT NULL,
                origin_file TEXT NOT NULL,
                metadata TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);
            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);
            CREATE INDEX IF NOT EXISTS idx_edges_kind ON edges(kind);
            CREATE INDEX IF NOT EXISTS idx_edges_origin_file ON edges(origin_file);

            CREATE VIRTUAL TABLE IF NOT EXISTS symbols_fts USING fts5(
                name,
                qualified_name,
                content='symbols',
                content_rowid='id'
            );

            CREATE TRIGGER IF NOT EXISTS symbols_ai AFTER INSERT ON symbols BEGIN
                INSERT INTO symbols_fts(rowid, name, qualified_name)
                VALUES (new.id, new.name, new.qualified_name);
            END;
            CREATE TRIGGER IF NOT EXISTS symbols_ad AFTER DELETE ON symbols BEGIN
                INSERT INTO symbols_fts(symbols_fts, rowid, name, qualified_name)
                VALUES ('delete', old.id, old.name, old.qualified_name);
            END;
            CREATE TRIGGER IF NOT EXISTS symbols_au AFTER UPDATE ON symbols BEGIN
                INSERT INTO symbols_fts(symbols_fts, rowid, name, qualified_name)
                VALUES ('delete', old.id, old.name, old.qualified_name);
                INSERT INTO symbols_fts(rowid, name, qualified_name)
                VALUES (new.id, new.name, new.qualified_name);
            END;
            ",
        )?;
        Ok(())
    }
}

pub(crate) fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<Symbol> {
    let kind_str: String = row.get("kind")?;
    Ok(Symbol {
        id: row.get("id")?,
        stable_id: row.get("stable_id")?,
        file_path: row.get("file_path")?,
        kind: SymbolKind::from_str_opt(&kind_str).unwrap_or(SymbolKind::Function),
        name: row.get("name")?,
        qualified_name: row.get("qualified_name")?,
        line_start: row.get("line_start")?,
        line_end: row.get("line_end")?,
        col_start: row.get("col_start")?,
        col_end: row.get("col_end")?,
        signature: row.get("signature")?,
        docstring: row.get("docstring")?,
        parent_id: row.get::<_, Option<i64>>("parent_id")?.map(|v| v as u64),
    })
}

pub(crate) fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<Edge> {
    let kind_str: String = row.get("kind")?;
    let provenance_str: String = row.get("provenance")?;
    Ok(Edge {
        id: row.get("id")?,
        source_id: row.get("source_id")?,
        target_id: row.get("target_id")?,
        kind: EdgeKind::from_str_opt(&kind_str).unwrap_or(EdgeKind::Call),
        confidence: row.get("confidence")?,
        provenance: if provenance_str == "resolved" {
            Provenance::Resolved
        } else {
            Provenance::Heuristic
        },
        origin_file: row.get("origin_file")?,
        metadata: row.get("metadata")?,
    })
}

pub(crate) fn row_to_callsite(row: &rusqlite::Row) -> rusqlite::Result<Callsite> {
    let imports_json: String = row.get("imports_in_scope")?;
    Ok(Callsite {
        id: row.get("id")?,
        file_path: row.get("file_path")?,
        line: row.get("line")?,
        col: row.get("col")?,
        callee_text: row.get("callee_text")?,
        enclosing_symbol_id: row
            .get::<_, Option<i64>>("enclosing_symbol_id")?
            .unwrap_or(0) as u64,
        imports_in_scope: serde_json::from_str(&imports_json).unwrap_or_default(),
    })
}
