//! `Store` trait implementation for [`SqliteStore`] — all reads, plus the
//! thin write methods that don't need the remapping dance in
//! [`crate::sqlite_batch`].

use rusqlite::params;

use crate::error::PuiError;
use crate::sqlite::{row_to_callsite, row_to_edge, row_to_symbol, SqliteStore, SCHEMA_VERSION};
use crate::store::Store;
use crate::types::{Callsite, Edge, EdgeDirection, EdgeKind, FileIndex, FileRow, Language, Symbol};

impl Store for SqliteStore {
    fn schema_version(&self) -> Result<u32, PuiError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .ok();
        match value {
            Some(v) => v
                .parse()
                .map_err(|_| PuiError::StoreCorrupt(format!("non-numeric schema_version {v:?}"))),
            None => Ok(SCHEMA_VERSION),
        }
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>, PuiError> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .ok();
        Ok(value)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<(), PuiError> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_file(&self, path: &str) -> Result<Option<FileRow>, PuiError> {
        let row = self
            .conn
            .query_row("SELECT * FROM files WHERE path = ?1", params![path], row_to_file)
            .ok();
        Ok(row)
    }

    fn all_files(&self) -> Result<Vec<FileRow>, PuiError> {
        let mut stmt = self.conn.prepare("SELECT * FROM files ORDER BY path")?;
        let rows = stmt
            .query_map([], row_to_file)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn delete_file(&mut self, path: &str) -> Result<(), PuiError> {
        // symbols/callsites cascade via ON DELETE CASCADE on files(path);
        // edges reference symbols, which cascade transitively.
        self.conn
            .execute("DELETE FROM files WHERE path = ?1", params![path])?;
        Ok(())
    }

    fn touch_file(&mut self, path: &str, indexed_at: i64) -> Result<(), PuiError> {
        self.conn.execute(
            "UPDATE files SET indexed_at = ?1 WHERE path = ?2",
            params![indexed_at, path],
        )?;
        Ok(())
    }

    fn replace_file(&mut self, file: &FileRow, index: &FileIndex) -> Result<(), PuiError> {
        self.write_file_index(file, index)
    }

    fn get_symbol(&self, id: u64) -> Result<Option<Symbol>, PuiError> {
        let row = self
            .conn
            .query_row("SELECT * FROM symbols WHERE id = ?1", params![id], row_to_symbol)
            .ok();
        Ok(row)
    }

    fn get_symbol_by_stable_id(&self, stable_id: &str) -> Result<Option<Symbol>, PuiError> {
        let row = self
            .conn
            .query_row(
                "SELECT * FROM symbols WHERE stable_id = ?1",
                params![stable_id],
                row_to_symbol,
            )
            .ok();
        Ok(row)
    }

    fn symbols_in_file(&self, path: &str) -> Result<Vec<Symbol>, PuiError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM symbols WHERE file_path = ?1 ORDER BY line_start")?;
        let rows = stmt
            .query_map(params![path], row_to_symbol)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn find_symbols_by_name(&self, name: &str) -> Result<Vec<Symbol>, PuiError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM symbols WHERE name = ?1 OR qualified_name = ?1")?;
        let rows = stmt
            .query_map(params![name], row_to_symbol)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn search_symbols_fts(&self, query: &str, limit: usize) -> Result<Vec<Symbol>, PuiError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.* FROM symbols s
             JOIN symbols_fts f ON f.rowid = s.id
             WHERE symbols_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![fts_escape(query), limit as i64], row_to_symbol)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn edges(
        &self,
        symbol_id: u64,
        direction: EdgeDirection,
        kind: Option<EdgeKind>,
    ) -> Result<Vec<Edge>, PuiError> {
        let base = match direction {
            EdgeDirection::Incoming => "SELECT * FROM edges WHERE target_id = ?1",
            EdgeDirection::Outgoing => "SELECT * FROM edges WHERE source_id = ?1",
            EdgeDirection::Both => "SELECT * FROM edges WHERE source_id = ?1 OR target_id = ?1",
        };
        let rows = if let Some(kind) = kind {
            let sql = format!("{base} AND kind = ?2");
            let mut stmt = self.conn.prepare(&sql)?;
            stmt.query_map(params![symbol_id, kind.as_str()], row_to_edge)?
                .filter_map(|r| r.ok())
                .collect()
        } else {
            let mut stmt = self.conn.prepare(base)?;
            stmt.query_map(params![symbol_id], row_to_edge)?
                .filter_map(|r| r.ok())
                .collect()
        };
        Ok(rows)
    }

    fn upsert_edge(&mut self, edge: &Edge) -> Result<u64, PuiError> {
        self.conn.execute(
            "INSERT INTO edges (source_id, target_id, kind, confidence, provenance, origin_file, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                edge.source_id,
                edge.target_id,
                edge.kind.as_str(),
                edge.confidence,
                edge.provenance.as_str(),
                edge.origin_file,
                edge.metadata,
            ],
        )?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    fn delete_edges_by_source_file(&mut self, origin_file: &str) -> Result<(), PuiError> {
        self.conn.execute(
            "DELETE FROM edges WHERE origin_file = ?1",
            params![origin_file],
        )?;
        Ok(())
    }

    fn callsites_in_file(&self, path: &str) -> Result<Vec<Callsite>, PuiError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM callsites WHERE file_path = ?1 ORDER BY line")?;
        let rows = stmt
            .query_map(params![path], row_to_callsite)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn all_callsites(&self) -> Result<Vec<Callsite>, PuiError> {
        let mut stmt = self.conn.prepare("SELECT * FROM callsites")?;
        let rows = stmt
            .query_map([], row_to_callsite)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn file_count(&self) -> Result<usize, PuiError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn symbol_count(&self) -> Result<usize, PuiError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM symbols", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<FileRow> {
    let language_str: Option<String> = row.get("language")?;
    Ok(FileRow {
        path: row.get("path")?,
        language: language_str.and_then(|s| language_from_str(&s)),
        content_hash: row.get("content_hash")?,
        size: row.get("size")?,
        mtime: row.get("mtime")?,
        indexed_at: row.get("indexed_at")?,
    })
}

fn language_from_str(s: &str) -> Option<Language> {
    Some(match s {
        "python" => Language::Python,
        "javascript" => Language::Javascript,
        "typescript" => Language::Typescript,
        "go" => Language::Go,
        "rust" => Language::Rust,
        "c" => Language::C,
        "cpp" => Language::Cpp,
        _ => return None,
    })
}

/// FTS5 treats bare `.`/`-`/`:` specially; quote the query so symbol names
/// like `obj.method` or `my-module` are matched literally rather than
/// parsed as query syntax.
fn fts_escape(query: &str) -> String {
    format!("\"{}\"", query.replace('"', "\"\""))
}
