//! The per-file replacement write path (spec §4.6 "File replacement protocol").
//!
//! Kept apart from the read-side trait impl in [`crate::sqlite_queries`]
//! because it's the one place that has to reason about remapping the
//! extractor's file-local temporary symbol ids onto real row ids inside a
//! single transaction.

use std::collections::HashMap;

use rusqlite::params;

use crate::error::PuiError;
use crate::sqlite::SqliteStore;
use crate::types::{Edge, FileIndex, FileRow};

impl SqliteStore {
    /// Delete this file's symbols/callsites/edges, upsert its File row, then
    /// insert the new symbols, structural edges, and callsites — all inside
    /// one transaction, so no reader ever observes a half-replaced file.
    pub(crate) fn write_file_index(
        &mut self,
        file: &FileRow,
        index: &FileIndex,
    ) -> Result<(), PuiError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM edges WHERE origin_file = ?1",
            params![file.path],
        )?;
        tx.execute(
            "DELETE FROM callsites WHERE file_path = ?1",
            params![file.path],
        )?;
        tx.execute(
            "DELETE FROM symbols WHERE file_path = ?1",
            params![file.path],
        )?;

        tx.execute(
            "INSERT INTO files (path, language, content_hash, size, mtime, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(path) DO UPDATE SET
                language = excluded.language,
                content_hash = excluded.content_hash,
                size = excluded.size,
                mtime = excluded.mtime,
                indexed_at = excluded.indexed_at",
            params![
                file.path,
                file.language.map(|l| l.as_str()),
                file.content_hash,
                file.size,
                file.mtime,
                file.indexed_at,
            ],
        )?;

        // Extraction assigns symbols file-local temporary ids (their index
        // position); remap those to the real rowids SQLite assigns here so
        // edges/callsites that reference a symbol by its temp id still
        // resolve correctly once everything is committed.
        let mut id_map: HashMap<u64, i64> = HashMap::new();
        for symbol in &index.symbols {
            let parent_real_id = symbol.parent_id.and_then(|tmp| id_map.get(&tmp).copied());
            tx.execute(
                "INSERT INTO symbols
                    (stable_id, file_path, kind, name, qualified_name,
                     line_start, line_end, col_start, col_end, signature,
                     docstring, parent_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    symbol.stable_id,
                    symbol.file_path,
                    symbol.kind.as_str(),
                    symbol.name,
                    symbol.qualified_name,
                    symbol.line_start,
                    symbol.line_end,
                    symbol.col_start,
                    symbol.col_end,
                    symbol.signature,
                    symbol.docstring,
                    parent_real_id,
                ],
            )?;
            let real_id = tx.last_insert_rowid();
            id_map.insert(symbol.id, real_id);
        }

        for edge in &index.edges {
            insert_edge_remapped(&tx, edge, &id_map, &file.path)?;
        }

        for callsite in &index.callsites {
            let enclosing_real_id = id_map
                .get(&callsite.enclosing_symbol_id)
                .copied()
                .unwrap_or(callsite.enclosing_symbol_id as i64);
            let imports_json = serde_json::to_string(&callsite.imports_in_scope)
                .unwrap_or_else(|_| "[]".to_string());
            tx.execute(
                "INSERT INTO callsites
                    (file_path, line, col, callee_text, enclosing_symbol_id, imports_in_scope)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    callsite.file_path,
                    callsite.line,
                    callsite.col,
                    callsite.callee_text,
                    enclosing_real_id,
                    imports_json,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn insert_edge_remapped(
    tx: &rusqlite::Transaction,
    edge: &Edge,
    id_map: &HashMap<u64, i64>,
    origin_file: &str,
) -> Result<(), PuiError> {
    let source_real = id_map.get(&edge.source_id).copied().unwrap_or(edge.source_id as i64);
    let target_real = id_map.get(&edge.target_id).copied().unwrap_or(edge.target_id as i64);
    tx.execute(
        "INSERT INTO edges (source_id, target_id, kind, confidence, provenance, origin_file, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            source_real,
            target_real,
            edge.kind.as_str(),
            edge.confidence,
            edge.provenance.as_str(),
            origin_file,
            edge.metadata,
        ],
    )?;
    Ok(())
}
