//! The `Store` trait — the persistence contract every other crate consumes.
//!
//! FROZEN CONTRACT. The parser/indexer, graph, and output crates all
//! depend on this interface; changing its shape ripples through the whole
//! workspace, so treat additions as the default and signature changes as
//! something to avoid.

use crate::error::PuiError;
use crate::types::{Callsite, Edge, EdgeDirection, EdgeKind, FileIndex, FileRow, Symbol};

pub trait Store {
    /// Schema version currently on disk.
    fn schema_version(&self) -> Result<u32, PuiError>;

    fn get_meta(&self, key: &str) -> Result<Option<String>, PuiError>;
    fn set_meta(&self, key: &str, value: &str) -> Result<(), PuiError>;

    fn get_file(&self, path: &str) -> Result<Option<FileRow>, PuiError>;
    fn all_files(&self) -> Result<Vec<FileRow>, PuiError>;
    /// Cascades to that file's symbols, edges, and callsites.
    fn delete_file(&mut self, path: &str) -> Result<(), PuiError>;
    /// Update only `indexed_at` for a file whose content hash is unchanged.
    fn touch_file(&mut self, path: &str, indexed_at: i64) -> Result<(), PuiError>;

    /// Atomic per-file replacement protocol (spec §4.6): delete this file's
    /// symbols/edges/callsites, upsert the file row, insert the new rows —
    /// all in one transaction, so readers never observe a partial state.
    fn replace_file(&mut self, file: &FileRow, index: &FileIndex) -> Result<(), PuiError>;

    fn get_symbol(&self, id: u64) -> Result<Option<Symbol>, PuiError>;
    fn get_symbol_by_stable_id(&self, stable_id: &str) -> Result<Option<Symbol>, PuiError>;
    fn symbols_in_file(&self, path: &str) -> Result<Vec<Symbol>, PuiError>;
    fn find_symbols_by_name(&self, name: &str) -> Result<Vec<Symbol>, PuiError>;
    /// Full-text search over name and qualified_name (spec §4.6 FTS table).
    fn search_symbols_fts(&self, query: &str, limit: usize) -> Result<Vec<Symbol>, PuiError>;

    fn edges(
        &self,
        symbol_id: u64,
        direction: EdgeDirection,
        kind: Option<EdgeKind>,
    ) -> Result<Vec<Edge>, PuiError>;

    /// Insert or replace a single edge outside the per-file replacement
    /// protocol — used by the Resolver for cross-file CALL/MODULE_DEPENDS_ON
    /// edges, which aren't owned by any one file's replacement transaction.
    fn upsert_edge(&mut self, edge: &Edge) -> Result<u64, PuiError>;
    fn delete_edges_by_source_file(&mut self, origin_file: &str) -> Result<(), PuiError>;

    fn callsites_in_file(&self, path: &str) -> Result<Vec<Callsite>, PuiError>;
    fn all_callsites(&self) -> Result<Vec<Callsite>, PuiError>;

    fn file_count(&self) -> Result<usize, PuiError>;
    fn symbol_count(&self) -> Result<usize, PuiError>;
}
