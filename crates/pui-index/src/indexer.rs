//! Indexing orchestration (spec §4.8 C8).
//!
//! Operation modes: `full` re-parses every discovered file; `incremental`
//! skips files whose content hash is unchanged and deletes store rows for
//! files that vanished from disk; `stats_only` runs discovery and hashing
//! only, never opening a write transaction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use pui_core::config::PuiConfig;
use pui_core::error::PuiError;
use pui_core::lock;
use pui_core::store::Store;
use pui_parsers::monorepo::{detect_monorepo, MonorepoLayout};
use pui_parsers::resolver::{resolve_calls, resolve_imports, resolve_module_dependencies, NoSemanticProvider};
use pui_parsers::walker::FileWalker;

use crate::pipeline::parse_entries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Full,
    Incremental,
    StatsOnly,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexStats {
    pub files_discovered: usize,
    pub files_changed: usize,
    pub files_unchanged: usize,
    pub files_deleted: usize,
    pub files_skipped_oversized: usize,
    pub symbols_estimated: usize,
}

pub struct Indexer {
    root: PathBuf,
    config: PuiConfig,
}

impl Indexer {
    pub fn new(root: PathBuf, config: PuiConfig) -> Self {
        Self { root, config }
    }

    /// Run the indexer against `store` in `mode`. `cancel` is polled between
    /// files; on cancellation, whatever file-transactions already completed
    /// stay committed and the caller gets `PuiError::Cancelled`.
    pub fn run(&self, store: &mut dyn Store, mode: IndexMode, cancel: &AtomicBool) -> Result<IndexStats, PuiError> {
        let pui_dir = self.root.join(".pui");
        let layout = detect_monorepo(&self.root);
        let walker = FileWalker::new(
            &self.root,
            self.config.index.exclude_dirs.clone(),
            self.config.parsing.language_overrides.clone(),
            self.config.index.max_file_size,
        );
        let (entries, skipped) = walker.walk_with_packages(&layout);

        let mut stats = IndexStats {
            files_discovered: entries.len(),
            files_skipped_oversized: skipped.len(),
            ..Default::default()
        };

        let existing_paths: std::collections::HashSet<String> =
            store.all_files()?.into_iter().map(|f| f.path).collect();
        let discovered_paths: std::collections::HashSet<String> = entries
            .iter()
            .filter_map(|e| pui_core::paths::normalize_in_root(&self.root, &e.path).ok())
            .collect();

        let to_parse: Vec<_> = if mode == IndexMode::Incremental {
            let mut filtered = Vec::new();
            for entry in entries {
                let Ok(rel) = pui_core::paths::normalize_in_root(&self.root, &entry.path) else { continue };
                let on_disk_hash = std::fs::read(&entry.path).ok().map(|b| pui_core::hash::sha256_hex(&b));
                let unchanged = store
                    .get_file(&rel)?
                    .map(|existing| Some(existing.content_hash) == on_disk_hash)
                    .unwrap_or(false);
                if unchanged {
                    stats.files_unchanged += 1;
                } else {
                    stats.files_changed += 1;
                    filtered.push(entry);
                }
            }
            filtered
        } else {
            stats.files_changed = entries.len();
            entries
        };

        if mode == IndexMode::StatsOnly {
            stats.symbols_estimated = to_parse.len() * 8; // rough per-file heuristic
            return Ok(stats);
        }

        let lock = lock::acquire(&pui_dir, false);
        if lock.is_none() {
            return Err(PuiError::Internal("could not acquire writer lock".to_string()));
        }

        let deleted: Vec<String> = existing_paths.difference(&discovered_paths).cloned().collect();
        for path in &deleted {
            store.delete_file(path)?;
        }
        stats.files_deleted = deleted.len();

        let parsed = parse_entries(&self.root, &to_parse, self.config.index.workers);

        let mut file_to_module: HashMap<String, u64> = HashMap::new();
        let mut file_package: HashMap<String, String> = HashMap::new();
        let mut import_edges: Vec<(String, String)> = Vec::new();

        for (i, entry) in to_parse.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return Err(PuiError::Cancelled);
            }
            let Some(result) = parsed.get(i) else { continue };
            store.replace_file(&result.file, &result.index)?;
            stats.symbols_estimated += result.index.symbols.len();

            if let Some(module_sym) = store.symbols_in_file(&result.file.path)?.into_iter().find(|s| {
                s.parent_id.is_none() && s.kind == pui_core::types::SymbolKind::Module
            }) {
                file_to_module.insert(result.file.path.clone(), module_sym.id);
            }
            if let Some(pkg) = &entry.package {
                file_package.insert(result.file.path.clone(), pkg.clone());
            }
            for raw_import in &result.index.raw_imports {
                import_edges.push((result.file.path.clone(), raw_import.clone()));
            }
        }

        self.resolve_cross_file(store, &layout, &file_to_module, &file_package, &import_edges)?;

        Ok(stats)
    }

    fn resolve_cross_file(
        &self,
        store: &mut dyn Store,
        layout: &MonorepoLayout,
        file_to_module: &HashMap<String, u64>,
        file_package: &HashMap<String, String>,
        import_edges: &[(String, String)],
    ) -> Result<(), PuiError> {
        let all_symbols = {
            let mut symbols = Vec::new();
            for file in store.all_files()? {
                symbols.extend(store.symbols_in_file(&file.path)?);
            }
            symbols
        };
        let all_callsites = store.all_callsites()?;

        let call_edges = resolve_calls(&all_symbols, &all_callsites, &NoSemanticProvider);
        for edge in &call_edges {
            store.upsert_edge(edge)?;
        }

        let resolved_imports = resolve_imports(file_to_module, import_edges);
        for edge in &resolved_imports {
            store.upsert_edge(edge)?;
        }

        let module_edges = resolve_module_dependencies(layout, file_to_module, file_package, import_edges);
        for edge in &module_edges {
            store.upsert_edge(edge)?;
        }

        Ok(())
    }
}
