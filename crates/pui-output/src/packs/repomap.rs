//! RepoMap pack (spec §4.11): Header, Summary, Directory, Module Deps,
//! Symbol Index, Key Relationships, Metadata. Default budget 8k tokens,
//! max 16k.

use std::collections::BTreeMap;

use pui_core::error::PuiError;
use pui_core::store::Store;
use pui_core::types::{EdgeDirection, EdgeKind, FileRow, Symbol, SymbolKind};
use pui_graph::traverse::traverse;

use crate::packs::{index_version, SCHEMA_VERSION};
use crate::token_budget::{estimate_tokens, truncate, Truncated};

pub const DEFAULT_BUDGET: usize = 8_000;
pub const MAX_BUDGET: usize = 16_000;

#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub path: String,
    pub file_count: usize,
    pub symbol_count: usize,
}

#[derive(Debug, Clone)]
pub struct ModuleDep {
    pub from: String,
    pub to: String,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct KeyRelationship {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct RepoMapPack {
    pub schema_version: u32,
    pub index_version: String,
    pub total_files: usize,
    pub total_symbols: usize,
    pub languages: Vec<String>,
    pub directories: Vec<DirectoryEntry>,
    pub module_deps: Vec<ModuleDep>,
    pub symbol_index: Vec<Symbol>,
    pub key_relationships: Vec<KeyRelationship>,
    pub focus: Option<String>,
}

impl RepoMapPack {
    /// Build a RepoMap from the store, optionally scoped to `focus` (a
    /// repo-relative file or directory path). `depth` bounds the
    /// traversal used to surface `key_relationships` around `focus`; with
    /// no focus, key relationships are left empty — the cross-repo
    /// edge-walk would otherwise be unbounded.
    pub fn build(store: &dyn Store, focus: Option<&str>, depth: u32) -> Result<Self, PuiError> {
        let all_files = store.all_files()?;
        let files: Vec<&FileRow> = match focus {
            Some(prefix) => all_files.iter().filter(|f| f.path.starts_with(prefix)).collect(),
            None => all_files.iter().collect(),
        };

        let mut languages: Vec<String> =
            files.iter().filter_map(|f| f.language.map(|l| l.as_str().to_string())).collect();
        languages.sort();
        languages.dedup();

        let mut directories: BTreeMap<String, DirectoryEntry> = BTreeMap::new();
        let mut total_symbols = 0usize;
        let mut module_deps = Vec::new();
        let mut symbol_index = Vec::new();

        for file in &files {
            let dir = file
                .path
                .rsplit_once('/')
                .map(|(d, _)| d.to_string())
                .unwrap_or_else(|| ".".to_string());
            let entry = directories.entry(dir).or_insert_with_key(|d| DirectoryEntry {
                path: d.clone(),
                file_count: 0,
                symbol_count: 0,
            });
            entry.file_count += 1;

            let symbols = store.symbols_in_file(&file.path)?;
            entry.symbol_count += symbols.len();
            total_symbols += symbols.len();

            if let Some(module_sym) = symbols.iter().find(|s| s.kind == SymbolKind::Module && s.parent_id.is_none()) {
                for edge in store.edges(module_sym.id, EdgeDirection::Outgoing, Some(EdgeKind::ModuleDependsOn))? {
                    if let Some(target) = store.get_symbol(edge.target_id)? {
                        module_deps.push(ModuleDep {
                            from: module_sym.file_path.clone(),
                            to: target.file_path,
                            confidence: edge.confidence,
                        });
                    }
                }
            }

            symbol_index.extend(symbols.into_iter().filter(|s| s.kind != SymbolKind::Module));
        }

        symbol_index.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        module_deps.sort_by(|a, b| a.from.cmp(&b.from).then(b.confidence.partial_cmp(&a.confidence).unwrap()));

        let key_relationships = match focus {
            Some(path) => {
                let seed = store.symbols_in_file(path)?.into_iter().find(|s| s.kind != SymbolKind::Module);
                match seed {
                    Some(seed) => {
                        let hops = traverse(store, seed.id, depth.max(1), EdgeDirection::Both, Some(EdgeKind::Call))?;
                        hops.into_iter()
                            .map(|h| KeyRelationship {
                                from: seed.qualified_name.clone(),
                                to: h.symbol.qualified_name,
                                kind: h.via_kind,
                                confidence: h.path_confidence,
                            })
                            .collect()
                    }
                    None => Vec::new(),
                }
            }
            None => Vec::new(),
        };

        Ok(RepoMapPack {
            schema_version: SCHEMA_VERSION,
            index_version: index_version(&all_files),
            total_files: files.len(),
            total_symbols,
            languages,
            directories: directories.into_values().collect(),
            module_deps,
            symbol_index,
            key_relationships,
            focus: focus.map(|s| s.to_string()),
        })
    }

    fn render_full_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# RepoMap\n");
        out.push_str(&format!("schema_version={} index_version={}\n", self.schema_version, self.index_version));
        if let Some(focus) = &self.focus {
            out.push_str(&format!("focus={focus}\n"));
        }

        out.push_str("## Summary\n");
        out.push_str(&format!(
            "files={} symbols={} languages={}\n",
            self.total_files,
            self.total_symbols,
            self.languages.join(",")
        ));

        out.push_str("## Directory\n");
        for d in &self.directories {
            out.push_str(&format!("| {} | {} | {} |\n", d.path, d.file_count, d.symbol_count));
        }

        out.push_str("## Module Deps\n");
        for m in &self.module_deps {
            out.push_str(&format!("| {} | {} | {:.2} |\n", m.from, m.to, m.confidence));
        }

        out.push_str("## Symbol Index\n");
        for s in &self.symbol_index {
            out.push_str(&format!("| {} | {} | {}:{} |\n", s.qualified_name, s.kind, s.file_path, s.line_start));
        }

        out.push_str("## Key Relationships\n");
        for r in &self.key_relationships {
            out.push_str(&format!("| {} | {} | {} | {:.2} |\n", r.from, r.kind, r.to, r.confidence));
        }

        out.push_str("## Metadata\n");
        out.push_str(&format!("schema_version={}\nindex_version={}\n", self.schema_version, self.index_version));

        out
    }

    pub fn render_markdown(&self, max_tokens: usize) -> Result<Truncated, PuiError> {
        truncate(&self.render_full_markdown(), max_tokens)
    }

    pub fn render_json(&self, max_tokens: usize) -> Result<Truncated, PuiError> {
        let value = serde_json::json!({
            "schema_version": self.schema_version,
            "type": "repomap",
            "metadata": { "index_version": self.index_version, "focus": self.focus },
            "summary": {
                "total_files": self.total_files,
                "total_symbols": self.total_symbols,
                "languages": self.languages,
            },
            "directory": self.directories.iter().map(|d| serde_json::json!({
                "path": d.path, "file_count": d.file_count, "symbol_count": d.symbol_count,
            })).collect::<Vec<_>>(),
            "module_deps": self.module_deps.iter().map(|m| serde_json::json!({
                "from": m.from, "to": m.to, "confidence": m.confidence,
            })).collect::<Vec<_>>(),
            "symbol_index": self.symbol_index.iter().map(|s| serde_json::json!({
                "qualified_name": s.qualified_name, "kind": s.kind.as_str(),
                "file": s.file_path, "line": s.line_start,
            })).collect::<Vec<_>>(),
            "key_relationships": self.key_relationships.iter().map(|r| serde_json::json!({
                "from": r.from, "to": r.to, "kind": r.kind.as_str(), "confidence": r.confidence,
            })).collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&value).map_err(|e| PuiError::Internal(e.to_string()))?;
        let tokens = estimate_tokens(&text);
        if tokens <= max_tokens {
            Ok(Truncated { text, truncated: false, dropped_count: 0 })
        } else {
            // The structured form is not line-truncated; oversized JSON
            // reports the overflow rather than emitting invalid JSON.
            Err(PuiError::BudgetTooSmall { needed: tokens, budget: max_tokens })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pui_core::sqlite::SqliteStore;
    use pui_core::types::{FileIndex, Language};

    fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::in_memory().unwrap();
        let file = FileRow {
            path: "src/a.py".to_string(),
            language: Some(Language::Python),
            content_hash: "h1".to_string(),
            size: 1,
            mtime: 0,
            indexed_at: 0,
        };
        let module = Symbol {
            id: 0,
            stable_id: "m1".to_string(),
            file_path: "src/a.py".to_string(),
            kind: SymbolKind::Module,
            name: "a".to_string(),
            qualified_name: "a".to_string(),
            line_start: 1,
            line_end: 1,
            col_start: 0,
            col_end: 0,
            signature: String::new(),
            docstring: None,
            parent_id: None,
        };
        let func = Symbol {
            id: 0,
            stable_id: "f1".to_string(),
            file_path: "src/a.py".to_string(),
            kind: SymbolKind::Function,
            name: "foo".to_string(),
            qualified_name: "a.foo".to_string(),
            line_start: 1,
            line_end: 2,
            col_start: 0,
            col_end: 0,
            signature: "foo()".to_string(),
            docstring: None,
            parent_id: None,
        };
        let index = FileIndex { symbols: vec![module, func], edges: vec![], callsites: vec![] };
        store.replace_file(&file, &index).unwrap();
        store
    }

    #[test]
    fn test_build_repomap_summarizes_repo() {
        let store = seeded_store();
        let pack = RepoMapPack::build(&store, None, 2).unwrap();
        assert_eq!(pack.total_files, 1);
        assert_eq!(pack.total_symbols, 2);
        assert_eq!(pack.languages, vec!["python".to_string()]);
    }

    #[test]
    fn test_render_markdown_contains_sections() {
        let store = seeded_store();
        let pack = RepoMapPack::build(&store, None, 2).unwrap();
        let rendered = pack.render_markdown(DEFAULT_BUDGET).unwrap();
        assert!(rendered.text.contains("## Directory"));
        assert!(rendered.text.contains("## Symbol Index"));
        assert!(!rendered.truncated);
    }
}
