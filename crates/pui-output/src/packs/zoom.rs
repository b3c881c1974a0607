//! Zoom pack (spec §4.11): Header, Signature, Docs, Skeleton, Callers,
//! Callees, Code Slice, Related, Metadata. Default budget 4k tokens, max 8k.

use std::path::Path;

use pui_core::error::PuiError;
use pui_core::paths::normalize_in_root;
use pui_core::store::Store;
use pui_core::types::{EdgeDirection, EdgeKind, Symbol};
use pui_graph::traverse::{traverse, TraversalHop};

use crate::packs::{index_version, SCHEMA_VERSION};
use crate::token_budget::{estimate_tokens, truncate, Truncated};

pub const DEFAULT_BUDGET: usize = 4_000;
pub const MAX_BUDGET: usize = 8_000;

/// A `zoom` target as accepted on the command line: a numeric symbol id,
/// a (possibly ambiguous) name, or a `path:line` pair.
pub enum ZoomTarget<'a> {
    SymbolId(u64),
    Name(&'a str),
    PathLine(&'a str, u32),
}

#[derive(Debug, Clone)]
pub struct ZoomPack {
    pub schema_version: u32,
    pub index_version: String,
    pub symbol: Option<Symbol>,
    pub skeleton: String,
    pub code_slice: String,
    pub callers: Vec<TraversalHop>,
    pub callees: Vec<TraversalHop>,
    pub related: Vec<Symbol>,
    /// Populated instead of `symbol` when the target could not be resolved
    /// (spec §7 `SymbolNotFound`: "structured empty result with suggestion
    /// list from FTS").
    pub suggestions: Vec<Symbol>,
}

impl ZoomPack {
    pub fn build(store: &dyn Store, root: &Path, target: ZoomTarget, max_depth: u32) -> Result<Self, PuiError> {
        let all_files = store.all_files()?;
        let version = index_version(&all_files);

        let resolved = Self::resolve_target(store, root, &target)?;
        let Some(symbol) = resolved else {
            let query = match target {
                ZoomTarget::Name(n) => n,
                _ => "",
            };
            let suggestions = store.search_symbols_fts(query, 5)?;
            return Ok(ZoomPack {
                schema_version: SCHEMA_VERSION,
                index_version: version,
                symbol: None,
                skeleton: String::new(),
                code_slice: String::new(),
                callers: Vec::new(),
                callees: Vec::new(),
                related: Vec::new(),
                suggestions,
            });
        };

        let callers = traverse(store, symbol.id, max_depth, EdgeDirection::Incoming, Some(EdgeKind::Call))?;
        let callees = traverse(store, symbol.id, max_depth, EdgeDirection::Outgoing, Some(EdgeKind::Call))?;
        let related = store
            .symbols_in_file(&symbol.file_path)?
            .into_iter()
            .filter(|s| s.id != symbol.id)
            .collect();

        let code_slice = read_line_range(root, &symbol.file_path, symbol.line_start, symbol.line_end).unwrap_or_default();
        let skeleton = skeletonize(&code_slice, &symbol.signature, symbol.docstring.as_deref());

        Ok(ZoomPack {
            schema_version: SCHEMA_VERSION,
            index_version: version,
            symbol: Some(symbol),
            skeleton,
            code_slice,
            callers,
            callees,
            related,
            suggestions: Vec::new(),
        })
    }

    fn resolve_target(store: &dyn Store, root: &Path, target: &ZoomTarget) -> Result<Option<Symbol>, PuiError> {
        match target {
            ZoomTarget::SymbolId(id) => store.get_symbol(*id),
            ZoomTarget::Name(name) => Ok(store.find_symbols_by_name(name).ok().and_then(|mut v| {
                v.sort_by_key(|s| s.id);
                v.into_iter().next()
            })),
            ZoomTarget::PathLine(path, line) => {
                let rel = normalize_in_root(root, Path::new(path))?;
                let symbols = store.symbols_in_file(&rel)?;
                Ok(symbols.into_iter().find(|s| s.line_start <= *line && *line <= s.line_end))
            }
        }
    }

    fn render_full_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Zoom\n");
        out.push_str(&format!("schema_version={} index_version={}\n", self.schema_version, self.index_version));

        let Some(symbol) = &self.symbol else {
            out.push_str("## Suggestions\n");
            for s in &self.suggestions {
                out.push_str(&format!("| {} | {} |\n", s.qualified_name, s.file_path));
            }
            out.push_str("## Metadata\nresult=not_found\n");
            return out;
        };

        out.push_str(&format!("## Signature\n{}\n", symbol.signature));
        out.push_str("## Docs\n");
        out.push_str(symbol.docstring.as_deref().unwrap_or("(none)"));
        out.push('\n');

        out.push_str("## Skeleton\n```\n");
        out.push_str(&self.skeleton);
        out.push_str("\n```\n");

        out.push_str("## Callers\n");
        for hop in &self.callers {
            out.push_str(&format!(
                "| {} | {}:{} | depth={} conf={:.2} |\n",
                hop.symbol.qualified_name, hop.symbol.file_path, hop.symbol.line_start, hop.depth, hop.path_confidence
            ));
        }

        out.push_str("## Callees\n");
        for hop in &self.callees {
            out.push_str(&format!(
                "| {} | {}:{} | depth={} conf={:.2} |\n",
                hop.symbol.qualified_name, hop.symbol.file_path, hop.symbol.line_start, hop.depth, hop.path_confidence
            ));
        }

        out.push_str("## Code Slice\n```\n");
        out.push_str(&self.code_slice);
        out.push_str("\n```\n");

        out.push_str("## Related\n");
        for r in &self.related {
            out.push_str(&format!("| {} | {} |\n", r.qualified_name, r.kind));
        }

        out.push_str("## Metadata\n");
        out.push_str(&format!(
            "file={} line_start={} line_end={}\n",
            symbol.file_path, symbol.line_start, symbol.line_end
        ));

        out
    }

    pub fn render_markdown(&self, max_tokens: usize) -> Result<Truncated, PuiError> {
        truncate(&self.render_full_markdown(), max_tokens)
    }

    pub fn render_json(&self, max_tokens: usize) -> Result<Truncated, PuiError> {
        let value = match &self.symbol {
            None => serde_json::json!({
                "schema_version": self.schema_version,
                "type": "zoom",
                "metadata": { "index_version": self.index_version, "result": "not_found" },
                "suggestions": self.suggestions.iter().map(|s| s.qualified_name.clone()).collect::<Vec<_>>(),
            }),
            Some(symbol) => serde_json::json!({
                "schema_version": self.schema_version,
                "type": "zoom",
                "metadata": {
                    "index_version": self.index_version,
                    "file": symbol.file_path,
                    "line_start": symbol.line_start,
                    "line_end": symbol.line_end,
                },
                "signature": symbol.signature,
                "docs": symbol.docstring,
                "skeleton": self.skeleton,
                "callers": self.callers.iter().map(|h| serde_json::json!({
                    "name": h.symbol.qualified_name, "file": h.symbol.file_path,
                    "depth": h.depth, "confidence": h.path_confidence,
                })).collect::<Vec<_>>(),
                "callees": self.callees.iter().map(|h| serde_json::json!({
                    "name": h.symbol.qualified_name, "file": h.symbol.file_path,
                    "depth": h.depth, "confidence": h.path_confidence,
                })).collect::<Vec<_>>(),
                "code_slice": self.code_slice,
                "related": self.related.iter().map(|s| s.qualified_name.clone()).collect::<Vec<_>>(),
            }),
        };
        let text = serde_json::to_string_pretty(&value).map_err(|e| PuiError::Internal(e.to_string()))?;
        let tokens = estimate_tokens(&text);
        if tokens <= max_tokens {
            Ok(Truncated { text, truncated: false, dropped_count: 0 })
        } else {
            Err(PuiError::BudgetTooSmall { needed: tokens, budget: max_tokens })
        }
    }
}

/// Read `[line_start, line_end]` (1-indexed, inclusive) out of a repo file.
fn read_line_range(root: &Path, rel_path: &str, line_start: u32, line_end: u32) -> Option<String> {
    let content = std::fs::read_to_string(root.join(rel_path)).ok()?;
    let start = line_start.saturating_sub(1) as usize;
    let end = line_end as usize;
    Some(content.lines().skip(start).take(end.saturating_sub(start)).collect::<Vec<_>>().join("\n"))
}

/// Collapse a code slice down to signature/doc lines plus lines containing
/// calls, returns, raises/throws, and top-level branches; everything else
/// becomes a single placeholder line (spec §4.11 "Skeletonization").
fn skeletonize(code: &str, signature: &str, docstring: Option<&str>) -> String {
    let mut out = Vec::new();
    if !signature.is_empty() {
        out.push(signature.to_string());
    }
    if let Some(doc) = docstring {
        out.push(format!("# {doc}"));
    }

    let is_significant = |line: &str| {
        let t = line.trim_start();
        t.contains('(')
            || t.starts_with("return")
            || t.starts_with("raise")
            || t.starts_with("throw")
            || t.starts_with("if ")
            || t.starts_with("for ")
            || t.starts_with("while ")
            || t.starts_with("match ")
    };

    let mut collapsed = false;
    for line in code.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if is_significant(line) {
            out.push(line.to_string());
            collapsed = false;
        } else if !collapsed {
            out.push("    ...".to_string());
            collapsed = true;
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeletonize_keeps_signature_and_calls() {
        let code = "def foo():\n    x = 1\n    y = 2\n    return bar(x, y)\n";
        let skeleton = skeletonize(code, "foo()", Some("does a thing"));
        assert!(skeleton.contains("foo()"));
        assert!(skeleton.contains("does a thing"));
        assert!(skeleton.contains("return bar(x, y)"));
        assert!(skeleton.contains("..."));
    }

    #[test]
    fn test_skeletonize_collapses_consecutive_plain_lines_once() {
        let code = "a = 1\nb = 2\nc = 3\n";
        let skeleton = skeletonize(code, "", None);
        assert_eq!(skeleton.matches("...").count(), 1);
    }
}
