//! Extractor (spec §4.5 C5): lowers a parsed tree's named captures into
//! [`Symbol`]/[`Edge`]/[`Callsite`] rows with file-local temporary ids.
//!
//! Temp ids are assigned per file, starting at 1; the indexer remaps them to
//! real store ids during the replacement protocol (`sqlite_batch.rs`'s
//! `id_map`). This mirrors the teacher's two-phase extract-then-persist
//! split, generalized to populate a graph instead of a flat definition list.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use pui_core::types::{Callsite, Edge, EdgeKind, FileIndex, Language, Provenance, Symbol, SymbolKind};

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// One definition captured from the query, before nesting/qualification.
struct RawDef {
    temp_id: u64,
    kind: SymbolKind,
    name: String,
    params: String,
    return_type: String,
    line_start: u32,
    line_end: u32,
    col_start: u32,
    col_end: u32,
    byte_start: usize,
    byte_end: usize,
    base_name: Option<String>,
}

/// A raw call or import reference, to be turned into a [`Callsite`] plus
/// heuristic CALL/IMPORT edges once enclosing symbols are known.
struct RawCall {
    name: String,
    line: u32,
    col: u32,
    byte_start: usize,
}

struct RawImport {
    source: String,
}

/// Extract every symbol, structural edge, and callsite from `source`,
/// running `query` over `tree`'s root node.
pub fn extract_file(
    lang: Language,
    path: &Path,
    source: &[u8],
    tree: &tree_sitter::Tree,
    query: &Query,
) -> FileIndex {
    let file_path = path.to_string_lossy().to_string();
    let root = tree.root_node();

    let mut next_id = 1u64;
    let (defs, bases) = extract_defs(query, root, source, &mut next_id);
    let calls = extract_calls(query, root, source);
    let imports = extract_imports(query, root, source);

    let module_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.clone());
    let line_count = source.iter().filter(|&&b| b == b'\n').count() as u32 + 1;

    build_index(lang, &file_path, source, defs, bases, calls, imports, module_name, line_count)
}

fn extract_defs(
    query: &Query,
    root: Node<'_>,
    source: &[u8],
    next_id: &mut u64,
) -> (Vec<RawDef>, Vec<(u64, String)>) {
    let mut cursor = QueryCursor::new();
    let capture_names = query.capture_names();
    let mut matches = cursor.matches(query, root, source);
    let mut defs = Vec::new();
    let mut bases = Vec::new();

    while let Some(m) = matches.next() {
        let mut name = None;
        let mut kind = None;
        let mut params = String::new();
        let mut return_type = String::new();
        let mut base = None;
        let mut span: Option<Node<'_>> = None;

        for cap in m.captures {
            let cap_name = capture_names[cap.index as usize];
            match cap_name {
                "def.func.name" | "def.method.name" => {
                    name = Some(node_text(cap.node, source).to_string());
                    kind = Some(if cap_name == "def.method.name" {
                        SymbolKind::Method
                    } else {
                        SymbolKind::Function
                    });
                }
                "def.class.name" => {
                    name = Some(node_text(cap.node, source).to_string());
                    kind = Some(SymbolKind::Class);
                }
                "def.func.params" | "def.method.params" => {
                    params = node_text(cap.node, source).to_string();
                }
                "def.func.return_type" | "def.method.return_type" => {
                    return_type = node_text(cap.node, source).to_string();
                }
                "def.func" | "def.method" | "def.class" => {
                    span = Some(cap.node);
                }
                "def.class.base" => {
                    base = Some(node_text(cap.node, source).to_string());
                }
                _ => {}
            }
        }

        if let (Some(n), Some(k), Some(span_node)) = (name, kind, span) {
            let id = *next_id;
            *next_id += 1;
            if let Some(b) = base {
                bases.push((id, b));
            }
            defs.push(RawDef {
                temp_id: id,
                kind: k,
                name: n,
                params,
                return_type,
                line_start: span_node.start_position().row as u32 + 1,
                line_end: span_node.end_position().row as u32 + 1,
                col_start: span_node.start_position().column as u32,
                col_end: span_node.end_position().column as u32,
                byte_start: span_node.start_byte(),
                byte_end: span_node.end_byte(),
                base_name: None,
            });
        }
    }
    (defs, bases)
}

fn extract_calls(query: &Query, root: Node<'_>, source: &[u8]) -> Vec<RawCall> {
    let mut cursor = QueryCursor::new();
    let capture_names = query.capture_names();
    let mut matches = cursor.matches(query, root, source);
    let mut calls = Vec::new();

    while let Some(m) = matches.next() {
        let mut name = None;
        let mut receiver = None;
        let mut span: Option<Node<'_>> = None;

        for cap in m.captures {
            match capture_names[cap.index as usize] {
                "ref.call.name" => name = Some(node_text(cap.node, source).to_string()),
                "ref.call.receiver" => receiver = Some(node_text(cap.node, source).to_string()),
                "ref.call" => span = Some(cap.node),
                _ => {}
            }
        }

        if let (Some(n), Some(span_node)) = (name, span) {
            let callee_text = match &receiver {
                Some(r) if !r.is_empty() => format!("{r}.{n}"),
                _ => n,
            };
            calls.push(RawCall {
                name: callee_text,
                line: span_node.start_position().row as u32 + 1,
                col: span_node.start_position().column as u32,
                byte_start: span_node.start_byte(),
            });
        }
    }
    calls
}

fn extract_imports(query: &Query, root: Node<'_>, source: &[u8]) -> Vec<RawImport> {
    let mut cursor = QueryCursor::new();
    let capture_names = query.capture_names();
    let mut matches = cursor.matches(query, root, source);
    let mut imports = Vec::new();

    while let Some(m) = matches.next() {
        let mut source_path = None;
        for cap in m.captures {
            if capture_names[cap.index as usize] == "ref.import.source" {
                let raw = node_text(cap.node, source);
                source_path = Some(raw.trim_matches('"').trim_matches('\'').to_string());
            }
        }
        if let Some(src) = source_path {
            imports.push(RawImport { source: src });
        }
    }
    imports
}

/// Find the leading comment/docstring immediately preceding a definition's
/// span, by walking back over the def's preceding siblings in source text.
/// Heuristic, not grammar-aware: looks at the raw bytes on the line(s)
/// directly above `byte_start`.
fn leading_docstring(source: &[u8], byte_start: usize) -> Option<String> {
    let text = std::str::from_utf8(&source[..byte_start]).ok()?;
    let mut lines: Vec<&str> = text.lines().collect();
    lines.pop(); // drop the partial line the def itself starts on
    let mut doc_lines = Vec::new();
    while let Some(line) = lines.pop() {
        let trimmed = line.trim();
        if trimmed.starts_with("///") || trimmed.starts_with("//!") {
            doc_lines.push(trimmed.trim_start_matches("///").trim_start_matches("//!").trim().to_string());
        } else if trimmed.starts_with("//") {
            doc_lines.push(trimmed.trim_start_matches("//").trim().to_string());
        } else if trimmed.starts_with('#') && trimmed.contains('"') {
            // python decorator lines don't count as docs; stop
            break;
        } else if trimmed.is_empty() {
            if doc_lines.is_empty() {
                continue;
            }
            break;
        } else {
            break;
        }
    }
    if doc_lines.is_empty() {
        return None;
    }
    doc_lines.reverse();
    Some(doc_lines.join("\n"))
}

#[allow(clippy::too_many_arguments)]
fn build_index(
    lang: Language,
    file_path: &str,
    source: &[u8],
    mut defs: Vec<RawDef>,
    bases: Vec<(u64, String)>,
    calls: Vec<RawCall>,
    imports: Vec<RawImport>,
    module_name: String,
    line_count: u32,
) -> FileIndex {
    defs.sort_by_key(|d| (d.byte_start, std::cmp::Reverse(d.byte_end)));

    let module_id = 0u64;
    let mut symbols = Vec::with_capacity(defs.len() + 1);
    let mut edges = Vec::new();

    symbols.push(Symbol {
        id: module_id,
        stable_id: pui_core::hash::stable_symbol_id(file_path, SymbolKind::Module.as_str(), &module_name, 1),
        file_path: file_path.to_string(),
        kind: SymbolKind::Module,
        name: module_name.clone(),
        qualified_name: module_name.clone(),
        line_start: 1,
        line_end: line_count,
        col_start: 0,
        col_end: 0,
        signature: String::new(),
        docstring: None,
        parent_id: None,
    });

    // Nesting stack of (temp_id, byte_end, qualified_name) -- innermost last.
    let mut stack: Vec<(u64, usize, String)> = vec![(module_id, usize::MAX, module_name.clone())];

    for def in &defs {
        while stack.len() > 1 && stack.last().unwrap().1 < def.byte_start {
            stack.pop();
        }
        let (parent_id, _, parent_qual) = stack.last().unwrap().clone();
        let qualified_name = if parent_qual.is_empty() || parent_id == module_id {
            format!("{module_name}.{}", def.name)
        } else {
            format!("{parent_qual}.{}", def.name)
        };

        let signature = if def.return_type.is_empty() {
            format!("{}{}", def.name, def.params)
        } else {
            format!("{}{} -> {}", def.name, def.params, def.return_type)
        };

        let stable_id = pui_core::hash::stable_symbol_id(
            file_path,
            def.kind.as_str(),
            &qualified_name,
            def.line_start,
        );

        symbols.push(Symbol {
            id: def.temp_id,
            stable_id,
            file_path: file_path.to_string(),
            kind: def.kind,
            name: def.name.clone(),
            qualified_name: qualified_name.clone(),
            line_start: def.line_start,
            line_end: def.line_end,
            col_start: def.col_start,
            col_end: def.col_end,
            signature,
            docstring: leading_docstring(source, def.byte_start),
            parent_id: Some(parent_id),
        });

        edges.push(Edge {
            id: 0,
            source_id: parent_id,
            target_id: def.temp_id,
            kind: EdgeKind::Contain,
            confidence: 1.0,
            provenance: Provenance::Resolved,
            origin_file: file_path.to_string(),
            metadata: None,
        });

        stack.push((def.temp_id, def.byte_end, qualified_name));
    }

    // INHERIT edges: base name resolved against same-file symbols only here;
    // cross-file resolution happens in the resolver (spec §4.7).
    for (child_id, base_name) in &bases {
        if let Some(target) = symbols.iter().find(|s| &s.name == base_name) {
            edges.push(Edge {
                id: 0,
                source_id: *child_id,
                target_id: target.id,
                kind: EdgeKind::Inherit,
                confidence: 0.95,
                provenance: Provenance::Heuristic,
                origin_file: file_path.to_string(),
                metadata: Some(format!("same-file base class match: {base_name}")),
            });
        }
    }

    // Callsites: attach to the innermost def whose span contains the call.
    let mut callsites = Vec::with_capacity(calls.len());
    let mut next_callsite_id = 1u64;
    for call in &calls {
        let enclosing = defs
            .iter()
            .filter(|d| d.byte_start <= call.byte_start && call.byte_start < d.byte_end)
            .min_by_key(|d| d.byte_end - d.byte_start)
            .map(|d| d.temp_id)
            .unwrap_or(module_id);

        callsites.push(Callsite {
            id: next_callsite_id,
            file_path: file_path.to_string(),
            line: call.line,
            col: call.col,
            callee_text: call.name.clone(),
            enclosing_symbol_id: enclosing,
            imports_in_scope: imports.iter().map(|i| i.source.clone()).collect(),
        });
        next_callsite_id += 1;
    }

    // Imports have no resolvable target yet (the indexer hasn't seen the
    // rest of the repo), so they're kept as raw strings rather than edges
    // with a made-up target id -- the cross-file resolver in pui-index
    // turns the relative ones that land on a known file into IMPORT edges
    // and the rest into ModuleDependsOn edges, silently dropping anything
    // that resolves to neither instead of persisting a dangling edge.
    let raw_imports = imports.iter().map(|imp| imp.source.clone()).collect();

    let _ = lang;
    FileIndex { symbols, edges, callsites, raw_imports }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{grammar_for, TreeSitterParser};
    use crate::queries::query_for_language;

    fn parse_and_extract(lang: Language, src: &str) -> FileIndex {
        let grammar = grammar_for(lang);
        let query = query_for_language(&grammar, lang).unwrap();
        let mut parser = TreeSitterParser::new();
        let tree = parser.parse(lang, src.as_bytes()).unwrap();
        extract_file(lang, Path::new("mod.py"), src.as_bytes(), &tree, &query)
    }

    #[test]
    fn test_extract_python_function() {
        let idx = parse_and_extract(Language::Python, "def foo(x):\n    return x\n");
        let func = idx.symbols.iter().find(|s| s.name == "foo").unwrap();
        assert_eq!(func.kind, SymbolKind::Function);
        assert_eq!(func.qualified_name, "mod.foo");
    }

    #[test]
    fn test_extract_nested_method_qualified_name() {
        let src = "class Foo:\n    def bar(self):\n        pass\n";
        let idx = parse_and_extract(Language::Python, src);
        let method = idx.symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(method.qualified_name, "mod.Foo.bar");
        let contain = idx
            .edges
            .iter()
            .find(|e| e.kind == EdgeKind::Contain && e.target_id == method.id)
            .unwrap();
        let class = idx.symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert_eq!(contain.source_id, class.id);
    }

    #[test]
    fn test_extract_docstring_comment() {
        let rust_src = "/// explains foo\nfn foo() {}\n";
        let idx = parse_and_extract(Language::Rust, rust_src);
        let func = idx.symbols.iter().find(|s| s.name == "foo").unwrap();
        assert_eq!(func.docstring.as_deref(), Some("explains foo"));
    }

    #[test]
    fn test_extract_call_attaches_to_enclosing_function() {
        let src = "def foo():\n    bar()\n";
        let idx = parse_and_extract(Language::Python, src);
        let foo = idx.symbols.iter().find(|s| s.name == "foo").unwrap();
        let call = idx.callsites.iter().find(|c| c.callee_text == "bar").unwrap();
        assert_eq!(call.enclosing_symbol_id, foo.id);
    }

    #[test]
    fn test_extract_import_is_raw_not_an_edge() {
        let src = "import { helper } from './util';\n";
        let idx = parse_and_extract(Language::Javascript, src);

        assert_eq!(idx.raw_imports, vec!["./util".to_string()]);
        assert!(
            !idx.edges.iter().any(|e| e.kind == EdgeKind::Import),
            "unresolved imports must never be persisted as edges (no target to point at yet)"
        );
    }
}
