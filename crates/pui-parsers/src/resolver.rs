//! Confidence-banded heuristic call/import resolution (spec §4.7 C7).
//!
//! Structural edges (CONTAIN, same-file INHERIT) are emitted at per-file
//! extraction time (`extract.rs`), where everything needed is already in
//! scope. CALL and cross-file IMPORT/MODULE_DEPENDS_ON edges need the whole
//! repo's symbol table, so they're resolved in a second pass over the full
//! store contents.
//!
//! ---------------------------------------------------------------------
//! FROZEN CONTRACT -- the five confidence bands below are a stable surface.
//! Downstream ranking (pui-graph's impact scoring) depends on these exact
//! cutoffs; don't renumber them without updating both sides.
//! ---------------------------------------------------------------------

use std::collections::HashMap;
use std::path::Path;

use pui_core::paths::normalize_in_root;
use pui_core::types::{Callsite, Edge, EdgeKind, Provenance, Symbol, SymbolKind};

use crate::monorepo::MonorepoLayout;

/// Extensions tried, in order, when resolving a relative import (`./foo`,
/// `../bar`) against the repo's known file paths: as a bare file, then with
/// each extension appended, then as a package directory's index/__init__.
const IMPORT_RESOLUTION_EXTS: &[&str] =
    &["py", "rs", "ts", "tsx", "js", "jsx", "go", "java", "rb", "c", "h", "cpp", "hpp"];

/// Confidence bands (spec §4.7), highest to lowest.
pub mod confidence {
    pub const SEMANTIC: f64 = 1.00;
    pub const QUALIFIED_CALL: f64 = 0.92;
    pub const SINGLE_CANDIDATE: f64 = 0.80;
    pub const MULTI_DISAMBIGUATED: f64 = 0.55;
    pub const DYNAMIC_OR_HIGHER_ORDER: f64 = 0.25;
}

/// Hook for a future precise resolver (LSP, SCIP, or a language-native
/// type checker). No implementation ships today; when one exists it slots
/// in ahead of the heuristic bands at confidence 1.0.
pub trait SemanticProvider: Send + Sync {
    fn resolve_call(&self, callsite: &Callsite, candidates: &[&Symbol]) -> Option<u64>;
}

/// A `SemanticProvider` that never resolves anything -- the default when no
/// precise resolver is configured.
pub struct NoSemanticProvider;

impl SemanticProvider for NoSemanticProvider {
    fn resolve_call(&self, _callsite: &Callsite, _candidates: &[&Symbol]) -> Option<u64> {
        None
    }
}

/// Resolve every callsite in `callsites` against the repo-wide `symbols`
/// table, producing CALL edges banded by confidence. Symbols must carry
/// their real (post-persist) store ids.
pub fn resolve_calls(
    symbols: &[Symbol],
    callsites: &[Callsite],
    semantic: &dyn SemanticProvider,
) -> Vec<Edge> {
    let callable: Vec<&Symbol> =
        symbols.iter().filter(|s| matches!(s.kind, SymbolKind::Function | SymbolKind::Method)).collect();

    let mut by_name: HashMap<&str, Vec<&Symbol>> = HashMap::new();
    for s in &callable {
        by_name.entry(s.name.as_str()).or_default().push(s);
    }

    let mut edges = Vec::new();

    for call in callsites {
        let (receiver, bare_name) = split_receiver(&call.callee_text);
        let Some(candidates) = by_name.get(bare_name) else {
            continue;
        };

        if let Some(target) = semantic.resolve_call(call, candidates) {
            edges.push(make_edge(call, target, confidence::SEMANTIC, Provenance::Resolved, "semantic provider"));
            continue;
        }

        if let Some(recv) = receiver {
            // Matches both nested-qualifier calls (`User.save` -> `mod.User.save`)
            // and module-qualified calls (`m.foo` -> `m.foo`, where `m` is the
            // callee's own module name rather than a nested class).
            let nested_suffix = format!(".{recv}.{bare_name}");
            let module_qualified = format!("{recv}.{bare_name}");
            let qualified_matches: Vec<&&Symbol> = candidates
                .iter()
                .filter(|s| s.qualified_name.ends_with(&nested_suffix) || s.qualified_name == module_qualified)
                .collect();
            if qualified_matches.len() == 1 {
                edges.push(make_edge(
                    call,
                    qualified_matches[0].id,
                    confidence::QUALIFIED_CALL,
                    Provenance::Heuristic,
                    &format!("qualified call {recv}.{bare_name} matched one candidate"),
                ));
                continue;
            }
        }

        if candidates.len() == 1 {
            edges.push(make_edge(
                call,
                candidates[0].id,
                confidence::SINGLE_CANDIDATE,
                Provenance::Heuristic,
                "single unqualified candidate in repo",
            ));
            continue;
        }

        let in_scope: Vec<&&Symbol> = candidates
            .iter()
            .filter(|s| call.imports_in_scope.iter().any(|imp| s.file_path.contains(imp.trim_start_matches("./"))))
            .collect();
        if in_scope.len() == 1 {
            edges.push(make_edge(
                call,
                in_scope[0].id,
                confidence::MULTI_DISAMBIGUATED,
                Provenance::Heuristic,
                "disambiguated via imports in scope",
            ));
            continue;
        }

        // Dynamic/higher-order fallback: multiple candidates, no
        // disambiguation signal. Emit a low-confidence edge to the
        // lexicographically first candidate so the call isn't dropped
        // entirely, but flag it clearly in metadata.
        if let Some(first) = candidates.iter().min_by_key(|s| (&s.file_path, s.line_start)) {
            edges.push(make_edge(
                call,
                first.id,
                confidence::DYNAMIC_OR_HIGHER_ORDER,
                Provenance::Heuristic,
                &format!("{} candidates, no disambiguating signal", candidates.len()),
            ));
        }
    }

    edges
}

fn split_receiver(callee_text: &str) -> (Option<&str>, &str) {
    match callee_text.rsplit_once('.') {
        Some((recv, name)) => (Some(recv), name),
        None => (None, callee_text),
    }
}

fn make_edge(call: &Callsite, target_id: u64, confidence: f64, provenance: Provenance, reason: &str) -> Edge {
    Edge {
        id: 0,
        source_id: call.enclosing_symbol_id,
        target_id,
        kind: EdgeKind::Call,
        confidence,
        provenance,
        origin_file: call.file_path.clone(),
        metadata: Some(reason.to_string()),
    }
}

/// Resolve a single relative import (`./foo`, `../bar`) from `origin_file`
/// against the repo's known files, returning the target file's Module
/// symbol id. Non-relative imports (package/module names) are left for
/// `resolve_module_dependencies` and return `None` here.
fn resolve_relative_import(
    origin_file: &str,
    import_source: &str,
    file_to_module_symbol: &HashMap<String, u64>,
) -> Option<u64> {
    if !(import_source.starts_with("./") || import_source.starts_with("../")) {
        return None;
    }
    let origin_dir = Path::new(origin_file).parent().unwrap_or_else(|| Path::new(""));
    let joined = origin_dir.join(import_source);
    let base = normalize_in_root(Path::new(""), &joined).ok()?;

    let mut candidates = vec![base.clone()];
    for ext in IMPORT_RESOLUTION_EXTS {
        candidates.push(format!("{base}.{ext}"));
        candidates.push(format!("{base}/index.{ext}"));
        candidates.push(format!("{base}/__init__.{ext}"));
    }

    candidates.iter().find_map(|c| file_to_module_symbol.get(c).copied())
}

/// Emit IMPORT edges for every import whose relative path resolves to a
/// known file's Module symbol (spec §4.5: the file-level counterpart to
/// MODULE_DEPENDS_ON's package-level grouping). Imports that don't resolve
/// this way are left for `resolve_module_dependencies` or dropped.
pub fn resolve_imports(
    file_to_module_symbol: &HashMap<String, u64>,
    import_edges: &[(String, String)], // (origin_file, raw import source)
) -> Vec<Edge> {
    let mut edges = Vec::new();
    for (origin_file, import_source) in import_edges {
        let Some(&source_module) = file_to_module_symbol.get(origin_file) else { continue };
        let Some(target_module) = resolve_relative_import(origin_file, import_source, file_to_module_symbol) else {
            continue;
        };
        if target_module == source_module {
            continue;
        }
        edges.push(Edge {
            id: 0,
            source_id: source_module,
            target_id: target_module,
            kind: EdgeKind::Import,
            confidence: 0.9,
            provenance: Provenance::Heuristic,
            origin_file: origin_file.clone(),
            metadata: Some(format!("resolved relative import: {import_source}")),
        });
    }
    edges
}

/// Emit MODULE_DEPENDS_ON edges between a file's module symbol and every
/// other package its imports resolve into, grouped by the detected
/// monorepo layout (spec §4.7).
pub fn resolve_module_dependencies(
    layout: &MonorepoLayout,
    file_to_module_symbol: &HashMap<String, u64>,
    file_package: &HashMap<String, String>,
    import_edges: &[(String, String)], // (origin_file, raw import source/path)
) -> Vec<Edge> {
    let mut seen = std::collections::HashSet::new();
    let mut edges = Vec::new();

    for (origin_file, import_target) in import_edges {
        let Some(&source_module) = file_to_module_symbol.get(origin_file) else { continue };
        let Some(source_pkg) = file_package.get(origin_file) else { continue };

        for pkg in &layout.packages {
            if pkg.name == *source_pkg {
                continue;
            }
            if import_target.contains(&pkg.name) {
                let key = (source_pkg.clone(), pkg.name.clone());
                if !seen.insert(key) {
                    continue;
                }
                if let Some(&target_module) = layout
                    .packages
                    .iter()
                    .find(|p| p.name == pkg.name)
                    .and_then(|p| file_package.iter().find(|(_, v)| **v == p.name))
                    .and_then(|(f, _)| file_to_module_symbol.get(f))
                {
                    edges.push(Edge {
                        id: 0,
                        source_id: source_module,
                        target_id: target_module,
                        kind: EdgeKind::ModuleDependsOn,
                        confidence: 0.8,
                        provenance: Provenance::Heuristic,
                        origin_file: origin_file.clone(),
                        metadata: Some(format!("{source_pkg} imports from package {}", pkg.name)),
                    });
                }
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(id: u64, name: &str, qualified_name: &str, file_path: &str) -> Symbol {
        Symbol {
            id,
            stable_id: format!("s{id}"),
            file_path: file_path.to_string(),
            kind: SymbolKind::Function,
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            line_start: 1,
            line_end: 2,
            col_start: 0,
            col_end: 0,
            signature: String::new(),
            docstring: None,
            parent_id: None,
        }
    }

    fn callsite(enclosing: u64, callee_text: &str) -> Callsite {
        Callsite {
            id: 1,
            file_path: "a.py".to_string(),
            line: 1,
            col: 0,
            callee_text: callee_text.to_string(),
            enclosing_symbol_id: enclosing,
            imports_in_scope: vec![],
        }
    }

    #[test]
    fn test_single_candidate_band() {
        let symbols = vec![symbol(1, "helper", "mod.helper", "a.py")];
        let calls = vec![callsite(99, "helper")];
        let edges = resolve_calls(&symbols, &calls, &NoSemanticProvider);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].confidence, confidence::SINGLE_CANDIDATE);
        assert_eq!(edges[0].target_id, 1);
    }

    #[test]
    fn test_qualified_call_band() {
        let symbols = vec![
            symbol(1, "save", "mod.User.save", "a.py"),
            symbol(2, "save", "mod.Order.save", "a.py"),
        ];
        let calls = vec![callsite(99, "User.save")];
        let edges = resolve_calls(&symbols, &calls, &NoSemanticProvider);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].confidence, confidence::QUALIFIED_CALL);
        assert_eq!(edges[0].target_id, 1);
    }

    #[test]
    fn test_module_qualified_call_band() {
        let symbols = vec![symbol(1, "foo", "m.foo", "m.js")];
        let calls = vec![callsite(99, "m.foo")];
        let edges = resolve_calls(&symbols, &calls, &NoSemanticProvider);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].confidence, confidence::QUALIFIED_CALL);
        assert_eq!(edges[0].target_id, 1);
    }

    #[test]
    fn test_dynamic_fallback_band() {
        let symbols = vec![
            symbol(1, "handle", "a.handle", "a.py"),
            symbol(2, "handle", "b.handle", "b.py"),
        ];
        let calls = vec![callsite(99, "handle")];
        let edges = resolve_calls(&symbols, &calls, &NoSemanticProvider);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].confidence, confidence::DYNAMIC_OR_HIGHER_ORDER);
    }

    #[test]
    fn test_no_candidates_drops_call() {
        let symbols = vec![symbol(1, "other", "mod.other", "a.py")];
        let calls = vec![callsite(99, "missing")];
        let edges = resolve_calls(&symbols, &calls, &NoSemanticProvider);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_resolve_imports_same_directory() {
        let mut file_to_module = HashMap::new();
        file_to_module.insert("a.py".to_string(), 1);
        file_to_module.insert("util.py".to_string(), 2);

        let import_edges = vec![("a.py".to_string(), "./util".to_string())];
        let edges = resolve_imports(&file_to_module, &import_edges);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_id, 1);
        assert_eq!(edges[0].target_id, 2);
        assert_eq!(edges[0].kind, EdgeKind::Import);
    }

    #[test]
    fn test_resolve_imports_parent_directory() {
        let mut file_to_module = HashMap::new();
        file_to_module.insert("pkg/a.py".to_string(), 1);
        file_to_module.insert("shared.py".to_string(), 2);

        let import_edges = vec![("pkg/a.py".to_string(), "../shared".to_string())];
        let edges = resolve_imports(&file_to_module, &import_edges);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target_id, 2);
    }

    #[test]
    fn test_resolve_imports_drops_unresolved_relative_import() {
        let mut file_to_module = HashMap::new();
        file_to_module.insert("a.py".to_string(), 1);

        let import_edges = vec![("a.py".to_string(), "./does_not_exist".to_string())];
        let edges = resolve_imports(&file_to_module, &import_edges);

        assert!(edges.is_empty());
    }

    #[test]
    fn test_resolve_imports_ignores_non_relative_import() {
        let mut file_to_module = HashMap::new();
        file_to_module.insert("a.py".to_string(), 1);

        let import_edges = vec![("a.py".to_string(), "requests".to_string())];
        let edges = resolve_imports(&file_to_module, &import_edges);

        assert!(edges.is_empty());
    }

    #[test]
    fn test_resolve_imports_never_self_loops() {
        let mut file_to_module = HashMap::new();
        file_to_module.insert("a.py".to_string(), 1);

        // A pathological "import self" should never produce a self-loop
        // edge even if it resolves back to the origin file.
        let import_edges = vec![("a.py".to_string(), "./a".to_string())];
        let edges = resolve_imports(&file_to_module, &import_edges);

        assert!(edges.is_empty());
    }
}
