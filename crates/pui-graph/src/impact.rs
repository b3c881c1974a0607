//! Impact analysis (spec §4.10 C10): ranks symbols touched by a change by
//! fan-in, test proximity, centrality, and API-surface exposure, and maps a
//! `git diff` range onto the symbols it overlaps.

use std::collections::HashMap;
use std::process::Command;

use pui_core::error::PuiError;
use pui_core::store::Store;
use pui_core::types::{EdgeDirection, EdgeKind, Symbol};

/// A ranked impact result for one symbol, with the rationale that produced
/// its score (spec §4.10 `--explain`).
#[derive(Debug, Clone)]
pub struct ImpactedSymbol {
    pub symbol: Symbol,
    pub score: f64,
    pub rationale: Vec<String>,
}

/// A `(path, line_start, line_end)` range parsed from a unified diff hunk
/// header, or supplied directly via `--files`.
#[derive(Debug, Clone)]
pub struct ChangedRange {
    pub path: String,
    pub line_start: u32,
    pub line_end: u32,
}

/// Parse `git diff --unified=0 <range>` output into `(path, line-range)`
/// pairs. This is the one process invocation the impact engine makes —
/// a read-only local git query (spec §4.10).
pub fn changed_ranges_from_git_diff(repo_root: &std::path::Path, range: &str) -> Result<Vec<ChangedRange>, PuiError> {
    let output = Command::new("git")
        .arg("diff")
        .arg("--unified=0")
        .arg(range)
        .current_dir(repo_root)
        .output()
        .map_err(|e| PuiError::Internal(format!("git diff failed: {e}")))?;

    if !output.status.success() {
        return Err(PuiError::Internal(format!(
            "git diff exited with status {}",
            output.status
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(parse_unified_diff(&text))
}

fn parse_unified_diff(text: &str) -> Vec<ChangedRange> {
    let mut ranges = Vec::new();
    let mut current_path: Option<String> = None;

    for line in text.lines() {
        if let Some(path) = line.strip_prefix("+++ b/") {
            current_path = Some(path.to_string());
            continue;
        }
        if let Some(hunk) = line.strip_prefix("@@ ") {
            let Some(path) = &current_path else { continue };
            if let Some((start, len)) = parse_hunk_new_range(hunk) {
                let end = if len == 0 { start } else { start + len - 1 };
                ranges.push(ChangedRange { path: path.clone(), line_start: start, line_end: end });
            }
        }
    }

    ranges
}

/// Parse the `+start,len` half of a `@@ -old +new @@` hunk header.
fn parse_hunk_new_range(hunk: &str) -> Option<(u32, u32)> {
    let plus_part = hunk.split_whitespace().find(|tok| tok.starts_with('+'))?;
    let body = plus_part.trim_start_matches('+');
    let mut parts = body.splitn(2, ',');
    let start: u32 = parts.next()?.parse().ok()?;
    let len: u32 = parts.next().map(|s| s.parse().unwrap_or(1)).unwrap_or(1);
    Some((start, len))
}

/// Find symbols whose span intersects any of `ranges`.
pub fn symbols_touched(store: &dyn Store, ranges: &[ChangedRange]) -> Result<Vec<Symbol>, PuiError> {
    let mut touched = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for range in ranges {
        for symbol in store.symbols_in_file(&range.path)? {
            let overlaps = symbol.line_start <= range.line_end && range.line_start <= symbol.line_end;
            if overlaps && seen.insert(symbol.id) {
                touched.push(symbol);
            }
        }
    }

    Ok(touched)
}

/// Rank the transitive callers of `seeds` by fan-in, test proximity,
/// centrality, and public-API exposure, with `--explain`-style rationale.
///
/// Every symbol that ends up in the result — a seed or one of its callers —
/// is scored on its own properties: a caller earns the test-proximity bonus
/// for *being* a test file that references a changed seed, not the seed
/// earning it for having a test among its callers.
pub fn rank_impact(store: &dyn Store, seeds: &[Symbol], include_tests: bool) -> Result<Vec<ImpactedSymbol>, PuiError> {
    let mut scored: HashMap<u64, ImpactedSymbol> = HashMap::new();

    let bump = |scored: &mut HashMap<u64, ImpactedSymbol>, symbol: &Symbol, delta: f64, note: String| {
        let entry = scored
            .entry(symbol.id)
            .or_insert_with(|| ImpactedSymbol { symbol: symbol.clone(), score: 0.0, rationale: Vec::new() });
        entry.score += delta;
        entry.rationale.push(note);
    };

    for seed in seeds {
        scored
            .entry(seed.id)
            .or_insert_with(|| ImpactedSymbol { symbol: seed.clone(), score: 0.0, rationale: Vec::new() });

        let callers = store.edges(seed.id, EdgeDirection::Incoming, Some(EdgeKind::Call))?;
        let fan_in = callers.len();
        if fan_in > 0 {
            let weighted_confidence: f64 = callers.iter().map(|e| e.confidence).sum::<f64>() / fan_in as f64;
            bump(
                &mut scored,
                seed,
                fan_in as f64 * weighted_confidence,
                format!("{fan_in} caller(s), weighted confidence {weighted_confidence:.2}"),
            );
        }

        if let Some((fan_in_mods, fan_out_mods)) = module_centrality(store, seed)? {
            if fan_in_mods + fan_out_mods > 0 {
                bump(
                    &mut scored,
                    seed,
                    (fan_in_mods + fan_out_mods) as f64 * 0.5,
                    format!("module import fan-in {fan_in_mods}, fan-out {fan_out_mods}"),
                );
            }
        }

        for edge in &callers {
            let Some(caller) = store.get_symbol(edge.source_id)? else { continue };
            let is_test = is_test_path(&caller.file_path);
            if is_test {
                if include_tests {
                    bump(&mut scored, &caller, 2.0, format!("referenced from test file {}", caller.file_path));
                }
            } else {
                scored
                    .entry(caller.id)
                    .or_insert_with(|| ImpactedSymbol { symbol: caller.clone(), score: 0.0, rationale: Vec::new() });
            }
        }
    }

    // Public-API exposure applies to whichever symbol carries it, seed or
    // caller, exactly once.
    for entry in scored.values_mut() {
        if is_public_api(&entry.symbol) {
            entry.score += 5.0;
            entry.rationale.push("public API — severity raised one band".to_string());
        }
    }

    let mut results: Vec<ImpactedSymbol> = scored.into_values().collect();
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.symbol.id.cmp(&b.symbol.id)));
    Ok(results)
}

/// Module-level import fan-in/fan-out around `seed`'s enclosing module, via
/// `MODULE_DEPENDS_ON` edges (spec §4.10 centrality factor).
fn module_centrality(store: &dyn Store, seed: &Symbol) -> Result<Option<(usize, usize)>, PuiError> {
    let Some(module) = store
        .symbols_in_file(&seed.file_path)?
        .into_iter()
        .find(|s| s.parent_id.is_none() && s.kind == pui_core::types::SymbolKind::Module)
    else {
        return Ok(None);
    };
    let fan_in = store.edges(module.id, EdgeDirection::Incoming, Some(EdgeKind::ModuleDependsOn))?.len();
    let fan_out = store.edges(module.id, EdgeDirection::Outgoing, Some(EdgeKind::ModuleDependsOn))?.len();
    Ok(Some((fan_in, fan_out)))
}

fn is_test_path(path: &str) -> bool {
    path.contains("test") || path.contains("spec")
}

fn is_public_api(symbol: &Symbol) -> bool {
    !symbol.name.starts_with('_')
        && matches!(
            symbol.kind,
            pui_core::types::SymbolKind::Function | pui_core::types::SymbolKind::Method | pui_core::types::SymbolKind::Class
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pui_core::sqlite::SqliteStore;
    use pui_core::types::{Edge, FileIndex, FileRow, Language, Provenance, SymbolKind};

    fn function(id: u64, file_path: &str, name: &str) -> Symbol {
        Symbol {
            id,
            stable_id: format!("s{id}"),
            file_path: file_path.to_string(),
            kind: SymbolKind::Function,
            name: name.to_string(),
            qualified_name: name.to_string(),
            line_start: 1,
            line_end: 2,
            col_start: 0,
            col_end: 0,
            signature: format!("{name}()"),
            docstring: None,
            parent_id: None,
        }
    }

    fn file_row(path: &str) -> FileRow {
        FileRow {
            path: path.to_string(),
            language: Some(Language::Python),
            content_hash: format!("hash-{path}"),
            size: 1,
            mtime: 0,
            indexed_at: 0,
        }
    }

    #[test]
    fn test_rank_impact_attributes_test_proximity_to_the_caller() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .replace_file(
                &file_row("utils.py"),
                &FileIndex { symbols: vec![function(1, "utils.py", "fmt")], edges: vec![], callsites: vec![] },
            )
            .unwrap();
        store
            .replace_file(
                &file_row("test_fmt.py"),
                &FileIndex { symbols: vec![function(1, "test_fmt.py", "test_fmt")], edges: vec![], callsites: vec![] },
            )
            .unwrap();

        let seed = store.find_symbols_by_name("fmt").unwrap().into_iter().next().unwrap();
        let caller = store.find_symbols_by_name("test_fmt").unwrap().into_iter().next().unwrap();

        store
            .upsert_edge(&Edge {
                id: 0,
                source_id: caller.id,
                target_id: seed.id,
                kind: EdgeKind::Call,
                confidence: 0.8,
                provenance: Provenance::Heuristic,
                origin_file: "test_fmt.py".to_string(),
                metadata: None,
            })
            .unwrap();

        let ranked = rank_impact(&store, &[seed.clone()], true).unwrap();

        let caller_entry = ranked.iter().find(|r| r.symbol.id == caller.id).expect("caller present in ranked output");
        assert!(caller_entry.rationale.iter().any(|r| r.contains("referenced from test file")));
        assert!(caller_entry.score > 0.0);

        let seed_entry = ranked.iter().find(|r| r.symbol.id == seed.id).unwrap();
        assert!(!seed_entry.rationale.iter().any(|r| r.contains("referenced from test file")));
    }

    #[test]
    fn test_parse_unified_diff_single_hunk() {
        let diff = "diff --git a/src/a.py b/src/a.py\n--- a/src/a.py\n+++ b/src/a.py\n@@ -10,0 +11,3 @@\n+new line\n";
        let ranges = parse_unified_diff(diff);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].path, "src/a.py");
        assert_eq!(ranges[0].line_start, 11);
        assert_eq!(ranges[0].line_end, 13);
    }

    #[test]
    fn test_parse_unified_diff_zero_length_hunk() {
        let diff = "+++ b/a.py\n@@ -5 +5,0 @@\n-removed\n";
        let ranges = parse_unified_diff(diff);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].line_start, 5);
        assert_eq!(ranges[0].line_end, 5);
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("tests/test_foo.py"));
        assert!(is_test_path("src/foo.spec.ts"));
        assert!(!is_test_path("src/foo.py"));
    }
}
