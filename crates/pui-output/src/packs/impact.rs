//! Impact pack (spec §4.11): Header, Changed Items, Upstream, Downstream,
//! Tests, Risk, Ranked Files, Metadata. Default budget 6k tokens, max 12k.

use std::collections::BTreeMap;
use std::path::Path;

use pui_core::error::PuiError;
use pui_core::store::Store;
use pui_core::types::{EdgeDirection, EdgeKind, Symbol};
use pui_graph::impact::{changed_ranges_from_git_diff, rank_impact, symbols_touched, ChangedRange, ImpactedSymbol};
use pui_graph::traverse::{traverse, TraversalHop};

use crate::packs::{index_version, SCHEMA_VERSION};
use crate::token_budget::{estimate_tokens, truncate, Truncated};

pub const DEFAULT_BUDGET: usize = 6_000;
pub const MAX_BUDGET: usize = 12_000;

pub enum ImpactInput<'a> {
    Files(&'a [String]),
    GitDiff(&'a str),
}

#[derive(Debug, Clone)]
pub struct RankedFile {
    pub path: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct ImpactPack {
    pub schema_version: u32,
    pub index_version: String,
    pub changed_items: Vec<Symbol>,
    pub upstream: Vec<ImpactedSymbol>,
    pub downstream: Vec<TraversalHop>,
    pub affected_tests: Vec<Symbol>,
    pub ranked: Vec<ImpactedSymbol>,
    pub ranked_files: Vec<RankedFile>,
}

impl ImpactPack {
    pub fn build(
        store: &dyn Store,
        root: &Path,
        input: ImpactInput,
        include_tests: bool,
        max_depth: u32,
    ) -> Result<Self, PuiError> {
        let all_files = store.all_files()?;

        let ranges: Vec<ChangedRange> = match input {
            ImpactInput::Files(paths) => paths
                .iter()
                .map(|p| ChangedRange { path: p.clone(), line_start: 0, line_end: u32::MAX })
                .collect(),
            ImpactInput::GitDiff(range) => changed_ranges_from_git_diff(root, range)?,
        };

        let changed_items = symbols_touched(store, &ranges)?;
        let ranked = rank_impact(store, &changed_items, include_tests)?;

        let mut downstream = Vec::new();
        for item in &changed_items {
            downstream.extend(traverse(store, item.id, max_depth, EdgeDirection::Outgoing, Some(EdgeKind::Call))?);
        }

        let affected_tests: Vec<Symbol> = ranked
            .iter()
            .filter(|r| matches_test_pattern(&r.symbol.file_path))
            .map(|r| r.symbol.clone())
            .collect();

        let mut by_file: BTreeMap<String, f64> = BTreeMap::new();
        for r in &ranked {
            *by_file.entry(r.symbol.file_path.clone()).or_insert(0.0) += r.score;
        }
        let mut ranked_files: Vec<RankedFile> =
            by_file.into_iter().map(|(path, score)| RankedFile { path, score }).collect();
        ranked_files.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap().then(a.path.cmp(&b.path)));

        Ok(ImpactPack {
            schema_version: SCHEMA_VERSION,
            index_version: index_version(&all_files),
            changed_items,
            upstream: ranked.clone(),
            downstream,
            affected_tests,
            ranked,
            ranked_files,
        })
    }

    fn render_full_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Impact\n");
        out.push_str(&format!("schema_version={} index_version={}\n", self.schema_version, self.index_version));

        out.push_str("## Changed Items\n");
        for s in &self.changed_items {
            out.push_str(&format!("| {} | {}:{} |\n", s.qualified_name, s.file_path, s.line_start));
        }

        out.push_str("## Upstream\n");
        for u in &self.upstream {
            out.push_str(&format!("| {} | {:.2} | {} |\n", u.symbol.qualified_name, u.score, u.rationale.join("; ")));
        }

        out.push_str("## Downstream\n");
        for hop in &self.downstream {
            out.push_str(&format!(
                "| {} | {}:{} | depth={} conf={:.2} |\n",
                hop.symbol.qualified_name, hop.symbol.file_path, hop.symbol.line_start, hop.depth, hop.path_confidence
            ));
        }

        out.push_str("## Tests\n");
        for t in &self.affected_tests {
            out.push_str(&format!("| {} | {} |\n", t.qualified_name, t.file_path));
        }

        out.push_str("## Risk\n");
        let high_risk = self.ranked.iter().filter(|r| r.score >= 5.0).count();
        out.push_str(&format!("high_risk_items={high_risk}\n"));

        out.push_str("## Ranked Files\n");
        for f in &self.ranked_files {
            out.push_str(&format!("| {} | {:.2} |\n", f.path, f.score));
        }

        out.push_str("## Metadata\n");
        out.push_str(&format!("changed_items={}\n", self.changed_items.len()));

        out
    }

    pub fn render_markdown(&self, max_tokens: usize) -> Result<Truncated, PuiError> {
        truncate(&self.render_full_markdown(), max_tokens)
    }

    pub fn render_json(&self, max_tokens: usize) -> Result<Truncated, PuiError> {
        let value = serde_json::json!({
            "schema_version": self.schema_version,
            "type": "impact",
            "metadata": { "index_version": self.index_version, "changed_items": self.changed_items.len() },
            "changed_items": self.changed_items.iter().map(|s| s.qualified_name.clone()).collect::<Vec<_>>(),
            "upstream": self.upstream.iter().map(|u| serde_json::json!({
                "name": u.symbol.qualified_name, "score": u.score, "rationale": u.rationale,
            })).collect::<Vec<_>>(),
            "downstream": self.downstream.iter().map(|h| serde_json::json!({
                "name": h.symbol.qualified_name, "depth": h.depth, "confidence": h.path_confidence,
            })).collect::<Vec<_>>(),
            "tests": self.affected_tests.iter().map(|t| t.file_path.clone()).collect::<Vec<_>>(),
            "ranked_files": self.ranked_files.iter().map(|f| serde_json::json!({
                "path": f.path, "score": f.score,
            })).collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&value).map_err(|e| PuiError::Internal(e.to_string()))?;
        let tokens = estimate_tokens(&text);
        if tokens <= max_tokens {
            Ok(Truncated { text, truncated: false, dropped_count: 0 })
        } else {
            Err(PuiError::BudgetTooSmall { needed: tokens, budget: max_tokens })
        }
    }
}

/// Language-aware test-file patterns (spec §4.10): `*_test.go`,
/// `test_*.py`, `*.spec.ts`, `*.test.*`.
pub fn matches_test_pattern(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.ends_with("_test.go")
        || (name.starts_with("test_") && name.ends_with(".py"))
        || name.ends_with(".spec.ts")
        || name.contains(".test.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_test_pattern_go() {
        assert!(matches_test_pattern("pkg/foo_test.go"));
        assert!(!matches_test_pattern("pkg/foo.go"));
    }

    #[test]
    fn test_matches_test_pattern_python() {
        assert!(matches_test_pattern("tests/test_utils.py"));
        assert!(!matches_test_pattern("src/utils.py"));
    }

    #[test]
    fn test_matches_test_pattern_ts() {
        assert!(matches_test_pattern("src/foo.spec.ts"));
        assert!(matches_test_pattern("src/foo.test.ts"));
    }
}
