use pui_core::error::PuiError;
use pui_output::packs::impact::{ImpactInput, ImpactPack, DEFAULT_BUDGET};
use pui_output::token_budget::minimal_markdown_pack;

use super::{open_store, repo_root};

/// Traversal depth used for the downstream section — not exposed on the
/// command line (spec §6 lists only `--include-tests`/`--max-tokens`).
const IMPACT_TRAVERSAL_DEPTH: u32 = 3;

pub fn run(files: Vec<String>, git_diff: Option<String>, include_tests: bool, max_tokens: Option<usize>) -> i32 {
    let root = match repo_root() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let store = match open_store(&root) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if files.is_empty() && git_diff.is_none() {
        eprintln!("pui impact: one of --files or --git-diff is required");
        return 2;
    }

    let input = match &git_diff {
        Some(range) => ImpactInput::GitDiff(range),
        None => ImpactInput::Files(&files),
    };

    let pack = match ImpactPack::build(&store, &root, input, include_tests, IMPACT_TRAVERSAL_DEPTH) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("pui impact: {e}");
            return e.exit_code();
        }
    };

    let budget = max_tokens.unwrap_or(DEFAULT_BUDGET);
    let rendered = match pack.render_markdown(budget) {
        Err(PuiError::BudgetTooSmall { needed, budget }) => {
            Ok(minimal_markdown_pack(pack.schema_version, &pack.index_version, needed, budget))
        }
        other => other,
    };

    match rendered {
        Ok(truncated) => {
            println!("{}", truncated.text);
            0
        }
        Err(e) => {
            eprintln!("pui impact: {e}");
            0
        }
    }
}
