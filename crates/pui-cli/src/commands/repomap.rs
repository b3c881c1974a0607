use pui_output::packs::repomap::{RepoMapPack, DEFAULT_BUDGET};
use pui_output::{Markdown, PackFormat, Structured};

use super::{open_store, repo_root};

pub fn run(depth: u32, focus: Option<String>, max_tokens: Option<usize>, format: String) -> i32 {
    let root = match repo_root() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let store = match open_store(&root) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let pack = match RepoMapPack::build(&store, focus.as_deref(), depth) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("pui repomap: {e}");
            return e.exit_code();
        }
    };

    let budget = max_tokens.unwrap_or(DEFAULT_BUDGET);
    let rendered = if format == "json" {
        Structured.format_repomap(&pack, budget)
    } else {
        Markdown.format_repomap(&pack, budget)
    };

    match rendered {
        Ok(truncated) => {
            println!("{}", truncated.text);
            0
        }
        Err(e) => {
            // BudgetTooSmall is handled inside format_repomap (minimal pack
            // with just the mandatory metadata, spec §7); anything that
            // reaches here is a genuine rendering failure.
            eprintln!("pui repomap: {e}");
            0
        }
    }
}
