use pui_output::packs::zoom::{ZoomPack, ZoomTarget, DEFAULT_BUDGET};
use pui_output::{Markdown, PackFormat, Structured};

use super::{open_store, repo_root};

/// Traversal depth used for callers/callees in a zoom pack — not exposed
/// on the command line (spec §6 lists only `--max-tokens` for `zoom`).
const ZOOM_TRAVERSAL_DEPTH: u32 = 2;

pub fn run(target: String, max_tokens: Option<usize>, format: String) -> i32 {
    let root = match repo_root() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let store = match open_store(&root) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let parsed = parse_target(&target);
    let pack = match ZoomPack::build(&store, &root, parsed, ZOOM_TRAVERSAL_DEPTH) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("pui zoom: {e}");
            return e.exit_code();
        }
    };

    let budget = max_tokens.unwrap_or(DEFAULT_BUDGET);
    let rendered = if format == "json" {
        Structured.format_zoom(&pack, budget)
    } else {
        Markdown.format_zoom(&pack, budget)
    };

    match rendered {
        Ok(truncated) => {
            println!("{}", truncated.text);
            0
        }
        Err(e) => {
            eprintln!("pui zoom: {e}");
            0
        }
    }
}

fn parse_target(raw: &str) -> ZoomTarget<'_> {
    if let Ok(id) = raw.parse::<u64>() {
        return ZoomTarget::SymbolId(id);
    }
    if let Some((path, line)) = raw.rsplit_once(':') {
        if let Ok(line) = line.parse::<u32>() {
            return ZoomTarget::PathLine(path, line);
        }
    }
    ZoomTarget::Name(raw)
}
