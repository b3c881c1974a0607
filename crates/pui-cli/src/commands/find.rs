use pui_core::store::Store;

use super::{open_store, repo_root};

pub fn run(query: String, limit: usize, format: String) -> i32 {
    let root = match repo_root() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let store = match open_store(&root) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let results = match store.search_symbols_fts(&query, limit) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("pui find: {e}");
            return e.exit_code();
        }
    };

    if format == "json" {
        let value = serde_json::json!({
            "query": query,
            "results": results.iter().map(|s| serde_json::json!({
                "id": s.id,
                "name": s.qualified_name,
                "kind": s.kind.as_str(),
                "file": s.file_path,
                "line": s.line_start,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        for s in &results {
            println!("{} ({}) {}:{}", s.qualified_name, s.kind, s.file_path, s.line_start);
        }
        if results.is_empty() {
            println!("no matches for \"{query}\"");
        }
    }

    0
}
