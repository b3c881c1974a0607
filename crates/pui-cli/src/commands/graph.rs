use pui_core::store::Store;
use pui_core::types::EdgeDirection;
use pui_graph::traverse::{traverse, TraversalHop};

use super::{open_store, repo_root};

pub fn run(symbol: String, depth: u32, direction: String, format: String) -> i32 {
    let root = match repo_root() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let store = match open_store(&root) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let symbol_id = match symbol.parse::<u64>() {
        Ok(id) => id,
        Err(_) => match store.find_symbols_by_name(&symbol) {
            Ok(mut matches) => {
                matches.sort_by_key(|s| s.id);
                match matches.into_iter().next() {
                    Some(s) => s.id,
                    None => {
                        println!("{{\"error\": \"symbol not found: {symbol}\"}}");
                        return 0;
                    }
                }
            }
            Err(e) => {
                eprintln!("pui graph: {e}");
                return e.exit_code();
            }
        },
    };

    let dir = match direction.as_str() {
        "in" => EdgeDirection::Incoming,
        "out" => EdgeDirection::Outgoing,
        _ => EdgeDirection::Both,
    };

    let hops = match traverse(&store, symbol_id, depth, dir, None) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("pui graph: {e}");
            return e.exit_code();
        }
    };

    match format.as_str() {
        "mermaid" => println!("{}", render_mermaid(symbol_id, &hops)),
        "dot" => println!("{}", render_dot(symbol_id, &hops)),
        _ => println!("{}", render_json(&hops)),
    }

    0
}

fn render_mermaid(root_id: u64, hops: &[TraversalHop]) -> String {
    let mut out = String::from("graph TD\n");
    let mut seen_root = false;
    for hop in hops {
        if !seen_root {
            out.push_str(&format!("  n{root_id}({root_id})\n"));
            seen_root = true;
        }
        out.push_str(&format!(
            "  n{root_id} -->|{}| n{}[{}]\n",
            hop.via_kind, hop.symbol.id, hop.symbol.qualified_name
        ));
    }
    out
}

fn render_dot(root_id: u64, hops: &[TraversalHop]) -> String {
    let mut out = String::from("digraph G {\n");
    for hop in hops {
        out.push_str(&format!(
            "  \"{root_id}\" -> \"{}\" [label=\"{}\"];\n",
            hop.symbol.id, hop.via_kind
        ));
    }
    out.push_str("}\n");
    out
}

fn render_json(hops: &[TraversalHop]) -> String {
    let value = serde_json::json!(hops
        .iter()
        .map(|h| serde_json::json!({
            "id": h.symbol.id,
            "name": h.symbol.qualified_name,
            "file": h.symbol.file_path,
            "depth": h.depth,
            "confidence": h.path_confidence,
            "via": h.via_kind.as_str(),
        }))
        .collect::<Vec<_>>());
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
