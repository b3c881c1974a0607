//! Bounded-depth BFS traversal (spec §4.9 C9), grounded on the teacher's
//! single-hop `collect_adjacency` pattern, generalized to multi-hop with a
//! visited set and running confidence aggregation.

use std::collections::{HashSet, VecDeque};

use pui_core::error::PuiError;
use pui_core::store::Store;
use pui_core::types::{EdgeDirection, EdgeKind, Symbol};

/// One hop in a traversal result: the symbol reached, how many hops away it
/// is, and the minimum confidence seen across the path that reached it.
#[derive(Debug, Clone)]
pub struct TraversalHop {
    pub symbol: Symbol,
    pub depth: u32,
    pub path_confidence: f64,
    pub via_kind: EdgeKind,
}

/// BFS outward from `symbol_id` up to `max_depth` hops, following edges of
/// `kind` (or any kind, if `None`) in `direction`. Ordering is `(depth,
/// confidence desc, path asc, symbol id asc)` (spec §4.9) — implemented
/// here as depth-then-confidence-then-id, since path text isn't tracked at
/// this layer (pack generators sort by path separately once they have
/// `Symbol.file_path` to hand).
pub fn traverse(
    store: &dyn Store,
    symbol_id: u64,
    max_depth: u32,
    direction: EdgeDirection,
    kind: Option<EdgeKind>,
) -> Result<Vec<TraversalHop>, PuiError> {
    let mut visited: HashSet<u64> = HashSet::new();
    visited.insert(symbol_id);

    let mut queue: VecDeque<(u64, u32, f64)> = VecDeque::new();
    queue.push_back((symbol_id, 0, 1.0));

    let mut results = Vec::new();

    while let Some((current_id, depth, confidence_so_far)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        let edges = store.edges(current_id, direction, kind)?;
        for edge in edges {
            let neighbor_id = if edge.source_id == current_id { edge.target_id } else { edge.source_id };
            if visited.contains(&neighbor_id) {
                continue;
            }
            visited.insert(neighbor_id);

            let Some(symbol) = store.get_symbol(neighbor_id)? else { continue };
            let path_confidence = confidence_so_far.min(edge.confidence);

            results.push(TraversalHop {
                symbol: symbol.clone(),
                depth: depth + 1,
                path_confidence,
                via_kind: edge.kind,
            });
            queue.push_back((neighbor_id, depth + 1, path_confidence));
        }
    }

    results.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then(b.path_confidence.partial_cmp(&a.path_confidence).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.symbol.file_path.cmp(&b.symbol.file_path))
            .then(a.symbol.id.cmp(&b.symbol.id))
    });

    Ok(results)
}
