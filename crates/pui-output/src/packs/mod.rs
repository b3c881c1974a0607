//! Pack types (spec §4.11 C11): RepoMap, Zoom, Impact. Each is a plain
//! struct built from the store and rendered with `render_markdown`/
//! `render_json`, mirroring the grounding crate's per-command result
//! structs (`CompileResult`, `DiscoverResult`, `MapResult`, ...).

pub mod impact;
pub mod repomap;
pub mod zoom;

use pui_core::hash::sha256_hex;
use pui_core::types::FileRow;

/// Current pack schema version (spec §6: every pack carries `schema_version`).
pub const SCHEMA_VERSION: u32 = 1;

/// Derive `index_version` from the set of file content hashes — packs
/// generated from an unchanged index produce the same `index_version`
/// (spec §4.11 determinism: "a function of ... content hashes of inputs").
pub fn index_version(files: &[FileRow]) -> String {
    let mut hashes: Vec<&str> = files.iter().map(|f| f.content_hash.as_str()).collect();
    hashes.sort_unstable();
    sha256_hex(hashes.join("\n").as_bytes())
}
