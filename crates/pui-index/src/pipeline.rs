//! Parallel parse + extract stage (spec §4.8): discovery and per-file
//! parse/extract run on a `rayon` pool sized by `index.workers`;
//! persistence is funneled serially through the single store owner.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rayon::prelude::*;

use pui_core::hash::sha256_hex;
use pui_core::paths::normalize_in_root;
use pui_core::types::{FileIndex, FileRow};
use pui_parsers::extract::extract_file;
use pui_parsers::language::{grammar_for, TreeSitterParser};
use pui_parsers::queries::query_for_language;
use pui_parsers::walker::WalkEntry;

/// One file's parsed-and-extracted output, ready to hand to
/// `Store::replace_file`.
pub struct ParsedFile {
    pub file: FileRow,
    pub index: FileIndex,
    pub had_parse_error: bool,
}

/// Parse and extract every entry in `entries` using a rayon pool of
/// `workers` threads. A file whose language has no extraction query
/// (C/C++, spec §4.4) still produces a File row with zero symbols.
pub fn parse_entries(root: &Path, entries: &[WalkEntry], workers: usize) -> Vec<ParsedFile> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .expect("failed to build rayon thread pool");

    pool.install(|| entries.par_iter().filter_map(|entry| parse_one(root, entry)).collect())
}

fn parse_one(root: &Path, entry: &WalkEntry) -> Option<ParsedFile> {
    let source = std::fs::read(&entry.path).ok()?;
    let rel_path = normalize_in_root(root, &entry.path).ok()?;
    let metadata = std::fs::metadata(&entry.path).ok()?;
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let indexed_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let file = FileRow {
        path: rel_path.clone(),
        language: entry.language,
        content_hash: sha256_hex(&source),
        size: entry.size,
        mtime,
        indexed_at,
    };

    let Some(lang) = entry.language else {
        // Unrecognized extension: still gets a File row, just with no
        // symbols (spec §4.3).
        return Some(ParsedFile { file, index: FileIndex::default(), had_parse_error: false });
    };

    if !lang.has_full_extraction() {
        return Some(ParsedFile { file, index: FileIndex::default(), had_parse_error: false });
    }

    let grammar = grammar_for(lang);
    let Ok(query) = query_for_language(&grammar, lang) else {
        return Some(ParsedFile { file, index: FileIndex::default(), had_parse_error: false });
    };

    let mut parser = TreeSitterParser::new();
    let Ok(tree) = parser.parse(lang, &source) else {
        return Some(ParsedFile { file, index: FileIndex::default(), had_parse_error: true });
    };
    let had_parse_error = tree.root_node().has_error();

    let path_for_extract = Path::new(&rel_path);
    let index = extract_file(lang, path_for_extract, &source, &tree, &query);

    Some(ParsedFile { file, index, had_parse_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pui_core::types::Language;
    use std::collections::HashMap;

    #[test]
    fn test_parse_entries_produces_symbols() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();

        let walker = pui_parsers::walker::FileWalker::new(dir.path(), vec![], HashMap::new(), 1024 * 1024);
        let (entries, _) = walker.walk();
        let parsed = parse_entries(dir.path(), &entries, 2);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].file.language, Some(Language::Python));
        assert!(parsed[0].index.symbols.iter().any(|s| s.name == "foo"));
        assert!(!parsed[0].had_parse_error);
    }

    #[test]
    fn test_parse_entries_c_is_file_level_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.c"), "int main() { return 0; }\n").unwrap();

        let walker = pui_parsers::walker::FileWalker::new(dir.path(), vec![], HashMap::new(), 1024 * 1024);
        let (entries, _) = walker.walk();
        let parsed = parse_entries(dir.path(), &entries, 2);

        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].index.symbols.is_empty());
    }

    #[test]
    fn test_parse_entries_unrecognized_extension_gets_file_row_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "# Hello").unwrap();

        let walker = pui_parsers::walker::FileWalker::new(dir.path(), vec![], HashMap::new(), 1024 * 1024);
        let (entries, _) = walker.walk();
        let parsed = parse_entries(dir.path(), &entries, 2);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].file.language, None);
        assert!(parsed[0].index.symbols.is_empty());
        assert!(!parsed[0].had_parse_error);
    }
}
