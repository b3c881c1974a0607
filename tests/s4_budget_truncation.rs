//! S4 — RepoMap budget truncation: bounded output, mandatory Metadata
//! section, truncation marker, deterministic ordering across runs.

mod common;

use pui_output::token_budget::estimate_tokens;
use pui_output::RepoMapPack;

#[test]
fn test_s4_budget_truncation_is_bounded_and_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    for file_idx in 0..50 {
        let mut contents = String::new();
        for func_idx in 0..4 {
            contents.push_str(&format!("def f{file_idx}_{func_idx}():\n    pass\n\n"));
        }
        std::fs::write(dir.path().join(format!("m{file_idx}.py")), contents).unwrap();
    }

    let store = common::index_repo(dir.path());
    let pack = RepoMapPack::build(&store, None, 2).unwrap();
    assert!(pack.total_symbols >= 200, "expected at least 200 symbols, got {}", pack.total_symbols);

    let first = pack.render_markdown(500).unwrap();
    let second = pack.render_markdown(500).unwrap();

    assert!(estimate_tokens(&first.text) <= 500);
    assert!(first.text.contains("## Metadata"), "mandatory metadata section must survive truncation");
    assert!(first.truncated);
    assert!(first.text.contains("more available"));
    assert_eq!(first.text, second.text, "ordering of shown symbols must be deterministic across runs");
}
