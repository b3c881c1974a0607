//! S6 — impact ranking surfaces a test file among the top-ranked callers
//! of a changed symbol, with rationale naming the test-proximity factor.

mod common;

use pui_output::packs::impact::{ImpactInput, ImpactPack};

#[test]
fn test_s6_test_file_ranks_near_top_with_rationale() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("utils.py"), "def fmt():\n    pass\n").unwrap();
    for i in 0..4 {
        std::fs::write(
            dir.path().join(format!("caller{i}.py")),
            "from utils import fmt\n\ndef run():\n    fmt()\n",
        )
        .unwrap();
    }
    std::fs::write(
        dir.path().join("test_fmt.py"),
        "from utils import fmt\n\ndef test_fmt():\n    fmt()\n",
    )
    .unwrap();

    let store = common::index_repo(dir.path());
    let pack = ImpactPack::build(&store, dir.path(), ImpactInput::Files(&["utils.py".to_string()]), true, 2).unwrap();

    let test_entry = pack
        .ranked
        .iter()
        .find(|r| r.symbol.file_path == "test_fmt.py")
        .expect("test_fmt.py must appear among ranked impact results");

    assert!(
        test_entry.rationale.iter().any(|r| r.contains("referenced from test file")),
        "rationale must name test proximity, got {:?}",
        test_entry.rationale
    );

    let rank_position = pack.ranked.iter().position(|r| r.symbol.file_path == "test_fmt.py").unwrap();
    assert!(
        rank_position < pack.ranked.len() / 2 + 1,
        "test file should rank within the top half ({} of {})",
        rank_position,
        pack.ranked.len()
    );

    assert!(pack.affected_tests.iter().any(|s| s.file_path == "test_fmt.py"));
}
