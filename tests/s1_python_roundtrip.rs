//! S1 — Python single-file roundtrip.

mod common;

use pui_core::store::Store;
use pui_core::types::{EdgeDirection, EdgeKind};

#[test]
fn test_s1_python_single_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.py"),
        "def foo():\n    pass\n\n\ndef bar():\n    foo()\n",
    )
    .unwrap();

    let store = common::index_repo(dir.path());

    let foo = store.find_symbols_by_name("foo").unwrap().into_iter().next().expect("foo indexed");
    let bar = store.find_symbols_by_name("bar").unwrap().into_iter().next().expect("bar indexed");

    let callers = store.edges(foo.id, EdgeDirection::Incoming, Some(EdgeKind::Call)).unwrap();
    assert_eq!(callers.len(), 1, "bar is foo's only caller");
    assert_eq!(callers[0].source_id, bar.id);
    assert!(callers[0].confidence >= 0.7, "caller confidence {} below 0.7", callers[0].confidence);

    let callees = store.edges(foo.id, EdgeDirection::Outgoing, Some(EdgeKind::Call)).unwrap();
    assert!(callees.is_empty(), "foo calls nothing");
}
