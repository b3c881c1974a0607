//! S3 — qualified call resolution across JS files via a module alias.

mod common;

use pui_core::store::Store;
use pui_core::types::{EdgeDirection, EdgeKind};

#[test]
fn test_s3_javascript_qualified_call() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("m.js"), "function foo() {}\n").unwrap();
    std::fs::write(
        dir.path().join("x.js"),
        "const m = require('./m');\n\nfunction run() {\n  m.foo();\n}\n",
    )
    .unwrap();

    let store = common::index_repo(dir.path());

    let foo = store.find_symbols_by_name("foo").unwrap().into_iter().next().expect("foo indexed");
    let callers = store.edges(foo.id, EdgeDirection::Incoming, Some(EdgeKind::Call)).unwrap();

    assert_eq!(callers.len(), 1);
    assert!(
        callers[0].confidence >= 0.9,
        "expected a qualified-call confidence band, got {}",
        callers[0].confidence
    );
}
