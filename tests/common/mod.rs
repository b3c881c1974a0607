//! Shared scaffolding for the end-to-end scenario tests.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use pui_core::config::PuiConfig;
use pui_core::sqlite::SqliteStore;
use pui_index::{IndexMode, Indexer};

/// Run a full index over `root` into a fresh in-memory store.
pub fn index_repo(root: &Path) -> SqliteStore {
    let mut store = SqliteStore::in_memory().unwrap();
    let indexer = Indexer::new(root.to_path_buf(), PuiConfig::default());
    let cancel = AtomicBool::new(false);
    indexer.run(&mut store, IndexMode::Full, &cancel).unwrap();
    store
}

/// Run a full index over `root` against an existing store, in place.
pub fn reindex(root: &Path, store: &mut SqliteStore) {
    let indexer = Indexer::new(root.to_path_buf(), PuiConfig::default());
    let cancel = AtomicBool::new(false);
    indexer.run(store, IndexMode::Full, &cancel).unwrap();
}
