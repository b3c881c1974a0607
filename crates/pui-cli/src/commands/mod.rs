//! Command implementations. Each `run` function opens the store, drives one
//! engine operation, prints to stdout, and returns a process exit code
//! (spec §6: 0 success, 2 usage error, 3 engine error, 4 schema too new,
//! 5 cancelled).

pub mod find;
pub mod graph;
pub mod impact;
pub mod index;
pub mod repomap;
pub mod zoom;

use std::path::{Path, PathBuf};

use pui_core::config::PuiConfig;
use pui_core::sqlite::SqliteStore;

pub(crate) fn repo_root() -> Result<PathBuf, i32> {
    std::env::current_dir().map_err(|e| {
        eprintln!("pui: failed to get current directory: {e}");
        2
    })
}

pub(crate) fn pui_dir(root: &Path) -> PathBuf {
    root.join(".pui")
}

pub(crate) fn load_config(root: &Path) -> PuiConfig {
    PuiConfig::load(&pui_dir(root))
}

/// Open the store, creating `.pui/` if it doesn't exist yet (the indexer
/// needs somewhere to write on first run; read-only commands that find no
/// index just see an empty store).
pub(crate) fn open_store(root: &Path) -> Result<SqliteStore, i32> {
    let dir = pui_dir(root);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("pui: failed to create .pui directory: {e}");
        return Err(2);
    }
    let db_path = dir.join("index.sqlite");
    SqliteStore::open(db_path.to_str().unwrap_or("")).map_err(|e| {
        eprintln!("pui: failed to open index: {e}");
        e.exit_code()
    })
}
