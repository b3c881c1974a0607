use std::sync::atomic::AtomicBool;

use pui_index::{IndexMode, Indexer};

use super::{load_config, open_store, repo_root};

pub fn run(force: bool, stats: bool) -> i32 {
    let root = match repo_root() {
        Ok(r) => r,
        Err(code) => return code,
    };
    let mut store = match open_store(&root) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mode = if stats {
        IndexMode::StatsOnly
    } else if force {
        IndexMode::Full
    } else {
        IndexMode::Incremental
    };

    let config = load_config(&root);
    let indexer = Indexer::new(root, config);
    let cancel = AtomicBool::new(false);

    match indexer.run(&mut store, mode, &cancel) {
        Ok(stats) => {
            let json = serde_json::to_string_pretty(&stats).unwrap_or_default();
            println!("{json}");
            0
        }
        Err(e) => {
            eprintln!("pui index: {e}");
            e.exit_code()
        }
    }
}
