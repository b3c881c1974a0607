//! Indexing orchestration (spec §4.8 C8): discover -> hash-compare -> parse
//! -> extract -> persist -> resolve, in `full`/`incremental`/`stats-only`
//! modes.

pub mod indexer;
pub mod pipeline;

pub use indexer::{IndexMode, IndexStats, Indexer};
