//! Language parsing, extraction, and heuristic resolution for pui.
//!
//! - [`language`] — the parser facade: language detection, tree-sitter setup
//! - [`queries`] — per-language named capture queries
//! - [`ignore_resolver`] — exclude-pattern precedence (C2)
//! - [`walker`] — repo-root file discovery (C3)
//! - [`extract`] — lowers a parsed tree into Symbol/Edge/Callsite rows (C5)
//! - [`resolver`] — confidence-banded callsite resolution (C7)
//! - [`monorepo`] — workspace/package detection for MODULE_DEPENDS_ON grouping

pub mod extract;
pub mod ignore_resolver;
pub mod language;
pub mod monorepo;
pub mod queries;
pub mod resolver;
pub mod walker;
