//! Output format trait (spec §4.11 C11).
//!
//! The grounding crate splits this three ways (`json`/`llm`/`human`); every
//! consumer of a pui pack is an LLM agent or its structured-output parser,
//! never an interactive terminal, so this narrows to two: `Markdown` and
//! `Structured` (documented as a deliberate narrowing in DESIGN.md).

use pui_core::error::PuiError;

use crate::packs::impact::ImpactPack;
use crate::packs::repomap::RepoMapPack;
use crate::packs::zoom::ZoomPack;
use crate::token_budget::{minimal_json_pack, minimal_markdown_pack, Truncated};

pub trait PackFormat {
    fn format_repomap(&self, pack: &RepoMapPack, max_tokens: usize) -> Result<Truncated, PuiError>;
    fn format_zoom(&self, pack: &ZoomPack, max_tokens: usize) -> Result<Truncated, PuiError>;
    fn format_impact(&self, pack: &ImpactPack, max_tokens: usize) -> Result<Truncated, PuiError>;
}

/// On `BudgetTooSmall`, fall back to the minimal mandatory-metadata-plus-
/// error-note pack (spec §7) instead of surfacing a bare error that would
/// leave the caller with nothing to print.
fn or_minimal_markdown(
    result: Result<Truncated, PuiError>,
    schema_version: u32,
    index_version: &str,
) -> Result<Truncated, PuiError> {
    match result {
        Err(PuiError::BudgetTooSmall { needed, budget }) => {
            Ok(minimal_markdown_pack(schema_version, index_version, needed, budget))
        }
        other => other,
    }
}

fn or_minimal_json(
    result: Result<Truncated, PuiError>,
    schema_version: u32,
    index_version: &str,
) -> Result<Truncated, PuiError> {
    match result {
        Err(PuiError::BudgetTooSmall { needed, budget }) => {
            Ok(minimal_json_pack(schema_version, index_version, needed, budget))
        }
        other => other,
    }
}

pub struct Markdown;

impl PackFormat for Markdown {
    fn format_repomap(&self, pack: &RepoMapPack, max_tokens: usize) -> Result<Truncated, PuiError> {
        or_minimal_markdown(pack.render_markdown(max_tokens), pack.schema_version, &pack.index_version)
    }

    fn format_zoom(&self, pack: &ZoomPack, max_tokens: usize) -> Result<Truncated, PuiError> {
        or_minimal_markdown(pack.render_markdown(max_tokens), pack.schema_version, &pack.index_version)
    }

    fn format_impact(&self, pack: &ImpactPack, max_tokens: usize) -> Result<Truncated, PuiError> {
        or_minimal_markdown(pack.render_markdown(max_tokens), pack.schema_version, &pack.index_version)
    }
}

/// The structured form: a top-level `{schema_version, type, metadata,
/// ...sections}` JSON document (spec §6), token-estimated the same way as
/// Markdown so `--max-tokens` means the same thing in both formats.
pub struct Structured;

impl PackFormat for Structured {
    fn format_repomap(&self, pack: &RepoMapPack, max_tokens: usize) -> Result<Truncated, PuiError> {
        or_minimal_json(pack.render_json(max_tokens), pack.schema_version, &pack.index_version)
    }

    fn format_zoom(&self, pack: &ZoomPack, max_tokens: usize) -> Result<Truncated, PuiError> {
        or_minimal_json(pack.render_json(max_tokens), pack.schema_version, &pack.index_version)
    }

    fn format_impact(&self, pack: &ImpactPack, max_tokens: usize) -> Result<Truncated, PuiError> {
        or_minimal_json(pack.render_json(max_tokens), pack.schema_version, &pack.index_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_repomap() -> RepoMapPack {
        RepoMapPack {
            schema_version: 1,
            index_version: "deadbeef".to_string(),
            total_files: 1,
            total_symbols: 1,
            languages: vec!["python".to_string()],
            directories: vec![],
            module_deps: vec![],
            symbol_index: vec![],
            key_relationships: vec![],
            focus: None,
        }
    }

    #[test]
    fn test_markdown_falls_back_to_minimal_pack_on_budget_too_small() {
        let pack = tiny_repomap();
        let result = Markdown.format_repomap(&pack, 1).unwrap();
        assert!(result.text.contains("schema_version=1"));
        assert!(result.text.contains("budget too small"));
    }

    #[test]
    fn test_structured_falls_back_to_minimal_pack_on_budget_too_small() {
        let pack = tiny_repomap();
        let result = Structured.format_repomap(&pack, 1).unwrap();
        let value: serde_json::Value = serde_json::from_str(&result.text).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert!(value["error"].as_str().unwrap().contains("budget too small"));
    }
}
