use pui_core::types::Language;
use tree_sitter::{Language as TsLanguage, Query};

pub const PYTHON_QUERIES: &str = include_str!("python.scm");
pub const JAVASCRIPT_QUERIES: &str = include_str!("javascript.scm");
pub const TYPESCRIPT_QUERIES: &str = include_str!("typescript.scm");
pub const GO_QUERIES: &str = include_str!("go.scm");
pub const RUST_QUERIES: &str = include_str!("rust.scm");

/// Compile the named-capture query for `lang`. C/C++ have no query source:
/// they're indexed at file level only (spec §4.4), never asked to extract.
pub fn query_for_language(grammar: &TsLanguage, lang: Language) -> Result<Query, String> {
    let source = match lang {
        Language::Python => PYTHON_QUERIES,
        Language::Javascript => JAVASCRIPT_QUERIES,
        Language::Typescript => TYPESCRIPT_QUERIES,
        Language::Go => GO_QUERIES,
        Language::Rust => RUST_QUERIES,
        Language::C | Language::Cpp => {
            return Err(format!("{lang} has no extraction query (file-level only)"))
        }
    };
    Query::new(grammar, source).map_err(|e| format!("query compilation error for {lang}: {e}"))
}
