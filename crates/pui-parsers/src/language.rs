//! Parser Facade (spec §4.4): a polymorphic capability over
//! {language → parse(source) → tree}.

use std::path::Path;

use pui_core::types::Language;
use tree_sitter::{Language as TsLanguage, Parser};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("language error: {0}")]
    Language(String),
    #[error("parse failed")]
    ParseFailed,
}

/// Extension-first language classification, with an optional caller
/// override map (spec §4.3 "user-overrideable map").
pub fn detect_language(path: &Path, overrides: &std::collections::HashMap<String, String>) -> Option<Language> {
    let ext = path.extension()?.to_str()?;
    if let Some(name) = overrides.get(ext) {
        return language_from_name(name);
    }
    Some(match ext {
        "py" | "pyi" => Language::Python,
        "js" | "mjs" | "cjs" | "jsx" => Language::Javascript,
        "ts" | "tsx" => Language::Typescript,
        "go" => Language::Go,
        "rs" => Language::Rust,
        "c" | "h" => Language::C,
        "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
        _ => return None,
    })
}

fn language_from_name(name: &str) -> Option<Language> {
    Some(match name {
        "python" => Language::Python,
        "javascript" => Language::Javascript,
        "typescript" => Language::Typescript,
        "go" => Language::Go,
        "rust" => Language::Rust,
        "c" => Language::C,
        "cpp" => Language::Cpp,
        _ => return None,
    })
}

/// The tree-sitter grammar backing a given language. TSX is used for
/// `.tsx`/`.jsx` sources but is not a distinct [`Language`] variant.
pub fn grammar_for(lang: Language) -> TsLanguage {
    match lang {
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::Javascript => tree_sitter_javascript::LANGUAGE.into(),
        Language::Typescript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::C => tree_sitter_c::LANGUAGE.into(),
        Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
    }
}

pub struct TreeSitterParser {
    parser: Parser,
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSitterParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Parse `source` with the grammar for `lang`. The tree-sitter parser is
    /// incremental and error-recovering: a syntax error anywhere in the file
    /// still yields a tree, with error nodes marking the damaged regions.
    pub fn parse(&mut self, lang: Language, source: &[u8]) -> Result<tree_sitter::Tree, ParseError> {
        let grammar = grammar_for(lang);
        self.parser
            .set_language(&grammar)
            .map_err(|e| ParseError::Language(e.to_string()))?;
        self.parser.parse(source, None).ok_or(ParseError::ParseFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        let overrides = std::collections::HashMap::new();
        assert_eq!(detect_language(Path::new("a.py"), &overrides), Some(Language::Python));
        assert_eq!(detect_language(Path::new("a.rs"), &overrides), Some(Language::Rust));
        assert_eq!(detect_language(Path::new("a.tsx"), &overrides), Some(Language::Typescript));
        assert_eq!(detect_language(Path::new("a.unknown"), &overrides), None);
    }

    #[test]
    fn test_override_takes_precedence() {
        let mut overrides = std::collections::HashMap::new();
        overrides.insert("txt".to_string(), "python".to_string());
        assert_eq!(detect_language(Path::new("a.txt"), &overrides), Some(Language::Python));
    }

    #[test]
    fn test_parse_simple_python() {
        let mut parser = TreeSitterParser::new();
        let tree = parser.parse(Language::Python, b"def foo():\n    pass\n").unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_parse_recovers_from_syntax_error() {
        let mut parser = TreeSitterParser::new();
        // Unbalanced parens -- still yields a tree (spec §4.4 error-recovering).
        let tree = parser.parse(Language::Rust, b"fn foo( {\n").unwrap();
        assert!(tree.root_node().has_error());
    }
}
