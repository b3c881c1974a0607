use serde::{Deserialize, Serialize};

/// Kind of a parsed source file's detected language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Javascript,
    Typescript,
    Go,
    Rust,
    C,
    Cpp,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Whether this language has full symbol/edge extraction, or is
    /// file-level only (spec §4.4: C/C++ is present but partial).
    pub fn has_full_extraction(&self) -> bool {
        !matches!(self, Language::C | Language::Cpp)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file tracked by the index (spec §3 `File`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRow {
    /// Repo-root-relative, forward-slash, NFC-normalized path. Unique.
    pub path: String,
    pub language: Option<Language>,
    /// Hex-encoded SHA-256 of the file's raw bytes.
    pub content_hash: String,
    pub size: u64,
    pub mtime: i64,
    pub indexed_at: i64,
}

/// Kind of a named definition (spec §3 `Symbol`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Interface,
    Enum,
    Variable,
    Module,
    Import,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
            SymbolKind::Module => "module",
            SymbolKind::Import => "import",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "class" => SymbolKind::Class,
            "struct" => SymbolKind::Struct,
            "interface" => SymbolKind::Interface,
            "enum" => SymbolKind::Enum,
            "variable" => SymbolKind::Variable,
            "module" => SymbolKind::Module,
            "import" => SymbolKind::Import,
            _ => return None,
        })
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named definition extracted from a file (spec §3 `Symbol`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Internal row id, assigned by the store.
    pub id: u64,
    /// Stable id derived from (path, kind, qualified_name, start line).
    /// Survives re-parse of an unchanged file.
    pub stable_id: String,
    pub file_path: String,
    pub kind: SymbolKind,
    pub name: String,
    /// Best-effort qualified name (e.g. `module.Class.method`).
    pub qualified_name: String,
    pub line_start: u32,
    pub line_end: u32,
    pub col_start: u32,
    pub col_end: u32,
    pub signature: String,
    pub docstring: Option<String>,
    /// Nearest enclosing definition, for nested symbols.
    pub parent_id: Option<u64>,
}

/// A concrete call occurrence in source (spec §3 `Callsite`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Callsite {
    pub id: u64,
    pub file_path: String,
    pub line: u32,
    pub col: u32,
    /// Raw callee expression, preserving qualification (`foo`, `obj.foo`, `Pkg::Bar`).
    pub callee_text: String,
    /// Innermost enclosing symbol id (the scope this call occurs in).
    pub enclosing_symbol_id: u64,
    /// Names imported into scope at this point, for resolver disambiguation.
    pub imports_in_scope: Vec<String>,
}

/// Kind of relationship between two symbols (spec §3 `Edge`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Call,
    Import,
    Inherit,
    Contain,
    ModuleDependsOn,
    Exports,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Call => "CALL",
            EdgeKind::Import => "IMPORT",
            EdgeKind::Inherit => "INHERIT",
            EdgeKind::Contain => "CONTAIN",
            EdgeKind::ModuleDependsOn => "MODULE_DEPENDS_ON",
            EdgeKind::Exports => "EXPORTS",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "CALL" => EdgeKind::Call,
            "IMPORT" => EdgeKind::Import,
            "INHERIT" => EdgeKind::Inherit,
            "CONTAIN" => EdgeKind::Contain,
            "MODULE_DEPENDS_ON" => EdgeKind::ModuleDependsOn,
            "EXPORTS" => EdgeKind::Exports,
            _ => return None,
        })
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an edge came from (spec §3 `provenance`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Heuristic,
    Resolved,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Heuristic => "heuristic",
            Provenance::Resolved => "resolved",
        }
    }
}

/// A typed relationship between two symbols (spec §3 `Edge`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: u64,
    pub source_id: u64,
    pub target_id: u64,
    pub kind: EdgeKind,
    /// Resolution confidence. 1.0 for resolved edges, [0.0, 0.95) for heuristic ones.
    pub confidence: f64,
    pub provenance: Provenance,
    pub origin_file: String,
    /// Free-form explanation of why this edge was created (e.g. which
    /// confidence band fired, or which module-grouping strategy matched).
    pub metadata: Option<String>,
}

/// Direction for edge traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Incoming,
    Outgoing,
    Both,
}

/// A fully-parsed file's extracted rows, ready for the replacement protocol.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    pub symbols: Vec<Symbol>,
    pub edges: Vec<Edge>,
    pub callsites: Vec<Callsite>,
    /// Raw import source text (e.g. `./util`, `requests`), kept out of
    /// `edges` because their targets aren't known until the indexer has
    /// seen every file (spec §4.5/§4.7). Cross-file resolution turns these
    /// into `IMPORT` edges (when a relative import resolves to a known
    /// file) and `ModuleDependsOn` edges (when it names another package);
    /// an import that resolves to neither is dropped rather than persisted
    /// as a dangling edge.
    pub raw_imports: Vec<String>,
}
