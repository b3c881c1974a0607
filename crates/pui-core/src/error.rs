//! Error taxonomy shared across pui crates (spec §7).

/// Errors raised by the core storage and path layers.
///
/// Each variant corresponds to one of the error kinds in the spec's
/// error-handling table; the policy for each (reject, skip-and-log,
/// refuse-to-open, …) lives with its caller, not here.
#[derive(Debug, thiserror::Error)]
pub enum PuiError {
    #[error("path escapes repository root: {0}")]
    PathEscapesRoot(String),

    #[error("file too large: {path} ({size} bytes > limit {limit})")]
    FileTooLarge {
        path: String,
        size: u64,
        limit: u64,
    },

    #[error("store is corrupt: {0}")]
    StoreCorrupt(String),

    #[error("schema too new: on-disk v{found}, supported up to v{supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("budget too small: mandatory section needs {needed} tokens, budget is {budget}")]
    BudgetTooSmall { needed: usize, budget: usize },

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for PuiError {
    fn from(e: rusqlite::Error) -> Self {
        PuiError::Database(e.to_string())
    }
}

impl From<std::io::Error> for PuiError {
    fn from(e: std::io::Error) -> Self {
        PuiError::Io(e.to_string())
    }
}

impl PuiError {
    /// The process exit code this error maps to, per spec §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            PuiError::PathEscapesRoot(_) => 2,
            PuiError::FileTooLarge { .. } => 0, // skip + log, not fatal
            PuiError::StoreCorrupt(_) => 3,
            PuiError::SchemaTooNew { .. } => 4,
            PuiError::BudgetTooSmall { .. } => 0, // minimal pack still returned
            PuiError::SymbolNotFound(_) => 0, // structured empty result
            PuiError::Cancelled => 5,
            PuiError::Database(_) | PuiError::Internal(_) | PuiError::Io(_) => 3,
        }
    }
}
