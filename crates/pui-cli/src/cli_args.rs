use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pui", version, about = "Token-budgeted code intelligence index for LLM coding agents")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run the indexer over the current repository
    Index {
        /// Re-parse every file, ignoring stored content hashes
        #[arg(long)]
        force: bool,
        /// Discover and hash files only, skip writing to the store
        #[arg(long)]
        stats: bool,
    },

    /// Generate a RepoMap pack
    Repomap {
        /// Traversal depth for key relationships around `--focus`
        #[arg(long, default_value = "2")]
        depth: u32,
        /// Restrict the map to a file or directory prefix
        #[arg(long)]
        focus: Option<String>,
        /// Token budget for the rendered pack
        #[arg(long)]
        max_tokens: Option<usize>,
        /// Output format
        #[arg(long, default_value = "markdown")]
        format: String,
    },

    /// Full-text search over indexed symbols
    Find {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format
        #[arg(long, default_value = "markdown")]
        format: String,
    },

    /// Generate a Zoom pack for a single symbol
    Zoom {
        /// Symbol id, name, or `path:line`
        target: String,
        /// Token budget for the rendered pack
        #[arg(long)]
        max_tokens: Option<usize>,
        /// Output format
        #[arg(long, default_value = "markdown")]
        format: String,
    },

    /// Traverse the call/import graph around a symbol
    Graph {
        /// Symbol id or name to center the traversal on
        #[arg(long)]
        symbol: String,
        /// Maximum traversal depth
        #[arg(long, default_value = "2")]
        depth: u32,
        /// Traversal direction
        #[arg(long, default_value = "both")]
        direction: String,
        /// Output format
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Generate an Impact pack for a change
    Impact {
        /// Changed file paths
        #[arg(long)]
        files: Vec<String>,
        /// A git diff range (e.g. `HEAD~1..HEAD`), mutually exclusive with `--files`
        #[arg(long)]
        git_diff: Option<String>,
        /// Include test files among ranked results
        #[arg(long)]
        include_tests: bool,
        /// Token budget for the rendered pack
        #[arg(long)]
        max_tokens: Option<usize>,
    },
}
