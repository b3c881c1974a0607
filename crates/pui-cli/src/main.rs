//! pui CLI — a token-budgeted code intelligence index for LLM coding agents.
//!
//! This binary provides the `pui` command with subcommands for indexing a
//! repository and querying the resulting RepoMap/Zoom/Impact packs. See
//! `pui --help` for usage.

use clap::Parser;

mod cli_args;
mod commands;

use cli_args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Index { force, stats } => commands::index::run(force, stats),
        Commands::Repomap { depth, focus, max_tokens, format } => {
            commands::repomap::run(depth, focus, max_tokens, format)
        }
        Commands::Find { query, limit, format } => commands::find::run(query, limit, format),
        Commands::Zoom { target, max_tokens, format } => commands::zoom::run(target, max_tokens, format),
        Commands::Graph { symbol, depth, direction, format } => {
            commands::graph::run(symbol, depth, direction, format)
        }
        Commands::Impact { files, git_diff, include_tests, max_tokens } => {
            commands::impact::run(files, git_diff, include_tests, max_tokens)
        }
    };

    std::process::exit(exit_code);
}
