use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Static analysis for React/Express codebases.
///
/// flowgraph scans a project's JavaScript/TypeScript sources and emits a
/// dependency graph of components, hooks, and contexts, or infers the
/// request fields an Express route handler actually reads.
#[derive(Parser, Debug)]
#[command(
    name = "flowgraph",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a project directory and emit the component/hook/context
    /// dependency graph as JSON on stdout.
    Graph {
        /// Path to the project root to analyze.
        path: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Infer the required request fields (params, query, body, headers) for
    /// every Express route registered in a single file.
    Routes {
        /// Path to the source file containing route registrations.
        file: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Classify the symbols of a single file, emitted in the same graph JSON
    /// shape with one file node.
    Symbols {
        /// Path to the source file to classify.
        file: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
}
