pub mod analyze;
pub mod config;
pub mod graph;

use crate::errors::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "pysurvey",
    version,
    about = "Static architecture facts for Python codebases"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract symbols, calls, endpoints, client calls, protocols and tests
    Analyze(analyze::AnalyzeArgs),
    /// Export the resolved call graph
    Graph(graph::GraphArgs),
    /// Inspect resolved configuration
    Config(config::ConfigArgs),
}

/// Dispatch to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze(args) => analyze::run(&args),
        Commands::Graph(args) => graph::run(&args),
        Commands::Config(args) => config::run(&args),
    }
}
