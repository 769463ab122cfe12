//! Static architecture facts for Python codebases.
//!
//! Each file is parsed with tree-sitter and analyzed on its own: symbols,
//! imports, resolved call sites, HTTP endpoints, outbound client calls,
//! protocols and tests. [`report::aggregate`] merges the per-file results
//! into one deterministic [`report::ProjectReport`].

pub mod analysis;
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod output;
pub mod parse;
pub mod report;
pub mod walk;

pub use analysis::{analyze_file, AnalysisOptions, Analyzer, Diagnostic, FileAnalysis};
pub use errors::{PysurveyError, Result};
pub use parse::{PythonParser, SyntaxTree};
pub use report::{aggregate, CancelToken, FileOutcome, Pipeline, ProjectReport};
