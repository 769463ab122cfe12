//! Per-file resolution and extraction engine.
//!
//! One parsed file in, one [`FileAnalysis`] out. Stages run in a fixed order
//! (imports, symbols, calls, endpoints, clients, protocols, tests) and never
//! share state across files.

pub mod calls;
pub mod clients;
pub mod diagnostic;
pub mod endpoints;
pub mod expr;
pub mod imports;
pub mod protocols;
pub mod symbols;
pub mod test_cases;

pub use calls::{CallKind, CallSite, CallTarget, ModuleCall, ResolvedCalls, UnresolvedReason};
pub use clients::{ClientCall, PathExpr};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use endpoints::{Endpoint, Framework};
pub use imports::{Import, ImportMap};
pub use protocols::{Implementer, MatchKind, ProtocolDef};
pub use symbols::{Symbol, SymbolKind, SymbolTable};
pub use test_cases::{TestCase, TestKind, TestOptions};

use crate::parse::SyntaxTree;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Knobs that change what the engine recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Top-level packages treated as HTTP client libraries.
    pub client_libraries: Vec<String>,
    pub tests: TestOptions,
    /// Only classes deriving from `Protocol` count as protocol definitions.
    pub require_protocol_base: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            client_libraries: clients::DEFAULT_CLIENT_LIBRARIES
                .iter()
                .map(|l| l.to_string())
                .collect(),
            tests: TestOptions::default(),
            require_protocol_base: false,
        }
    }
}

/// Everything extracted from one file. Facts are sorted by source position.
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub imports: ImportMap,
    #[serde(flatten)]
    pub symbols: SymbolTable,
    pub calls: Vec<CallSite>,
    pub endpoints: Vec<Endpoint>,
    pub client_calls: Vec<ClientCall>,
    pub protocols: Vec<ProtocolDef>,
    pub implementers: Vec<Implementer>,
    pub tests: Vec<TestCase>,
    /// Structural diagnostics; moved to the project list on aggregation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalysisOptions,
}

impl Analyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze one parsed file. `Err` only for file-level failures; anything
    /// narrower becomes a structural diagnostic inside the result.
    pub fn analyze(&self, path: &Path, tree: &SyntaxTree) -> Result<FileAnalysis, Diagnostic> {
        if std::str::from_utf8(tree.source()).is_err() {
            return Err(Diagnostic::file_level(path, "source is not valid UTF-8"));
        }
        if is_unrecoverable(tree) {
            return Err(Diagnostic::file_level(path, "no recoverable Python syntax"));
        }

        let mut diagnostics = Vec::new();
        let imports = imports::collect_imports(path, tree, &mut diagnostics);
        let symbols = symbols::build_symbols(path, tree, &mut diagnostics);
        let resolved = calls::resolve_calls(tree, &symbols, &imports);
        let endpoints = endpoints::extract_endpoints(path, &symbols, &imports, &mut diagnostics);
        let client_calls = clients::detect_client_calls(&resolved, &self.options.client_libraries);
        let calls = resolved.calls;
        let (protocols, implementers) =
            protocols::extract_protocols(&symbols, self.options.require_protocol_base);
        let tests = test_cases::detect_tests(&symbols, &self.options.tests);

        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        diagnostics.dedup();

        tracing::debug!(
            file = %path.display(),
            symbols = symbols.len(),
            calls = calls.len(),
            endpoints = endpoints.len(),
            client_calls = client_calls.len(),
            diagnostics = diagnostics.len(),
            "analyzed file"
        );

        Ok(FileAnalysis {
            path: path.to_path_buf(),
            imports,
            symbols,
            calls,
            endpoints,
            client_calls,
            protocols,
            implementers,
            tests,
            diagnostics,
        })
    }
}

/// Analyze one parsed file with default options.
pub fn analyze_file(path: &Path, tree: &SyntaxTree) -> Result<FileAnalysis, Diagnostic> {
    Analyzer::default().analyze(path, tree)
}

/// A non-empty file where tree-sitter recovered nothing but ERROR nodes.
fn is_unrecoverable(tree: &SyntaxTree) -> bool {
    let root = tree.root();
    if root.is_error() {
        return true;
    }
    if !tree.has_errors() {
        return false;
    }
    let statements = crate::parse::common::named_children(root);
    !statements.is_empty() && statements.iter().all(|s| s.is_error())
}
