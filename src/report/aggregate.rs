use crate::analysis::{CallKind, Diagnostic, FileAnalysis};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What happened to one input file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Analyzed(FileAnalysis),
    /// Unreadable or unparseable; carries the file-level diagnostic.
    Failed(Diagnostic),
    /// Never started because the run was cancelled.
    Skipped(PathBuf),
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Analyzed(analysis) => &analysis.path,
            FileOutcome::Failed(diagnostic) => &diagnostic.file,
            FileOutcome::Skipped(path) => path,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FileOutcome::Analyzed(_) => 0,
            FileOutcome::Failed(_) => 1,
            FileOutcome::Skipped(_) => 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Totals {
    pub files_analyzed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub symbols: usize,
    pub calls: usize,
    pub unresolved_calls: usize,
    pub endpoints: usize,
    pub client_calls: usize,
    pub protocols: usize,
    pub implementers: usize,
    pub tests: usize,
    pub diagnostics: usize,
}

/// Project-wide result: files sorted by path, diagnostics flattened.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectReport {
    pub files: Vec<FileAnalysis>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<PathBuf>,
    pub totals: Totals,
    /// Some files were never started because the run was cancelled.
    pub cancelled: bool,
}

impl ProjectReport {
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&FileAnalysis> {
        let path = path.as_ref();
        self.files.iter().find(|f| f.path == path)
    }
}

/// Merge per-file outcomes into one report. The result does not depend on
/// the order of `outcomes`.
pub fn aggregate(mut outcomes: Vec<FileOutcome>) -> ProjectReport {
    outcomes.sort_by(|a, b| a.path().cmp(b.path()).then(a.rank().cmp(&b.rank())));
    outcomes.dedup_by(|later, earlier| later.path() == earlier.path());

    let mut report = ProjectReport::default();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Analyzed(mut analysis) => {
                report.diagnostics.append(&mut analysis.diagnostics);
                report.files.push(analysis);
            }
            FileOutcome::Failed(diagnostic) => {
                report.totals.files_failed += 1;
                report.diagnostics.push(diagnostic);
            }
            FileOutcome::Skipped(path) => report.skipped.push(path),
        }
    }
    report
        .diagnostics
        .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    report.cancelled = !report.skipped.is_empty();
    report.totals = totals(&report);
    report
}

fn totals(report: &ProjectReport) -> Totals {
    let files = &report.files;
    Totals {
        files_analyzed: files.len(),
        files_failed: report.totals.files_failed,
        files_skipped: report.skipped.len(),
        symbols: files.iter().map(|f| f.symbols.len()).sum(),
        calls: files.iter().map(|f| f.calls.len()).sum(),
        unresolved_calls: files
            .iter()
            .flat_map(|f| &f.calls)
            .filter(|c| c.kind == CallKind::Unresolved)
            .count(),
        endpoints: files.iter().map(|f| f.endpoints.len()).sum(),
        client_calls: files.iter().map(|f| f.client_calls.len()).sum(),
        protocols: files.iter().map(|f| f.protocols.len()).sum(),
        implementers: files.iter().map(|f| f.implementers.len()).sum(),
        tests: files.iter().map(|f| f.tests.len()).sum(),
        diagnostics: report.diagnostics.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_file;
    use crate::parse::PythonParser;
    use pretty_assertions::assert_eq;

    fn analyzed(path: &str, src: &str) -> FileOutcome {
        let tree = PythonParser::new().parse(src).unwrap();
        FileOutcome::Analyzed(analyze_file(Path::new(path), &tree).unwrap())
    }

    fn paths(report: &ProjectReport) -> Vec<&Path> {
        report.files.iter().map(|f| f.path.as_path()).collect()
    }

    #[test]
    fn sorts_files_by_path() {
        let report = aggregate(vec![
            analyzed("b.py", "def b():\n    pass\n"),
            analyzed("a.py", "def a():\n    pass\n"),
            FileOutcome::Failed(Diagnostic::file_level(Path::new("c.py"), "could not read file")),
        ]);
        assert_eq!(paths(&report), vec![Path::new("a.py"), Path::new("b.py")]);
        assert_eq!(report.totals.files_analyzed, 2);
        assert_eq!(report.totals.files_failed, 1);
        assert_eq!(report.totals.symbols, 2);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(!report.cancelled);
    }

    #[test]
    fn moves_file_diagnostics_to_project() {
        let report = aggregate(vec![
            analyzed("z.py", "@app.route('/x', methods=VERBS)\ndef x():\n    pass\n"),
            FileOutcome::Failed(Diagnostic::file_level(Path::new("a.py"), "unreadable")),
        ]);
        assert!(report.files[0].diagnostics.is_empty());
        let files: Vec<&Path> = report.diagnostics.iter().map(|d| d.file.as_path()).collect();
        assert_eq!(files, vec![Path::new("a.py"), Path::new("z.py")]);
    }

    #[test]
    fn skipped_files_mark_cancellation() {
        let report = aggregate(vec![
            analyzed("a.py", ""),
            FileOutcome::Skipped(PathBuf::from("b.py")),
        ]);
        assert!(report.cancelled);
        assert_eq!(report.skipped, vec![PathBuf::from("b.py")]);
        assert_eq!(report.totals.files_skipped, 1);
    }

    #[test]
    fn duplicate_paths_collapse() {
        let report = aggregate(vec![
            analyzed("a.py", "def f():\n    pass\n"),
            analyzed("a.py", "def f():\n    pass\n"),
        ]);
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn counts_unresolved_calls() {
        let report = aggregate(vec![analyzed(
            "m.py",
            "def f():\n    g()\n    print(1)\n\ndef g():\n    pass\n",
        )]);
        assert_eq!(report.totals.calls, 2);
        assert_eq!(report.totals.unresolved_calls, 1);
    }
}
