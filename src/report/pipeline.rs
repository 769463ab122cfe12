use crate::analysis::{Analyzer, Diagnostic};
use crate::errors::Result;
use crate::parse::PythonParser;
use crate::report::aggregate::{aggregate, FileOutcome, ProjectReport};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the caller and workers.
///
/// Checked before each file starts; a file already in progress always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs the analyzer over many files on a bounded worker pool.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    analyzer: Analyzer,
    /// Worker threads; 0 lets rayon pick one per core.
    jobs: usize,
}

impl Pipeline {
    pub fn new(analyzer: Analyzer, jobs: usize) -> Self {
        Self { analyzer, jobs }
    }

    /// Analyze `files` (absolute paths under `root`) and aggregate the results.
    /// Report paths are relative to `root`. `on_done` fires once per file.
    pub fn run(
        &self,
        files: &[PathBuf],
        root: &Path,
        cancel: &CancelToken,
        on_done: &(dyn Fn() + Sync),
    ) -> Result<ProjectReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()?;

        // Each worker owns its parser (tree-sitter parsers are not Sync).
        let outcomes: Vec<FileOutcome> = pool.install(|| {
            files
                .par_iter()
                .map_init(PythonParser::new, |parser, file| {
                    let outcome = self.analyze_one(parser, file, root, cancel);
                    on_done();
                    outcome
                })
                .collect()
        });

        let report = aggregate(outcomes);
        tracing::info!(
            analyzed = report.totals.files_analyzed,
            failed = report.totals.files_failed,
            skipped = report.totals.files_skipped,
            "analysis finished"
        );
        Ok(report)
    }

    fn analyze_one(
        &self,
        parser: &mut PythonParser,
        file: &Path,
        root: &Path,
        cancel: &CancelToken,
    ) -> FileOutcome {
        let relative = file.strip_prefix(root).unwrap_or(file).to_path_buf();
        if cancel.is_cancelled() {
            return FileOutcome::Skipped(relative);
        }

        let source = match std::fs::read(file) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", file.display(), e);
                return FileOutcome::Failed(Diagnostic::file_level(
                    &relative,
                    format!("could not read file: {e}"),
                ));
            }
        };

        let Some(tree) = parser.parse(source) else {
            tracing::warn!("Skipping {}: parser produced no tree", file.display());
            return FileOutcome::Failed(Diagnostic::file_level(&relative, "could not parse file"));
        };

        match self.analyzer.analyze(&relative, &tree) {
            Ok(analysis) => FileOutcome::Analyzed(analysis),
            Err(diagnostic) => {
                tracing::warn!("Skipping {}: {}", file.display(), diagnostic.message);
                FileOutcome::Failed(diagnostic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn write_files(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, body)| {
                let path = dir.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(&path, body).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn analyzes_every_file_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_files(
            dir.path(),
            &[
                ("pkg/b.py", "def b():\n    pass\n"),
                ("a.py", "import requests\n\ndef a():\n    requests.get('/x')\n"),
            ],
        );
        let done = AtomicUsize::new(0);
        let report = Pipeline::new(Analyzer::default(), 2)
            .run(&files, dir.path(), &CancelToken::new(), &|| {
                done.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(done.load(Ordering::Relaxed), 2);
        let paths: Vec<&Path> = report.files.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(paths, vec![Path::new("a.py"), Path::new("pkg/b.py")]);
        assert_eq!(report.totals.client_calls, 1);
    }

    #[test]
    fn unreadable_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = write_files(dir.path(), &[("ok.py", "x = 1\n")]);
        files.push(dir.path().join("missing.py"));
        let report = Pipeline::default()
            .run(&files, dir.path(), &CancelToken::new(), &|| {})
            .unwrap();
        assert_eq!(report.totals.files_analyzed, 1);
        assert_eq!(report.totals.files_failed, 1);
        assert_eq!(report.diagnostics[0].file, Path::new("missing.py"));
    }

    #[test]
    fn cancelled_run_skips_unstarted_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_files(dir.path(), &[("a.py", ""), ("b.py", "")]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = Pipeline::default()
            .run(&files, dir.path(), &cancel, &|| {})
            .unwrap();
        assert!(report.cancelled);
        assert!(report.files.is_empty());
        assert_eq!(report.skipped.len(), 2);
    }
}
