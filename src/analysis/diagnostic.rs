use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A construct was skipped; the rest of the file was still analyzed.
    Structural,
    /// The file could not be analyzed at all.
    FileLevel,
}

/// A non-fatal finding attached to one file.
#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
#[error("{}{}: {message}", .file.display(), .line.map(|l| format!(":{l}")).unwrap_or_default())]
pub struct Diagnostic {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn structural(file: &Path, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            line: Some(line),
            kind: DiagnosticKind::Structural,
            message: message.into(),
        }
    }

    pub fn file_level(file: &Path, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            line: None,
            kind: DiagnosticKind::FileLevel,
            message: message.into(),
        }
    }

    /// Ordering key used by the aggregator.
    pub(crate) fn sort_key(&self) -> (&Path, usize, DiagnosticKind, &str) {
        (
            self.file.as_path(),
            self.line.unwrap_or(0),
            self.kind,
            self.message.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line() {
        let d = Diagnostic::structural(Path::new("app.py"), 12, "skipped ERROR node");
        assert_eq!(d.to_string(), "app.py:12: skipped ERROR node");
    }

    #[test]
    fn display_without_line() {
        let d = Diagnostic::file_level(Path::new("bad.py"), "could not read file");
        assert_eq!(d.to_string(), "bad.py: could not read file");
    }
}
