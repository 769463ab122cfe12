use crate::errors::{PysurveyError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

pub const IGNORE_FILE_NAME: &str = ".pysurveyignore";

/// A `.pysurveyignore` file compiled with gitignore semantics.
///
/// Patterns are anchored at the directory holding the file, so `gen/` only
/// matches under that directory and `!gen/keep.py` re-includes a file.
#[derive(Debug, Clone)]
pub struct IgnoreFile {
    path: PathBuf,
    patterns: Vec<String>,
    matcher: Gitignore,
}

impl IgnoreFile {
    /// Nearest `.pysurveyignore` at or above `start`.
    pub fn discover(start: &Path) -> Result<Option<Self>> {
        match start
            .ancestors()
            .map(|dir| dir.join(IGNORE_FILE_NAME))
            .find(|candidate| candidate.is_file())
        {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PysurveyError::Config(format!("Could not read {}: {e}", path.display()))
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));

        let mut builder = GitignoreBuilder::new(root);
        let mut patterns = Vec::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match builder.add_line(Some(path.to_path_buf()), line) {
                Ok(_) => patterns.push(line.to_string()),
                Err(e) => tracing::warn!(file = %path.display(), "skipping ignore pattern: {e}"),
            }
        }
        let matcher = builder.build().map_err(|e| {
            PysurveyError::Config(format!("Invalid ignore file {}: {e}", path.display()))
        })?;

        tracing::debug!(file = %path.display(), patterns = patterns.len(), "loaded ignore file");
        Ok(Self {
            path: path.to_path_buf(),
            patterns,
            matcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepted patterns in file order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `file` or one of its parent directories is ignored. Files
    /// outside the ignore file's directory are never ignored.
    pub fn is_ignored(&self, file: &Path) -> bool {
        if !file.starts_with(self.matcher.path()) {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(file, false)
            .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_ignore(dir: &Path, content: &str) -> IgnoreFile {
        std::fs::write(dir.join(IGNORE_FILE_NAME), content).unwrap();
        IgnoreFile::load(&dir.join(IGNORE_FILE_NAME)).unwrap()
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let ignore = write_ignore(
            tmp.path(),
            "# generated code\nvendor/\n\n*_pb2.py\n  # indented comment\n",
        );
        assert_eq!(ignore.patterns(), &["vendor/", "*_pb2.py"]);
    }

    #[test]
    fn directory_patterns_cover_nested_files() {
        let tmp = tempfile::tempdir().unwrap();
        let ignore = write_ignore(tmp.path(), "build/\n");
        assert!(ignore.is_ignored(&tmp.path().join("build/lib/app.py")));
        assert!(!ignore.is_ignored(&tmp.path().join("src/build.py")));
    }

    #[test]
    fn negation_reincludes_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ignore = write_ignore(tmp.path(), "gen/*.py\n!gen/keep.py\n");
        assert!(ignore.is_ignored(&tmp.path().join("gen/api_pb2.py")));
        assert!(!ignore.is_ignored(&tmp.path().join("gen/keep.py")));
    }

    #[test]
    fn basename_patterns_match_at_any_depth() {
        let tmp = tempfile::tempdir().unwrap();
        let ignore = write_ignore(tmp.path(), "*_pb2.py\n");
        assert!(ignore.is_ignored(&tmp.path().join("proto/v1/users_pb2.py")));
        assert!(!ignore.is_ignored(&tmp.path().join("proto/v1/users.py")));
    }

    #[test]
    fn files_outside_the_root_are_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        let ignore = write_ignore(&project, "*.py\n");
        assert!(!ignore.is_ignored(&tmp.path().join("other/main.py")));
    }

    #[test]
    fn discover_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(IGNORE_FILE_NAME), "vendor/\n").unwrap();
        let nested = tmp.path().join("pkg").join("sub");
        std::fs::create_dir_all(&nested).unwrap();

        let ignore = IgnoreFile::discover(&nested).unwrap().unwrap();
        assert_eq!(ignore.path(), tmp.path().join(IGNORE_FILE_NAME));
        assert!(ignore.is_ignored(&tmp.path().join("vendor/six.py")));
    }

    #[test]
    fn no_ignore_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(IgnoreFile::discover(tmp.path()).unwrap().is_none());
    }
}
