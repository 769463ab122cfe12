use std::fmt;
use std::sync::LazyLock;

/// Import statements anywhere in a module; compiled once and shared by all workers.
static IMPORT_QUERY: LazyLock<tree_sitter::Query> = LazyLock::new(|| {
    tree_sitter::Query::new(
        &PythonParser::language(),
        "[(import_statement) (import_from_statement)] @import",
    )
    .expect("failed to compile Python import query")
});

/// A parsed Python file: the tree-sitter tree together with the bytes it was built from.
#[derive(Clone)]
pub struct SyntaxTree {
    source: Vec<u8>,
    tree: tree_sitter::Tree,
}

impl SyntaxTree {
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// True when tree-sitter had to insert ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("bytes", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

/// Thin wrapper over a tree-sitter parser configured for Python.
///
/// A `tree_sitter::Parser` is not `Sync`, so each worker thread owns one.
pub struct PythonParser {
    parser: tree_sitter::Parser,
}

impl PythonParser {
    pub fn new() -> Self {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&Self::language())
            .expect("failed to set Python language");
        Self { parser }
    }

    pub fn language() -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    pub fn import_query() -> &'static tree_sitter::Query {
        &IMPORT_QUERY
    }

    /// Parse a whole file. Returns `None` only if tree-sitter produced no tree at all.
    pub fn parse(&mut self, source: impl Into<Vec<u8>>) -> Option<SyntaxTree> {
        let source = source.into();
        let tree = self.parser.parse(&source, None)?;
        Some(SyntaxTree { source, tree })
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_module() {
        let tree = PythonParser::new().parse("import os\n").unwrap();
        assert_eq!(tree.root().kind(), "module");
        assert!(!tree.has_errors());
        assert_eq!(tree.source(), b"import os\n");
    }

    #[test]
    fn import_query_is_compiled_once() {
        let first = PythonParser::import_query();
        let second = PythonParser::import_query();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.capture_names(), &["import"]);
    }

    #[test]
    fn flags_broken_source() {
        let tree = PythonParser::new().parse("def broken(:\n    pass\n").unwrap();
        assert!(tree.has_errors());
    }
}
