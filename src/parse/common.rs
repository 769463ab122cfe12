use serde::Serialize;
use std::path::PathBuf;

/// Start position of a syntax node within its file.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// 1-indexed line
    pub line: usize,
    /// 0-indexed column (bytes)
    pub column: usize,
}

impl Position {
    pub fn of(node: tree_sitter::Node<'_>) -> Self {
        let point = node.start_position();
        Self {
            line: point.row + 1,
            column: point.column,
        }
    }
}

/// Source location for edge provenance
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

/// Text of a node, or the empty string when the bytes are not valid UTF-8.
pub fn node_text<'s>(node: tree_sitter::Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or_default()
}

/// Collect the named children of a node, comments excluded, so callers can recurse freely.
pub fn named_children(node: tree_sitter::Node<'_>) -> Vec<tree_sitter::Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// True when the node has an anonymous `async` keyword child.
pub fn has_async_keyword(node: tree_sitter::Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == "async");
    found
}

/// Last line covered by a node (1-indexed).
pub fn end_line(node: tree_sitter::Node<'_>) -> usize {
    node.end_position().row + 1
}
