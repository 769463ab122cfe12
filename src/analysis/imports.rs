use crate::analysis::diagnostic::Diagnostic;
use crate::parse::common::{named_children, node_text};
use crate::parse::{Position, PythonParser, SyntaxTree};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use streaming_iterator::StreamingIterator;

/// One name bound by an import statement.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Import {
    pub local_name: String,
    /// Module as written, relative dots included (`os.path`, `..pkg`).
    pub origin_module: String,
    /// Imported symbol for `from X import y`; `None` for whole-module imports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_symbol: Option<String>,
    pub is_aliased: bool,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WildcardImport {
    pub module: String,
    pub position: Position,
}

/// Local name → origin, for the top-level imports of one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportMap {
    pub bindings: BTreeMap<String, Import>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wildcards: Vec<WildcardImport>,
    /// Every dotted path named by an unaliased `import a.b.c`.
    #[serde(skip)]
    module_paths: BTreeSet<String>,
}

impl ImportMap {
    pub fn get(&self, local_name: &str) -> Option<&Import> {
        self.bindings.get(local_name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.wildcards.is_empty()
    }

    /// True when any import (wildcards included) comes from the top-level package `root`.
    pub fn imports_package(&self, root: &str) -> bool {
        let matches = |module: &str| module.split('.').next() == Some(root);
        self.bindings.values().any(|i| matches(&i.origin_module))
            || self.wildcards.iter().any(|w| matches(&w.module))
    }

    /// Resolve a dotted name chain rooted at an imported local name.
    ///
    /// Returns the origin module and the remaining attribute path, if any:
    /// `os.path.join` after `import os` is `("os", Some("path.join"))`,
    /// `a.b.c.f` after `import a.b.c` is `("a.b.c", Some("f"))`.
    pub fn resolve(&self, chain: &[String]) -> Option<(String, Option<String>)> {
        let (head, rest) = chain.split_first()?;
        let import = self.bindings.get(head)?;
        let tail = |parts: &[String]| (!parts.is_empty()).then(|| parts.join("."));

        if let Some(symbol) = &import.origin_symbol {
            let mut name = symbol.clone();
            for part in rest {
                name.push('.');
                name.push_str(part);
            }
            return Some((import.origin_module.clone(), Some(name)));
        }

        if import.is_aliased {
            return Some((import.origin_module.clone(), tail(rest)));
        }

        // Unaliased `import a.b.c` binds `a`; the longest imported prefix names the module.
        for split in (1..chain.len()).rev() {
            let prefix = chain[..split].join(".");
            if split == 1 || self.module_paths.contains(&prefix) {
                return Some((prefix, tail(&chain[split..])));
            }
        }
        Some((head.clone(), None))
    }

    fn bind(&mut self, import: Import) {
        self.bindings.insert(import.local_name.clone(), import);
    }
}

/// Build the import map from the file's top-level imports, including those nested
/// in module-level `if`/`try`/`with` blocks. Later bindings replace earlier ones.
pub fn collect_imports(path: &Path, tree: &SyntaxTree, diagnostics: &mut Vec<Diagnostic>) -> ImportMap {
    let source = tree.source();
    let query = PythonParser::import_query();

    let mut map = ImportMap::default();
    let mut cursor = tree_sitter::QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root(), source);
    while let Some(m) = matches.next() {
        for capture in m.captures {
            let node = capture.node;
            if inside_definition(node) {
                continue;
            }
            if node.has_error() {
                diagnostics.push(Diagnostic::structural(
                    path,
                    Position::of(node).line,
                    format!("skipped malformed import `{}`", first_line(node_text(node, source))),
                ));
                continue;
            }
            match node.kind() {
                "import_statement" => collect_import(node, source, path, &mut map, diagnostics),
                _ => collect_from_import(node, source, path, &mut map, diagnostics),
            }
        }
    }
    map
}

fn collect_import(
    node: tree_sitter::Node<'_>,
    source: &[u8],
    path: &Path,
    map: &mut ImportMap,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for name_node in field_nodes(node, "name") {
        match name_node.kind() {
            "dotted_name" => {
                let dotted = node_text(name_node, source).to_string();
                let local = dotted.split('.').next().unwrap_or_default().to_string();
                map.module_paths.insert(dotted.clone());
                map.bind(Import {
                    local_name: local,
                    origin_module: dotted,
                    origin_symbol: None,
                    is_aliased: false,
                    position: Position::of(name_node),
                });
            }
            "aliased_import" => match aliased_parts(name_node, source) {
                Some((module, alias)) => map.bind(Import {
                    local_name: alias,
                    origin_module: module,
                    origin_symbol: None,
                    is_aliased: true,
                    position: Position::of(name_node),
                }),
                None => diagnostics.push(unrecognized(path, name_node, source)),
            },
            _ => diagnostics.push(unrecognized(path, name_node, source)),
        }
    }
}

fn collect_from_import(
    node: tree_sitter::Node<'_>,
    source: &[u8],
    path: &Path,
    map: &mut ImportMap,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        diagnostics.push(unrecognized(path, node, source));
        return;
    };
    let module: String = node_text(module_node, source)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut bound_any = false;
    if named_children(node)
        .iter()
        .any(|child| child.kind() == "wildcard_import")
    {
        map.wildcards.push(WildcardImport {
            module: module.clone(),
            position: Position::of(node),
        });
        bound_any = true;
    }

    for name_node in field_nodes(node, "name") {
        let parts = match name_node.kind() {
            "dotted_name" => {
                let name = node_text(name_node, source).to_string();
                Some((name.clone(), name, false))
            }
            "aliased_import" => {
                aliased_parts(name_node, source).map(|(name, alias)| (name, alias, true))
            }
            _ => None,
        };
        match parts {
            Some((symbol, local, is_aliased)) => {
                bound_any = true;
                map.bind(Import {
                    local_name: local,
                    origin_module: module.clone(),
                    origin_symbol: Some(symbol),
                    is_aliased,
                    position: Position::of(name_node),
                });
            }
            None => diagnostics.push(unrecognized(path, name_node, source)),
        }
    }

    if !bound_any {
        diagnostics.push(unrecognized(path, node, source));
    }
}

fn aliased_parts(node: tree_sitter::Node<'_>, source: &[u8]) -> Option<(String, String)> {
    let name = node.child_by_field_name("name")?;
    let alias = node.child_by_field_name("alias")?;
    Some((
        node_text(name, source).to_string(),
        node_text(alias, source).to_string(),
    ))
}

fn field_nodes<'t>(node: tree_sitter::Node<'t>, field: &str) -> Vec<tree_sitter::Node<'t>> {
    let mut cursor = node.walk();
    let nodes = node.children_by_field_name(field, &mut cursor).collect();
    nodes
}

fn inside_definition(node: tree_sitter::Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if matches!(
            parent.kind(),
            "function_definition" | "class_definition" | "lambda"
        ) {
            return true;
        }
        current = parent.parent();
    }
    false
}

fn unrecognized(path: &Path, node: tree_sitter::Node<'_>, source: &[u8]) -> Diagnostic {
    Diagnostic::structural(
        path,
        Position::of(node).line,
        format!(
            "skipped unrecognized import shape `{}`",
            first_line(node_text(node, source))
        ),
    )
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
