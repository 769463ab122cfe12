//! Scope tree of one file: classes, functions and methods, plus the
//! module-level bindings and calls that later stages pattern-match on.
//!
//! The builder never resolves identifiers. It records shapes as written.

use crate::analysis::diagnostic::Diagnostic;
use crate::analysis::expr::{self, Argument};
use crate::parse::common::{end_line, has_async_keyword, named_children, node_text};
use crate::parse::{Position, SyntaxTree};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Index into [`SymbolTable::symbols`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
}

/// `@callee` or `@callee(args...)`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Decorator {
    pub callee: String,
    pub is_call: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    pub position: Position,
}

impl Decorator {
    /// Last segment of the callee path (`app.route` → `route`).
    pub fn attribute(&self) -> &str {
        self.callee.rsplit('.').next().unwrap_or(&self.callee)
    }

    /// Everything before the last segment (`app.route` → `app`).
    pub fn object(&self) -> Option<&str> {
        self.callee.rsplit_once('.').map(|(object, _)| object)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Symbol {
    #[serde(skip)]
    pub id: SymbolId,
    pub name: String,
    /// Dotted path within the file (`Service.handle`, `outer.inner`).
    #[serde(rename = "path")]
    pub qualified_name: String,
    pub kind: SymbolKind,
    #[serde(skip)]
    pub parent: Option<SymbolId>,
    /// Qualified path of the enclosing symbol; absent at module level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub decorators: Vec<Decorator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    /// Instance or class receiver of a method (`self`, `cls`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Base-class expressions as written, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    pub has_docstring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    pub is_async: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    pub signature: String,
    pub exported: bool,
    /// Functions: the body is only a docstring, `pass`, `...` or
    /// `raise NotImplementedError`. Classes: at least one method, and nothing
    /// but stub methods, annotations and docstrings.
    pub is_stub: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub global_names: Vec<String>,
    pub position: Position,
    pub end_line: usize,
    #[serde(skip)]
    pub children: Vec<SymbolId>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Constant,
    Variable,
}

/// The callee and literal arguments of a call expression.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CallShape {
    pub callee: String,
    pub args: Vec<Argument>,
    pub position: Position,
}

/// A module-level `name = value` assignment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_call: Option<CallShape>,
    pub position: Position,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SymbolTable {
    /// Every symbol in pre-order source order.
    pub symbols: Vec<Symbol>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
    /// Call statements executed at import time (`app.include_router(...)`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub module_calls: Vec<CallShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_docstring: Option<String>,
    #[serde(skip)]
    by_node: HashMap<usize, SymbolId>,
}

impl SymbolTable {
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol declared by a `function_definition` or `class_definition` node.
    pub fn symbol_for_node(&self, node: tree_sitter::Node<'_>) -> Option<SymbolId> {
        self.by_node.get(&node.id()).copied()
    }

    /// Module-level symbol named `name`. A later definition shadows an earlier one.
    pub fn module_level(&self, name: &str) -> Option<SymbolId> {
        self.symbols
            .iter()
            .rev()
            .find(|s| s.parent.is_none() && s.name == name)
            .map(|s| s.id)
    }

    /// Module-level class named `name`.
    pub fn class_named(&self, name: &str) -> Option<SymbolId> {
        self.module_level(name)
            .filter(|id| self.get(*id).kind == SymbolKind::Class)
    }

    /// Direct child of `parent` named `name`, last definition wins.
    pub fn child_named(&self, parent: SymbolId, name: &str) -> Option<SymbolId> {
        self.get(parent)
            .children
            .iter()
            .rev()
            .copied()
            .find(|child| self.get(*child).name == name)
    }

    /// Methods declared directly in a class body.
    pub fn methods_of(&self, class: SymbolId) -> impl Iterator<Item = &Symbol> {
        self.get(class)
            .children
            .iter()
            .map(|id| self.get(*id))
            .filter(|s| s.kind == SymbolKind::Method)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind == SymbolKind::Class)
    }

    /// The class a method is declared in.
    pub fn enclosing_class(&self, method: SymbolId) -> Option<SymbolId> {
        let symbol = self.get(method);
        if symbol.kind != SymbolKind::Method {
            return None;
        }
        symbol.parent
    }

    /// Chain of enclosing symbols, innermost first, starting with `id` itself.
    pub fn scope_chain(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut chain = vec![id];
        let mut current = self.get(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.get(parent).parent;
        }
        chain
    }
}

/// Build the symbol table of a parsed file. Unrecognized constructs are skipped
/// with a structural diagnostic; the walk always covers the whole file.
pub fn build_symbols(path: &Path, tree: &SyntaxTree, diagnostics: &mut Vec<Diagnostic>) -> SymbolTable {
    report_syntax_errors(tree.root(), path, tree.source(), diagnostics);

    let mut builder = Builder {
        path,
        source: tree.source(),
        table: SymbolTable::default(),
        diagnostics,
    };
    let root = tree.root();
    builder.table.module_docstring = docstring_of(root, tree.source());
    builder.visit_block(root, None);
    builder.table
}

struct Builder<'a> {
    path: &'a Path,
    source: &'a [u8],
    table: SymbolTable,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Builder<'_> {
    fn visit_block(&mut self, block: tree_sitter::Node<'_>, parent: Option<SymbolId>) {
        for statement in named_children(block) {
            match statement.kind() {
                "function_definition" => self.define_function(statement, Vec::new(), parent),
                "class_definition" => self.define_class(statement, Vec::new(), parent),
                "decorated_definition" => self.visit_decorated(statement, parent),
                "expression_statement" if parent.is_none() => self.record_module_statement(statement),
                "global_statement" => {
                    if let Some(owner) = parent {
                        let source = self.source;
                        let names = named_children(statement)
                            .into_iter()
                            .map(|n| node_text(n, source).to_string());
                        self.table.symbols[owner.0].global_names.extend(names);
                    }
                }
                "ERROR" => {}
                _ => self.visit_nested(statement, parent),
            }
        }
    }

    /// Descend into the blocks of compound statements (`if`, `try`, `with`, ...).
    fn visit_nested(&mut self, node: tree_sitter::Node<'_>, parent: Option<SymbolId>) {
        for child in named_children(node) {
            if child.kind() == "block" {
                self.visit_block(child, parent);
            } else if child.kind().ends_with("_clause") {
                self.visit_nested(child, parent);
            }
        }
    }

    fn visit_decorated(&mut self, node: tree_sitter::Node<'_>, parent: Option<SymbolId>) {
        let decorators: Vec<Decorator> = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "decorator")
            .filter_map(|child| self.decorator(child))
            .collect();

        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "function_definition" => {
                self.define_function(def, decorators, parent)
            }
            Some(def) if def.kind() == "class_definition" => {
                self.define_class(def, decorators, parent)
            }
            _ => self.skip(node, "decorated construct without a definition"),
        }
    }

    fn decorator(&mut self, node: tree_sitter::Node<'_>) -> Option<Decorator> {
        let Some(expression) = named_children(node).into_iter().next() else {
            self.skip(node, "empty decorator");
            return None;
        };
        let position = Position::of(node);
        if expression.kind() == "call" {
            let callee = expression.child_by_field_name("function")?;
            let args = expression
                .child_by_field_name("arguments")
                .filter(|a| a.kind() == "argument_list")
                .map(|a| expr::arguments(a, self.source))
                .unwrap_or_default();
            Some(Decorator {
                callee: node_text(callee, self.source).to_string(),
                is_call: true,
                args,
                position,
            })
        } else {
            Some(Decorator {
                callee: node_text(expression, self.source).to_string(),
                is_call: false,
                args: Vec::new(),
                position,
            })
        }
    }

    fn define_function(
        &mut self,
        node: tree_sitter::Node<'_>,
        decorators: Vec<Decorator>,
        parent: Option<SymbolId>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            self.skip(node, "function definition without a name");
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let in_class = parent.is_some_and(|p| self.table.get(p).kind == SymbolKind::Class);
        let kind = if in_class {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };

        let params_node = node.child_by_field_name("parameters");
        let params = params_node
            .map(|p| parameter_names(p, self.source))
            .unwrap_or_default();
        let is_static = decorators.iter().any(|d| d.callee == "staticmethod");
        let receiver = if kind == SymbolKind::Method && !is_static {
            params.first().cloned()
        } else {
            None
        };

        let is_async = has_async_keyword(node);
        let return_type = node
            .child_by_field_name("return_type")
            .map(|r| node_text(r, self.source).to_string());
        let signature = format!(
            "{}def {}{}{}",
            if is_async { "async " } else { "" },
            name,
            params_node
                .map(|p| collapse_whitespace(node_text(p, self.source)))
                .unwrap_or_else(|| "()".to_string()),
            return_type
                .as_ref()
                .map(|r| format!(" -> {r}"))
                .unwrap_or_default(),
        );

        let body = node.child_by_field_name("body");
        let docstring = body.and_then(|b| docstring_of(b, self.source));
        let is_stub = body.is_some_and(|b| is_stub_body(b, self.source));

        let id = self.push(Symbol {
            id: SymbolId(0),
            exported: !name.starts_with('_'),
            name,
            qualified_name: String::new(),
            kind,
            parent,
            scope: None,
            decorators,
            params,
            receiver,
            bases: Vec::new(),
            has_docstring: docstring.is_some(),
            docstring,
            is_async,
            return_type,
            signature,
            is_stub,
            global_names: Vec::new(),
            position: Position::of(node),
            end_line: end_line(node),
            children: Vec::new(),
        }, node);

        if let Some(body) = body {
            self.visit_block(body, Some(id));
        }
    }

    fn define_class(
        &mut self,
        node: tree_sitter::Node<'_>,
        decorators: Vec<Decorator>,
        parent: Option<SymbolId>,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            self.skip(node, "class definition without a name");
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let superclasses = node.child_by_field_name("superclasses");
        let bases: Vec<String> = superclasses
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter(|b| b.kind() != "keyword_argument")
                    .map(|b| node_text(b, self.source).to_string())
                    .collect()
            })
            .unwrap_or_default();
        let signature = match superclasses {
            Some(list) => format!("class {name}{}", collapse_whitespace(node_text(list, self.source))),
            None => format!("class {name}"),
        };

        let body = node.child_by_field_name("body");
        let docstring = body.and_then(|b| docstring_of(b, self.source));

        let id = self.push(Symbol {
            id: SymbolId(0),
            exported: !name.starts_with('_'),
            name,
            qualified_name: String::new(),
            kind: SymbolKind::Class,
            parent,
            scope: None,
            decorators,
            params: Vec::new(),
            receiver: None,
            bases,
            has_docstring: docstring.is_some(),
            docstring,
            is_async: false,
            return_type: None,
            signature,
            is_stub: body.is_some_and(|b| is_stub_class_body(b, self.source)),
            global_names: Vec::new(),
            position: Position::of(node),
            end_line: end_line(node),
            children: Vec::new(),
        }, node);

        if let Some(body) = body {
            self.visit_block(body, Some(id));
        }
    }

    /// Assign id, qualified name and scope, then link into the parent.
    fn push(&mut self, mut symbol: Symbol, node: tree_sitter::Node<'_>) -> SymbolId {
        let id = SymbolId(self.table.symbols.len());
        symbol.id = id;
        match symbol.parent {
            Some(parent) => {
                let parent_path = self.table.get(parent).qualified_name.clone();
                symbol.qualified_name = format!("{parent_path}.{}", symbol.name);
                symbol.scope = Some(parent_path);
                self.table.symbols[parent.0].children.push(id);
            }
            None => symbol.qualified_name = symbol.name.clone(),
        }
        self.table.symbols.push(symbol);
        self.table.by_node.insert(node.id(), id);
        id
    }

    fn record_module_statement(&mut self, statement: tree_sitter::Node<'_>) {
        let Some(inner) = named_children(statement).into_iter().next() else {
            return;
        };
        match inner.kind() {
            "assignment" => {
                let Some(left) = inner.child_by_field_name("left") else {
                    return;
                };
                if left.kind() != "identifier" {
                    return;
                }
                let name = node_text(left, self.source).to_string();
                let value_call = inner
                    .child_by_field_name("right")
                    .filter(|r| r.kind() == "call")
                    .and_then(|r| call_shape(r, self.source));
                self.table.bindings.push(Binding {
                    kind: if is_constant_name(&name) {
                        BindingKind::Constant
                    } else {
                        BindingKind::Variable
                    },
                    name,
                    value_call,
                    position: Position::of(inner),
                });
            }
            "call" => {
                if let Some(call) = call_shape(inner, self.source) {
                    self.table.module_calls.push(call);
                }
            }
            _ => {}
        }
    }

    fn skip(&mut self, node: tree_sitter::Node<'_>, what: &str) {
        self.diagnostics.push(Diagnostic::structural(
            self.path,
            Position::of(node).line,
            format!("skipped {what}"),
        ));
    }
}

/// Callee text and literal arguments of a `call` node.
pub fn call_shape(call: tree_sitter::Node<'_>, source: &[u8]) -> Option<CallShape> {
    let function = call.child_by_field_name("function")?;
    let args = call
        .child_by_field_name("arguments")
        .filter(|a| a.kind() == "argument_list")
        .map(|a| expr::arguments(a, source))
        .unwrap_or_default();
    Some(CallShape {
        callee: node_text(function, source).to_string(),
        args,
        position: Position::of(call),
    })
}

fn parameter_names(params: tree_sitter::Node<'_>, source: &[u8]) -> Vec<String> {
    named_children(params)
        .into_iter()
        .filter_map(|param| match param.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" | "tuple_pattern" => {
                Some(node_text(param, source).to_string())
            }
            "typed_parameter" => named_children(param)
                .into_iter()
                .next()
                .map(|n| node_text(n, source).to_string()),
            "default_parameter" | "typed_default_parameter" => param
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_string()),
            _ => None,
        })
        .collect()
}

/// Docstring of a module or block: a leading string expression statement.
fn docstring_of(block: tree_sitter::Node<'_>, source: &[u8]) -> Option<String> {
    let first = named_children(block).into_iter().next()?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let inner = named_children(first);
    match inner.as_slice() {
        [string] if string.kind() == "string" => {
            Some(expr::clean_docstring(node_text(*string, source)))
        }
        _ => None,
    }
}

fn is_stub_body(block: tree_sitter::Node<'_>, source: &[u8]) -> bool {
    let statements = named_children(block);
    !statements.is_empty()
        && statements.iter().all(|s| match s.kind() {
            "pass_statement" => true,
            "expression_statement" => named_children(*s)
                .iter()
                .all(|e| matches!(e.kind(), "string" | "ellipsis")),
            "raise_statement" => node_text(*s, source)
                .trim_start_matches("raise")
                .trim_start()
                .starts_with("NotImplementedError"),
            _ => false,
        })
}

fn is_stub_class_body(block: tree_sitter::Node<'_>, source: &[u8]) -> bool {
    let mut methods = 0;
    let only_stubs = named_children(block).iter().all(|s| {
        let definition = if s.kind() == "decorated_definition" {
            s.child_by_field_name("definition")
        } else {
            Some(*s)
        };
        match definition {
            Some(def) if def.kind() == "function_definition" => {
                methods += 1;
                def.child_by_field_name("body")
                    .is_some_and(|body| is_stub_body(body, source))
            }
            Some(def) if def.kind() == "expression_statement" => {
                named_children(def).iter().all(|e| match e.kind() {
                    "string" | "ellipsis" => true,
                    "assignment" => e.child_by_field_name("right").is_none(),
                    _ => false,
                })
            }
            Some(def) => def.kind() == "pass_statement",
            None => false,
        }
    });
    only_stubs && methods > 0
}

fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("( ", "(")
        .replace(", )", ")")
        .replace(",)", ")")
        .replace(" )", ")")
}

/// One structural diagnostic per ERROR or MISSING node; nothing below an ERROR node.
fn report_syntax_errors(
    node: tree_sitter::Node<'_>,
    path: &Path,
    source: &[u8],
    diagnostics: &mut Vec<Diagnostic>,
) {
    if node.is_error() {
        let text = node_text(node, source);
        diagnostics.push(Diagnostic::structural(
            path,
            Position::of(node).line,
            format!(
                "skipped unparseable construct `{}`",
                text.lines().next().unwrap_or_default().trim()
            ),
        ));
        return;
    }
    if node.is_missing() {
        diagnostics.push(Diagnostic::structural(
            path,
            Position::of(node).line,
            format!("missing `{}`", node.kind()),
        ));
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    for child in children {
        report_syntax_errors(child, path, source, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::PythonParser;
    use pretty_assertions::assert_eq;

    fn table_of(src: &str) -> (SymbolTable, Vec<Diagnostic>) {
        let tree = PythonParser::new().parse(src).unwrap();
        let mut diagnostics = Vec::new();
        let table = build_symbols(Path::new("mod.py"), &tree, &mut diagnostics);
        (table, diagnostics)
    }

    fn paths(table: &SymbolTable) -> Vec<(&str, SymbolKind)> {
        table
            .iter()
            .map(|s| (s.qualified_name.as_str(), s.kind))
            .collect()
    }

    #[test]
    fn builds_scope_tree() {
        let src = r#"
class Service(Base, metaclass=Meta):
    """Handles things."""

    def handle(self, request, *args, **kwargs):
        def local():
            pass
        return local()

def main(argv: list[str] = None) -> int:
    return 0
"#;
        let (table, diags) = table_of(src);
        assert!(diags.is_empty());
        assert_eq!(
            paths(&table),
            vec![
                ("Service", SymbolKind::Class),
                ("Service.handle", SymbolKind::Method),
                ("Service.handle.local", SymbolKind::Function),
                ("main", SymbolKind::Function),
            ]
        );

        let service = table.get(SymbolId(0));
        assert_eq!(service.bases, vec!["Base"]);
        assert!(service.has_docstring);
        assert_eq!(service.docstring.as_deref(), Some("Handles things."));

        let handle = table.get(SymbolId(1));
        assert_eq!(handle.params, vec!["self", "request", "*args", "**kwargs"]);
        assert_eq!(handle.receiver.as_deref(), Some("self"));
        assert_eq!(handle.scope.as_deref(), Some("Service"));
        assert_eq!(handle.children, vec![SymbolId(2)]);

        let main = table.get(SymbolId(3));
        assert_eq!(main.params, vec!["argv"]);
        assert_eq!(main.return_type.as_deref(), Some("int"));
        assert_eq!(main.signature, "def main(argv: list[str] = None) -> int");
        assert!(main.receiver.is_none());
    }

    #[test]
    fn collects_decorators_in_order() {
        let src = r#"
@app.route("/users", methods=["GET", "POST"])
@login_required
def users():
    pass
"#;
        let (table, _) = table_of(src);
        let users = table.get(SymbolId(0));
        assert_eq!(users.decorators.len(), 2);
        assert_eq!(users.decorators[0].callee, "app.route");
        assert!(users.decorators[0].is_call);
        assert_eq!(users.decorators[0].attribute(), "route");
        assert_eq!(users.decorators[0].object(), Some("app"));
        assert_eq!(users.decorators[1].callee, "login_required");
        assert!(!users.decorators[1].is_call);
    }

    #[test]
    fn staticmethod_has_no_receiver() {
        let src = "class A:\n    @staticmethod\n    def make(x):\n        pass\n\n    @classmethod\n    def build(cls):\n        pass\n";
        let (table, _) = table_of(src);
        assert_eq!(table.get(SymbolId(1)).receiver, None);
        assert_eq!(table.get(SymbolId(2)).receiver.as_deref(), Some("cls"));
    }

    #[test]
    fn async_and_stub_flags() {
        let src = "class P:\n    async def fetch(self) -> bytes: ...\n    def close(self):\n        \"\"\"Close.\"\"\"\n        raise NotImplementedError\n    def real(self):\n        return 1\n";
        let (table, _) = table_of(src);
        let fetch = table.get(SymbolId(1));
        assert!(fetch.is_async);
        assert!(fetch.is_stub);
        assert_eq!(fetch.signature, "async def fetch(self) -> bytes");
        assert!(table.get(SymbolId(2)).is_stub);
        assert!(!table.get(SymbolId(3)).is_stub);
    }

    #[test]
    fn definitions_in_compound_statements() {
        let src = "if TYPE_CHECKING:\n    def typed():\n        pass\nelse:\n    def untyped():\n        pass\ntry:\n    class X:\n        pass\nexcept Exception:\n    pass\n";
        let (table, _) = table_of(src);
        let names: Vec<&str> = table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["typed", "untyped", "X"]);
    }

    #[test]
    fn module_bindings_and_calls() {
        let src = "\"\"\"Module doc.\"\"\"\nMAX_RETRIES = 3\nrouter = APIRouter(prefix=\"/api\")\napp.include_router(router, prefix=\"/v1\")\n_counter = 0\n";
        let (table, _) = table_of(src);
        assert_eq!(table.module_docstring.as_deref(), Some("Module doc."));
        assert_eq!(table.bindings.len(), 3);
        assert_eq!(table.bindings[0].kind, BindingKind::Constant);
        assert_eq!(table.bindings[1].kind, BindingKind::Variable);
        let call = table.bindings[1].value_call.as_ref().unwrap();
        assert_eq!(call.callee, "APIRouter");
        assert_eq!(table.module_calls.len(), 1);
        assert_eq!(table.module_calls[0].callee, "app.include_router");
    }

    #[test]
    fn records_global_declarations() {
        let src = "COUNT = 0\n\ndef bump():\n    global COUNT\n    COUNT += 1\n";
        let (table, _) = table_of(src);
        assert_eq!(table.get(SymbolId(0)).global_names, vec!["COUNT"]);
    }

    #[test]
    fn duplicate_definitions_last_wins_for_lookup() {
        let src = "def f():\n    pass\n\ndef f():\n    return 1\n";
        let (table, _) = table_of(src);
        assert_eq!(table.len(), 2);
        assert_eq!(table.module_level("f"), Some(SymbolId(1)));
    }

    #[test]
    fn syntax_errors_become_diagnostics() {
        let src = "def ok():\n    pass\n\ndef broken(:\n    pass\n\nclass Fine:\n    pass\n";
        let (table, diags) = table_of(src);
        assert!(!diags.is_empty());
        assert!(table.iter().any(|s| s.name == "ok"));
    }
}
