//! Call classification.
//!
//! Every call expression inside a function, method or class body becomes one
//! [`CallSite`]; calls executed at import time become [`ModuleCall`]s.
//! Resolution is lexical only; first matching rule wins: self-method,
//! same-file, import-qualified, unresolved.

use crate::analysis::expr::{self, Argument};
use crate::analysis::imports::ImportMap;
use crate::analysis::symbols::{SymbolId, SymbolKind, SymbolTable};
use crate::parse::common::{has_async_keyword, named_children, node_text};
use crate::parse::{Position, SyntaxTree};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    SelfMethodCall,
    SameFileCall,
    ImportQualifiedCall,
    Unresolved,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// A Python builtin such as `len` or `print`.
    Builtin,
    /// A bare name that is neither defined in the file nor imported.
    UnknownName,
    /// An attribute call whose receiver is not the method receiver or an import.
    UnknownReceiver,
    /// `self.name(...)` where no class in the lexical base chain defines `name`.
    MissingMethod,
    /// The callee is not a dotted name (subscript, call result, lambda, ...).
    DynamicCallee,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallTarget {
    /// A symbol of the same file.
    Symbol {
        #[serde(rename = "path")]
        qualified_name: String,
        #[serde(skip)]
        id: SymbolId,
    },
    /// A name reached through the import map.
    Import {
        module: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Constructor of the local client object the call went through
        /// (`AsyncClient` for `async with httpx.AsyncClient() as c: c.get()`).
        #[serde(skip_serializing_if = "Option::is_none")]
        via: Option<String>,
    },
    Unresolved { reason: UnresolvedReason },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CallSite {
    /// Qualified path of the calling symbol.
    pub caller: String,
    #[serde(skip)]
    pub caller_id: SymbolId,
    /// Callee expression as written.
    pub callee: String,
    pub kind: CallKind,
    pub target: CallTarget,
    /// Awaited, or used as an `async with` item.
    pub is_async: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    pub position: Position,
}

/// Names that resolve to Python builtins when nothing in the file shadows them.
const BUILTINS: &[&str] = &[
    "abs", "all", "any", "ascii", "bin", "bool", "breakpoint", "bytearray", "bytes",
    "callable", "chr", "classmethod", "compile", "complex", "delattr", "dict", "dir",
    "divmod", "enumerate", "eval", "exec", "filter", "float", "format", "frozenset",
    "getattr", "globals", "hasattr", "hash", "help", "hex", "id", "input", "int",
    "isinstance", "issubclass", "iter", "len", "list", "locals", "map", "max",
    "memoryview", "min", "next", "object", "oct", "open", "ord", "pow", "print",
    "property", "range", "repr", "reversed", "round", "set", "setattr", "slice",
    "sorted", "staticmethod", "str", "sum", "super", "tuple", "type", "vars", "zip",
    "Exception", "BaseException", "ValueError", "TypeError", "KeyError", "IndexError",
    "AttributeError", "RuntimeError", "NotImplementedError", "StopIteration",
    "OSError", "IOError", "ImportError", "LookupError", "AssertionError",
    "PermissionError", "FileNotFoundError", "TimeoutError", "ConnectionError",
];

/// A call executed at import time, outside every function and class body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModuleCall {
    pub callee: String,
    pub kind: CallKind,
    pub target: CallTarget,
    pub is_async: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    pub position: Position,
}

/// Resolved calls of one file, each list sorted by position.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCalls {
    pub calls: Vec<CallSite>,
    pub module_level: Vec<ModuleCall>,
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Class instantiations (`Session`, `httpx.AsyncClient`) and the legacy
/// `requests.session()` factory produce client objects. Verb helpers and other
/// functions return plain values.
fn is_client_constructor(name: &str) -> bool {
    let last = name.rsplit('.').next().unwrap_or(name);
    last == "session" || last.starts_with(|c: char| c.is_ascii_uppercase())
}

/// A local variable bound to a client object built from an imported constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClientAlias {
    module: String,
    constructor: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ScopeKind {
    Module,
    Function,
    Class,
    /// `with` targets; plain assignments go to the enclosing scope.
    #[default]
    Block,
}

#[derive(Debug, Default)]
struct AliasFrame {
    scope: ScopeKind,
    /// `None` marks a local that shadows any outer alias or import.
    names: BTreeMap<String, Option<ClientAlias>>,
}

impl AliasFrame {
    fn scope(scope: ScopeKind) -> Self {
        Self {
            scope,
            names: BTreeMap::new(),
        }
    }
}

/// Classify every call expression of the file.
pub fn resolve_calls(tree: &SyntaxTree, symbols: &SymbolTable, imports: &ImportMap) -> ResolvedCalls {
    let mut resolver = Resolver {
        source: tree.source(),
        symbols,
        imports,
        frames: vec![AliasFrame::scope(ScopeKind::Module)],
        resolved: ResolvedCalls::default(),
    };
    resolver.visit(tree.root(), None);
    let mut resolved = resolver.resolved;
    resolved.calls.sort_by_key(|c| c.position);
    resolved.module_level.sort_by_key(|c| c.position);
    resolved
}

struct Resolver<'a> {
    source: &'a [u8],
    symbols: &'a SymbolTable,
    imports: &'a ImportMap,
    frames: Vec<AliasFrame>,
    resolved: ResolvedCalls,
}

impl Resolver<'_> {
    fn visit(&mut self, node: tree_sitter::Node<'_>, caller: Option<SymbolId>) {
        match node.kind() {
            "function_definition" | "class_definition" => {
                let Some(id) = self.symbols.symbol_for_node(node) else {
                    return;
                };
                let scope = if node.kind() == "class_definition" {
                    ScopeKind::Class
                } else {
                    ScopeKind::Function
                };
                if let Some(body) = node.child_by_field_name("body") {
                    let mut frame = AliasFrame::scope(scope);
                    if scope == ScopeKind::Function {
                        for name in parameter_names(node, self.source) {
                            frame.names.insert(name, None);
                        }
                    }
                    self.frames.push(frame);
                    self.visit(body, Some(id));
                    self.frames.pop();
                }
            }
            "decorated_definition" => {
                if let Some(def) = node.child_by_field_name("definition") {
                    self.visit(def, caller);
                }
            }
            "with_statement" => self.visit_with(node, caller),
            "assignment" => {
                self.visit_children(node, caller);
                self.bind_assignment(node);
            }
            "call" => {
                match caller {
                    Some(caller) => self.record(node, caller),
                    None => self.record_module_level(node),
                }
                self.visit_children(node, caller);
            }
            _ => self.visit_children(node, caller),
        }
    }

    fn visit_children(&mut self, node: tree_sitter::Node<'_>, caller: Option<SymbolId>) {
        for child in named_children(node) {
            self.visit(child, caller);
        }
    }

    /// Items are evaluated in the enclosing frame; their `as` targets are
    /// visible only inside the block.
    fn visit_with(&mut self, node: tree_sitter::Node<'_>, caller: Option<SymbolId>) {
        let mut frame = AliasFrame::default();
        for child in named_children(node) {
            if child.kind() == "block" {
                continue;
            }
            self.visit(child, caller);
            for item in named_children(child).into_iter().filter(|n| n.kind() == "with_item") {
                if let Some((name, alias)) = self.with_item_alias(item) {
                    frame.names.insert(name, alias);
                }
            }
        }
        self.frames.push(frame);
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body, caller);
        }
        self.frames.pop();
    }

    fn with_item_alias(&self, item: tree_sitter::Node<'_>) -> Option<(String, Option<ClientAlias>)> {
        let value = item.child_by_field_name("value")?;
        let (expression, target) = if value.kind() == "as_pattern" {
            let expression = named_children(value).into_iter().next()?;
            (expression, value.child_by_field_name("alias")?)
        } else {
            (value, item.child_by_field_name("alias")?)
        };
        let name = node_text(target, self.source).trim().to_string();
        if name.is_empty() || name.contains([',', '(', '[']) {
            return None;
        }
        Some((name, self.client_alias(expression)))
    }

    fn bind_assignment(&mut self, node: tree_sitter::Node<'_>) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let name = node_text(left, self.source).to_string();
        let alias = node
            .child_by_field_name("right")
            .and_then(|right| self.client_alias(right));
        if let Some(frame) = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| f.scope != ScopeKind::Block)
        {
            frame.names.insert(name, alias);
        }
    }

    /// `lib.Client(...)` where `lib` is imported and `Client` builds a client object.
    fn client_alias(&self, expression: tree_sitter::Node<'_>) -> Option<ClientAlias> {
        let expression = if expression.kind() == "await" {
            named_children(expression).into_iter().next()?
        } else {
            expression
        };
        if expression.kind() != "call" {
            return None;
        }
        let chain = expr::dotted_path(expression.child_by_field_name("function")?, self.source)?;
        if self.lookup_alias(&chain[0]).is_some() {
            return None;
        }
        let (module, name) = self.imports.resolve(&chain)?;
        let constructor = name.unwrap_or_else(|| chain.join("."));
        is_client_constructor(&constructor).then_some(ClientAlias {
            module,
            constructor,
        })
    }

    /// Innermost binding of a local name; `Some(None)` means shadowed by a non-client value.
    /// Class bodies are skipped once lookup has left a function scope.
    fn lookup_alias(&self, name: &str) -> Option<Option<&ClientAlias>> {
        let mut in_function = false;
        for frame in self.frames.iter().rev() {
            if frame.scope == ScopeKind::Class && in_function {
                continue;
            }
            if let Some(binding) = frame.names.get(name) {
                return Some(binding.as_ref());
            }
            if frame.scope == ScopeKind::Function {
                in_function = true;
            }
        }
        None
    }

    fn record(&mut self, call: tree_sitter::Node<'_>, caller: SymbolId) {
        let Some(function) = call.child_by_field_name("function") else {
            return;
        };
        let (kind, target) = self.classify(function, Some(caller));
        let args = self.arguments(call);
        self.resolved.calls.push(CallSite {
            caller: self.symbols.get(caller).qualified_name.clone(),
            caller_id: caller,
            callee: node_text(function, self.source).to_string(),
            kind,
            target,
            is_async: is_async_call(call),
            args,
            position: Position::of(call),
        });
    }

    fn record_module_level(&mut self, call: tree_sitter::Node<'_>) {
        let Some(function) = call.child_by_field_name("function") else {
            return;
        };
        let (kind, target) = self.classify(function, None);
        let args = self.arguments(call);
        self.resolved.module_level.push(ModuleCall {
            callee: node_text(function, self.source).to_string(),
            kind,
            target,
            is_async: is_async_call(call),
            args,
            position: Position::of(call),
        });
    }

    fn arguments(&self, call: tree_sitter::Node<'_>) -> Vec<Argument> {
        call.child_by_field_name("arguments")
            .filter(|a| a.kind() == "argument_list")
            .map(|a| expr::arguments(a, self.source))
            .unwrap_or_default()
    }

    /// `caller` is `None` for calls executed at import time.
    fn classify(
        &self,
        function: tree_sitter::Node<'_>,
        caller: Option<SymbolId>,
    ) -> (CallKind, CallTarget) {
        let unresolved = |reason| (CallKind::Unresolved, CallTarget::Unresolved { reason });

        let Some(chain) = expr::dotted_path(function, self.source) else {
            return self
                .classify_chained(function, caller)
                .unwrap_or_else(|| unresolved(UnresolvedReason::DynamicCallee));
        };

        if let [name] = chain.as_slice() {
            if let Some(id) = self.lexical_lookup(caller, name) {
                return self.symbol_target(CallKind::SameFileCall, id);
            }
            if let Some((module, name)) = self.imports.resolve(&chain) {
                return (
                    CallKind::ImportQualifiedCall,
                    CallTarget::Import {
                        module,
                        name,
                        via: None,
                    },
                );
            }
            return if is_builtin(name) {
                unresolved(UnresolvedReason::Builtin)
            } else {
                unresolved(UnresolvedReason::UnknownName)
            };
        }

        if let (Some(caller), [receiver, method]) = (caller, chain.as_slice()) {
            if let Some(class) = self.receiver_class(caller, receiver) {
                return match self.lookup_method(class, method, &mut BTreeSet::new()) {
                    Some(id) => self.symbol_target(CallKind::SelfMethodCall, id),
                    None => unresolved(UnresolvedReason::MissingMethod),
                };
            }
        }

        match self.lookup_alias(&chain[0]) {
            Some(Some(alias)) => (
                CallKind::ImportQualifiedCall,
                CallTarget::Import {
                    module: alias.module.clone(),
                    name: Some(chain[1..].join(".")),
                    via: Some(alias.constructor.clone()),
                },
            ),
            Some(None) => unresolved(UnresolvedReason::UnknownReceiver),
            None => match self.imports.resolve(&chain) {
                Some((module, name)) => (
                    CallKind::ImportQualifiedCall,
                    CallTarget::Import {
                        module,
                        name,
                        via: None,
                    },
                ),
                None => unresolved(UnresolvedReason::UnknownReceiver),
            },
        }
    }

    /// `super().name(...)` and `lib.Client().name(...)`. Calls on any other
    /// return value are left to the caller as dynamic.
    fn classify_chained(
        &self,
        function: tree_sitter::Node<'_>,
        caller: Option<SymbolId>,
    ) -> Option<(CallKind, CallTarget)> {
        if function.kind() != "attribute" {
            return None;
        }
        let object = function.child_by_field_name("object")?;
        let attribute = node_text(function.child_by_field_name("attribute")?, self.source);
        if object.kind() != "call" {
            return None;
        }
        let inner = object.child_by_field_name("function")?;

        if node_text(inner, self.source) == "super" {
            let method = self.enclosing_method(caller?)?;
            let class = self.symbols.enclosing_class(method)?;
            let mut visited = BTreeSet::from([class]);
            let found = self
                .base_classes(class)
                .into_iter()
                .find_map(|base| self.lookup_method(base, attribute, &mut visited));
            return Some(match found {
                Some(id) => self.symbol_target(CallKind::SelfMethodCall, id),
                None => (
                    CallKind::Unresolved,
                    CallTarget::Unresolved {
                        reason: UnresolvedReason::MissingMethod,
                    },
                ),
            });
        }

        let alias = self.client_alias(object)?;
        Some((
            CallKind::ImportQualifiedCall,
            CallTarget::Import {
                module: alias.module,
                name: Some(attribute.to_string()),
                via: Some(alias.constructor),
            },
        ))
    }

    fn symbol_target(&self, kind: CallKind, id: SymbolId) -> (CallKind, CallTarget) {
        (
            kind,
            CallTarget::Symbol {
                qualified_name: self.symbols.get(id).qualified_name.clone(),
                id,
            },
        )
    }

    /// Nested functions of enclosing function scopes, then module-level
    /// functions and classes. Class bodies are not enclosing scopes.
    fn lexical_lookup(&self, caller: Option<SymbolId>, name: &str) -> Option<SymbolId> {
        let scopes = caller
            .map(|caller| self.symbols.scope_chain(caller))
            .unwrap_or_default();
        for scope in scopes {
            if self.symbols.get(scope).kind == SymbolKind::Class {
                continue;
            }
            if let Some(found) = self.symbols.child_named(scope, name) {
                if self.symbols.get(found).kind != SymbolKind::Method {
                    return Some(found);
                }
            }
        }
        self.symbols.module_level(name)
    }

    /// Nearest enclosing method, looking through nested functions.
    fn enclosing_method(&self, caller: SymbolId) -> Option<SymbolId> {
        self.symbols
            .scope_chain(caller)
            .into_iter()
            .find(|id| self.symbols.get(*id).kind == SymbolKind::Method)
    }

    /// Class of the enclosing method when `receiver` is that method's receiver.
    fn receiver_class(&self, caller: SymbolId, receiver: &str) -> Option<SymbolId> {
        let method = self.enclosing_method(caller)?;
        if self.symbols.get(method).receiver.as_deref() != Some(receiver) {
            return None;
        }
        self.symbols.enclosing_class(method)
    }

    /// Depth-first through same-file nominal bases; the nearest defining class wins.
    fn lookup_method(
        &self,
        class: SymbolId,
        name: &str,
        visited: &mut BTreeSet<SymbolId>,
    ) -> Option<SymbolId> {
        visited.insert(class);
        if let Some(found) = self.symbols.child_named(class, name) {
            if self.symbols.get(found).kind == SymbolKind::Method {
                return Some(found);
            }
        }
        for base in self.base_classes(class) {
            if visited.contains(&base) {
                continue;
            }
            if let Some(found) = self.lookup_method(base, name, visited) {
                return Some(found);
            }
        }
        None
    }

    fn base_classes(&self, class: SymbolId) -> Vec<SymbolId> {
        self.symbols
            .get(class)
            .bases
            .iter()
            .filter_map(|base| self.symbols.class_named(expr::base_name(base)))
            .collect()
    }
}

/// Names bound by a function's parameter list.
fn parameter_names(function: tree_sitter::Node<'_>, source: &[u8]) -> Vec<String> {
    let Some(parameters) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    named_children(parameters)
        .into_iter()
        .filter_map(|param| {
            let name = match param.kind() {
                "identifier" => Some(param),
                "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
                _ => named_children(param)
                    .into_iter()
                    .find(|n| n.kind() == "identifier"),
            }?;
            Some(node_text(name, source).to_string())
        })
        .collect()
}

fn is_async_call(call: tree_sitter::Node<'_>) -> bool {
    let Some(parent) = call.parent() else {
        return false;
    };
    match parent.kind() {
        "await" => true,
        "with_item" => async_with(parent),
        "as_pattern" => parent
            .parent()
            .is_some_and(|item| item.kind() == "with_item" && async_with(item)),
        _ => false,
    }
}

fn async_with(item: tree_sitter::Node<'_>) -> bool {
    let mut current = item.parent();
    while let Some(node) = current {
        if node.kind() == "with_statement" {
            return has_async_keyword(node);
        }
        current = node.parent();
    }
    false
}
