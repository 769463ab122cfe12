//! Route decorators → HTTP endpoints.
//!
//! Matching is by shape only: `@<obj>.route(...)` (Flask) and
//! `@<obj>.get/post/...(...)` or `@<obj>.api_route(...)` (FastAPI). The
//! decorated object is never type-checked.

use crate::analysis::diagnostic::Diagnostic;
use crate::analysis::expr::{self, ArgValue};
use crate::analysis::imports::ImportMap;
use crate::analysis::symbols::{Decorator, Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::parse::Position;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const HTTP_VERBS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Flask,
    Fastapi,
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framework::Flask => write!(f, "flask"),
            Framework::Fastapi => write!(f, "fastapi"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    /// Upper-case HTTP method.
    pub method: String,
    /// Path template as written, placeholders kept verbatim.
    pub path: String,
    pub path_is_literal: bool,
    /// `path` under the router's mount prefix, when one is declared in the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    /// Qualified path of the handler symbol.
    pub handler: String,
    #[serde(skip)]
    pub handler_id: SymbolId,
    pub framework: Framework,
    /// Decorated object (`app`, `router`, `bp`).
    pub router: String,
    pub position: Position,
}

/// Extract every endpoint declared by a route decorator in the file.
pub fn extract_endpoints(
    path: &Path,
    symbols: &SymbolTable,
    imports: &ImportMap,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Endpoint> {
    let hint = framework_hint(imports);
    let prefixes = router_prefixes(symbols);
    let mut endpoints = Vec::new();

    for symbol in symbols.iter() {
        if symbol.kind == SymbolKind::Class {
            continue;
        }
        for decorator in &symbol.decorators {
            match route_shape(decorator, hint) {
                Ok(Some(route)) => {
                    endpoints.extend(route.into_endpoints(symbol, decorator, &prefixes))
                }
                Ok(None) => {}
                Err(message) => diagnostics.push(Diagnostic::structural(
                    path,
                    decorator.position.line,
                    message,
                )),
            }
        }
    }

    endpoints.sort_by_key(|e| e.position);
    endpoints
}

struct Route {
    methods: Vec<String>,
    path: String,
    path_is_literal: bool,
    framework: Framework,
}

impl Route {
    fn into_endpoints(
        self,
        handler: &Symbol,
        decorator: &Decorator,
        prefixes: &BTreeMap<String, String>,
    ) -> Vec<Endpoint> {
        let router = decorator.object().unwrap_or_default().to_string();
        let full_path = prefixes
            .get(&router)
            .filter(|_| self.path_is_literal)
            .map(|prefix| join_paths(prefix, &self.path));
        self.methods
            .into_iter()
            .map(|method| Endpoint {
                method,
                path: self.path.clone(),
                path_is_literal: self.path_is_literal,
                full_path: full_path.clone(),
                handler: handler.qualified_name.clone(),
                handler_id: handler.id,
                framework: self.framework,
                router: router.clone(),
                position: decorator.position,
            })
            .collect()
    }
}

/// `Ok(None)` for decorators that are not routes; `Err` for route decorators
/// whose arguments cannot be read.
fn route_shape(decorator: &Decorator, hint: Option<Framework>) -> Result<Option<Route>, String> {
    if !decorator.is_call || decorator.object().is_none() {
        return Ok(None);
    }
    let attribute = decorator.attribute();
    let (methods, framework) = match attribute {
        "route" => (
            route_methods(decorator)?,
            hint.unwrap_or(Framework::Flask),
        ),
        "api_route" => (
            route_methods(decorator)?,
            hint.unwrap_or(Framework::Fastapi),
        ),
        verb if HTTP_VERBS.contains(&verb) => (
            vec![verb.to_ascii_uppercase()],
            hint.unwrap_or(Framework::Fastapi),
        ),
        _ => return Ok(None),
    };

    let path_arg = expr::positional(&decorator.args, 0)
        .or_else(|| expr::keyword(&decorator.args, "path"))
        .or_else(|| expr::keyword(&decorator.args, "rule"));
    let (path, path_is_literal) = match path_arg {
        Some(ArgValue::Str(path)) => {
            // Not a URL path: some other library's decorator (`@mock.patch("pkg.fn")`).
            if !path.is_empty() && !path.starts_with('/') {
                return Ok(None);
            }
            (path.clone(), true)
        }
        Some(other) => (other.render(), false),
        None => {
            return Err(format!(
                "skipped route decorator `@{}` without a path",
                decorator.callee
            ))
        }
    };

    Ok(Some(Route {
        methods,
        path,
        path_is_literal,
        framework,
    }))
}

fn route_methods(decorator: &Decorator) -> Result<Vec<String>, String> {
    let Some(value) = expr::keyword(&decorator.args, "methods") else {
        return Ok(vec!["GET".to_string()]);
    };
    let Some(listed) = value.as_str_list() else {
        return Err(format!(
            "skipped route decorator `@{}` with non-literal methods `{}`",
            decorator.callee,
            value.render()
        ));
    };
    let mut methods: Vec<String> = Vec::new();
    for method in listed {
        let method = method.to_ascii_uppercase();
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    Ok(methods)
}

/// Decisive framework import, if the file imports exactly one of them.
fn framework_hint(imports: &ImportMap) -> Option<Framework> {
    match (
        imports.imports_package("flask"),
        imports.imports_package("fastapi"),
    ) {
        (true, false) => Some(Framework::Flask),
        (false, true) => Some(Framework::Fastapi),
        _ => None,
    }
}

/// Mount prefix per router variable, from router constructors and
/// module-level `include_router` / `register_blueprint` calls.
fn router_prefixes(symbols: &SymbolTable) -> BTreeMap<String, String> {
    let mut constructed: BTreeMap<String, String> = BTreeMap::new();
    for binding in &symbols.bindings {
        let Some(call) = &binding.value_call else {
            continue;
        };
        let constructor = call.callee.rsplit('.').next().unwrap_or_default();
        let keyword = match constructor {
            "APIRouter" => "prefix",
            "Blueprint" => "url_prefix",
            _ => continue,
        };
        if let Some(prefix) = expr::keyword(&call.args, keyword).and_then(ArgValue::as_str) {
            constructed.insert(binding.name.clone(), prefix.to_string());
        }
    }

    let mut mounted: BTreeMap<String, String> = BTreeMap::new();
    let mut replaced: BTreeMap<String, String> = BTreeMap::new();
    for call in &symbols.module_calls {
        let method = call.callee.rsplit('.').next().unwrap_or_default();
        let Some(ArgValue::Expr(router)) = expr::positional(&call.args, 0) else {
            continue;
        };
        match method {
            "include_router" => {
                if let Some(prefix) = expr::keyword(&call.args, "prefix").and_then(ArgValue::as_str) {
                    mounted.insert(router.clone(), prefix.to_string());
                }
            }
            "register_blueprint" => {
                if let Some(prefix) =
                    expr::keyword(&call.args, "url_prefix").and_then(ArgValue::as_str)
                {
                    replaced.insert(router.clone(), prefix.to_string());
                }
            }
            _ => {}
        }
    }

    let mut prefixes = constructed;
    // A blueprint registered with `url_prefix` drops its own prefix.
    for (router, prefix) in replaced {
        prefixes.insert(router, prefix);
    }
    for (router, outer) in mounted {
        let inner = prefixes.get(&router).cloned().unwrap_or_default();
        prefixes.insert(router, join_paths(&outer, &inner));
    }
    prefixes
}

/// Join two URL path fragments with exactly one slash between them.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => prefix.to_string(),
        (true, false) => format!("/{path}"),
        (false, false) => format!("{prefix}/{path}"),
    }
}
