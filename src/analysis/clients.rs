use crate::analysis::calls::{CallKind, CallSite, CallTarget, ModuleCall, ResolvedCalls};
use crate::analysis::endpoints::HTTP_VERBS;
use crate::analysis::expr::{self, ArgValue, Argument};
use crate::parse::Position;
use serde::Serialize;

pub const DEFAULT_CLIENT_LIBRARIES: &[&str] = &["requests", "httpx", "aiohttp"];

/// URL argument of an outbound call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PathExpr {
    Literal(String),
    /// f-string or `.format()` template with placeholders kept.
    Template(String),
    /// Anything else, as written.
    Unresolved(String),
}

impl PathExpr {
    pub fn text(&self) -> &str {
        match self {
            PathExpr::Literal(s) | PathExpr::Template(s) | PathExpr::Unresolved(s) => s,
        }
    }
}

/// A detected outbound HTTP call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClientCall {
    /// Upper-case HTTP method.
    pub method: String,
    pub path: PathExpr,
    pub is_async: bool,
    /// Client library package (`requests`, `httpx`, ...).
    pub library: String,
    /// Qualified path of the calling symbol; `None` for calls made at import time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    pub callee: String,
    pub position: Position,
}

/// The parts of a resolved call the detector looks at.
struct CallView<'a> {
    caller: Option<&'a str>,
    callee: &'a str,
    kind: CallKind,
    target: &'a CallTarget,
    args: &'a [Argument],
    is_async: bool,
    position: Position,
}

impl<'a> From<&'a CallSite> for CallView<'a> {
    fn from(call: &'a CallSite) -> Self {
        Self {
            caller: Some(&call.caller),
            callee: &call.callee,
            kind: call.kind,
            target: &call.target,
            args: &call.args,
            is_async: call.is_async,
            position: call.position,
        }
    }
}

impl<'a> From<&'a ModuleCall> for CallView<'a> {
    fn from(call: &'a ModuleCall) -> Self {
        Self {
            caller: None,
            callee: &call.callee,
            kind: call.kind,
            target: &call.target,
            args: &call.args,
            is_async: call.is_async,
            position: call.position,
        }
    }
}

/// Pick the HTTP client calls out of the file's import-qualified calls,
/// attributed or made at import time, in source order.
///
/// Recognizes module-level helpers (`requests.get(url)`), calls through a
/// local client object (`client.get(url)` inside `async with httpx.AsyncClient()
/// as client`) and the generic `requests.request("POST", url)` form.
pub fn detect_client_calls(calls: &ResolvedCalls, libraries: &[String]) -> Vec<ClientCall> {
    let attributed = calls.calls.iter().map(CallView::from);
    let module_level = calls.module_level.iter().map(CallView::from);
    let mut found: Vec<ClientCall> = attributed
        .chain(module_level)
        .filter(|call| call.kind == CallKind::ImportQualifiedCall)
        .filter_map(|call| client_call(&call, libraries))
        .collect();
    found.sort_by_key(|c| c.position);
    found
}

fn client_call(call: &CallView<'_>, libraries: &[String]) -> Option<ClientCall> {
    let CallTarget::Import { module, name, .. } = call.target else {
        return None;
    };
    let library = module.split('.').next()?;
    if !libraries.iter().any(|l| l == library) {
        return None;
    }
    // Only a direct helper or client method: `requests.codes.get` and
    // `resp.headers.get` are not requests.
    let attribute = name.as_deref().filter(|name| !name.contains('.'))?;

    let (method, url_index) = if HTTP_VERBS.contains(&attribute) {
        (attribute.to_ascii_uppercase(), 0)
    } else if attribute == "request" {
        let method = expr::positional(call.args, 0)
            .or_else(|| expr::keyword(call.args, "method"))
            .and_then(ArgValue::as_str)?;
        (method.to_ascii_uppercase(), 1)
    } else {
        return None;
    };

    let url = expr::positional(call.args, url_index).or_else(|| expr::keyword(call.args, "url"));
    let path = match url {
        Some(ArgValue::Str(s)) => PathExpr::Literal(s.clone()),
        Some(ArgValue::Template(s)) => PathExpr::Template(s.clone()),
        Some(other) => PathExpr::Unresolved(other.render()),
        None => PathExpr::Unresolved(String::new()),
    };

    Some(ClientCall {
        method,
        path,
        is_async: call.is_async,
        library: library.to_string(),
        caller: call.caller.map(str::to_string),
        callee: call.callee.to_string(),
        position: call.position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::calls::resolve_calls;
    use crate::analysis::imports::collect_imports;
    use crate::analysis::symbols::build_symbols;
    use crate::parse::PythonParser;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn clients_of(src: &str) -> Vec<ClientCall> {
        let tree = PythonParser::new().parse(src).unwrap();
        let mut diagnostics = Vec::new();
        let imports = collect_imports(Path::new("c.py"), &tree, &mut diagnostics);
        let symbols = build_symbols(Path::new("c.py"), &tree, &mut diagnostics);
        let calls = resolve_calls(&tree, &symbols, &imports);
        let libraries: Vec<String> = DEFAULT_CLIENT_LIBRARIES.iter().map(|l| l.to_string()).collect();
        detect_client_calls(&calls, &libraries)
    }

    #[test]
    fn sync_module_call() {
        let calls = clients_of("import requests\n\ndef load():\n    return requests.get('https://example.com/api/items', timeout=3)\n");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[0].path, PathExpr::Literal("https://example.com/api/items".into()));
        assert!(!calls[0].is_async);
        assert_eq!(calls[0].library, "requests");
        assert_eq!(calls[0].caller.as_deref(), Some("load"));
    }

    #[test]
    fn async_context_managed_client() {
        let src = r#"
import httpx

async def list_agents(instance_id):
    async with httpx.AsyncClient() as client:
        return await client.get(f"/api/v1/instances/{instance_id}/agents")
"#;
        let calls = clients_of(src);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(
            calls[0].path,
            PathExpr::Template("/api/v1/instances/{instance_id}/agents".into())
        );
        assert!(calls[0].is_async);
        assert_eq!(calls[0].library, "httpx");
    }

    #[test]
    fn generic_request_form_and_url_keyword() {
        let src = "import requests\n\ndef send(base):\n    requests.request('post', base + '/jobs')\n    requests.put(url='/jobs/{}'.format(1))\n";
        let calls = clients_of(src);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].path, PathExpr::Unresolved("base + '/jobs'".into()));
        assert_eq!(calls[1].method, "PUT");
        assert_eq!(calls[1].path, PathExpr::Template("/jobs/{}".into()));
    }

    #[test]
    fn aliased_import_and_session() {
        let src = "import aiohttp\nimport requests as rq\n\nasync def go():\n    async with aiohttp.ClientSession() as session:\n        async with session.post('/submit') as resp:\n            pass\n    rq.delete('/x')\n";
        let calls = clients_of(src);
        let summary: Vec<(&str, &str, bool)> = calls
            .iter()
            .map(|c| (c.method.as_str(), c.library.as_str(), c.is_async))
            .collect();
        assert_eq!(summary, vec![("POST", "aiohttp", true), ("DELETE", "requests", false)]);
    }

    #[test]
    fn response_objects_do_not_become_clients() {
        let src = "import requests\n\ndef load():\n    resp = requests.get('/api/items')\n    resp.headers.get('content-type')\n    return resp.json()\n";
        let calls = clients_of(src);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].callee, "requests.get");
        assert_eq!(calls[0].path, PathExpr::Literal("/api/items".into()));
    }

    #[test]
    fn import_time_calls_have_no_caller() {
        let src = "import requests\n\nrequests.get('/health')\n\ndef later():\n    requests.post('/jobs')\n";
        let calls = clients_of(src);
        let summary: Vec<(&str, Option<&str>)> = calls
            .iter()
            .map(|c| (c.method.as_str(), c.caller.as_deref()))
            .collect();
        assert_eq!(summary, vec![("GET", None), ("POST", Some("later"))]);
        assert_eq!(calls[0].path, PathExpr::Literal("/health".into()));
    }

    #[test]
    fn module_clients_are_visible_to_functions_unless_shadowed() {
        let src = r#"
import httpx

client = httpx.Client(base_url="https://svc")

def ping():
    return client.get("/ping")

def relay(client):
    return client.get("/relay")
"#;
        let calls = clients_of(src);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].caller.as_deref(), Some("ping"));
        assert_eq!(calls[0].library, "httpx");
    }

    #[test]
    fn class_attributes_are_not_bare_names_in_methods() {
        let src = "import requests\n\nclass Api:\n    session = requests.Session()\n\n    def go(self):\n        session.get('/x')\n";
        assert!(clients_of(src).is_empty());
    }

    #[test]
    fn other_libraries_and_attributes_ignored() {
        let src = "import os\nimport requests\n\ndef f(d):\n    os.environ.get('X')\n    d.get('k')\n    requests.codes.get('ok')\n    requests.Session()\n";
        assert!(clients_of(src).is_empty());
    }
}
