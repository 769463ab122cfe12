//! Literal views of Python expressions.
//!
//! Pattern matchers downstream only care about a handful of shapes (string
//! literals, templated strings, lists of strings, dotted names). Everything
//! else is kept as source text.

use crate::parse::common::{named_children, node_text};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    /// Plain string literal, quotes and prefix removed.
    Str(String),
    /// f-string or `"...".format(...)`; the body is kept with its `{...}` placeholders.
    Template(String),
    /// List, tuple or set display.
    List(Vec<ArgValue>),
    /// Any other expression, as written.
    Expr(String),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// String items of a list display; `None` if any item is not a plain string.
    pub fn as_str_list(&self) -> Option<Vec<&str>> {
        match self {
            ArgValue::List(items) => items.iter().map(ArgValue::as_str).collect(),
            _ => None,
        }
    }

    /// Source-like rendering, used when a value has to be reported verbatim.
    pub fn render(&self) -> String {
        match self {
            ArgValue::Str(s) | ArgValue::Template(s) | ArgValue::Expr(s) => s.clone(),
            ArgValue::List(items) => {
                let inner: Vec<String> = items.iter().map(ArgValue::render).collect();
                format!("[{}]", inner.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Argument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub value: ArgValue,
}

/// Positional argument `index`, if present.
pub fn positional(args: &[Argument], index: usize) -> Option<&ArgValue> {
    args.iter()
        .filter(|a| a.keyword.is_none())
        .nth(index)
        .map(|a| &a.value)
}

/// Keyword argument `name`, if present.
pub fn keyword<'a>(args: &'a [Argument], name: &str) -> Option<&'a ArgValue> {
    args.iter()
        .find(|a| a.keyword.as_deref() == Some(name))
        .map(|a| &a.value)
}

/// Read an `argument_list` node.
pub fn arguments(node: tree_sitter::Node<'_>, source: &[u8]) -> Vec<Argument> {
    named_children(node)
        .into_iter()
        .map(|child| match child.kind() {
            "keyword_argument" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string());
                let value = child
                    .child_by_field_name("value")
                    .map(|v| arg_value(v, source))
                    .unwrap_or_else(|| ArgValue::Expr(String::new()));
                Argument {
                    keyword: name,
                    value,
                }
            }
            _ => Argument {
                keyword: None,
                value: arg_value(child, source),
            },
        })
        .collect()
}

pub fn arg_value(node: tree_sitter::Node<'_>, source: &[u8]) -> ArgValue {
    match node.kind() {
        "string" | "concatenated_string" => string_value(node, source)
            .unwrap_or_else(|| ArgValue::Expr(node_text(node, source).to_string())),
        "list" | "tuple" | "set" => ArgValue::List(
            named_children(node)
                .into_iter()
                .map(|item| arg_value(item, source))
                .collect(),
        ),
        "parenthesized_expression" => match named_children(node).as_slice() {
            [inner] => arg_value(*inner, source),
            _ => ArgValue::Expr(node_text(node, source).to_string()),
        },
        "call" => format_template(node, source)
            .unwrap_or_else(|| ArgValue::Expr(node_text(node, source).to_string())),
        _ => ArgValue::Expr(node_text(node, source).to_string()),
    }
}

/// `"...".format(...)` keeps the receiver string as a template.
fn format_template(call: tree_sitter::Node<'_>, source: &[u8]) -> Option<ArgValue> {
    let function = call.child_by_field_name("function")?;
    if function.kind() != "attribute" {
        return None;
    }
    let attribute = function.child_by_field_name("attribute")?;
    if node_text(attribute, source) != "format" {
        return None;
    }
    let object = function.child_by_field_name("object")?;
    match string_value(object, source)? {
        ArgValue::Str(s) | ArgValue::Template(s) => Some(ArgValue::Template(s)),
        _ => None,
    }
}

/// Value of a `string` or `concatenated_string` node.
pub fn string_value(node: tree_sitter::Node<'_>, source: &[u8]) -> Option<ArgValue> {
    match node.kind() {
        "string" => {
            let (prefix, body) = split_string_literal(node_text(node, source))?;
            let formatted = prefix.contains(['f', 'F']);
            if formatted && body.contains('{') {
                Some(ArgValue::Template(body.to_string()))
            } else {
                Some(ArgValue::Str(body.to_string()))
            }
        }
        "concatenated_string" => {
            let mut text = String::new();
            let mut templated = false;
            for part in named_children(node) {
                match string_value(part, source)? {
                    ArgValue::Str(s) => text.push_str(&s),
                    ArgValue::Template(s) => {
                        templated = true;
                        text.push_str(&s);
                    }
                    _ => return None,
                }
            }
            Some(if templated {
                ArgValue::Template(text)
            } else {
                ArgValue::Str(text)
            })
        }
        _ => None,
    }
}

/// Split a string literal into its prefix (`f`, `rb`, ...) and body without quotes.
pub fn split_string_literal(text: &str) -> Option<(&str, &str)> {
    let quote_at = text.find(['"', '\''])?;
    let (prefix, quoted) = text.split_at(quote_at);
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if quoted.len() >= 2 * quote.len() && quoted.starts_with(quote) && quoted.ends_with(quote)
        {
            return Some((prefix, &quoted[quote.len()..quoted.len() - quote.len()]));
        }
    }
    None
}

/// Docstring text with quotes removed and surrounding whitespace trimmed.
pub fn clean_docstring(text: &str) -> String {
    split_string_literal(text)
        .map(|(_, body)| body.trim().to_string())
        .unwrap_or_else(|| text.trim().to_string())
}

/// Segments of a pure dotted name (`a`, `a.b.c`); `None` for any other shape.
pub fn dotted_path(node: tree_sitter::Node<'_>, source: &[u8]) -> Option<Vec<String>> {
    match node.kind() {
        "identifier" => Some(vec![node_text(node, source).to_string()]),
        "attribute" => {
            let mut path = dotted_path(node.child_by_field_name("object")?, source)?;
            path.push(node_text(node.child_by_field_name("attribute")?, source).to_string());
            Some(path)
        }
        _ => None,
    }
}

/// Strip subscripts and call parentheses from a base-class expression:
/// `Generic[T]` → `Generic`, `typing.Protocol` stays as written.
pub fn base_name(expr: &str) -> &str {
    let end = expr.find(['[', '(']).unwrap_or(expr.len());
    expr[..end].trim()
}
