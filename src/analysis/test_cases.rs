use crate::analysis::expr;
use crate::analysis::symbols::{Symbol, SymbolKind, SymbolTable};
use crate::parse::Position;
use serde::Serialize;

/// Naming conventions that mark tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOptions {
    pub function_prefixes: Vec<String>,
    pub class_prefixes: Vec<String>,
    /// Classes deriving from one of these are test classes whatever their name.
    pub base_classes: Vec<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            function_prefixes: vec!["test".to_string()],
            class_prefixes: vec!["Test".to_string()],
            base_classes: vec!["TestCase".to_string(), "unittest.TestCase".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    TestFunction,
    TestMethod,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TestCase {
    /// Qualified path of the test symbol.
    pub symbol: String,
    pub kind: TestKind,
    /// Owning test class, for test methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub is_async: bool,
    pub position: Position,
}

pub fn detect_tests(symbols: &SymbolTable, options: &TestOptions) -> Vec<TestCase> {
    symbols
        .iter()
        .filter_map(|symbol| match symbol.kind {
            SymbolKind::Function if symbol.parent.is_none() && has_test_name(symbol, options) => {
                Some(test_case(symbol, TestKind::TestFunction, None))
            }
            SymbolKind::Method if has_test_name(symbol, options) => {
                let class = symbols.get(symbol.parent?);
                is_test_class(class, options).then(|| {
                    test_case(symbol, TestKind::TestMethod, Some(class.qualified_name.clone()))
                })
            }
            _ => None,
        })
        .collect()
}

fn test_case(symbol: &Symbol, kind: TestKind, group: Option<String>) -> TestCase {
    TestCase {
        symbol: symbol.qualified_name.clone(),
        kind,
        group,
        is_async: symbol.is_async,
        position: symbol.position,
    }
}

fn has_test_name(symbol: &Symbol, options: &TestOptions) -> bool {
    options
        .function_prefixes
        .iter()
        .any(|prefix| symbol.name.starts_with(prefix.as_str()))
}

fn is_test_class(class: &Symbol, options: &TestOptions) -> bool {
    options
        .class_prefixes
        .iter()
        .any(|prefix| class.name.starts_with(prefix.as_str()))
        || class.bases.iter().any(|base| {
            let base = expr::base_name(base);
            options.base_classes.iter().any(|b| b == base)
        })
}
