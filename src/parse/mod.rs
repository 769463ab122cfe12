pub mod common;
pub mod python;

pub use common::{Position, SourceLocation};
pub use python::{PythonParser, SyntaxTree};
