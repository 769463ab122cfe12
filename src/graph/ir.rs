use crate::analysis::CallKind;
use crate::parse::common::SourceLocation;
use petgraph::graph::DiGraph;
use serde::Serialize;
use std::path::PathBuf;

/// Unique identifier for a graph node
pub type NodeId = petgraph::graph::NodeIndex;

/// The project call graph
pub type CallGraph = DiGraph<GraphNode, GraphEdge>;

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphNode {
    /// A function, method or class defined in an analyzed file.
    Symbol { file: PathBuf, path: String },
    /// A name reached through an import.
    External {
        module: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl GraphNode {
    /// Human-readable label, e.g. `app/views.py::Handler.get` or `requests.get`.
    pub fn name(&self) -> String {
        match self {
            GraphNode::Symbol { file, path } => format!("{}::{}", file.display(), path),
            GraphNode::External { module, name: Some(name) } => format!("{module}.{name}"),
            GraphNode::External { module, name: None } => module.clone(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, GraphNode::External { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    /// How the first contributing call was resolved.
    pub kind: CallKind,
    /// Every call site that contributed to this edge
    pub source_locations: Vec<SourceLocation>,
}

impl GraphEdge {
    pub fn weight(&self) -> usize {
        self.source_locations.len()
    }
}
