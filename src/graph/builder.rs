use crate::analysis::{CallSite, CallTarget, FileAnalysis, SymbolKind};
use crate::graph::ir::{CallGraph, GraphEdge, GraphNode, NodeId};
use crate::parse::common::SourceLocation;
use crate::report::ProjectReport;
use std::collections::HashMap;
use std::path::Path;

/// Builds a CallGraph from analyzed files with node and edge deduplication.
pub struct GraphBuilder {
    graph: CallGraph,
    node_map: HashMap<GraphNode, NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: CallGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Get or create the node for `node`.
    fn ensure_node(&mut self, node: GraphNode) -> NodeId {
        if let Some(&idx) = self.node_map.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.node_map.insert(node, idx);
        idx
    }

    /// Add one call site of `file`. Unresolved calls add nothing.
    pub fn add_call(&mut self, file: &Path, call: &CallSite) {
        let target = match &call.target {
            CallTarget::Symbol { qualified_name, .. } => GraphNode::Symbol {
                file: file.to_path_buf(),
                path: qualified_name.clone(),
            },
            CallTarget::Import { module, name, .. } => GraphNode::External {
                module: module.clone(),
                name: name.clone(),
            },
            CallTarget::Unresolved { .. } => return,
        };
        let source_idx = self.ensure_node(GraphNode::Symbol {
            file: file.to_path_buf(),
            path: call.caller.clone(),
        });
        let target_idx = self.ensure_node(target);
        let location = SourceLocation {
            file: file.to_path_buf(),
            line: call.position.line,
            column: Some(call.position.column),
        };

        if let Some(edge_idx) = self.graph.find_edge(source_idx, target_idx) {
            let edge = &mut self.graph[edge_idx];
            if !edge.source_locations.contains(&location) {
                edge.source_locations.push(location);
            }
        } else {
            self.graph.add_edge(
                source_idx,
                target_idx,
                GraphEdge {
                    kind: call.kind,
                    source_locations: vec![location],
                },
            );
        }
    }

    /// Add every function and method of a file as a node, then its calls.
    pub fn add_file(&mut self, analysis: &FileAnalysis) {
        for symbol in analysis.symbols.iter() {
            if matches!(symbol.kind, SymbolKind::Function | SymbolKind::Method) {
                self.ensure_node(GraphNode::Symbol {
                    file: analysis.path.clone(),
                    path: symbol.qualified_name.clone(),
                });
            }
        }
        for call in &analysis.calls {
            self.add_call(&analysis.path, call);
        }
    }

    /// Consume the builder and return the built graph.
    pub fn build(self) -> CallGraph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Call graph of every analyzed file in a report.
pub fn build_call_graph(report: &ProjectReport) -> CallGraph {
    let mut builder = GraphBuilder::new();
    for analysis in &report.files {
        builder.add_file(analysis);
    }
    let graph = builder.build();
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built call graph"
    );
    graph
}
