use crate::errors::Result;
use crate::graph::ir::{CallGraph, GraphEdge, GraphNode};
use crate::report::ProjectReport;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct AnalyzeOutput<'a> {
    pub metadata: Metadata,
    pub report: &'a ProjectReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub root: PathBuf,
    pub files_discovered: usize,
    pub files_parsed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub timestamp: u64,
    pub elapsed_ms: u64,
    pub files_per_second: f64,
}

#[derive(Debug, Serialize)]
pub struct GraphOutput<'a> {
    pub nodes: Vec<&'a GraphNode>,
    pub edges: Vec<EdgeOutput<'a>>,
}

#[derive(Debug, Serialize)]
pub struct EdgeOutput<'a> {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub edge: &'a GraphEdge,
}

/// Write analyze output as JSON.
pub fn write_analyze_json<W: Write>(
    writer: &mut W,
    report: &ProjectReport,
    metadata: Metadata,
) -> Result<()> {
    let output = AnalyzeOutput { metadata, report };
    serde_json::to_writer_pretty(&mut *writer, &output)?;
    writeln!(writer)?;
    Ok(())
}

/// Write the call graph as `{nodes, edges}` JSON.
pub fn write_graph_json<W: Write>(writer: &mut W, graph: &CallGraph) -> Result<()> {
    let nodes = graph.node_indices().map(|i| &graph[i]).collect();
    let edges = graph
        .edge_indices()
        .filter_map(|e| {
            let (s, t) = graph.edge_endpoints(e)?;
            Some(EdgeOutput {
                from: graph[s].name(),
                to: graph[t].name(),
                edge: &graph[e],
            })
        })
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &GraphOutput { nodes, edges })?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CallKind;
    use crate::parse::common::SourceLocation;

    fn metadata() -> Metadata {
        Metadata {
            root: PathBuf::from("/project"),
            files_discovered: 0,
            files_parsed: 0,
            files_failed: 0,
            files_skipped: 0,
            timestamp: 0,
            elapsed_ms: 3,
            files_per_second: 0.0,
        }
    }

    #[test]
    fn analyze_json_has_metadata_and_report() {
        let report = ProjectReport::default();
        let mut buf = Vec::new();
        write_analyze_json(&mut buf, &report, metadata()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["metadata"]["root"], "/project");
        assert_eq!(value["metadata"]["elapsed_ms"], 3);
        assert!(value["report"]["files"].as_array().unwrap().is_empty());
        assert_eq!(value["report"]["totals"]["files_analyzed"], 0);
    }

    #[test]
    fn graph_json_names_edge_endpoints() {
        let mut graph = CallGraph::new();
        let a = graph.add_node(GraphNode::Symbol {
            file: PathBuf::from("a.py"),
            path: "main".to_string(),
        });
        let b = graph.add_node(GraphNode::External {
            module: "requests".to_string(),
            name: Some("get".to_string()),
        });
        graph.add_edge(
            a,
            b,
            GraphEdge {
                kind: CallKind::ImportQualifiedCall,
                source_locations: vec![SourceLocation {
                    file: PathBuf::from("a.py"),
                    line: 4,
                    column: Some(4),
                }],
            },
        );

        let mut buf = Vec::new();
        write_graph_json(&mut buf, &graph).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["nodes"][0]["kind"], "symbol");
        assert_eq!(value["nodes"][1]["module"], "requests");
        assert_eq!(value["edges"][0]["from"], "a.py::main");
        assert_eq!(value["edges"][0]["to"], "requests.get");
        assert_eq!(value["edges"][0]["kind"], "import_qualified_call");
        assert_eq!(value["edges"][0]["source_locations"][0]["line"], 4);
    }
}
