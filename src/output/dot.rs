use crate::errors::Result;
use crate::graph::ir::CallGraph;
use petgraph::visit::EdgeRef;
use std::io::Write;

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Write the call graph in Graphviz DOT format.
pub fn write_dot<W: Write>(writer: &mut W, graph: &CallGraph) -> Result<()> {
    writeln!(writer, "digraph calls {{")?;
    writeln!(writer, "    rankdir=LR;")?;
    writeln!(
        writer,
        "    node [shape=box, style=filled, fillcolor=lightblue];"
    )?;
    writeln!(writer)?;

    for idx in graph.node_indices() {
        let node = &graph[idx];
        let name = escape(&node.name());
        if node.is_external() {
            writeln!(
                writer,
                "    \"{name}\" [label=\"{name}\", shape=ellipse, fillcolor=lightgrey];"
            )?;
        } else {
            writeln!(writer, "    \"{name}\" [label=\"{name}\"];")?;
        }
    }
    writeln!(writer)?;

    for edge in graph.edge_references() {
        let source_name = escape(&graph[edge.source()].name());
        let target_name = escape(&graph[edge.target()].name());
        let calls = edge.weight().weight();
        if calls > 1 {
            writeln!(
                writer,
                "    \"{source_name}\" -> \"{target_name}\" [label=\"{calls} calls\"];"
            )?;
        } else {
            writeln!(writer, "    \"{source_name}\" -> \"{target_name}\";")?;
        }
    }

    writeln!(writer, "}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CallKind;
    use crate::graph::ir::{GraphEdge, GraphNode};
    use crate::parse::common::SourceLocation;
    use std::path::PathBuf;

    fn location(line: usize) -> SourceLocation {
        SourceLocation {
            file: PathBuf::from("a.py"),
            line,
            column: None,
        }
    }

    #[test]
    fn dot_output_basic() {
        let mut graph = CallGraph::new();
        let a = graph.add_node(GraphNode::Symbol {
            file: PathBuf::from("a.py"),
            path: "main".to_string(),
        });
        let b = graph.add_node(GraphNode::Symbol {
            file: PathBuf::from("a.py"),
            path: "helper".to_string(),
        });
        let c = graph.add_node(GraphNode::External {
            module: "os".to_string(),
            name: Some("path.join".to_string()),
        });
        graph.add_edge(
            a,
            b,
            GraphEdge {
                kind: CallKind::SameFileCall,
                source_locations: vec![location(2), location(3)],
            },
        );
        graph.add_edge(
            a,
            c,
            GraphEdge {
                kind: CallKind::ImportQualifiedCall,
                source_locations: vec![location(4)],
            },
        );

        let mut output = Vec::new();
        write_dot(&mut output, &graph).unwrap();
        let dot = String::from_utf8(output).unwrap();
        assert!(dot.contains("digraph calls"));
        assert!(dot.contains("\"a.py::main\" -> \"a.py::helper\" [label=\"2 calls\"]"));
        assert!(dot.contains("\"a.py::main\" -> \"os.path.join\";"));
        assert!(dot.contains("\"os.path.join\" [label=\"os.path.join\", shape=ellipse"));
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(escape("a\"b"), "a\\\"b");
    }
}
