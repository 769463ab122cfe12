pub mod builder;
pub mod ir;

pub use builder::{build_call_graph, GraphBuilder};
pub use ir::{CallGraph, GraphEdge, GraphNode};
