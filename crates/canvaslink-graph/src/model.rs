use std::collections::HashMap;
use std::fmt;

use canvaslink_core::ids::{EdgeId, NodeId};
use serde::Serialize;

/// A labeled vertex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A directed connection between two existing nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
}

/// Renders the row shown for an edge, e.g. `node-1 → node-2`.
impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Serializable view of the whole graph.
#[derive(Clone, Debug, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Append-only directed graph. Nodes and edges are kept in insertion order;
/// nothing is ever removed or mutated.
///
/// Cycles and parallel edges are allowed. Self-loops and edges touching an
/// unknown node are not.
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, usize>,
    pair_counts: HashMap<(NodeId, NodeId), usize>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next node (`node-<n>` / `Node <n>`) and return its id.
    pub fn add_node(&mut self) -> NodeId {
        let ordinal = self.nodes.len() + 1;
        let id = NodeId::nth(ordinal);
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(Node {
            id: id.clone(),
            label: format!("Node {ordinal}"),
        });
        tracing::debug!(node_id = %id, "node added");
        id
    }

    /// Append an edge `from → to`. Returns `None` without touching the graph
    /// when either id is empty or unknown, or when `from == to`.
    pub fn connect(&mut self, from: &NodeId, to: &NodeId) -> Option<EdgeId> {
        if from.is_empty() || to.is_empty() {
            tracing::debug!(from = %from, to = %to, "connect ignored: missing endpoint");
            return None;
        }
        if from == to {
            tracing::debug!(node_id = %from, "connect ignored: self-loop");
            return None;
        }
        if !self.contains(from) || !self.contains(to) {
            tracing::debug!(from = %from, to = %to, "connect ignored: unknown node");
            return None;
        }

        let occurrence = self
            .pair_counts
            .entry((from.clone(), to.clone()))
            .and_modify(|n| *n += 1)
            .or_insert(1);
        let id = EdgeId::derive(from, to, *occurrence);

        self.edges.push(Edge {
            id: id.clone(),
            from: from.clone(),
            to: to.clone(),
        });
        tracing::debug!(edge_id = %id, "edge added");
        Some(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from_raw(s)
    }

    fn graph_with(n: usize) -> GraphModel {
        let mut graph = GraphModel::new();
        for _ in 0..n {
            graph.add_node();
        }
        graph
    }

    #[test]
    fn add_node_numbers_sequentially() {
        let graph = graph_with(5);
        assert_eq!(graph.node_count(), 5);
        for (i, node) in graph.nodes().iter().enumerate() {
            assert_eq!(node.id.as_str(), format!("node-{}", i + 1));
            assert_eq!(node.label, format!("Node {}", i + 1));
        }
    }

    #[test]
    fn add_node_unaffected_by_interleaved_connects() {
        let mut graph = GraphModel::new();
        graph.add_node();
        graph.connect(&id("node-1"), &id("node-1"));
        graph.add_node();
        graph.connect(&id("node-1"), &id("node-2"));
        graph.connect(&id("node-9"), &id("node-2"));
        let third = graph.add_node();

        assert_eq!(third.as_str(), "node-3");
        let labels: Vec<_> = graph.nodes().iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Node 1", "Node 2", "Node 3"]);
    }

    #[test]
    fn self_loop_rejected() {
        let mut graph = graph_with(3);
        for n in 1..=3 {
            let node = NodeId::nth(n);
            assert!(graph.connect(&node, &node).is_none());
        }
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn unknown_endpoint_rejected() {
        let mut graph = graph_with(2);
        assert!(graph.connect(&id("node-1"), &id("node-3")).is_none());
        assert!(graph.connect(&id("ghost"), &id("node-2")).is_none());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn empty_endpoint_rejected() {
        let mut graph = graph_with(2);
        assert!(graph.connect(&id(""), &id("node-2")).is_none());
        assert!(graph.connect(&id("node-1"), &id("")).is_none());
        assert!(graph.connect(&id(""), &id("")).is_none());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn connect_creates_edge() {
        let mut graph = graph_with(2);
        let edge_id = graph.connect(&id("node-1"), &id("node-2")).unwrap();

        assert_eq!(edge_id.as_str(), "node-1-node-2");
        assert_eq!(graph.edge_count(), 1);
        let edge = &graph.edges()[0];
        assert_eq!(edge.from, id("node-1"));
        assert_eq!(edge.to, id("node-2"));
        assert_eq!(edge.to_string(), "node-1 → node-2");
    }

    #[test]
    fn parallel_edges_get_distinct_ids() {
        let mut graph = graph_with(2);
        let a = graph.connect(&id("node-1"), &id("node-2")).unwrap();
        let b = graph.connect(&id("node-1"), &id("node-2")).unwrap();
        let c = graph.connect(&id("node-2"), &id("node-1")).unwrap();

        assert_eq!(a.as_str(), "node-1-node-2");
        assert_eq!(b.as_str(), "node-1-node-2-2");
        assert_eq!(c.as_str(), "node-2-node-1");
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn cycles_allowed() {
        let mut graph = graph_with(3);
        assert!(graph.connect(&id("node-1"), &id("node-2")).is_some());
        assert!(graph.connect(&id("node-2"), &id("node-3")).is_some());
        assert!(graph.connect(&id("node-3"), &id("node-1")).is_some());
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn node_lookup() {
        let graph = graph_with(2);
        assert_eq!(graph.node(&id("node-2")).unwrap().label, "Node 2");
        assert!(graph.node(&id("node-3")).is_none());
        assert_eq!(graph.node(&id("node-1")).unwrap().to_string(), "Node 1");
    }

    #[test]
    fn snapshot_serializes() {
        let mut graph = graph_with(2);
        graph.connect(&id("node-1"), &id("node-2"));

        let json = serde_json::to_value(graph.snapshot()).unwrap();
        assert_eq!(json["nodes"][0]["id"], "node-1");
        assert_eq!(json["nodes"][1]["label"], "Node 2");
        assert_eq!(json["edges"][0]["id"], "node-1-node-2");
        assert_eq!(json["edges"][0]["from"], "node-1");
        assert_eq!(json["edges"][0]["to"], "node-2");
    }
}
