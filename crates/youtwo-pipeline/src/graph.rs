//! Directed knowledge graph built over petgraph

use petgraph::algo::{connected_components, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use youtwo_core::Relation;

/// Directed graph with entity names as nodes and relation types as edge labels
///
/// Nodes are deduplicated by name. Adding an edge between a pair that is
/// already connected replaces the label, so the last relation applied wins.
/// Self-loops are kept.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    graph: DiGraph<String, String>,
    index: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from relations; every endpoint becomes a node
    pub fn from_relations<'a>(relations: impl IntoIterator<Item = &'a Relation>) -> Self {
        let mut graph = Self::new();
        for rel in relations {
            graph.add_edge(&rel.source, &rel.target, &rel.relation_type);
        }
        graph
    }

    /// Add a node, or return the existing one with that name
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    pub fn add_edge(&mut self, source: &str, target: &str, label: &str) {
        let s = self.add_node(source);
        let t = self.add_node(target);
        self.graph.update_edge(s, t, label.to_string());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Label of the edge `source -> target`, if any
    pub fn edge_label(&self, source: &str, target: &str) -> Option<&str> {
        let s = *self.index.get(source)?;
        let t = *self.index.get(target)?;
        self.graph
            .find_edge(s, t)
            .and_then(|e| self.graph.edge_weight(e))
            .map(String::as_str)
    }

    /// Every node reachable from every other, ignoring direction.
    /// False for the empty graph.
    pub fn is_weakly_connected(&self) -> bool {
        self.node_count() > 0 && connected_components(&self.graph) == 1
    }

    /// Whether any directed cycle (including a self-loop) exists.
    /// False for the empty graph.
    pub fn has_cycles(&self) -> bool {
        self.node_count() > 0 && is_cyclic_directed(&self.graph)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// `(source, target, label)` triples
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                e.weight().as_str(),
            )
        })
    }
}
