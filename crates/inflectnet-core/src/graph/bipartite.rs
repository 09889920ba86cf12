//! Weighted lexeme–triphone network backed by petgraph::UnGraph.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::config::{EdgeOutput, GraphOutput, NodeOutput};

/// The two node kinds of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Lexeme,
    Triphone,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Lexeme => "lexeme",
            NodeKind::Triphone => "triphone",
        }
    }
}

/// Node data stored in the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    Lexeme { id: String },
    Triphone { id: String },
}

impl GraphNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            GraphNode::Lexeme { .. } => NodeKind::Lexeme,
            GraphNode::Triphone { .. } => NodeKind::Triphone,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            GraphNode::Lexeme { id } | GraphNode::Triphone { id } => id,
        }
    }

    pub fn is_lexeme(&self) -> bool {
        matches!(self, GraphNode::Lexeme { .. })
    }
}

/// Undirected bipartite graph. Edges only join a lexeme to a triphone and
/// always carry a strictly positive weight.
#[derive(Debug, Clone, Default)]
pub struct BipartiteGraph {
    graph: UnGraph<GraphNode, f64>,
    /// Per-kind id → NodeIndex lookup, so a lexeme and a triphone may share text.
    lexeme_index: HashMap<String, NodeIndex>,
    triphone_index: HashMap<String, NodeIndex>,
}

impl BipartiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a lexeme node.
    pub fn ensure_lexeme(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.lexeme_index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode::Lexeme { id: id.to_string() });
        self.lexeme_index.insert(id.to_string(), idx);
        idx
    }

    /// Get or create a triphone node.
    pub fn ensure_triphone(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.triphone_index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode::Triphone { id: id.to_string() });
        self.triphone_index.insert(id.to_string(), idx);
        idx
    }

    /// Add `weight` to the (lexeme, triphone) edge, creating nodes and edge on
    /// first reference. Non-positive or non-finite weights are refused.
    pub fn add_weight(&mut self, lexeme: &str, triphone: &str, weight: f64) -> bool {
        if !(weight.is_finite() && weight > 0.0) {
            log::warn!("Refusing edge {lexeme} -- {triphone} with weight {weight}");
            return false;
        }
        let li = self.ensure_lexeme(lexeme);
        let ti = self.ensure_triphone(triphone);
        match self.graph.find_edge(li, ti) {
            Some(e) => self.graph[e] += weight,
            None => {
                self.graph.add_edge(li, ti, weight);
            }
        }
        true
    }

    // --- Queries ---

    /// Underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<GraphNode, f64> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn lexeme_count(&self) -> usize {
        self.lexeme_index.len()
    }

    pub fn triphone_count(&self) -> usize {
        self.triphone_index.len()
    }

    pub fn has_lexeme(&self, id: &str) -> bool {
        self.lexeme_index.contains_key(id)
    }

    pub fn has_triphone(&self, id: &str) -> bool {
        self.triphone_index.contains_key(id)
    }

    /// Lexeme ids in node order.
    pub fn lexemes(&self) -> Vec<&str> {
        self.graph
            .node_weights()
            .filter(|n| n.is_lexeme())
            .map(GraphNode::id)
            .collect()
    }

    /// Triphone ids in node order.
    pub fn triphones(&self) -> Vec<&str> {
        self.graph
            .node_weights()
            .filter(|n| !n.is_lexeme())
            .map(GraphNode::id)
            .collect()
    }

    pub fn edge_weight(&self, lexeme: &str, triphone: &str) -> Option<f64> {
        let li = *self.lexeme_index.get(lexeme)?;
        let ti = *self.triphone_index.get(triphone)?;
        self.graph.find_edge(li, ti).map(|e| self.graph[e])
    }

    /// Triphone neighbours of a lexeme with edge weights.
    pub fn lexeme_neighbours(&self, lexeme: &str) -> Vec<(&str, f64)> {
        let Some(&li) = self.lexeme_index.get(lexeme) else {
            return Vec::new();
        };
        self.graph
            .edges(li)
            .map(|e| (self.graph[e.target()].id(), *e.weight()))
            .collect()
    }

    /// Weighted degree of a lexeme; zero for isolated or unknown lexemes.
    pub fn lexeme_degree(&self, lexeme: &str) -> f64 {
        self.lexeme_neighbours(lexeme).iter().map(|&(_, w)| w).sum()
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }

    /// Serialise to nodes tagged by kind plus (lexeme, triphone, weight) triples.
    pub fn to_output(&self) -> GraphOutput {
        let nodes = self
            .graph
            .node_weights()
            .map(|n| NodeOutput {
                id: n.id().to_string(),
                kind: n.kind().as_str().to_string(),
            })
            .collect();

        let edges = self
            .graph
            .edge_references()
            .map(|e| {
                let (a, b) = (&self.graph[e.source()], &self.graph[e.target()]);
                let (lexeme, triphone) = if a.is_lexeme() { (a, b) } else { (b, a) };
                EdgeOutput {
                    lexeme: lexeme.id().to_string(),
                    triphone: triphone.id().to_string(),
                    weight: *e.weight(),
                }
            })
            .collect();

        GraphOutput { nodes, edges }
    }
}
