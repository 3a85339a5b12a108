use crate::core::edge::Edge;
use crate::core::party::PartyId;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Settling transfers as a directed graph, for rendering.
///
/// Nodes are participants, edges point from payer to payee and carry the
/// normalized amount.
///
/// # Examples
///
/// ```
/// use debt_simplifier::core::edge::Edge;
/// use debt_simplifier::core::party::PartyId;
/// use debt_simplifier::graph::transfer_graph::TransferGraph;
/// use rust_decimal_macros::dec;
///
/// let graph = TransferGraph::from_edges(&[
///     Edge::new(PartyId::new("A"), PartyId::new("B"), dec!(15)),
/// ]);
/// assert_eq!(graph.party_count(), 2);
/// assert!(graph.to_dot().starts_with("digraph {"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransferGraph {
    graph: DiGraph<PartyId, Decimal>,
    nodes: HashMap<PartyId, NodeIndex>,
}

impl TransferGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from edges, normalizing each one first.
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(edge.clone().normalized());
        }
        graph
    }

    pub fn add_edge(&mut self, edge: Edge) {
        let from = self.node(edge.from());
        let to = self.node(edge.to());
        self.graph.add_edge(from, to, edge.display_amount());
    }

    fn node(&mut self, party: &PartyId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(party) {
            return idx;
        }
        let idx = self.graph.add_node(party.clone());
        self.nodes.insert(party.clone(), idx);
        idx
    }

    pub fn party_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn transfer_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Graphviz DOT description of the transfers.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[]))
    }
}

/// One `A -> B: amount` line per edge, normalized.
pub fn render_plain(edges: &[Edge]) -> String {
    edges
        .iter()
        .map(|edge| format!("{}\n", edge.clone().normalized()))
        .collect()
}

/// Graphviz rendering of `edges`.
pub fn render_graphviz(edges: &[Edge]) -> String {
    TransferGraph::from_edges(edges).to_dot()
}
