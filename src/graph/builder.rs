//! Graph construction module

use crate::graph::network::{Edge, GeneNetwork};
use std::collections::HashMap;

/// What happened to an edge handed to the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// A new interaction was recorded
    Added,
    /// The pair already existed; its score was overwritten
    Replaced,
    /// Both endpoints were the same gene
    SelfLoop,
}

/// Builder for incrementally constructing a GeneNetwork
pub struct GraphBuilder {
    /// Mapping from gene identifiers to node indices
    id_to_index: HashMap<String, u32>,

    /// Gene identifiers, in first-seen order
    node_ids: Vec<String>,

    /// Position of each canonical pair in `edges`
    edge_slots: HashMap<(u32, u32), usize>,

    /// Canonical edges, in first-seen order
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new graph builder with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            edge_slots: HashMap::with_capacity(capacity),
            edges: Vec::with_capacity(capacity),
        }
    }

    /// Get or create a node index for the given gene
    pub fn get_or_create_node(&mut self, id: &str) -> u32 {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }

        let idx = self.node_ids.len() as u32;
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());

        idx
    }

    /// Add an undirected interaction. Duplicates keep the last score seen.
    pub fn add_edge(&mut self, gene_a: &str, gene_b: &str, score: f64) -> EdgeInsert {
        if gene_a == gene_b {
            return EdgeInsert::SelfLoop;
        }

        let a = self.get_or_create_node(gene_a);
        let b = self.get_or_create_node(gene_b);
        let key = (a.min(b), a.max(b));

        if let Some(&slot) = self.edge_slots.get(&key) {
            self.edges[slot].score = score;
            return EdgeInsert::Replaced;
        }

        self.edge_slots.insert(key, self.edges.len());
        self.edges.push(Edge {
            a: key.0,
            b: key.1,
            score,
        });

        EdgeInsert::Added
    }

    /// Build the compressed network
    pub fn build(self) -> GeneNetwork {
        GeneNetwork::from_parts(self.node_ids, self.edges)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
