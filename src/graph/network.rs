//! Memory-efficient weighted gene network representation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single undirected interaction between two genes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Lower-indexed endpoint
    pub a: u32,

    /// Higher-indexed endpoint
    pub b: u32,

    /// Similarity score in [0, 1]
    pub score: f64,
}

impl Edge {
    /// Distance derived from the similarity score
    pub fn distance(&self) -> f64 {
        1.0 - self.score
    }
}

/// Compressed sparse representation of an undirected, weighted gene network.
///
/// Node indices follow the order in which genes first appear in the input, and
/// `edges` keeps the order in which each interaction was first seen. Every
/// traversal in the crate walks these two orders, which is what makes the
/// clustering algorithms reproducible.
#[derive(Debug, Clone, Serialize)]
pub struct GeneNetwork {
    /// Gene identifiers, indexed by node
    pub node_ids: Vec<String>,

    /// Offset array: offsets[i] to offsets[i+1] is the neighbor range of node i
    pub offsets: Vec<u32>,

    /// Concatenated, sorted neighbor lists
    pub neighbors: Vec<u32>,

    /// Scores aligned with `neighbors`
    pub weights: Vec<f64>,

    /// Canonical edge list (a < b), in first-seen order
    pub edges: Vec<Edge>,

    #[serde(skip)]
    index: HashMap<String, u32>,
}

impl GeneNetwork {
    /// A network with no genes and no interactions
    pub fn empty() -> Self {
        Self {
            node_ids: Vec::new(),
            offsets: vec![0],
            neighbors: Vec::new(),
            weights: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Assemble a network from node identifiers and canonical edges
    pub(crate) fn from_parts(node_ids: Vec<String>, edges: Vec<Edge>) -> Self {
        let node_count = node_ids.len();

        let mut adjacency: Vec<Vec<(u32, f64)>> = vec![Vec::new(); node_count];
        for edge in &edges {
            adjacency[edge.a as usize].push((edge.b, edge.score));
            adjacency[edge.b as usize].push((edge.a, edge.score));
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut neighbors = Vec::with_capacity(edges.len() * 2);
        let mut weights = Vec::with_capacity(edges.len() * 2);
        offsets.push(0);

        for list in &mut adjacency {
            // Sort for binary search efficiency
            list.sort_unstable_by_key(|&(n, _)| n);
            for &(n, w) in list.iter() {
                neighbors.push(n);
                weights.push(w);
            }
            offsets.push(neighbors.len() as u32);
        }

        let index = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect();

        Self {
            node_ids,
            offsets,
            neighbors,
            weights,
            edges,
            index,
        }
    }

    /// Number of genes
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Number of undirected interactions
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    /// Neighbors of a node, sorted by index
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.neighbors[start..end]
    }

    /// Neighbors of a node together with the connecting score
    pub fn weighted_neighbors(&self, node: usize) -> impl Iterator<Item = (u32, f64)> + '_ {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        self.neighbors[start..end]
            .iter()
            .copied()
            .zip(self.weights[start..end].iter().copied())
    }

    /// Check if there's an edge between two nodes
    pub fn has_edge(&self, a: usize, b: u32) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Unweighted degree of a node
    pub fn degree(&self, node: usize) -> usize {
        (self.offsets[node + 1] - self.offsets[node]) as usize
    }

    /// Sum of the scores of all edges incident to a node
    pub fn weighted_degree(&self, node: usize) -> f64 {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        self.weights[start..end].iter().sum()
    }

    /// Sum of all edge scores
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.score).sum()
    }

    /// Gene identifier of a node
    pub fn node_id(&self, node: usize) -> &str {
        &self.node_ids[node]
    }

    /// Node index of a gene identifier
    pub fn index_of(&self, id: &str) -> Option<u32> {
        self.index.get(id).copied()
    }

    /// Resolve a set of node indices to sorted gene identifiers
    pub fn labels(&self, members: &[u32]) -> Vec<String> {
        let mut labels: Vec<String> = members
            .iter()
            .map(|&n| self.node_ids[n as usize].clone())
            .collect();
        labels.sort();
        labels
    }
}

impl Default for GeneNetwork {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn adjacency_is_symmetric_and_sorted() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("C", "A", 0.5);
        builder.add_edge("A", "B", 0.9);
        let graph = builder.build();

        let a = graph.index_of("A").unwrap() as usize;
        let b = graph.index_of("B").unwrap();
        let c = graph.index_of("C").unwrap();

        assert_eq!(graph.degree(a), 2);
        assert!(graph.has_edge(a, b));
        assert!(graph.has_edge(b as usize, a as u32));
        assert!(graph.neighbors(a).windows(2).all(|w| w[0] < w[1]));
        assert!(graph.weighted_neighbors(a).any(|(n, w)| n == c && w == 0.5));
        assert!((graph.weighted_degree(a) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn distance_is_complement_of_score() {
        let edge = Edge { a: 0, b: 1, score: 0.7 };
        assert!((edge.distance() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn empty_network_has_no_nodes() {
        let graph = GeneNetwork::empty();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.total_weight(), 0.0);
    }
}
