//! Comparison of two gene networks built for the same score threshold

use crate::graph::algorithms::connected_components;
use crate::graph::GeneNetwork;
use crate::topology::{density, mean_degree, round_to};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Basic structural figures of one network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub mean_degree: f64,
    pub density: f64,
    pub n_components: usize,
}

impl NetworkSummary {
    pub fn of(graph: &GeneNetwork) -> Self {
        let n_nodes = graph.node_count();
        let n_edges = graph.edge_count();
        Self {
            n_nodes,
            n_edges,
            mean_degree: round_to(mean_degree(n_nodes, n_edges), 2),
            density: round_to(density(n_nodes, n_edges), 4),
            n_components: if n_nodes == 0 {
                0
            } else {
                connected_components(graph).len()
            },
        }
    }
}

/// Edge overlap between two networks, with edges as sorted gene pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkComparison {
    pub left_label: String,
    pub right_label: String,
    pub left: NetworkSummary,
    pub right: NetworkSummary,
    pub union_nodes: usize,
    pub union_edges: usize,
    pub shared_edges: Vec<(String, String)>,
    pub left_only: Vec<(String, String)>,
    pub right_only: Vec<(String, String)>,
    /// |shared| / |union| x 100, two decimals
    pub overlap_percentage: f64,
}

/// Compare the interaction sets of two networks
pub fn compare_networks(
    left_label: &str,
    left: &GeneNetwork,
    right_label: &str,
    right: &GeneNetwork,
) -> NetworkComparison {
    let left_edges = edge_set(left);
    let right_edges = edge_set(right);

    let shared: Vec<(String, String)> = left_edges.intersection(&right_edges).cloned().collect();
    let left_only: Vec<(String, String)> = left_edges.difference(&right_edges).cloned().collect();
    let right_only: Vec<(String, String)> = right_edges.difference(&left_edges).cloned().collect();
    let union_edges = left_edges.union(&right_edges).count();

    let union_nodes = left
        .node_ids
        .iter()
        .chain(right.node_ids.iter())
        .unique()
        .count();

    let overlap_percentage = if union_edges == 0 {
        0.0
    } else {
        round_to(shared.len() as f64 / union_edges as f64 * 100.0, 2)
    };

    log::info!(
        "{} vs {}: {} shared interactions, {} only in {}, {} only in {} ({}% overlap)",
        left_label,
        right_label,
        shared.len(),
        left_only.len(),
        left_label,
        right_only.len(),
        right_label,
        overlap_percentage
    );

    NetworkComparison {
        left_label: left_label.to_string(),
        right_label: right_label.to_string(),
        left: NetworkSummary::of(left),
        right: NetworkSummary::of(right),
        union_nodes,
        union_edges,
        shared_edges: shared,
        left_only,
        right_only,
        overlap_percentage,
    }
}

fn edge_set(graph: &GeneNetwork) -> BTreeSet<(String, String)> {
    graph
        .edges
        .iter()
        .map(|e| {
            let a = graph.node_id(e.a as usize);
            let b = graph.node_id(e.b as usize);
            if a <= b {
                (a.to_string(), b.to_string())
            } else {
                (b.to_string(), a.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn network(edges: &[(&str, &str)]) -> GeneNetwork {
        let mut builder = GraphBuilder::new();
        for &(a, b) in edges {
            builder.add_edge(a, b, 0.7);
        }
        builder.build()
    }

    #[test]
    fn overlap_ignores_edge_orientation() {
        let hpo = network(&[("A", "B"), ("B", "C")]);
        let manual = network(&[("B", "A"), ("C", "D")]);
        let comparison = compare_networks("hpo", &hpo, "manual", &manual);

        assert_eq!(comparison.shared_edges, vec![("A".to_string(), "B".to_string())]);
        assert_eq!(comparison.left_only.len(), 1);
        assert_eq!(comparison.right_only.len(), 1);
        assert_eq!(comparison.union_edges, 3);
        assert_eq!(comparison.union_nodes, 4);
        assert_eq!(comparison.overlap_percentage, 33.33);
    }

    #[test]
    fn empty_networks_have_zero_overlap() {
        let empty = GeneNetwork::empty();
        let comparison = compare_networks("hpo", &empty, "manual", &empty);
        assert_eq!(comparison.overlap_percentage, 0.0);
        assert_eq!(comparison.left.n_components, 0);
    }
}
