//! Global topology metrics for a gene network
//!
//! A quick structural diagnostic computed once per network before the
//! dedicated clustering algorithms run. The community figures come from a
//! seeded Louvain decomposition of the whole network and are independent of
//! the clustering engine's results.

pub mod paths;

use crate::cluster::louvain::Louvain;
use crate::cluster::metrics::{modularity, Weighting};
use crate::graph::algorithms::{
    average_clustering, connected_components, induced_subgraph, largest_component,
};
use crate::graph::GeneNetwork;
use serde::{Deserialize, Serialize};

/// Snapshot of global network statistics.
///
/// Undefined values are `None` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub mean_degree: f64,
    pub density: f64,
    pub n_components: usize,
    pub mean_clustering_coefficient: f64,
    /// Longest shortest path in the largest component
    pub diameter: Option<usize>,
    /// Mean shortest path length in the largest component
    pub mean_shortest_path_length: Option<f64>,
    pub n_communities: usize,
    pub mean_community_size: f64,
    /// Modularity of the preliminary decomposition
    pub modularity: Option<f64>,
}

impl MetricsRecord {
    /// Record for a network without genes
    pub fn empty() -> Self {
        Self {
            n_nodes: 0,
            n_edges: 0,
            mean_degree: 0.0,
            density: 0.0,
            n_components: 0,
            mean_clustering_coefficient: 0.0,
            diameter: None,
            mean_shortest_path_length: None,
            n_communities: 0,
            mean_community_size: 0.0,
            modularity: None,
        }
    }
}

/// Compute global metrics. `seed` drives the preliminary decomposition.
pub fn compute_global_metrics(graph: &GeneNetwork, seed: u64) -> MetricsRecord {
    let n_nodes = graph.node_count();
    let n_edges = graph.edge_count();

    if n_nodes == 0 {
        return MetricsRecord::empty();
    }

    log::info!("Computing topology metrics for {} genes", n_nodes);

    let components = connected_components(graph);

    let largest = largest_component(&components);

    let (diameter, mean_path) = if largest.len() >= 2 {
        let giant = induced_subgraph(graph, largest);
        let summary = paths::path_summary(&giant);
        (
            Some(summary.diameter),
            Some(round_to(summary.mean_length, 3)),
        )
    } else {
        (None, None)
    };

    // Scores are edge attributes only; the decomposition counts every edge once
    let communities = Louvain::new(seed)
        .with_weighting(Weighting::Unweighted)
        .detect(graph);
    let modularity = if n_edges > 0 {
        modularity(graph, &communities, Weighting::Unweighted)
    } else {
        None
    };

    MetricsRecord {
        n_nodes,
        n_edges,
        mean_degree: round_to(mean_degree(n_nodes, n_edges), 3),
        density: round_to(density(n_nodes, n_edges), 4),
        n_components: components.len(),
        mean_clustering_coefficient: round_to(average_clustering(graph), 4),
        diameter,
        mean_shortest_path_length: mean_path,
        n_communities: communities.len(),
        mean_community_size: round_to(n_nodes as f64 / communities.len().max(1) as f64, 2),
        modularity,
    }
}

/// 2m / n, or 0 without nodes
pub fn mean_degree(n_nodes: usize, n_edges: usize) -> f64 {
    if n_nodes == 0 {
        return 0.0;
    }
    (2 * n_edges) as f64 / n_nodes as f64
}

/// m / (n (n - 1) / 2), or 0 with fewer than two nodes
pub fn density(n_nodes: usize, n_edges: usize) -> f64 {
    if n_nodes < 2 {
        return 0.0;
    }
    let possible = (n_nodes * (n_nodes - 1)) as f64 / 2.0;
    n_edges as f64 / possible
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
