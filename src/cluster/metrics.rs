//! Partition quality metrics: modularity, conductance and per-community statistics

use crate::cluster::{Cluster, Partition};
use crate::graph::GeneNetwork;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Number of hub genes reported per community
const HUB_GENES: usize = 5;

/// How edges contribute to modularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Each edge counts with its similarity score
    Score,
    /// Each edge counts once
    Unweighted,
}

impl Weighting {
    /// Contribution of an edge with the given score
    pub(crate) fn of(self, score: f64) -> f64 {
        match self {
            Weighting::Score => score,
            Weighting::Unweighted => 1.0,
        }
    }
}

/// Newman modularity of a partition.
///
/// `None` when the network carries no edge weight, where modularity is
/// undefined. Nodes outside the partition are treated as singletons.
pub fn modularity(graph: &GeneNetwork, partition: &Partition, weighting: Weighting) -> Option<f64> {
    let membership = partition.membership(graph.node_count());
    let mut next = partition.len();
    let labels: Vec<usize> = membership
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                next += 1;
                next - 1
            })
        })
        .collect();

    modularity_of_labels(graph, &labels, next, weighting)
}

/// Modularity from a dense label vector (`labels[node] < label_count`)
pub fn modularity_of_labels(
    graph: &GeneNetwork,
    labels: &[usize],
    label_count: usize,
    weighting: Weighting,
) -> Option<f64> {
    let total: f64 = graph.edges.iter().map(|e| weighting.of(e.score)).sum();
    if total <= 0.0 {
        return None;
    }

    let mut internal = vec![0.0; label_count];
    let mut volume = vec![0.0; label_count];

    for edge in &graph.edges {
        let w = weighting.of(edge.score);
        let la = labels[edge.a as usize];
        let lb = labels[edge.b as usize];
        volume[la] += w;
        volume[lb] += w;
        if la == lb {
            internal[la] += w;
        }
    }

    let q = internal
        .iter()
        .zip(&volume)
        .map(|(&l, &d)| l / total - (d / (2.0 * total)).powi(2))
        .sum();

    Some(q)
}

/// Conductance of every community plus summary statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConductanceReport {
    pub per_community: Vec<f64>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ConductanceReport {
    pub fn from_values(values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        Self {
            mean: Statistics::mean(&values),
            min: Statistics::min(&values),
            max: Statistics::max(&values),
            per_community: values,
        }
    }
}

/// Conductance of each community: boundary edges / min(vol(C), vol(not C)).
///
/// Volumes are unweighted degree sums. A community whose smaller side has zero
/// volume gets 0.0.
pub fn conductances(graph: &GeneNetwork, partition: &Partition) -> Vec<f64> {
    let membership = partition.membership(graph.node_count());
    let mut cut = vec![0usize; partition.len()];

    for edge in &graph.edges {
        let ca = membership[edge.a as usize];
        let cb = membership[edge.b as usize];
        if ca != cb {
            if let Some(c) = ca {
                cut[c] += 1;
            }
            if let Some(c) = cb {
                cut[c] += 1;
            }
        }
    }

    let total_volume = 2 * graph.edge_count();

    partition
        .communities()
        .iter()
        .zip(cut)
        .map(|(community, cut)| {
            let volume: usize = community.iter().map(|&n| graph.degree(n as usize)).sum();
            let smaller = volume.min(total_volume - volume);
            if smaller == 0 {
                0.0
            } else {
                cut as f64 / smaller as f64
            }
        })
        .collect()
}

/// Conductance report for a partition
pub fn conductance_report(graph: &GeneNetwork, partition: &Partition) -> ConductanceReport {
    ConductanceReport::from_values(conductances(graph, partition))
}

/// Calculate density (internal edges / possible internal edges)
pub fn calculate_density(graph: &GeneNetwork, members: &[u32]) -> f64 {
    let n = members.len();
    if n <= 1 {
        return 1.0; // By convention, singleton communities have density 1
    }

    // Potential edges = n * (n - 1) / 2 for an undirected graph
    let potential_edges = n * (n - 1) / 2;

    let actual_edges: usize = members
        .iter()
        .map(|&src| internal_degree(graph, src, members))
        .sum::<usize>()
        / 2;

    actual_edges as f64 / potential_edges as f64
}

/// Genes with the highest degree inside the community
pub fn identify_hub_genes(graph: &GeneNetwork, members: &[u32]) -> Vec<String> {
    let mut degrees: Vec<(u32, usize)> = members
        .iter()
        .map(|&node| (node, internal_degree(graph, node, members)))
        .collect();

    // Highest degree first, ties by node order
    degrees.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    degrees
        .iter()
        .take(HUB_GENES)
        .map(|&(node, _)| graph.node_id(node as usize).to_string())
        .collect()
}

/// Per-community statistics for a partition
pub fn describe_clusters(
    graph: &GeneNetwork,
    partition: &Partition,
    conductance: &[f64],
) -> Vec<Cluster> {
    partition
        .communities()
        .iter()
        .enumerate()
        .map(|(id, members)| Cluster {
            id: id as u32,
            size: members.len(),
            density: calculate_density(graph, members),
            conductance: conductance.get(id).copied().unwrap_or(0.0),
            hub_genes: identify_hub_genes(graph, members),
        })
        .collect()
}

/// Neighbors of `node` that are members of the (sorted) community
fn internal_degree(graph: &GeneNetwork, node: u32, members: &[u32]) -> usize {
    graph
        .neighbors(node as usize)
        .iter()
        .filter(|n| members.binary_search(n).is_ok())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use approx::assert_relative_eq;

    fn network(edges: &[(&str, &str, f64)]) -> GeneNetwork {
        let mut builder = GraphBuilder::new();
        for &(a, b, s) in edges {
            builder.add_edge(a, b, s);
        }
        builder.build()
    }

    fn two_triangles() -> GeneNetwork {
        network(&[
            ("A", "B", 1.0),
            ("B", "C", 1.0),
            ("C", "A", 1.0),
            ("D", "E", 1.0),
            ("E", "F", 1.0),
            ("F", "D", 1.0),
        ])
    }

    #[test]
    fn modularity_of_disjoint_triangles() {
        let graph = two_triangles();
        let partition = Partition::new(vec![vec![0, 1, 2], vec![3, 4, 5]]);
        let q = modularity(&graph, &partition, Weighting::Unweighted).unwrap();
        assert_relative_eq!(q, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn single_community_has_zero_modularity() {
        let graph = network(&[("A", "B", 0.3), ("B", "C", 0.9)]);
        let partition = Partition::new(vec![vec![0, 1, 2]]);
        let q = modularity(&graph, &partition, Weighting::Score).unwrap();
        assert_relative_eq!(q, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn weighting_changes_modularity() {
        let graph = network(&[("A", "B", 0.9), ("B", "C", 0.1), ("C", "D", 0.9)]);
        let partition = Partition::new(vec![vec![0, 1], vec![2, 3]]);
        let weighted = modularity(&graph, &partition, Weighting::Score).unwrap();
        let unweighted = modularity(&graph, &partition, Weighting::Unweighted).unwrap();
        assert!(weighted > unweighted);
    }

    #[test]
    fn modularity_undefined_without_edges() {
        let graph = GeneNetwork::empty();
        assert_eq!(modularity(&graph, &Partition::default(), Weighting::Score), None);
    }

    #[test]
    fn disconnected_communities_have_zero_conductance() {
        let graph = two_triangles();
        let partition = Partition::new(vec![vec![0, 1, 2], vec![3, 4, 5]]);
        let report = conductance_report(&graph, &partition);
        assert_eq!(report.per_community, vec![0.0, 0.0]);
        assert_eq!(report.max, 0.0);
    }

    #[test]
    fn conductance_of_path_split() {
        // A-B-C-D split in the middle: cut 1, vol 3 each side
        let graph = network(&[("A", "B", 0.9), ("B", "C", 0.9), ("C", "D", 0.9)]);
        let partition = Partition::new(vec![vec![0, 1], vec![2, 3]]);
        let report = conductance_report(&graph, &partition);
        assert_relative_eq!(report.mean, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(report.min, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn conductance_is_zero_when_other_side_is_empty() {
        let graph = network(&[("A", "B", 0.9)]);
        let partition = Partition::new(vec![vec![0, 1]]);
        assert_eq!(conductances(&graph, &partition), vec![0.0]);
    }

    #[test]
    fn empty_report_is_all_zero() {
        let report = ConductanceReport::from_values(Vec::new());
        assert!(report.per_community.is_empty());
        assert_eq!(report.mean, 0.0);
    }

    #[test]
    fn cluster_statistics() {
        let graph = network(&[("A", "B", 1.0), ("B", "C", 1.0), ("C", "D", 1.0)]);
        let partition = Partition::new(vec![vec![0, 1, 2], vec![3]]);
        let conductance = conductances(&graph, &partition);
        let clusters = describe_clusters(&graph, &partition, &conductance);

        assert_eq!(clusters.len(), 2);
        assert_relative_eq!(clusters[0].density, 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(clusters[0].hub_genes[0], "B");
        assert_eq!(clusters[1].density, 1.0);
    }
}
