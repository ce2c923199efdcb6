//! Community detection and partition quality

pub mod detection;
pub mod flow;
pub mod girvan_newman;
pub mod greedy;
pub mod louvain;
pub mod metrics;

use crate::graph::GeneNetwork;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use metrics::ConductanceReport;

/// Disjoint, non-empty communities of node indices covering the network
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Partition {
    communities: Vec<Vec<u32>>,
}

impl Partition {
    /// Build a partition, dropping empty communities and sorting members.
    /// Community order is kept as given.
    pub fn new(communities: Vec<Vec<u32>>) -> Self {
        let communities = communities
            .into_iter()
            .filter(|c| !c.is_empty())
            .map(|mut c| {
                c.sort_unstable();
                c
            })
            .collect();

        Self { communities }
    }

    /// Every node in its own community
    pub fn singletons(node_count: usize) -> Self {
        Self {
            communities: (0..node_count as u32).map(|n| vec![n]).collect(),
        }
    }

    /// Group nodes by label; communities appear in order of first node
    pub fn from_labels<L: Copy + Eq + std::hash::Hash>(labels: &[L]) -> Self {
        let mut slot_of: HashMap<L, usize> = HashMap::new();
        let mut communities: Vec<Vec<u32>> = Vec::new();

        for (node, &label) in labels.iter().enumerate() {
            let slot = *slot_of.entry(label).or_insert_with(|| {
                communities.push(Vec::new());
                communities.len() - 1
            });
            communities[slot].push(node as u32);
        }

        Self { communities }
    }

    pub fn communities(&self) -> &[Vec<u32>] {
        &self.communities
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Community index of every node; `None` for nodes not covered
    pub fn membership(&self, node_count: usize) -> Vec<Option<usize>> {
        let mut membership = vec![None; node_count];
        for (id, community) in self.communities.iter().enumerate() {
            for &node in community {
                if let Some(slot) = membership.get_mut(node as usize) {
                    *slot = Some(id);
                }
            }
        }
        membership
    }

    /// True when every node in `0..node_count` is in exactly one community
    pub fn covers(&self, node_count: usize) -> bool {
        let mut seen = vec![false; node_count];
        for &node in self.communities.iter().flatten() {
            match seen.get_mut(node as usize) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|flag| flag)
    }

    /// Order communities by size (largest first), then by lowest member
    pub fn sort_by_size(&mut self) {
        self.communities
            .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.communities.iter().map(Vec::len).collect()
    }

    /// Communities as sorted gene identifier lists
    pub fn gene_lists(&self, graph: &GeneNetwork) -> Vec<Vec<String>> {
        self.communities.iter().map(|c| graph.labels(c)).collect()
    }
}

/// The three community detection algorithms compared by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    FastGreedy,
    EdgeBetweenness,
    Infomap,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::FastGreedy,
        Algorithm::EdgeBetweenness,
        Algorithm::Infomap,
    ];

    /// Discriminator used in output records and directory names
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::FastGreedy => "fast_greedy",
            Algorithm::EdgeBetweenness => "edge_betweenness",
            Algorithm::Infomap => "infomap",
        }
    }

    /// Name of the quality field in the output record
    pub fn quality_field(&self) -> &'static str {
        match self {
            Algorithm::FastGreedy => "modularity",
            Algorithm::EdgeBetweenness => "best_modularity",
            Algorithm::Infomap => "codelength",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-community statistics reported next to each partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Position of the community in its partition
    pub id: u32,

    /// Number of genes
    pub size: usize,

    /// Internal edges / possible internal edges
    pub density: f64,

    /// Boundary edges / smaller side volume
    pub conductance: f64,

    /// Genes with the most neighbors inside the community
    pub hub_genes: Vec<String>,
}

/// Result of one community detection algorithm on one network
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    pub algorithm: Algorithm,

    pub partition: Partition,

    /// Modularity for the modularity-based algorithms, codelength for the
    /// flow-based one. `None` when undefined (no edges).
    pub quality: Option<f64>,

    pub conductance: ConductanceReport,

    pub clusters: Vec<Cluster>,

    /// Modularity after each edge removal (divisive algorithm only)
    pub modularity_trace: Option<Vec<f64>>,
}
