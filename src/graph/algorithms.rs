//! Traversal algorithms shared by the topology analyzer and the clustering engine

use crate::graph::network::{Edge, GeneNetwork};
use std::collections::{HashMap, VecDeque};

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<u32>,

    /// Size of each set (for union by size)
    rank: Vec<u32>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
            rank: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: u32) -> u32 {
        let px = self.parent[x as usize];
        if px != x {
            self.parent[x as usize] = self.find(px);
        }
        self.parent[x as usize]
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // Attach smaller tree under root of larger tree
        let rank_x = self.rank[root_x as usize];
        let rank_y = self.rank[root_y as usize];

        if rank_x > rank_y {
            self.parent[root_y as usize] = root_x;
            self.rank[root_x as usize] += rank_y;
        } else {
            self.parent[root_x as usize] = root_y;
            self.rank[root_y as usize] += rank_x;
        }
    }
}

/// Connected components of the network.
///
/// Components are ordered by their lowest node index and members are sorted,
/// so the result only depends on node order.
pub fn connected_components(graph: &GeneNetwork) -> Vec<Vec<u32>> {
    let mut sets = DisjointSets::new(graph.node_count());
    for edge in &graph.edges {
        sets.union(edge.a, edge.b);
    }

    let mut slot_of_root: HashMap<u32, usize> = HashMap::new();
    let mut components: Vec<Vec<u32>> = Vec::new();

    for node in 0..graph.node_count() as u32 {
        let root = sets.find(node);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(node);
    }

    components
}

/// Largest of `components`; ties go to the first one encountered
pub fn largest_component(components: &[Vec<u32>]) -> &[u32] {
    let mut best: &[u32] = &[];
    for component in components {
        if component.len() > best.len() {
            best = component;
        }
    }
    best
}

/// Unweighted hop distances from `source`; unreachable nodes are `None`
pub fn bfs_distances(graph: &GeneNetwork, source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; graph.node_count()];
    let mut queue = VecDeque::new();

    dist[source] = Some(0);
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        let next = dist[v].map_or(0, |d| d + 1);
        for &w in graph.neighbors(v) {
            let w = w as usize;
            if dist[w].is_none() {
                dist[w] = Some(next);
                queue.push_back(w);
            }
        }
    }

    dist
}

/// Fraction of a node's neighbor pairs that are themselves connected
pub fn local_clustering(graph: &GeneNetwork, node: usize) -> f64 {
    let neighbors = graph.neighbors(node);
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }

    let mut links = 0usize;
    for (i, &u) in neighbors.iter().enumerate() {
        for &v in &neighbors[i + 1..] {
            if graph.has_edge(u as usize, v) {
                links += 1;
            }
        }
    }

    (2 * links) as f64 / (k * (k - 1)) as f64
}

/// Mean of the local clustering coefficient over all nodes
pub fn average_clustering(graph: &GeneNetwork) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }

    let total: f64 = (0..n).map(|node| local_clustering(graph, node)).sum();
    total / n as f64
}

/// Extract the subgraph induced by `members`, keeping their relative order
pub fn induced_subgraph(graph: &GeneNetwork, members: &[u32]) -> GeneNetwork {
    // Create mapping from original to subgraph indices
    let mut orig_to_sub = vec![u32::MAX; graph.node_count()];
    let mut sorted = members.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    for (i, &node) in sorted.iter().enumerate() {
        orig_to_sub[node as usize] = i as u32;
    }

    let node_ids = sorted
        .iter()
        .map(|&n| graph.node_ids[n as usize].clone())
        .collect();

    // Only include edges where both endpoints are in the subgraph
    let edges = graph
        .edges
        .iter()
        .filter_map(|e| {
            let a = orig_to_sub[e.a as usize];
            let b = orig_to_sub[e.b as usize];
            if a == u32::MAX || b == u32::MAX {
                return None;
            }
            Some(Edge {
                a: a.min(b),
                b: a.max(b),
                score: e.score,
            })
        })
        .collect();

    GeneNetwork::from_parts(node_ids, edges)
}
