//! Louvain algorithm for community detection.
//!
//! Multi-level greedy modularity optimization (Blondel et al. 2008):
//!
//! 1. **Local moving**: every node starts in its own community and is moved to
//!    the neighboring community with the highest modularity gain until a full
//!    pass makes no move.
//! 2. **Aggregation**: communities become the nodes of a coarser network whose
//!    edge weights are the summed edge weights between communities.
//! 3. Repeat until a level makes no move.
//!
//! Node visiting order is shuffled with a seeded RNG, so a given seed always
//! yields the same partition.

use crate::cluster::metrics::Weighting;
use crate::cluster::Partition;
use crate::graph::GeneNetwork;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Louvain community detection
#[derive(Debug, Clone)]
pub struct Louvain {
    /// Whether edges weigh their score or count once
    weighting: Weighting,
    /// Seed for the node visiting order
    seed: u64,
    /// Maximum levels of aggregation
    max_levels: usize,
    /// Minimum modularity gain for a move
    min_gain: f64,
}

/// Network of communities at one aggregation level
struct Level {
    /// Neighbor weights, excluding self-loops
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Weighted degree including internal weight
    strength: Vec<f64>,
}

impl Louvain {
    pub fn new(seed: u64) -> Self {
        Self {
            weighting: Weighting::Score,
            seed,
            max_levels: 32,
            min_gain: 1e-10,
        }
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Detect communities. Communities are ordered by their lowest node.
    pub fn detect(&self, graph: &GeneNetwork) -> Partition {
        let n = graph.node_count();
        let mut level = Level::from_network(graph, self.weighting);
        let m = level.strength.iter().sum::<f64>() / 2.0;
        if m <= 0.0 {
            return Partition::singletons(n);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);

        // Community of each original node at the current level
        let mut assignment: Vec<usize> = (0..n).collect();

        for depth in 0..self.max_levels {
            let (community, moved) = self.local_moving(&level, m, &mut rng);
            if !moved {
                break;
            }

            let (renumbered, count) = renumber(&community);
            for slot in assignment.iter_mut() {
                *slot = renumbered[*slot];
            }

            log::debug!("Louvain level {}: {} communities", depth, count);
            level = level.aggregate(&renumbered, count);
        }

        Partition::from_labels(&assignment)
    }

    fn local_moving(&self, level: &Level, m: f64, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let n = level.adjacency.len();
        let mut community: Vec<usize> = (0..n).collect();
        let mut total: Vec<f64> = level.strength.clone();

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        // Scratch buffers: weight from the current node to each community
        let mut to_community = vec![0.0; n];
        let mut touched: Vec<usize> = Vec::new();

        let mut moved_any = false;
        loop {
            let mut moved = false;

            for &v in &order {
                let k_v = level.strength[v];
                let own = community[v];

                for &(u, w) in &level.adjacency[v] {
                    let c = community[u];
                    if !touched.contains(&c) {
                        touched.push(c);
                    }
                    to_community[c] += w;
                }

                total[own] -= k_v;

                let gain_of = |c: usize, w: f64| {
                    w / m - total[c] * k_v / (2.0 * m * m)
                };

                let mut best = own;
                let mut best_gain = gain_of(own, to_community[own]);
                for &c in &touched {
                    let gain = gain_of(c, to_community[c]);
                    if gain > best_gain + self.min_gain {
                        best = c;
                        best_gain = gain;
                    }
                }

                total[best] += k_v;
                if best != own {
                    community[v] = best;
                    moved = true;
                }

                for c in touched.drain(..) {
                    to_community[c] = 0.0;
                }
            }

            if !moved {
                break;
            }
            moved_any = true;
        }

        (community, moved_any)
    }
}

impl Level {
    fn from_network(graph: &GeneNetwork, weighting: Weighting) -> Self {
        let n = graph.node_count();
        let adjacency: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|node| {
                graph
                    .weighted_neighbors(node)
                    .map(|(u, score)| (u as usize, weighting.of(score)))
                    .collect()
            })
            .collect();
        let strength = adjacency
            .iter()
            .map(|neighbors| neighbors.iter().map(|&(_, w)| w).sum())
            .collect();

        Self {
            adjacency,
            strength,
        }
    }

    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut weights: Vec<std::collections::BTreeMap<usize, f64>> =
            vec![Default::default(); count];
        let mut strength = vec![0.0; count];

        for (v, neighbors) in self.adjacency.iter().enumerate() {
            let cv = community[v];
            strength[cv] += self.strength[v];
            for &(u, w) in neighbors {
                let cu = community[u];
                if cu != cv {
                    *weights[cv].entry(cu).or_insert(0.0) += w;
                }
            }
        }

        Self {
            adjacency: weights.into_iter().map(|map| map.into_iter().collect()).collect(),
            strength,
        }
    }
}

/// Dense relabeling in order of first appearance
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping = vec![usize::MAX; community.len()];
    let mut next = 0;
    let renumbered = community
        .iter()
        .map(|&c| {
            if mapping[c] == usize::MAX {
                mapping[c] = next;
                next += 1;
            }
            mapping[c]
        })
        .collect();
    (renumbered, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn ring_of_cliques() -> GeneNetwork {
        let mut builder = GraphBuilder::new();
        let cliques = [
            ["A1", "A2", "A3", "A4"],
            ["B1", "B2", "B3", "B4"],
            ["C1", "C2", "C3", "C4"],
        ];
        for clique in &cliques {
            for i in 0..clique.len() {
                for j in i + 1..clique.len() {
                    builder.add_edge(clique[i], clique[j], 0.9);
                }
            }
        }
        builder.add_edge("A4", "B1", 0.3);
        builder.add_edge("B4", "C1", 0.3);
        builder.add_edge("C4", "A1", 0.3);
        builder.build()
    }

    #[test]
    fn finds_cliques_in_ring() {
        let graph = ring_of_cliques();
        let partition = Louvain::new(42).detect(&graph);

        assert!(partition.covers(graph.node_count()));
        assert_eq!(partition.sizes(), vec![4, 4, 4]);
    }

    #[test]
    fn same_seed_same_partition() {
        let graph = ring_of_cliques();
        let first = Louvain::new(7).detect(&graph);
        let second = Louvain::new(7).detect(&graph);
        assert_eq!(first, second);
    }

    #[test]
    fn unweighted_ignores_scores() {
        let scored = ring_of_cliques();
        let mut uniform = scored.clone();
        for edge in &mut uniform.edges {
            edge.score = 1.0;
        }
        let uniform = GeneNetwork::from_parts(uniform.node_ids, uniform.edges);

        let unweighted = Louvain::new(3)
            .with_weighting(Weighting::Unweighted)
            .detect(&scored);
        assert_eq!(unweighted, Louvain::new(3).detect(&uniform));
    }

    #[test]
    fn edgeless_network_gives_singletons() {
        let partition = Louvain::new(42).detect(&GeneNetwork::empty());
        assert!(partition.is_empty());
    }
}
