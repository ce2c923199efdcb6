//! Shortest-path statistics over a connected network

use crate::graph::algorithms::bfs_distances;
use crate::graph::GeneNetwork;

/// Diameter and mean shortest path length, in hops
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSummary {
    pub diameter: usize,
    pub mean_length: f64,
}

/// BFS from every node; averages over reachable ordered pairs
pub fn path_summary(graph: &GeneNetwork) -> PathSummary {
    let mut diameter = 0;
    let mut total = 0usize;
    let mut pairs = 0usize;

    for source in 0..graph.node_count() {
        for (target, dist) in bfs_distances(graph, source).into_iter().enumerate() {
            if target == source {
                continue;
            }
            if let Some(d) = dist {
                diameter = diameter.max(d);
                total += d;
                pairs += 1;
            }
        }
    }

    let mean_length = if pairs == 0 {
        0.0
    } else {
        total as f64 / pairs as f64
    };

    PathSummary {
        diameter,
        mean_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn star_has_diameter_two() {
        let mut builder = GraphBuilder::new();
        for leaf in ["B", "C", "D"] {
            builder.add_edge("A", leaf, 1.0);
        }
        let summary = path_summary(&builder.build());

        assert_eq!(summary.diameter, 2);
        // 3 pairs at 1, 3 pairs at 2
        assert!((summary.mean_length - 1.5).abs() < 1e-12);
    }
}
