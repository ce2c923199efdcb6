//! Divisive edge-betweenness clustering (full Girvan–Newman).
//!
//! The algorithm works on an owned copy of the network. Each step records the
//! connected components of the working graph together with their modularity
//! on the original unweighted topology, then removes the edge with the highest
//! betweenness. It runs until no edge is left, so the trace has exactly one
//! entry per original edge, and the partition with the highest recorded
//! modularity is returned (first occurrence on ties).
//!
//! Betweenness ties are broken by edge order: the first interaction in input
//! order among the maximal ones is removed.

use crate::cluster::metrics::{modularity_of_labels, Weighting};
use crate::cluster::Partition;
use crate::error::DetectionError;
use crate::graph::GeneNetwork;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Relative tolerance under which two betweenness values are considered equal
const TIE_TOLERANCE: f64 = 1e-9;

/// Girvan–Newman with an optional wall-clock budget
#[derive(Debug, Clone, Default)]
pub struct GirvanNewman {
    timeout: Option<Duration>,
}

/// Output of the divisive algorithm
#[derive(Debug, Clone)]
pub struct DivisiveResult {
    /// Partition at the modularity peak
    pub partition: Partition,
    /// Modularity at the peak; `None` for an edgeless network
    pub best_modularity: Option<f64>,
    /// Step at which the peak was recorded
    pub best_step: Option<usize>,
    /// Modularity recorded at each step
    pub trace: Vec<f64>,
}

impl GirvanNewman {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort with `DetectionError::Timeout` once `timeout` has elapsed
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn run(&self, graph: &GeneNetwork) -> Result<DivisiveResult, DetectionError> {
        let started = Instant::now();
        let mut working = WorkingGraph::from_network(graph);

        let mut trace = Vec::with_capacity(graph.edge_count());
        let mut best: Option<(f64, usize, Vec<usize>, usize)> = None;

        while working.live_edges > 0 {
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    return Err(DetectionError::Timeout {
                        iterations: trace.len(),
                    });
                }
            }

            let (labels, count) = working.component_labels();
            let q = modularity_of_labels(graph, &labels, count, Weighting::Unweighted)
                .unwrap_or(0.0);

            if best.as_ref().map_or(true, |(best_q, ..)| q > *best_q) {
                best = Some((q, trace.len(), labels, count));
            }
            trace.push(q);

            let betweenness = working.edge_betweenness();
            let Some(edge) = working.select_edge(&betweenness) else {
                break;
            };
            working.remove_edge(edge);

            log::debug!(
                "Step {}: removed edge {} ({} components, Q={:.4})",
                trace.len(),
                edge,
                count,
                q
            );
        }

        let result = match best {
            Some((q, step, labels, _)) => DivisiveResult {
                partition: Partition::from_labels(&labels),
                best_modularity: Some(q),
                best_step: Some(step),
                trace,
            },
            None => DivisiveResult {
                partition: Partition::singletons(graph.node_count()),
                best_modularity: None,
                best_step: None,
                trace,
            },
        };

        Ok(result)
    }
}

/// Owned, destructible copy of a network used by the divisive algorithm
struct WorkingGraph {
    /// (neighbor, edge id) pairs per node, sorted by neighbor
    adjacency: Vec<Vec<(u32, usize)>>,
    /// Endpoints of every edge, in input order
    endpoints: Vec<(u32, u32)>,
    alive: Vec<bool>,
    live_edges: usize,
}

impl WorkingGraph {
    fn from_network(graph: &GeneNetwork) -> Self {
        let mut adjacency: Vec<Vec<(u32, usize)>> = vec![Vec::new(); graph.node_count()];
        for (id, edge) in graph.edges.iter().enumerate() {
            adjacency[edge.a as usize].push((edge.b, id));
            adjacency[edge.b as usize].push((edge.a, id));
        }
        for list in &mut adjacency {
            list.sort_unstable();
        }

        Self {
            adjacency,
            endpoints: graph.edges.iter().map(|e| (e.a, e.b)).collect(),
            alive: vec![true; graph.edge_count()],
            live_edges: graph.edge_count(),
        }
    }

    fn remove_edge(&mut self, id: usize) {
        let (a, b) = self.endpoints[id];
        self.adjacency[a as usize].retain(|&(_, e)| e != id);
        self.adjacency[b as usize].retain(|&(_, e)| e != id);
        self.alive[id] = false;
        self.live_edges -= 1;
    }

    /// Component label of every node, numbered in order of lowest node
    fn component_labels(&self) -> (Vec<usize>, usize) {
        let n = self.adjacency.len();
        let mut labels = vec![usize::MAX; n];
        let mut queue = VecDeque::new();
        let mut count = 0;

        for start in 0..n {
            if labels[start] != usize::MAX {
                continue;
            }
            labels[start] = count;
            queue.push_back(start);
            while let Some(v) = queue.pop_front() {
                for &(w, _) in &self.adjacency[v] {
                    let w = w as usize;
                    if labels[w] == usize::MAX {
                        labels[w] = count;
                        queue.push_back(w);
                    }
                }
            }
            count += 1;
        }

        (labels, count)
    }

    /// Shortest-path edge betweenness (Brandes), indexed by edge id.
    ///
    /// Sums over all ordered source/target pairs, so every undirected pair is
    /// counted twice. Only the ranking matters here.
    fn edge_betweenness(&self) -> Vec<f64> {
        let n = self.adjacency.len();
        let mut betweenness = vec![0.0; self.endpoints.len()];

        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut queue: VecDeque<usize> = VecDeque::with_capacity(n);
        let mut predecessors: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![usize::MAX; n];
        let mut delta = vec![0.0f64; n];

        for source in 0..n {
            if self.adjacency[source].is_empty() {
                continue;
            }

            for &v in &stack {
                predecessors[v].clear();
                sigma[v] = 0.0;
                dist[v] = usize::MAX;
                delta[v] = 0.0;
            }
            stack.clear();

            sigma[source] = 1.0;
            dist[source] = 0;
            queue.push_back(source);

            while let Some(v) = queue.pop_front() {
                stack.push(v);
                for &(w, edge) in &self.adjacency[v] {
                    let w = w as usize;
                    if dist[w] == usize::MAX {
                        dist[w] = dist[v] + 1;
                        queue.push_back(w);
                    }
                    if dist[w] == dist[v] + 1 {
                        sigma[w] += sigma[v];
                        predecessors[w].push((v, edge));
                    }
                }
            }

            for &w in stack.iter().rev() {
                for &(v, edge) in &predecessors[w] {
                    let share = sigma[v] / sigma[w] * (1.0 + delta[w]);
                    betweenness[edge] += share;
                    delta[v] += share;
                }
            }
        }

        betweenness
    }

    /// First live edge whose betweenness is maximal
    fn select_edge(&self, betweenness: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (id, &value) in betweenness.iter().enumerate() {
            if !self.alive[id] {
                continue;
            }
            match best {
                Some((_, top)) if value <= top + TIE_TOLERANCE * top.max(1.0) => {}
                _ => best = Some((id, value)),
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn network(edges: &[(&str, &str)]) -> GeneNetwork {
        let mut builder = GraphBuilder::new();
        for &(a, b) in edges {
            builder.add_edge(a, b, 0.9);
        }
        builder.build()
    }

    fn barbell() -> GeneNetwork {
        network(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "A"),
            ("C", "D"),
            ("D", "E"),
            ("E", "F"),
            ("F", "D"),
        ])
    }

    #[test]
    fn bridge_has_highest_betweenness() {
        let graph = barbell();
        let working = WorkingGraph::from_network(&graph);
        let betweenness = working.edge_betweenness();
        assert_eq!(working.select_edge(&betweenness), Some(3));
    }

    #[test]
    fn path_betweenness_counts_pairs() {
        // A-B-C: each edge carries 2 unordered pairs, counted in both directions
        let graph = network(&[("A", "B"), ("B", "C")]);
        let working = WorkingGraph::from_network(&graph);
        assert_eq!(working.edge_betweenness(), vec![4.0, 4.0]);
    }

    #[test]
    fn ties_go_to_first_edge() {
        let graph = network(&[("A", "B"), ("B", "C")]);
        let working = WorkingGraph::from_network(&graph);
        assert_eq!(working.select_edge(&[4.0, 4.0]), Some(0));
    }

    #[test]
    fn trace_has_one_entry_per_edge() {
        let graph = barbell();
        let result = GirvanNewman::new().run(&graph).unwrap();

        assert_eq!(result.trace.len(), graph.edge_count());
        let peak = result.trace.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.best_modularity, Some(peak));
        assert_eq!(
            result.partition.communities(),
            &[vec![0, 1, 2], vec![3, 4, 5]]
        );
        assert_eq!(result.best_step, Some(1));
    }

    #[test]
    fn keeps_initial_components_when_best() {
        let graph = network(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "A"),
            ("D", "E"),
            ("E", "F"),
            ("F", "D"),
        ]);
        let result = GirvanNewman::new().run(&graph).unwrap();

        assert_eq!(result.best_step, Some(0));
        assert_eq!(result.best_modularity, Some(0.5));
        assert_eq!(result.partition.len(), 2);
    }

    #[test]
    fn edgeless_network_has_empty_trace() {
        let result = GirvanNewman::new().run(&GeneNetwork::empty()).unwrap();
        assert!(result.trace.is_empty());
        assert_eq!(result.best_modularity, None);
    }

    #[test]
    fn zero_timeout_aborts() {
        let graph = barbell();
        let result = GirvanNewman::new()
            .with_timeout(Some(Duration::ZERO))
            .run(&graph);
        assert!(matches!(result, Err(DetectionError::Timeout { iterations: 0 })));
    }
}
