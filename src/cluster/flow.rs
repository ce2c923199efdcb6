//! Flow-based partitioning with the map equation.
//!
//! The optimization itself sits behind the [`FlowSolver`] trait: a solver
//! receives a network of dense integer node ids with weighted links plus a
//! seed, and returns a module for every node together with the codelength of
//! that assignment. [`flow_partition`] handles the translation between a
//! [`GeneNetwork`] and the solver's interface.
//!
//! [`MapEquationSolver`] is the built-in two-level solver. For an undirected
//! network the stationary flow of a node is proportional to its weighted
//! degree and the flow on a link is `w / 2W` in each direction. The
//! codelength of a partition into modules with exit flow `q_i` and total flow
//! `p_i` is
//!
//! ```text
//! L = q log q - 2 Σ q_i log q_i - Σ p_α log p_α + Σ (q_i + p_i) log(q_i + p_i)
//! ```
//!
//! with `q = Σ q_i`, measured in bits.

use crate::cluster::Partition;
use crate::error::DetectionError;
use crate::graph::GeneNetwork;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Weighted link between two dense node ids
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowLink {
    pub source: u32,
    pub target: u32,
    pub weight: f64,
}

/// Solver input: nodes `0..node_count` and undirected weighted links
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    pub node_count: usize,
    pub links: Vec<FlowLink>,
}

impl FlowNetwork {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            links: Vec::new(),
        }
    }

    pub fn add_link(&mut self, source: u32, target: u32, weight: f64) {
        self.links.push(FlowLink {
            source,
            target,
            weight,
        });
    }
}

/// Solver output: `(node, module)` pairs and the codelength in bits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowModules {
    pub assignments: Vec<(u32, u32)>,
    pub codelength: f64,
}

/// A map-equation style optimizer.
///
/// Implementations must be deterministic for a given network and seed.
pub trait FlowSolver: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, network: &FlowNetwork, seed: u64) -> Result<FlowModules, DetectionError>;
}

/// Partition and codelength found by a flow solver
#[derive(Debug, Clone)]
pub struct FlowResult {
    pub partition: Partition,
    pub codelength: f64,
}

/// Partition a gene network with a flow solver.
///
/// Node indices are used as the solver's dense ids. Communities are returned in
/// module id order.
pub fn flow_partition(
    graph: &GeneNetwork,
    solver: &dyn FlowSolver,
    seed: u64,
) -> Result<FlowResult, DetectionError> {
    let mut network = FlowNetwork::new(graph.node_count());
    for edge in &graph.edges {
        network.add_link(edge.a, edge.b, edge.score);
    }

    log::info!(
        "Running flow solver '{}' on {} nodes and {} links (seed {})",
        solver.name(),
        network.node_count,
        network.links.len(),
        seed
    );

    let modules = solver.solve(&network, seed)?;

    let mut assigned = vec![false; graph.node_count()];
    let mut by_module: BTreeMap<u32, Vec<u32>> = BTreeMap::new();

    for &(node, module) in &modules.assignments {
        match assigned.get_mut(node as usize) {
            None => return Err(DetectionError::UnknownNode { node }),
            Some(true) => {
                return Err(DetectionError::Solver(format!(
                    "node {node} was assigned to more than one module"
                )))
            }
            Some(flag) => *flag = true,
        }
        by_module.entry(module).or_default().push(node);
    }

    if let Some(node) = assigned.iter().position(|&flag| !flag) {
        return Err(DetectionError::MissingAssignment { node: node as u32 });
    }

    Ok(FlowResult {
        partition: Partition::new(by_module.into_values().collect()),
        codelength: modules.codelength,
    })
}

/// Built-in two-level map equation optimizer.
///
/// Nodes are moved between neighboring modules in a seeded random order while
/// the codelength decreases, then modules are aggregated into super-nodes and
/// the process repeats until a level makes no move. If the final two-level
/// codelength does not beat the one-module codelength, all nodes share one
/// module.
#[derive(Debug, Clone)]
pub struct MapEquationSolver {
    max_sweeps: usize,
    min_improvement: f64,
}

impl Default for MapEquationSolver {
    fn default() -> Self {
        Self {
            max_sweeps: 100,
            min_improvement: 1e-10,
        }
    }
}

impl MapEquationSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlowSolver for MapEquationSolver {
    fn name(&self) -> &str {
        "map-equation"
    }

    fn solve(&self, network: &FlowNetwork, seed: u64) -> Result<FlowModules, DetectionError> {
        let n = network.node_count;
        for link in &network.links {
            if link.source as usize >= n || link.target as usize >= n {
                return Err(DetectionError::Solver(format!(
                    "link {}-{} references a node outside 0..{}",
                    link.source, link.target, n
                )));
            }
            if !(link.weight.is_finite() && link.weight >= 0.0) {
                return Err(DetectionError::Solver(format!(
                    "link {}-{} has invalid weight {}",
                    link.source, link.target, link.weight
                )));
            }
        }

        let mut level = FlowLevel::from_network(network);
        if level.total_weight <= 0.0 {
            // No flow: every node is its own module and nothing needs encoding
            return Ok(FlowModules {
                assignments: (0..n as u32).map(|node| (node, node)).collect(),
                codelength: 0.0,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut assignment: Vec<usize> = (0..n).collect();

        loop {
            let (module, moved) = self.local_moving(&level, &mut rng);
            if !moved {
                break;
            }

            let (renumbered, count) = renumber(&module);
            for slot in assignment.iter_mut() {
                *slot = renumbered[*slot];
            }

            log::debug!("Map equation level: {} modules", count);
            level = level.aggregate(&renumbered, count);
        }

        let mut best_length = codelength(network, &assignment);
        let one_module = vec![0; n];
        let one_level = codelength(network, &one_module);
        if one_level <= best_length {
            assignment = one_module;
            best_length = one_level;
        }

        let (modules, _) = renumber(&assignment);
        Ok(FlowModules {
            assignments: modules
                .into_iter()
                .enumerate()
                .map(|(node, module)| (node as u32, module as u32))
                .collect(),
            codelength: best_length,
        })
    }
}

impl MapEquationSolver {
    fn local_moving(&self, level: &FlowLevel, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let n = level.flow.len();
        let mut state = ModuleState::singletons(level);

        let mut order: Vec<usize> = (0..n).collect();
        let mut to_module = vec![0.0; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut moved_any = false;

        for _ in 0..self.max_sweeps {
            order.shuffle(rng);
            let mut moved = false;

            for &v in &order {
                let own = state.module[v];

                for &(u, f) in &level.links[v] {
                    let m = state.module[u];
                    if !touched.contains(&m) {
                        touched.push(m);
                    }
                    to_module[m] += f;
                }

                let mut best = own;
                let mut best_delta = -self.min_improvement;
                for &target in &touched {
                    if target == own {
                        continue;
                    }
                    let delta = state.move_delta(
                        level,
                        v,
                        own,
                        target,
                        to_module[own],
                        to_module[target],
                    );
                    if delta < best_delta {
                        best = target;
                        best_delta = delta;
                    }
                }

                if best != own {
                    state.apply_move(level, v, own, best, to_module[own], to_module[best]);
                    moved = true;
                }

                for m in touched.drain(..) {
                    to_module[m] = 0.0;
                }
            }

            if !moved {
                break;
            }
            moved_any = true;
        }

        (state.module, moved_any)
    }
}

/// Super-node network at one aggregation level
struct FlowLevel {
    /// Stationary flow of each node
    flow: Vec<f64>,
    /// Flow leaving each node towards other nodes
    out_flow: Vec<f64>,
    /// (neighbor, one-directional link flow), excluding self-links
    links: Vec<Vec<(usize, f64)>>,
    total_weight: f64,
    /// Σ p log p over the original nodes
    node_entropy_term: f64,
}

impl FlowLevel {
    fn from_network(network: &FlowNetwork) -> Self {
        let n = network.node_count;
        let total_weight: f64 = network
            .links
            .iter()
            .filter(|l| l.source != l.target)
            .map(|l| l.weight)
            .sum();

        let mut merged: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
        for link in network.links.iter().filter(|l| l.source != l.target) {
            let (a, b) = (link.source as usize, link.target as usize);
            *merged[a].entry(b).or_insert(0.0) += link.weight;
            *merged[b].entry(a).or_insert(0.0) += link.weight;
        }

        let scale = if total_weight > 0.0 { 2.0 * total_weight } else { 1.0 };
        let links: Vec<Vec<(usize, f64)>> = merged
            .into_iter()
            .map(|map| map.into_iter().map(|(u, w)| (u, w / scale)).collect())
            .collect();
        let out_flow: Vec<f64> = links
            .iter()
            .map(|list| list.iter().map(|&(_, f)| f).sum())
            .collect();
        let flow = out_flow.clone();
        let node_entropy_term = flow.iter().map(|&p| plogp(p)).sum();

        Self {
            flow,
            out_flow,
            links,
            total_weight,
            node_entropy_term,
        }
    }

    fn aggregate(&self, module: &[usize], count: usize) -> Self {
        let mut merged: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut flow = vec![0.0; count];

        for (v, neighbors) in self.links.iter().enumerate() {
            let mv = module[v];
            flow[mv] += self.flow[v];
            for &(u, f) in neighbors {
                let mu = module[u];
                if mu != mv {
                    *merged[mv].entry(mu).or_insert(0.0) += f;
                }
            }
        }

        let links: Vec<Vec<(usize, f64)>> = merged
            .into_iter()
            .map(|map| map.into_iter().collect())
            .collect();
        let out_flow = links
            .iter()
            .map(|list| list.iter().map(|&(_, f)| f).sum())
            .collect();

        Self {
            flow,
            out_flow,
            links,
            total_weight: self.total_weight,
            node_entropy_term: self.node_entropy_term,
        }
    }
}

/// Module exit and total flows with the running codelength terms
struct ModuleState {
    module: Vec<usize>,
    exit: Vec<f64>,
    flow: Vec<f64>,
    sum_exit: f64,
    sum_exit_log_exit: f64,
    sum_total_log_total: f64,
}

impl ModuleState {
    fn singletons(level: &FlowLevel) -> Self {
        let exit = level.out_flow.clone();
        let flow = level.flow.clone();
        let sum_exit = exit.iter().sum();
        let sum_exit_log_exit = exit.iter().map(|&q| plogp(q)).sum();
        let sum_total_log_total = exit.iter().zip(&flow).map(|(&q, &p)| plogp(q + p)).sum();

        Self {
            module: (0..flow.len()).collect(),
            exit,
            flow,
            sum_exit,
            sum_exit_log_exit,
            sum_total_log_total,
        }
    }

    /// Module-dependent part of the codelength; the node entropy is constant
    fn codelength(&self, sum_exit: f64, exit_log_exit: f64, total_log_total: f64) -> f64 {
        plogp(sum_exit) - 2.0 * exit_log_exit + total_log_total
    }

    /// Exit flows of `from` and `to` after moving `v` between them
    fn moved_exits(
        &self,
        level: &FlowLevel,
        v: usize,
        from: usize,
        to: usize,
        f_from: f64,
        f_to: f64,
    ) -> (f64, f64) {
        let out = level.out_flow[v];
        (
            self.exit[from] - out + 2.0 * f_from,
            self.exit[to] + out - 2.0 * f_to,
        )
    }

    fn move_delta(
        &self,
        level: &FlowLevel,
        v: usize,
        from: usize,
        to: usize,
        f_from: f64,
        f_to: f64,
    ) -> f64 {
        let (exit_from, exit_to) = self.moved_exits(level, v, from, to, f_from, f_to);
        let p = level.flow[v];
        let (flow_from, flow_to) = (self.flow[from] - p, self.flow[to] + p);

        let sum_exit = self.sum_exit - self.exit[from] - self.exit[to] + exit_from + exit_to;
        let exit_log_exit = self.sum_exit_log_exit - plogp(self.exit[from]) - plogp(self.exit[to])
            + plogp(exit_from)
            + plogp(exit_to);
        let total_log_total = self.sum_total_log_total
            - plogp(self.exit[from] + self.flow[from])
            - plogp(self.exit[to] + self.flow[to])
            + plogp(exit_from + flow_from)
            + plogp(exit_to + flow_to);

        self.codelength(sum_exit, exit_log_exit, total_log_total)
            - self.codelength(self.sum_exit, self.sum_exit_log_exit, self.sum_total_log_total)
    }

    fn apply_move(
        &mut self,
        level: &FlowLevel,
        v: usize,
        from: usize,
        to: usize,
        f_from: f64,
        f_to: f64,
    ) {
        let (exit_from, exit_to) = self.moved_exits(level, v, from, to, f_from, f_to);
        let p = level.flow[v];

        self.sum_exit_log_exit -= plogp(self.exit[from]) + plogp(self.exit[to]);
        self.sum_total_log_total -=
            plogp(self.exit[from] + self.flow[from]) + plogp(self.exit[to] + self.flow[to]);
        self.sum_exit += exit_from + exit_to - self.exit[from] - self.exit[to];

        self.exit[from] = exit_from.max(0.0);
        self.exit[to] = exit_to.max(0.0);
        self.flow[from] -= p;
        self.flow[to] += p;

        self.sum_exit_log_exit += plogp(self.exit[from]) + plogp(self.exit[to]);
        self.sum_total_log_total +=
            plogp(self.exit[from] + self.flow[from]) + plogp(self.exit[to] + self.flow[to]);
        self.module[v] = to;
    }
}

/// Two-level codelength (bits) of a module assignment
pub fn codelength(network: &FlowNetwork, assignment: &[usize]) -> f64 {
    let level = FlowLevel::from_network(network);
    if level.total_weight <= 0.0 {
        return 0.0;
    }

    let count = assignment.iter().copied().max().map_or(0, |m| m + 1);
    let mut exit = vec![0.0; count];
    let mut flow = vec![0.0; count];

    for (v, neighbors) in level.links.iter().enumerate() {
        let mv = assignment[v];
        flow[mv] += level.flow[v];
        for &(u, f) in neighbors {
            if assignment[u] != mv {
                exit[mv] += f;
            }
        }
    }

    let sum_exit: f64 = exit.iter().sum();
    let exit_log_exit: f64 = exit.iter().map(|&q| plogp(q)).sum();
    let total_log_total: f64 = exit.iter().zip(&flow).map(|(&q, &p)| plogp(q + p)).sum();

    plogp(sum_exit) - 2.0 * exit_log_exit - level.node_entropy_term + total_log_total
}

fn plogp(p: f64) -> f64 {
    if p > 0.0 {
        p * p.log2()
    } else {
        0.0
    }
}

/// Dense relabeling in order of first appearance
fn renumber(module: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let renumbered = module
        .iter()
        .map(|&m| {
            let next = mapping.len();
            *mapping.entry(m).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}
