//! Community detection engine: runs the three algorithms on one network

use crate::cluster::flow::{flow_partition, FlowSolver};
use crate::cluster::girvan_newman::GirvanNewman;
use crate::cluster::greedy::greedy_modularity;
use crate::cluster::metrics::{conductances, describe_clusters, ConductanceReport};
use crate::cluster::{Algorithm, ClusteringOutcome, Partition};
use crate::error::DetectionError;
use crate::graph::GeneNetwork;
use std::time::{Duration, Instant};

/// Parameters shared by the three algorithms for one run
#[derive(Debug, Clone, Copy)]
pub struct DetectionSettings {
    /// Seed handed to the flow solver
    pub seed: u64,

    /// Wall-clock budget for the divisive algorithm
    pub girvan_newman_timeout: Option<Duration>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            girvan_newman_timeout: None,
        }
    }
}

/// One algorithm's result, or the reason that branch failed
#[derive(Debug)]
pub struct AlgorithmRun {
    pub algorithm: Algorithm,
    pub outcome: Result<ClusteringOutcome, DetectionError>,
}

/// Greedy modularity maximization
pub fn run_fast_greedy(graph: &GeneNetwork) -> ClusteringOutcome {
    log::info!("Running greedy modularity on {} genes", graph.node_count());

    let result = greedy_modularity(graph);
    log::info!(
        "Greedy modularity: {} communities after {} merges",
        result.partition.len(),
        result.merges
    );

    outcome(graph, Algorithm::FastGreedy, result.partition, result.modularity, None)
}

/// Full Girvan–Newman with global modularity-peak selection
pub fn run_edge_betweenness(
    graph: &GeneNetwork,
    timeout: Option<Duration>,
) -> Result<ClusteringOutcome, DetectionError> {
    log::info!(
        "Running Girvan-Newman on {} genes and {} interactions",
        graph.node_count(),
        graph.edge_count()
    );

    let result = GirvanNewman::new().with_timeout(timeout).run(graph)?;
    log::info!(
        "Girvan-Newman: {} communities at step {:?} of {}",
        result.partition.len(),
        result.best_step,
        result.trace.len()
    );

    Ok(outcome(
        graph,
        Algorithm::EdgeBetweenness,
        result.partition,
        result.best_modularity,
        Some(result.trace),
    ))
}

/// Flow-based partitioning through an injected solver
pub fn run_infomap(
    graph: &GeneNetwork,
    solver: &dyn FlowSolver,
    seed: u64,
) -> Result<ClusteringOutcome, DetectionError> {
    let result = flow_partition(graph, solver, seed)?;
    log::info!(
        "Infomap: {} modules, codelength {:.4} bits",
        result.partition.len(),
        result.codelength
    );

    Ok(outcome(
        graph,
        Algorithm::Infomap,
        result.partition,
        Some(result.codelength),
        None,
    ))
}

/// Run all three algorithms.
///
/// The algorithms only read `graph` and run in parallel. A failure in one
/// branch is returned in its `AlgorithmRun` and does not affect the others.
/// Runs are returned in `Algorithm::ALL` order.
pub fn detect_communities(
    graph: &GeneNetwork,
    settings: &DetectionSettings,
    solver: &dyn FlowSolver,
) -> Vec<AlgorithmRun> {
    let started = Instant::now();

    let (greedy, (divisive, flow)) = rayon::join(
        || timed(Algorithm::FastGreedy, || Ok(run_fast_greedy(graph))),
        || {
            rayon::join(
                || {
                    timed(Algorithm::EdgeBetweenness, || {
                        run_edge_betweenness(graph, settings.girvan_newman_timeout)
                    })
                },
                || timed(Algorithm::Infomap, || run_infomap(graph, solver, settings.seed)),
            )
        },
    );

    let runs = vec![greedy, divisive, flow];
    for run in &runs {
        if let Err(err) = &run.outcome {
            log::warn!("{} failed: {}", run.algorithm, err);
        }
    }

    log::info!("Community detection finished in {:?}", started.elapsed());
    runs
}

fn timed<F>(algorithm: Algorithm, run: F) -> AlgorithmRun
where
    F: FnOnce() -> Result<ClusteringOutcome, DetectionError>,
{
    let started = Instant::now();
    let outcome = run();
    log::debug!("{} took {:?}", algorithm, started.elapsed());
    AlgorithmRun { algorithm, outcome }
}

fn outcome(
    graph: &GeneNetwork,
    algorithm: Algorithm,
    partition: Partition,
    quality: Option<f64>,
    modularity_trace: Option<Vec<f64>>,
) -> ClusteringOutcome {
    let values = conductances(graph, &partition);
    let clusters = describe_clusters(graph, &partition, &values);

    ClusteringOutcome {
        algorithm,
        partition,
        quality,
        conductance: ConductanceReport::from_values(values),
        clusters,
        modularity_trace,
    }
}
