//! Batch orchestration over (mode, score) configurations

use crate::cluster::detection::{detect_communities, AlgorithmRun};
use crate::cluster::flow::{FlowSolver, MapEquationSolver};
use crate::cluster::Algorithm;
use crate::compare::compare_networks;
use crate::config::{Config, RunKey};
use crate::data::{load_network, LoadStats};
use crate::error;
use crate::graph::GeneNetwork;
use crate::storage;
use crate::topology::{compute_global_metrics, MetricsRecord};
use crate::viz;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

/// Everything computed for one network
#[derive(Debug)]
pub struct NetworkAnalysis {
    pub key: RunKey,
    pub graph: GeneNetwork,
    pub load_stats: LoadStats,
    pub topology: MetricsRecord,
    pub runs: Vec<AlgorithmRun>,
}

/// One row of the per-mode clustering summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: RunKey,
    counts: Vec<(Algorithm, usize, usize)>,
}

impl SummaryRow {
    /// Community and eligible-community counts of the successful runs
    pub fn from_runs(key: RunKey, runs: &[AlgorithmRun], min_cluster_size: usize) -> Self {
        let counts = runs
            .iter()
            .filter_map(|run| {
                let outcome = run.outcome.as_ref().ok()?;
                let eligible = outcome
                    .partition
                    .sizes()
                    .into_iter()
                    .filter(|&size| size >= min_cluster_size)
                    .count();
                Some((run.algorithm, outcome.partition.len(), eligible))
            })
            .collect();

        Self { key, counts }
    }

    /// `(communities, eligible)`; zero for failed or missing branches
    pub fn counts(&self, algorithm: Algorithm) -> (usize, usize) {
        self.counts
            .iter()
            .find(|(a, _, _)| *a == algorithm)
            .map_or((0, 0), |&(_, clusters, eligible)| (clusters, eligible))
    }
}

/// What a batch run produced
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub completed: Vec<RunKey>,
    pub failed: Vec<(RunKey, String)>,
    pub summaries: Vec<PathBuf>,
    pub comparisons: Vec<PathBuf>,
}

/// Load the network of one configuration
pub fn load_configuration(
    config: &Config,
    key: &RunKey,
) -> error::Result<(GeneNetwork, LoadStats)> {
    let path = config.network_file(key);
    let (graph, stats) = load_network(&path)?;

    log::info!(
        "Loaded {}: {} genes, {} interactions ({} rows, {} skipped, {} duplicates, {} self-loops)",
        key.name(),
        graph.node_count(),
        graph.edge_count(),
        stats.rows,
        stats.skipped,
        stats.duplicates,
        stats.self_loops
    );

    Ok((graph, stats))
}

/// Load, characterize and partition one network
pub fn analyze_network(
    config: &Config,
    key: &RunKey,
    solver: &dyn FlowSolver,
) -> error::Result<NetworkAnalysis> {
    let (graph, load_stats) = load_configuration(config, key)?;

    let topology = compute_global_metrics(&graph, config.seed);
    let runs = detect_communities(&graph, &config.detection_settings(), solver);

    Ok(NetworkAnalysis {
        key: key.clone(),
        graph,
        load_stats,
        topology,
        runs,
    })
}

/// Persist the topology record, every successful clustering and the exports
pub fn save_analysis(config: &Config, analysis: &NetworkAnalysis) -> Result<()> {
    let key = &analysis.key;
    storage::save_topology(config, key, &analysis.topology)
        .with_context(|| format!("failed to save topology of {}", key.name()))?;

    for run in &analysis.runs {
        let Ok(outcome) = &run.outcome else {
            continue;
        };

        storage::save_clustering(config, key, &analysis.graph, outcome).with_context(|| {
            format!("failed to save {} clustering of {}", run.algorithm, key.name())
        })?;

        if !config.skip_exports {
            let dir = config.clustering_dir(key, run.algorithm.name());
            viz::export_clustering(&analysis.graph, outcome, &dir).with_context(|| {
                format!("failed to export {} data of {}", run.algorithm, key.name())
            })?;
        }
    }

    Ok(())
}

/// Run the whole batch with the built-in flow solver
pub fn run(config: &Config) -> Result<PipelineReport> {
    let solver = MapEquationSolver::new();
    run_with_solver(config, &solver)
}

/// Run every configuration in sequence, then write summaries and comparisons.
///
/// A configuration that fails to load or save is logged and reported; the
/// remaining configurations still run.
pub fn run_with_solver(config: &Config, solver: &dyn FlowSolver) -> Result<PipelineReport> {
    let started = Instant::now();
    let mut report = PipelineReport::default();
    let mut rows = Vec::new();
    let mut networks: HashMap<RunKey, GeneNetwork> = HashMap::new();

    log::info!(
        "Analyzing {} configurations with solver {}",
        config.runs().len(),
        solver.name()
    );

    for key in config.runs() {
        log::info!("=== {} ===", key.name());

        let analysis = match analyze_network(config, &key, solver) {
            Ok(analysis) => analysis,
            Err(err) => {
                log::error!("Skipping {}: {}", key.name(), err);
                report.failed.push((key, err.to_string()));
                continue;
            }
        };

        if let Err(err) = save_analysis(config, &analysis) {
            log::error!("Skipping {}: {:#}", key.name(), err);
            report.failed.push((key, format!("{:#}", err)));
            continue;
        }

        rows.push(SummaryRow::from_runs(
            key.clone(),
            &analysis.runs,
            config.min_enrichment_cluster_size,
        ));
        networks.insert(key.clone(), analysis.graph);
        report.completed.push(key);
    }

    for mode in &config.modes {
        report
            .summaries
            .push(storage::save_summary_table(config, mode, &rows)?);
    }

    if let [left_mode, right_mode, ..] = config.modes.as_slice() {
        for &score in &config.scores {
            let left = networks.get(&RunKey::new(left_mode, score));
            let right = networks.get(&RunKey::new(right_mode, score));
            if let (Some(left), Some(right)) = (left, right) {
                let comparison = compare_networks(left_mode, left, right_mode, right);
                report
                    .comparisons
                    .push(storage::save_comparison(config, score, &comparison)?);
            } else {
                log::warn!("Score {}: both networks are needed for a comparison", score);
            }
        }
    }

    log::info!(
        "Batch finished in {:?}: {} completed, {} failed",
        started.elapsed(),
        report.completed.len(),
        report.failed.len()
    );

    Ok(report)
}
