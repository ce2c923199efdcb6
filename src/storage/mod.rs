//! Results persistence module

use crate::cluster::{Algorithm, ClusteringOutcome};
use crate::compare::NetworkComparison;
use crate::config::{Config, RunKey};
use crate::graph::GeneNetwork;
use crate::pipeline::SummaryRow;
use crate::topology::MetricsRecord;
use anyhow::{Context, Result};
use serde_json::{json, to_string_pretty, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Save the topology metrics of one network
pub fn save_topology(config: &Config, key: &RunKey, record: &MetricsRecord) -> Result<PathBuf> {
    let dir = config.topology_dir(key);
    fs::create_dir_all(&dir)?;

    let path = dir.join("metricas_topologicas.json");
    write_json(&path, &serde_json::to_value(record)?)?;

    log::info!("Topology metrics saved to {}", path.display());
    Ok(path)
}

/// Structured record for one algorithm's partition.
///
/// The quality value is stored under the field named for the algorithm's
/// quality concept; the divisive algorithm also carries its modularity trace.
pub fn clustering_record(graph: &GeneNetwork, outcome: &ClusteringOutcome) -> Value {
    let algorithm = outcome.algorithm;

    let mut record = json!({
        "algorithm": algorithm.name(),
        "num_communities": outcome.partition.len(),
        "communities": outcome.partition.gene_lists(graph),
        "conductance": outcome.conductance,
        "clusters": outcome.clusters,
        "graph": {
            "nodes": graph.node_count(),
            "edges": graph.edge_count(),
        }
    });

    record[algorithm.quality_field()] = json!(outcome.quality);
    if let Some(trace) = &outcome.modularity_trace {
        record["modularity_trace"] = json!(trace);
    }

    record
}

/// Save one algorithm's clustering record
pub fn save_clustering(
    config: &Config,
    key: &RunKey,
    graph: &GeneNetwork,
    outcome: &ClusteringOutcome,
) -> Result<PathBuf> {
    let algorithm = outcome.algorithm.name();
    let dir = config.clustering_dir(key, algorithm);
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{}_{}.json", algorithm, key.name()));
    write_json(&path, &clustering_record(graph, outcome))?;

    log::info!(
        "Saved {} communities from {} to {}",
        outcome.partition.len(),
        algorithm,
        path.display()
    );
    Ok(path)
}

/// Save the per-mode clustering summary table
pub fn save_summary_table(config: &Config, mode: &str, rows: &[SummaryRow]) -> Result<PathBuf> {
    fs::create_dir_all(config.results_dir())?;
    let path = config
        .results_dir()
        .join(format!("resumen_clustering_{}.csv", mode));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec!["Red".to_string(), "Score".to_string()];
    header.extend(Algorithm::ALL.iter().map(|a| a.name().to_string()));
    writer.write_record(&header)?;

    let mut rows: Vec<&SummaryRow> = rows.iter().filter(|r| r.key.mode == mode).collect();
    rows.sort_by_key(|r| r.key.score);

    for row in rows {
        let mut record = vec![row.key.mode.clone(), row.key.score.to_string()];
        for algorithm in Algorithm::ALL {
            let (clusters, eligible) = row.counts(algorithm);
            record.push(format!("{} clusters | {} eligible", clusters, eligible));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    log::info!("Clustering summary for {} saved to {}", mode, path.display());
    Ok(path)
}

/// Save a network comparison
pub fn save_comparison(
    config: &Config,
    score: u32,
    comparison: &NetworkComparison,
) -> Result<PathBuf> {
    fs::create_dir_all(config.results_dir())?;
    let path = config
        .results_dir()
        .join(format!("comparacion_redes_score{}.json", score));

    write_json(&path, &serde_json::to_value(comparison)?)?;

    log::info!("Network comparison saved to {}", path.display());
    Ok(path)
}

/// Read back the communities of a saved clustering record
pub fn load_communities(path: &Path) -> Result<Vec<Vec<String>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: Value = serde_json::from_str(&text)?;
    let communities = serde_json::from_value(record["communities"].clone())
        .with_context(|| format!("{} has no communities list", path.display()))?;
    Ok(communities)
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::detection::{run_edge_betweenness, run_fast_greedy};
    use crate::graph::GraphBuilder;

    fn network() -> GeneNetwork {
        let mut builder = GraphBuilder::new();
        let pairs = [
            ("TP53", "MDM2"),
            ("MDM2", "CDKN2A"),
            ("CDKN2A", "TP53"),
            ("BRCA1", "BARD1"),
        ];
        for (a, b) in pairs {
            builder.add_edge(a, b, 0.95);
        }
        builder.build()
    }

    #[test]
    fn record_uses_algorithm_quality_field() {
        let graph = network();
        let record = clustering_record(&graph, &run_fast_greedy(&graph));

        assert_eq!(record["algorithm"], "fast_greedy");
        assert!(record["modularity"].is_f64());
        assert!(record.get("modularity_trace").is_none());
        assert_eq!(record["communities"][0], json!(["CDKN2A", "MDM2", "TP53"]));
        assert_eq!(record["graph"]["edges"], 4);
    }

    #[test]
    fn divisive_record_carries_trace() {
        let graph = network();
        let outcome = run_edge_betweenness(&graph, None).unwrap();
        let record = clustering_record(&graph, &outcome);

        assert_eq!(record["algorithm"], "edge_betweenness");
        assert!(record["best_modularity"].is_f64());
        assert_eq!(record["modularity_trace"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn undefined_quality_serializes_as_null() {
        let graph = GeneNetwork::empty();
        let record = clustering_record(&graph, &run_fast_greedy(&graph));
        assert!(record["modularity"].is_null());
    }

    #[test]
    fn saved_record_round_trips_communities() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(vec!["hpo".into()], vec![900], 42, dir.path().to_path_buf());
        let key = RunKey::new("hpo", 900);
        let graph = network();

        let path = save_clustering(&config, &key, &graph, &run_fast_greedy(&graph)).unwrap();
        assert!(path.ends_with("clustering/fast_greedy/fast_greedy_hpo_score900.json"));

        let communities = load_communities(&path).unwrap();
        assert_eq!(communities.len(), 2);
        assert_eq!(communities[1], vec!["BARD1", "BRCA1"]);
    }

    #[test]
    fn topology_nulls_are_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(vec!["hpo".into()], vec![300], 42, dir.path().to_path_buf());
        let key = RunKey::new("hpo", 300);

        let path = save_topology(&config, &key, &MetricsRecord::empty()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert!(value["diameter"].is_null());
        assert!(value["modularity"].is_null());
        assert_eq!(value["n_nodes"], 0);
    }
}
