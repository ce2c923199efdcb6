use gene_network_communities::cluster::flow::{FlowModules, FlowNetwork, FlowSolver};
use gene_network_communities::config::{Config, RunKey};
use gene_network_communities::error::DetectionError;
use gene_network_communities::pipeline::{run, run_with_solver};
use gene_network_communities::storage::load_communities;
use serde_json::Value;
use std::fs;
use std::path::Path;

const BARBELL: &str = "gen1,gen2,score\n\
    TP53,MDM2,0.99\n\
    MDM2,CDKN2A,0.95\n\
    CDKN2A,TP53,0.97\n\
    CDKN2A,BRCA1,0.41\n\
    BRCA1,BARD1,0.99\n\
    BARD1,PALB2,0.93\n\
    PALB2,BRCA1,0.96\n";

const OVERLAPPING: &str = "gen1,gen2,score\n\
    MDM2,TP53,0.99\n\
    BRCA1,BARD1,0.99\n\
    BRCA2,PALB2,0.98\n\
    not-a-row\n";

fn write_network(config: &Config, key: &RunKey, contents: &str) {
    let path = config.network_file(key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn batch_writes_records_summaries_and_comparisons() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(
        vec!["hpo".into(), "manual".into()],
        vec![700, 900],
        42,
        dir.path().to_path_buf(),
    );

    let hpo_700 = RunKey::new("hpo", 700);
    write_network(&config, &hpo_700, BARBELL);
    write_network(&config, &RunKey::new("hpo", 900), OVERLAPPING);
    write_network(&config, &RunKey::new("manual", 700), OVERLAPPING);

    let report = run(&config).unwrap();

    assert_eq!(report.completed.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, RunKey::new("manual", 900));

    let topology = read_json(&config.topology_dir(&hpo_700).join("metricas_topologicas.json"));
    assert_eq!(topology["n_nodes"], 6);
    assert_eq!(topology["n_edges"], 7);
    assert_eq!(topology["diameter"], 3);

    let greedy_path = config
        .clustering_dir(&hpo_700, "fast_greedy")
        .join("fast_greedy_hpo_score700.json");
    let communities = load_communities(&greedy_path).unwrap();
    assert_eq!(communities.len(), 2);
    assert!(communities.contains(&vec!["CDKN2A".to_string(), "MDM2".into(), "TP53".into()]));

    let divisive = read_json(
        &config
            .clustering_dir(&hpo_700, "edge_betweenness")
            .join("edge_betweenness_hpo_score700.json"),
    );
    assert_eq!(divisive["modularity_trace"].as_array().unwrap().len(), 7);
    assert!(divisive["best_modularity"].as_f64().unwrap() > 0.3);

    let infomap = read_json(
        &config
            .clustering_dir(&hpo_700, "infomap")
            .join("infomap_hpo_score700.json"),
    );
    assert!(infomap["codelength"].as_f64().unwrap() > 0.0);

    let exports = config.clustering_dir(&hpo_700, "edge_betweenness");
    assert!(exports.join("communities.csv").exists());
    assert!(exports.join("network.graphml").exists());
    assert!(exports.join("modularity_trace.csv").exists());

    let summary = fs::read_to_string(dir.path().join("resumen_clustering_hpo.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines[0], "Red,Score,fast_greedy,edge_betweenness,infomap");
    assert!(lines[1].starts_with("hpo,700,2 clusters | 2 eligible,2 clusters | 2 eligible,"));
    assert!(lines[2].starts_with("hpo,900,3 clusters | 0 eligible,"));

    let manual = fs::read_to_string(dir.path().join("resumen_clustering_manual.csv")).unwrap();
    assert_eq!(manual.lines().count(), 2);

    let comparison = read_json(&dir.path().join("comparacion_redes_score700.json"));
    assert_eq!(comparison["shared_edges"].as_array().unwrap().len(), 2);
    assert!(!dir.path().join("comparacion_redes_score900.json").exists());
}

struct FailingSolver;

impl FlowSolver for FailingSolver {
    fn name(&self) -> &str {
        "failing"
    }

    fn solve(&self, _network: &FlowNetwork, _seed: u64) -> Result<FlowModules, DetectionError> {
        Err(DetectionError::Solver("solver unavailable".into()))
    }
}

#[test]
fn failed_algorithm_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::new(vec!["hpo".into()], vec![700], 42, dir.path().to_path_buf());
    config.skip_exports = true;
    let key = RunKey::new("hpo", 700);
    write_network(&config, &key, BARBELL);

    let report = run_with_solver(&config, &FailingSolver).unwrap();
    assert_eq!(report.completed, vec![key.clone()]);

    assert!(config.clustering_dir(&key, "fast_greedy").exists());
    assert!(config.clustering_dir(&key, "edge_betweenness").exists());
    assert!(!config.clustering_dir(&key, "infomap").exists());
    assert!(!config
        .clustering_dir(&key, "fast_greedy")
        .join("communities.csv")
        .exists());

    let summary = fs::read_to_string(dir.path().join("resumen_clustering_hpo.csv")).unwrap();
    assert!(summary.lines().nth(1).unwrap().ends_with("0 clusters | 0 eligible"));
}

#[test]
fn header_only_network_still_produces_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(vec!["manual".into()], vec![300], 42, dir.path().to_path_buf());
    let key = RunKey::new("manual", 300);
    write_network(&config, &key, "gen1,gen2,score\n");

    let report = run(&config).unwrap();
    assert_eq!(report.completed.len(), 1);

    let topology = read_json(&config.topology_dir(&key).join("metricas_topologicas.json"));
    assert_eq!(topology["n_nodes"], 0);
    assert!(topology["diameter"].is_null());

    let greedy = read_json(
        &config
            .clustering_dir(&key, "fast_greedy")
            .join("fast_greedy_manual_score300.json"),
    );
    assert!(greedy["modularity"].is_null());
    assert_eq!(greedy["num_communities"], 0);
}
