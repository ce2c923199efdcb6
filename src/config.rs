//! Configuration management for the gene network analysis

use crate::cluster::detection::DetectionSettings;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for one batch run over (mode, score) combinations
#[derive(Debug, Clone)]
pub struct Config {
    /// Gene list sources the networks were built from (e.g. "hpo", "manual")
    pub modes: Vec<String>,

    /// Minimum interaction scores (0-1000) the networks were built with
    pub scores: Vec<u32>,

    /// Seed for the seeded algorithms
    pub seed: u64,

    /// Root of the results tree
    pub results_dir: PathBuf,

    /// Wall-clock budget for the divisive algorithm
    pub girvan_newman_timeout: Option<Duration>,

    /// Smallest community counted as eligible for enrichment analysis
    pub min_enrichment_cluster_size: usize,

    /// Skip the plot-ready exports
    pub skip_exports: bool,

    /// Worker threads (0 = all available cores)
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modes: vec!["hpo".to_string(), "manual".to_string()],
            scores: vec![300, 700, 900],
            seed: 42,
            results_dir: PathBuf::from("results"),
            girvan_newman_timeout: None,
            min_enrichment_cluster_size: 3,
            skip_exports: false,
            threads: 0,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(modes: Vec<String>, scores: Vec<u32>, seed: u64, results_dir: PathBuf) -> Self {
        Self {
            modes,
            scores,
            seed,
            results_dir,
            ..Self::default()
        }
    }

    /// Resolved worker thread count
    pub fn worker_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            num_cpus::get()
        }
    }

    pub fn detection_settings(&self) -> DetectionSettings {
        DetectionSettings {
            seed: self.seed,
            girvan_newman_timeout: self.girvan_newman_timeout,
        }
    }

    /// Every (mode, score) combination, modes outermost
    pub fn runs(&self) -> Vec<RunKey> {
        self.modes
            .iter()
            .flat_map(|mode| {
                self.scores.iter().map(move |&score| RunKey {
                    mode: mode.clone(),
                    score,
                })
            })
            .collect()
    }

    /// Directory holding everything produced for one network
    pub fn network_dir(&self, key: &RunKey) -> PathBuf {
        self.results_dir.join("redes").join(key.name())
    }

    /// Edge list of one network
    pub fn network_file(&self, key: &RunKey) -> PathBuf {
        self.network_dir(key).join(format!("red_{}.txt", key.name()))
    }

    pub fn topology_dir(&self, key: &RunKey) -> PathBuf {
        self.network_dir(key).join("topologia")
    }

    pub fn clustering_dir(&self, key: &RunKey, algorithm: &str) -> PathBuf {
        self.network_dir(key).join("clustering").join(algorithm)
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }
}

/// One (mode, score) configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunKey {
    pub mode: String,
    pub score: u32,
}

impl RunKey {
    pub fn new(mode: &str, score: u32) -> Self {
        Self {
            mode: mode.to_string(),
            score,
        }
    }

    /// `<mode>_score<score>`
    pub fn name(&self) -> String {
        format!("{}_score{}", self.mode, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_cover_every_combination() {
        let config = Config::default();
        let runs = config.runs();
        assert_eq!(runs.len(), 6);
        assert_eq!(runs[0], RunKey::new("hpo", 300));
        assert_eq!(runs[5], RunKey::new("manual", 900));
    }

    #[test]
    fn explicit_thread_count_wins() {
        let config = Config {
            threads: 3,
            ..Config::default()
        };
        assert_eq!(config.worker_threads(), 3);
        assert!(Config::default().worker_threads() >= 1);
    }

    #[test]
    fn paths_follow_results_layout() {
        let config = Config::new(vec!["hpo".into()], vec![900], 42, PathBuf::from("out"));
        let key = RunKey::new("hpo", 900);

        assert_eq!(
            config.network_file(&key),
            PathBuf::from("out/redes/hpo_score900/red_hpo_score900.txt")
        );
        assert_eq!(
            config.clustering_dir(&key, "infomap"),
            PathBuf::from("out/redes/hpo_score900/clustering/infomap")
        );
    }
}
