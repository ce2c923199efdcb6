use anyhow::Result;
use clap::Parser;
use gene_network_communities::config::Config;
use gene_network_communities::pipeline;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(
    name = "gene-network-communities",
    about = "Topology and community detection analysis of gene interaction networks"
)]
struct Cli {
    /// Results directory holding redes/<mode>_score<score>/ edge lists
    #[clap(long, default_value = "results")]
    results_dir: PathBuf,

    /// Gene list sources to analyze
    #[clap(long, value_delimiter = ',', default_value = "hpo,manual")]
    modes: Vec<String>,

    /// Interaction score thresholds to analyze
    #[clap(long, value_delimiter = ',', default_value = "300,700,900")]
    scores: Vec<u32>,

    /// Seed for the seeded algorithms
    #[clap(long, default_value = "42")]
    seed: u64,

    /// Abort Girvan-Newman after this many seconds (no limit by default)
    #[clap(long)]
    girvan_newman_timeout_secs: Option<u64>,

    /// Smallest community counted as eligible for enrichment
    #[clap(long, default_value = "3")]
    min_cluster_size: usize,

    /// Skip plot-ready exports
    #[clap(long)]
    skip_exports: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            girvan_newman_timeout: self.girvan_newman_timeout_secs.map(Duration::from_secs),
            min_enrichment_cluster_size: self.min_cluster_size,
            skip_exports: self.skip_exports,
            threads: self.threads,
            ..Config::new(self.modes, self.scores, self.seed, self.results_dir)
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = args.into_config();

    let num_threads = config.worker_threads();
    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Starting gene network analysis");
    log::info!("Results: {}", config.results_dir.display());

    let report = pipeline::run(&config)?;

    for (key, reason) in &report.failed {
        log::warn!("{} not analyzed: {}", key.name(), reason);
    }
    log::info!(
        "Analysis complete: {} of {} configurations. Results saved to {}",
        report.completed.len(),
        config.runs().len(),
        config.results_dir.display()
    );

    Ok(())
}
