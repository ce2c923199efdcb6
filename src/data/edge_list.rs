//! Edge list reader for STRING-style interaction networks
//!
//! The expected format is a header row `gen1,gen2,score` followed by one
//! `<gene>,<gene>,<score>` record per line. Rows with the wrong number of
//! fields, a non-numeric score, or an empty identifier are skipped with a
//! warning.

use crate::error::LoadError;
use crate::graph::{EdgeInsert, GeneNetwork, GraphBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Counters describing how an edge list was consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub self_loops: usize,
}

/// Load a network from an edge list file
pub fn load_network(path: &Path) -> Result<(GeneNetwork, LoadStats), LoadError> {
    log::info!("Reading edge list: {}", path.display());

    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (graph, stats) = read_network(file).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!(
        "Loaded network with {} genes and {} interactions ({} rows skipped)",
        graph.node_count(),
        graph.edge_count(),
        stats.skipped
    );

    Ok((graph, stats))
}

/// Parse an edge list from any reader
pub fn read_network<R: Read>(reader: R) -> Result<(GeneNetwork, LoadStats), csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut builder = GraphBuilder::new();
    let mut stats = LoadStats::default();

    for (line, record) in csv_reader.records().enumerate() {
        stats.rows += 1;

        // Header is line 1
        let line = line + 2;

        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err),
            Err(err) => {
                log::warn!("Skipping unreadable row {}: {}", line, err);
                stats.skipped += 1;
                continue;
            }
        };

        if record.len() == 1 && record.get(0).map_or(true, str::is_empty) {
            // Blank line
            stats.rows -= 1;
            continue;
        }

        let Some((gene_a, gene_b, score)) = parse_record(&record) else {
            log::warn!("Skipping malformed row {}: {:?}", line, record);
            stats.skipped += 1;
            continue;
        };

        match builder.add_edge(gene_a, gene_b, score) {
            EdgeInsert::Added => {}
            EdgeInsert::Replaced => {
                log::debug!("Duplicate interaction {}-{} on row {}", gene_a, gene_b, line);
                stats.duplicates += 1;
            }
            EdgeInsert::SelfLoop => {
                log::warn!("Skipping self-loop on {} at row {}", gene_a, line);
                stats.self_loops += 1;
            }
        }
    }

    Ok((builder.build(), stats))
}

fn parse_record(record: &csv::StringRecord) -> Option<(&str, &str, f64)> {
    if record.len() != 3 {
        return None;
    }

    let gene_a = record.get(0)?;
    let gene_b = record.get(1)?;
    if gene_a.is_empty() || gene_b.is_empty() {
        return None;
    }

    // Scores are similarities in [0, 1]; NaN fails the range check too
    let score: f64 = record.get(2)?.parse().ok()?;
    if !(0.0..=1.0).contains(&score) {
        return None;
    }

    Some((gene_a, gene_b, score))
}
