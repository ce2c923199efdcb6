//! Plot-ready exports for external visualization tools

use crate::cluster::ClusteringOutcome;
use crate::graph::GeneNetwork;
use anyhow::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the membership table, GraphML network and (if any) modularity trace
/// for one algorithm into `dir`
pub fn export_clustering(
    graph: &GeneNetwork,
    outcome: &ClusteringOutcome,
    dir: &Path,
) -> Result<()> {
    log::info!("Exporting {} visualization data to {}", outcome.algorithm, dir.display());
    fs::create_dir_all(dir)?;

    write_membership(graph, outcome, &dir.join("communities.csv"))?;
    write_graphml(graph, outcome, &dir.join("network.graphml"))?;

    if let Some(trace) = &outcome.modularity_trace {
        write_trace(trace, &dir.join("modularity_trace.csv"))?;
    }

    Ok(())
}

/// One row per gene with its community
fn write_membership(graph: &GeneNetwork, outcome: &ClusteringOutcome, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["gene", "community", "degree"])?;

    for (id, members) in outcome.partition.communities().iter().enumerate() {
        for &node in members {
            let node = node as usize;
            writer.write_record([
                graph.node_id(node),
                id.to_string().as_str(),
                graph.degree(node).to_string().as_str(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Undirected GraphML: community attribute on nodes, score and distance on edges
fn write_graphml(graph: &GeneNetwork, outcome: &ClusteringOutcome, path: &Path) -> Result<()> {
    let membership = outcome.partition.membership(graph.node_count());
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(file, "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">")?;
    for (key, domain, kind) in [
        ("label", "node", "string"),
        ("community", "node", "int"),
        ("score", "edge", "double"),
        ("distance", "edge", "double"),
    ] {
        writeln!(
            file,
            "  <key id=\"{key}\" for=\"{domain}\" attr.name=\"{key}\" attr.type=\"{kind}\"/>"
        )?;
    }
    writeln!(file, "  <graph id=\"G\" edgedefault=\"undirected\">")?;

    for node in 0..graph.node_count() {
        let community = membership[node].map_or(-1, |c| c as i64);
        writeln!(file, "    <node id=\"n{}\">", node)?;
        writeln!(file, "      <data key=\"label\">{}</data>", escape_xml(graph.node_id(node)))?;
        writeln!(file, "      <data key=\"community\">{}</data>", community)?;
        writeln!(file, "    </node>")?;
    }

    for (id, edge) in graph.edges.iter().enumerate() {
        writeln!(
            file,
            "    <edge id=\"e{}\" source=\"n{}\" target=\"n{}\">",
            id, edge.a, edge.b
        )?;
        writeln!(file, "      <data key=\"score\">{}</data>", edge.score)?;
        writeln!(file, "      <data key=\"distance\">{}</data>", edge.distance())?;
        writeln!(file, "    </edge>")?;
    }

    writeln!(file, "  </graph>")?;
    writeln!(file, "</graphml>")?;
    file.flush()?;

    Ok(())
}

/// Step/modularity pairs for plotting the divisive trace
fn write_trace(trace: &[f64], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["step", "modularity"])?;
    for (step, q) in trace.iter().enumerate() {
        writer.write_record([step.to_string(), q.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::detection::run_edge_betweenness;
    use crate::graph::GraphBuilder;

    #[test]
    fn exports_membership_graphml_and_trace() {
        let mut builder = GraphBuilder::new();
        builder.add_edge("A", "B", 0.9);
        builder.add_edge("B", "C", 0.8);
        builder.add_edge("D", "E", 0.7);
        let graph = builder.build();
        let outcome = run_edge_betweenness(&graph, None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        export_clustering(&graph, &outcome, dir.path()).unwrap();

        let membership = fs::read_to_string(dir.path().join("communities.csv")).unwrap();
        assert_eq!(membership.lines().count(), 1 + graph.node_count());
        assert!(membership.starts_with("gene,community,degree"));
        assert!(membership.contains("B,0,2"));

        let graphml = fs::read_to_string(dir.path().join("network.graphml")).unwrap();
        assert_eq!(graphml.matches("<edge ").count(), 3);
        assert!(graphml.contains("edgedefault=\"undirected\""));

        let trace = fs::read_to_string(dir.path().join("modularity_trace.csv")).unwrap();
        assert_eq!(trace.lines().count(), 1 + graph.edge_count());
    }

    #[test]
    fn escapes_gene_labels() {
        assert_eq!(escape_xml("A&B<1>"), "A&amp;B&lt;1&gt;");
    }
}
