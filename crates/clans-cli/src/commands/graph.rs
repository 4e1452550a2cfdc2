use crate::cli::GraphArgs;
use crate::commands::load_similarity;
use crate::config::build_graph_config;
use crate::error::{CliError, Result};
use clanspp::core::io::triples::TripleFile;
use clanspp::core::similarity::attraction::AttractionConverter;
use clanspp::core::similarity::connectivity::ConnectivityClassifier;
use clanspp::engine::error::EngineError;
use tracing::info;

pub async fn run(args: GraphArgs) -> Result<()> {
    let config = build_graph_config(&args)?;
    let similarity = load_similarity(&config.input)?;

    let attraction = AttractionConverter::new()
        .convert_or_zero(&similarity)
        .map_err(EngineError::from)?;
    let connectivity = ConnectivityClassifier::new(config.threshold)
        .and_then(|classifier| classifier.classify(&similarity, &attraction))
        .map_err(EngineError::from)?;
    info!(
        "Classified {} sequences at threshold {} ({}).",
        similarity.size(),
        config.threshold.value,
        config.threshold.kind
    );

    match &config.output {
        Some(path) => {
            TripleFile::write_edges_to_path(connectivity.edges(), path).map_err(|e| {
                CliError::FileWriting {
                    path: path.clone(),
                    source: e.into(),
                }
            })?;
            println!(
                "Wrote {} edges to {}",
                connectivity.edges().len(),
                path.display()
            );
        }
        None => {
            TripleFile::write_edges(connectivity.edges(), std::io::stdout().lock())
                .map_err(|e| CliError::Other(e.into()))?;
        }
    }

    let singletons = connectivity.singletons();
    let listed: Vec<String> = singletons.iter().map(|i| i.to_string()).collect();
    eprintln!(
        "{} edges, {} singletons{}{}",
        connectivity.edges().len(),
        singletons.len(),
        if singletons.is_empty() { "" } else { ": " },
        listed.join(",")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_thresholded_edges_to_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("hits.csv");
        let output = dir.path().join("edges.csv");
        fs::write(&input, "0,1,1e-50\n# weak hit\n2,3,1e-2\n").unwrap();

        let cli = Cli::parse_from([
            "clans",
            "graph",
            "-i",
            input.to_str().unwrap(),
            "--size",
            "5",
            "-t",
            "1e-3",
            "-o",
            output.to_str().unwrap(),
        ]);
        let Commands::Graph(args) = cli.command else {
            panic!("expected graph command");
        };

        run(args).await.unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content, "i,j,attraction\n0,1,1.0\n");
    }
}
