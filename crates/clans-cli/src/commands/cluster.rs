use crate::cli::ClusterArgs;
use crate::commands::load_similarity;
use crate::config::build_cluster_config;
use crate::error::{CliError, Result};
use crate::ui::{CliProgressHandler, UiEvent};
use clanspp::engine::progress::ProgressReporter;
use clanspp::engine::scheduler::{CancelToken, RunOutcome};
use clanspp::engine::session::LayoutSession;
use clanspp::workflows::cluster::{self, ClusterOptions};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn run(args: ClusterArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let config = build_cluster_config(&args)?;
    let similarity = load_similarity(&config.input)?;

    let resume = match &config.resume {
        Some(path) => {
            info!("Loading saved session from {:?}", path);
            Some(
                LayoutSession::read_from_path(path).map_err(|e| CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                })?,
            )
        }
        None => None,
    };

    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current round.");
            signal_token.cancel();
        }
    });

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the cluster workflow...");
    let result = tokio::task::block_in_place(|| {
        cluster::run(
            similarity,
            &config.layout,
            ClusterOptions {
                resume: resume.as_ref(),
                subset: config.subset.as_deref(),
                cancel: Some(cancel),
            },
            &reporter,
        )
    });
    ctrl_c.abort();
    let result = result?;

    result
        .session
        .write_to_path(&config.output)
        .map_err(|e| CliError::FileWriting {
            path: config.output.clone(),
            source: e.into(),
        })?;

    match result.outcome {
        RunOutcome::Completed { rounds } => println!("Ran {} rounds.", rounds),
        RunOutcome::Converged { rounds } => {
            println!("Layout converged after {} rounds.", rounds)
        }
        RunOutcome::Cancelled { rounds } => println!(
            "Interrupted after {} rounds; resume with --resume {}.",
            rounds,
            config.output.display()
        ),
    }
    println!(
        "{} sequences, {} edges, {} singletons; round {}, temperature {:.3e}.",
        result.session.size,
        result.edge_count,
        result.singletons.len(),
        result.snapshot.round,
        result.snapshot.temperature
    );
    println!("Session written to: {}", config.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn cluster_args(argv: Vec<&str>) -> ClusterArgs {
        match Cli::parse_from(argv).command {
            Commands::Cluster(args) => args,
            _ => unreachable!(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn writes_a_resumable_session() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("hits.csv");
        let output = dir.path().join("session.toml");
        let resumed = dir.path().join("resumed.toml");
        fs::write(&input, "0,1,1e-50\n1,2,1e-40\n3,4,1e-30\n").unwrap();
        let (sender, _receiver) = mpsc::channel(4096);

        let args = cluster_args(vec![
            "clans",
            "cluster",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--rounds",
            "20",
            "--seed",
            "9",
        ]);
        run(args, sender.clone()).await.unwrap();

        let session = LayoutSession::read_from_path(&output).unwrap();
        assert_eq!(session.size, 5);
        assert_eq!(session.round, 20);
        assert_eq!(session.seed, 9);
        assert_eq!(session.coordinates.len(), 5);

        let args = cluster_args(vec![
            "clans",
            "cluster",
            "-i",
            input.to_str().unwrap(),
            "-o",
            resumed.to_str().unwrap(),
            "--rounds",
            "5",
            "--resume",
            output.to_str().unwrap(),
        ]);
        run(args, sender).await.unwrap();

        let session = LayoutSession::read_from_path(&resumed).unwrap();
        assert_eq!(session.round, 25);
    }
}
