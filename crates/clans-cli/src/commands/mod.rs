pub mod cluster;
pub mod graph;

use crate::cli::InputFormat;
use crate::config::InputSpec;
use crate::error::{CliError, Result};
use clanspp::core::io::dense::DenseFile;
use clanspp::core::io::triples::TripleFile;
use clanspp::core::models::similarity::SimilarityMatrix;
use tracing::info;

/// Reads the similarity data described by `input`.
pub fn load_similarity(input: &InputSpec) -> Result<SimilarityMatrix> {
    info!(
        "Loading {} similarity values from {:?} ({:?} format)",
        input.kind, &input.path, input.format
    );
    let similarity = match input.format {
        InputFormat::Triples => TripleFile::read_from_path(&input.path, input.kind, input.size),
        InputFormat::Dense => DenseFile::read_from_path(&input.path, input.kind),
    }
    .map_err(|e| CliError::FileParsing {
        path: input.path.clone(),
        source: e.into(),
    })?;

    if let Some(size) = input.size {
        if size != similarity.size() {
            return Err(CliError::Argument(format!(
                "--size {} does not match the {} sequences in {:?}",
                size,
                similarity.size(),
                input.path
            )));
        }
    }
    Ok(similarity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clanspp::core::models::similarity::ValueKind;
    use std::fs;
    use tempfile::tempdir;

    fn input_spec(path: std::path::PathBuf, format: InputFormat, size: Option<usize>) -> InputSpec {
        InputSpec {
            path,
            format,
            kind: ValueKind::Evalue,
            size,
        }
    }

    #[test]
    fn loads_triples_and_dense_files() {
        let dir = tempdir().unwrap();
        let triples = dir.path().join("hits.csv");
        let dense = dir.path().join("matrix.csv");
        fs::write(&triples, "0,1,1e-30\n1,2,1e-12\n").unwrap();
        fs::write(&dense, "0,1e-30\n1e-30,0\n").unwrap();

        let a = load_similarity(&input_spec(triples, InputFormat::Triples, Some(4))).unwrap();
        let b = load_similarity(&input_spec(dense, InputFormat::Dense, None)).unwrap();

        assert_eq!(a.size(), 4);
        assert_eq!(b.size(), 2);
    }

    #[test]
    fn dense_size_mismatch_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let dense = dir.path().join("matrix.csv");
        fs::write(&dense, "0,1e-30\n1e-30,0\n").unwrap();

        let result = load_similarity(&input_spec(dense, InputFormat::Dense, Some(3)));
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let result = load_similarity(&input_spec(
            "/nonexistent/hits.csv".into(),
            InputFormat::Triples,
            None,
        ));
        assert!(matches!(
            result,
            Err(CliError::FileParsing { path, .. }) if path.ends_with("hits.csv")
        ));
    }
}
