use super::triples::TripleError;
use crate::core::models::similarity::{SimilarityMatrix, ValueKind};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Reader for square similarity matrices stored as headerless CSV, one row per line.
pub struct DenseFile;

impl DenseFile {
    /// Reads an `N x N` matrix. The matrix must be square and symmetric.
    pub fn read_from(reader: impl Read, kind: ValueKind) -> Result<SimilarityMatrix, TripleError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let rows = csv_reader
            .deserialize::<Vec<f64>>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SimilarityMatrix::from_dense(rows, kind)?)
    }

    pub fn read_from_path<P: AsRef<Path>>(
        path: P,
        kind: ValueKind,
    ) -> Result<SimilarityMatrix, TripleError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file), kind)
    }
}
