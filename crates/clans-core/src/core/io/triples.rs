use crate::core::models::ModelError;
use crate::core::models::similarity::{SimilarityMatrix, ValueKind};
use crate::core::similarity::connectivity::Edge;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid similarity data: {0}")]
    Model(#[from] ModelError),
    #[error("Explicit size {size} is smaller than the largest index {max_index} + 1")]
    SizeTooSmall { size: usize, max_index: usize },
}

#[derive(Debug, Deserialize)]
struct TripleRecord {
    query: usize,
    hit: usize,
    value: f64,
}

#[derive(Debug, Serialize)]
struct EdgeRecord {
    i: usize,
    j: usize,
    attraction: f64,
}

/// Reader and writer for headerless `query,hit,value` similarity lists.
///
/// Lines starting with `#` are ignored and surrounding whitespace is trimmed.
/// Indices are 0-based sequence positions.
pub struct TripleFile;

impl TripleFile {
    /// Reads a similarity matrix from a triple list.
    ///
    /// # Arguments
    ///
    /// * `reader` - The CSV source.
    /// * `kind` - How the values are to be interpreted.
    /// * `size` - The number of sequences; defaults to the largest index + 1.
    ///
    /// # Errors
    ///
    /// Returns [`TripleError`] if a record cannot be parsed, if `size` is too small
    /// for the indices present, or if a value lies outside the domain of `kind`.
    pub fn read_from(
        reader: impl Read,
        kind: ValueKind,
        size: Option<usize>,
    ) -> Result<SimilarityMatrix, TripleError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = csv_reader
            .deserialize::<TripleRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        let max_index = records.iter().map(|r| r.query.max(r.hit)).max();
        let inferred = max_index.map_or(0, |m| m + 1);
        let size = match (size, max_index) {
            (Some(size), Some(max_index)) if size <= max_index => {
                return Err(TripleError::SizeTooSmall { size, max_index });
            }
            (Some(size), _) => size,
            (None, _) => inferred,
        };

        let triples = records.into_iter().map(|r| (r.query, r.hit, r.value));
        Ok(SimilarityMatrix::from_triples(size, triples, kind)?)
    }

    pub fn read_from_path<P: AsRef<Path>>(
        path: P,
        kind: ValueKind,
        size: Option<usize>,
    ) -> Result<SimilarityMatrix, TripleError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file), kind, size)
    }

    /// Writes an edge list as `i,j,attraction` rows with a header line.
    pub fn write_edges(edges: &[Edge], writer: impl Write) -> Result<(), TripleError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for edge in edges {
            csv_writer.serialize(EdgeRecord {
                i: edge.i,
                j: edge.j,
                attraction: edge.attraction,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_edges_to_path<P: AsRef<Path>>(edges: &[Edge], path: P) -> Result<(), TripleError> {
        let file = File::create(path)?;
        Self::write_edges(edges, BufWriter::new(file))
    }
}
