use super::ModelError;
use super::matrix::SquareMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The E-value recorded for a pair of sequences without a search hit.
pub const NO_HIT_EVALUE: f64 = 100.0;

/// Describes how the raw values of a [`SimilarityMatrix`] are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    /// Expectation values from a sequence search: smaller is stronger,
    /// [`NO_HIT_EVALUE`] marks a missing hit.
    Evalue,
    /// Pre-computed attraction strengths in `[0, 1]`: larger is stronger.
    Attraction,
}

impl ValueKind {
    /// The value assigned to a pair for which no score was supplied.
    pub fn missing_value(self) -> f64 {
        match self {
            ValueKind::Evalue => NO_HIT_EVALUE,
            ValueKind::Attraction => 0.0,
        }
    }

    /// Picks the stronger of two scores for the same pair.
    pub fn stronger(self, a: f64, b: f64) -> f64 {
        match self {
            ValueKind::Evalue => a.min(b),
            ValueKind::Attraction => a.max(b),
        }
    }

    fn validate(self, value: f64) -> Result<(), &'static str> {
        if !value.is_finite() {
            return Err("value must be finite");
        }
        match self {
            ValueKind::Evalue if value < 0.0 => Err("E-values must be non-negative"),
            ValueKind::Attraction if !(0.0..=1.0).contains(&value) => {
                Err("attraction values must lie in [0, 1]")
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Evalue => write!(f, "evalue"),
            ValueKind::Attraction => write!(f, "attraction"),
        }
    }
}

impl FromStr for ValueKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "evalue" | "e-value" | "pvalue" => Ok(ValueKind::Evalue),
            "attraction" | "attval" => Ok(ValueKind::Attraction),
            _ => Err(ModelError::UnknownValueKind(s.to_string())),
        }
    }
}

/// The raw pairwise similarity scores of a set of sequences.
///
/// A `SimilarityMatrix` is set once when a dataset is loaded and is never mutated
/// afterwards. It is always square and symmetric, and every value has been
/// validated against its [`ValueKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: SquareMatrix<f64>,
    kind: ValueKind,
}

impl SimilarityMatrix {
    /// Builds a similarity matrix from dense rows.
    ///
    /// # Arguments
    ///
    /// * `rows` - The `N × N` scores; must be square and symmetric.
    /// * `kind` - How the scores are to be interpreted.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotSquare`] for ragged input, [`ModelError::NotSymmetric`]
    /// if any mirrored pair differs, and [`ModelError::InvalidValue`] if a score is
    /// out of the domain of `kind`.
    pub fn from_dense(rows: Vec<Vec<f64>>, kind: ValueKind) -> Result<Self, ModelError> {
        let values = SquareMatrix::from_rows(rows)?;
        for (i, row) in values.rows().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                kind.validate(value)
                    .map_err(|reason| ModelError::InvalidValue { i, j, value, reason })?;
            }
        }
        if let Some((i, j)) = values.first_asymmetry() {
            return Err(ModelError::NotSymmetric {
                i,
                j,
                upper: *values.get(i, j),
                lower: *values.get(j, i),
            });
        }
        Ok(Self { values, kind })
    }

    /// Builds a symmetric similarity matrix from a list of `(i, j, value)` triples.
    ///
    /// Pairs that are never mentioned receive [`ValueKind::missing_value`]. When a
    /// pair is mentioned more than once (including as both `(i, j)` and `(j, i)`),
    /// the stronger score wins, which keeps the result symmetric.
    ///
    /// # Arguments
    ///
    /// * `size` - The number of sequences `N`.
    /// * `triples` - The scored pairs, using 0-based indices below `size`.
    /// * `kind` - How the scores are to be interpreted.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfRange`] for an index `>= size` and
    /// [`ModelError::InvalidValue`] for a score outside the domain of `kind`.
    pub fn from_triples<I>(size: usize, triples: I, kind: ValueKind) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut values = SquareMatrix::filled(size, kind.missing_value());
        let mut seen = SquareMatrix::filled(size, false);

        for (i, j, value) in triples {
            if i >= size || j >= size {
                return Err(ModelError::IndexOutOfRange {
                    index: i.max(j),
                    size,
                });
            }
            kind.validate(value)
                .map_err(|reason| ModelError::InvalidValue { i, j, value, reason })?;

            let merged = if *seen.get(i, j) {
                kind.stronger(*values.get(i, j), value)
            } else {
                value
            };
            values.set(i, j, merged);
            values.set(j, i, merged);
            seen.set(i, j, true);
            seen.set(j, i, true);
        }

        Ok(Self { values, kind })
    }

    /// Returns the number of sequences `N`.
    #[inline]
    pub fn size(&self) -> usize {
        self.values.size()
    }

    /// Returns the interpretation of the stored scores.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Returns the raw score of pair `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        *self.values.get(i, j)
    }

    /// Returns the underlying dense matrix.
    pub fn values(&self) -> &SquareMatrix<f64> {
        &self.values
    }
}
