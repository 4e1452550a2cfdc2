use super::matrix::SquareMatrix;

/// Normalized pairwise attraction strengths in `[0, 1]`.
///
/// An `AttractionMatrix` is derived once from a similarity matrix and is immutable
/// afterwards. It is symmetric and its diagonal is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AttractionMatrix {
    values: SquareMatrix<f64>,
}

impl AttractionMatrix {
    /// Wraps already-normalized values.
    ///
    /// Callers inside the crate guarantee symmetry, the `[0, 1]` range and a zero
    /// diagonal.
    pub(crate) fn from_normalized(values: SquareMatrix<f64>) -> Self {
        debug_assert!(values.is_symmetric());
        Self { values }
    }

    /// Creates an all-zero matrix for `n` sequences.
    pub fn zeros(n: usize) -> Self {
        Self {
            values: SquareMatrix::filled(n, 0.0),
        }
    }

    /// Returns the number of sequences `N`.
    #[inline]
    pub fn size(&self) -> usize {
        self.values.size()
    }

    /// Returns the attraction between sequences `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        *self.values.get(i, j)
    }

    /// Returns the underlying dense matrix.
    pub fn values(&self) -> &SquareMatrix<f64> {
        &self.values
    }

    /// Returns `true` if no pair has a positive attraction.
    pub fn is_all_zero(&self) -> bool {
        self.values.rows().all(|row| row.iter().all(|&v| v == 0.0))
    }
}
