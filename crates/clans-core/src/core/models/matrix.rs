use super::ModelError;

/// A dense, row-major `n × n` matrix.
///
/// This is the storage type shared by every pairwise quantity in CLANS++
/// (raw similarities, attraction values and connectivity flags). Symmetry is
/// not enforced by the container itself; the constructors of the higher-level
/// models are responsible for establishing it.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix<T> {
    /// Number of rows (and columns).
    n: usize,
    /// Row-major cell storage of length `n * n`.
    data: Vec<T>,
}

impl<T: Clone> SquareMatrix<T> {
    /// Creates an `n × n` matrix with every cell set to `value`.
    ///
    /// # Arguments
    ///
    /// * `n` - The number of rows and columns.
    /// * `value` - The fill value.
    pub fn filled(n: usize, value: T) -> Self {
        Self {
            n,
            data: vec![value; n * n],
        }
    }

    /// Builds a matrix from nested rows, validating that the input is square.
    ///
    /// # Arguments
    ///
    /// * `rows` - The rows of the matrix; every row must have `rows.len()` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotSquare`] if any row length differs from the row count.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, ModelError> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(ModelError::NotSquare {
                    row: row_idx,
                    len: row.len(),
                    expected: n,
                });
            }
            data.extend(row);
        }
        Ok(Self { n, data })
    }
}

impl<T> SquareMatrix<T> {
    /// Returns the number of rows (and columns).
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Returns `true` if the matrix has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns a reference to cell `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[i * self.n + j]
    }

    /// Overwrites cell `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of bounds.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.data[i * self.n + j] = value;
    }

    /// Returns row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Iterates over the rows of the matrix in order.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // `chunks_exact(0)` panics, and an empty matrix has no rows anyway.
        self.data.chunks_exact(self.n.max(1)).take(self.n)
    }
}

impl<T: PartialEq> SquareMatrix<T> {
    /// Finds the first off-diagonal pair `(i, j)` with `i < j` whose mirrored cells differ.
    ///
    /// # Return
    ///
    /// Returns `None` if the matrix is symmetric.
    pub fn first_asymmetry(&self) -> Option<(usize, usize)> {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.get(i, j) != self.get(j, i) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Returns `true` if `M(i, j) == M(j, i)` for every pair.
    pub fn is_symmetric(&self) -> bool {
        self.first_asymmetry().is_none()
    }
}
