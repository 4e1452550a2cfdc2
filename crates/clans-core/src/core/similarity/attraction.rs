use super::SimilarityError;
use crate::core::models::attraction::AttractionMatrix;
use crate::core::models::matrix::SquareMatrix;
use crate::core::models::similarity::{SimilarityMatrix, ValueKind};
use tracing::{debug, instrument, warn};

/// Replaces an E-value of exactly zero before taking its logarithm.
pub const EVALUE_FLOOR: f64 = 1e-180;

/// Converts raw similarity scores into normalized attraction strengths.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttractionConverter;

impl AttractionConverter {
    pub fn new() -> Self {
        Self
    }

    /// Derives the attraction matrix of `similarity`.
    ///
    /// E-values `<= 1` become `-log10(evalue)`, anything above 1 (including the
    /// no-hit sentinel) becomes 0, and every value is then divided by the largest
    /// off-diagonal value. Attraction values are passed through unchanged. The
    /// diagonal of the result is always zero.
    ///
    /// # Errors
    ///
    /// Returns [`SimilarityError::NumericDegenerate`] if the E-value maximum is zero,
    /// i.e. no pair has a hit stronger than an E-value of 1.
    #[instrument(level = "debug", skip_all, fields(n = similarity.size(), kind = %similarity.kind()))]
    pub fn convert(&self, similarity: &SimilarityMatrix) -> Result<AttractionMatrix, SimilarityError> {
        let n = similarity.size();
        let mut values = SquareMatrix::filled(n, 0.0);

        match similarity.kind() {
            ValueKind::Attraction => {
                for i in 0..n {
                    for j in (i + 1)..n {
                        let v = similarity.get(i, j);
                        values.set(i, j, v);
                        values.set(j, i, v);
                    }
                }
            }
            ValueKind::Evalue => {
                let mut max = 0.0_f64;
                for i in 0..n {
                    for j in (i + 1)..n {
                        let v = evalue_to_raw_attraction(similarity.get(i, j));
                        max = max.max(v);
                        values.set(i, j, v);
                        values.set(j, i, v);
                    }
                }

                if max <= 0.0 {
                    return Err(SimilarityError::NumericDegenerate(format!(
                        "no pair among {} sequences has an E-value <= 1, so attraction values cannot be normalized",
                        n
                    )));
                }

                for i in 0..n {
                    for j in (i + 1)..n {
                        let v = *values.get(i, j) / max;
                        values.set(i, j, v);
                        values.set(j, i, v);
                    }
                }
                debug!(max_raw_attraction = max, "Normalized E-values to attraction.");
            }
        }

        Ok(AttractionMatrix::from_normalized(values))
    }

    /// Like [`convert`](Self::convert), but a dataset that cannot be normalized
    /// yields an all-zero matrix instead of an error.
    ///
    /// A layout built on the result is driven by repulsion and gravity alone.
    pub fn convert_or_zero(
        &self,
        similarity: &SimilarityMatrix,
    ) -> Result<AttractionMatrix, SimilarityError> {
        match self.convert(similarity) {
            Err(SimilarityError::NumericDegenerate(reason)) => {
                warn!("{reason}; falling back to zero attraction.");
                Ok(AttractionMatrix::zeros(similarity.size()))
            }
            other => other,
        }
    }
}

#[inline]
fn evalue_to_raw_attraction(evalue: f64) -> f64 {
    if evalue >= 1.0 {
        return 0.0;
    }
    let clamped = if evalue == 0.0 { EVALUE_FLOOR } else { evalue };
    -clamped.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::similarity::NO_HIT_EVALUE;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn single_hit_matrix() -> SimilarityMatrix {
        SimilarityMatrix::from_triples(4, vec![(0, 1, 1e-50)], ValueKind::Evalue).unwrap()
    }

    #[test]
    fn sole_hit_is_normalized_to_one() {
        let attraction = AttractionConverter::new().convert(&single_hit_matrix()).unwrap();
        assert_eq!(attraction.get(0, 1), 1.0);
        assert_eq!(attraction.get(1, 0), 1.0);
        for i in 0..4 {
            for j in 0..4 {
                if (i, j) != (0, 1) && (i, j) != (1, 0) {
                    assert_eq!(attraction.get(i, j), 0.0, "pair ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn evalues_are_scaled_by_the_matrix_wide_maximum() {
        let similarity = SimilarityMatrix::from_triples(
            3,
            vec![(0, 1, 1e-100), (0, 2, 1e-50), (1, 2, 1.0)],
            ValueKind::Evalue,
        )
        .unwrap();
        let attraction = AttractionConverter::new().convert(&similarity).unwrap();
        assert!(f64_approx_equal(attraction.get(0, 1), 1.0));
        assert!(f64_approx_equal(attraction.get(0, 2), 0.5));
        assert_eq!(attraction.get(1, 2), 0.0);
    }

    #[test]
    fn zero_evalue_is_clamped_before_log() {
        let similarity = SimilarityMatrix::from_triples(
            3,
            vec![(0, 1, 0.0), (1, 2, 1e-90)],
            ValueKind::Evalue,
        )
        .unwrap();
        let attraction = AttractionConverter::new().convert(&similarity).unwrap();
        assert!(attraction.get(0, 1).is_finite());
        assert!(f64_approx_equal(attraction.get(0, 1), 1.0));
        assert!(f64_approx_equal(attraction.get(1, 2), 0.5));
    }

    #[test]
    fn evalues_above_one_map_to_zero() {
        assert_eq!(evalue_to_raw_attraction(NO_HIT_EVALUE), 0.0);
        assert_eq!(evalue_to_raw_attraction(1.5), 0.0);
        assert_eq!(evalue_to_raw_attraction(1.0), 0.0);
        assert!(f64_approx_equal(evalue_to_raw_attraction(1e-10), 10.0));
    }

    #[test]
    fn single_sequence_is_numerically_degenerate() {
        let similarity =
            SimilarityMatrix::from_dense(vec![vec![0.0]], ValueKind::Evalue).unwrap();
        let result = AttractionConverter::new().convert(&similarity);
        assert!(matches!(result, Err(SimilarityError::NumericDegenerate(_))));
    }

    #[test]
    fn matrix_without_hits_is_numerically_degenerate() {
        let similarity = SimilarityMatrix::from_triples(3, vec![], ValueKind::Evalue).unwrap();
        let result = AttractionConverter::new().convert(&similarity);
        assert!(matches!(result, Err(SimilarityError::NumericDegenerate(_))));
    }

    #[test]
    fn lenient_conversion_falls_back_to_zero_matrix() {
        let similarity = SimilarityMatrix::from_triples(3, vec![], ValueKind::Evalue).unwrap();
        let attraction = AttractionConverter::new()
            .convert_or_zero(&similarity)
            .unwrap();
        assert_eq!(attraction.size(), 3);
        assert!(attraction.is_all_zero());
    }

    #[test]
    fn attraction_values_pass_through_with_zero_diagonal() {
        let similarity = SimilarityMatrix::from_dense(
            vec![
                vec![1.0, 0.3, 0.0],
                vec![0.3, 1.0, 0.7],
                vec![0.0, 0.7, 1.0],
            ],
            ValueKind::Attraction,
        )
        .unwrap();
        let attraction = AttractionConverter::new().convert(&similarity).unwrap();
        assert_eq!(attraction.get(0, 1), 0.3);
        assert_eq!(attraction.get(2, 1), 0.7);
        assert_eq!(attraction.get(1, 1), 0.0);
    }

    #[test]
    fn result_is_symmetric_and_bounded() {
        let similarity = SimilarityMatrix::from_triples(
            5,
            vec![
                (0, 1, 1e-3),
                (1, 2, 1e-30),
                (3, 4, 0.0),
                (0, 4, 0.5),
                (2, 3, 5.0),
            ],
            ValueKind::Evalue,
        )
        .unwrap();
        let attraction = AttractionConverter::new().convert(&similarity).unwrap();
        assert!(attraction.values().is_symmetric());
        assert!(
            attraction
                .values()
                .rows()
                .all(|row| row.iter().all(|v| (0.0..=1.0).contains(v)))
        );
    }
}
