use super::SimilarityError;
use crate::core::models::attraction::AttractionMatrix;
use crate::core::models::matrix::SquareMatrix;
use crate::core::models::similarity::{SimilarityMatrix, ValueKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A cutoff deciding whether two sequences are connected.
///
/// An E-value threshold connects pairs with `evalue <= value`; an attraction
/// threshold connects pairs with `attraction >= value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub value: f64,
    pub kind: ValueKind,
}

impl Threshold {
    pub fn evalue(value: f64) -> Self {
        Self {
            value,
            kind: ValueKind::Evalue,
        }
    }

    pub fn attraction(value: f64) -> Self {
        Self {
            value,
            kind: ValueKind::Attraction,
        }
    }

    /// Checks that the threshold value lies in the domain of its kind.
    ///
    /// # Errors
    ///
    /// Returns [`SimilarityError::ConfigOutOfRange`] naming the valid range.
    pub fn validate(&self) -> Result<(), SimilarityError> {
        let ok = match self.kind {
            ValueKind::Evalue => self.value.is_finite() && self.value >= 0.0,
            ValueKind::Attraction => (0.0..=1.0).contains(&self.value),
        };
        if ok {
            Ok(())
        } else {
            Err(SimilarityError::ConfigOutOfRange {
                parameter: "threshold",
                value: self.value,
                valid: self.valid_range(),
            })
        }
    }

    /// Describes the domain of threshold values for this kind.
    pub fn valid_range(&self) -> &'static str {
        match self.kind {
            ValueKind::Evalue => "[0, +inf) for E-value thresholds",
            ValueKind::Attraction => "[0, 1] for attraction thresholds",
        }
    }
}

/// A connected pair `(i, j)` with `i < j` and its attraction value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub i: usize,
    pub j: usize,
    pub attraction: f64,
}

/// The thresholded graph over a population of sequences.
///
/// The adjacency matrix is symmetric with a zero diagonal, the edge list is
/// sorted by ascending `i` then `j`, and the singleton list is ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Connectivity {
    matrix: SquareMatrix<bool>,
    edges: Vec<Edge>,
    singletons: Vec<usize>,
    degrees: Vec<usize>,
}

impl Connectivity {
    fn from_edges(n: usize, edges: Vec<Edge>) -> Self {
        let mut matrix = SquareMatrix::filled(n, false);
        let mut degrees = vec![0; n];
        for edge in &edges {
            matrix.set(edge.i, edge.j, true);
            matrix.set(edge.j, edge.i, true);
            degrees[edge.i] += 1;
            degrees[edge.j] += 1;
        }
        let singletons = degrees
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        Self {
            matrix,
            edges,
            singletons,
            degrees,
        }
    }

    /// Returns the population size.
    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    #[inline]
    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        *self.matrix.get(i, j)
    }

    pub fn matrix(&self) -> &SquareMatrix<bool> {
        &self.matrix
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn singletons(&self) -> &[usize] {
        &self.singletons
    }

    /// Returns the number of neighbors of node `i`.
    pub fn degree(&self, i: usize) -> usize {
        self.degrees[i]
    }

    /// Returns the neighbors of node `i` in ascending order.
    pub fn neighbors_of(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.matrix
            .row(i)
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c)
            .map(|(j, _)| j)
    }
}

/// The connectivity of a subset, expressed in a compacted local index space.
///
/// Local index `k` refers to global sequence `members()[k]`; members are sorted
/// ascending, which is the same ordering used for subset coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetConnectivity {
    members: Vec<usize>,
    local: Connectivity,
}

impl SubsetConnectivity {
    /// Returns the global indices of the members, ascending.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns the connectivity over local indices `0..K`.
    pub fn local(&self) -> &Connectivity {
        &self.local
    }

    /// Maps a local index back to its global sequence index.
    pub fn global_index(&self, local: usize) -> usize {
        self.members[local]
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Thresholds similarity or attraction values into a [`Connectivity`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectivityClassifier {
    threshold: Threshold,
}

impl ConnectivityClassifier {
    /// Creates a classifier after validating `threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`SimilarityError::ConfigOutOfRange`] if the threshold lies outside the
    /// domain of its kind.
    pub fn new(threshold: Threshold) -> Result<Self, SimilarityError> {
        threshold.validate()?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Classifies every pair of the full dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrices disagree in size or if an E-value threshold
    /// is applied to a matrix of attraction values.
    #[instrument(level = "debug", skip_all, fields(threshold = self.threshold.value, kind = %self.threshold.kind))]
    pub fn classify(
        &self,
        similarity: &SimilarityMatrix,
        attraction: &AttractionMatrix,
    ) -> Result<Connectivity, SimilarityError> {
        self.check_inputs(similarity, attraction)?;
        let members: Vec<usize> = (0..similarity.size()).collect();
        let connectivity = self.classify_members(similarity, attraction, &members);
        debug!(
            edges = connectivity.edges.len(),
            singletons = connectivity.singletons.len(),
            "Classified full dataset."
        );
        Ok(connectivity)
    }

    /// Classifies the pairs among the sequences flagged in `membership`.
    ///
    /// # Arguments
    ///
    /// * `membership` - One flag per sequence; `true` marks a subset member.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`classify`](Self::classify), returns
    /// [`SimilarityError::SizeMismatch`] if `membership` does not have one entry per
    /// sequence and [`SimilarityError::InvalidInput`] if it selects nothing.
    #[instrument(level = "debug", skip_all, fields(threshold = self.threshold.value, kind = %self.threshold.kind))]
    pub fn classify_subset(
        &self,
        similarity: &SimilarityMatrix,
        attraction: &AttractionMatrix,
        membership: &[bool],
    ) -> Result<SubsetConnectivity, SimilarityError> {
        self.check_inputs(similarity, attraction)?;
        if membership.len() != similarity.size() {
            return Err(SimilarityError::SizeMismatch {
                what: "subset membership",
                actual: membership.len(),
                expected: similarity.size(),
            });
        }

        let members: Vec<usize> = membership
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            return Err(SimilarityError::InvalidInput(
                "subset selection is empty".to_string(),
            ));
        }

        let local = self.classify_members(similarity, attraction, &members);
        debug!(
            members = members.len(),
            edges = local.edges.len(),
            "Classified subset."
        );
        Ok(SubsetConnectivity { members, local })
    }

    fn check_inputs(
        &self,
        similarity: &SimilarityMatrix,
        attraction: &AttractionMatrix,
    ) -> Result<(), SimilarityError> {
        if attraction.size() != similarity.size() {
            return Err(SimilarityError::SizeMismatch {
                what: "attraction matrix",
                actual: attraction.size(),
                expected: similarity.size(),
            });
        }
        if self.threshold.kind == ValueKind::Evalue && similarity.kind() != ValueKind::Evalue {
            return Err(SimilarityError::IncompatibleThreshold {
                threshold: self.threshold.kind,
                matrix: similarity.kind(),
            });
        }
        Ok(())
    }

    #[inline]
    fn is_connected(
        &self,
        similarity: &SimilarityMatrix,
        attraction: &AttractionMatrix,
        i: usize,
        j: usize,
    ) -> bool {
        match self.threshold.kind {
            ValueKind::Evalue => similarity.get(i, j) <= self.threshold.value,
            ValueKind::Attraction => attraction.get(i, j) >= self.threshold.value,
        }
    }

    /// Builds the connectivity among `members` (ascending global indices) using
    /// local indices. Rows are classified independently and concatenated in order,
    /// so the edge list is deterministic regardless of scheduling.
    fn classify_members(
        &self,
        similarity: &SimilarityMatrix,
        attraction: &AttractionMatrix,
        members: &[usize],
    ) -> Connectivity {
        let k = members.len();
        let row_edges = |a: usize| -> Vec<Edge> {
            let gi = members[a];
            ((a + 1)..k)
                .filter_map(|b| {
                    let gj = members[b];
                    self.is_connected(similarity, attraction, gi, gj)
                        .then(|| Edge {
                            i: a,
                            j: b,
                            attraction: attraction.get(gi, gj),
                        })
                })
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<Edge>> = (0..k).map(row_edges).collect();

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<Edge>> = (0..k).into_par_iter().map(row_edges).collect();

        let edges = rows.into_iter().flatten().collect();
        Connectivity::from_edges(k, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::similarity::attraction::AttractionConverter;

    fn single_hit_inputs() -> (SimilarityMatrix, AttractionMatrix) {
        let similarity =
            SimilarityMatrix::from_triples(4, vec![(0, 1, 1e-50)], ValueKind::Evalue).unwrap();
        let attraction = AttractionConverter::new().convert(&similarity).unwrap();
        (similarity, attraction)
    }

    fn chain_inputs() -> (SimilarityMatrix, AttractionMatrix) {
        let similarity = SimilarityMatrix::from_triples(
            6,
            vec![
                (0, 1, 1e-40),
                (1, 2, 1e-20),
                (2, 3, 1e-10),
                (3, 4, 1e-5),
                (0, 5, 1e-2),
                (1, 4, 1e-60),
            ],
            ValueKind::Evalue,
        )
        .unwrap();
        let attraction = AttractionConverter::new().convert(&similarity).unwrap();
        (similarity, attraction)
    }

    #[test]
    fn single_hit_produces_one_edge_and_two_singletons() {
        let (similarity, attraction) = single_hit_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1e-3)).unwrap();
        let connectivity = classifier.classify(&similarity, &attraction).unwrap();

        assert_eq!(
            connectivity.edges(),
            &[Edge {
                i: 0,
                j: 1,
                attraction: 1.0
            }]
        );
        assert_eq!(connectivity.singletons(), &[2, 3]);
        let true_cells = connectivity
            .matrix()
            .rows()
            .flatten()
            .filter(|&&c| c)
            .count();
        assert_eq!(true_cells, 2);
        assert!(connectivity.is_connected(0, 1));
        assert!(connectivity.is_connected(1, 0));
    }

    #[test]
    fn matrix_is_symmetric_with_empty_diagonal() {
        let (similarity, attraction) = chain_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1.0)).unwrap();
        let connectivity = classifier.classify(&similarity, &attraction).unwrap();
        assert!(connectivity.matrix().is_symmetric());
        assert!((0..6).all(|i| !connectivity.is_connected(i, i)));
    }

    #[test]
    fn edge_list_is_sorted_and_stable_across_calls() {
        let (similarity, attraction) = chain_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1e-4)).unwrap();
        let first = classifier.classify(&similarity, &attraction).unwrap();
        let second = classifier.classify(&similarity, &attraction).unwrap();

        assert_eq!(first.edges(), second.edges());
        let pairs: Vec<_> = first.edges().iter().map(|e| (e.i, e.j)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2), (1, 4), (2, 3), (3, 4)]);
    }

    #[test]
    fn attraction_threshold_uses_normalized_values() {
        let (similarity, attraction) = chain_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::attraction(0.5)).unwrap();
        let connectivity = classifier.classify(&similarity, &attraction).unwrap();
        let pairs: Vec<_> = connectivity.edges().iter().map(|e| (e.i, e.j)).collect();
        // 1e-60 normalizes to 1.0, 1e-40 to 2/3, 1e-20 to 1/3.
        assert_eq!(pairs, vec![(0, 1), (1, 4)]);
        assert_eq!(connectivity.singletons(), &[2, 3, 5]);
    }

    #[test]
    fn degrees_and_neighbors_follow_edges() {
        let (similarity, attraction) = chain_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1e-4)).unwrap();
        let connectivity = classifier.classify(&similarity, &attraction).unwrap();
        assert_eq!(connectivity.degree(1), 3);
        assert_eq!(connectivity.neighbors_of(1).collect::<Vec<_>>(), vec![0, 2, 4]);
        assert_eq!(connectivity.degree(5), 0);
    }

    #[test]
    fn subset_uses_compacted_ascending_indices() {
        let (similarity, attraction) = chain_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1e-4)).unwrap();
        let membership = [false, true, false, true, true, false];
        let subset = classifier
            .classify_subset(&similarity, &attraction, &membership)
            .unwrap();

        assert_eq!(subset.members(), &[1, 3, 4]);
        let pairs: Vec<_> = subset
            .local()
            .edges()
            .iter()
            .map(|e| (e.i, e.j))
            .collect();
        // Global (1, 4) -> local (0, 2); global (3, 4) -> local (1, 2).
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
        assert_eq!(subset.global_index(2), 4);
        assert_eq!(subset.local().edges()[0].attraction, attraction.get(1, 4));
        assert!(subset.local().singletons().is_empty());
    }

    #[test]
    fn subset_rejects_wrong_membership_length() {
        let (similarity, attraction) = chain_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1e-4)).unwrap();
        let result = classifier.classify_subset(&similarity, &attraction, &[true, false]);
        assert!(matches!(result, Err(SimilarityError::SizeMismatch { .. })));
    }

    #[test]
    fn subset_rejects_empty_selection() {
        let (similarity, attraction) = chain_inputs();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1e-4)).unwrap();
        let result = classifier.classify_subset(&similarity, &attraction, &[false; 6]);
        assert!(matches!(result, Err(SimilarityError::InvalidInput(_))));
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        assert!(matches!(
            ConnectivityClassifier::new(Threshold::attraction(1.5)),
            Err(SimilarityError::ConfigOutOfRange {
                parameter: "threshold",
                ..
            })
        ));
        assert!(ConnectivityClassifier::new(Threshold::evalue(-1.0)).is_err());
        assert!(ConnectivityClassifier::new(Threshold::evalue(f64::NAN)).is_err());
    }

    #[test]
    fn evalue_threshold_on_attraction_matrix_is_rejected() {
        let similarity = SimilarityMatrix::from_dense(
            vec![vec![0.0, 0.5], vec![0.5, 0.0]],
            ValueKind::Attraction,
        )
        .unwrap();
        let attraction = AttractionConverter::new().convert(&similarity).unwrap();
        let classifier = ConnectivityClassifier::new(Threshold::evalue(1e-3)).unwrap();
        assert!(matches!(
            classifier.classify(&similarity, &attraction),
            Err(SimilarityError::IncompatibleThreshold { .. })
        ));
    }
}
