use crate::core::models::coordinates::Coordinates;
use crate::core::similarity::connectivity::{Connectivity, Edge, SubsetConnectivity};
use nalgebra::Vector3;

/// A self-contained set of points that the layout engine steps.
///
/// The full dataset and a subset are both populations; a subset carries the
/// global indices of its members and uses compacted local indices everywhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub(crate) coordinates: Coordinates,
    pub(crate) prior_movement: Vec<Vector3<f64>>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) members: Option<Vec<usize>>,
}

impl Population {
    pub fn full(coordinates: Coordinates, connectivity: &Connectivity) -> Self {
        let n = coordinates.len();
        Self {
            coordinates,
            prior_movement: vec![Vector3::zeros(); n],
            edges: connectivity.edges().to_vec(),
            members: None,
        }
    }

    /// Builds a subset population from its own coordinates, ordered like the members.
    pub fn subset(coordinates: Coordinates, connectivity: &SubsetConnectivity) -> Self {
        let n = coordinates.len();
        Self {
            coordinates,
            prior_movement: vec![Vector3::zeros(); n],
            edges: connectivity.local().edges().to_vec(),
            members: Some(connectivity.members().to_vec()),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.coordinates.len()
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    pub fn prior_movement(&self) -> &[Vector3<f64>] {
        &self.prior_movement
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn members(&self) -> Option<&[usize]> {
        self.members.as_deref()
    }

    pub(crate) fn set_edges(&mut self, edges: &[Edge]) {
        self.edges = edges.to_vec();
    }

    pub(crate) fn reset_motion(&mut self) {
        self.prior_movement.fill(Vector3::zeros());
    }
}
