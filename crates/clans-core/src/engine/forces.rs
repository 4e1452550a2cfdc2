use super::config::LayoutParameters;
use crate::core::similarity::connectivity::Edge;
use nalgebra::Vector3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Distances below this are treated as this value.
pub const MIN_DISTANCE: f64 = 1e-6;

#[inline]
pub fn repulsion_magnitude(dist: f64, rep_val: f64, rep_exp: u32) -> f64 {
    rep_val / dist.max(MIN_DISTANCE).powi(exponent(rep_exp))
}

#[inline]
pub fn attraction_magnitude(dist: f64, attraction: f64, att_val: f64, att_exp: u32) -> f64 {
    attraction * att_val * dist.max(MIN_DISTANCE).powi(exponent(att_exp))
}

/// Exponents above `i32::MAX` saturate instead of wrapping negative.
#[inline]
fn exponent(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Returns the separation vector `a - b` and its floored length.
#[inline]
fn separation(a: &Vector3<f64>, b: &Vector3<f64>) -> (Vector3<f64>, f64) {
    let delta = a - b;
    (delta, delta.norm().max(MIN_DISTANCE))
}

fn zero_buffer(n: usize) -> Vec<Vector3<f64>> {
    vec![Vector3::zeros(); n]
}

fn merge(mut acc: Vec<Vector3<f64>>, other: Vec<Vector3<f64>>) -> Vec<Vector3<f64>> {
    for (a, b) in acc.iter_mut().zip(other) {
        *a += b;
    }
    acc
}

fn add_repulsion_row(
    mut acc: Vec<Vector3<f64>>,
    i: usize,
    points: &[Vector3<f64>],
    parameters: &LayoutParameters,
) -> Vec<Vector3<f64>> {
    for j in (i + 1)..points.len() {
        let (delta, dist) = separation(&points[i], &points[j]);
        let force = delta / dist * repulsion_magnitude(dist, parameters.rep_val, parameters.rep_exp);
        acc[i] += force;
        acc[j] -= force;
    }
    acc
}

fn add_attraction(
    mut acc: Vec<Vector3<f64>>,
    edge: &Edge,
    points: &[Vector3<f64>],
    parameters: &LayoutParameters,
) -> Vec<Vector3<f64>> {
    let (delta, dist) = separation(&points[edge.i], &points[edge.j]);
    let force = delta / dist
        * attraction_magnitude(dist, edge.attraction, parameters.att_val, parameters.att_exp);
    acc[edge.i] -= force;
    acc[edge.j] += force;
    acc
}

/// Sums the pairwise repulsion over all pairs and the attraction over `edges`.
///
/// Edge indices must refer to positions in `points`. Rows are folded into
/// per-worker buffers which are then merged additively.
pub fn accumulate_pairwise(
    points: &[Vector3<f64>],
    edges: &[Edge],
    parameters: &LayoutParameters,
) -> Vec<Vector3<f64>> {
    let n = points.len();

    #[cfg(feature = "parallel")]
    let (repulsion, attraction) = rayon::join(
        || {
            (0..n)
                .into_par_iter()
                .fold(
                    || zero_buffer(n),
                    |acc, i| add_repulsion_row(acc, i, points, parameters),
                )
                .reduce(|| zero_buffer(n), merge)
        },
        || {
            edges
                .par_iter()
                .fold(
                    || zero_buffer(n),
                    |acc, edge| add_attraction(acc, edge, points, parameters),
                )
                .reduce(|| zero_buffer(n), merge)
        },
    );

    #[cfg(not(feature = "parallel"))]
    let (repulsion, attraction) = (
        (0..n).fold(zero_buffer(n), |acc, i| {
            add_repulsion_row(acc, i, points, parameters)
        }),
        edges.iter().fold(zero_buffer(n), |acc, edge| {
            add_attraction(acc, edge, points, parameters)
        }),
    );

    merge(repulsion, attraction)
}
