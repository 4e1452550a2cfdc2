use super::ModelError;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The dimensionality of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dimensions {
    Two,
    Three,
}

impl Dimensions {
    /// Returns the number of spatial axes.
    pub fn count(self) -> usize {
        match self {
            Dimensions::Two => 2,
            Dimensions::Three => 3,
        }
    }
}

impl TryFrom<u8> for Dimensions {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimensions::Two),
            3 => Ok(Dimensions::Three),
            other => Err(ModelError::UnsupportedDimensions(other)),
        }
    }
}

impl From<Dimensions> for u8 {
    fn from(value: Dimensions) -> Self {
        value.count() as u8
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.count())
    }
}

/// Positions of a population of points in 2D or 3D space.
///
/// Points are always stored as [`Vector3`]. In two dimensions the `z` component is
/// pinned to zero: every pairwise difference then has a zero `z` component, so no
/// force ever moves a point out of the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    points: Vec<Vector3<f64>>,
    dimensions: Dimensions,
}

impl Coordinates {
    /// Creates `n` points at the origin.
    pub fn zeros(n: usize, dimensions: Dimensions) -> Self {
        Self {
            points: vec![Vector3::zeros(); n],
            dimensions,
        }
    }

    /// Creates `n` points drawn uniformly from `[-1, 1]` on each active axis.
    ///
    /// # Arguments
    ///
    /// * `n` - The number of points.
    /// * `dimensions` - The layout dimensionality; the `z` axis is left at zero in 2D.
    /// * `rng` - The random source.
    pub fn random(n: usize, dimensions: Dimensions, rng: &mut impl Rng) -> Self {
        let points = (0..n)
            .map(|_| {
                let x = rng.gen_range(-1.0..=1.0);
                let y = rng.gen_range(-1.0..=1.0);
                let z = match dimensions {
                    Dimensions::Two => 0.0,
                    Dimensions::Three => rng.gen_range(-1.0..=1.0),
                };
                Vector3::new(x, y, z)
            })
            .collect();
        Self { points, dimensions }
    }

    /// Builds coordinates from explicit points.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PlanarViolation`] if a 2D point has a non-zero `z` component.
    pub fn from_points(
        points: Vec<Vector3<f64>>,
        dimensions: Dimensions,
    ) -> Result<Self, ModelError> {
        if dimensions == Dimensions::Two {
            if let Some(index) = points.iter().position(|p| p.z != 0.0) {
                return Err(ModelError::PlanarViolation { index });
            }
        }
        Ok(Self { points, dimensions })
    }

    /// Builds coordinates from rows of 2 or 3 values, matching `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RowWidth`] if a row does not have exactly
    /// `dimensions.count()` entries.
    pub fn from_rows(rows: &[Vec<f64>], dimensions: Dimensions) -> Result<Self, ModelError> {
        let width = dimensions.count();
        let points = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                if row.len() != width {
                    return Err(ModelError::RowWidth {
                        index,
                        len: row.len(),
                        expected: width,
                    });
                }
                Ok(Vector3::new(
                    row[0],
                    row[1],
                    if width == 3 { row[2] } else { 0.0 },
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points, dimensions })
    }

    /// Returns the points as rows of `dimensions.count()` values.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        let width = self.dimensions.count();
        self.points
            .iter()
            .map(|p| p.as_slice()[..width].to_vec())
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    #[inline]
    pub fn point(&self, index: usize) -> &Vector3<f64> {
        &self.points[index]
    }

    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Vector3<f64>] {
        &mut self.points
    }

    /// Copies the points at the given indices, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            points: indices.iter().map(|&i| self.points[i]).collect(),
            dimensions: self.dimensions,
        }
    }
}
