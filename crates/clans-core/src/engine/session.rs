use super::config::LayoutParameters;
use crate::core::models::coordinates::Dimensions;
use crate::core::similarity::connectivity::Threshold;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse session: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Session {what} has {actual} entries, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        actual: usize,
        expected: usize,
    },
    #[error("Session {what} row {index} has {len} values, expected {expected}")]
    RowWidth {
        what: &'static str,
        index: usize,
        len: usize,
        expected: usize,
    },
}

/// The saved state of an active subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubsetSession {
    pub members: Vec<usize>,
    pub coordinates: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_movement: Option<Vec<Vec<f64>>>,
}

/// Everything needed to continue a layout where it stopped.
///
/// Values are stored verbatim; a reloaded session resumes from the same
/// coordinates, momentum, temperature and round count. Scalar fields come before
/// the nested tables so the TOML output stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutSession {
    pub size: usize,
    pub dimensions: Dimensions,
    pub rounds_requested: u64,
    pub seed: u64,
    pub temperature: f64,
    pub round: u64,
    /// Coordinates of the full dataset, one row per sequence.
    pub coordinates: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_movement: Option<Vec<Vec<f64>>>,
    pub parameters: LayoutParameters,
    pub threshold: Threshold,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<SubsetSession>,
}

impl LayoutSession {
    pub fn from_toml_str(content: &str) -> Result<Self, SessionError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, SessionError> {
        Ok(toml::to_string(self)?)
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

pub(crate) fn vectors_to_rows(vectors: &[Vector3<f64>], dimensions: Dimensions) -> Vec<Vec<f64>> {
    let width = dimensions.count();
    vectors.iter().map(|v| v.as_slice()[..width].to_vec()).collect()
}

/// Parses `rows` back into vectors, checking both the row count and the width.
pub(crate) fn rows_to_vectors(
    what: &'static str,
    rows: &[Vec<f64>],
    expected: usize,
    dimensions: Dimensions,
) -> Result<Vec<Vector3<f64>>, SessionError> {
    if rows.len() != expected {
        return Err(SessionError::SizeMismatch {
            what,
            actual: rows.len(),
            expected,
        });
    }
    let width = dimensions.count();
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() != width {
                return Err(SessionError::RowWidth {
                    what,
                    index,
                    len: row.len(),
                    expected: width,
                });
            }
            let z = if width == 3 { row[2] } else { 0.0 };
            Ok(Vector3::new(row[0], row[1], z))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> LayoutSession {
        LayoutSession {
            size: 2,
            dimensions: Dimensions::Two,
            rounds_requested: 0,
            seed: 42,
            temperature: 0.3660323412732292,
            round: 100,
            coordinates: vec![vec![0.125, -0.5], vec![1.0 / 3.0, 0.75]],
            prior_movement: Some(vec![vec![0.001, 0.0], vec![-0.001, 0.0]]),
            parameters: LayoutParameters {
                cooling: 0.99,
                ..LayoutParameters::default()
            },
            threshold: Threshold::evalue(1e-10),
            subset: None,
        }
    }

    #[test]
    fn session_survives_a_toml_round_trip_exactly() {
        let session = sample_session();
        let text = session.to_toml_string().unwrap();
        let restored = LayoutSession::from_toml_str(&text).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn session_with_subset_is_written_and_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let session = LayoutSession {
            subset: Some(SubsetSession {
                members: vec![1],
                coordinates: vec![vec![0.2, 0.4]],
                prior_movement: None,
            }),
            ..sample_session()
        };

        session.write_to_path(&path).unwrap();
        let restored = LayoutSession::read_from_path(&path).unwrap();

        assert_eq!(restored, session);
    }

    #[test]
    fn session_without_prior_movement_parses() {
        let text = r#"
            size = 1
            dimensions = 3
            rounds-requested = 50
            seed = 7
            temperature = 1.0
            round = 0
            coordinates = [[0.0, 0.0, 0.0]]

            [parameters]
            att-val = 10.0
            att-exp = 1
            rep-val = 5.0
            rep-exp = 1
            gravity = 1.0
            dampening = 0.2
            max-move = 0.1
            cooling = 1.0

            [threshold]
            value = 0.5
            kind = "attraction"
        "#;
        let session = LayoutSession::from_toml_str(text).unwrap();
        assert_eq!(session.dimensions, Dimensions::Three);
        assert!(session.prior_movement.is_none());
        assert!(session.subset.is_none());
    }

    #[test]
    fn rows_are_checked_for_count_and_width() {
        let rows = vec![vec![0.0, 1.0], vec![2.0, 3.0, 4.0]];
        assert!(matches!(
            rows_to_vectors("coordinates", &rows, 3, Dimensions::Two),
            Err(SessionError::SizeMismatch { actual: 2, .. })
        ));
        assert!(matches!(
            rows_to_vectors("coordinates", &rows, 2, Dimensions::Two),
            Err(SessionError::RowWidth { index: 1, .. })
        ));
    }

    #[test]
    fn planar_rows_round_trip_through_vectors() {
        let vectors = vec![Vector3::new(0.5, -0.25, 0.0)];
        let rows = vectors_to_rows(&vectors, Dimensions::Two);
        assert_eq!(rows, vec![vec![0.5, -0.25]]);
        assert_eq!(
            rows_to_vectors("prior movement", &rows, 1, Dimensions::Two).unwrap(),
            vectors
        );
    }
}
