use super::config::{LayoutConfig, LayoutConfigBuilder};
use super::error::EngineError;
use super::layout::ForceLayoutEngine;
use super::population::Population;
use super::session::{self, LayoutSession, SessionError, SubsetSession};
use super::state::LayoutSnapshot;
use crate::core::models::ModelError;
use crate::core::models::attraction::AttractionMatrix;
use crate::core::models::coordinates::{Coordinates, Dimensions};
use crate::core::models::similarity::SimilarityMatrix;
use crate::core::similarity::attraction::AttractionConverter;
use crate::core::similarity::connectivity::{
    Connectivity, ConnectivityClassifier, SubsetConnectivity, Threshold,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

/// Owns every piece of state a clustering session works on.
///
/// The similarity and attraction matrices are fixed for the lifetime of the
/// context. Connectivity is regenerated whenever the threshold or the subset
/// changes; the layout engine keeps its coordinates across both.
#[derive(Debug)]
pub struct LayoutContext {
    similarity: SimilarityMatrix,
    attraction: AttractionMatrix,
    classifier: ConnectivityClassifier,
    connectivity: Connectivity,
    subset: Option<SubsetConnectivity>,
    engine: ForceLayoutEngine,
    rounds_requested: u64,
    seed: u64,
    rng: StdRng,
}

impl LayoutContext {
    /// Builds a context with all points at the origin.
    ///
    /// The layout has to be initialized before it is stepped. If the similarity
    /// values cannot be normalized, the context falls back to a pure repulsion
    /// layout with an all-zero attraction matrix.
    pub fn new(similarity: SimilarityMatrix, config: &LayoutConfig) -> Result<Self, EngineError> {
        let n = similarity.size();
        let attraction = AttractionConverter::new().convert_or_zero(&similarity)?;

        let classifier = ConnectivityClassifier::new(config.threshold)?;
        let connectivity = classifier.classify(&similarity, &attraction)?;
        info!(
            sequences = n,
            edges = connectivity.edges().len(),
            singletons = connectivity.singletons().len(),
            "Similarity graph ready."
        );

        let seed = config
            .seed
            .unwrap_or_else(|| u64::from(rand::random::<u32>()));
        debug!(seed, "Seeding layout random number generator.");

        let full = Population::full(Coordinates::zeros(n, config.dimensions), &connectivity);
        Ok(Self {
            similarity,
            attraction,
            classifier,
            connectivity,
            subset: None,
            engine: ForceLayoutEngine::new(config.parameters, full),
            rounds_requested: config.rounds_requested,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn attraction(&self) -> &AttractionMatrix {
        &self.attraction
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn subset_connectivity(&self) -> Option<&SubsetConnectivity> {
        self.subset.as_ref()
    }

    pub fn engine(&self) -> &ForceLayoutEngine {
        &self.engine
    }

    pub fn threshold(&self) -> Threshold {
        self.classifier.threshold()
    }

    pub fn dimensions(&self) -> Dimensions {
        self.engine.full().coordinates().dimensions()
    }

    pub fn rounds_requested(&self) -> u64 {
        self.rounds_requested
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Re-thresholds the full dataset and, if present, the active subset.
    ///
    /// Coordinates and momentum are kept.
    pub fn set_threshold(&mut self, threshold: Threshold) -> Result<(), EngineError> {
        let classifier = ConnectivityClassifier::new(threshold)?;
        let connectivity = classifier.classify(&self.similarity, &self.attraction)?;
        let subset = match &self.subset {
            Some(current) => {
                let membership = self.membership_of(current.members());
                Some(classifier.classify_subset(&self.similarity, &self.attraction, &membership)?)
            }
            None => None,
        };

        self.engine.set_full_edges(&connectivity);
        if let Some(subset) = &subset {
            self.engine.set_subset_edges(subset);
        }
        debug!(
            threshold = threshold.value,
            edges = connectivity.edges().len(),
            "Regenerated connectivity."
        );
        self.classifier = classifier;
        self.connectivity = connectivity;
        self.subset = subset;
        Ok(())
    }

    /// Switches the layout to the sequences flagged in `membership`.
    ///
    /// Subset points start at the current full-dataset positions of the members.
    pub fn select_subset(&mut self, membership: &[bool]) -> Result<(), EngineError> {
        let subset =
            self.classifier
                .classify_subset(&self.similarity, &self.attraction, membership)?;
        let coordinates = self.engine.full().coordinates().select(subset.members());
        self.engine
            .enter_subset(Population::subset(coordinates, &subset));
        info!(
            members = subset.size(),
            edges = subset.local().edges().len(),
            "Entered subset mode."
        );
        self.subset = Some(subset);
        Ok(())
    }

    /// Like [`select_subset`](Self::select_subset), with the members given as global indices.
    pub fn select_subset_indices(&mut self, indices: &[usize]) -> Result<(), EngineError> {
        let n = self.similarity.size();
        if let Some(&index) = indices.iter().find(|&&i| i >= n) {
            return Err(ModelError::IndexOutOfRange { index, size: n }.into());
        }
        let membership = self.membership_of(indices);
        self.select_subset(&membership)
    }

    pub fn clear_subset(&mut self) {
        if self.subset.take().is_some() {
            self.engine.leave_subset();
            info!("Returned to the full dataset.");
        }
    }

    pub fn initialize(&mut self) {
        self.engine.initialize(&mut self.rng);
    }

    pub fn step(&mut self) {
        self.engine.step();
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.engine.snapshot()
    }

    fn membership_of(&self, members: &[usize]) -> Vec<bool> {
        let mut membership = vec![false; self.similarity.size()];
        for &i in members {
            membership[i] = true;
        }
        membership
    }

    /// Captures the current layout for persistence.
    pub fn to_session(&self) -> LayoutSession {
        let dimensions = self.dimensions();
        let full = self.engine.full();
        let subset = self.engine.subset().map(|population| SubsetSession {
            members: population.members().map(<[usize]>::to_vec).unwrap_or_default(),
            coordinates: population.coordinates().to_rows(),
            prior_movement: Some(session::vectors_to_rows(
                population.prior_movement(),
                dimensions,
            )),
        });

        LayoutSession {
            size: self.similarity.size(),
            dimensions,
            rounds_requested: self.rounds_requested,
            seed: self.seed,
            temperature: self.engine.temperature(),
            round: self.engine.round(),
            coordinates: full.coordinates().to_rows(),
            prior_movement: Some(session::vectors_to_rows(full.prior_movement(), dimensions)),
            parameters: *self.engine.parameters(),
            threshold: self.threshold(),
            subset,
        }
    }

    /// Rebuilds a context from `similarity` and a saved session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Session`] if the session does not fit the similarity
    /// data, and the usual configuration errors if its parameters are invalid.
    pub fn from_session(
        similarity: SimilarityMatrix,
        saved: &LayoutSession,
    ) -> Result<Self, EngineError> {
        let n = similarity.size();
        if saved.size != n {
            return Err(SessionError::SizeMismatch {
                what: "sequence count",
                actual: saved.size,
                expected: n,
            }
            .into());
        }

        let config = LayoutConfigBuilder::new()
            .parameters(saved.parameters)
            .threshold(saved.threshold)
            .dimensions(saved.dimensions)
            .rounds_requested(saved.rounds_requested)
            .seed(Some(saved.seed))
            .build()?;
        let mut context = Self::new(similarity, &config)?;
        let dimensions = saved.dimensions;

        let points = session::rows_to_vectors("coordinates", &saved.coordinates, n, dimensions)?;
        let full = context.engine.full_mut();
        full.coordinates = Coordinates::from_points(points, dimensions)?;
        if let Some(rows) = &saved.prior_movement {
            full.prior_movement = session::rows_to_vectors("prior movement", rows, n, dimensions)?;
        }

        if let Some(subset) = &saved.subset {
            context.select_subset_indices(&subset.members)?;
            let k = subset.members.len();
            let points =
                session::rows_to_vectors("subset coordinates", &subset.coordinates, k, dimensions)?;
            let prior = match &subset.prior_movement {
                Some(rows) => Some(session::rows_to_vectors(
                    "subset prior movement",
                    rows,
                    k,
                    dimensions,
                )?),
                None => None,
            };
            let population = context.engine.subset_mut().ok_or_else(|| {
                EngineError::Internal("subset population missing after selection".to_string())
            })?;
            population.coordinates = Coordinates::from_points(points, dimensions)?;
            if let Some(prior) = prior {
                population.prior_movement = prior;
            }
        }

        context
            .engine
            .restore_clock(saved.temperature, saved.round);
        info!(round = saved.round, "Restored layout session.");
        Ok(context)
    }
}
