//! The immutable model data bundle handed to the inference engine.
//!
//! Every array the sampler consumes is assembled here through one validated
//! constructor. The arrays are built by independent passes over different
//! input tables, so their shapes can silently disagree; a mismatch that
//! reached the sampler would corrupt the likelihood without any engine-level
//! error. [`ModelDataBundle::new`] therefore asserts every cross-dimension
//! invariant in one place and fails before any sampling is attempted.

use crate::covey_errors::CoveyError;
use crate::reshape::covariates::{OccasionCovariates, SiteCovariates};
use crate::reshape::detection_grid::{
    BinaryPresenceGrid, DetectionCube, DetectionGrid, OccupiedOccasions,
};
use crate::reshape::grid_index::GridDims;
use crate::reshape::validation_grid::ValidationGrid;
use crate::run_config::SurveyGeometry;

/// Immutable aggregate of all model inputs for one run.
///
/// Constructed once, never mutated afterwards; the inference engine receives
/// a shared reference.
#[derive(Debug, Clone)]
pub struct ModelDataBundle {
    dims: GridDims,
    geometry: SurveyGeometry,
    detections: DetectionGrid,
    distance_counts: Option<DetectionCube>,
    presence: BinaryPresenceGrid,
    occupied: OccupiedOccasions,
    site_covariates: SiteCovariates,
    occasion_covariates: Option<OccasionCovariates>,
    validation: Option<ValidationGrid>,
}

impl ModelDataBundle {
    /// Assemble and cross-validate the bundle.
    ///
    /// Return
    /// ----------
    /// * The validated bundle, or [`CoveyError::DimensionMismatch`] naming
    ///   the first disagreement found. No partially-valid bundle is ever
    ///   produced.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dims: GridDims,
        geometry: SurveyGeometry,
        detections: DetectionGrid,
        distance_counts: Option<DetectionCube>,
        presence: BinaryPresenceGrid,
        occupied: OccupiedOccasions,
        site_covariates: SiteCovariates,
        occasion_covariates: Option<OccasionCovariates>,
        validation: Option<ValidationGrid>,
    ) -> Result<Self, CoveyError> {
        let (n_sites, n_occasions) = (dims.n_sites(), dims.n_occasions());
        let mismatch = |what: &str, got: (usize, usize)| {
            CoveyError::DimensionMismatch(format!(
                "{what} is {}x{} but the grid declares {n_sites} sites x {n_occasions} occasions",
                got.0, got.1
            ))
        };

        if detections.counts().shape() != (n_sites, n_occasions) {
            return Err(mismatch("detection grid", detections.counts().shape()));
        }
        if presence.cells().shape() != (n_sites, n_occasions) {
            return Err(mismatch("presence grid", presence.cells().shape()));
        }
        let derived = BinaryPresenceGrid::from_counts(&detections);
        if presence.cells() != derived.cells() {
            return Err(CoveyError::DimensionMismatch(
                "presence grid does not match the detection grid's indicator".to_string(),
            ));
        }

        if occupied.n_sites() != n_sites {
            return Err(CoveyError::DimensionMismatch(format!(
                "occupied-occasion index covers {} sites, grid declares {n_sites}",
                occupied.n_sites()
            )));
        }

        if let Some(cube) = &distance_counts {
            if cube.n_distance_bins() != dims.n_distance_bins() {
                return Err(CoveyError::DimensionMismatch(format!(
                    "distance array has {} bins, grid declares {}",
                    cube.n_distance_bins(),
                    dims.n_distance_bins()
                )));
            }
            for bin in cube.bins() {
                if bin.shape() != (n_sites, n_occasions) {
                    return Err(mismatch("distance-bin slice", bin.shape()));
                }
            }
            if cube.collapse() != detections {
                return Err(CoveyError::DimensionMismatch(
                    "distance array does not collapse onto the detection grid".to_string(),
                ));
            }
            let implied = geometry.n_distance_bins()?;
            if implied != dims.n_distance_bins() {
                return Err(CoveyError::DimensionMismatch(format!(
                    "geometry implies {implied} distance bins, grid declares {}",
                    dims.n_distance_bins()
                )));
            }
        }

        if site_covariates.n_sites() != n_sites {
            return Err(CoveyError::DimensionMismatch(format!(
                "site-covariate matrix has {} rows, grid declares {n_sites} sites",
                site_covariates.n_sites()
            )));
        }

        if let Some(occ_cov) = &occasion_covariates {
            for (name, grid) in occ_cov.names().iter().zip(occ_cov.grids()) {
                if grid.shape() != (n_sites, n_occasions) {
                    return Err(mismatch(&format!("covariate grid {name}"), grid.shape()));
                }
            }
        }

        if let Some(validated) = &validation {
            for pair in validated.site_index().windows(2) {
                if pair[0] >= pair[1] {
                    return Err(CoveyError::DimensionMismatch(
                        "validated-site index list is not strictly ascending".to_string(),
                    ));
                }
            }
            if let Some(last) = validated.site_index().last() {
                if *last as usize > n_sites {
                    return Err(CoveyError::DimensionMismatch(format!(
                        "validated site {last} lies outside the {n_sites}-site grid"
                    )));
                }
            }
            let n_validated = validated.n_validated_sites();
            if validated.calls_checked().shape() != (n_validated, n_occasions)
                || validated.calls_confirmed().shape() != (n_validated, n_occasions)
            {
                return Err(CoveyError::DimensionMismatch(format!(
                    "validation matrices do not match {n_validated} validated sites x {n_occasions} occasions"
                )));
            }
        }

        Ok(ModelDataBundle {
            dims,
            geometry,
            detections,
            distance_counts,
            presence,
            occupied,
            site_covariates,
            occasion_covariates,
            validation,
        })
    }

    pub fn dims(&self) -> &GridDims {
        &self.dims
    }

    pub fn geometry(&self) -> &SurveyGeometry {
        &self.geometry
    }

    pub fn detections(&self) -> &DetectionGrid {
        &self.detections
    }

    pub fn distance_counts(&self) -> Option<&DetectionCube> {
        self.distance_counts.as_ref()
    }

    pub fn presence(&self) -> &BinaryPresenceGrid {
        &self.presence
    }

    pub fn occupied(&self) -> &OccupiedOccasions {
        &self.occupied
    }

    pub fn site_covariates(&self) -> &SiteCovariates {
        &self.site_covariates
    }

    pub fn occasion_covariates(&self) -> Option<&OccasionCovariates> {
        self.occasion_covariates.as_ref()
    }

    pub fn validation(&self) -> Option<&ValidationGrid> {
        self.validation.as_ref()
    }

    /// Abundance-to-density offset: surveyed area in hectares.
    pub fn survey_area_ha(&self) -> f64 {
        self.geometry.survey_area_ha()
    }
}
