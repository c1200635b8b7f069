//! End-to-end bundle construction for one analysis run.
//!
//! These drivers tie the run configuration to the readers and array
//! builders: ingest the input tables, normalize and filter records, build
//! every dense array, and hand back the validated
//! [`ModelDataBundle`](crate::model_data::ModelDataBundle). Each run
//! constructs fresh arrays from fresh input; nothing is cached between runs.

use crate::covey_errors::CoveyError;
use crate::model_data::ModelDataBundle;
use crate::reshape::covariates::{CovariateSchema, OccasionCovariates, SiteCovariates};
use crate::reshape::detection_grid::{
    BinaryPresenceGrid, DetectionCube, DetectionGrid, OccupiedOccasions,
};
use crate::reshape::validation_grid::ValidationGrid;
use crate::run_config::RunConfig;
use crate::surveys::aru_reader::{read_aru_detections, read_validation_counts};
use crate::surveys::point_count_reader::{read_point_counts, read_survey_conditions};

/// Build the model data bundle for the acoustic (ARU) pathway.
///
/// Arguments
/// -----------------
/// * `config`: the run configuration (paths, calendar, grid, geometry).
/// * `site_schema`: declared per-site habitat covariate columns.
/// * `min_score`: optional classifier-score cutoff applied before
///   aggregation.
///
/// Return
/// ----------
/// * The validated bundle, or the first fatal input inconsistency.
pub fn build_acoustic_bundle(
    config: &RunConfig,
    site_schema: &CovariateSchema,
    min_score: Option<f64>,
) -> Result<ModelDataBundle, CoveyError> {
    let dims = *config.dims();
    let paths = config.paths();

    let records = read_aru_detections(&paths.detections, config.calendar(), &dims, min_score)?;
    let detections = DetectionGrid::accumulate(&records, &dims)?;
    let presence = BinaryPresenceGrid::from_counts(&detections);
    let occupied = OccupiedOccasions::from_grid(&detections);

    let site_covariates = SiteCovariates::read(&paths.site_covariates, site_schema, &dims)?;

    let occasion_covariates = match &paths.survey_conditions {
        Some(path) => {
            let mut conditions = read_survey_conditions(path, &dims)?;
            // ARU visits sit on the shared calendar, so rows without their
            // own date still get the occasion's day-of-year as phenology
            for visit in &mut conditions {
                if visit.day_of_year.is_none() {
                    visit.day_of_year = Some(config.calendar().day_of_year(visit.occasion)?);
                }
            }
            Some(OccasionCovariates::build(&conditions, &dims)?)
        }
        None => None,
    };

    let validation = match &paths.validation_counts {
        Some(path) => {
            let counts = read_validation_counts(path, config.calendar(), &dims)?;
            Some(ValidationGrid::build(&counts, &dims)?)
        }
        None => None,
    };

    ModelDataBundle::new(
        dims,
        *config.geometry(),
        detections,
        None,
        presence,
        occupied,
        site_covariates,
        occasion_covariates,
        validation,
    )
}

/// Build the model data bundle for the point-count distance-sampling
/// pathway.
///
/// The per-individual rows are accumulated into the full
/// site × bin × occasion array; the collapsed site × occasion grid and its
/// derived indices are built from the same records, so the bundle's
/// cross-checks hold by construction.
pub fn build_point_count_bundle(
    config: &RunConfig,
    site_schema: &CovariateSchema,
) -> Result<ModelDataBundle, CoveyError> {
    let dims = *config.dims();
    let paths = config.paths();

    let records = read_point_counts(&paths.detections, &dims)?;
    let cube = DetectionCube::accumulate(&records, &dims)?;
    let detections = cube.collapse();
    let presence = BinaryPresenceGrid::from_counts(&detections);
    let occupied = OccupiedOccasions::from_grid(&detections);

    let site_covariates = SiteCovariates::read(&paths.site_covariates, site_schema, &dims)?;

    let occasion_covariates = match &paths.survey_conditions {
        Some(path) => {
            let conditions = read_survey_conditions(path, &dims)?;
            Some(OccasionCovariates::build(&conditions, &dims)?)
        }
        None => None,
    };

    ModelDataBundle::new(
        dims,
        *config.geometry(),
        detections,
        Some(cube),
        presence,
        occupied,
        site_covariates,
        occasion_covariates,
        None,
    )
}
