//! Per-run configuration.
//!
//! Everything a pipeline run needs — RNG seed, input file locations, the
//! survey calendar, the declared grid, and the point-count geometry — is
//! carried explicitly in a [`RunConfig`] built once at startup. Nothing in
//! the pipeline reads ambient globals (working directory, process-wide seed).

use camino::{Utf8Path, Utf8PathBuf};

use crate::constants::{DEFAULT_BIN_WIDTH_M, DEFAULT_SURVEY_RADIUS_M, M2_PER_HECTARE};
use crate::covey_errors::CoveyError;
use crate::reshape::grid_index::GridDims;
use crate::surveys::calendar::SurveyCalendar;

/// Point-count distance-sampling geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyGeometry {
    /// Width of one distance bin, meters.
    pub bin_width_m: f64,
    /// Truncation radius of the survey, meters.
    pub survey_radius_m: f64,
}

impl Default for SurveyGeometry {
    fn default() -> Self {
        SurveyGeometry {
            bin_width_m: DEFAULT_BIN_WIDTH_M,
            survey_radius_m: DEFAULT_SURVEY_RADIUS_M,
        }
    }
}

impl SurveyGeometry {
    /// Number of distance bins implied by the radius and bin width.
    ///
    /// The radius must be an exact multiple of the bin width; a remainder
    /// means the declared bins cannot tile the survey circle.
    pub fn n_distance_bins(&self) -> Result<usize, CoveyError> {
        if self.bin_width_m <= 0.0 || self.survey_radius_m <= 0.0 {
            return Err(CoveyError::InvalidGrid(format!(
                "non-positive geometry: bin width {} m, radius {} m",
                self.bin_width_m, self.survey_radius_m
            )));
        }
        let ratio = self.survey_radius_m / self.bin_width_m;
        if (ratio - ratio.round()).abs() > 1e-9 {
            return Err(CoveyError::InvalidGrid(format!(
                "survey radius {} m is not a whole number of {} m bins",
                self.survey_radius_m, self.bin_width_m
            )));
        }
        Ok(ratio.round() as usize)
    }

    /// Surveyed area in hectares, the offset converting abundance to density.
    pub fn survey_area_ha(&self) -> f64 {
        std::f64::consts::PI * self.survey_radius_m * self.survey_radius_m / M2_PER_HECTARE
    }
}

/// Input file locations for one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPaths {
    /// Per-detection table (ARU classifier output or point-count rows).
    pub detections: Utf8PathBuf,
    /// Per-site habitat covariate table.
    pub site_covariates: Utf8PathBuf,
    /// Per-survey conditions table (point-count pathway).
    pub survey_conditions: Option<Utf8PathBuf>,
    /// Manual-validation count table (acoustic pathway).
    pub validation_counts: Option<Utf8PathBuf>,
}

/// Explicit configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    seed: u64,
    paths: InputPaths,
    calendar: SurveyCalendar,
    dims: GridDims,
    geometry: SurveyGeometry,
    output_dir: Utf8PathBuf,
}

impl RunConfig {
    /// Assemble a run configuration, cross-checking the declared grid
    /// against the calendar and geometry.
    ///
    /// Arguments
    /// -----------------
    /// * `seed`: RNG seed for the sampler's initial-value generator.
    /// * `paths`: input table locations.
    /// * `calendar`: fixed survey calendar; its length must equal the grid's
    ///   occasion dimension.
    /// * `dims`: declared grid shape.
    /// * `geometry`: point-count geometry; its implied bin count must equal
    ///   the grid's distance-bin dimension.
    /// * `output_dir`: directory receiving the write-once summary artifacts.
    pub fn new(
        seed: u64,
        paths: InputPaths,
        calendar: SurveyCalendar,
        dims: GridDims,
        geometry: SurveyGeometry,
        output_dir: Utf8PathBuf,
    ) -> Result<Self, CoveyError> {
        if calendar.len() != dims.n_occasions() {
            return Err(CoveyError::DimensionMismatch(format!(
                "calendar has {} dates but the grid declares {} occasions",
                calendar.len(),
                dims.n_occasions()
            )));
        }
        if dims.n_distance_bins() > 1 {
            let implied = geometry.n_distance_bins()?;
            if implied != dims.n_distance_bins() {
                return Err(CoveyError::DimensionMismatch(format!(
                    "geometry implies {} distance bins but the grid declares {}",
                    implied,
                    dims.n_distance_bins()
                )));
            }
        }
        Ok(RunConfig {
            seed,
            paths,
            calendar,
            dims,
            geometry,
            output_dir,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn paths(&self) -> &InputPaths {
        &self.paths
    }

    pub fn calendar(&self) -> &SurveyCalendar {
        &self.calendar
    }

    pub fn dims(&self) -> &GridDims {
        &self.dims
    }

    pub fn geometry(&self) -> &SurveyGeometry {
        &self.geometry
    }

    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }
}
