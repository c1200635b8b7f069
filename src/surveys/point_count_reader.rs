//! Readers for the point-count distance-sampling pathway.
//!
//! Point counts resolve occasions from an explicit survey index rather than
//! from the calendar, and each detection carries a distance-bin category.
//! A companion per-survey table records the visit's conditions (observer,
//! temperature, wind, sky code, survey date).

use camino::Utf8Path;
use serde::Deserialize;

use crate::covey_errors::CoveyError;
use crate::reshape::grid_index::GridDims;
use crate::surveys::aru_reader::{na_f64, na_string, na_u32};
use crate::surveys::calendar::day_of_year_of_iso;
use crate::surveys::{DetectionRecord, SurveyConditions};

/// Raw point-count row: one detected individual.
#[derive(Debug, Deserialize)]
pub struct PointCountRow {
    #[serde(deserialize_with = "na_u32", default)]
    pub site: Option<u32>,
    #[serde(deserialize_with = "na_u32", default)]
    pub survey: Option<u32>,
    #[serde(deserialize_with = "na_u32", default)]
    pub distance_bin: Option<u32>,
}

/// Raw per-survey conditions row.
#[derive(Debug, Deserialize)]
pub struct SurveyConditionsRow {
    #[serde(deserialize_with = "na_u32", default)]
    pub site: Option<u32>,
    #[serde(deserialize_with = "na_u32", default)]
    pub survey: Option<u32>,
    #[serde(deserialize_with = "na_string", default)]
    pub observer: Option<String>,
    #[serde(deserialize_with = "na_f64", default)]
    pub temperature: Option<f64>,
    #[serde(deserialize_with = "na_f64", default)]
    pub wind: Option<f64>,
    #[serde(deserialize_with = "na_string", default)]
    pub sky: Option<String>,
    #[serde(deserialize_with = "na_string", default)]
    pub date: Option<String>,
}

/// Read and normalize the point-count detection table.
///
/// Arguments
/// -----------------
/// * `path`: CSV file with columns `site`, `survey`, `distance_bin`.
/// * `dims`: declared grid bounds, including the distance-bin count.
///
/// Return
/// ----------
/// * One [`DetectionRecord`] per accepted row (count of 1 each). Rows with a
///   missing site, survey, or distance bin are excluded; out-of-bounds
///   indices are fatal.
pub fn read_point_counts(
    path: &Utf8Path,
    dims: &GridDims,
) -> Result<Vec<DetectionRecord>, CoveyError> {
    let mut reader = csv::Reader::from_path(path.as_std_path())?;
    let mut records = Vec::new();

    for row in reader.deserialize::<PointCountRow>() {
        let row = row?;
        let (Some(site), Some(survey), Some(bin)) = (row.site, row.survey, row.distance_bin)
        else {
            continue;
        };
        dims.site_index(site)?;
        dims.occasion_index(survey)?;
        dims.bin_index(bin)?;
        records.push(DetectionRecord::point_count(site, survey, bin));
    }
    Ok(records)
}

/// Read the per-survey conditions table.
///
/// A row needs a site and a survey index to be attributable to a grid cell;
/// any of its condition fields may individually be missing and stay missing.
/// The survey date, when present, is converted to a day-of-year covariate.
pub fn read_survey_conditions(
    path: &Utf8Path,
    dims: &GridDims,
) -> Result<Vec<SurveyConditions>, CoveyError> {
    let mut reader = csv::Reader::from_path(path.as_std_path())?;
    let mut conditions = Vec::new();

    for row in reader.deserialize::<SurveyConditionsRow>() {
        let row = row?;
        let (Some(site), Some(survey)) = (row.site, row.survey) else {
            continue;
        };
        dims.site_index(site)?;
        dims.occasion_index(survey)?;

        let day_of_year = row.date.as_deref().map(day_of_year_of_iso).transpose()?;
        conditions.push(SurveyConditions {
            site,
            occasion: survey,
            observer: row.observer,
            temperature: row.temperature,
            wind: row.wind,
            sky: row.sky,
            day_of_year,
        });
    }
    Ok(conditions)
}
