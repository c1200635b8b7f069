//! Readers for the acoustic (ARU) pathway.
//!
//! Two tables feed this pathway:
//!
//! - a per-detection table, one row per call flagged by the upstream
//!   bird-sound classifier (`site`, `date`, optional classifier `score`);
//! - a manual-validation table, one row per reviewed (site, date) cell
//!   (`site`, `date`, `calls_checked`, `calls_confirmed`).
//!
//! Filtering policy: rows with missing required fields are excluded entirely
//! (completeness filter), rows whose date is off the survey calendar are
//! excluded (subsampling window), and rows whose site resolves outside the
//! declared grid abort the run.

use camino::Utf8Path;
use serde::{Deserialize, Deserializer};

use crate::covey_errors::CoveyError;
use crate::reshape::grid_index::GridDims;
use crate::surveys::calendar::SurveyCalendar;
use crate::surveys::{DetectionRecord, ValidationCount};

/// Raw per-detection row as it appears in the classifier output table.
///
/// All fields are optional at parse time; the completeness filter decides
/// which rows survive.
#[derive(Debug, Deserialize)]
pub struct AruRow {
    #[serde(deserialize_with = "na_u32", default)]
    pub site: Option<u32>,
    #[serde(deserialize_with = "na_string", default)]
    pub date: Option<String>,
    #[serde(deserialize_with = "na_f64", default)]
    pub score: Option<f64>,
}

/// Raw manual-validation row.
#[derive(Debug, Deserialize)]
pub struct ValidationRow {
    #[serde(deserialize_with = "na_u32", default)]
    pub site: Option<u32>,
    #[serde(deserialize_with = "na_string", default)]
    pub date: Option<String>,
    #[serde(deserialize_with = "na_u32", default)]
    pub calls_checked: Option<u32>,
    #[serde(deserialize_with = "na_u32", default)]
    pub calls_confirmed: Option<u32>,
}

/// Read and normalize the ARU detection table.
///
/// Each accepted row contributes a count of 1; multiple detections at the
/// same (site, occasion) accumulate later in the array builder. When
/// `min_score` is set, rows below the threshold — or with no score at all —
/// are excluded before aggregation.
///
/// Arguments
/// -----------------
/// * `path`: CSV file with columns `site`, `date`, `score`.
/// * `calendar`: the fixed survey calendar; off-calendar rows are dropped.
/// * `dims`: declared grid bounds; out-of-bounds sites are fatal.
/// * `min_score`: optional classifier-score cutoff.
///
/// Return
/// ----------
/// * The accepted [`DetectionRecord`]s, in file order.
pub fn read_aru_detections(
    path: &Utf8Path,
    calendar: &SurveyCalendar,
    dims: &GridDims,
    min_score: Option<f64>,
) -> Result<Vec<DetectionRecord>, CoveyError> {
    let mut reader = csv::Reader::from_path(path.as_std_path())?;
    let mut records = Vec::new();

    for row in reader.deserialize::<AruRow>() {
        let row = row?;

        // completeness filter: drop the whole row, never impute
        let (Some(site), Some(date)) = (row.site, row.date.as_deref()) else {
            continue;
        };
        if let Some(cutoff) = min_score {
            match row.score {
                Some(score) if score >= cutoff => {}
                _ => continue,
            }
        }

        let Some(occasion) = calendar.occasion_of_iso(date)? else {
            continue;
        };
        dims.site_index(site)?;
        dims.occasion_index(occasion)?;
        records.push(DetectionRecord::acoustic(site, occasion));
    }
    Ok(records)
}

/// Read the manual-validation count table.
///
/// Only sites appearing in this table form the validated subset; a site that
/// was validated and found all-false still appears here with zero confirmed
/// calls, which is how it is distinguished from a never-validated site.
pub fn read_validation_counts(
    path: &Utf8Path,
    calendar: &SurveyCalendar,
    dims: &GridDims,
) -> Result<Vec<ValidationCount>, CoveyError> {
    let mut reader = csv::Reader::from_path(path.as_std_path())?;
    let mut counts = Vec::new();

    for row in reader.deserialize::<ValidationRow>() {
        let row = row?;
        let (Some(site), Some(date), Some(checked), Some(confirmed)) = (
            row.site,
            row.date.as_deref(),
            row.calls_checked,
            row.calls_confirmed,
        ) else {
            continue;
        };

        let Some(occasion) = calendar.occasion_of_iso(date)? else {
            continue;
        };
        dims.site_index(site)?;
        dims.occasion_index(occasion)?;
        if confirmed > checked {
            return Err(CoveyError::ConfirmedExceedsChecked {
                site,
                occasion,
                checked,
                confirmed,
            });
        }
        counts.push(ValidationCount {
            site,
            occasion,
            checked,
            confirmed,
        });
    }
    Ok(counts)
}

/// Deserialize a CSV cell treating empty strings and `NA` as missing.
pub(crate) fn na_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("na")))
}

pub(crate) fn na_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    parse_na_cell(deserializer)
}

pub(crate) fn na_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    parse_na_cell(deserializer)
}

fn parse_na_cell<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match na_string(deserializer)? {
        None => Ok(None),
        Some(cell) => cell.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
