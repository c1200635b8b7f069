//! # Survey records and input readers
//!
//! This module defines the typed records produced by the record normalizer,
//! plus the CSV readers for the two survey pathways:
//!
//! 1. **Acoustic (ARU)**: per-detection rows from an autonomous recording
//!    unit, classified upstream by a bird-sound classifier, with an optional
//!    manual-validation count table ([`aru_reader`]).
//! 2. **Point counts**: per-individual distance-sampling rows with an
//!    explicit survey index and distance-bin category, plus a per-survey
//!    weather/observer conditions table ([`point_count_reader`]).
//!
//! Both pathways normalize into [`DetectionRecord`]: a site, a 1-based
//! occasion on the fixed [`SurveyCalendar`](calendar::SurveyCalendar), an
//! optional distance bin, and a count (one per accepted row). Rows that fail
//! the completeness filter or fall outside the survey calendar are excluded
//! entirely; rows whose indices violate the declared grid bounds abort the
//! run, since they indicate inconsistent input files rather than noise.

pub mod aru_reader;
pub mod calendar;
pub mod point_count_reader;

use crate::constants::{DistanceBin, OccasionNumber, SiteId};

/// One normalized detection: a count attributed to a grid cell.
///
/// # Fields
///
/// * `site` - 1-based site number as declared in the input tables
/// * `occasion` - 1-based occasion on the survey calendar
/// * `distance_bin` - 1-based distance-bin category (point counts only)
/// * `count` - detections contributed by this record (1 per raw row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRecord {
    pub site: SiteId,
    pub occasion: OccasionNumber,
    pub distance_bin: Option<DistanceBin>,
    pub count: u32,
}

impl DetectionRecord {
    /// A single acoustic detection (no distance structure, count of 1).
    pub fn acoustic(site: SiteId, occasion: OccasionNumber) -> Self {
        DetectionRecord {
            site,
            occasion,
            distance_bin: None,
            count: 1,
        }
    }

    /// A single point-count detection in a distance bin (count of 1).
    pub fn point_count(site: SiteId, occasion: OccasionNumber, distance_bin: DistanceBin) -> Self {
        DetectionRecord {
            site,
            occasion,
            distance_bin: Some(distance_bin),
            count: 1,
        }
    }
}

/// Survey-level conditions for one (site, occasion) visit.
///
/// Individually missing fields stay `None` and are carried as explicit
/// missing cells through covariate scaling; they are never coerced to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyConditions {
    pub site: SiteId,
    pub occasion: OccasionNumber,
    pub observer: Option<String>,
    pub temperature: Option<f64>,
    pub wind: Option<f64>,
    pub sky: Option<String>,
    pub day_of_year: Option<f64>,
}

/// Manually validated call counts for one (site, occasion) cell of the
/// acoustic pathway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCount {
    pub site: SiteId,
    pub occasion: OccasionNumber,
    /// Calls pulled for manual review.
    pub checked: u32,
    /// Reviewed calls confirmed as true positives.
    pub confirmed: u32,
}
