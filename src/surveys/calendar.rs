//! Fixed survey calendar and date-to-occasion resolution.
//!
//! A [`SurveyCalendar`] is the ordered list of calendar dates on which survey
//! occasions occurred. Raw detection rows carry calendar dates; an occasion
//! index exists only for rows whose date **exactly matches** a calendar entry.
//! Rows outside the calendar are dropped by the normalizer, which is how a
//! subsampling window (e.g. 14 dates spaced 4 days apart out of a longer
//! recording season) is implemented.

use hifitime::{Epoch, Unit};

use crate::constants::OccasionNumber;
use crate::covey_errors::CoveyError;

/// Ordered, strictly ascending list of survey dates.
///
/// Occasion numbers are 1-based positions on this calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyCalendar {
    dates: Vec<Epoch>,
}

impl SurveyCalendar {
    /// Build a calendar from a list of dates.
    ///
    /// Arguments
    /// -----------------
    /// * `dates`: survey dates, one per occasion.
    ///
    /// Return
    /// ----------
    /// * A new [`SurveyCalendar`], or [`CoveyError::InvalidCalendar`] if the
    ///   list is empty or not strictly ascending.
    pub fn new(dates: Vec<Epoch>) -> Result<Self, CoveyError> {
        if dates.is_empty() || dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoveyError::InvalidCalendar);
        }
        Ok(SurveyCalendar { dates })
    }

    /// Build a calendar from ISO `YYYY-MM-DD` date strings.
    ///
    /// Each date is anchored at midnight UTC; input rows are resolved with the
    /// same anchoring, so matching is exact on the calendar day.
    pub fn from_iso_dates<S: AsRef<str>>(dates: &[S]) -> Result<Self, CoveyError> {
        let parsed = dates
            .iter()
            .map(|d| parse_iso_date(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        SurveyCalendar::new(parsed)
    }

    /// Subsample this calendar: `count` dates starting at 0-based position
    /// `start`, keeping every `stride`-th date.
    ///
    /// This is how a fixed survey window is carved out of a denser recording
    /// calendar (e.g. `subsample(0, 14, 4)` keeps 14 dates spaced 4 entries
    /// apart).
    ///
    /// Return
    /// ----------
    /// * The subsampled calendar, or [`CoveyError::InvalidCalendar`] if the
    ///   requested window runs past the end of this calendar.
    pub fn subsample(&self, start: usize, count: usize, stride: usize) -> Result<Self, CoveyError> {
        if stride == 0 || count == 0 {
            return Err(CoveyError::InvalidCalendar);
        }
        let last = start + (count - 1) * stride;
        if last >= self.dates.len() {
            return Err(CoveyError::InvalidCalendar);
        }
        let dates = (0..count).map(|k| self.dates[start + k * stride]).collect();
        SurveyCalendar::new(dates)
    }

    /// Resolve a date to its 1-based occasion number.
    ///
    /// Returns `None` when the date is not on the calendar; the caller decides
    /// whether that means "drop the row" (normalizer) or an error.
    pub fn occasion_of(&self, date: Epoch) -> Option<OccasionNumber> {
        self.dates
            .iter()
            .position(|d| *d == date)
            .map(|p| (p + 1) as OccasionNumber)
    }

    /// Resolve an ISO `YYYY-MM-DD` string to its 1-based occasion number.
    ///
    /// An unparseable date is a schema error ([`CoveyError::InvalidDate`]); a
    /// well-formed date absent from the calendar resolves to `Ok(None)`.
    pub fn occasion_of_iso(&self, date: &str) -> Result<Option<OccasionNumber>, CoveyError> {
        Ok(self.occasion_of(parse_iso_date(date)?))
    }

    /// Day-of-year of a 1-based occasion (1.0 = January 1st), used as a
    /// continuous phenology covariate.
    pub fn day_of_year(&self, occasion: OccasionNumber) -> Result<f64, CoveyError> {
        let idx = occasion
            .checked_sub(1)
            .map(|o| o as usize)
            .filter(|o| *o < self.dates.len())
            .ok_or(CoveyError::OccasionOutOfBounds {
                occasion,
                n_occasions: self.dates.len(),
            })?;
        Ok(day_of_year_of(self.dates[idx]))
    }

    /// Number of occasions on this calendar.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[Epoch] {
        &self.dates
    }
}

/// Day-of-year of a calendar date (1.0 = January 1st).
fn day_of_year_of(date: Epoch) -> f64 {
    let (year, ..) = date.to_gregorian_utc();
    let jan_first = Epoch::from_gregorian_utc(year, 1, 1, 0, 0, 0, 0);
    (date - jan_first).to_unit(Unit::Day).floor() + 1.0
}

/// Day-of-year of an ISO `YYYY-MM-DD` date string, for rows that carry their
/// own survey date rather than an occasion on a shared calendar.
pub fn day_of_year_of_iso(date: &str) -> Result<f64, CoveyError> {
    Ok(day_of_year_of(parse_iso_date(date)?))
}

/// Parse a `YYYY-MM-DD` string into an [`Epoch`] at midnight UTC.
///
/// Calendar validity (month range, days per month, leap years) is delegated
/// to hifitime; any rejected date surfaces as [`CoveyError::InvalidDate`].
fn parse_iso_date(date: &str) -> Result<Epoch, CoveyError> {
    let invalid = || CoveyError::InvalidDate(date.to_string());

    let mut parts = date.splitn(3, '-');
    let year: i32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let month: u8 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;
    let day: u8 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(invalid)?;

    Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0).map_err(|_| invalid())
}
