//! # Constants and type definitions for Covey
//!
//! This module centralizes the **index conventions**, **survey-geometry
//! constants**, and **common type definitions** used throughout the `covey`
//! library.
//!
//! ## Overview
//!
//! - 1-based index aliases matching the sampler's model text (sites, survey
//!   occasions, and distance bins are all indexed from 1 in the exported
//!   arrays; `0` is reserved as the padding sentinel)
//! - Survey-geometry defaults for the point-count protocol
//! - The convergence threshold applied to the scale-reduction statistic
//!
//! These definitions are used by all main modules, including the record
//! normalizer, the array builders, and the sampler interface.

// -------------------------------------------------------------------------------------------------
// Index conventions
// -------------------------------------------------------------------------------------------------

/// Raw 1-based site number, as it appears in the input tables.
pub type SiteId = u32;

/// 1-based survey-occasion number on the fixed survey calendar.
pub type OccasionNumber = u32;

/// 1-based distance-bin category (innermost annulus = 1).
pub type DistanceBin = u32;

/// Padding sentinel for fixed-width index matrices.
///
/// Exported occasion and site indices are 1-based, so `0` can never collide
/// with a valid entry.
pub const UNSET_INDEX: u32 = 0;

// -------------------------------------------------------------------------------------------------
// Survey geometry
// -------------------------------------------------------------------------------------------------

/// Width of one distance bin in meters (point-count protocol).
pub const DEFAULT_BIN_WIDTH_M: f64 = 50.0;

/// Truncation radius of a point-count survey in meters.
pub const DEFAULT_SURVEY_RADIUS_M: f64 = 250.0;

/// Square meters per hectare, for area-to-density conversion.
pub const M2_PER_HECTARE: f64 = 10_000.0;

// -------------------------------------------------------------------------------------------------
// Diagnostics
// -------------------------------------------------------------------------------------------------

/// Convergence threshold on the scale-reduction statistic (Rhat).
///
/// Any monitored parameter whose Rhat exceeds this value is reported in the
/// run's [`ConvergenceReport`](crate::mcmc::ConvergenceReport).
pub const RHAT_THRESHOLD: f64 = 1.1;

/// Posterior credible-interval probabilities reported by the summarizer.
pub const CREDIBLE_LOWER: f64 = 0.025;
pub const CREDIBLE_UPPER: f64 = 0.975;
