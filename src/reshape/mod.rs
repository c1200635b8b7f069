//! # Array construction: from normalized records to model-shaped arrays
//!
//! This module turns irregular per-record observations into the fixed-shape
//! dense arrays the hierarchical model consumes:
//!
//! 1. [`grid_index`] — the declared grid shape and all index resolution,
//!    including the flatten/unflatten pair for 2D storage of the
//!    site × bin × occasion array.
//! 2. [`detection_grid`] — zero-initialized count grids, the binary presence
//!    grid, and the occupied-occasion index with its fixed-width padding.
//! 3. [`covariates`] — z-scoring, categorical level coding, and the site- and
//!    occasion-level covariate matrices with explicit missing cells.
//! 4. [`validation_grid`] — the manually-validated site subset of the
//!    acoustic pathway.
//!
//! Everything here is a total, synchronous pass over already-normalized
//! records; any index outside the declared grid is a fatal configuration
//! error rather than a dropped row.

pub mod covariates;
pub mod detection_grid;
pub mod grid_index;
pub mod validation_grid;
