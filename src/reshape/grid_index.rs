//! Grid dimensions and index resolution.
//!
//! The whole pipeline is indexed on one fixed grid declared up front:
//! `S` sites × `J` occasions, optionally × `D` distance bins. Raw records
//! carry 1-based identifiers; this module converts them into 0-based array
//! coordinates with bounds checks, and provides the flatten/unflatten pair
//! used when a site × bin × occasion array is stored as a 2D matrix with
//! `J * D` columns.

use crate::constants::{DistanceBin, OccasionNumber, SiteId};
use crate::covey_errors::CoveyError;

/// Declared shape of the analysis grid.
///
/// Constructed once per run and never resized; every array in the model data
/// bundle is validated against these dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    n_sites: usize,
    n_occasions: usize,
    n_distance_bins: usize,
}

impl GridDims {
    /// Declare a site × occasion grid without distance structure (acoustic
    /// pathway).
    pub fn new(n_sites: usize, n_occasions: usize) -> Result<Self, CoveyError> {
        GridDims::with_distance_bins(n_sites, n_occasions, 1)
    }

    /// Declare a site × occasion × distance-bin grid (point-count pathway).
    pub fn with_distance_bins(
        n_sites: usize,
        n_occasions: usize,
        n_distance_bins: usize,
    ) -> Result<Self, CoveyError> {
        if n_sites == 0 || n_occasions == 0 || n_distance_bins == 0 {
            return Err(CoveyError::InvalidGrid(format!(
                "all dimensions must be positive, got {n_sites} sites x {n_occasions} occasions x {n_distance_bins} bins"
            )));
        }
        Ok(GridDims {
            n_sites,
            n_occasions,
            n_distance_bins,
        })
    }

    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    pub fn n_occasions(&self) -> usize {
        self.n_occasions
    }

    pub fn n_distance_bins(&self) -> usize {
        self.n_distance_bins
    }

    /// Resolve a raw 1-based site number to a 0-based row index.
    ///
    /// An out-of-bounds site is a fatal configuration error: it means the
    /// detection table and the declared grid disagree.
    pub fn site_index(&self, site: SiteId) -> Result<usize, CoveyError> {
        checked_index(site, self.n_sites).ok_or(CoveyError::SiteOutOfBounds {
            site,
            n_sites: self.n_sites,
        })
    }

    /// Resolve a 1-based occasion number to a 0-based index.
    pub fn occasion_index(&self, occasion: OccasionNumber) -> Result<usize, CoveyError> {
        checked_index(occasion, self.n_occasions).ok_or(CoveyError::OccasionOutOfBounds {
            occasion,
            n_occasions: self.n_occasions,
        })
    }

    /// Resolve a 1-based distance-bin category to a 0-based index.
    pub fn bin_index(&self, bin: DistanceBin) -> Result<usize, CoveyError> {
        checked_index(bin, self.n_distance_bins).ok_or(CoveyError::DistanceBinOutOfBounds {
            bin,
            n_bins: self.n_distance_bins,
        })
    }

    /// Flatten a 0-based (occasion, distance-bin) pair into a single column
    /// index for 2D storage of the 3-axis detection array.
    pub fn flatten_column(&self, occasion: usize, bin: usize) -> Result<usize, CoveyError> {
        if occasion >= self.n_occasions {
            return Err(CoveyError::OccasionOutOfBounds {
                occasion: occasion as u32 + 1,
                n_occasions: self.n_occasions,
            });
        }
        if bin >= self.n_distance_bins {
            return Err(CoveyError::DistanceBinOutOfBounds {
                bin: bin as u32 + 1,
                n_bins: self.n_distance_bins,
            });
        }
        Ok(occasion * self.n_distance_bins + bin)
    }

    /// Invert [`flatten_column`](GridDims::flatten_column): recover the
    /// 0-based (occasion, distance-bin) pair from a flattened column index.
    pub fn unflatten_column(&self, column: usize) -> Result<(usize, usize), CoveyError> {
        if column >= self.n_occasions * self.n_distance_bins {
            return Err(CoveyError::FlatColumnOutOfBounds { column });
        }
        Ok((column / self.n_distance_bins, column % self.n_distance_bins))
    }
}

/// 1-based `u32` identifier to 0-based `usize` index, `None` if out of range.
fn checked_index(id: u32, bound: usize) -> Option<usize> {
    let idx = id.checked_sub(1)? as usize;
    (idx < bound).then_some(idx)
}
