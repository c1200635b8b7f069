//! Manual-validation grids for the acoustic pathway.
//!
//! Only a strict subset of sites had their classifier detections manually
//! reviewed. That subset is carried as an ascending site-index list; a site
//! absent from the list was never validated, while a site on the list with
//! zero confirmed calls was validated and found all-false. The matrices are
//! indexed by position on the subset list, not by grid site.

use nalgebra::DMatrix;

use crate::constants::UNSET_INDEX;
use crate::covey_errors::CoveyError;
use crate::reshape::grid_index::GridDims;
use crate::surveys::ValidationCount;

/// Validated-subset call-review grids.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationGrid {
    site_index: Vec<u32>,
    calls_checked: DMatrix<u32>,
    calls_confirmed: DMatrix<u32>,
    occasions_checked: DMatrix<u32>,
    n_checked_occasions: Vec<u32>,
}

impl ValidationGrid {
    /// Build the validated-subset grids from the review counts.
    ///
    /// Arguments
    /// -----------------
    /// * `counts`: one entry per reviewed (site, occasion) cell.
    /// * `dims`: the full analysis grid; validated sites must lie inside it.
    ///
    /// Return
    /// ----------
    /// * The assembled grids, or a fatal error when indices fall outside the
    ///   grid, confirmed counts exceed checked counts, or the same cell is
    ///   reviewed twice.
    pub fn build(counts: &[ValidationCount], dims: &GridDims) -> Result<Self, CoveyError> {
        // ascending validated-site list, deduplicated
        let mut site_index: Vec<u32> = Vec::new();
        for count in counts {
            dims.site_index(count.site)?;
            dims.occasion_index(count.occasion)?;
            if let Err(pos) = site_index.binary_search(&count.site) {
                site_index.insert(pos, count.site);
            }
        }

        let n_validated = site_index.len();
        let mut calls_checked = DMatrix::zeros(n_validated, dims.n_occasions());
        let mut calls_confirmed = DMatrix::zeros(n_validated, dims.n_occasions());
        let mut reviewed: Vec<Vec<u32>> = vec![Vec::new(); n_validated];

        for count in counts {
            if count.confirmed > count.checked {
                return Err(CoveyError::ConfirmedExceedsChecked {
                    site: count.site,
                    occasion: count.occasion,
                    checked: count.checked,
                    confirmed: count.confirmed,
                });
            }
            let row = site_index
                .binary_search(&count.site)
                .expect("site registered above");
            let col = dims.occasion_index(count.occasion)?;
            if reviewed[row].contains(&count.occasion) {
                return Err(CoveyError::DuplicateSurveyRow {
                    site: count.site,
                    occasion: count.occasion,
                });
            }
            reviewed[row].push(count.occasion);
            calls_checked[(row, col)] = count.checked;
            calls_confirmed[(row, col)] = count.confirmed;
        }

        for occasions in &mut reviewed {
            occasions.sort_unstable();
        }
        let n_checked_occasions: Vec<u32> = reviewed.iter().map(|v| v.len() as u32).collect();
        let width = reviewed.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let mut occasions_checked = DMatrix::from_element(n_validated, width, UNSET_INDEX);
        for (row, occasions) in reviewed.iter().enumerate() {
            for (k, occ) in occasions.iter().enumerate() {
                occasions_checked[(row, k)] = *occ;
            }
        }

        Ok(ValidationGrid {
            site_index,
            calls_checked,
            calls_confirmed,
            occasions_checked,
            n_checked_occasions,
        })
    }

    /// Ascending 1-based site numbers of the validated subset.
    pub fn site_index(&self) -> &[u32] {
        &self.site_index
    }

    pub fn n_validated_sites(&self) -> usize {
        self.site_index.len()
    }

    /// Calls pulled for review, validated-site × occasion.
    pub fn calls_checked(&self) -> &DMatrix<u32> {
        &self.calls_checked
    }

    /// Calls confirmed true, validated-site × occasion.
    pub fn calls_confirmed(&self) -> &DMatrix<u32> {
        &self.calls_confirmed
    }

    /// Sentinel-padded 1-based occasion numbers reviewed per validated site.
    pub fn occasions_checked(&self) -> &DMatrix<u32> {
        &self.occasions_checked
    }

    pub fn n_checked_occasions(&self) -> &[u32] {
        &self.n_checked_occasions
    }
}

#[cfg(test)]
mod test_validation_grid {
    use super::*;

    fn count(site: u32, occasion: u32, checked: u32, confirmed: u32) -> ValidationCount {
        ValidationCount {
            site,
            occasion,
            checked,
            confirmed,
        }
    }

    #[test]
    fn test_subset_build() {
        let dims = GridDims::new(5, 3).unwrap();
        let counts = vec![
            count(4, 1, 10, 7),
            count(2, 3, 5, 0),
            count(4, 3, 8, 8),
        ];
        let grid = ValidationGrid::build(&counts, &dims).unwrap();

        // strict ascending subset of the 5 grid sites
        assert_eq!(grid.site_index(), &[2, 4]);
        assert_eq!(grid.n_validated_sites(), 2);
        assert_eq!(grid.calls_checked()[(0, 2)], 5);
        assert_eq!(grid.calls_confirmed()[(0, 2)], 0);
        assert_eq!(grid.calls_checked()[(1, 0)], 10);
        assert_eq!(grid.calls_confirmed()[(1, 0)], 7);
        assert_eq!(grid.calls_confirmed()[(1, 2)], 8);

        assert_eq!(grid.n_checked_occasions(), &[1, 2]);
        assert_eq!(grid.occasions_checked()[(0, 0)], 3);
        assert_eq!(grid.occasions_checked()[(0, 1)], UNSET_INDEX);
        assert_eq!(grid.occasions_checked()[(1, 0)], 1);
        assert_eq!(grid.occasions_checked()[(1, 1)], 3);
    }

    #[test]
    fn test_confirmed_cannot_exceed_checked() {
        let dims = GridDims::new(5, 3).unwrap();
        let counts = vec![count(1, 1, 3, 4)];
        assert!(matches!(
            ValidationGrid::build(&counts, &dims),
            Err(CoveyError::ConfirmedExceedsChecked { site: 1, occasion: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_review_is_fatal() {
        let dims = GridDims::new(5, 3).unwrap();
        let counts = vec![count(1, 1, 3, 1), count(1, 1, 2, 2)];
        assert!(matches!(
            ValidationGrid::build(&counts, &dims),
            Err(CoveyError::DuplicateSurveyRow { site: 1, occasion: 1 })
        ));
    }

    #[test]
    fn test_out_of_grid_site_is_fatal() {
        let dims = GridDims::new(5, 3).unwrap();
        let counts = vec![count(6, 1, 3, 1)];
        assert!(matches!(
            ValidationGrid::build(&counts, &dims),
            Err(CoveyError::SiteOutOfBounds { site: 6, .. })
        ));
    }
}
