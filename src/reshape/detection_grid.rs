//! Dense detection arrays and their derived index structures.
//!
//! All arrays here are zero-initialized to the full declared shape before any
//! record is added, so a (site, occasion) cell with no input rows holds an
//! explicit zero rather than a missing value: absence of detection is a valid
//! outcome under the model and all-zero sites stay in every grid.
//! Accumulation is a commutative sum, so record order never affects the
//! result.

use nalgebra::DMatrix;

use crate::constants::{OccasionNumber, UNSET_INDEX};
use crate::covey_errors::CoveyError;
use crate::reshape::grid_index::GridDims;
use crate::surveys::DetectionRecord;

/// Site × occasion detection counts, distance bins collapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionGrid {
    counts: DMatrix<u32>,
}

impl DetectionGrid {
    /// Accumulate resolved records into a dense site × occasion grid.
    ///
    /// Arguments
    /// -----------------
    /// * `records`: normalized detections (distance bins, if any, are ignored
    ///   here — this grid sums over them).
    /// * `dims`: declared grid shape.
    ///
    /// Return
    /// ----------
    /// * The filled grid, or a fatal bounds error if any record resolves
    ///   outside the declared shape.
    pub fn accumulate(records: &[DetectionRecord], dims: &GridDims) -> Result<Self, CoveyError> {
        let mut counts = DMatrix::zeros(dims.n_sites(), dims.n_occasions());
        for record in records {
            let row = dims.site_index(record.site)?;
            let col = dims.occasion_index(record.occasion)?;
            counts[(row, col)] += record.count;
        }
        Ok(DetectionGrid { counts })
    }

    pub fn counts(&self) -> &DMatrix<u32> {
        &self.counts
    }

    pub fn n_sites(&self) -> usize {
        self.counts.nrows()
    }

    pub fn n_occasions(&self) -> usize {
        self.counts.ncols()
    }

    /// Sum over all cells; equals the number of accepted records when every
    /// record carries a count of 1.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| *c as u64).sum()
    }
}

/// Site × distance-bin × occasion detection counts, stored as one
/// site × occasion matrix per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCube {
    bins: Vec<DMatrix<u32>>,
}

impl DetectionCube {
    /// Accumulate distance-sampling records into the 3-axis array.
    ///
    /// Every record must carry a distance bin; a record without one is a
    /// fatal input inconsistency on this pathway.
    pub fn accumulate(records: &[DetectionRecord], dims: &GridDims) -> Result<Self, CoveyError> {
        let mut bins =
            vec![DMatrix::zeros(dims.n_sites(), dims.n_occasions()); dims.n_distance_bins()];
        for record in records {
            let row = dims.site_index(record.site)?;
            let col = dims.occasion_index(record.occasion)?;
            let bin = record
                .distance_bin
                .ok_or(CoveyError::MissingDistanceBin {
                    site: record.site,
                    occasion: record.occasion,
                })
                .and_then(|b| dims.bin_index(b))?;
            bins[bin][(row, col)] += record.count;
        }
        Ok(DetectionCube { bins })
    }

    pub fn bins(&self) -> &[DMatrix<u32>] {
        &self.bins
    }

    pub fn n_distance_bins(&self) -> usize {
        self.bins.len()
    }

    /// Collapse over distance bins into a site × occasion grid.
    pub fn collapse(&self) -> DetectionGrid {
        let mut counts = DMatrix::zeros(self.bins[0].nrows(), self.bins[0].ncols());
        for bin in &self.bins {
            counts += bin;
        }
        DetectionGrid { counts }
    }

    /// Store the cube as a 2D matrix with `J * D` flattened columns, the
    /// layout the field sheets use (`column = (occasion-1)*D + bin`).
    pub fn flattened(&self, dims: &GridDims) -> Result<DMatrix<u32>, CoveyError> {
        let mut flat = DMatrix::zeros(
            dims.n_sites(),
            dims.n_occasions() * dims.n_distance_bins(),
        );
        for (bin_idx, bin) in self.bins.iter().enumerate() {
            for occasion in 0..bin.ncols() {
                let col = dims.flatten_column(occasion, bin_idx)?;
                for site in 0..bin.nrows() {
                    flat[(site, col)] = bin[(site, occasion)];
                }
            }
        }
        Ok(flat)
    }

    pub fn total(&self) -> u64 {
        self.bins
            .iter()
            .flat_map(|b| b.iter())
            .map(|c| *c as u64)
            .sum()
    }
}

/// Elementwise detection indicator: 1 where the grid holds at least one
/// detection, 0 elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryPresenceGrid {
    cells: DMatrix<u8>,
}

impl BinaryPresenceGrid {
    pub fn from_counts(grid: &DetectionGrid) -> Self {
        BinaryPresenceGrid {
            cells: grid.counts.map(|c| u8::from(c >= 1)),
        }
    }

    pub fn cells(&self) -> &DMatrix<u8> {
        &self.cells
    }
}

/// Per-site occasions with at least one detection, in fixed-width storage.
///
/// The downstream model only iterates detection-positive cells, so the
/// occasion indices are exported as a padded matrix sized to the largest
/// per-site count, with [`UNSET_INDEX`] filling the tail of shorter rows.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupiedOccasions {
    per_site: Vec<Vec<OccasionNumber>>,
    padded: DMatrix<u32>,
    counts: Vec<u32>,
    n_sites_with_detection: usize,
    max_positive_occasions: usize,
}

impl OccupiedOccasions {
    /// Derive the occupied-occasion index from a detection grid.
    ///
    /// Entries are 1-based occasion numbers, strictly ascending within each
    /// site. A site with no detections keeps an empty list and an all-sentinel
    /// padded row.
    pub fn from_grid(grid: &DetectionGrid) -> Self {
        let per_site: Vec<Vec<OccasionNumber>> = (0..grid.n_sites())
            .map(|site| {
                (0..grid.n_occasions())
                    .filter(|&occ| grid.counts[(site, occ)] >= 1)
                    .map(|occ| (occ + 1) as OccasionNumber)
                    .collect()
            })
            .collect();

        let counts: Vec<u32> = per_site.iter().map(|v| v.len() as u32).collect();
        let n_sites_with_detection = per_site.iter().filter(|v| !v.is_empty()).count();
        let max_positive_occasions = per_site.iter().map(Vec::len).max().unwrap_or(0);

        // fixed-width export: pad short rows with the unset sentinel
        let width = max_positive_occasions.max(1);
        let mut padded = DMatrix::from_element(grid.n_sites(), width, UNSET_INDEX);
        for (site, occasions) in per_site.iter().enumerate() {
            for (k, occ) in occasions.iter().enumerate() {
                padded[(site, k)] = *occ;
            }
        }

        OccupiedOccasions {
            per_site,
            padded,
            counts,
            n_sites_with_detection,
            max_positive_occasions,
        }
    }

    /// Ascending 1-based occasion numbers for one 0-based site index.
    pub fn occasions_for(&self, site: usize) -> &[OccasionNumber] {
        &self.per_site[site]
    }

    /// Sentinel-padded site × max-positive-occasions matrix.
    pub fn padded(&self) -> &DMatrix<u32> {
        &self.padded
    }

    /// Per-site positive-occasion counts.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn n_sites(&self) -> usize {
        self.per_site.len()
    }

    /// Sites with at least one detection-positive occasion.
    pub fn n_sites_with_detection(&self) -> usize {
        self.n_sites_with_detection
    }

    /// Largest per-site positive-occasion count; sizes the model's inner
    /// loop bound.
    pub fn max_positive_occasions(&self) -> usize {
        self.max_positive_occasions
    }
}

#[cfg(test)]
mod test_detection_grid {
    use super::*;

    fn dims_2x2() -> GridDims {
        GridDims::new(2, 2).unwrap()
    }

    #[test]
    fn test_accumulation_and_presence() {
        let records = vec![
            DetectionRecord::acoustic(1, 1),
            DetectionRecord::acoustic(1, 1),
            DetectionRecord::acoustic(2, 2),
        ];
        let grid = DetectionGrid::accumulate(&records, &dims_2x2()).unwrap();

        assert_eq!(grid.counts(), &DMatrix::from_row_slice(2, 2, &[2, 0, 0, 1]));
        assert_eq!(grid.total(), 3);

        let presence = BinaryPresenceGrid::from_counts(&grid);
        assert_eq!(
            presence.cells(),
            &DMatrix::from_row_slice(2, 2, &[1, 0, 0, 1])
        );
    }

    #[test]
    fn test_accumulation_is_order_independent() {
        let mut records = vec![
            DetectionRecord::acoustic(2, 2),
            DetectionRecord::acoustic(1, 1),
            DetectionRecord::acoustic(1, 2),
            DetectionRecord::acoustic(1, 1),
        ];
        let forward = DetectionGrid::accumulate(&records, &dims_2x2()).unwrap();
        records.reverse();
        let backward = DetectionGrid::accumulate(&records, &dims_2x2()).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_out_of_bounds_record_is_fatal() {
        let records = vec![DetectionRecord::acoustic(3, 1)];
        assert!(matches!(
            DetectionGrid::accumulate(&records, &dims_2x2()),
            Err(CoveyError::SiteOutOfBounds { site: 3, .. })
        ));
    }

    #[test]
    fn test_occupied_occasions() {
        let records = vec![
            DetectionRecord::acoustic(1, 1),
            DetectionRecord::acoustic(1, 1),
            DetectionRecord::acoustic(2, 2),
        ];
        let grid = DetectionGrid::accumulate(&records, &dims_2x2()).unwrap();
        let occupied = OccupiedOccasions::from_grid(&grid);

        assert_eq!(occupied.occasions_for(0), &[1]);
        assert_eq!(occupied.occasions_for(1), &[2]);
        assert_eq!(occupied.counts(), &[1, 1]);
        assert_eq!(occupied.n_sites_with_detection(), 2);
        assert_eq!(occupied.max_positive_occasions(), 1);
    }

    #[test]
    fn test_all_zero_site_stays_in_grids() {
        let dims = GridDims::new(3, 2).unwrap();
        let records = vec![
            DetectionRecord::acoustic(1, 2),
            DetectionRecord::acoustic(3, 1),
            DetectionRecord::acoustic(3, 2),
        ];
        let grid = DetectionGrid::accumulate(&records, &dims).unwrap();
        let occupied = OccupiedOccasions::from_grid(&grid);

        assert_eq!(grid.counts().row(1).iter().sum::<u32>(), 0);
        assert!(occupied.occasions_for(1).is_empty());
        assert_eq!(occupied.counts(), &[1, 0, 2]);
        assert_eq!(occupied.n_sites_with_detection(), 2);
        assert_eq!(occupied.max_positive_occasions(), 2);

        // padded export: ascending entries then the sentinel
        assert_eq!(occupied.padded().nrows(), 3);
        assert_eq!(occupied.padded().ncols(), 2);
        assert_eq!(occupied.padded()[(0, 0)], 2);
        assert_eq!(occupied.padded()[(0, 1)], UNSET_INDEX);
        assert_eq!(occupied.padded()[(1, 0)], UNSET_INDEX);
        assert_eq!(occupied.padded()[(2, 0)], 1);
        assert_eq!(occupied.padded()[(2, 1)], 2);
    }

    #[test]
    fn test_occupied_entries_strictly_ascending() {
        let dims = GridDims::new(1, 5).unwrap();
        let records = vec![
            DetectionRecord::acoustic(1, 5),
            DetectionRecord::acoustic(1, 2),
            DetectionRecord::acoustic(1, 4),
        ];
        let grid = DetectionGrid::accumulate(&records, &dims).unwrap();
        let occupied = OccupiedOccasions::from_grid(&grid);
        assert_eq!(occupied.occasions_for(0), &[2, 4, 5]);
    }

    #[test]
    fn test_cube_accumulate_collapse_flatten() {
        let dims = GridDims::with_distance_bins(2, 2, 3).unwrap();
        let records = vec![
            DetectionRecord::point_count(1, 1, 1),
            DetectionRecord::point_count(1, 1, 3),
            DetectionRecord::point_count(1, 1, 3),
            DetectionRecord::point_count(2, 2, 2),
        ];
        let cube = DetectionCube::accumulate(&records, &dims).unwrap();
        assert_eq!(cube.total(), 4);
        assert_eq!(cube.bins()[0][(0, 0)], 1);
        assert_eq!(cube.bins()[2][(0, 0)], 2);
        assert_eq!(cube.bins()[1][(1, 1)], 1);

        let collapsed = cube.collapse();
        assert_eq!(
            collapsed.counts(),
            &DMatrix::from_row_slice(2, 2, &[3, 0, 0, 1])
        );

        let flat = cube.flattened(&dims).unwrap();
        assert_eq!(flat.ncols(), 6);
        assert_eq!(flat[(0, 0)], 1); // occasion 1, bin 1
        assert_eq!(flat[(0, 2)], 2); // occasion 1, bin 3
        assert_eq!(flat[(1, 4)], 1); // occasion 2, bin 2
        assert_eq!(flat.iter().map(|c| *c as u64).sum::<u64>(), cube.total());
    }

    #[test]
    fn test_cube_requires_distance_bin() {
        let dims = GridDims::with_distance_bins(2, 2, 3).unwrap();
        let records = vec![DetectionRecord::acoustic(1, 1)];
        assert!(matches!(
            DetectionCube::accumulate(&records, &dims),
            Err(CoveyError::MissingDistanceBin { site: 1, occasion: 1 })
        ));
    }
}
