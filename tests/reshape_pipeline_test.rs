mod common;

use nalgebra::DMatrix;

use common::{two_by_two, two_occasion_calendar, TempCsv};
use covey::reshape::covariates::{CovariateSchema, CovariateSpec, SiteCovariates};
use covey::reshape::detection_grid::{BinaryPresenceGrid, DetectionGrid, OccupiedOccasions};
use covey::surveys::aru_reader::read_aru_detections;

#[test]
fn aru_rows_to_detection_grid() {
    // site 1 detected twice on the first date, site 2 once on the second
    let csv = TempCsv::write(
        "aru_basic.csv",
        "site,date,score\n\
         1,2023-05-01,0.91\n\
         1,2023-05-01,0.88\n\
         2,2023-05-05,0.95\n",
    );
    let calendar = two_occasion_calendar();
    let dims = two_by_two();

    let records = read_aru_detections(&csv.path, &calendar, &dims, None).unwrap();
    assert_eq!(records.len(), 3);

    let grid = DetectionGrid::accumulate(&records, &dims).unwrap();
    assert_eq!(grid.counts(), &DMatrix::from_row_slice(2, 2, &[2, 0, 0, 1]));
    // conservation: cell sum equals accepted-record count
    assert_eq!(grid.total(), records.len() as u64);

    let presence = BinaryPresenceGrid::from_counts(&grid);
    assert_eq!(
        presence.cells(),
        &DMatrix::from_row_slice(2, 2, &[1, 0, 0, 1])
    );

    let occupied = OccupiedOccasions::from_grid(&grid);
    assert_eq!(occupied.occasions_for(0), &[1]);
    assert_eq!(occupied.occasions_for(1), &[2]);
}

#[test]
fn off_calendar_and_incomplete_rows_are_excluded() {
    let csv = TempCsv::write(
        "aru_filtered.csv",
        "site,date,score\n\
         1,2023-05-01,0.91\n\
         1,2023-05-02,0.99\n\
         ,2023-05-01,0.80\n\
         2,NA,0.85\n\
         2,2023-05-05,0.95\n",
    );
    let records =
        read_aru_detections(&csv.path, &two_occasion_calendar(), &two_by_two(), None).unwrap();

    // only the two rows on the calendar with complete fields survive
    assert_eq!(records.len(), 2);
    let grid = DetectionGrid::accumulate(&records, &two_by_two()).unwrap();
    assert_eq!(grid.total(), 2);
}

#[test]
fn classifier_score_cutoff() {
    let csv = TempCsv::write(
        "aru_scores.csv",
        "site,date,score\n\
         1,2023-05-01,0.91\n\
         1,2023-05-01,0.42\n\
         1,2023-05-01,NA\n",
    );
    let records = read_aru_detections(
        &csv.path,
        &two_occasion_calendar(),
        &two_by_two(),
        Some(0.8),
    )
    .unwrap();
    // below-cutoff and unscored detections are excluded
    assert_eq!(records.len(), 1);
}

#[test]
fn out_of_grid_site_aborts_the_run() {
    let csv = TempCsv::write(
        "aru_bad_site.csv",
        "site,date,score\n\
         9,2023-05-01,0.91\n",
    );
    let result = read_aru_detections(&csv.path, &two_occasion_calendar(), &two_by_two(), None);
    assert!(matches!(
        result,
        Err(covey::covey_errors::CoveyError::SiteOutOfBounds { site: 9, .. })
    ));
}

#[test]
fn site_covariates_are_zscored_with_population_sd() {
    let csv = TempCsv::write(
        "sites_zscore.csv",
        "site,grass_cover,land_use\n\
         1,10,pasture\n\
         2,20,crop\n\
         3,30,pasture\n",
    );
    let dims = covey::reshape::grid_index::GridDims::new(3, 2).unwrap();
    let schema = CovariateSchema::new(vec![
        CovariateSpec::continuous("grass_cover"),
        CovariateSpec::categorical("land_use"),
    ]);
    let covariates = SiteCovariates::read(&csv.path, &schema, &dims).unwrap();

    let grass = covariates.column("grass_cover").unwrap();
    approx::assert_relative_eq!(grass[0].unwrap(), -1.2247448713915890, epsilon = 1e-9);
    approx::assert_relative_eq!(grass[1].unwrap(), 0.0, epsilon = 1e-9);
    approx::assert_relative_eq!(grass[2].unwrap(), 1.2247448713915890, epsilon = 1e-9);

    // categorical column: first-seen 1-based codes, unscaled
    let land_use = covariates.column("land_use").unwrap();
    assert_eq!(land_use, vec![Some(1.0), Some(2.0), Some(1.0)]);
    assert_eq!(
        covariates.coder("land_use").unwrap().levels(),
        &["pasture", "crop"]
    );
    assert!(covariates.scaling("land_use").is_none());
}

#[test]
fn missing_schema_column_fails_fast() {
    let csv = TempCsv::write(
        "sites_missing_col.csv",
        "site,grass_cover\n\
         1,10\n\
         2,20\n",
    );
    let dims = covey::reshape::grid_index::GridDims::new(2, 2).unwrap();
    let schema = CovariateSchema::new(vec![
        CovariateSpec::continuous("grass_cover"),
        CovariateSpec::continuous("tree_cover"),
    ]);
    assert!(matches!(
        SiteCovariates::read(&csv.path, &schema, &dims),
        Err(covey::covey_errors::CoveyError::MissingColumn { column, .. }) if column == "tree_cover"
    ));
}
