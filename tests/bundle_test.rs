mod common;

use common::{two_by_two, two_occasion_calendar, TempCsv};
use covey::model_data::ModelDataBundle;
use covey::model_text::ModelKind;
use covey::reshape::covariates::{CovariateSchema, CovariateSpec, SiteCovariates};
use covey::reshape::detection_grid::{BinaryPresenceGrid, DetectionGrid, OccupiedOccasions};
use covey::reshape::validation_grid::ValidationGrid;
use covey::run_config::SurveyGeometry;
use covey::surveys::aru_reader::{read_aru_detections, read_validation_counts};

fn site_covariates(n_sites: usize) -> SiteCovariates {
    let mut rows = String::from("site,grass_cover\n");
    for site in 1..=n_sites {
        rows.push_str(&format!("{site},{}\n", 5.0 * site as f64));
    }
    let csv = TempCsv::write(&format!("bundle_sites_{n_sites}.csv"), &rows);
    let dims = covey::reshape::grid_index::GridDims::new(n_sites, 2).unwrap();
    let schema = CovariateSchema::new(vec![CovariateSpec::continuous("grass_cover")]);
    SiteCovariates::read(&csv.path, &schema, &dims).unwrap()
}

#[test]
fn acoustic_bundle_assembles_and_renders() {
    let detections_csv = TempCsv::write(
        "bundle_aru.csv",
        "site,date,score\n\
         1,2023-05-01,0.9\n\
         1,2023-05-01,0.9\n\
         2,2023-05-05,0.9\n",
    );
    let validation_csv = TempCsv::write(
        "bundle_validation.csv",
        "site,date,calls_checked,calls_confirmed\n\
         1,2023-05-01,10,8\n",
    );
    let calendar = two_occasion_calendar();
    let dims = two_by_two();

    let records = read_aru_detections(&detections_csv.path, &calendar, &dims, None).unwrap();
    let counts = read_validation_counts(&validation_csv.path, &calendar, &dims).unwrap();

    let detections = DetectionGrid::accumulate(&records, &dims).unwrap();
    let presence = BinaryPresenceGrid::from_counts(&detections);
    let occupied = OccupiedOccasions::from_grid(&detections);
    let validation = ValidationGrid::build(&counts, &dims).unwrap();

    let bundle = ModelDataBundle::new(
        dims,
        SurveyGeometry::default(),
        detections,
        None,
        presence,
        occupied,
        site_covariates(2),
        None,
        Some(validation),
    )
    .unwrap();

    assert_eq!(bundle.detections().total(), 3);
    assert_eq!(bundle.validation().unwrap().site_index(), &[1]);

    // model text carries the run's dimension constants, nothing data-driven
    let text = ModelKind::AcousticFalsePositive.render(&bundle);
    assert!(text.contains("for (i in 1:2)"));
    assert!(text.contains("1:n_occupied[i]"));
    assert!(!text.contains("{{"));
}

#[test]
fn bundle_rejects_covariate_site_mismatch() {
    let detections_csv = TempCsv::write(
        "bundle_mismatch_aru.csv",
        "site,date,score\n\
         1,2023-05-01,0.9\n",
    );
    let calendar = two_occasion_calendar();
    let dims = two_by_two();

    let records = read_aru_detections(&detections_csv.path, &calendar, &dims, None).unwrap();
    let detections = DetectionGrid::accumulate(&records, &dims).unwrap();
    let presence = BinaryPresenceGrid::from_counts(&detections);
    let occupied = OccupiedOccasions::from_grid(&detections);

    // covariate table carries 3 sites against a 2-site grid
    let result = ModelDataBundle::new(
        dims,
        SurveyGeometry::default(),
        detections,
        None,
        presence,
        occupied,
        site_covariates(3),
        None,
        None,
    );
    assert!(matches!(
        result,
        Err(covey::covey_errors::CoveyError::DimensionMismatch(_))
    ));
}

#[test]
fn validated_but_zero_site_stays_in_subset() {
    let validation_csv = TempCsv::write(
        "bundle_zero_validation.csv",
        "site,date,calls_checked,calls_confirmed\n\
         1,2023-05-01,6,0\n",
    );
    let calendar = two_occasion_calendar();
    let dims = two_by_two();
    let counts = read_validation_counts(&validation_csv.path, &calendar, &dims).unwrap();
    let grid = ValidationGrid::build(&counts, &dims).unwrap();

    // reviewed with zero confirmations is still a validated site;
    // site 2 was never reviewed and is absent from the subset
    assert_eq!(grid.site_index(), &[1]);
    assert_eq!(grid.calls_checked()[(0, 0)], 6);
    assert_eq!(grid.calls_confirmed()[(0, 0)], 0);
}
