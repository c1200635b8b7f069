use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoveyError {
    #[error("Site {site} is outside the declared grid (1..={n_sites})")]
    SiteOutOfBounds { site: u32, n_sites: usize },

    #[error("Occasion {occasion} is outside the declared grid (1..={n_occasions})")]
    OccasionOutOfBounds { occasion: u32, n_occasions: usize },

    #[error("Distance bin {bin} is outside the declared grid (1..={n_bins})")]
    DistanceBinOutOfBounds { bin: u32, n_bins: usize },

    #[error("Flattened column index {column} is outside the declared grid")]
    FlatColumnOutOfBounds { column: usize },

    #[error("Detection at site {site}, occasion {occasion} carries no distance bin")]
    MissingDistanceBin { site: u32, occasion: u32 },

    #[error("Array dimensions disagree: {0}")]
    DimensionMismatch(String),

    #[error("Table {table} is missing required column: {column}")]
    MissingColumn { table: String, column: String },

    #[error("Invalid grid declaration: {0}")]
    InvalidGrid(String),

    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    #[error("Survey calendar is empty or not strictly ascending")]
    InvalidCalendar,

    #[error("Covariate {0} has zero variance; cannot standardize")]
    ZeroVariance(String),

    #[error("Covariate {0} has no non-missing values")]
    AllMissing(String),

    #[error("Site {site} appears {count} times in the site-covariate table")]
    DuplicateSiteRow { site: u32, count: usize },

    #[error("Duplicate survey-conditions row for site {site}, occasion {occasion}")]
    DuplicateSurveyRow { site: u32, occasion: u32 },

    #[error("Table {table}, column {column}: cannot parse cell value {value:?}")]
    InvalidCell {
        table: String,
        column: String,
        value: String,
    },

    #[error("Validation counts at site {site}, occasion {occasion}: {confirmed} confirmed exceeds {checked} checked")]
    ConfirmedExceedsChecked {
        site: u32,
        occasion: u32,
        checked: u32,
        confirmed: u32,
    },

    #[error("Invalid MCMC configuration: {0}")]
    InvalidMcmcConfig(String),

    #[error("Unknown model name: {0}")]
    UnknownModel(String),

    #[error("Sampler invocation failed: {0}")]
    EngineFailure(String),

    #[error("Sampler returned malformed draws: {0}")]
    MalformedDraws(String),

    #[error("Summary artifact already exists (write-once per run): {0}")]
    SummaryAlreadyWritten(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}
