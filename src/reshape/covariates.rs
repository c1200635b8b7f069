//! Covariate schema, standardization, and categorical coding.
//!
//! Continuous covariates are z-scored with the **population** standard
//! deviation computed over the current run's non-missing values — never an
//! external reference distribution. Categorical covariates are mapped to
//! 1-based integer codes in stable first-seen order (readers preserve file
//! order, so coding is deterministic for a given input). Missing cells stay
//! `None` through scaling and into the bundle: a cell with no value encodes
//! "no survey occurred", which must never collapse onto "exactly average".

use ahash::AHashMap;
use camino::Utf8Path;
use nalgebra::DMatrix;

use crate::covey_errors::CoveyError;
use crate::reshape::grid_index::GridDims;
use crate::surveys::SurveyConditions;

/// Scaling policy of one covariate column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovariateKind {
    /// Z-scored over non-missing entries.
    Continuous,
    /// Integer-coded in first-seen order, passed through unscaled.
    Categorical,
}

/// One declared covariate column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CovariateSpec {
    pub name: String,
    pub kind: CovariateKind,
}

impl CovariateSpec {
    pub fn continuous(name: &str) -> Self {
        CovariateSpec {
            name: name.to_string(),
            kind: CovariateKind::Continuous,
        }
    }

    pub fn categorical(name: &str) -> Self {
        CovariateSpec {
            name: name.to_string(),
            kind: CovariateKind::Categorical,
        }
    }
}

/// Declared covariate columns of one input table, validated against the
/// table's header at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CovariateSchema {
    specs: Vec<CovariateSpec>,
}

impl CovariateSchema {
    pub fn new(specs: Vec<CovariateSpec>) -> Self {
        CovariateSchema { specs }
    }

    pub fn specs(&self) -> &[CovariateSpec] {
        &self.specs
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    /// Locate each declared column in a CSV header, failing fast on any
    /// missing column.
    pub fn resolve_columns(
        &self,
        headers: &csv::StringRecord,
        table: &str,
    ) -> Result<Vec<usize>, CoveyError> {
        self.specs
            .iter()
            .map(|spec| {
                headers
                    .iter()
                    .position(|h| h.trim() == spec.name)
                    .ok_or_else(|| CoveyError::MissingColumn {
                        table: table.to_string(),
                        column: spec.name.clone(),
                    })
            })
            .collect()
    }
}

/// Stable first-seen coder for categorical labels.
///
/// Codes are 1-based so they can index sampler-side effect vectors directly.
#[derive(Debug, Clone, Default)]
pub struct LevelCoder {
    levels: Vec<String>,
    index: AHashMap<String, u32>,
}

impl LevelCoder {
    pub fn new() -> Self {
        LevelCoder::default()
    }

    /// Code a label, registering it on first sight.
    pub fn code(&mut self, label: &str) -> u32 {
        if let Some(code) = self.index.get(label) {
            return *code;
        }
        self.levels.push(label.to_string());
        let code = self.levels.len() as u32;
        self.index.insert(label.to_string(), code);
        code
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.index.get(label).copied()
    }

    /// Labels in code order (code = position + 1).
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Mean and population standard deviation used to standardize one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub mean: f64,
    pub sd: f64,
}

/// Z-score cells in place over their non-missing entries.
///
/// Arguments
/// -----------------
/// * `cells`: the column or grid storage; `None` entries are untouched.
/// * `name`: covariate name, for diagnostics.
///
/// Return
/// ----------
/// * The [`Scaling`] applied, or an error if the column has no values or
///   zero variance (population standard deviation, divisor `n`).
pub fn standardize(cells: &mut [Option<f64>], name: &str) -> Result<Scaling, CoveyError> {
    let present: Vec<f64> = cells.iter().flatten().copied().collect();
    if present.is_empty() {
        return Err(CoveyError::AllMissing(name.to_string()));
    }

    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let sd = (present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    if sd == 0.0 {
        return Err(CoveyError::ZeroVariance(name.to_string()));
    }

    for cell in cells.iter_mut().flatten() {
        *cell = (*cell - mean) / sd;
    }
    Ok(Scaling { mean, sd })
}

/// Site-level covariate matrix aligned to the grid's site axis.
///
/// Continuous columns are z-scored; categorical columns hold 1-based level
/// codes. Cells stay `None` for sites with no value in the input table.
#[derive(Debug, Clone)]
pub struct SiteCovariates {
    names: Vec<String>,
    values: DMatrix<Option<f64>>,
    scalings: Vec<Option<Scaling>>,
    coders: AHashMap<String, LevelCoder>,
}

impl SiteCovariates {
    /// Load the per-site habitat table and build the scaled covariate matrix.
    ///
    /// The table needs a `site` column plus every column the schema declares.
    /// Each site may appear at most once; rows without a site number are
    /// skipped entirely (completeness filter), and out-of-grid sites are
    /// fatal.
    pub fn read(
        path: &Utf8Path,
        schema: &CovariateSchema,
        dims: &GridDims,
    ) -> Result<Self, CoveyError> {
        let table = "site covariates";
        let mut reader = csv::Reader::from_path(path.as_std_path())?;
        let headers = reader.headers()?.clone();

        let site_col = headers
            .iter()
            .position(|h| h.trim() == "site")
            .ok_or_else(|| CoveyError::MissingColumn {
                table: table.to_string(),
                column: "site".to_string(),
            })?;
        let columns = schema.resolve_columns(&headers, table)?;

        let mut values: DMatrix<Option<f64>> =
            DMatrix::from_element(dims.n_sites(), schema.specs().len(), None);
        let mut coders: AHashMap<String, LevelCoder> = AHashMap::new();
        let mut seen = vec![0usize; dims.n_sites()];

        for record in reader.records() {
            let record = record?;
            let Some(site) = parse_na_str(record.get(site_col)).and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };
            let row = dims.site_index(site)?;
            seen[row] += 1;
            if seen[row] > 1 {
                return Err(CoveyError::DuplicateSiteRow {
                    site,
                    count: seen[row],
                });
            }

            for (k, spec) in schema.specs().iter().enumerate() {
                let Some(cell) = parse_na_str(record.get(columns[k])) else {
                    continue;
                };
                let coded = match spec.kind {
                    CovariateKind::Continuous => {
                        cell.parse::<f64>().map_err(|_| CoveyError::InvalidCell {
                            table: table.to_string(),
                            column: spec.name.clone(),
                            value: cell.to_string(),
                        })?
                    }
                    CovariateKind::Categorical => {
                        coders.entry(spec.name.clone()).or_default().code(cell) as f64
                    }
                };
                values[(row, k)] = Some(coded);
            }
        }

        let mut scalings = Vec::with_capacity(schema.specs().len());
        for (k, spec) in schema.specs().iter().enumerate() {
            match spec.kind {
                CovariateKind::Continuous => {
                    let mut column: Vec<Option<f64>> = values.column(k).iter().cloned().collect();
                    let scaling = standardize(&mut column, &spec.name)?;
                    for (row, cell) in column.into_iter().enumerate() {
                        values[(row, k)] = cell;
                    }
                    scalings.push(Some(scaling));
                }
                CovariateKind::Categorical => scalings.push(None),
            }
        }

        Ok(SiteCovariates {
            names: schema.names(),
            values,
            scalings,
            coders,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Site × covariate matrix; `None` marks a site with no value.
    pub fn values(&self) -> &DMatrix<Option<f64>> {
        &self.values
    }

    pub fn n_sites(&self) -> usize {
        self.values.nrows()
    }

    /// Scaling applied to a continuous column, `None` for categorical ones.
    pub fn scaling(&self, name: &str) -> Option<Scaling> {
        let k = self.names.iter().position(|n| n == name)?;
        self.scalings[k]
    }

    /// Level coder of a categorical column.
    pub fn coder(&self, name: &str) -> Option<&LevelCoder> {
        self.coders.get(name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let k = self.names.iter().position(|n| n == name)?;
        Some(self.values.column(k).iter().cloned().collect())
    }
}

/// Survey-level covariate grids aligned to the site × occasion axes.
///
/// One grid per field: observer and sky codes pass through unscaled,
/// temperature, wind, and day-of-year are z-scored over non-missing cells.
/// A cell with no visit stays `None` in every grid. A field that is missing
/// everywhere is left unscaled rather than rejected, since the model text
/// simply omits it.
#[derive(Debug, Clone)]
pub struct OccasionCovariates {
    names: Vec<String>,
    grids: Vec<DMatrix<Option<f64>>>,
    scalings: Vec<Option<Scaling>>,
    observer_coder: LevelCoder,
    sky_coder: LevelCoder,
}

/// Field order of the occasion-level grids.
const OCCASION_FIELDS: [&str; 5] = ["observer", "temperature", "wind", "sky", "day_of_year"];

impl OccasionCovariates {
    /// Assemble the per-visit condition rows into dense grids.
    ///
    /// Two rows for the same (site, occasion) cell are an input inconsistency
    /// and abort the run.
    pub fn build(
        conditions: &[SurveyConditions],
        dims: &GridDims,
    ) -> Result<Self, CoveyError> {
        let shape = || DMatrix::from_element(dims.n_sites(), dims.n_occasions(), None);
        let mut grids: Vec<DMatrix<Option<f64>>> = (0..OCCASION_FIELDS.len()).map(|_| shape()).collect();
        let mut observer_coder = LevelCoder::new();
        let mut sky_coder = LevelCoder::new();
        let mut visited = DMatrix::from_element(dims.n_sites(), dims.n_occasions(), false);

        for visit in conditions {
            let row = dims.site_index(visit.site)?;
            let col = dims.occasion_index(visit.occasion)?;
            if visited[(row, col)] {
                return Err(CoveyError::DuplicateSurveyRow {
                    site: visit.site,
                    occasion: visit.occasion,
                });
            }
            visited[(row, col)] = true;

            grids[0][(row, col)] = visit
                .observer
                .as_deref()
                .map(|o| observer_coder.code(o) as f64);
            grids[1][(row, col)] = visit.temperature;
            grids[2][(row, col)] = visit.wind;
            grids[3][(row, col)] = visit.sky.as_deref().map(|s| sky_coder.code(s) as f64);
            grids[4][(row, col)] = visit.day_of_year;
        }

        let mut scalings = vec![None; OCCASION_FIELDS.len()];
        for (k, name) in OCCASION_FIELDS.iter().enumerate() {
            let continuous = matches!(*name, "temperature" | "wind" | "day_of_year");
            if !continuous {
                continue;
            }
            match standardize(grids[k].as_mut_slice(), name) {
                Ok(scaling) => scalings[k] = Some(scaling),
                // field absent from this dataset: grids stay all-missing
                Err(CoveyError::AllMissing(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(OccasionCovariates {
            names: OCCASION_FIELDS.iter().map(|s| s.to_string()).collect(),
            grids,
            scalings,
            observer_coder,
            sky_coder,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn grids(&self) -> &[DMatrix<Option<f64>>] {
        &self.grids
    }

    pub fn grid(&self, name: &str) -> Option<&DMatrix<Option<f64>>> {
        let k = self.names.iter().position(|n| n == name)?;
        Some(&self.grids[k])
    }

    pub fn scaling(&self, name: &str) -> Option<Scaling> {
        let k = self.names.iter().position(|n| n == name)?;
        self.scalings[k]
    }

    pub fn observer_levels(&self) -> &[String] {
        self.observer_coder.levels()
    }

    pub fn sky_levels(&self) -> &[String] {
        self.sky_coder.levels()
    }
}

/// Trim a raw CSV cell, treating empty and `NA` as missing.
fn parse_na_str(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("na"))
}
