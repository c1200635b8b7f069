//! Posterior summaries and write-once output artifacts.
//!
//! For each monitored parameter the summarizer reports the posterior mean and
//! the central 95% credible interval (2.5% / 97.5% quantiles) over the pooled
//! chains, plus derived density (abundance divided by the surveyed area).
//! Summary tables are keyed by the model label and written exactly once per
//! run; an existing file is an error, never appended to or overwritten.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::constants::{CREDIBLE_LOWER, CREDIBLE_UPPER};
use crate::covey_errors::CoveyError;
use crate::mcmc::FittedModel;

/// One row of the posterior summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub parameter: String,
    pub mean: f64,
    pub lower_2_5: f64,
    pub upper_97_5: f64,
    pub rhat: Option<f64>,
    /// Set when any monitored parameter of the run failed convergence.
    pub provisional: bool,
}

/// Summarize every monitored parameter of a fitted model.
///
/// Return
/// ----------
/// * One [`ParameterSummary`] per monitor, in monitor order. The
///   `provisional` flag is shared across the run: one unconverged parameter
///   taints the whole table.
pub fn summarize(fitted: &FittedModel) -> Result<Vec<ParameterSummary>, CoveyError> {
    let provisional = !fitted.convergence().converged();
    fitted
        .monitors()
        .iter()
        .map(|name| {
            let draws = fitted
                .output()
                .pooled(name)
                .ok_or_else(|| CoveyError::MalformedDraws(format!("no draws for {name}")))?;
            let mut summary = summarize_draws(name, &draws)?;
            summary.rhat = fitted.output().rhat.get(name).copied();
            summary.provisional = provisional;
            Ok(summary)
        })
        .collect()
}

/// Derived density summary: per-draw abundance divided by the surveyed area.
///
/// Arguments
/// -----------------
/// * `fitted`: the fitted model holding the abundance draws.
/// * `abundance_parameter`: name of the monitored total-abundance parameter.
/// * `total_area_ha`: total surveyed area in hectares (sites × per-site
///   offset).
pub fn derived_density(
    fitted: &FittedModel,
    abundance_parameter: &str,
    total_area_ha: f64,
) -> Result<ParameterSummary, CoveyError> {
    if total_area_ha <= 0.0 {
        return Err(CoveyError::InvalidGrid(format!(
            "non-positive surveyed area: {total_area_ha} ha"
        )));
    }
    let draws = fitted.output().pooled(abundance_parameter).ok_or_else(|| {
        CoveyError::MalformedDraws(format!("no draws for {abundance_parameter}"))
    })?;
    let density: Vec<f64> = draws.iter().map(|n| n / total_area_ha).collect();
    let mut summary = summarize_draws("density_per_ha", &density)?;
    summary.provisional = !fitted.convergence().converged();
    Ok(summary)
}

fn summarize_draws(name: &str, draws: &[f64]) -> Result<ParameterSummary, CoveyError> {
    if draws.is_empty() {
        return Err(CoveyError::MalformedDraws(format!("no draws for {name}")));
    }
    let mut sorted = draws.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(ParameterSummary {
        parameter: name.to_string(),
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        lower_2_5: quantile(&sorted, CREDIBLE_LOWER),
        upper_97_5: quantile(&sorted, CREDIBLE_UPPER),
        rhat: None,
        provisional: false,
    })
}

/// Linear-interpolation quantile of an ascending-sorted sample.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let position = q * (n - 1) as f64;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    let weight = position - low as f64;
    sorted[low] * (1.0 - weight) + sorted[high] * weight
}

/// Write the summary table, keyed by model label, exactly once.
///
/// Return
/// ----------
/// * The path of the written CSV, or
///   [`CoveyError::SummaryAlreadyWritten`] when an artifact with the same
///   label already exists in `output_dir`.
pub fn write_summary(
    output_dir: &Utf8Path,
    label: &str,
    summaries: &[ParameterSummary],
) -> Result<Utf8PathBuf, CoveyError> {
    std::fs::create_dir_all(output_dir.as_std_path())?;
    let path = output_dir.join(format!("{label}_posterior_summary.csv"));

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path.as_std_path())
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                CoveyError::SummaryAlreadyWritten(path.to_string())
            } else {
                CoveyError::IoError(e)
            }
        })?;

    let mut writer = csv::Writer::from_writer(file);
    for summary in summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;
    Ok(path)
}
