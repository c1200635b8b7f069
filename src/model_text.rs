//! Versioned hierarchical-model texts.
//!
//! The inference engine consumes a textual model description (priors,
//! likelihood, derived quantities). These texts are fixed, versioned
//! artifacts keyed by model name; the only data-dependent content is the
//! dimension constants interpolated from the bundle. Nothing else is
//! generated dynamically.

use std::str::FromStr;

use crate::covey_errors::CoveyError;
use crate::model_data::ModelDataBundle;

/// The hierarchical models shipped with this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Acoustic N-mixture model with a false-positive detection layer tied
    /// to the manually-validated call subset.
    AcousticFalsePositive,
    /// Point-count hierarchical distance-sampling model.
    DistanceSampling,
}

impl ModelKind {
    /// Stable label keying output artifacts and summary files.
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::AcousticFalsePositive => "aru_false_positive",
            ModelKind::DistanceSampling => "pointcount_distance",
        }
    }

    /// Render the model text with this run's dimension constants.
    pub fn render(&self, bundle: &ModelDataBundle) -> String {
        let dims = bundle.dims();
        let text = match self {
            ModelKind::AcousticFalsePositive => ARU_FALSE_POSITIVE_MODEL,
            ModelKind::DistanceSampling => DISTANCE_SAMPLING_MODEL,
        };
        text.replace("{{n_sites}}", &dims.n_sites().to_string())
            .replace("{{n_occasions}}", &dims.n_occasions().to_string())
            .replace("{{n_distance_bins}}", &dims.n_distance_bins().to_string())
            .replace(
                "{{n_validated_sites}}",
                &bundle
                    .validation()
                    .map(|v| v.n_validated_sites())
                    .unwrap_or(0)
                    .to_string(),
            )
            .replace(
                "{{bin_width}}",
                &format!("{:.1}", bundle.geometry().bin_width_m),
            )
            .replace(
                "{{survey_area_ha}}",
                &format!("{:.6}", bundle.survey_area_ha()),
            )
    }
}

impl FromStr for ModelKind {
    type Err = CoveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aru_false_positive" => Ok(ModelKind::AcousticFalsePositive),
            "pointcount_distance" => Ok(ModelKind::DistanceSampling),
            other => Err(CoveyError::UnknownModel(other.to_string())),
        }
    }
}

/// Acoustic N-mixture model with false positives, v1.
///
/// `Y` is the site x occasion call-count grid; the validated subset informs
/// the true-positive rate. Occasions with zero detections are skipped via the
/// occupied-occasion index, hence the `occ[i, k]` indirection.
const ARU_FALSE_POSITIVE_MODEL: &str = r#"model {
  # dimensions: {{n_sites}} sites, {{n_occasions}} occasions,
  # {{n_validated_sites}} manually validated sites

  lambda0 ~ dnorm(0, 0.1)
  beta_grass ~ dnorm(0, 0.1)
  omega ~ dunif(0, 1000)        # false-positive rate per occasion
  delta ~ dunif(0, 1000)        # call rate per individual

  for (i in 1:{{n_sites}}) {
    log(lambda[i]) <- lambda0 + beta_grass * grass[i]
    N[i] ~ dpois(lambda[i] * area)
    for (j in 1:{{n_occasions}}) {
      Y[i, j] ~ dpois(delta * N[i] + omega)
    }
    for (k in 1:n_occupied[i]) {
      tp[i, occ[i, k]] <- delta * N[i] / (delta * N[i] + omega)
    }
  }

  for (v in 1:{{n_validated_sites}}) {
    for (k in 1:n_checked[v]) {
      K[v, chk[v, k]] ~ dbin(tp[val_site[v], chk[v, k]], n_val[v, chk[v, k]])
    }
  }

  totalN <- sum(N[])
  density <- totalN / ({{n_sites}} * {{survey_area_ha}})
}"#;

/// Point-count hierarchical distance-sampling model, v1.
///
/// `y` is the site x flattened (occasion, bin) count matrix with
/// {{n_distance_bins}} bins of {{bin_width}} m.
const DISTANCE_SAMPLING_MODEL: &str = r#"model {
  # dimensions: {{n_sites}} sites, {{n_occasions}} occasions,
  # {{n_distance_bins}} distance bins of {{bin_width}} m

  alpha0 ~ dnorm(0, 0.1)
  beta_grass ~ dnorm(0, 0.1)
  log_sigma0 ~ dnorm(0, 0.1)
  beta_wind ~ dnorm(0, 0.1)

  for (i in 1:{{n_sites}}) {
    log(lambda[i]) <- alpha0 + beta_grass * grass[i]
    N[i] ~ dpois(lambda[i])
    for (j in 1:{{n_occasions}}) {
      log(sigma[i, j]) <- log_sigma0 + beta_wind * wind[i, j]
      for (d in 1:{{n_distance_bins}}) {
        p[i, j, d] <- exp(-midpt[d] * midpt[d] / (2 * sigma[i, j] * sigma[i, j])) * binprob[d]
      }
      pcap[i, j] <- sum(p[i, j, 1:{{n_distance_bins}}])
      n[i, j] ~ dbin(pcap[i, j], N[i])
      y[i, j, 1:{{n_distance_bins}}] ~ dmulti(p[i, j, 1:{{n_distance_bins}}] / pcap[i, j], n[i, j])
    }
  }

  totalN <- sum(N[])
  density <- totalN / ({{n_sites}} * {{survey_area_ha}})
}"#;
