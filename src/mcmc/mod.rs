//! # External inference-engine interface
//!
//! The Gibbs sampler is an external collaborator: this crate hands it an
//! immutable [`ModelDataBundle`](crate::model_data::ModelDataBundle), a model
//! text, per-chain initial values, and an [`McmcConfig`], then blocks until
//! every chain has finished. Parallel-chain execution is internal to the
//! engine; from here it is one opaque synchronous call with a configurable
//! worker count. There are no partial or streaming results.
//!
//! Failure split: an engine crash or malformed draw set is fatal for the run
//! (no summary is produced); a convergence failure is not — the run carries a
//! [`ConvergenceReport`] naming every offending parameter and its summaries
//! are flagged provisional.

pub mod summary;

use ahash::AHashMap;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use crate::constants::RHAT_THRESHOLD;
use crate::covey_errors::CoveyError;
use crate::model_data::ModelDataBundle;
use crate::model_text::ModelKind;

/// MCMC run configuration passed through to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McmcConfig {
    /// Total iterations per chain, burn-in included.
    pub n_iterations: usize,
    /// Iterations discarded from the front of each chain.
    pub n_burn_in: usize,
    /// Keep every `n_thin`-th post-burn-in draw.
    pub n_thin: usize,
    /// Independent chains.
    pub n_chains: usize,
    /// Worker threads the engine may use for parallel chains.
    pub n_workers: usize,
}

impl Default for McmcConfig {
    fn default() -> Self {
        McmcConfig {
            n_iterations: 50_000,
            n_burn_in: 10_000,
            n_thin: 10,
            n_chains: 3,
            n_workers: 3,
        }
    }
}

impl McmcConfig {
    /// Cross-check the configuration before the engine is invoked.
    pub fn validate(&self) -> Result<(), CoveyError> {
        if self.n_chains == 0 || self.n_workers == 0 || self.n_thin == 0 {
            return Err(CoveyError::InvalidMcmcConfig(
                "chain, worker, and thinning counts must be positive".to_string(),
            ));
        }
        if self.n_burn_in >= self.n_iterations {
            return Err(CoveyError::InvalidMcmcConfig(format!(
                "burn-in {} must be shorter than the {} total iterations",
                self.n_burn_in, self.n_iterations
            )));
        }
        Ok(())
    }

    /// Retained draws per chain after burn-in and thinning.
    pub fn draws_per_chain(&self) -> usize {
        (self.n_iterations - self.n_burn_in) / self.n_thin
    }
}

/// Everything the engine needs for one sampling run.
#[derive(Debug, Clone)]
pub struct SamplerRequest<'a> {
    pub bundle: &'a ModelDataBundle,
    pub model_text: String,
    /// Parameter names to record draws for.
    pub monitors: Vec<String>,
    /// One starting point per chain.
    pub initial_values: Vec<AHashMap<String, f64>>,
    pub config: McmcConfig,
}

/// Posterior draws and diagnostics returned by the engine.
#[derive(Debug, Clone, Default)]
pub struct SamplerOutput {
    /// Parameter → per-chain draw vectors.
    pub draws: AHashMap<String, Vec<Vec<f64>>>,
    /// Parameter → scale-reduction statistic.
    pub rhat: AHashMap<String, f64>,
    /// Pooled per-draw deviance, when the engine reports it.
    pub deviance: Option<Vec<f64>>,
}

impl SamplerOutput {
    /// Check the engine's output against what was requested.
    ///
    /// Any missing monitored parameter, wrong chain count, ragged or empty
    /// chains, non-finite draws, or missing diagnostic makes the whole run
    /// fatal ([`CoveyError::MalformedDraws`]); no partial summary may be
    /// built from such output.
    pub fn validate(&self, monitors: &[String], config: &McmcConfig) -> Result<(), CoveyError> {
        for name in monitors {
            let chains = self
                .draws
                .get(name)
                .ok_or_else(|| CoveyError::MalformedDraws(format!("no draws for {name}")))?;
            if chains.len() != config.n_chains {
                return Err(CoveyError::MalformedDraws(format!(
                    "{name}: {} chains returned, {} requested",
                    chains.len(),
                    config.n_chains
                )));
            }
            let len = chains.first().map(Vec::len).unwrap_or(0);
            if len == 0 || chains.iter().any(|c| c.len() != len) {
                return Err(CoveyError::MalformedDraws(format!(
                    "{name}: empty or ragged chains"
                )));
            }
            if chains.iter().flatten().any(|d| !d.is_finite()) {
                return Err(CoveyError::MalformedDraws(format!(
                    "{name}: non-finite draw"
                )));
            }
            if !self.rhat.contains_key(name) {
                return Err(CoveyError::MalformedDraws(format!(
                    "{name}: no convergence diagnostic"
                )));
            }
        }
        Ok(())
    }

    /// All chains of one parameter concatenated.
    pub fn pooled(&self, parameter: &str) -> Option<Vec<f64>> {
        self.draws
            .get(parameter)
            .map(|chains| chains.iter().flatten().copied().collect())
    }
}

/// The external Gibbs/MCMC engine, modelled as one blocking call.
pub trait InferenceEngine {
    fn sample(&self, request: &SamplerRequest<'_>) -> Result<SamplerOutput, CoveyError>;
}

/// Convergence verdict over every monitored parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    threshold: f64,
    /// Offending parameters and their Rhat, worst first.
    failures: Vec<(String, f64)>,
}

impl ConvergenceReport {
    /// Screen an engine output's diagnostics at the standard threshold.
    pub fn from_output(output: &SamplerOutput, monitors: &[String]) -> Self {
        let mut failures: Vec<(String, f64)> = monitors
            .iter()
            .filter_map(|name| {
                let rhat = *output.rhat.get(name)?;
                (rhat > RHAT_THRESHOLD).then(|| (name.clone(), rhat))
            })
            .collect();
        failures.sort_by(|a, b| b.1.total_cmp(&a.1));
        ConvergenceReport {
            threshold: RHAT_THRESHOLD,
            failures,
        }
    }

    pub fn converged(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[(String, f64)] {
        &self.failures
    }
}

impl std::fmt::Display for ConvergenceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "all monitored parameters converged (Rhat <= {})", self.threshold);
        }
        let offenders = self
            .failures
            .iter()
            .map(|(name, rhat)| format!("{name}={rhat:.3}"))
            .join(", ");
        write!(
            f,
            "WARNING: Rhat > {} for {} parameter(s); summaries are provisional: {offenders}",
            self.threshold,
            self.failures.len()
        )
    }
}

/// Draw per-chain starting values around the supplied centers.
///
/// Arguments
/// -----------------
/// * `seed`: run seed from the [`RunConfig`](crate::run_config::RunConfig).
/// * `n_chains`: one starting point per chain.
/// * `specs`: `(parameter, center, spread)` triples; `spread` is the standard
///   deviation of the jitter separating the chains.
///
/// Return
/// ----------
/// * One name → value map per chain; identical for identical seeds.
pub fn initial_values(
    seed: u64,
    n_chains: usize,
    specs: &[(&str, f64, f64)],
) -> Result<Vec<AHashMap<String, f64>>, CoveyError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut chains = Vec::with_capacity(n_chains);
    for _ in 0..n_chains {
        let mut values = AHashMap::new();
        for (name, center, spread) in specs {
            let normal = Normal::new(*center, *spread).map_err(|e| {
                CoveyError::InvalidMcmcConfig(format!("initial values for {name}: {e}"))
            })?;
            values.insert(name.to_string(), rng.sample(normal));
        }
        chains.push(values);
    }
    Ok(chains)
}

/// One fitted model: validated engine output plus its convergence verdict.
#[derive(Debug, Clone)]
pub struct FittedModel {
    label: String,
    monitors: Vec<String>,
    output: SamplerOutput,
    convergence: ConvergenceReport,
}

impl FittedModel {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn monitors(&self) -> &[String] {
        &self.monitors
    }

    pub fn output(&self) -> &SamplerOutput {
        &self.output
    }

    pub fn convergence(&self) -> &ConvergenceReport {
        &self.convergence
    }
}

/// Drive one model through the external engine.
///
/// Renders the model text, validates the configuration, invokes the engine
/// as a single blocking call, then validates the returned draws and screens
/// convergence. Engine failures and malformed output abort the run before
/// any summary exists; convergence failures are carried on the returned
/// [`FittedModel`].
pub fn run_model(
    engine: &dyn InferenceEngine,
    bundle: &ModelDataBundle,
    kind: ModelKind,
    monitors: &[&str],
    seed: u64,
    init_specs: &[(&str, f64, f64)],
    config: McmcConfig,
) -> Result<FittedModel, CoveyError> {
    config.validate()?;
    let monitors: Vec<String> = monitors.iter().map(|m| m.to_string()).collect();
    let request = SamplerRequest {
        bundle,
        model_text: kind.render(bundle),
        monitors: monitors.clone(),
        initial_values: initial_values(seed, config.n_chains, init_specs)?,
        config,
    };

    let output = engine.sample(&request)?;
    output.validate(&monitors, &config)?;
    let convergence = ConvergenceReport::from_output(&output, &monitors);

    Ok(FittedModel {
        label: kind.label().to_string(),
        monitors,
        output,
        convergence,
    })
}
