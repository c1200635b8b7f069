#![allow(dead_code)]

use ahash::AHashMap;
use camino::Utf8PathBuf;

use covey::covey_errors::CoveyError;
use covey::mcmc::{InferenceEngine, SamplerOutput, SamplerRequest};
use covey::reshape::grid_index::GridDims;
use covey::surveys::calendar::SurveyCalendar;

/// Temporary CSV input that removes itself when the test ends.
pub struct TempCsv {
    pub path: Utf8PathBuf,
}

impl TempCsv {
    pub fn write(name: &str, content: &str) -> Self {
        let mut path = std::env::temp_dir();
        path.push(format!("covey_test_{}_{name}", std::process::id()));
        std::fs::write(&path, content).expect("write temp csv");
        TempCsv {
            path: Utf8PathBuf::from_path_buf(path).expect("utf8 temp path"),
        }
    }
}

impl Drop for TempCsv {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(self.path.as_std_path());
    }
}

/// Fresh per-test output directory under the system temp dir.
pub fn temp_output_dir(name: &str) -> Utf8PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("covey_out_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&path);
    Utf8PathBuf::from_path_buf(path).expect("utf8 temp path")
}

/// The two-occasion calendar used across the reshaping tests.
pub fn two_occasion_calendar() -> SurveyCalendar {
    SurveyCalendar::from_iso_dates(&["2023-05-01", "2023-05-05"]).expect("calendar")
}

pub fn two_by_two() -> GridDims {
    GridDims::new(2, 2).expect("grid dims")
}

/// Deterministic stand-in for the external Gibbs sampler.
///
/// Returns well-formed draws for every requested monitor; per-parameter Rhat
/// values can be overridden to exercise the convergence report.
pub struct FakeGibbsEngine {
    pub rhat_overrides: AHashMap<String, f64>,
    pub fail: bool,
}

impl FakeGibbsEngine {
    pub fn converged() -> Self {
        FakeGibbsEngine {
            rhat_overrides: AHashMap::new(),
            fail: false,
        }
    }

    pub fn with_rhat(overrides: &[(&str, f64)]) -> Self {
        FakeGibbsEngine {
            rhat_overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            fail: false,
        }
    }

    pub fn crashing() -> Self {
        FakeGibbsEngine {
            rhat_overrides: AHashMap::new(),
            fail: true,
        }
    }
}

impl InferenceEngine for FakeGibbsEngine {
    fn sample(&self, request: &SamplerRequest<'_>) -> Result<SamplerOutput, CoveyError> {
        if self.fail {
            return Err(CoveyError::EngineFailure(
                "simulated sampler crash".to_string(),
            ));
        }

        let n_draws = request.config.draws_per_chain().min(200);
        let mut output = SamplerOutput::default();
        for (p, name) in request.monitors.iter().enumerate() {
            let base = 10.0 * (p + 1) as f64;
            let chains: Vec<Vec<f64>> = (0..request.config.n_chains)
                .map(|chain| {
                    (0..n_draws)
                        .map(|d| base + chain as f64 * 0.01 + (d % 7) as f64 * 0.1)
                        .collect()
                })
                .collect();
            output.draws.insert(name.clone(), chains);
            let rhat = self.rhat_overrides.get(name).copied().unwrap_or(1.01);
            output.rhat.insert(name.clone(), rhat);
        }
        Ok(output)
    }
}
