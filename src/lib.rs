//! # Covey: survey data reshaping for hierarchical abundance models
//!
//! `covey` builds the fixed-shape arrays consumed by hierarchical Bayesian
//! abundance models of Northern Bobwhite from two independent survey
//! pathways: autonomous-recording-unit (ARU) acoustic detections classified
//! upstream, and human point-count distance-sampling surveys.
//!
//! The pipeline is: raw tabular rows → record normalizer → index resolver →
//! array builders + covariate scaler → validated
//! [`ModelDataBundle`](crate::model_data::ModelDataBundle) → external
//! Gibbs/MCMC engine → posterior summaries. The sampler itself is out of
//! scope and modelled as one blocking call behind the
//! [`InferenceEngine`](crate::mcmc::InferenceEngine) trait.

pub mod constants;
pub mod covey_errors;
pub mod mcmc;
pub mod model_data;
pub mod model_text;
pub mod pipeline;
pub mod reshape;
pub mod run_config;
pub mod surveys;
