//! Rasch-model adaptive placement testing.
//!
//! This crate places a learner on a latent ability scale and seeds a
//! spaced-repetition schedule from the result:
//! - Rasch (1PL) response probability and Fisher information
//! - Ability estimation (EAP on a fixed grid, Newton-Raphson MLE) with SE
//! - Per-domain ability aggregation
//! - Stochastic top-K item selection with domain coverage balancing
//! - Precision- and length-based termination
//! - Node classification and spaced-repetition bootstrap
//! - Simulated sessions for evaluating test configurations
//!
//! All session functions are pure: each response produces a new
//! [`IrtState`] and nothing is stored between calls.

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod utils;

pub mod cat;
pub mod classification;
pub mod config;
pub mod domain;
pub mod error;
pub mod estimation;
pub mod likelihood;
pub mod model;
#[cfg(feature = "python")]
pub mod python;
pub mod result;
pub mod simulation;

pub use cat::{
    TerminationReason, create_initial_state, process_response, select_next_item,
    select_next_item_with_rng, should_terminate, termination_reason,
};
pub use classification::{classification_to_state, classify, classify_nodes};
pub use config::CatConfig;
pub use domain::estimate_domain_thetas;
pub use error::ConfigError;
pub use estimation::{EstimationMethod, ThetaEstimate, estimate_theta};
pub use likelihood::{information, probability};
pub use model::{
    Classification, ClassificationResult, IrtState, Item, PlacementResult, Response, SrsState,
};
pub use result::build_result;

/// Python module for cat_placement
#[cfg(feature = "python")]
#[pymodule]
fn cat_placement(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)?;
    Ok(())
}
