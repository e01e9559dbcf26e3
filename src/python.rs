//! Python bindings for the placement engine.

use numpy::{PyArray1, PyReadonlyArray1, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::CatConfig;
use crate::estimation;
use crate::likelihood;
use crate::model::{Item, Response};
use crate::simulation;

fn config_from(config_toml: Option<&str>) -> PyResult<CatConfig> {
    match config_toml {
        Some(s) => CatConfig::from_toml_str(s).map_err(|e| PyValueError::new_err(e.to_string())),
        None => Ok(CatConfig::default()),
    }
}

/// Rasch probability of a correct response
#[pyfunction]
pub fn probability(theta: f64, difficulty: f64) -> f64 {
    likelihood::probability(theta, difficulty)
}

/// Rasch item information at theta
#[pyfunction]
pub fn information(theta: f64, difficulty: f64) -> f64 {
    likelihood::information(theta, difficulty)
}

/// Estimate (theta, se) from item difficulties and 0/1 responses; negative
/// responses are treated as missing
#[pyfunction]
pub fn estimate_theta(
    difficulty: PyReadonlyArray1<f64>,
    responses: PyReadonlyArray1<i32>,
) -> PyResult<(f64, f64)> {
    let diff = difficulty.as_array();
    let resp = responses.as_array();
    if diff.len() != resp.len() {
        return Err(PyValueError::new_err(
            "difficulty and responses must have the same length",
        ));
    }

    let pattern: Vec<Response> = diff
        .iter()
        .zip(resp.iter())
        .enumerate()
        .filter(|(_, (_, r))| **r >= 0)
        .map(|(j, (&b, &r))| Response {
            node_id: j.to_string(),
            domain_id: String::new(),
            difficulty: b,
            correct: r == 1,
        })
        .collect();

    let est = estimation::estimate_theta(&pattern);
    Ok((est.theta, est.se))
}

/// Run batch CAT simulations in parallel
#[pyfunction]
#[pyo3(signature = (true_thetas, difficulty, domains, n_replications, seed, config_toml=None))]
#[allow(clippy::type_complexity)]
pub fn simulate_batch<'py>(
    py: Python<'py>,
    true_thetas: PyReadonlyArray1<f64>,
    difficulty: PyReadonlyArray1<f64>,
    domains: PyReadonlyArray1<i32>,
    n_replications: usize,
    seed: u64,
    config_toml: Option<&str>,
) -> PyResult<(
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray1<i32>>,
    Bound<'py, PyArray1<f64>>,
)> {
    let config = config_from(config_toml)?;
    let thetas = true_thetas.as_array().to_vec();
    let diff = difficulty.as_array();
    let dom = domains.as_array();
    if diff.len() != dom.len() {
        return Err(PyValueError::new_err(
            "difficulty and domains must have the same length",
        ));
    }

    let pool: Vec<Item> = diff
        .iter()
        .zip(dom.iter())
        .enumerate()
        .map(|(j, (&b, &d))| Item::new(j.to_string(), d.to_string(), b))
        .collect();

    let batch = py.detach(|| {
        simulation::simulate_batch(&thetas, &pool, &config, n_replications, seed)
    });

    Ok((
        batch.theta_est.to_pyarray(py),
        batch.se_est.to_pyarray(py),
        batch.n_items.mapv(|n| n as i32).to_pyarray(py),
        batch.true_theta.to_pyarray(py),
    ))
}

/// Register placement functions with the Python module
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(probability, m)?)?;
    m.add_function(wrap_pyfunction!(information, m)?)?;
    m.add_function(wrap_pyfunction!(estimate_theta, m)?)?;
    m.add_function(wrap_pyfunction!(simulate_batch, m)?)?;
    Ok(())
}
