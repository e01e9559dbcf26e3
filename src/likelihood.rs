//! Rasch (1PL) response probability, item information and log-likelihood.

use crate::model::Response;
use crate::utils::{log_sigmoid, sigmoid};

/// Probability of a correct response under the Rasch model.
///
/// Discrimination is fixed at 1 and there is no guessing floor, so this is
/// the logistic of `theta - difficulty`.
#[inline]
pub fn probability(theta: f64, difficulty: f64) -> f64 {
    sigmoid(theta - difficulty)
}

/// Fisher information of a Rasch item, `p * (1 - p)`.
///
/// Peaks at 0.25 when `theta == difficulty`.
#[inline]
pub fn information(theta: f64, difficulty: f64) -> f64 {
    let p = probability(theta, difficulty);
    p * (1.0 - p)
}

/// Log-likelihood of a response pattern at `theta`.
#[inline]
pub fn log_likelihood(responses: &[Response], theta: f64) -> f64 {
    let mut ll = 0.0;
    for r in responses {
        let z = theta - r.difficulty;
        if r.correct {
            ll += log_sigmoid(z);
        } else {
            ll += log_sigmoid(-z);
        }
    }
    ll
}

/// Total information of the administered items at `theta`.
#[inline]
pub fn test_information(responses: &[Response], theta: f64) -> f64 {
    responses
        .iter()
        .map(|r| information(theta, r.difficulty))
        .sum()
}
