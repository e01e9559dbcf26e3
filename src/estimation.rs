//! Ability estimation: EAP for short or perfect patterns, Newton-Raphson MLE otherwise.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::likelihood::{log_likelihood, probability, test_information};
use crate::model::Response;
use crate::utils::{
    PRIOR_SE, THETA_MAX, THETA_MIN, clip, compute_eap_with_se, eap_grid, normalize_log_posterior,
    on_ability_bound,
};

/// Patterns shorter than this are scored by EAP regardless of outcome mix.
pub const MIN_RESPONSES_FOR_MLE: usize = 3;

pub const MLE_MAX_ITER: usize = 50;
pub const MLE_TOL: f64 = 0.001;

/// Which estimator produced a [`ThetaEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimationMethod {
    /// No responses; the diffuse prior was returned unchanged.
    Prior,
    Eap,
    Mle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThetaEstimate {
    pub theta: f64,
    pub se: f64,
    pub method: EstimationMethod,
}

/// Estimate ability from a response pattern.
///
/// - no responses: `theta = 0`, `se = 4`
/// - one or two responses: EAP
/// - three or more with mixed outcomes: MLE
/// - three or more, all correct or all incorrect: EAP, since the likelihood
///   is monotone and has no finite maximum
pub fn estimate_theta(responses: &[Response]) -> ThetaEstimate {
    if responses.is_empty() {
        return ThetaEstimate {
            theta: 0.0,
            se: PRIOR_SE,
            method: EstimationMethod::Prior,
        };
    }

    let n_correct = responses.iter().filter(|r| r.correct).count();
    let mixed = n_correct > 0 && n_correct < responses.len();

    let estimate = if responses.len() >= MIN_RESPONSES_FOR_MLE && mixed {
        estimate_mle(responses)
    } else {
        estimate_eap(responses)
    };

    debug!(
        n_responses = responses.len(),
        n_correct,
        method = ?estimate.method,
        theta = estimate.theta,
        se = estimate.se,
        "estimated ability"
    );
    estimate
}

/// Expected a posteriori estimate on a fixed grid with a standard normal prior.
///
/// The prior is left unnormalised; normalising the posterior removes the
/// constant anyway.
pub fn estimate_eap(responses: &[Response]) -> ThetaEstimate {
    let nodes = eap_grid();

    let log_posterior: Vec<f64> = nodes
        .iter()
        .map(|&theta| {
            let log_prior = -0.5 * theta * theta;
            log_prior + log_likelihood(responses, theta)
        })
        .collect();

    let posterior = normalize_log_posterior(&log_posterior);
    let (theta, se) = compute_eap_with_se(&posterior, &nodes);

    ThetaEstimate {
        theta,
        se,
        method: EstimationMethod::Eap,
    }
}

/// Maximum likelihood estimate by Newton-Raphson, starting from zero.
///
/// Theta is clamped to the ability bounds after every step, so a pattern
/// whose maximiser lies off the scale settles on the nearer bound. Iteration
/// stops once a step is smaller than `MLE_TOL` or after `MLE_MAX_ITER` steps.
/// SE is `1 / sqrt(information)` at the final theta; the prior SE is reported
/// only when the information underflows to exactly zero.
pub fn estimate_mle(responses: &[Response]) -> ThetaEstimate {
    let mut theta = 0.0;
    let mut converged = false;

    for iter in 0..MLE_MAX_ITER {
        let mut gradient = 0.0;
        let mut hessian = 0.0;
        for r in responses {
            let p = probability(theta, r.difficulty);
            let u = if r.correct { 1.0 } else { 0.0 };
            gradient += u - p;
            hessian -= p * (1.0 - p);
        }

        let step = gradient / hessian;
        if hessian == 0.0 || step.is_nan() {
            // Flat surface: every p has saturated. Move to the bound the
            // gradient points at, or stop if already there.
            let target = if gradient > 0.0 {
                THETA_MAX
            } else if gradient < 0.0 {
                THETA_MIN
            } else {
                theta
            };
            trace!(iter, theta, target, "newton-raphson flat surface");
            if target == theta {
                break;
            }
            theta = target;
            continue;
        }

        theta = clip(theta - step, THETA_MIN, THETA_MAX);
        trace!(iter, theta, step, "newton-raphson step");

        if step.abs() < MLE_TOL {
            converged = true;
            break;
        }
    }

    if !converged {
        if on_ability_bound(theta) {
            debug!(
                n_responses = responses.len(),
                theta, "newton-raphson estimate held at ability bound"
            );
        } else {
            warn!(
                n_responses = responses.len(),
                theta, "newton-raphson did not converge within iteration budget"
            );
        }
    }

    let info = test_information(responses, theta);
    let se = if info > 0.0 {
        1.0 / info.sqrt()
    } else {
        PRIOR_SE
    };

    ThetaEstimate {
        theta,
        se,
        method: EstimationMethod::Mle,
    }
}
