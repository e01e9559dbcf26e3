//! Shared numerical helpers for the Rasch model and its estimators.

pub const EPSILON: f64 = 1e-10;

/// Lower bound of the practical ability scale.
pub const THETA_MIN: f64 = -4.0;
/// Upper bound of the practical ability scale.
pub const THETA_MAX: f64 = 4.0;

/// Spacing of the EAP integration grid.
pub const EAP_GRID_STEP: f64 = 0.1;

/// Standard error reported before any response has been observed.
pub const PRIOR_SE: f64 = 4.0;

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

#[inline]
pub fn log_sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        -(-x).exp().ln_1p()
    } else {
        x - x.exp().ln_1p()
    }
}

#[inline]
pub fn clip(x: f64, min: f64, max: f64) -> f64 {
    x.max(min).min(max)
}

/// Whether `theta` sits on (or beyond) either end of the ability scale.
#[inline]
pub fn on_ability_bound(theta: f64) -> bool {
    theta <= THETA_MIN || theta >= THETA_MAX
}

#[inline]
pub fn logsumexp(arr: &[f64]) -> f64 {
    if arr.is_empty() {
        return f64::NEG_INFINITY;
    }
    let max_val = arr.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() {
        return max_val;
    }
    let sum: f64 = arr.iter().map(|x| (x - max_val).exp()).sum();
    max_val + sum.ln()
}

/// Points of the EAP grid, `THETA_MIN..=THETA_MAX` in `EAP_GRID_STEP` increments.
///
/// Points are computed by index rather than accumulated so the endpoints land
/// exactly on the bounds.
pub fn eap_grid() -> Vec<f64> {
    let n_points = ((THETA_MAX - THETA_MIN) / EAP_GRID_STEP).round() as usize + 1;
    (0..n_points)
        .map(|i| THETA_MIN + i as f64 * EAP_GRID_STEP)
        .collect()
}

/// Exponentiate and normalise a log posterior so it sums to one.
pub fn normalize_log_posterior(log_posterior: &[f64]) -> Vec<f64> {
    let log_norm = logsumexp(log_posterior);
    log_posterior
        .iter()
        .map(|&lp| (lp - log_norm).exp())
        .collect()
}

/// Posterior mean and posterior standard deviation over a set of nodes.
pub fn compute_eap_with_se(posterior: &[f64], nodes: &[f64]) -> (f64, f64) {
    let eap: f64 = posterior
        .iter()
        .zip(nodes.iter())
        .map(|(&p, &theta)| p * theta)
        .sum();

    let variance: f64 = posterior
        .iter()
        .zip(nodes.iter())
        .map(|(&p, &theta)| p * (theta - eap).powi(2))
        .sum();

    (eap, variance.max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_spans_bounds() {
        let grid = eap_grid();
        assert_eq!(grid.len(), 81);
        assert_eq!(grid[0], THETA_MIN);
        assert!((grid[80] - THETA_MAX).abs() < 1e-12);
        assert!((grid[40]).abs() < 1e-12);
    }

    #[test]
    fn ability_bound_detection() {
        assert!(on_ability_bound(THETA_MIN));
        assert!(on_ability_bound(THETA_MAX));
        assert!(on_ability_bound(clip(-1e12, THETA_MIN, THETA_MAX)));
        assert!(!on_ability_bound(3.999));
        assert!(!on_ability_bound(0.0));
    }

    #[test]
    fn sigmoid_is_symmetric() {
        for x in [-3.0, -0.5, 0.0, 1.2, 7.0] {
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-12);
        }
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn log_sigmoid_matches_ln_of_sigmoid() {
        for x in [-5.0, -1.0, 0.0, 2.0, 6.0] {
            assert!((log_sigmoid(x) - sigmoid(x).ln()).abs() < 1e-10);
        }
    }

    #[test]
    fn normalized_posterior_sums_to_one() {
        let posterior = normalize_log_posterior(&[-1000.0, -1001.0, -999.5]);
        let total: f64 = posterior.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn eap_of_point_mass_has_zero_spread() {
        let (mean, sd) = compute_eap_with_se(&[0.0, 1.0, 0.0], &[-1.0, 0.5, 1.0]);
        assert!((mean - 0.5).abs() < 1e-12);
        assert!(sd.abs() < 1e-12);
    }
}
