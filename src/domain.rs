//! Per-domain ability from the subset of responses in each domain.

use std::collections::HashMap;

use crate::estimation::estimate_theta;
use crate::model::Response;

/// Shift applied to a lone response's difficulty to place its domain.
pub const SINGLE_RESPONSE_OFFSET: f64 = 0.5;

/// Group responses by domain and estimate an ability for each.
///
/// Domains with two or more responses get a full estimator run on their
/// subset. A domain with a single response is placed at
/// `difficulty + 0.5` when it was answered correctly and `difficulty - 0.5`
/// otherwise; this is a directional placeholder rather than an IRT estimate.
pub fn estimate_domain_thetas(responses: &[Response]) -> HashMap<String, f64> {
    let mut by_domain: HashMap<&str, Vec<Response>> = HashMap::new();
    for r in responses {
        by_domain
            .entry(r.domain_id.as_str())
            .or_default()
            .push(r.clone());
    }

    by_domain
        .into_iter()
        .map(|(domain, subset)| {
            let theta = match subset.as_slice() {
                [only] => single_response_theta(only),
                _ => estimate_theta(&subset).theta,
            };
            (domain.to_string(), theta)
        })
        .collect()
}

#[inline]
fn single_response_theta(response: &Response) -> f64 {
    if response.correct {
        response.difficulty + SINGLE_RESPONSE_OFFSET
    } else {
        response.difficulty - SINGLE_RESPONSE_OFFSET
    }
}
