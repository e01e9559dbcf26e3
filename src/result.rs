//! Final placement result assembly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::classification::classify_nodes;
use crate::model::{Classification, IrtState, Item, PlacementResult};

/// Package a finished session into a [`PlacementResult`], classifying the
/// full item pool.
pub fn build_result(state: &IrtState, all_items: &[Item], now: DateTime<Utc>) -> PlacementResult {
    let domain_thetas: BTreeMap<String, f64> = state
        .domain_thetas
        .iter()
        .map(|(domain, &theta)| (domain.clone(), theta))
        .collect();

    let node_classifications = classify_nodes(state.theta, &state.domain_thetas, all_items, now);

    let count = |c: Classification| {
        node_classifications
            .iter()
            .filter(|r| r.classification == c)
            .count()
    };
    debug!(
        global_theta = state.theta,
        se = state.standard_error,
        n_responses = state.responses.len(),
        n_domains = domain_thetas.len(),
        mastered = count(Classification::Mastered),
        partial = count(Classification::Partial),
        weak = count(Classification::Weak),
        unknown = count(Classification::Unknown),
        "assembled placement result"
    );

    PlacementResult {
        global_theta: state.theta,
        domain_thetas,
        node_classifications,
    }
}
