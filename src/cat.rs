//! Computerized Adaptive Testing (CAT) session functions.
//!
//! A caller drives a session by threading an [`IrtState`] through
//! [`select_next_item`], [`process_response`] and [`should_terminate`], then
//! hands the final state to [`build_result`](crate::result::build_result).

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::CatConfig;
use crate::domain::estimate_domain_thetas;
use crate::estimation::estimate_theta;
use crate::likelihood::information;
use crate::model::{IrtState, Item, Response};

/// Scale applied to the coverage deficit before weighting, matching the
/// maximum information of a Rasch item.
const COVERAGE_SCALE: f64 = 0.25;

/// Why a session should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationReason {
    MaxItems,
    PrecisionReached,
    /// Looser SE target met after `relaxed_min_items` responses.
    RelaxedPrecisionReached,
}

pub fn create_initial_state() -> IrtState {
    IrtState::new()
}

/// Select the next item using the thread-local random source.
pub fn select_next_item<'a>(
    state: &IrtState,
    available: &'a [Item],
    config: &CatConfig,
) -> Option<&'a Item> {
    select_next_item_with_rng(state, available, config, &mut rand::rng())
}

/// Score every available item by information plus a domain coverage bonus and
/// draw uniformly among the `top_k` best.
///
/// Returns `None` when the pool is empty.
pub fn select_next_item_with_rng<'a, R: Rng + ?Sized>(
    state: &IrtState,
    available: &'a [Item],
    config: &CatConfig,
    rng: &mut R,
) -> Option<&'a Item> {
    if available.is_empty() {
        return None;
    }

    let bonus = coverage_bonuses(&state.responses, available, config.domain_coverage_weight);

    let mut scored: Vec<(f64, &'a Item)> = available
        .iter()
        .map(|item| {
            let domain_bonus = bonus.get(item.domain_id.as_str()).copied().unwrap_or(0.0);
            (information(state.theta, item.difficulty) + domain_bonus, item)
        })
        .collect();

    // Stable: equal scores keep pool order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let k = config.top_k.clamp(1, scored.len());
    let pick = rng.random_range(0..k);
    trace!(
        n_available = available.len(),
        k,
        pick,
        score = scored[pick].0,
        "selected item"
    );
    Some(scored[pick].1)
}

/// Coverage bonus per domain present in the available pool.
///
/// The expected count is the average number of responses per available
/// domain; a domain falling short of it earns a bonus proportional to the
/// relative deficit. No bonus applies before the first response.
fn coverage_bonuses<'a>(
    responses: &[Response],
    available: &'a [Item],
    weight: f64,
) -> HashMap<&'a str, f64> {
    let mut bonuses = HashMap::new();
    if responses.is_empty() {
        return bonuses;
    }

    let domains: HashSet<&'a str> = available.iter().map(|i| i.domain_id.as_str()).collect();
    let expected = responses.len() as f64 / domains.len() as f64;
    if expected <= 0.0 {
        return bonuses;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in responses {
        *counts.entry(r.domain_id.as_str()).or_insert(0) += 1;
    }

    for domain in domains {
        let actual = counts.get(domain).copied().unwrap_or(0) as f64;
        let deficit = ((expected - actual) / expected).max(0.0);
        bonuses.insert(domain, deficit * weight * COVERAGE_SCALE);
    }
    bonuses
}

/// Stop rule, evaluated in order:
///
/// 1. at least `max_items` responses: stop
/// 2. fewer than `min_items`: continue
/// 3. `se < se_precision_target`: stop
/// 4. at least `relaxed_min_items` and `se < se_relaxed_target`: stop
pub fn termination_reason(state: &IrtState, config: &CatConfig) -> Option<TerminationReason> {
    let n = state.n_responses();
    let se = state.standard_error;

    let reason = if n >= config.max_items {
        Some(TerminationReason::MaxItems)
    } else if n < config.min_items {
        None
    } else if se < config.se_precision_target {
        Some(TerminationReason::PrecisionReached)
    } else if n >= config.relaxed_min_items && se < config.se_relaxed_target {
        Some(TerminationReason::RelaxedPrecisionReached)
    } else {
        None
    };

    if let Some(reason) = reason {
        debug!(n_responses = n, se, ?reason, "termination criterion met");
    }
    reason
}

pub fn should_terminate(state: &IrtState, config: &CatConfig) -> bool {
    termination_reason(state, config).is_some()
}

/// Record a response and re-estimate from the full history.
///
/// The input state is left untouched.
pub fn process_response(state: &IrtState, item: &Item, correct: bool) -> IrtState {
    let mut responses = Vec::with_capacity(state.responses.len() + 1);
    responses.extend_from_slice(&state.responses);
    responses.push(Response::from_item(item, correct));

    let estimate = estimate_theta(&responses);
    let domain_thetas = estimate_domain_thetas(&responses);

    IrtState {
        theta: estimate.theta,
        standard_error: estimate.se,
        responses,
        domain_thetas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_pcg::Pcg64;

    fn state_with(n: usize, se: f64) -> IrtState {
        let responses = (0..n)
            .map(|i| Response {
                node_id: format!("n{i}"),
                domain_id: "d".into(),
                difficulty: 0.0,
                correct: i % 2 == 0,
            })
            .collect();
        IrtState {
            theta: 0.0,
            standard_error: se,
            responses,
            domain_thetas: HashMap::new(),
        }
    }

    #[test]
    fn empty_pool_yields_no_item() {
        let state = create_initial_state();
        assert!(select_next_item(&state, &[], &CatConfig::default()).is_none());
    }

    #[test]
    fn selection_returns_pool_member() {
        let pool = vec![
            Item::new("a", "x", -1.0),
            Item::new("b", "y", 0.2),
            Item::new("c", "z", 2.5),
        ];
        let state = create_initial_state();
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..50 {
            let item = select_next_item_with_rng(&state, &pool, &CatConfig::default(), &mut rng)
                .unwrap();
            assert!(pool.contains(item));
        }
    }

    #[test]
    fn single_item_pool_always_selected() {
        let pool = vec![Item::new("only", "x", 3.0)];
        let item = select_next_item(&create_initial_state(), &pool, &CatConfig::default());
        assert_eq!(item.map(|i| i.node_id.as_str()), Some("only"));
    }

    #[test]
    fn prefers_informative_items() {
        let pool = vec![
            Item::new("easy", "x", -2.0),
            Item::new("matched", "x", 0.0),
            Item::new("hard", "x", 2.0),
            Item::new("hardest", "x", 3.0),
        ];
        let state = create_initial_state();
        let config = CatConfig::default();
        let mut rng = Pcg64::seed_from_u64(42);

        let mut matched = 0;
        let mut hardest = 0;
        for _ in 0..100 {
            match select_next_item_with_rng(&state, &pool, &config, &mut rng)
                .unwrap()
                .node_id
                .as_str()
            {
                "matched" => matched += 1,
                "hardest" => hardest += 1,
                _ => {}
            }
        }
        assert!(matched > hardest, "matched={matched} hardest={hardest}");
    }

    #[test]
    fn top_one_is_deterministic_argmax() {
        let pool = vec![Item::new("far", "x", 2.0), Item::new("near", "x", 0.1)];
        let config = CatConfig {
            top_k: 1,
            ..CatConfig::default()
        };
        let item = select_next_item(&create_initial_state(), &pool, &config).unwrap();
        assert_eq!(item.node_id, "near");
    }

    #[test]
    fn coverage_bonus_favours_unseen_domain() {
        let mut state = state_with(4, 1.0);
        for r in &mut state.responses {
            r.domain_id = "seen".into();
        }
        let pool = vec![Item::new("s", "seen", 0.0), Item::new("u", "unseen", 0.0)];
        let bonuses = coverage_bonuses(&state.responses, &pool, 0.3);
        assert_eq!(bonuses["seen"], 0.0);
        assert!((bonuses["unseen"] - 0.3 * 0.25).abs() < 1e-12);

        let config = CatConfig {
            top_k: 1,
            ..CatConfig::default()
        };
        let item = select_next_item(&state, &pool, &config).unwrap();
        assert_eq!(item.node_id, "u");
    }

    #[test]
    fn coverage_bonus_scales_with_partial_deficit() {
        let mut state = state_with(4, 1.0);
        for (r, domain) in state.responses.iter_mut().zip(["a", "a", "a", "b"]) {
            r.domain_id = domain.into();
        }
        let pool = vec![
            Item::new("a1", "a", 0.0),
            Item::new("b1", "b", 0.0),
            Item::new("c1", "c", 0.0),
        ];
        let weight = 0.3;
        let bonuses = coverage_bonuses(&state.responses, &pool, weight);

        let expected = 4.0 / 3.0;
        assert_eq!(bonuses.len(), 3);
        assert_eq!(bonuses["a"], 0.0);
        assert_eq!(
            bonuses["b"],
            (expected - 1.0) / expected * weight * COVERAGE_SCALE
        );
        assert_eq!(
            bonuses["c"],
            (expected - 0.0) / expected * weight * COVERAGE_SCALE
        );
        assert!(bonuses["c"] > bonuses["b"] && bonuses["b"] > 0.0);
    }

    #[test]
    fn selection_accepts_trait_object_rng() {
        let pool = vec![Item::new("a", "x", 0.0), Item::new("b", "y", 1.0)];
        let mut rng: Box<dyn RngCore> = Box::new(Pcg64::seed_from_u64(3));
        let item = select_next_item_with_rng(
            &create_initial_state(),
            &pool,
            &CatConfig::default(),
            rng.as_mut(),
        )
        .unwrap();
        assert!(pool.contains(item));
    }

    #[test]
    fn no_coverage_bonus_before_first_response() {
        let pool = vec![Item::new("a", "x", 0.0), Item::new("b", "y", 0.0)];
        assert!(coverage_bonuses(&[], &pool, 1.0).is_empty());
    }

    #[test]
    fn max_items_always_stops() {
        let config = CatConfig::default();
        assert!(should_terminate(&state_with(30, 3.9), &config));
        assert_eq!(
            termination_reason(&state_with(31, 0.01), &config),
            Some(TerminationReason::MaxItems)
        );
    }

    #[test]
    fn below_min_items_never_stops() {
        let config = CatConfig::default();
        for n in 0..10 {
            assert!(!should_terminate(&state_with(n, 0.01), &config));
        }
    }

    #[test]
    fn precision_target_stops_after_min_items() {
        let config = CatConfig::default();
        assert_eq!(
            termination_reason(&state_with(10, 0.29), &config),
            Some(TerminationReason::PrecisionReached)
        );
        assert!(!should_terminate(&state_with(10, 0.3), &config));
    }

    #[test]
    fn relaxed_target_stops_after_relaxed_min_items() {
        let config = CatConfig::default();
        assert!(!should_terminate(&state_with(19, 0.45), &config));
        assert_eq!(
            termination_reason(&state_with(20, 0.45), &config),
            Some(TerminationReason::RelaxedPrecisionReached)
        );
        assert!(!should_terminate(&state_with(25, 0.5), &config));
    }

    #[test]
    fn process_response_is_pure_and_appends_one() {
        let item = Item::new("q1", "algebra", 0.3);
        let state = create_initial_state();

        let a = process_response(&state, &item, true);
        let b = process_response(&state, &item, true);
        assert_eq!(a.theta, b.theta);
        assert_eq!(a.standard_error, b.standard_error);
        assert_eq!(a.responses.len(), 1);
        assert!(state.responses.is_empty());

        let c = process_response(&a, &Item::new("q2", "geometry", -0.5), false);
        assert_eq!(c.responses.len(), 2);
        assert_eq!(c.responses[0], a.responses[0]);
        assert_eq!(c.domain_thetas.len(), 2);
        assert!((c.domain_thetas["algebra"] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn process_response_matches_full_reestimate() {
        let items = [
            Item::new("a", "x", -1.0),
            Item::new("b", "y", 0.0),
            Item::new("c", "x", 1.0),
            Item::new("d", "y", 0.5),
        ];
        let outcomes = [true, true, false, false];
        let mut state = create_initial_state();
        for (item, &correct) in items.iter().zip(outcomes.iter()) {
            state = process_response(&state, item, correct);
        }
        let est = estimate_theta(&state.responses);
        assert_eq!(state.theta, est.theta);
        assert_eq!(state.standard_error, est.se);
        assert!(state.standard_error > 0.0);
    }
}
