//! Simulated placement sessions for calibration and evaluation.
//!
//! A simulated respondent with a fixed true ability answers each selected item
//! correctly with the Rasch probability at that ability. Batch runs are
//! parallel over (theta, replication) pairs and seeded per task, so results do
//! not depend on thread scheduling.

use ndarray::Array1;
use rand::prelude::*;
use rand_distr::StandardNormal;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use tracing::debug;

use crate::cat::{
    TerminationReason, create_initial_state, process_response, select_next_item_with_rng,
    termination_reason,
};
use crate::config::CatConfig;
use crate::likelihood::probability;
use crate::model::{IrtState, Item};

#[derive(Debug, Clone)]
pub struct SimulatedSession {
    pub state: IrtState,
    pub administered: Vec<String>,
    /// `None` when the session ended because the pool ran out.
    pub termination: Option<TerminationReason>,
}

/// Column-wise output of [`simulate_batch`], one row per (theta, replication).
#[derive(Debug, Clone)]
pub struct SimulationBatch {
    pub theta_est: Array1<f64>,
    pub se_est: Array1<f64>,
    pub n_items: Array1<usize>,
    pub true_theta: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct ConditionalMse {
    pub theta: Array1<f64>,
    pub bias: Array1<f64>,
    pub mse: Array1<f64>,
    pub avg_items: Array1<f64>,
}

/// Synthetic item bank with standard-normal difficulties, assigned to domains
/// round-robin.
pub fn generate_item_pool<R: Rng + ?Sized>(
    n_items: usize,
    domains: &[&str],
    rng: &mut R,
) -> Vec<Item> {
    if domains.is_empty() {
        return Vec::new();
    }
    (0..n_items)
        .map(|j| {
            let domain = domains[j % domains.len()];
            let difficulty: f64 = rng.sample(StandardNormal);
            Item::new(format!("{domain}-{j}"), domain, difficulty)
        })
        .collect()
}

/// Run one adaptive session to termination or pool exhaustion.
pub fn simulate_session<R: Rng + ?Sized>(
    true_theta: f64,
    pool: &[Item],
    config: &CatConfig,
    rng: &mut R,
) -> SimulatedSession {
    let mut available: Vec<Item> = pool.to_vec();
    let mut administered = Vec::with_capacity(config.max_items);
    let mut state = create_initial_state();

    let termination = loop {
        if let Some(reason) = termination_reason(&state, config) {
            break Some(reason);
        }

        let Some(item) = select_next_item_with_rng(&state, &available, config, rng) else {
            break None;
        };
        let item = item.clone();
        available.retain(|i| i.node_id != item.node_id);

        let correct = rng.random::<f64>() < probability(true_theta, item.difficulty);
        state = process_response(&state, &item, correct);
        administered.push(item.node_id);
    };

    SimulatedSession {
        state,
        administered,
        termination,
    }
}

/// Simulate `n_replications` sessions for each true theta in parallel.
pub fn simulate_batch(
    true_thetas: &[f64],
    pool: &[Item],
    config: &CatConfig,
    n_replications: usize,
    seed: u64,
) -> SimulationBatch {
    let tasks: Vec<(usize, usize)> = (0..true_thetas.len())
        .flat_map(|t| (0..n_replications).map(move |r| (t, r)))
        .collect();

    let results: Vec<(f64, f64, usize, f64)> = tasks
        .par_iter()
        .map(|&(theta_idx, rep)| {
            let task_seed = seed
                .wrapping_add(theta_idx as u64 * 1000)
                .wrapping_add(rep as u64);
            let mut rng = Pcg64::seed_from_u64(task_seed);

            let true_theta = true_thetas[theta_idx];
            let session = simulate_session(true_theta, pool, config, &mut rng);
            (
                session.state.theta,
                session.state.standard_error,
                session.administered.len(),
                true_theta,
            )
        })
        .collect();

    debug!(
        n_thetas = true_thetas.len(),
        n_replications,
        n_sessions = results.len(),
        "batch simulation complete"
    );

    SimulationBatch {
        theta_est: results.iter().map(|r| r.0).collect(),
        se_est: results.iter().map(|r| r.1).collect(),
        n_items: results.iter().map(|r| r.2).collect(),
        true_theta: results.iter().map(|r| r.3).collect(),
    }
}

/// Bias, mean squared error and average test length at each evaluation theta.
pub fn conditional_mse(
    eval_thetas: &[f64],
    pool: &[Item],
    config: &CatConfig,
    n_replications: usize,
    seed: u64,
) -> ConditionalMse {
    let stats: Vec<(f64, f64, f64)> = eval_thetas
        .par_iter()
        .enumerate()
        .map(|(t_idx, &true_theta)| {
            if n_replications == 0 {
                return (0.0, 0.0, 0.0);
            }
            let mut estimates = Vec::with_capacity(n_replications);
            let mut n_items_sum = 0.0;

            for rep in 0..n_replications {
                let task_seed = seed
                    .wrapping_add(t_idx as u64 * 10000)
                    .wrapping_add(rep as u64);
                let mut rng = Pcg64::seed_from_u64(task_seed);

                let session = simulate_session(true_theta, pool, config, &mut rng);
                estimates.push(session.state.theta);
                n_items_sum += session.administered.len() as f64;
            }

            let n = n_replications as f64;
            let mean_est: f64 = estimates.iter().sum::<f64>() / n;
            let bias = mean_est - true_theta;
            let mse: f64 = estimates
                .iter()
                .map(|&e| (e - true_theta).powi(2))
                .sum::<f64>()
                / n;

            (bias, mse, n_items_sum / n)
        })
        .collect();

    ConditionalMse {
        theta: Array1::from_vec(eval_thetas.to_vec()),
        bias: stats.iter().map(|s| s.0).collect(),
        mse: stats.iter().map(|s| s.1).collect(),
        avg_items: stats.iter().map(|s| s.2).collect(),
    }
}
