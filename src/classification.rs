//! Node classification and spaced-repetition bootstrap.
//!
//! Each content node is bucketed by the predicted probability that the
//! learner answers it correctly, and each bucket maps to a starting schedule
//! so already-known material is pushed out while weak material is due now.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::likelihood::probability;
use crate::model::{Classification, ClassificationResult, Item, SrsState};

pub const MASTERED_THRESHOLD: f64 = 0.85;
pub const PARTIAL_THRESHOLD: f64 = 0.60;
pub const WEAK_THRESHOLD: f64 = 0.30;

/// Bucket a probability; each lower bound is inclusive.
pub fn classify(probability: f64) -> Classification {
    if probability >= MASTERED_THRESHOLD {
        Classification::Mastered
    } else if probability >= PARTIAL_THRESHOLD {
        Classification::Partial
    } else if probability >= WEAK_THRESHOLD {
        Classification::Weak
    } else {
        Classification::Unknown
    }
}

/// Starting scheduler state for a classification.
///
/// | class    | reps | interval | easiness | due        |
/// |----------|------|----------|----------|------------|
/// | mastered | 3    | 30       | 2.5      | now + 30d  |
/// | partial  | 1    | 3        | 2.3      | now + 3d   |
/// | weak     | 0    | 1        | 2.0      | now        |
/// | unknown  | 0    | 0        | 2.5      | now        |
pub fn classification_to_state(classification: Classification, now: DateTime<Utc>) -> SrsState {
    let (repetitions, interval, easiness, due_date) = match classification {
        Classification::Mastered => (3, 30, 2.5, now + Duration::days(30)),
        Classification::Partial => (1, 3, 2.3, now + Duration::days(3)),
        Classification::Weak => (0, 1, 2.0, now),
        Classification::Unknown => (0, 0, 2.5, now),
    };
    SrsState {
        repetitions,
        interval,
        easiness,
        due_date,
    }
}

/// Classify every item in the pool, administered or not.
///
/// An item is evaluated at its domain's ability when one is known and at the
/// global ability otherwise.
pub fn classify_nodes(
    global_theta: f64,
    domain_thetas: &HashMap<String, f64>,
    items: &[Item],
    now: DateTime<Utc>,
) -> Vec<ClassificationResult> {
    items
        .iter()
        .map(|item| {
            let theta = domain_thetas
                .get(&item.domain_id)
                .copied()
                .unwrap_or(global_theta);
            let p = probability(theta, item.difficulty);
            let classification = classify(p);
            ClassificationResult {
                node_id: item.node_id.clone(),
                domain_id: item.domain_id.clone(),
                classification,
                probability: p,
                initial_state: classification_to_state(classification, now),
            }
        })
        .collect()
}
