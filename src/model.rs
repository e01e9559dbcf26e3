//! Value types shared across the placement engine.
//!
//! Every type here is an owned, immutable-by-convention value. State
//! transitions build new values instead of mutating existing ones, and all
//! types serialize with camelCase field names so callers can persist them
//! directly.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::PRIOR_SE;

/// A calibrated question with a Rasch difficulty on the ability scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub node_id: String,
    pub domain_id: String,
    pub difficulty: f64,
}

impl Item {
    pub fn new(node_id: impl Into<String>, domain_id: impl Into<String>, difficulty: f64) -> Self {
        Self {
            node_id: node_id.into(),
            domain_id: domain_id.into(),
            difficulty,
        }
    }
}

/// One administered item together with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub node_id: String,
    pub domain_id: String,
    pub difficulty: f64,
    pub correct: bool,
}

impl Response {
    pub fn from_item(item: &Item, correct: bool) -> Self {
        Self {
            node_id: item.node_id.clone(),
            domain_id: item.domain_id.clone(),
            difficulty: item.difficulty,
            correct,
        }
    }
}

/// Snapshot of a single adaptive test session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrtState {
    pub theta: f64,
    pub standard_error: f64,
    pub responses: Vec<Response>,
    pub domain_thetas: HashMap<String, f64>,
}

impl IrtState {
    /// Diffuse starting state: ability 0 with maximal uncertainty.
    pub fn new() -> Self {
        Self {
            theta: 0.0,
            standard_error: PRIOR_SE,
            responses: Vec::new(),
            domain_thetas: HashMap::new(),
        }
    }

    pub fn n_responses(&self) -> usize {
        self.responses.len()
    }
}

impl Default for IrtState {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse mastery bucket derived from the predicted probability of success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Mastered,
    Partial,
    Weak,
    Unknown,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Mastered => "mastered",
            Classification::Partial => "partial",
            Classification::Weak => "weak",
            Classification::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial scheduling record handed to the spaced-repetition store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsState {
    pub repetitions: u32,
    /// Review interval in days.
    pub interval: u32,
    pub easiness: f64,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub node_id: String,
    pub domain_id: String,
    pub classification: Classification,
    pub probability: f64,
    pub initial_state: SrsState,
}

/// Final artifact of a placement session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResult {
    pub global_theta: f64,
    pub domain_thetas: BTreeMap<String, f64>,
    pub node_classifications: Vec<ClassificationResult>,
}
