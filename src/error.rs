//! Error types.
//!
//! The numerical core absorbs degenerate inputs instead of failing, so the
//! only fallible surface is building a [`CatConfig`](crate::config::CatConfig).

use thiserror::Error;

/// Reasons a test-administration configuration is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_items must be at least 1")]
    ZeroMaxItems,

    #[error("min_items ({min_items}) exceeds relaxed_min_items ({relaxed_min_items})")]
    MinExceedsRelaxed {
        min_items: usize,
        relaxed_min_items: usize,
    },

    #[error("relaxed_min_items ({relaxed_min_items}) exceeds max_items ({max_items})")]
    RelaxedExceedsMax {
        relaxed_min_items: usize,
        max_items: usize,
    },

    /// The primary precision target must be the tighter of the two.
    #[error("se_precision_target ({precision}) exceeds se_relaxed_target ({relaxed})")]
    PrecisionTargets { precision: f64, relaxed: f64 },

    #[error("{name} must be a positive finite number, got {value}")]
    NonPositiveTarget { name: &'static str, value: f64 },

    #[error("top_k must be at least 1")]
    ZeroTopK,

    #[error("domain_coverage_weight must be finite and non-negative, got {0}")]
    NegativeCoverageWeight(f64),

    #[error("invalid config document: {0}")]
    Parse(#[from] toml::de::Error),
}
