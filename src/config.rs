//! Test-administration tuning.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Length and precision limits plus selection tuning for a placement test.
///
/// Invariants (checked by [`CatConfig::validate`]):
/// `min_items <= relaxed_min_items <= max_items` and
/// `se_precision_target <= se_relaxed_target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatConfig {
    /// No stop is considered before this many responses.
    pub min_items: usize,
    /// Hard cap on test length.
    pub max_items: usize,
    /// Length after which the looser SE target may end the test.
    pub relaxed_min_items: usize,
    pub se_precision_target: f64,
    pub se_relaxed_target: f64,
    /// Number of best-scoring items the next item is drawn from.
    pub top_k: usize,
    pub domain_coverage_weight: f64,
}

impl Default for CatConfig {
    fn default() -> Self {
        Self {
            min_items: 10,
            max_items: 30,
            relaxed_min_items: 20,
            se_precision_target: 0.3,
            se_relaxed_target: 0.5,
            top_k: 3,
            domain_coverage_weight: 0.3,
        }
    }
}

impl CatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::ZeroMaxItems);
        }
        if self.min_items > self.relaxed_min_items {
            return Err(ConfigError::MinExceedsRelaxed {
                min_items: self.min_items,
                relaxed_min_items: self.relaxed_min_items,
            });
        }
        if self.relaxed_min_items > self.max_items {
            return Err(ConfigError::RelaxedExceedsMax {
                relaxed_min_items: self.relaxed_min_items,
                max_items: self.max_items,
            });
        }
        for (name, value) in [
            ("se_precision_target", self.se_precision_target),
            ("se_relaxed_target", self.se_relaxed_target),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveTarget { name, value });
            }
        }
        if self.se_precision_target > self.se_relaxed_target {
            return Err(ConfigError::PrecisionTargets {
                precision: self.se_precision_target,
                relaxed: self.se_relaxed_target,
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::ZeroTopK);
        }
        if !self.domain_coverage_weight.is_finite() || self.domain_coverage_weight < 0.0 {
            return Err(ConfigError::NegativeCoverageWeight(
                self.domain_coverage_weight,
            ));
        }
        Ok(())
    }

    /// Parse a TOML document; omitted keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: CatConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
