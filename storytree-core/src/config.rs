//! Configuration for the StoryTree engine.
//!
//! Maps directly to `storytree.toml`. Every field has a default, so an
//! empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};
use crate::memory::{SimilarityMetric, DEFAULT_RECENCY_BONUS};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory bank aggregation and ranking.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl StoryConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `StoryError::Config` if the TOML is invalid or fails
    /// [`StoryConfig::validate`].
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| StoryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check values that deserialize fine but make no sense.
    ///
    /// # Errors
    /// Returns `StoryError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let bonus = self.memory.recency_bonus;
        if !bonus.is_finite() || bonus < 0.0 {
            return Err(StoryError::Config(format!(
                "memory.recency_bonus must be a non-negative number, got {bonus}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level for the host's subscriber: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Memory bank settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Bonus added per elapsed step when a memory is folded into the
    /// aggregate: step `n` (1-based) adds `recency_bonus * (n - 1)`.
    #[serde(default = "default_recency_bonus")]
    pub recency_bonus: f64,
    /// How history entries are compared to a query when ranking.
    #[serde(default)]
    pub ranking_metric: SimilarityMetric,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            recency_bonus: default_recency_bonus(),
            ranking_metric: SimilarityMetric::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_recency_bonus() -> f64 { DEFAULT_RECENCY_BONUS }
