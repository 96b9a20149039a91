//! The memory bank: one character's step history plus a running total.
//!
//! Each appended memory is folded into the aggregate exactly once:
//!
//! ```text
//! total[k] = total[k] + memory[k] + recency_bonus · (step_count - 1)
//! ```
//!
//! The bonus grows with the step index, so later memories weigh more.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MemoryConfig;
use crate::error::{Result, StoryError};
use crate::memory::MemoryVector;
use crate::types::SimilarityScore;

/// Default per-step recency bonus.
pub const DEFAULT_RECENCY_BONUS: f64 = 0.1;

/// How a query is compared to stored memories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Raw dot product; favours large memories.
    Dot,
    /// Dot product of the normalized vectors.
    #[default]
    Cosine,
}

impl SimilarityMetric {
    /// Score `a` against `b`. Zero-length vectors score `0.0` under cosine.
    #[must_use]
    pub fn score(self, a: &MemoryVector, b: &MemoryVector) -> f64 {
        match self {
            Self::Dot => a.dot(b),
            Self::Cosine => a.cosine_similarity(b),
        }
    }
}

/// One ranked history entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityMatch {
    /// Index into [`MemoryBank::history`].
    pub index: usize,
    /// Similarity to the query.
    pub score: SimilarityScore,
}

/// Append-only history of a character's memories with a recency-weighted
/// aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BankRepr", into = "BankRepr")]
pub struct MemoryBank {
    history: Vec<MemoryVector>,
    step_count: usize,
    total: MemoryVector,
    recency_bonus: f64,
    ranking_metric: SimilarityMetric,
}

/// Wire form: the aggregate is rebuilt from history on load.
#[derive(Clone, Serialize, Deserialize)]
struct BankRepr {
    history: Vec<MemoryVector>,
    step_count: usize,
    recency_bonus: f64,
    #[serde(default)]
    ranking_metric: SimilarityMetric,
}

impl TryFrom<BankRepr> for MemoryBank {
    type Error = StoryError;

    fn try_from(repr: BankRepr) -> Result<Self> {
        if repr.step_count != repr.history.len() {
            return Err(StoryError::Serialization(format!(
                "memory bank records {} steps but holds {} memories",
                repr.step_count,
                repr.history.len()
            )));
        }
        let mut bank = Self::with_recency_bonus(repr.recency_bonus);
        bank.ranking_metric = repr.ranking_metric;
        for memory in repr.history {
            bank.add_memory(memory);
        }
        Ok(bank)
    }
}

impl From<MemoryBank> for BankRepr {
    fn from(bank: MemoryBank) -> Self {
        Self {
            history: bank.history,
            step_count: bank.step_count,
            recency_bonus: bank.recency_bonus,
            ranking_metric: bank.ranking_metric,
        }
    }
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::with_recency_bonus(DEFAULT_RECENCY_BONUS)
    }
}

impl MemoryBank {
    /// Create an empty bank with the default recency bonus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bank with a custom per-step recency bonus.
    #[must_use]
    pub fn with_recency_bonus(recency_bonus: f64) -> Self {
        Self {
            history: Vec::new(),
            step_count: 0,
            total: MemoryVector::new(),
            recency_bonus,
            ranking_metric: SimilarityMetric::default(),
        }
    }

    /// Create an empty bank from configuration.
    #[must_use]
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            ranking_metric: config.ranking_metric,
            ..Self::with_recency_bonus(config.recency_bonus)
        }
    }

    /// Append a step's memory and fold it into the aggregate.
    pub fn add_memory(&mut self, memory: MemoryVector) {
        self.history.push(memory);
        self.step_count += 1;

        let weight = self.recency_bonus * (self.step_count - 1) as f64;
        let latest = &self.history[self.history.len() - 1];
        let total = &self.total;
        let updates: Vec<_> = latest
            .iter()
            .map(|(key, value)| (key.clone(), total.get(key) + value + weight))
            .collect();
        self.total.encode_raw_many(updates);

        debug!(
            step = self.step_count,
            dimensions = latest.len(),
            path = latest.path().unwrap_or("-"),
            "memory appended"
        );
    }

    /// All memories in the order they were added.
    #[must_use]
    pub fn history(&self) -> &[MemoryVector] {
        &self.history
    }

    /// The recency-weighted aggregate of every memory.
    #[must_use]
    pub fn total(&self) -> &MemoryVector {
        &self.total
    }

    /// Number of memories added so far.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// The most recent memory.
    #[must_use]
    pub fn latest(&self) -> Option<&MemoryVector> {
        self.history.last()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The per-step recency bonus in effect.
    #[must_use]
    pub fn recency_bonus(&self) -> f64 {
        self.recency_bonus
    }

    /// The metric [`MemoryBank::rank`] uses.
    #[must_use]
    pub fn ranking_metric(&self) -> SimilarityMetric {
        self.ranking_metric
    }

    /// Rank history entries against `query` with the configured metric.
    #[must_use]
    pub fn rank(&self, query: &MemoryVector) -> Vec<SimilarityMatch> {
        self.rank_by_similarity(query, self.ranking_metric)
    }

    /// Rank history entries by similarity to `query`, best first.
    ///
    /// Equal scores put the later step first.
    #[must_use]
    pub fn rank_by_similarity(
        &self,
        query: &MemoryVector,
        metric: SimilarityMetric,
    ) -> Vec<SimilarityMatch> {
        let mut matches: Vec<SimilarityMatch> = self
            .history
            .iter()
            .enumerate()
            .map(|(index, memory)| SimilarityMatch {
                index,
                score: SimilarityScore::new(metric.score(query, memory)),
            })
            .collect();
        matches.sort_by(|a, b| b.score.cmp(&a.score).then(b.index.cmp(&a.index)));
        matches
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    /// Returns `StoryError::Serialization` on failure.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| StoryError::Serialization(e.to_string()))
    }

    /// Restore from JSON produced by [`MemoryBank::to_json`].
    ///
    /// # Errors
    /// Returns `StoryError::Serialization` if the JSON is malformed or its
    /// step count disagrees with its history.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StoryError::Serialization(e.to_string()))
    }
}
