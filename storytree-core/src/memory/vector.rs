//! Memory vectors: one sparse snapshot of how much a step changed things.
//!
//! Dimensions are [`DimensionKey`]s; absent keys read as `0.0`. The cached
//! squared length is recomputed from every entry after each write, because
//! [`MemoryVector::encode`] accumulates into keys that may already exist.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::attribute::Attribute;
use crate::error::{Result, StoryError};
use crate::mutation::{Mutation, MutationValue};
use crate::types::{ActionId, DimensionKey};

/// Sparse vector over character attribute dimensions, labelled with the
/// path of actions that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "VectorRepr", into = "VectorRepr")]
pub struct MemoryVector {
    entries: HashMap<DimensionKey, f64>,
    squared_length: f64,
    path: Option<String>,
}

/// Wire form: the squared length is derived, so it is never stored.
#[derive(Clone, Serialize, Deserialize)]
struct VectorRepr {
    entries: HashMap<DimensionKey, f64>,
    #[serde(default)]
    path: Option<String>,
}

impl From<VectorRepr> for MemoryVector {
    fn from(repr: VectorRepr) -> Self {
        let mut vector = Self {
            entries: repr.entries,
            squared_length: 0.0,
            path: repr.path,
        };
        vector.refresh_length();
        vector
    }
}

impl From<MemoryVector> for VectorRepr {
    fn from(vector: MemoryVector) -> Self {
        Self {
            entries: vector.entries,
            path: vector.path,
        }
    }
}

impl MemoryVector {
    /// Create an empty vector with no path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the impact of `mutation` on `attribute` to the mutation's
    /// dimension and return that impact.
    ///
    /// `attribute` must hold its pre-mutation value; applying the mutation
    /// to the attribute is the caller's job. A boolean assignment that
    /// leaves the flag as it was writes no dimension at all.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidOperation`] if the mutation does not fit
    /// the attribute. The vector is unchanged in that case.
    pub fn encode(&mut self, mutation: &Mutation, attribute: &Attribute) -> Result<f64> {
        let impact = mutation.impact(attribute)?;
        let unchanged = matches!(
            mutation.value(),
            MutationValue::Boolean(target) if attribute.as_boolean() == Some(target)
        );
        if unchanged {
            return Ok(0.0);
        }
        *self.entries.entry(mutation.key().clone()).or_insert(0.0) += impact;
        self.refresh_length();
        Ok(impact)
    }

    /// Set a dimension to an explicit value, replacing what was there.
    pub fn encode_raw(&mut self, key: DimensionKey, value: f64) {
        self.entries.insert(key, value);
        self.refresh_length();
    }

    /// Set many dimensions at once, recomputing the length a single time.
    pub(crate) fn encode_raw_many(&mut self, values: impl IntoIterator<Item = (DimensionKey, f64)>) {
        self.entries.extend(values);
        self.refresh_length();
    }

    /// Label this vector with an ordered sequence of action ids,
    /// formatted as `"[id1:id2:...:idN]"`.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::EmptyPathSequence`] if `steps` is empty.
    pub fn set_path(&mut self, steps: &[ActionId]) -> Result<()> {
        if steps.is_empty() {
            return Err(StoryError::EmptyPathSequence);
        }
        let joined = steps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(":");
        self.path = Some(format!("[{joined}]"));
        Ok(())
    }

    /// Assign the path label verbatim.
    pub fn set_path_raw(&mut self, label: impl Into<String>) {
        self.path = Some(label.into());
    }

    /// The path label, if one has been set.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Value at `key`, or `0.0` if the dimension is absent.
    #[must_use]
    pub fn get(&self, key: &DimensionKey) -> f64 {
        self.entries.get(key).copied().unwrap_or(0.0)
    }

    /// Iterate over the present dimensions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&DimensionKey, f64)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Number of present dimensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no dimension is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of squares of all entries.
    #[must_use]
    pub fn squared_length(&self) -> f64 {
        self.squared_length
    }

    /// Euclidean length.
    ///
    /// Stays finite when the squared length overflows, as long as every
    /// entry is finite.
    #[must_use]
    pub fn length(&self) -> f64 {
        if self.squared_length.is_finite() {
            return self.squared_length.sqrt();
        }
        let scale = self.entries.values().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if scale == 0.0 || !scale.is_finite() {
            return self.squared_length.sqrt();
        }
        let scaled: f64 = self.entries.values().map(|v| (v / scale).powi(2)).sum();
        scale * scaled.sqrt()
    }

    /// A copy scaled to unit length, keeping the path.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::ZeroLengthVector`] when the length is zero and
    /// [`StoryError::NonFiniteLength`] when an entry is infinite or NaN.
    pub fn normalize(&self) -> Result<Self> {
        let length = self.length();
        if !length.is_finite() {
            return Err(StoryError::NonFiniteLength);
        }
        if length <= 0.0 {
            return Err(StoryError::ZeroLengthVector);
        }
        let mut normalized = Self {
            entries: HashMap::with_capacity(self.entries.len()),
            squared_length: 0.0,
            path: self.path.clone(),
        };
        normalized.encode_raw_many(self.entries.iter().map(|(k, v)| (k.clone(), v / length)));
        Ok(normalized)
    }

    /// Dot product; absent dimensions contribute nothing.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .entries
            .iter()
            .filter_map(|(k, v)| large.entries.get(k).map(|w| v * w))
            .sum()
    }

    /// Cosine of the angle between two vectors.
    ///
    /// Returns `0.0` if either vector has zero length.
    #[must_use]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        let (a, b) = (self.length(), other.length());
        if a <= 0.0 || b <= 0.0 || !a.is_finite() || !b.is_finite() {
            return 0.0;
        }
        self.dot(other) / a / b
    }

    /// Elementwise sum over the union of both vectors' dimensions.
    ///
    /// The result has no path; set one explicitly if needed.
    #[must_use]
    pub fn combine(a: &Self, b: &Self) -> Self {
        let mut entries = a.entries.clone();
        for (k, v) in &b.entries {
            *entries.entry(k.clone()).or_insert(0.0) += v;
        }
        let mut combined = Self {
            entries,
            squared_length: 0.0,
            path: None,
        };
        combined.refresh_length();
        combined
    }

    fn refresh_length(&mut self) {
        self.squared_length = self.entries.values().map(|v| v * v).sum();
    }
}
