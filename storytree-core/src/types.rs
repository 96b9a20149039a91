//! Core type definitions shared across the StoryTree engine.
//!
//! All types are serializable. [`DimensionKey`] serializes as its
//! `"character:class:type"` string so memory vectors are plain JSON maps.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoryError;

// ---------------------------------------------------------------------------
// Dimension Keys
// ---------------------------------------------------------------------------

/// Separator between the three segments of a [`DimensionKey`].
pub const KEY_SEPARATOR: char = ':';

/// Names one dimension of the memory space: an attribute `(class, type)` of
/// one character.
///
/// The same triple keys attributes, mutations, preconditions and the
/// entries of a [`MemoryVector`](crate::memory::MemoryVector). Segments are
/// non-empty and never contain `':'`, so the string form always parses back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DimensionKey {
    character: String,
    class: String,
    kind: String,
}

impl DimensionKey {
    /// Create a key from its three segments.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidKey`] if a segment is empty or contains
    /// [`KEY_SEPARATOR`].
    pub fn new(
        character: impl Into<String>,
        class: impl Into<String>,
        kind: impl Into<String>,
    ) -> Result<Self, StoryError> {
        let key = Self {
            character: character.into(),
            class: class.into(),
            kind: kind.into(),
        };
        for segment in [&key.character, &key.class, &key.kind] {
            if segment.is_empty() || segment.contains(KEY_SEPARATOR) {
                return Err(StoryError::InvalidKey(format!(
                    "segment '{segment}' of '{key}' must be non-empty and free of '{KEY_SEPARATOR}'"
                )));
            }
        }
        Ok(key)
    }

    /// The same `(class, type)` attribute on a different character.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidKey`] if `character` is not a valid segment.
    pub fn for_character(&self, character: impl Into<String>) -> Result<Self, StoryError> {
        Self::new(character, self.class.as_str(), self.kind.as_str())
    }

    /// Owning character.
    #[must_use]
    pub fn character(&self) -> &str {
        &self.character
    }

    /// Attribute class (e.g. `"mood"`).
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Attribute type within the class (e.g. `"anger"`).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.character, self.class, self.kind
        )
    }
}

impl FromStr for DimensionKey {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(KEY_SEPARATOR);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(cls), Some(kind), None) => Self::new(c, cls, kind),
            _ => Err(StoryError::InvalidKey(format!(
                "'{s}' must have the form character:class:type"
            ))),
        }
    }
}

impl From<DimensionKey> for String {
    fn from(key: DimensionKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for DimensionKey {
    type Error = StoryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Action Identity
// ---------------------------------------------------------------------------

/// Identifier of an action inside a character's action tree.
///
/// Sequences of these form the path label of a memory vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ActionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Similarity Score
// ---------------------------------------------------------------------------

/// Totally ordered similarity score used to rank memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimilarityScore(pub OrderedFloat<f64>);

impl SimilarityScore {
    /// Create a score from a raw f64.
    #[must_use]
    pub fn new(score: f64) -> Self {
        Self(OrderedFloat(score))
    }

    /// Get the raw score value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0.into_inner()
    }
}
