//! Preconditions: tests on an attribute that gate an action.
//!
//! An integer precondition reads as `attribute <comparison> threshold`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::attribute::{Attribute, AttributeValue};
use crate::error::{Result, StoryError};
use crate::types::DimensionKey;

/// Integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `attribute > threshold`
    GreaterThan,
    /// `attribute < threshold`
    LessThan,
    /// `attribute == threshold`
    Equals,
}

impl Comparison {
    /// Apply the comparison.
    #[must_use]
    pub fn holds(self, value: i32, threshold: i32) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::Equals => value == threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equals => "==",
        })
    }
}

impl FromStr for Comparison {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(Self::GreaterThan),
            "<" => Ok(Self::LessThan),
            "==" => Ok(Self::Equals),
            other => Err(StoryError::invalid(format!(
                "comparison '{other}' must be one of '>', '<' or '=='"
            ))),
        }
    }
}

/// What a precondition expects of its attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    /// Integer comparison against a threshold.
    Integer {
        /// How to compare.
        comparison: Comparison,
        /// Right-hand side.
        threshold: i32,
    },
    /// Boolean equality.
    Boolean(bool),
}

/// A test on one attribute of one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precondition {
    key: DimensionKey,
    expectation: Expectation,
}

impl Precondition {
    /// Integer precondition: `attribute <comparison> threshold`.
    #[must_use]
    pub fn integer(key: DimensionKey, comparison: Comparison, threshold: i32) -> Self {
        Self {
            key,
            expectation: Expectation::Integer {
                comparison,
                threshold,
            },
        }
    }

    /// Boolean precondition: `attribute == value`.
    #[must_use]
    pub fn boolean(key: DimensionKey, value: bool) -> Self {
        Self {
            key,
            expectation: Expectation::Boolean(value),
        }
    }

    /// Attribute being tested.
    #[must_use]
    pub fn key(&self) -> &DimensionKey {
        &self.key
    }

    /// What is expected.
    #[must_use]
    pub fn expectation(&self) -> Expectation {
        self.expectation
    }

    /// Test `attribute` against this precondition.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidOperation`] if the attribute has a
    /// different key or kind.
    pub fn evaluate(&self, attribute: &Attribute) -> Result<bool> {
        if attribute.key() != &self.key {
            return Err(StoryError::invalid(format!(
                "precondition on {} evaluated against {}",
                self.key,
                attribute.key()
            )));
        }
        match (self.expectation, attribute.value()) {
            (Expectation::Integer { comparison, threshold }, AttributeValue::Integer { value, .. }) => {
                Ok(comparison.holds(value, threshold))
            }
            (Expectation::Boolean(expected), AttributeValue::Boolean(value)) => Ok(expected == value),
            _ => Err(StoryError::invalid(format!(
                "precondition kind does not match attribute {}",
                self.key
            ))),
        }
    }
}
