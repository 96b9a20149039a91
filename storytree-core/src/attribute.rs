//! Attribute values: bounded integers and booleans owned by a character.
//!
//! Integer attributes keep `min <= value <= max` at all times: the
//! constructor rejects out-of-range values and every mutation clamps.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};
use crate::mutation::{IntegerOp, Mutation, MutationValue};
use crate::types::DimensionKey;

/// Current value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Bounded integer with inclusive bounds.
    Integer {
        /// Current value.
        value: i32,
        /// Inclusive lower bound.
        min: i32,
        /// Inclusive upper bound.
        max: i32,
    },
    /// Unbounded boolean flag.
    Boolean(bool),
}

/// One `(class, type)` property of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AttributeRepr", into = "AttributeRepr")]
pub struct Attribute {
    key: DimensionKey,
    value: AttributeValue,
}

/// Wire form: integer bounds are re-checked on load.
#[derive(Clone, Serialize, Deserialize)]
struct AttributeRepr {
    key: DimensionKey,
    value: AttributeValue,
}

impl TryFrom<AttributeRepr> for Attribute {
    type Error = StoryError;

    fn try_from(repr: AttributeRepr) -> Result<Self> {
        match repr.value {
            AttributeValue::Integer { value, min, max } => Self::integer(repr.key, value, min, max),
            AttributeValue::Boolean(value) => Ok(Self::boolean(repr.key, value)),
        }
    }
}

impl From<Attribute> for AttributeRepr {
    fn from(attribute: Attribute) -> Self {
        Self {
            key: attribute.key,
            value: attribute.value,
        }
    }
}

impl Attribute {
    /// Create an integer attribute.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::DegenerateRange`] if `min >= max` and
    /// [`StoryError::OutOfRange`] if `value` lies outside `[min, max]`.
    pub fn integer(key: DimensionKey, value: i32, min: i32, max: i32) -> Result<Self> {
        check_range(value, min, max)?;
        Ok(Self {
            key,
            value: AttributeValue::Integer { value, min, max },
        })
    }

    /// Create a boolean attribute.
    #[must_use]
    pub fn boolean(key: DimensionKey, value: bool) -> Self {
        Self {
            key,
            value: AttributeValue::Boolean(value),
        }
    }

    /// Dimension this attribute occupies.
    #[must_use]
    pub fn key(&self) -> &DimensionKey {
        &self.key
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> AttributeValue {
        self.value
    }

    /// Current integer value, if this is an integer attribute.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match self.value {
            AttributeValue::Integer { value, .. } => Some(value),
            AttributeValue::Boolean(_) => None,
        }
    }

    /// Current boolean value, if this is a boolean attribute.
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self.value {
            AttributeValue::Boolean(value) => Some(value),
            AttributeValue::Integer { .. } => None,
        }
    }

    /// Apply a mutation in place, clamping integers to their bounds.
    ///
    /// Nothing is changed when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidOperation`] if the mutation targets a
    /// different key or a different kind of value.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<()> {
        mutation.check_target(self)?;
        match (&mut self.value, mutation.value()) {
            (AttributeValue::Boolean(current), MutationValue::Boolean(target)) => {
                *current = target;
            }
            (AttributeValue::Integer { value, min, max }, MutationValue::Integer { op, amount }) => {
                let (old, amount) = (i64::from(*value), i64::from(amount));
                let next = match op {
                    IntegerOp::Add => old + amount,
                    IntegerOp::Subtract => old - amount,
                    IntegerOp::Set => amount,
                };
                let clamped = next.clamp(i64::from(*min), i64::from(*max));
                // Bounds are i32, so the clamped value always fits.
                *value = i32::try_from(clamped).unwrap_or(*max);
            }
            _ => return Err(StoryError::invalid("mismatched mutation kind")),
        }
        Ok(())
    }
}

/// Validate an integer range and a value inside it.
pub(crate) fn check_range(value: i32, min: i32, max: i32) -> Result<()> {
    if min >= max {
        return Err(StoryError::DegenerateRange { min, max });
    }
    if !(min..=max).contains(&value) {
        return Err(StoryError::OutOfRange { value, min, max });
    }
    Ok(())
}
