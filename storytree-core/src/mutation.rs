//! Mutation descriptors: "what an action does to an attribute".
//!
//! A [`Mutation`] names one attribute by its [`DimensionKey`] and carries
//! either an integer operation or a boolean assignment. Integer operations
//! are a closed enum; the legacy `"+"`, `"-"`, `"="` symbols are accepted
//! only through [`IntegerOp::from_str`](std::str::FromStr).
//!
//! The impact of a mutation is how far it moves the attribute, as a share
//! of the attribute's range:
//!
//! ```text
//! Add:       min(amount, max - old) / (max - min)
//! Subtract:  min(amount, old - min) / (max - min)
//! Set:       |old - amount|         / (max - min)    (unclamped)
//! Boolean:   0 if unchanged, 1 otherwise
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::attribute::{Attribute, AttributeValue};
use crate::error::{Result, StoryError};
use crate::types::DimensionKey;

/// Operation applied to an integer attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegerOp {
    /// Increase, clamped at `max`.
    Add,
    /// Decrease, clamped at `min`.
    Subtract,
    /// Assign directly.
    Set,
}

impl IntegerOp {
    /// The legacy single-character symbol for this operation.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Set => "=",
        }
    }
}

impl fmt::Display for IntegerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for IntegerOp {
    type Err = StoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" => Ok(Self::Add),
            "-" => Ok(Self::Subtract),
            "=" => Ok(Self::Set),
            other => Err(StoryError::invalid(format!(
                "mutation operation '{other}' must be one of '+', '-' or '='"
            ))),
        }
    }
}

/// Payload of a mutation, matching the kind of attribute it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationValue {
    /// Integer operation with its operand.
    Integer {
        /// What to do.
        op: IntegerOp,
        /// Operand; never negative for Add/Subtract.
        amount: i32,
    },
    /// Boolean assignment.
    Boolean(bool),
}

/// A described change to one attribute of one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MutationRepr", into = "MutationRepr")]
pub struct Mutation {
    key: DimensionKey,
    value: MutationValue,
}

/// Wire form: operands are re-checked on load.
#[derive(Clone, Serialize, Deserialize)]
struct MutationRepr {
    key: DimensionKey,
    value: MutationValue,
}

impl TryFrom<MutationRepr> for Mutation {
    type Error = StoryError;

    fn try_from(repr: MutationRepr) -> Result<Self> {
        match repr.value {
            MutationValue::Integer { op, amount } => Self::integer(repr.key, op, amount),
            MutationValue::Boolean(value) => Ok(Self::boolean(repr.key, value)),
        }
    }
}

impl From<Mutation> for MutationRepr {
    fn from(mutation: Mutation) -> Self {
        Self {
            key: mutation.key,
            value: mutation.value,
        }
    }
}

impl Mutation {
    /// Create an integer mutation.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidOperation`] if `amount` is negative for
    /// Add or Subtract (use the opposite operation instead).
    pub fn integer(key: DimensionKey, op: IntegerOp, amount: i32) -> Result<Self> {
        if amount < 0 && op != IntegerOp::Set {
            return Err(StoryError::invalid(format!(
                "{op} on {key} needs a non-negative amount, got {amount}"
            )));
        }
        Ok(Self {
            key,
            value: MutationValue::Integer { op, amount },
        })
    }

    /// Create a boolean mutation (always an assignment).
    #[must_use]
    pub fn boolean(key: DimensionKey, value: bool) -> Self {
        Self {
            key,
            value: MutationValue::Boolean(value),
        }
    }

    /// Dimension this mutation targets.
    #[must_use]
    pub fn key(&self) -> &DimensionKey {
        &self.key
    }

    /// The operation and operand.
    #[must_use]
    pub fn value(&self) -> MutationValue {
        self.value
    }

    /// Check that this mutation can be applied to `attribute`.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidOperation`] if the keys differ, the
    /// value kinds differ, or the attribute has a degenerate range.
    pub fn check_target(&self, attribute: &Attribute) -> Result<()> {
        if attribute.key() != &self.key {
            return Err(StoryError::invalid(format!(
                "mutation for {} applied to attribute {}",
                self.key,
                attribute.key()
            )));
        }
        match (self.value, attribute.value()) {
            (MutationValue::Boolean(_), AttributeValue::Boolean(_)) => Ok(()),
            (MutationValue::Integer { .. }, AttributeValue::Integer { min, max, .. }) => {
                if min >= max {
                    Err(StoryError::invalid(format!(
                        "attribute {} has degenerate range [{min}, {max}]",
                        self.key
                    )))
                } else {
                    Ok(())
                }
            }
            (MutationValue::Integer { op, .. }, AttributeValue::Boolean(_)) => {
                Err(StoryError::invalid(format!(
                    "'{op}' is not valid on boolean attribute {}",
                    self.key
                )))
            }
            (MutationValue::Boolean(_), AttributeValue::Integer { .. }) => {
                Err(StoryError::invalid(format!(
                    "boolean assignment is not valid on integer attribute {}",
                    self.key
                )))
            }
        }
    }

    /// Magnitude of the change this mutation would make to `attribute`,
    /// computed against its current (pre-mutation) value.
    ///
    /// # Errors
    ///
    /// See [`Mutation::check_target`].
    pub fn impact(&self, attribute: &Attribute) -> Result<f64> {
        self.check_target(attribute)?;
        let impact = match (self.value, attribute.value()) {
            (MutationValue::Boolean(target), AttributeValue::Boolean(current)) => {
                if target == current { 0.0 } else { 1.0 }
            }
            (MutationValue::Integer { op, amount }, AttributeValue::Integer { value, min, max }) => {
                let (old, amount) = (i64::from(value), i64::from(amount));
                let (min, max) = (i64::from(min), i64::from(max));
                let actual_change = match op {
                    IntegerOp::Add => amount.min(max - old),
                    IntegerOp::Subtract => amount.min(old - min),
                    IntegerOp::Set => (old - amount).abs(),
                };
                actual_change as f64 / (max - min) as f64
            }
            // check_target rejected every other pairing.
            _ => return Err(StoryError::invalid("mismatched mutation kind")),
        };
        Ok(impact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anger() -> DimensionKey {
        DimensionKey::new("bob", "mood", "anger").expect("key")
    }

    fn anger_at(value: i32) -> Attribute {
        Attribute::integer(anger(), value, 0, 10).expect("valid attribute")
    }

    #[test]
    fn add_within_range() {
        let m = Mutation::integer(anger(), IntegerOp::Add, 3).expect("mutation");
        let impact = m.impact(&anger_at(5)).expect("impact");
        assert!((impact - 0.3).abs() < 1e-12);
    }

    #[test]
    fn add_is_clamped_at_max() {
        let m = Mutation::integer(anger(), IntegerOp::Add, 8).expect("mutation");
        let impact = m.impact(&anger_at(5)).expect("impact");
        assert!((impact - 0.5).abs() < 1e-12);
    }

    #[test]
    fn subtract_is_clamped_at_min() {
        let m = Mutation::integer(anger(), IntegerOp::Subtract, 9).expect("mutation");
        let impact = m.impact(&anger_at(2)).expect("impact");
        assert!((impact - 0.2).abs() < 1e-12);
    }

    #[test]
    fn set_reports_unclamped_distance() {
        let m = Mutation::integer(anger(), IntegerOp::Set, 1).expect("mutation");
        assert!((m.impact(&anger_at(5)).expect("impact") - 0.4).abs() < 1e-12);

        let far = Mutation::integer(anger(), IntegerOp::Set, 25).expect("mutation");
        assert!((far.impact(&anger_at(5)).expect("impact") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn boolean_impact_is_binary() {
        let key = DimensionKey::new("bob", "status", "asleep").expect("key");
        let attr = Attribute::boolean(key.clone(), false);
        assert_eq!(Mutation::boolean(key.clone(), false).impact(&attr).expect("impact"), 0.0);
        assert_eq!(Mutation::boolean(key, true).impact(&attr).expect("impact"), 1.0);
    }

    #[test]
    fn add_on_boolean_is_invalid() {
        let key = DimensionKey::new("bob", "status", "asleep").expect("key");
        let attr = Attribute::boolean(key.clone(), false);
        let m = Mutation::integer(key, IntegerOp::Add, 1).expect("mutation");
        assert!(matches!(m.impact(&attr), Err(StoryError::InvalidOperation { .. })));
    }

    #[test]
    fn mismatched_key_is_invalid() {
        let other = DimensionKey::new("alice", "mood", "anger").expect("key");
        let m = Mutation::integer(other, IntegerOp::Add, 1).expect("mutation");
        assert!(matches!(m.impact(&anger_at(5)), Err(StoryError::InvalidOperation { .. })));
    }

    #[test]
    fn negative_add_is_rejected() {
        assert!(Mutation::integer(anger(), IntegerOp::Add, -1).is_err());
        assert!(Mutation::integer(anger(), IntegerOp::Subtract, -1).is_err());
        assert!(Mutation::integer(anger(), IntegerOp::Set, -1).is_ok());
    }

    #[test]
    fn json_with_negative_add_is_rejected() {
        let json = r#"{"key":"bob:mood:anger","value":{"Integer":{"op":"Add","amount":-4}}}"#;
        assert!(serde_json::from_str::<Mutation>(json).is_err());

        let m = Mutation::integer(anger(), IntegerOp::Add, 4).expect("mutation");
        let back: Mutation =
            serde_json::from_str(&serde_json::to_string(&m).expect("serialize")).expect("deserialize");
        assert_eq!(back, m);
    }

    #[test]
    fn legacy_symbols_parse() {
        assert_eq!("+".parse::<IntegerOp>().expect("op"), IntegerOp::Add);
        assert_eq!("-".parse::<IntegerOp>().expect("op"), IntegerOp::Subtract);
        assert_eq!("=".parse::<IntegerOp>().expect("op"), IntegerOp::Set);
        assert!("*".parse::<IntegerOp>().is_err());
        assert_eq!(IntegerOp::Subtract.to_string(), "-");
    }
}
