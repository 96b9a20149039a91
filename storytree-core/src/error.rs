//! Error types for the StoryTree core library.

use thiserror::Error;

use crate::types::{ActionId, DimensionKey};

/// Top-level error type for all StoryTree operations.
#[derive(Error, Debug)]
pub enum StoryError {
    /// A mutation or precondition does not fit the attribute it targets
    /// (e.g. Add on a boolean, or a key naming a different attribute).
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// What was wrong with the operation.
        reason: String,
    },

    /// An integer range with `min >= max`, which makes percent change undefined.
    #[error("Degenerate range: min {min} must be strictly less than max {max}")]
    DegenerateRange {
        /// Lower bound as given.
        min: i32,
        /// Upper bound as given.
        max: i32,
    },

    /// An integer value outside its inclusive bounds.
    #[error("Value {value} is outside the range [{min}, {max}]")]
    OutOfRange {
        /// Offending value.
        value: i32,
        /// Inclusive lower bound.
        min: i32,
        /// Inclusive upper bound.
        max: i32,
    },

    /// Attempted to normalize a memory vector whose length is zero.
    #[error("Cannot normalize a zero-length memory vector")]
    ZeroLengthVector,

    /// A memory vector whose length is infinite or NaN.
    #[error("Memory vector length is not finite")]
    NonFiniteLength,

    /// `set_path` was called with no step identifiers.
    #[error("Cannot build a path label from an empty step sequence")]
    EmptyPathSequence,

    /// A dimension key segment is empty or contains the separator.
    #[error("Invalid dimension key: {0}")]
    InvalidKey(String),

    /// An action path is not a chain from a root through child links.
    #[error("Invalid action path: {0}")]
    InvalidPath(String),

    /// The schema has no class with this name.
    #[error("Unknown attribute class: {0}")]
    UnknownClass(String),

    /// The class exists but does not declare this type.
    #[error("Unknown attribute type '{kind}' in class '{class}'")]
    UnknownType {
        /// Class that was searched.
        class: String,
        /// Type that was missing.
        kind: String,
    },

    /// No attribute exists for this dimension key.
    #[error("Attribute not found: {0}")]
    AttributeNotFound(DimensionKey),

    /// No character with this name is registered.
    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    /// A character with this name is already registered.
    #[error("Character already exists: {0}")]
    DuplicateCharacter(String),

    /// The action tree has no action with this id.
    #[error("Action not found: {0}")]
    ActionNotFound(ActionId),

    /// An action was performed while one of its preconditions was false.
    #[error("Precondition on {key} failed for action {action}")]
    PreconditionFailed {
        /// The action being performed.
        action: ActionId,
        /// Attribute whose precondition did not hold.
        key: DimensionKey,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoryError {
    /// Shorthand for [`StoryError::InvalidOperation`].
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, StoryError>;
