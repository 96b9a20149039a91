//! Attribute schema: which `(class, type)` attributes exist and how they
//! start.
//!
//! A [`SchemaClass`] groups several types that share one shape: either a
//! bounded integer with a default, or a boolean with a default. The
//! [`Schema`] is an owned registry of classes that stamps out
//! [`Attribute`]s for a character.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::attribute::{check_range, Attribute};
use crate::error::{Result, StoryError};
use crate::types::DimensionKey;

/// Shape and starting value shared by every type in a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassShape {
    /// Bounded integer.
    Integer {
        /// Starting value.
        default: i32,
        /// Inclusive lower bound.
        min: i32,
        /// Inclusive upper bound.
        max: i32,
    },
    /// Boolean flag.
    Boolean {
        /// Starting value.
        default: bool,
    },
}

/// A named attribute class (e.g. `mood` with types `happy`, `sad`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaClassRepr", into = "SchemaClassRepr")]
pub struct SchemaClass {
    name: String,
    types: BTreeSet<String>,
    shape: ClassShape,
}

#[derive(Clone, Serialize, Deserialize)]
struct SchemaClassRepr {
    name: String,
    types: BTreeSet<String>,
    shape: ClassShape,
}

impl TryFrom<SchemaClassRepr> for SchemaClass {
    type Error = StoryError;

    fn try_from(repr: SchemaClassRepr) -> Result<Self> {
        if let ClassShape::Integer { default, min, max } = repr.shape {
            check_range(default, min, max)?;
        }
        Ok(Self {
            name: repr.name,
            types: repr.types,
            shape: repr.shape,
        })
    }
}

impl From<SchemaClass> for SchemaClassRepr {
    fn from(class: SchemaClass) -> Self {
        Self {
            name: class.name,
            types: class.types,
            shape: class.shape,
        }
    }
}

impl SchemaClass {
    /// Create an integer class. Ranges are validated here so that a
    /// degenerate range never reaches the memory engine.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::DegenerateRange`] if `min >= max` and
    /// [`StoryError::OutOfRange`] if `default` is outside `[min, max]`.
    pub fn integer<I, S>(name: impl Into<String>, types: I, default: i32, min: i32, max: i32) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        check_range(default, min, max)?;
        Ok(Self {
            name: name.into(),
            types: types.into_iter().map(Into::into).collect(),
            shape: ClassShape::Integer { default, min, max },
        })
    }

    /// Create a boolean class.
    pub fn boolean<I, S>(name: impl Into<String>, types: I, default: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            types: types.into_iter().map(Into::into).collect(),
            shape: ClassShape::Boolean { default },
        }
    }

    /// Declare another type in this class. Returns `false` if it existed.
    pub fn add_type(&mut self, kind: impl Into<String>) -> bool {
        self.types.insert(kind.into())
    }

    /// Class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared types, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    /// Whether `kind` is declared in this class.
    #[must_use]
    pub fn has_type(&self, kind: &str) -> bool {
        self.types.contains(kind)
    }

    /// Shared shape of every type.
    #[must_use]
    pub fn shape(&self) -> ClassShape {
        self.shape
    }

    fn instantiate(&self, character: &str, kind: &str) -> Result<Attribute> {
        if !self.has_type(kind) {
            return Err(StoryError::UnknownType {
                class: self.name.clone(),
                kind: kind.to_string(),
            });
        }
        let key = DimensionKey::new(character, self.name.as_str(), kind)?;
        match self.shape {
            ClassShape::Integer { default, min, max } => Attribute::integer(key, default, min, max),
            ClassShape::Boolean { default } => Ok(Attribute::boolean(key, default)),
        }
    }
}

/// Registry of attribute classes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    classes: BTreeMap<String, SchemaClass>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, replacing any class with the same name.
    pub fn add_class(&mut self, class: SchemaClass) {
        if let Some(old) = self.classes.insert(class.name.clone(), class) {
            warn!(class = %old.name, "schema class replaced");
        }
    }

    /// Look up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&SchemaClass> {
        self.classes.get(name)
    }

    /// Whether `class` exists and declares `kind`.
    #[must_use]
    pub fn contains(&self, class: &str, kind: &str) -> bool {
        self.class(class).is_some_and(|c| c.has_type(kind))
    }

    /// Whether no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Build one attribute for `character` at its class default.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::UnknownClass`] or [`StoryError::UnknownType`].
    pub fn instantiate(&self, character: &str, class: &str, kind: &str) -> Result<Attribute> {
        self.class(class)
            .ok_or_else(|| StoryError::UnknownClass(class.to_string()))?
            .instantiate(character, kind)
    }

    /// Build every declared attribute for `character`.
    ///
    /// # Errors
    ///
    /// Propagates errors from attribute construction.
    pub fn instantiate_all(&self, character: &str) -> Result<Vec<Attribute>> {
        self.classes
            .values()
            .flat_map(|class| class.types().map(move |kind| class.instantiate(character, kind)))
            .collect()
    }
}
