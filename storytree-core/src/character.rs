//! Characters: the owners of attributes, an action tree and a memory bank.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::action::{Action, ActionTree};
use crate::attribute::Attribute;
use crate::config::MemoryConfig;
use crate::error::{Result, StoryError};
use crate::memory::{MemoryBank, MemoryVector};
use crate::mutation::Mutation;
use crate::schema::Schema;
use crate::types::DimensionKey;

/// A story character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    name: String,
    attributes: BTreeMap<DimensionKey, Attribute>,
    memory_bank: MemoryBank,
    action_tree: ActionTree,
}

impl Character {
    /// Create a character with no attributes and an empty memory bank.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_memory_config(name, &MemoryConfig::default())
    }

    /// Create a character whose memory bank follows `config`.
    #[must_use]
    pub fn with_memory_config(name: impl Into<String>, config: &MemoryConfig) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            memory_bank: MemoryBank::from_config(config),
            action_tree: ActionTree::new(),
        }
    }

    /// Create a character holding every attribute the schema declares.
    ///
    /// # Errors
    ///
    /// Propagates schema instantiation errors.
    pub fn from_schema(name: impl Into<String>, schema: &Schema, config: &MemoryConfig) -> Result<Self> {
        let mut character = Self::with_memory_config(name, config);
        for attribute in schema.instantiate_all(&character.name)? {
            character.add_attribute(attribute)?;
        }
        Ok(character)
    }

    /// Character name; also the first segment of its dimension keys.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::InvalidOperation`] if the attribute's key names
    /// another character.
    pub fn add_attribute(&mut self, attribute: Attribute) -> Result<()> {
        if attribute.key().character() != self.name {
            return Err(StoryError::invalid(format!(
                "attribute {} cannot belong to character '{}'",
                attribute.key(),
                self.name
            )));
        }
        self.attributes.insert(attribute.key().clone(), attribute);
        Ok(())
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn attribute(&self, key: &DimensionKey) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    /// Mutable access to an attribute. Bounds still hold: values only
    /// change through [`Attribute::apply`].
    pub fn attribute_mut(&mut self, key: &DimensionKey) -> Option<&mut Attribute> {
        self.attributes.get_mut(key)
    }

    /// All attributes ordered by key.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Encode `mutation` into `memory` against the current value, then apply
    /// it. Returns the encoded impact.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::AttributeNotFound`] if the character lacks the
    /// attribute, or [`StoryError::InvalidOperation`] if the mutation does
    /// not fit it. Neither the attribute nor `memory` change on error.
    pub fn apply_mutation(&mut self, mutation: &Mutation, memory: &mut MemoryVector) -> Result<f64> {
        let attribute = self
            .attributes
            .get_mut(mutation.key())
            .ok_or_else(|| StoryError::AttributeNotFound(mutation.key().clone()))?;
        let impact = memory.encode(mutation, attribute)?;
        attribute.apply(mutation)?;
        Ok(impact)
    }

    /// This character's memories.
    #[must_use]
    pub fn memory_bank(&self) -> &MemoryBank {
        &self.memory_bank
    }

    /// Record a finished step's memory.
    pub fn remember(&mut self, memory: MemoryVector) {
        self.memory_bank.add_memory(memory);
    }

    /// Actions this character can take.
    #[must_use]
    pub fn action_tree(&self) -> &ActionTree {
        &self.action_tree
    }

    /// Mutable access to the action tree.
    pub fn action_tree_mut(&mut self) -> &mut ActionTree {
        &mut self.action_tree
    }

    /// Shorthand for `action_tree_mut().add_action(action)`.
    pub fn add_action(&mut self, action: Action) {
        self.action_tree.add_action(action);
    }
}
