//! The character database: owns every character and runs story steps.
//!
//! A step is one path of actions performed by one character. Its mutations
//! may reach any character's attributes; the resulting memory vector is
//! stored in the acting character's memory bank.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::action::Action;
use crate::attribute::Attribute;
use crate::character::Character;
use crate::config::MemoryConfig;
use crate::error::{Result, StoryError};
use crate::memory::MemoryVector;
use crate::schema::Schema;
use crate::types::{ActionId, DimensionKey};

/// All characters in a story, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDb {
    characters: HashMap<String, Character>,
    #[serde(skip)]
    memory_config: MemoryConfig,
}

impl CharacterDb {
    /// Create an empty database with default memory settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database; characters spawned through it use `config`.
    #[must_use]
    pub fn with_memory_config(config: MemoryConfig) -> Self {
        Self {
            characters: HashMap::new(),
            memory_config: config,
        }
    }

    /// Register a character.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::DuplicateCharacter`] if the name is taken.
    pub fn add_character(&mut self, character: Character) -> Result<()> {
        if self.characters.contains_key(character.name()) {
            return Err(StoryError::DuplicateCharacter(character.name().to_string()));
        }
        self.characters.insert(character.name().to_string(), character);
        Ok(())
    }

    /// Create and register a character with every schema attribute.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::DuplicateCharacter`] or a schema error.
    pub fn spawn(&mut self, name: &str, schema: &Schema) -> Result<&mut Character> {
        if self.characters.contains_key(name) {
            return Err(StoryError::DuplicateCharacter(name.to_string()));
        }
        let character = Character::from_schema(name, schema, &self.memory_config)?;
        Ok(self.characters.entry(name.to_string()).or_insert(character))
    }

    /// Look up a character by name.
    #[must_use]
    pub fn character(&self, name: &str) -> Option<&Character> {
        self.characters.get(name)
    }

    /// Mutable access to a character, e.g. to grow its action tree.
    pub fn character_mut(&mut self, name: &str) -> Option<&mut Character> {
        self.characters.get_mut(name)
    }

    /// Whether no character is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Character names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.characters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a dimension key to the attribute it names.
    #[must_use]
    pub fn attribute(&self, key: &DimensionKey) -> Option<&Attribute> {
        self.character(key.character())?.attribute(key)
    }

    fn require_attribute(&self, key: &DimensionKey) -> Result<&Attribute> {
        self.attribute(key)
            .ok_or_else(|| StoryError::AttributeNotFound(key.clone()))
    }

    fn require_character(&self, name: &str) -> Result<&Character> {
        self.character(name)
            .ok_or_else(|| StoryError::CharacterNotFound(name.to_string()))
    }

    /// The first precondition of `action` that does not hold, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::AttributeNotFound`] if a precondition names a
    /// missing attribute, or [`StoryError::InvalidOperation`] on a kind
    /// mismatch.
    pub fn failing_precondition<'a>(&self, action: &'a Action) -> Result<Option<&'a DimensionKey>> {
        for precondition in action.preconditions() {
            let attribute = self.require_attribute(precondition.key())?;
            if !precondition.evaluate(attribute)? {
                return Ok(Some(precondition.key()));
            }
        }
        Ok(None)
    }

    /// Actions `actor` may take next: the tree's roots when `parent` is
    /// `None`, otherwise `parent`'s children. Only actions whose
    /// preconditions all hold are returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::CharacterNotFound`] or
    /// [`StoryError::ActionNotFound`] for unknown ids, plus precondition
    /// errors.
    pub fn eligible_actions(&self, actor: &str, parent: Option<ActionId>) -> Result<Vec<ActionId>> {
        let tree = self.require_character(actor)?.action_tree();
        let candidates = match parent {
            None => tree.roots(),
            Some(id) => tree.get(id).ok_or(StoryError::ActionNotFound(id))?.children(),
        };

        let mut eligible = Vec::with_capacity(candidates.len());
        for &id in candidates {
            let action = tree.get(id).ok_or(StoryError::ActionNotFound(id))?;
            if self.failing_precondition(action)?.is_none() {
                eligible.push(id);
            }
        }
        Ok(eligible)
    }

    /// Every complete path in `actor`'s tree whose actions all pass their
    /// preconditions against the current state. A failing action prunes
    /// its subtree.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::CharacterNotFound`], tree errors from
    /// [`ActionTree::paths_where`](crate::action::ActionTree::paths_where),
    /// or precondition errors.
    pub fn eligible_paths(&self, actor: &str) -> Result<Vec<Vec<ActionId>>> {
        self.require_character(actor)?
            .action_tree()
            .paths_where(|action| Ok(self.failing_precondition(action)?.is_none()))
    }

    /// Every complete path in `actor`'s tree, ignoring preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::CharacterNotFound`] or tree errors from
    /// [`ActionTree::all_paths`](crate::action::ActionTree::all_paths).
    pub fn all_paths(&self, actor: &str) -> Result<Vec<Vec<ActionId>>> {
        self.require_character(actor)?.action_tree().all_paths()
    }

    /// Perform every action along `path` as `actor`, as one story step.
    ///
    /// `path` must start at a root of the actor's tree and follow child
    /// links. Every precondition on the path is checked against the state
    /// before the step. The actions' mutations are then encoded and applied
    /// in path order, each against the value left by the mutations before
    /// it, into a single memory vector. That vector is labelled with
    /// `path`, appended to the actor's memory bank, and returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::EmptyPathSequence`], [`StoryError::CharacterNotFound`],
    /// [`StoryError::ActionNotFound`], [`StoryError::InvalidPath`],
    /// [`StoryError::PreconditionFailed`], [`StoryError::AttributeNotFound`]
    /// or [`StoryError::InvalidOperation`]. Nothing is mutated when an error
    /// is returned.
    pub fn perform(&mut self, actor: &str, path: &[ActionId]) -> Result<MemoryVector> {
        let actions: Vec<Action> = self
            .require_character(actor)?
            .action_tree()
            .resolve_path(path)?
            .into_iter()
            .cloned()
            .collect();

        for action in &actions {
            if let Some(key) = self.failing_precondition(action)? {
                return Err(StoryError::PreconditionFailed {
                    action: action.id(),
                    key: key.clone(),
                });
            }
        }

        let mut memory = MemoryVector::new();
        memory.set_path(path)?;
        let mut staged: HashMap<DimensionKey, Attribute> = HashMap::new();
        for action in &actions {
            for mutation in action.mutations() {
                let key = mutation.key();
                let attribute = match staged.entry(key.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(self.require_attribute(key)?.clone()),
                };
                let applied = memory
                    .encode(mutation, attribute)
                    .and_then(|_| attribute.apply(mutation));
                if let Err(e) = applied {
                    warn!(actor, action = %action.id(), key = %key, error = %e, "mutation rejected");
                    return Err(e);
                }
            }
        }

        for (key, attribute) in staged {
            if let Some(slot) = self
                .characters
                .get_mut(key.character())
                .and_then(|character| character.attribute_mut(&key))
            {
                *slot = attribute;
            }
        }

        let character = self
            .characters
            .get_mut(actor)
            .ok_or_else(|| StoryError::CharacterNotFound(actor.to_string()))?;
        character.remember(memory.clone());

        info!(
            actor,
            path = memory.path().unwrap_or("-"),
            actions = actions.len(),
            step = character.memory_bank().step_count(),
            magnitude = memory.length(),
            "step performed"
        );
        Ok(memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{IntegerOp, Mutation};
    use crate::precondition::{Comparison, Precondition};
    use crate::schema::SchemaClass;

    fn key(s: &str) -> DimensionKey {
        s.parse().expect("key")
    }

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_class(SchemaClass::integer("mood", ["anger", "joy"], 5, 0, 10).expect("class"));
        schema.add_class(SchemaClass::boolean("status", ["asleep"], false));
        schema
    }

    fn db() -> CharacterDb {
        let schema = schema();
        let mut db = CharacterDb::new();
        db.spawn("alice", &schema).expect("alice");
        let bob = db.spawn("bob", &schema).expect("bob");
        bob.add_action(
            Action::new(ActionId(1), "insult")
                .first()
                .with_mutation(Mutation::integer(key("alice:mood:anger"), IntegerOp::Add, 3).expect("m"))
                .with_child(ActionId(2)),
        );
        bob.add_action(
            Action::new(ActionId(2), "nap")
                .with_precondition(Precondition::integer(key("alice:mood:anger"), Comparison::GreaterThan, 7))
                .with_mutation(Mutation::boolean(key("bob:status:asleep"), true)),
        );
        db
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut db = db();
        assert!(matches!(
            db.add_character(Character::new("bob")),
            Err(StoryError::DuplicateCharacter(_))
        ));
        assert!(db.spawn("alice", &schema()).is_err());
        assert_eq!(db.names(), vec!["alice", "bob"]);
        assert!(!db.is_empty());
    }

    #[test]
    fn perform_mutates_target_and_records_actor_memory() {
        let mut db = db();
        let memory = db.perform("bob", &[ActionId(1)]).expect("perform");

        assert_eq!(memory.path(), Some("[1]"));
        assert!((memory.get(&key("alice:mood:anger")) - 0.3).abs() < 1e-12);
        assert_eq!(
            db.attribute(&key("alice:mood:anger")).and_then(Attribute::as_integer),
            Some(8)
        );
        let bob = db.character("bob").expect("bob");
        assert_eq!(bob.memory_bank().step_count(), 1);
        assert_eq!(db.character("alice").expect("alice").memory_bank().step_count(), 0);
    }

    #[test]
    fn eligibility_follows_preconditions() {
        let mut db = db();
        assert_eq!(db.eligible_actions("bob", None).expect("roots"), vec![ActionId(1)]);
        assert!(db.eligible_actions("bob", Some(ActionId(1))).expect("children").is_empty());

        db.perform("bob", &[ActionId(1)]).expect("perform");
        assert_eq!(
            db.eligible_actions("bob", Some(ActionId(1))).expect("children"),
            vec![ActionId(2)]
        );
        let memory = db.perform("bob", &[ActionId(1), ActionId(2)]).expect("perform");
        assert_eq!(memory.path(), Some("[1:2]"));
        assert_eq!(memory.get(&key("bob:status:asleep")), 1.0);
    }

    #[test]
    fn path_applies_every_action_into_one_memory() {
        let mut db = db();
        db.character_mut("alice")
            .expect("alice")
            .attribute_mut(&key("alice:mood:anger"))
            .expect("anger")
            .apply(&Mutation::integer(key("alice:mood:anger"), IntegerOp::Set, 6).expect("m"))
            .expect("apply");
        db.character_mut("bob").expect("bob").add_action(
            Action::new(ActionId(2), "nap")
                .with_precondition(Precondition::integer(key("alice:mood:anger"), Comparison::GreaterThan, 5))
                .with_mutation(Mutation::integer(key("alice:mood:anger"), IntegerOp::Add, 1).expect("m"))
                .with_mutation(Mutation::boolean(key("bob:status:asleep"), true)),
        );

        let memory = db.perform("bob", &[ActionId(1), ActionId(2)]).expect("perform");

        // insult: 6 -> 9 (0.3), nap: 9 -> 10 (0.1), both on one dimension.
        assert!((memory.get(&key("alice:mood:anger")) - 0.4).abs() < 1e-12);
        assert_eq!(memory.get(&key("bob:status:asleep")), 1.0);
        assert_eq!(
            db.attribute(&key("alice:mood:anger")).and_then(Attribute::as_integer),
            Some(10)
        );
        assert_eq!(
            db.attribute(&key("bob:status:asleep")).and_then(Attribute::as_boolean),
            Some(true)
        );
        assert_eq!(db.character("bob").expect("bob").memory_bank().step_count(), 1);
    }

    #[test]
    fn broken_chains_are_rejected() {
        let mut db = db();
        assert!(matches!(
            db.perform("bob", &[ActionId(42), ActionId(1)]),
            Err(StoryError::ActionNotFound(ActionId(42)))
        ));
        assert!(matches!(
            db.perform("bob", &[ActionId(2)]),
            Err(StoryError::InvalidPath(_))
        ));
        assert!(matches!(
            db.perform("bob", &[ActionId(1), ActionId(1)]),
            Err(StoryError::InvalidPath(_))
        ));
        assert!(db.character("bob").expect("bob").memory_bank().is_empty());
        assert_eq!(
            db.attribute(&key("alice:mood:anger")).and_then(Attribute::as_integer),
            Some(5)
        );
    }

    #[test]
    fn eligible_paths_prune_failing_actions() {
        let mut db = db();
        assert_eq!(
            db.all_paths("bob").expect("all"),
            vec![vec![ActionId(1), ActionId(2)]]
        );
        assert!(db.eligible_paths("bob").expect("eligible").is_empty());

        db.perform("bob", &[ActionId(1)]).expect("perform");
        assert_eq!(
            db.eligible_paths("bob").expect("eligible"),
            vec![vec![ActionId(1), ActionId(2)]]
        );
        assert!(db.all_paths("carol").is_err());
    }

    #[test]
    fn failed_precondition_changes_nothing() {
        let mut db = db();
        let err = db.perform("bob", &[ActionId(1), ActionId(2)]).expect_err("should fail");
        assert!(matches!(err, StoryError::PreconditionFailed { .. }));
        assert!(db.character("bob").expect("bob").memory_bank().is_empty());
    }

    #[test]
    fn invalid_mutation_is_atomic() {
        let mut db = db();
        let bob = db.character_mut("bob").expect("bob");
        bob.add_action(
            Action::new(ActionId(9), "broken")
                .first()
                .with_mutation(Mutation::integer(key("alice:mood:joy"), IntegerOp::Add, 2).expect("m"))
                .with_mutation(Mutation::integer(key("bob:status:asleep"), IntegerOp::Add, 1).expect("m")),
        );

        let err = db.perform("bob", &[ActionId(9)]).expect_err("should fail");
        assert!(matches!(err, StoryError::InvalidOperation { .. }));
        assert_eq!(
            db.attribute(&key("alice:mood:joy")).and_then(Attribute::as_integer),
            Some(5)
        );
        assert!(db.character("bob").expect("bob").memory_bank().is_empty());
    }

    #[test]
    fn unknown_ids() {
        let mut db = db();
        assert!(matches!(db.perform("bob", &[]), Err(StoryError::EmptyPathSequence)));
        assert!(matches!(
            db.perform("carol", &[ActionId(1)]),
            Err(StoryError::CharacterNotFound(_))
        ));
        assert!(matches!(
            db.perform("bob", &[ActionId(42)]),
            Err(StoryError::ActionNotFound(ActionId(42)))
        ));
        assert!(db.eligible_actions("bob", Some(ActionId(42))).is_err());
    }
}
