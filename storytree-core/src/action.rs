//! Actions and the per-character action tree.
//!
//! An [`Action`] bundles the preconditions that must hold before it can
//! happen, the mutations it applies, and the ids of the actions that may
//! follow it. "First" actions are the roots a story can start from.
//!
//! A path is a chain of ids starting at a root where each id is a child of
//! the one before it. Paths that end at a leaf are complete.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::{Result, StoryError};
use crate::mutation::Mutation;
use crate::precondition::Precondition;
use crate::types::ActionId;

/// One node of an action tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    id: ActionId,
    name: String,
    first: bool,
    class: Option<String>,
    preconditions: Vec<Precondition>,
    mutations: Vec<Mutation>,
    children: Vec<ActionId>,
}

impl Action {
    /// Create an action with no preconditions, mutations or children.
    #[must_use]
    pub fn new(id: ActionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            first: false,
            class: None,
            preconditions: Vec::new(),
            mutations: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Mark as a root of the tree.
    #[must_use]
    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    /// Tag with an action class (e.g. `"dialogue"`).
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Add a gate.
    #[must_use]
    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Add an effect. Effects apply in insertion order.
    #[must_use]
    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Allow `child` to follow this action.
    #[must_use]
    pub fn with_child(mut self, child: ActionId) -> Self {
        self.children.push(child);
        self
    }

    /// Tree-unique id.
    #[must_use]
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Action class, if tagged.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Gates that must all hold.
    #[must_use]
    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    /// Effects in application order.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Ids that may follow this action.
    #[must_use]
    pub fn children(&self) -> &[ActionId] {
        &self.children
    }

    /// Whether the story may start with this action.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.first
    }

    /// Whether nothing can follow this action.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// All actions available to one character, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTree {
    roots: Vec<ActionId>,
    actions: HashMap<ActionId, Action>,
}

impl ActionTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an action, replacing any action with the same id.
    pub fn add_action(&mut self, action: Action) {
        let id = action.id;
        if action.first && !self.roots.contains(&id) {
            self.roots.push(id);
        } else if !action.first {
            self.roots.retain(|root| *root != id);
        }
        if self.actions.insert(id, action).is_some() {
            warn!(action = %id, "action id already present, replacing");
        }
    }

    /// Look up an action by id.
    #[must_use]
    pub fn get(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(&id)
    }

    /// Root action ids in the order they were added.
    #[must_use]
    pub fn roots(&self) -> &[ActionId] {
        &self.roots
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the tree holds no action.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Resolve `path` to its actions, checking that it starts at a root and
    /// follows child links.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::EmptyPathSequence`], [`StoryError::ActionNotFound`]
    /// for an unknown id, or [`StoryError::InvalidPath`] for a broken chain.
    pub fn resolve_path(&self, path: &[ActionId]) -> Result<Vec<&Action>> {
        let (&first, rest) = path.split_first().ok_or(StoryError::EmptyPathSequence)?;
        let root = self.get(first).ok_or(StoryError::ActionNotFound(first))?;
        if !root.first {
            return Err(StoryError::InvalidPath(format!("action {first} is not a root")));
        }
        let mut actions = Vec::with_capacity(path.len());
        actions.push(root);
        for &id in rest {
            let action = self.get(id).ok_or(StoryError::ActionNotFound(id))?;
            let parent = actions[actions.len() - 1];
            if !parent.children.contains(&id) {
                return Err(StoryError::InvalidPath(format!(
                    "action {id} does not follow action {}",
                    parent.id
                )));
            }
            actions.push(action);
        }
        Ok(actions)
    }

    /// Every complete path, roots in insertion order and children in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::ActionNotFound`] for a dangling child id and
    /// [`StoryError::InvalidPath`] if child links form a cycle.
    pub fn all_paths(&self) -> Result<Vec<Vec<ActionId>>> {
        self.paths_where(|_| Ok(true))
    }

    /// Complete paths made only of actions accepted by `keep`. A rejected
    /// action prunes its whole subtree.
    ///
    /// # Errors
    ///
    /// As [`ActionTree::all_paths`], plus any error `keep` returns.
    pub fn paths_where<F>(&self, mut keep: F) -> Result<Vec<Vec<ActionId>>>
    where
        F: FnMut(&Action) -> Result<bool>,
    {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        for &root in &self.roots {
            self.walk(root, &mut prefix, &mut keep, &mut paths)?;
        }
        Ok(paths)
    }

    fn walk<F>(
        &self,
        id: ActionId,
        prefix: &mut Vec<ActionId>,
        keep: &mut F,
        paths: &mut Vec<Vec<ActionId>>,
    ) -> Result<()>
    where
        F: FnMut(&Action) -> Result<bool>,
    {
        if prefix.contains(&id) {
            return Err(StoryError::InvalidPath(format!("action {id} is reachable from itself")));
        }
        let action = self.get(id).ok_or(StoryError::ActionNotFound(id))?;
        if !keep(action)? {
            return Ok(());
        }
        prefix.push(id);
        if action.is_leaf() {
            paths.push(prefix.clone());
        } else {
            for &child in &action.children {
                self.walk(child, prefix, keep, paths)?;
            }
        }
        prefix.pop();
        Ok(())
    }
}
