//! # StoryTree Core Library
//!
//! Models a narrative character's evolving state as a point in a sparse,
//! high-dimensional space so that two story moments, or two candidate
//! branches, can be compared.
//!
//! Every dimension is an attribute of one character, named by a
//! `(character, class, type)` [`DimensionKey`]. A story step works like this:
//!
//! 1. A path of [`Action`]s is chosen from a character's [`ActionTree`].
//! 2. Each of their [`Mutation`]s is encoded into a [`MemoryVector`] as the
//!    share of the attribute's range it moves, then applied.
//! 3. The vector is labelled with the action path and appended to the
//!    actor's [`MemoryBank`], which keeps a recency-weighted running total.
//!
//! Callers compare moments with [`MemoryVector::dot`],
//! [`MemoryVector::normalize`] and [`MemoryBank::rank_by_similarity`].
//!
//! Everything is synchronous, in-memory and single-owner: each character
//! owns its attributes and memory bank, and nothing is shared globally.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod action;
pub mod attribute;
pub mod character;
pub mod character_db;
pub mod config;
pub mod error;
pub mod memory;
pub mod mutation;
pub mod precondition;
pub mod schema;
pub mod types;

pub use action::{Action, ActionTree};
pub use attribute::{Attribute, AttributeValue};
pub use character::Character;
pub use character_db::CharacterDb;
pub use config::StoryConfig;
pub use error::{Result, StoryError};
pub use memory::{MemoryBank, MemoryVector, SimilarityMatch, SimilarityMetric};
pub use mutation::{IntegerOp, Mutation, MutationValue};
pub use precondition::{Comparison, Precondition};
pub use schema::{Schema, SchemaClass};
pub use types::*;
