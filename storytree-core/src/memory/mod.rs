//! Memory vectors and the per-character [`MemoryBank`] that aggregates them.

pub mod bank;
pub mod vector;

pub use bank::{MemoryBank, SimilarityMatch, SimilarityMetric, DEFAULT_RECENCY_BONUS};
pub use vector::MemoryVector;
