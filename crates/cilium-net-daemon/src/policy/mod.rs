//! Policy layer (namespace tree + consumption evaluator).
//!
//! The tree is held copy-on-write: writers swap in a new root while
//! evaluators keep reading the snapshot they started with.

pub mod evaluator;
pub mod path;
pub mod tree;

pub use evaluator::PolicyEvaluator;
pub use tree::{PolicyTree, TreeSnapshot};
