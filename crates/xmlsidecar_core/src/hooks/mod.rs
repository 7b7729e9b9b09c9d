//! Save-pipeline and materialization hooks.
//!
//! # Responsibility
//! - Run the pre-commit pass over tracked entities (XML refresh, user
//!   stamping, computation).
//! - Rehydrate XML-mapped properties when an entity is materialized.
//!
//! # Invariants
//! - Hooks mutate caller-owned entities in place and hold no state.
//! - Change re-detection is bounded: one scan before the pass, one after.

pub mod materialize;
pub mod save;

pub use materialize::rehydrate_entity;
pub use save::{run_save_hooks, SaveHookReport};
