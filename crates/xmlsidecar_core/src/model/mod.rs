//! Entity-facing contracts consumed by the save/load hooks.
//!
//! # Responsibility
//! - Declare the optional capabilities a persisted entity may implement.
//! - Declare the change-tracking collaborator contract this crate reacts to.
//!
//! # Invariants
//! - Capabilities are queried at runtime, never assumed from a type
//!   hierarchy.

pub mod capabilities;
pub mod tracking;
