//! Query predicate helpers.
//!
//! # Responsibility
//! - Provide iterator filters for soft-delete state, token validity and
//!   modified-after timestamps.
//!
//! # Invariants
//! - Filters compose by plain conjunction; none of them reorders or
//!   otherwise transforms the sequence.

pub mod deleted;
pub mod token;
pub mod validity;

pub use deleted::{DeletedState, SoftDeleteQuery};
pub use token::{TokenQuery, TokenValidity, UserTokenQuery};
pub use validity::SystemVersionedQuery;
