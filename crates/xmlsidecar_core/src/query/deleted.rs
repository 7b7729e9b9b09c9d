//! Soft-delete state filtering.

use crate::model::capabilities::SoftDeletable;
use serde::{Deserialize, Serialize};

/// Which soft-delete states a query keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedState {
    NotDeleted,
    Deleted,
    Any,
}

impl DeletedState {
    /// Whether an entity with the given flag passes this filter.
    pub fn retains(self, is_deleted: bool) -> bool {
        match self {
            Self::NotDeleted => !is_deleted,
            Self::Deleted => is_deleted,
            Self::Any => true,
        }
    }
}

/// Soft-delete filtering over any entity sequence.
pub trait SoftDeleteQuery: Iterator + Sized
where
    Self::Item: SoftDeletable,
{
    fn of_deleted_state(self, state: DeletedState) -> impl Iterator<Item = Self::Item> {
        self.filter(move |entity| state.retains(entity.is_deleted()))
    }
}

impl<I> SoftDeleteQuery for I
where
    I: Iterator + Sized,
    I::Item: SoftDeletable,
{
}
