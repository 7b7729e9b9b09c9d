//! Change-tracking collaborator contract.
//!
//! The surrounding ORM owns entity lifecycle, snapshots and dirty-state
//! detection; this crate only consumes the two operations the save hook
//! needs. Implementations live with the host (or with tests).

use crate::model::capabilities::TrackedEntity;
use serde::{Deserialize, Serialize};

/// Persistence state of one tracked entry, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl EntityState {
    /// Whether the entry will be written on the next commit.
    pub fn is_pending_write(self) -> bool {
        matches!(self, Self::Added | Self::Modified)
    }
}

/// One tracked entity together with its reported state.
pub struct TrackedEntry<'a> {
    pub entity: &'a mut dyn TrackedEntity,
    pub state: EntityState,
}

/// The change-tracking provider contract consumed by the save hook.
///
/// # Contract
/// - `detect_changes` asks the host to re-evaluate derived change state;
///   the save hook calls it once before and once after its mutation pass.
/// - `entries_mut` enumerates tracked, possibly-changed entities; entry
///   order is host-defined and the hook imposes none.
pub trait ChangeTracker {
    fn detect_changes(&mut self);

    fn entries_mut(&mut self) -> Vec<TrackedEntry<'_>>;
}
