//! Optional entity capabilities.
//!
//! # Responsibility
//! - Define what a tracked entity *may* support: XML-backed property
//!   storage, edit-user stamping, pre-commit computation, soft-delete
//!   flags, token semantics and system-versioning timestamps.
//! - Provide the runtime capability query used by the save pipeline.
//!
//! # Invariants
//! - An entity that does not implement a capability is silently skipped by
//!   the hooks; absence is never an error.
//! - `xml_layout()` tables are `'static` and immutable for the lifetime of
//!   the process.

use crate::xml::codec::{PropertyValue, XmlProperty};
use chrono::{DateTime, Utc};

/// An entity that stores a declared subset of its properties inside one
/// XML sidecar column instead of discrete columns.
///
/// # Contract
/// - `xml_layout()` names every mapped property exactly once, with its
///   declared kind. The table is the single source of truth for encode and
///   decode dispatch.
/// - `xml_property()` returns `None` only when the layout names a property
///   the entity does not actually expose; the codec treats that as a
///   mapping-declaration defect and fails hard.
/// - `apply_xml_property()` returns `false` under the same condition.
pub trait XmlBacked {
    /// Static mapping table for this entity type.
    fn xml_layout(&self) -> &'static [XmlProperty];

    /// Reads the current value of one mapped property.
    fn xml_property(&self, name: &str) -> Option<PropertyValue>;

    /// Writes a decoded value back onto one mapped property.
    ///
    /// A `None` payload inside `value` means "absent in the document";
    /// implementations map it to the property's default.
    fn apply_xml_property(&mut self, name: &str, value: PropertyValue) -> bool;

    /// The persisted sidecar column, `None` when nothing was stored.
    fn xml_values(&self) -> Option<&str>;

    /// Replaces the persisted sidecar column.
    fn set_xml_values(&mut self, values: Option<String>);
}

/// An entity that records the acting user of its last mutation.
pub trait UserStamped {
    /// Stores the editing-user id, `None` when the save was anonymous.
    fn stamp_edit_user(&mut self, user_id: Option<i64>);
}

/// An entity that derives computed fields from its own state before commit.
pub trait SelfComputing {
    /// Recomputes derived fields in place from current inputs.
    fn compute(&mut self);
}

/// An entity carrying a logical deleted flag instead of physical removal.
pub trait SoftDeletable {
    fn is_deleted(&self) -> bool;
}

/// A time-bounded credential-like record.
pub trait Token: SoftDeletable {
    fn id(&self) -> i64;
    fn token_key(&self) -> &str;
    fn valid_until(&self) -> DateTime<Utc>;
}

/// A token bound to one owning user.
pub trait UserToken: Token {
    fn user_id(&self) -> i64;
}

/// An entity exposing the system-versioning row-start timestamp.
pub trait SystemVersioned {
    fn sys_start_time(&self) -> DateTime<Utc>;
}

/// Umbrella trait for anything the change tracker can enumerate.
///
/// The `as_*` methods are runtime capability queries: a concrete entity
/// overrides the ones it supports and inherits `None` for the rest. The
/// hooks never downcast; they only ask.
pub trait TrackedEntity {
    fn as_xml_backed(&mut self) -> Option<&mut dyn XmlBacked> {
        None
    }

    fn as_user_stamped(&mut self) -> Option<&mut dyn UserStamped> {
        None
    }

    fn as_self_computing(&mut self) -> Option<&mut dyn SelfComputing> {
        None
    }
}

impl<T: SoftDeletable + ?Sized> SoftDeletable for &T {
    fn is_deleted(&self) -> bool {
        (**self).is_deleted()
    }
}

impl<T: Token + ?Sized> Token for &T {
    fn id(&self) -> i64 {
        (**self).id()
    }

    fn token_key(&self) -> &str {
        (**self).token_key()
    }

    fn valid_until(&self) -> DateTime<Utc> {
        (**self).valid_until()
    }
}

impl<T: UserToken + ?Sized> UserToken for &T {
    fn user_id(&self) -> i64 {
        (**self).user_id()
    }
}

impl<T: SystemVersioned + ?Sized> SystemVersioned for &T {
    fn sys_start_time(&self) -> DateTime<Utc> {
        (**self).sys_start_time()
    }
}
