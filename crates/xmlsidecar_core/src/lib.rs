//! Save-pipeline companions for an external ORM: XML sidecar-column
//! property mapping, edit-user stamping, pre-commit computation and
//! soft-delete/token/validity query filters.
//!
//! The surrounding ORM owns change tracking and commit mechanics; this
//! crate reacts to them through the [`model::tracking::ChangeTracker`]
//! contract and the two hooks in [`hooks`].

pub mod hooks;
pub mod logging;
pub mod model;
pub mod query;
pub mod xml;

pub use hooks::{rehydrate_entity, run_save_hooks, SaveHookReport};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::capabilities::{
    SelfComputing, SoftDeletable, SystemVersioned, Token, TrackedEntity, UserStamped, UserToken,
    XmlBacked,
};
pub use model::tracking::{ChangeTracker, EntityState, TrackedEntry};
pub use query::{DeletedState, SoftDeleteQuery, SystemVersionedQuery, TokenQuery, TokenValidity, UserTokenQuery};
pub use xml::{
    decode_xml_values, encode_xml_values, DocumentError, DocumentResult, MappingError,
    MappingResult, PropertyKind, PropertyNode, PropertyValue, ValueItem, ValuesDocument,
    XmlProperty,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
