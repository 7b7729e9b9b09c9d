//! XML sidecar-column engine.
//!
//! # Responsibility
//! - Model the generic `Values` document the sidecar column stores.
//! - Convert typed entity properties to and from that document.
//!
//! # Invariants
//! - Default-valued properties are never written; absence decodes back to
//!   the default (two-way identity).
//! - Mapping-declaration defects fail hard; malformed stored values do not.

pub mod codec;
pub mod document;

pub use codec::{
    decode_xml_values, encode_xml_values, MappingError, MappingResult, PropertyKind,
    PropertyValue, XmlProperty,
};
pub use document::{DocumentError, DocumentResult, PropertyNode, ValueItem, ValuesDocument};
