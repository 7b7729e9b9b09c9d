//! Typed property to element converter.
//!
//! # Responsibility
//! - Dispatch every mapped property on its declared kind to a
//!   kind-specific writer/reader over [`ValuesDocument`].
//! - Enforce default-value elision on encode and absent-yields-default on
//!   decode, so default and absent are the same persisted state.
//!
//! # Invariants
//! - Layout/entity disagreement (unknown property, kind mismatch) is a
//!   hard error at both encode and decode time.
//! - A stored value that fails to parse into its declared kind decodes as
//!   absent; it is never an error.
//! - An entity whose every mapped property is default encodes to `None`,
//!   never to an empty-but-present document.

use crate::model::capabilities::XmlBacked;
use crate::xml::document::{DocumentError, ValueItem, ValuesDocument};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Doubles within this distance of zero count as default and are elided.
pub const DOUBLE_ZERO_TOLERANCE: f64 = 1e-8;

/// Offset-free instants use this round-trip format.
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub type MappingResult<T> = Result<T, MappingError>;

/// Hard mapping failure.
///
/// `UnknownProperty` and `KindMismatch` indicate a mapping-declaration
/// defect in the entity type; callers must not catch and retry them.
#[derive(Debug)]
pub enum MappingError {
    Document(DocumentError),
    UnknownProperty {
        property: String,
    },
    KindMismatch {
        property: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(err) => write!(f, "{err}"),
            Self::UnknownProperty { property } => {
                write!(f, "mapped property `{property}` is not exposed by the entity")
            }
            Self::KindMismatch {
                property,
                expected,
                actual,
            } => write!(
                f,
                "mapped property `{property}` is declared as {expected} and does not support {actual} values"
            ),
        }
    }
}

impl Error for MappingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::UnknownProperty { .. } => None,
            Self::KindMismatch { .. } => None,
        }
    }
}

impl From<DocumentError> for MappingError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

/// The closed set of supported property kinds.
///
/// Nullable counterparts are expressed by the `Option` payload of
/// [`PropertyValue`], not by extra kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Text,
    Int,
    Double,
    Bool,
    DateTime,
    DateTimeOffset,
    TextList,
    IntList,
    DoubleList,
    TextMap,
    DoubleMap,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::DateTime => "date_time",
            Self::DateTimeOffset => "date_time_offset",
            Self::TextList => "text_list",
            Self::IntList => "int_list",
            Self::DoubleList => "double_list",
            Self::TextMap => "text_map",
            Self::DoubleMap => "double_map",
        }
    }
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an entity's static mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlProperty {
    pub name: &'static str,
    pub kind: PropertyKind,
}

impl XmlProperty {
    pub const fn new(name: &'static str, kind: PropertyKind) -> Self {
        Self { name, kind }
    }
}

/// A typed property value in transit between entity and document.
///
/// A `None` payload means "absent": elided on encode, default on decode.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(Option<String>),
    Int(Option<i32>),
    Double(Option<f64>),
    Bool(Option<bool>),
    DateTime(Option<NaiveDateTime>),
    DateTimeOffset(Option<DateTime<FixedOffset>>),
    TextList(Option<Vec<String>>),
    IntList(Option<Vec<i32>>),
    DoubleList(Option<Vec<f64>>),
    TextMap(Option<BTreeMap<String, String>>),
    DoubleMap(Option<BTreeMap<String, f64>>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Text(_) => PropertyKind::Text,
            Self::Int(_) => PropertyKind::Int,
            Self::Double(_) => PropertyKind::Double,
            Self::Bool(_) => PropertyKind::Bool,
            Self::DateTime(_) => PropertyKind::DateTime,
            Self::DateTimeOffset(_) => PropertyKind::DateTimeOffset,
            Self::TextList(_) => PropertyKind::TextList,
            Self::IntList(_) => PropertyKind::IntList,
            Self::DoubleList(_) => PropertyKind::DoubleList,
            Self::TextMap(_) => PropertyKind::TextMap,
            Self::DoubleMap(_) => PropertyKind::DoubleMap,
        }
    }
}

/// Encodes every mapped property of `entity` into fresh document text.
///
/// Returns `None` when no mapped property holds a non-default value.
///
/// # Errors
/// - `MappingError::UnknownProperty` when the layout names a property the
///   entity does not expose.
/// - `MappingError::KindMismatch` when the entity returns a value of a
///   different kind than declared.
pub fn encode_xml_values(entity: &dyn XmlBacked) -> MappingResult<Option<String>> {
    let mut document = ValuesDocument::new();
    for property in entity.xml_layout() {
        let value = match entity.xml_property(property.name) {
            Some(value) => value,
            None => {
                return Err(MappingError::UnknownProperty {
                    property: property.name.to_string(),
                })
            }
        };
        write_property(&mut document, property, value)?;
    }
    if document.is_empty() {
        Ok(None)
    } else {
        Ok(Some(document.to_xml_string()))
    }
}

/// Decodes document text onto every mapped property of `entity`; absent
/// text is treated as an empty document.
///
/// # Errors
/// - `MappingError::Document` when the text is structurally invalid XML.
/// - `MappingError::UnknownProperty` when the layout names a property the
///   entity refuses to accept.
pub fn decode_xml_values(entity: &mut dyn XmlBacked, xml_values: Option<&str>) -> MappingResult<()> {
    let document = match xml_values {
        Some(text) => ValuesDocument::parse(text)?,
        None => ValuesDocument::new(),
    };
    for property in entity.xml_layout() {
        let value = read_property(&document, property);
        if !entity.apply_xml_property(property.name, value) {
            return Err(MappingError::UnknownProperty {
                property: property.name.to_string(),
            });
        }
    }
    Ok(())
}

/// Writes one property into the document, eliding default values.
pub fn write_property(
    document: &mut ValuesDocument,
    property: &XmlProperty,
    value: PropertyValue,
) -> MappingResult<()> {
    match (property.kind, value) {
        (PropertyKind::Text, PropertyValue::Text(payload)) => {
            set_text_value(document, property.name, payload)
        }
        (PropertyKind::Int, PropertyValue::Int(payload)) => {
            set_int_value(document, property.name, payload)
        }
        (PropertyKind::Double, PropertyValue::Double(payload)) => {
            set_double_value(document, property.name, payload)
        }
        (PropertyKind::Bool, PropertyValue::Bool(payload)) => {
            set_bool_value(document, property.name, payload)
        }
        (PropertyKind::DateTime, PropertyValue::DateTime(payload)) => {
            set_date_time_value(document, property.name, payload)
        }
        (PropertyKind::DateTimeOffset, PropertyValue::DateTimeOffset(payload)) => {
            set_date_time_offset_value(document, property.name, payload)
        }
        (PropertyKind::TextList, PropertyValue::TextList(payload)) => {
            set_list_value(document, property.name, payload)
        }
        (PropertyKind::IntList, PropertyValue::IntList(payload)) => set_list_value(
            document,
            property.name,
            payload.map(|items| items.iter().map(|number| number.to_string()).collect()),
        ),
        (PropertyKind::DoubleList, PropertyValue::DoubleList(payload)) => set_list_value(
            document,
            property.name,
            payload.map(|items| items.iter().map(|number| number.to_string()).collect()),
        ),
        (PropertyKind::TextMap, PropertyValue::TextMap(payload)) => {
            set_map_value(document, property.name, payload)
        }
        (PropertyKind::DoubleMap, PropertyValue::DoubleMap(payload)) => set_map_value(
            document,
            property.name,
            payload.map(|map| {
                map.into_iter()
                    .map(|(key, value)| (key, value.to_string()))
                    .collect()
            }),
        ),
        (expected, other) => {
            return Err(MappingError::KindMismatch {
                property: property.name.to_string(),
                expected,
                actual: other.kind(),
            })
        }
    }
    Ok(())
}

/// Reads one property from the document with kind-specific parse logic.
///
/// Absent elements and malformed stored values both yield an absent
/// payload; the entity maps that to its default.
pub fn read_property(document: &ValuesDocument, property: &XmlProperty) -> PropertyValue {
    match property.kind {
        PropertyKind::Text => PropertyValue::Text(text_value(document, property.name)),
        PropertyKind::Int => PropertyValue::Int(int_value(document, property.name)),
        PropertyKind::Double => PropertyValue::Double(double_value(document, property.name)),
        PropertyKind::Bool => PropertyValue::Bool(bool_value(document, property.name)),
        PropertyKind::DateTime => {
            PropertyValue::DateTime(date_time_value(document, property.name))
        }
        PropertyKind::DateTimeOffset => {
            PropertyValue::DateTimeOffset(date_time_offset_value(document, property.name))
        }
        PropertyKind::TextList => PropertyValue::TextList(list_value(document, property.name)),
        PropertyKind::IntList => PropertyValue::IntList(
            list_value(document, property.name)
                .map(|items: Vec<String>| parse_items(&items)),
        ),
        PropertyKind::DoubleList => PropertyValue::DoubleList(
            list_value(document, property.name)
                .map(|items: Vec<String>| parse_items(&items)),
        ),
        PropertyKind::TextMap => PropertyValue::TextMap(text_map_value(document, property.name)),
        PropertyKind::DoubleMap => {
            PropertyValue::DoubleMap(text_map_value(document, property.name).map(|map| {
                map.into_iter()
                    .filter_map(|(key, value)| {
                        value.trim().parse::<f64>().ok().map(|parsed| (key, parsed))
                    })
                    .collect()
            }))
        }
    }
}

/// The default instant for elision purposes: the Unix epoch.
fn default_instant() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

fn set_text_value(document: &mut ValuesDocument, name: &str, value: Option<String>) {
    match value {
        Some(text) if !text.trim().is_empty() => document.set_text(name, text),
        _ => document.remove(name),
    }
}

fn set_int_value(document: &mut ValuesDocument, name: &str, value: Option<i32>) {
    match value {
        Some(number) if number != 0 => document.set_text(name, number.to_string()),
        _ => document.remove(name),
    }
}

fn set_double_value(document: &mut ValuesDocument, name: &str, value: Option<f64>) {
    match value {
        Some(number) if number.abs() > DOUBLE_ZERO_TOLERANCE => {
            document.set_text(name, number.to_string())
        }
        _ => document.remove(name),
    }
}

fn set_bool_value(document: &mut ValuesDocument, name: &str, value: Option<bool>) {
    match value {
        Some(true) => document.set_text(name, "1"),
        _ => document.remove(name),
    }
}

fn set_date_time_value(document: &mut ValuesDocument, name: &str, value: Option<NaiveDateTime>) {
    match value {
        Some(instant) if instant != default_instant() => {
            document.set_text(name, instant.format(DATE_TIME_FORMAT).to_string())
        }
        _ => document.remove(name),
    }
}

fn set_date_time_offset_value(
    document: &mut ValuesDocument,
    name: &str,
    value: Option<DateTime<FixedOffset>>,
) {
    match value {
        Some(instant) if instant.with_timezone(&Utc) != DateTime::<Utc>::UNIX_EPOCH => {
            document.set_text(name, instant.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
        _ => document.remove(name),
    }
}

fn set_list_value(document: &mut ValuesDocument, name: &str, values: Option<Vec<String>>) {
    match values {
        Some(items) if !items.is_empty() => {
            document.set_items(name, items.into_iter().map(ValueItem::text).collect())
        }
        _ => document.remove(name),
    }
}

fn set_map_value(
    document: &mut ValuesDocument,
    name: &str,
    values: Option<BTreeMap<String, String>>,
) {
    match values {
        Some(map) if !map.is_empty() => document.set_items(
            name,
            map.into_iter()
                .map(|(key, value)| ValueItem::keyed(key, value))
                .collect(),
        ),
        _ => document.remove(name),
    }
}

fn text_value(document: &ValuesDocument, name: &str) -> Option<String> {
    document.node(name).map(|node| node.text().to_string())
}

fn int_value(document: &ValuesDocument, name: &str) -> Option<i32> {
    document
        .node(name)
        .and_then(|node| node.text().trim().parse::<i32>().ok())
}

fn double_value(document: &ValuesDocument, name: &str) -> Option<f64> {
    document
        .node(name)
        .and_then(|node| node.text().trim().parse::<f64>().ok())
}

fn bool_value(document: &ValuesDocument, name: &str) -> Option<bool> {
    document
        .node(name)
        .and_then(|node| node.text().trim().parse::<i64>().ok())
        .map(|number| number != 0)
}

fn date_time_value(document: &ValuesDocument, name: &str) -> Option<NaiveDateTime> {
    document
        .node(name)
        .and_then(|node| NaiveDateTime::parse_from_str(node.text().trim(), DATE_TIME_FORMAT).ok())
}

fn date_time_offset_value(document: &ValuesDocument, name: &str) -> Option<DateTime<FixedOffset>> {
    document
        .node(name)
        .and_then(|node| DateTime::parse_from_rfc3339(node.text().trim()).ok())
}

fn list_value(document: &ValuesDocument, name: &str) -> Option<Vec<String>> {
    let node = document.node(name)?;
    if node.items().is_empty() {
        return None;
    }
    Some(node.items().iter().map(|item| item.text.clone()).collect())
}

/// Entries that fail to parse are skipped, not errors.
fn parse_items<T: std::str::FromStr>(items: &[String]) -> Vec<T> {
    items
        .iter()
        .filter_map(|item| item.trim().parse::<T>().ok())
        .collect()
}

/// Keyless items are skipped; the first occurrence of a key wins.
fn text_map_value(document: &ValuesDocument, name: &str) -> Option<BTreeMap<String, String>> {
    let node = document.node(name)?;
    if node.items().is_empty() {
        return None;
    }
    let mut map = BTreeMap::new();
    for item in node.items() {
        if let Some(key) = &item.key {
            map.entry(key.clone()).or_insert_with(|| item.text.clone());
        }
    }
    Some(map)
}

#[cfg(test)]
mod tests {
    use super::{
        read_property, write_property, MappingError, PropertyKind, PropertyValue, XmlProperty,
        DOUBLE_ZERO_TOLERANCE,
    };
    use crate::xml::document::ValuesDocument;

    const COUNT: XmlProperty = XmlProperty::new("Count", PropertyKind::Int);
    const RATIO: XmlProperty = XmlProperty::new("Ratio", PropertyKind::Double);
    const ACTIVE: XmlProperty = XmlProperty::new("Active", PropertyKind::Bool);

    #[test]
    fn kind_mismatch_is_a_hard_error() {
        let mut document = ValuesDocument::new();
        let err = write_property(&mut document, &COUNT, PropertyValue::Text(Some("4".into())))
            .unwrap_err();
        assert!(matches!(
            err,
            MappingError::KindMismatch {
                expected: PropertyKind::Int,
                actual: PropertyKind::Text,
                ..
            }
        ));
    }

    #[test]
    fn near_zero_doubles_are_elided() {
        let mut document = ValuesDocument::new();
        write_property(
            &mut document,
            &RATIO,
            PropertyValue::Double(Some(DOUBLE_ZERO_TOLERANCE / 2.0)),
        )
        .unwrap();
        assert!(document.is_empty());

        write_property(&mut document, &RATIO, PropertyValue::Double(Some(0.25))).unwrap();
        assert!(!document.is_empty());
    }

    #[test]
    fn bool_decodes_any_nonzero_integer_as_true() {
        let document = ValuesDocument::parse("<Values><Active>7</Active></Values>").unwrap();
        assert_eq!(
            read_property(&document, &ACTIVE),
            PropertyValue::Bool(Some(true))
        );

        let document = ValuesDocument::parse("<Values><Active>0</Active></Values>").unwrap();
        assert_eq!(
            read_property(&document, &ACTIVE),
            PropertyValue::Bool(Some(false))
        );

        let document = ValuesDocument::parse("<Values><Active>yes</Active></Values>").unwrap();
        assert_eq!(read_property(&document, &ACTIVE), PropertyValue::Bool(None));
    }

    #[test]
    fn malformed_scalar_decodes_as_absent() {
        let document = ValuesDocument::parse("<Values><Count>four</Count></Values>").unwrap();
        assert_eq!(read_property(&document, &COUNT), PropertyValue::Int(None));
    }
}
