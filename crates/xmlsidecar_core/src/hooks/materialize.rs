//! Load-time rehydration hook.

use crate::model::capabilities::XmlBacked;
use crate::xml::codec::{decode_xml_values, MappingResult};
use log::error;

/// Populates all XML-mapped properties of a freshly materialized entity
/// from its persisted payload (possibly absent).
///
/// Pure over (entity, payload); mutating the entity is the only effect.
/// Hosts call this once per loaded entity, before handing it to callers.
///
/// # Errors
/// - Propagates hard mapping failures, including a structurally invalid
///   payload; malformed individual values decode as defaults instead.
pub fn rehydrate_entity(entity: &mut dyn XmlBacked) -> MappingResult<()> {
    let payload = entity.xml_values().map(ToOwned::to_owned);
    match decode_xml_values(entity, payload.as_deref()) {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("event=rehydrate module=hooks status=error error={err}");
            Err(err)
        }
    }
}
