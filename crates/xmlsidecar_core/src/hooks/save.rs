//! Pre-commit save hook.

use crate::model::tracking::ChangeTracker;
use crate::xml::codec::{encode_xml_values, MappingResult};
use log::info;
use std::time::Instant;

/// Counters describing one save-hook pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveHookReport {
    pub entities_seen: usize,
    pub payloads_refreshed: usize,
    pub users_stamped: usize,
    pub entities_computed: usize,
}

/// Runs the pre-commit pass over every tracked entry.
///
/// Per entry, in order: regenerate the XML payload from current property
/// values when the entity is XML-backed (regardless of entry state); then,
/// for entries pending a write, stamp the acting-user id and invoke the
/// entity's self-computation.
///
/// The host's change detection runs once before the pass (so the entry set
/// is current) and once after it (so mutations made here are visible
/// before commit). There is no re-detection loop; convergence is attempted
/// exactly once per save.
///
/// Calling this twice with different `edit_user_id` values re-stamps
/// entities; with stable inputs the XML and computation effects are
/// idempotent.
///
/// # Errors
/// - Propagates hard mapping failures from payload regeneration.
pub fn run_save_hooks<C>(
    tracker: &mut C,
    edit_user_id: Option<i64>,
) -> MappingResult<SaveHookReport>
where
    C: ChangeTracker + ?Sized,
{
    let started_at = Instant::now();
    tracker.detect_changes();

    let mut report = SaveHookReport::default();
    for entry in tracker.entries_mut() {
        report.entities_seen += 1;
        let entity = entry.entity;

        if let Some(xml_backed) = entity.as_xml_backed() {
            let payload = encode_xml_values(&*xml_backed)?;
            xml_backed.set_xml_values(payload);
            report.payloads_refreshed += 1;
        }

        if entry.state.is_pending_write() {
            if let Some(stamped) = entity.as_user_stamped() {
                stamped.stamp_edit_user(edit_user_id);
                report.users_stamped += 1;
            }
            if let Some(computing) = entity.as_self_computing() {
                computing.compute();
                report.entities_computed += 1;
            }
        }
    }

    tracker.detect_changes();

    info!(
        "event=save_hook module=hooks status=ok entities={} payloads_refreshed={} users_stamped={} computed={} duration_ms={}",
        report.entities_seen,
        report.payloads_refreshed,
        report.users_stamped,
        report.entities_computed,
        started_at.elapsed().as_millis()
    );

    Ok(report)
}
