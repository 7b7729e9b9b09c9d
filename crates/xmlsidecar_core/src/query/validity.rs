//! Modified-after filtering over system-versioned entities.

use crate::model::capabilities::SystemVersioned;
use chrono::{DateTime, Utc};

/// Row-start timestamp filtering.
pub trait SystemVersionedQuery: Iterator + Sized
where
    Self::Item: SystemVersioned,
{
    /// Keeps entities modified strictly after `changed_after`.
    ///
    /// `None` and the zero value (the Unix epoch) both disable the filter
    /// and pass the sequence through unchanged.
    fn of_modified_after(
        self,
        changed_after: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = Self::Item> {
        let threshold = changed_after.filter(|instant| *instant != DateTime::<Utc>::UNIX_EPOCH);
        self.filter(move |entity| {
            threshold.map_or(true, |instant| entity.sys_start_time() > instant)
        })
    }
}

impl<I> SystemVersionedQuery for I
where
    I: Iterator + Sized,
    I::Item: SystemVersioned,
{
}
