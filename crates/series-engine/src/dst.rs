//! DST transition policies for recurring shows in a local time zone.

use chrono::{DateTime, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Longest gap we search across when shifting forward out of a DST gap.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Policy for handling occurrences whose local start time falls in a DST gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Skip instances that fall in the DST gap (e.g., 2:30 AM during spring forward).
    /// Skipped instances do not count toward COUNT.
    Skip,
    /// Shift to the first valid local minute after the gap.
    ShiftForward,
    /// Keep the wall clock time, interpreted with the offset in force before the gap.
    #[default]
    WallClock,
}

/// Resolve a local wall-clock time in `tz` to a UTC instant.
///
/// Ambiguous times (fall back) resolve to the earlier instant. Returns `None` only
/// when the time is in a gap and the policy is [`DstPolicy::Skip`].
pub(crate) fn resolve_local(tz: &Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return Some(dt.with_timezone(&Utc));
    }

    match policy {
        DstPolicy::Skip => None,
        DstPolicy::ShiftForward => (1..=MAX_GAP_MINUTES).find_map(|m| {
            let shifted = local.checked_add_signed(TimeDelta::minutes(m))?;
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        DstPolicy::WallClock => {
            let probe = local.checked_sub_signed(TimeDelta::days(1))?;
            let before_gap = tz.offset_from_utc_datetime(&probe).fix();
            let utc = local.checked_sub_signed(TimeDelta::seconds(i64::from(
                before_gap.local_minus_utc(),
            )))?;
            Some(utc.and_utc())
        }
    }
}
