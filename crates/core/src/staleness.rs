//! Staleness policy for long-running indefinite shortages.
//!
//! Entries that have sat open for over a year with no estimated end date are
//! presumed administrative noise and hidden from the live working view.
//! They stay in snapshots: the diff engine must keep tracking them so a
//! later resolution is still detected.

use chrono::{DateTime, Duration, Utc};

use crate::constants::STALE_AFTER_DAYS;
use crate::record::{EndEstimate, ShortageRecord};

/// Decides whether a record is stale and eligible for suppression from the
/// working view.
///
/// Stale iff all of:
/// - the start date is present and parseable,
/// - `now - start` exceeds 365 days (fixed 365-day year, no leap-year
///   adjustment),
/// - the end estimate is indefinite.
///
/// Display-path policy only; never applied before diffing.
pub fn is_stale(record: &ShortageRecord, now: DateTime<Utc>) -> bool {
    let Some(start) = record.start_datetime() else {
        return false;
    };
    now - start > Duration::days(STALE_AFTER_DAYS)
        && record.end_estimate() == EndEstimate::Indefinite
}
