//! Day-over-day snapshot diffing.
//!
//! Given today's catalog-matched shortages and the previous snapshot,
//! partitions the codes into new / continuing / resolved. The diff is
//! defined only over the catalog-matched subset, never the full feed:
//! subscribers only care about their own medicines.

use std::collections::BTreeMap;

use crate::record::ShortageRecord;
use crate::snapshot::{ReducedRecord, Snapshot};

/// Result of diffing today's matched set against the previous snapshot.
///
/// Invariant: the three code sets are pairwise disjoint; new ∪ continuing
/// equals today's matched codes; resolved equals the previous snapshot's
/// codes minus today's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    /// In shortage today, not in the previous snapshot.
    pub new_items: Vec<ShortageRecord>,
    /// In shortage today and in the previous snapshot.
    pub continuing_items: Vec<ShortageRecord>,
    /// In the previous snapshot, no longer in shortage today.
    pub resolved_items: Vec<ReducedRecord>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.new_items.is_empty()
            && self.continuing_items.is_empty()
            && self.resolved_items.is_empty()
    }
}

/// Computes the new/continuing/resolved partitions.
///
/// A missing previous snapshot (first run for a subscription) behaves as an
/// empty one: everything in today's matched set is new, nothing is resolved.
/// Resolved codes whose payload is missing from the previous snapshot fall
/// back to [`ReducedRecord::placeholder`].
pub fn diff(
    today_matched: &BTreeMap<String, ShortageRecord>,
    previous: Option<&Snapshot>,
) -> DiffResult {
    let mut result = DiffResult::default();

    for (code, record) in today_matched {
        let seen_before = previous.is_some_and(|s| s.present_codes.contains(code));
        if seen_before {
            result.continuing_items.push(record.clone());
        } else {
            result.new_items.push(record.clone());
        }
    }

    if let Some(previous) = previous {
        for code in &previous.present_codes {
            if !today_matched.contains_key(code) {
                let payload = previous
                    .payload_by_code
                    .get(code)
                    .cloned()
                    .unwrap_or_else(|| ReducedRecord::placeholder(code));
                result.resolved_items.push(payload);
            }
        }
    }

    result
}
