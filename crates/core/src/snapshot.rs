//! Daily snapshot model.
//!
//! A snapshot is the dated, immutable capture of which catalog codes were in
//! shortage on a given day, written once per run and superseded (never
//! edited) by the next day's snapshot. The payload map keeps enough of each
//! record to redisplay a since-resolved item without re-fetching it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::ShortageRecord;

/// Stable subset of a shortage record stored in snapshots.
///
/// Deliberately a separate type from [`ShortageRecord`]: the snapshot schema
/// must stay readable across versions even if the wire model grows fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
}

impl ReducedRecord {
    /// Minimal placeholder for a resolved code whose payload was not stored
    /// (snapshots written by an older schema may lack it).
    pub fn placeholder(normalized_code: &str) -> Self {
        Self {
            code: Some(normalized_code.to_owned()),
            registry_number: None,
            name: Some(format!("CN: {normalized_code}")),
            active: None,
            observation: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Raw identifier: code falling back to registry number.
    pub fn raw_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .filter(|c| !c.is_empty())
            .or(self.registry_number.as_deref())
    }
}

impl From<&ShortageRecord> for ReducedRecord {
    fn from(record: &ShortageRecord) -> Self {
        Self {
            code: record.code.clone(),
            registry_number: record.registry_number.clone(),
            name: record.name.clone(),
            active: record.active,
            observation: record.observation.clone(),
            start_date: record.start_date,
            end_date: record.end_date,
        }
    }
}

/// A dated, immutable capture of one subscriber's shortage state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub subscription_id: Uuid,
    pub date: NaiveDate,
    /// Normalized codes present in shortage on `date`, restricted to the
    /// subscriber's catalog.
    pub present_codes: BTreeSet<String>,
    /// Reduced payloads keyed by normalized code, for resolved-item display.
    pub payload_by_code: BTreeMap<String, ReducedRecord>,
}

impl Snapshot {
    /// Builds the snapshot of today's catalog-matched shortages.
    pub fn capture(
        subscription_id: Uuid,
        date: NaiveDate,
        matched: &BTreeMap<String, ShortageRecord>,
    ) -> Self {
        Self {
            subscription_id,
            date,
            present_codes: matched.keys().cloned().collect(),
            payload_by_code: matched
                .iter()
                .map(|(code, record)| (code.clone(), ReducedRecord::from(record)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keys_present_codes_and_payloads_identically() {
        let mut matched = BTreeMap::new();
        matched.insert(
            "712345".to_string(),
            ShortageRecord {
                code: Some("712345".into()),
                registry_number: None,
                name: Some("AMOXICILINA".into()),
                active: Some(true),
                observation: Some("obs".into()),
                start_date: Some(1),
                end_date: None,
            },
        );
        let snapshot = Snapshot::capture(
            Uuid::nil(),
            NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            &matched,
        );
        assert_eq!(snapshot.present_codes.len(), 1);
        assert!(snapshot.present_codes.contains("712345"));
        assert_eq!(
            snapshot.payload_by_code["712345"].name.as_deref(),
            Some("AMOXICILINA")
        );
    }

    #[test]
    fn test_placeholder_names_the_code() {
        let placeholder = ReducedRecord::placeholder("111111");
        assert_eq!(placeholder.code.as_deref(), Some("111111"));
        assert_eq!(placeholder.name.as_deref(), Some("CN: 111111"));
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let mut matched = BTreeMap::new();
        matched.insert(
            "712345".to_string(),
            ShortageRecord {
                code: Some("712345".into()),
                registry_number: Some("84012".into()),
                name: Some("AMOXICILINA".into()),
                active: None,
                observation: None,
                start_date: None,
                end_date: Some(2_000_000_000_000),
            },
        );
        let snapshot = Snapshot::capture(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            &matched,
        );
        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_older_schema_payload_tolerated() {
        // A snapshot written before the payload map existed.
        let json = r#"{
            "subscription_id": "00000000-0000-0000-0000-000000000000",
            "date": "2026-08-29",
            "present_codes": ["111111"],
            "payload_by_code": {}
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.payload_by_code.is_empty());
        assert!(snapshot.present_codes.contains("111111"));
    }
}
