//! Shortage record wire model and ingestion-boundary conversions.
//!
//! One `ShortageRecord` is one entry from the AEMPS `psuministro` feed. The
//! serde renames follow the upstream JSON field names (`cn`, `nregistro`,
//! `nombre`, `observ`, `activo`, `fini`, `ffin`).
//!
//! Two feed quirks are absorbed here so the rest of the system never sees
//! them:
//! - `cn` arrives as either a string or a number, sometimes with separators;
//! - "no estimated end date" is encoded as a far-future year (> 2040)
//!   instead of a missing field. [`ShortageRecord::end_estimate`] converts
//!   that sentinel to [`EndEstimate::Indefinite`] so no other module ever
//!   compares raw year numbers.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::INDEFINITE_YEAR_FLOOR;
use crate::normalize::normalize_opt;

/// One drug-shortage entry as published by the registry feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageRecord {
    /// Raw national code as received; string or number upstream.
    #[serde(
        rename = "cn",
        default,
        deserialize_with = "de_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,

    /// Registry number, used as the identifier when `cn` is absent.
    #[serde(
        rename = "nregistro",
        default,
        deserialize_with = "de_scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub registry_number: Option<String>,

    /// Display name; may be absent.
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the shortage is currently active. Absent is treated as
    /// "currently in shortage".
    #[serde(rename = "activo", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Free-text note from the issuing authority.
    #[serde(rename = "observ", default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,

    /// Shortage start, epoch milliseconds.
    #[serde(rename = "fini", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,

    /// Estimated shortage end, epoch milliseconds. May carry the far-future
    /// sentinel; use [`ShortageRecord::end_estimate`] instead of reading
    /// this directly.
    #[serde(rename = "ffin", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
}

/// Estimated end of a shortage after sentinel conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndEstimate {
    /// A concrete estimated end date.
    Date(DateTime<Utc>),
    /// No estimated end: the field was absent, unparseable, or carried the
    /// far-future sentinel year.
    Indefinite,
}

impl ShortageRecord {
    /// Returns the raw identifier: `cn` falling back to `nregistro`.
    pub fn raw_code(&self) -> Option<&str> {
        self.code
            .as_deref()
            .filter(|c| !c.is_empty())
            .or(self.registry_number.as_deref())
    }

    /// Recomputes the digits-only canonical code on every call.
    ///
    /// Never cached: snapshots written by older runs may carry differently
    /// padded raw codes, so identity must always be derived fresh.
    pub fn normalized_code(&self) -> String {
        normalize_opt(self.raw_code())
    }

    /// Whether this record counts as currently in shortage.
    ///
    /// The feed omits `activo` on some rows; absence is read as active.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    /// Shortage start as a UTC datetime, when present and parseable.
    pub fn start_datetime(&self) -> Option<DateTime<Utc>> {
        self.start_date.and_then(DateTime::from_timestamp_millis)
    }

    /// Converts the raw end date into an [`EndEstimate`] at the ingestion
    /// boundary.
    pub fn end_estimate(&self) -> EndEstimate {
        match self.end_date.and_then(DateTime::from_timestamp_millis) {
            Some(date) if date.year() <= INDEFINITE_YEAR_FLOOR => EndEstimate::Date(date),
            _ => EndEstimate::Indefinite,
        }
    }
}

/// Accepts a JSON string or number and yields it as a string.
///
/// The feed is inconsistent about whether `cn`/`nregistro` are quoted.
/// Anything else (booleans, arrays) is treated as absent rather than an
/// error, since a malformed identifier row should not fail the whole page.
fn de_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
