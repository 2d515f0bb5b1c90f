//! Report composition.
//!
//! Turns a [`DiffResult`](crate::diff::DiffResult) into the structure the
//! external renderer and mailer consume: three sections in fixed order (New,
//! Continuing, Resolved) plus a priority signal for the subject line. The
//! composer owns the section contracts — counts, ordering, empty states —
//! but no visual formatting and no delivery.

use chrono::{DateTime, NaiveDate, Utc};

use crate::classify::{classify, Verdict};
use crate::diff::DiffResult;
use crate::record::{EndEstimate, ShortageRecord};
use crate::snapshot::ReducedRecord;

/// Context for one report: whose catalog, which day.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMeta {
    pub hospital_name: String,
    pub date: NaiveDate,
}

/// Full-detail entry for the New and Continuing sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    /// Raw display code (`cn` falling back to `nregistro`); absent when the
    /// upstream row carried neither.
    pub code: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_estimate: EndEstimate,
    pub observation: Option<String>,
    pub verdict: Verdict,
}

impl ReportEntry {
    fn from_record(record: &ShortageRecord) -> Self {
        Self {
            code: record.raw_code().map(str::to_owned),
            name: record.name.clone(),
            start_date: record.start_datetime(),
            end_estimate: record.end_estimate(),
            observation: record.observation.clone(),
            verdict: classify(record),
        }
    }
}

/// Code-and-name entry for the Resolved section.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl ResolvedEntry {
    fn from_reduced(reduced: &ReducedRecord) -> Self {
        Self {
            code: reduced.raw_code().map(str::to_owned),
            name: reduced.name.clone(),
        }
    }
}

/// Subject-line priority signal handed to the external notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// At least one new shortage today.
    Urgent,
    /// No new shortages, but at least one resolved.
    ResolvedOnly,
    /// Nothing changed in either direction.
    Routine,
}

/// An ordered, structured daily report ready for external rendering.
///
/// All three sections are always present; a renderer must emit an explicit
/// empty placeholder for a section whose item list is empty, never drop it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub meta: ReportMeta,
    pub new_items: Vec<ReportEntry>,
    pub continuing_items: Vec<ReportEntry>,
    pub resolved_items: Vec<ResolvedEntry>,
}

impl Report {
    /// Derives the subject/priority signal from the section counts.
    pub fn priority(&self) -> Priority {
        if !self.new_items.is_empty() {
            Priority::Urgent
        } else if !self.resolved_items.is_empty() {
            Priority::ResolvedOnly
        } else {
            Priority::Routine
        }
    }

    /// (new, continuing, resolved) counts for the summary line.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.new_items.len(),
            self.continuing_items.len(),
            self.resolved_items.len(),
        )
    }
}

/// Composes the daily report from a diff result.
///
/// Entry order within each section preserves the diff output order; each
/// New/Continuing entry carries the classifier verdict so renderers never
/// re-classify.
pub fn compose(diff: &DiffResult, meta: ReportMeta) -> Report {
    Report {
        meta,
        new_items: diff.new_items.iter().map(ReportEntry::from_record).collect(),
        continuing_items: diff
            .continuing_items
            .iter()
            .map(ReportEntry::from_record)
            .collect(),
        resolved_items: diff
            .resolved_items
            .iter()
            .map(ResolvedEntry::from_reduced)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ReportMeta {
        ReportMeta {
            hospital_name: "Hospital La Paz".into(),
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        }
    }

    fn record(code: &str, observation: &str) -> ShortageRecord {
        ShortageRecord {
            code: Some(code.into()),
            registry_number: None,
            name: Some(format!("MED {code}")),
            active: Some(true),
            observation: Some(observation.into()),
            start_date: Some(1_700_000_000_000),
            end_date: None,
        }
    }

    #[test]
    fn test_priority_urgent_when_new_items_exist() {
        let diff = DiffResult {
            new_items: vec![record("333333", "")],
            continuing_items: vec![],
            resolved_items: vec![ReducedRecord::placeholder("111111")],
        };
        let report = compose(&diff, meta());
        assert_eq!(report.priority(), Priority::Urgent);
    }

    #[test]
    fn test_priority_resolved_only() {
        let diff = DiffResult {
            new_items: vec![],
            continuing_items: vec![record("222222", "")],
            resolved_items: vec![ReducedRecord::placeholder("111111")],
        };
        let report = compose(&diff, meta());
        assert_eq!(report.priority(), Priority::ResolvedOnly);
    }

    #[test]
    fn test_priority_routine_when_nothing_changed() {
        let diff = DiffResult {
            new_items: vec![],
            continuing_items: vec![record("222222", "")],
            resolved_items: vec![],
        };
        let report = compose(&diff, meta());
        assert_eq!(report.priority(), Priority::Routine);
    }

    #[test]
    fn test_entries_carry_verdict_and_detail() {
        let diff = DiffResult {
            new_items: vec![record("333333", "Distribución controlada")],
            continuing_items: vec![record(
                "222222",
                "Existen otros medicamentos con el mismo principio activo",
            )],
            resolved_items: vec![],
        };
        let report = compose(&diff, meta());
        assert_eq!(report.new_items[0].verdict, Verdict::Critical);
        assert_eq!(report.continuing_items[0].verdict, Verdict::Alleviated);
        assert!(report.new_items[0].start_date.is_some());
        assert_eq!(report.new_items[0].end_estimate, EndEstimate::Indefinite);
    }

    #[test]
    fn test_sections_present_when_empty() {
        let report = compose(&DiffResult::default(), meta());
        assert!(report.new_items.is_empty());
        assert!(report.continuing_items.is_empty());
        assert!(report.resolved_items.is_empty());
        assert_eq!(report.counts(), (0, 0, 0));
        assert_eq!(report.priority(), Priority::Routine);
    }

    #[test]
    fn test_resolved_entries_reduced_to_code_and_name() {
        let diff = DiffResult {
            new_items: vec![],
            continuing_items: vec![],
            resolved_items: vec![ReducedRecord::placeholder("111111")],
        };
        let report = compose(&diff, meta());
        assert_eq!(report.resolved_items[0].code.as_deref(), Some("111111"));
        assert_eq!(report.resolved_items[0].name.as_deref(), Some("CN: 111111"));
    }
}
