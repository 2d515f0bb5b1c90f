//! Subscriber catalog: membership set and CSV ingestion.
//!
//! A catalog is the set of normalized national codes one subscriber cares
//! about. The core only ever tests membership against it; it is supplied per
//! invocation and never mutated.
//!
//! Ingestion accepts the CSV/TSV exports hospitals produce from their
//! formulary spreadsheets: a header row naming the code column, one code per
//! data row. Failures here are user-facing — the error message must tell the
//! uploader what was wrong.

use std::collections::{BTreeMap, HashSet};

use crate::constants::MIN_CATALOG_CODE_LEN;
use crate::normalize::normalize;
use crate::record::ShortageRecord;

/// Errors surfaced to the uploader when a catalog file cannot be ingested.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No column header matched a known code-column name.
    #[error(
        "no code column found in header (expected \"cn\" or a header containing \
         \"codigo\", \"nregistro\" or \"national\"); got: {0}"
    )]
    NoCodeColumn(String),
    /// A code column was found but no row yielded a valid code.
    #[error("no valid national codes found (codes must contain at least {MIN_CATALOG_CODE_LEN} digits)")]
    NoValidCodes,
    /// The file had no content beyond an optional header.
    #[error("catalog file is empty")]
    Empty,
}

/// A caller-owned set of normalized codes for one subscriber.
///
/// Membership is O(1); an empty catalog matches nothing — callers must not
/// treat it as "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSet {
    codes: HashSet<String>,
}

impl CatalogSet {
    /// Builds a catalog from raw code values, normalizing each and dropping
    /// anything that normalizes to empty.
    ///
    /// Stored subscriptions hold already-normalized codes, but re-normalizing
    /// is cheap and protects against rows written by older schema versions.
    pub fn from_raw<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|c| normalize(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();
        Self { codes }
    }

    /// Membership test for an already-normalized code.
    pub fn contains(&self, normalized_code: &str) -> bool {
        self.codes.contains(normalized_code)
    }

    /// Membership test for a record, keyed on its normalized code.
    pub fn contains_record(&self, record: &ShortageRecord) -> bool {
        let code = record.normalized_code();
        !code.is_empty() && self.codes.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in sorted order, for persistence and display.
    pub fn sorted_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.codes.iter().cloned().collect();
        codes.sort();
        codes
    }

    /// Restricts a record collection to the members of this catalog.
    ///
    /// Preserves input order. Runs in O(|records|).
    pub fn restrict<'a>(&self, records: &'a [ShortageRecord]) -> Vec<&'a ShortageRecord> {
        records.iter().filter(|r| self.contains_record(r)).collect()
    }

    /// Restricts and keys the result by normalized code — the map the
    /// snapshot differ consumes.
    ///
    /// When the feed repeats a code across pages the last occurrence wins,
    /// mirroring upstream pagination behaviour.
    pub fn match_map(&self, records: &[ShortageRecord]) -> BTreeMap<String, ShortageRecord> {
        let mut matched = BTreeMap::new();
        for record in records {
            let code = record.normalized_code();
            if !code.is_empty() && self.codes.contains(&code) {
                matched.insert(code, record.clone());
            }
        }
        matched
    }
}

/// Parses CSV/TSV text into a [`CatalogSet`].
///
/// Header detection: the first line is split on `;`, tab, or `,` (first
/// delimiter found, in that order); the code column is the first header that
/// equals `cn` or contains `codigo`/`código`/`nregistro`/`national`,
/// case-insensitively. Every data row's value in that column is normalized;
/// codes shorter than [`MIN_CATALOG_CODE_LEN`] digits are discarded.
///
/// # Errors
///
/// - [`CatalogError::Empty`] when there is no content.
/// - [`CatalogError::NoCodeColumn`] when no header matches, carrying the
///   header actually seen.
/// - [`CatalogError::NoValidCodes`] when every row was discarded.
pub fn parse_catalog(text: &str) -> Result<CatalogSet, CatalogError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Err(CatalogError::Empty);
    };

    let delimiter = detect_delimiter(header_line);
    let column = find_code_column(header_line, delimiter)
        .ok_or_else(|| CatalogError::NoCodeColumn(header_line.trim().to_owned()))?;

    let mut codes: Vec<String> = Vec::new();
    for line in lines {
        let Some(cell) = line.split(delimiter).nth(column) else {
            continue;
        };
        let code = normalize(cell);
        if code.len() >= MIN_CATALOG_CODE_LEN {
            codes.push(code);
        }
    }

    if codes.is_empty() {
        return Err(CatalogError::NoValidCodes);
    }
    Ok(CatalogSet::from_raw(codes))
}

fn detect_delimiter(header_line: &str) -> char {
    if header_line.contains(';') {
        ';'
    } else if header_line.contains('\t') {
        '\t'
    } else {
        ','
    }
}

fn find_code_column(header_line: &str, delimiter: char) -> Option<usize> {
    header_line.split(delimiter).position(|cell| {
        let header = cell.trim().trim_matches('"').to_lowercase();
        header == "cn"
            || header.contains("codigo")
            || header.contains("código")
            || header.contains("nregistro")
            || header.contains("national")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str) -> ShortageRecord {
        ShortageRecord {
            code: Some(code.into()),
            registry_number: None,
            name: None,
            active: Some(true),
            observation: None,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_restrict_matches_on_normalized_code() {
        let records = vec![record("01 23"), record("9999")];
        let catalog = CatalogSet::from_raw(["0123"]);
        let restricted = catalog.restrict(&records);
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted[0].code.as_deref(), Some("01 23"));
    }

    #[test]
    fn test_empty_catalog_matches_nothing() {
        let records = vec![record("712345"), record("654321")];
        let catalog = CatalogSet::default();
        assert!(catalog.restrict(&records).is_empty());
        assert!(catalog.match_map(&records).is_empty());
    }

    #[test]
    fn test_match_map_keys_by_normalized_code() {
        let records = vec![record("712.345"), record("999999")];
        let catalog = CatalogSet::from_raw(["712345"]);
        let matched = catalog.match_map(&records);
        assert_eq!(matched.len(), 1);
        assert!(matched.contains_key("712345"));
    }

    #[test]
    fn test_record_without_code_never_matches() {
        let mut no_code = record("");
        no_code.code = None;
        let catalog = CatalogSet::from_raw([""]);
        assert!(catalog.is_empty());
        assert!(!catalog.contains_record(&no_code));
    }

    #[test]
    fn test_parse_catalog_semicolon_with_cn_header() {
        let text = "CN;Nombre\n712345;AMOXICILINA\n654.321;IBUPROFENO\n";
        let catalog = parse_catalog(text).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("712345"));
        assert!(catalog.contains("654321"));
    }

    #[test]
    fn test_parse_catalog_finds_codigo_column() {
        let text = "Nombre,Código Nacional\nAMOXICILINA,712345\n";
        let catalog = parse_catalog(text).unwrap();
        assert!(catalog.contains("712345"));
    }

    #[test]
    fn test_parse_catalog_tab_delimited_nregistro() {
        let text = "nregistro\tnombre\n84012X\tPARACETAMOL\n";
        let err = parse_catalog(text);
        // "84012X" normalizes to 5 digits, below the minimum.
        assert!(matches!(err, Err(CatalogError::NoValidCodes)));

        let text = "nregistro\tnombre\n840123\tPARACETAMOL\n";
        let catalog = parse_catalog(text).unwrap();
        assert!(catalog.contains("840123"));
    }

    #[test]
    fn test_parse_catalog_discards_short_codes() {
        let text = "cn\n123\n712345\n";
        let catalog = parse_catalog(text).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.contains("123"));
    }

    #[test]
    fn test_parse_catalog_rejects_unknown_header() {
        let err = parse_catalog("id;name\n1;x\n").expect_err("should reject");
        assert!(matches!(err, CatalogError::NoCodeColumn(h) if h == "id;name"));
    }

    #[test]
    fn test_parse_catalog_rejects_empty_input() {
        assert!(matches!(parse_catalog(""), Err(CatalogError::Empty)));
        assert!(matches!(parse_catalog("  \n \n"), Err(CatalogError::Empty)));
    }
}
