//! Constants used throughout the CIMA Watch core crate.
//!
//! This module collects the policy numbers so they are set in exactly one
//! place and referenced by name everywhere else.

/// Days after which an active shortage with no estimated end date is hidden
/// from the working view. Measured with a fixed 365-day year, no leap-year
/// adjustment.
pub const STALE_AFTER_DAYS: i64 = 365;

/// Any end date in a year after this one is a feed sentinel for "no
/// estimated end", not a real date.
pub const INDEFINITE_YEAR_FLOOR: i32 = 2040;

/// Snapshots older than this many days are eligible for deletion. The store
/// performs the deletion; the policy lives here.
pub const SNAPSHOT_RETENTION_DAYS: i64 = 30;

/// Minimum length of a normalized national code accepted during catalog
/// ingestion. Shorter values are assumed to be row numbers or junk cells.
pub const MIN_CATALOG_CODE_LEN: usize = 6;
