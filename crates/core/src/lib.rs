//! # CIMA Watch Core
//!
//! Core decision logic for the CIMA Watch shortage tracker.
//!
//! This crate contains pure, synchronous operations over in-memory
//! collections:
//! - Identifier normalization (the single identity function for the system)
//! - Criticality classification from the AEMPS observation text
//! - Staleness policy for long-running indefinite shortages
//! - Catalog matching and CSV catalog ingestion
//! - Day-over-day snapshot diffing
//! - Report composition (section contracts for the external renderer)
//!
//! **No I/O concerns**: HTTP fetching, snapshot persistence, and mail
//! delivery belong in `cimawatch-feed`, `cimawatch-store`, and
//! `cimawatch-mail`. Everything here is callable from tests without a
//! runtime.

pub mod catalog;
pub mod classify;
pub mod constants;
pub mod diff;
pub mod normalize;
pub mod record;
pub mod report;
pub mod snapshot;
pub mod staleness;

pub use catalog::{parse_catalog, CatalogError, CatalogSet};
pub use classify::{classify, Verdict};
pub use diff::{diff, DiffResult};
pub use normalize::{normalize, normalize_opt};
pub use record::{EndEstimate, ShortageRecord};
pub use report::{compose, Priority, Report, ReportMeta};
pub use snapshot::{ReducedRecord, Snapshot};
pub use staleness::is_stale;
