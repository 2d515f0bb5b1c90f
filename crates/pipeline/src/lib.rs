//! The daily check pipeline.
//!
//! Wires the collaborators together, once per scheduler trigger:
//! fetch feed → restrict to catalog → diff against the stored snapshot →
//! compose and render the report → deliver per recipient → store today's
//! snapshot → prune old snapshots.
//!
//! Degradation rules (they are the point of this module):
//! - No subscription, or empty recipients/catalog: the run is a logged
//!   no-op, not an error.
//! - A failed previous-snapshot read behaves as a first run.
//! - A failed snapshot write or prune is logged; the run still succeeds
//!   (the mail already went out).
//! - Per-recipient mail failures never block other recipients.
//!
//! The pure middle of the run lives in [`evaluate`] so the decision logic is
//! testable without network or filesystem.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use cimawatch_core::report::{compose, Report, ReportMeta};
use cimawatch_core::{diff, CatalogSet, ShortageRecord, Snapshot};
use cimawatch_core::constants::SNAPSHOT_RETENTION_DAYS;
use cimawatch_feed::{FeedClient, FeedError};
use cimawatch_mail::{render, send_report, DeliveryOutcome, Mailer};
use cimawatch_store::{FileStore, StoreError, Subscription};

/// Fatal pipeline errors. Everything else degrades per module docs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Why a run did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSubscription,
    NoRecipients,
    NoCatalog,
}

/// Tallies from a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub new_count: usize,
    pub continuing_count: usize,
    pub resolved_count: usize,
    pub delivery: DeliveryOutcome,
    pub snapshot_saved: bool,
    pub snapshots_pruned: usize,
}

/// Result of one daily run.
#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    /// Nothing to do; the reason was logged.
    Skipped(SkipReason),
    Completed(RunSummary),
}

/// The pure middle of a run: catalog restriction, diff, report, snapshot.
///
/// Deterministic over its inputs; no I/O.
pub fn evaluate(
    records: &[ShortageRecord],
    subscription: &Subscription,
    previous: Option<&Snapshot>,
    today: NaiveDate,
) -> (Report, Snapshot) {
    let catalog = CatalogSet::from_raw(&subscription.catalog_codes);
    let matched = catalog.match_map(records);
    info!(
        matched = matched.len(),
        catalog = catalog.len(),
        "restricted feed to catalog"
    );

    let diff_result = diff(&matched, previous);
    let report = compose(
        &diff_result,
        ReportMeta {
            hospital_name: subscription.hospital_name.clone(),
            date: today,
        },
    );
    let snapshot = Snapshot::capture(subscription.id, today, &matched);
    (report, snapshot)
}

/// Runs the full daily check: fetches the feed, then processes and delivers.
///
/// # Errors
///
/// Fails only when the subscription cannot be read or the feed's first page
/// cannot be fetched; all other failures degrade.
pub async fn run_daily(
    store: &FileStore,
    feed: &FeedClient,
    mailer: &dyn Mailer,
    now: DateTime<Utc>,
) -> Result<RunOutcome, PipelineError> {
    let Some(subscription) = store.load_subscription()? else {
        info!("no subscription configured; skipping run");
        return Ok(RunOutcome::Skipped(SkipReason::NoSubscription));
    };
    if subscription.emails.is_empty() {
        info!("no recipients configured; skipping run");
        return Ok(RunOutcome::Skipped(SkipReason::NoRecipients));
    }
    if subscription.catalog_codes.is_empty() {
        info!("no catalog configured; skipping run");
        return Ok(RunOutcome::Skipped(SkipReason::NoCatalog));
    }

    let batch = feed.fetch_all().await?;
    info!(
        fetched = batch.records.len(),
        reported_total = batch.reported_total,
        "feed fetched"
    );

    Ok(run_with_records(store, mailer, &subscription, &batch.records, now))
}

/// Processes an already-fetched feed for one subscription.
///
/// Split from [`run_daily`] so tests can drive the pipeline without a feed
/// endpoint.
pub fn run_with_records(
    store: &FileStore,
    mailer: &dyn Mailer,
    subscription: &Subscription,
    records: &[ShortageRecord],
    now: DateTime<Utc>,
) -> RunOutcome {
    let today = now.date_naive();

    // A read failure here must not kill the day's report: treat it as a
    // first run and let tomorrow's diff recover.
    let previous = match store.load_latest_snapshot(subscription.id) {
        Ok(previous) => previous,
        Err(e) => {
            warn!(error = %e, "previous snapshot unavailable; treating as first run");
            None
        }
    };

    let (report, snapshot) = evaluate(records, subscription, previous.as_ref(), today);
    let (new_count, continuing_count, resolved_count) = report.counts();
    info!(new_count, continuing_count, resolved_count, "diff computed");

    let subject = render::subject(&report);
    let html = render::render_html(&report);
    let delivery = send_report(mailer, &subscription.emails, &subject, &html);

    let snapshot_saved = match store.save_snapshot(&snapshot) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "failed to save snapshot; diff will repeat tomorrow");
            false
        }
    };

    let snapshots_pruned = match store.prune_snapshots(
        subscription.id,
        today,
        SNAPSHOT_RETENTION_DAYS,
    ) {
        Ok(removed) => removed,
        Err(e) => {
            warn!(error = %e, "snapshot pruning failed");
            0
        }
    };

    RunOutcome::Completed(RunSummary {
        new_count,
        continuing_count,
        resolved_count,
        delivery,
        snapshot_saved,
        snapshots_pruned,
    })
}
