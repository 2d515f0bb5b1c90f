//! JSON-file persistence for the subscription and daily snapshots.
//!
//! Layout under the data directory:
//!
//! ```text
//! data/
//!   subscription.json
//!   snapshots/<subscription_id>/<YYYY-MM-DD>.json
//! ```
//!
//! The system is single-tenant: exactly one logical subscription, upserted
//! in place (the stored id is preserved across saves). Snapshots are written
//! once and never edited; each day's file supersedes the previous one, and
//! files older than the retention window are pruned after a successful run.
//!
//! Writes go through a temp-file-then-rename so a crash mid-write never
//! leaves a truncated JSON file where a reader expects a snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use cimawatch_core::Snapshot;
use cimawatch_types::EmailAddress;

/// Filename for the single subscription row.
const SUBSCRIPTION_FILENAME: &str = "subscription.json";

/// Directory name for per-subscription snapshot files.
const SNAPSHOTS_DIR_NAME: &str = "snapshots";

/// Errors from the file store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write store file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read store file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize store record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize store record: {0}")]
    Deserialization(serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The one subscriber configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub emails: Vec<EmailAddress>,
    /// Normalized national codes of the subscriber's catalog.
    pub catalog_codes: Vec<String>,
    pub hospital_name: String,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the daily run has anyone to notify about anything.
    pub fn is_actionable(&self) -> bool {
        !self.emails.is_empty() && !self.catalog_codes.is_empty()
    }
}

/// Fields a caller may set when upserting the subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdate {
    pub emails: Vec<EmailAddress>,
    pub catalog_codes: Vec<String>,
    pub hospital_name: String,
}

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(StoreError::DirCreation)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Loads the subscription, `None` when never configured.
    pub fn load_subscription(&self) -> StoreResult<Option<Subscription>> {
        let path = self.subscription_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(StoreError::FileRead)?;
        let subscription = serde_json::from_str(&json).map_err(StoreError::Deserialization)?;
        Ok(Some(subscription))
    }

    /// Upserts the subscription, preserving the existing id when present.
    pub fn save_subscription(&self, update: SubscriptionUpdate) -> StoreResult<Subscription> {
        let id = self
            .load_subscription()
            .unwrap_or_default()
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);

        let subscription = Subscription {
            id,
            emails: update.emails,
            catalog_codes: update.catalog_codes,
            hospital_name: update.hospital_name,
            updated_at: Utc::now(),
        };
        self.write_json(&self.subscription_path(), &subscription)?;
        Ok(subscription)
    }

    /// Loads the most recent snapshot for a subscription.
    ///
    /// A snapshot file that exists but cannot be read or parsed degrades to
    /// `None` with a warning: the pipeline treats it as a first run rather
    /// than aborting the day's report.
    pub fn load_latest_snapshot(&self, subscription_id: Uuid) -> StoreResult<Option<Snapshot>> {
        let dir = self.snapshots_dir(subscription_id);
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut latest: Option<(NaiveDate, PathBuf)> = None;
        for entry in fs::read_dir(&dir).map_err(StoreError::FileRead)? {
            let entry = entry.map_err(StoreError::FileRead)?;
            let path = entry.path();
            let Some(date) = snapshot_date_from_path(&path) else {
                continue;
            };
            if latest.as_ref().is_none_or(|(d, _)| date > *d) {
                latest = Some((date, path));
            }
        }

        let Some((date, path)) = latest else {
            return Ok(None);
        };

        match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(snapshot) => Ok(Some(snapshot)),
                Err(e) => {
                    warn!(%date, error = %e, "snapshot unreadable; treating as no prior snapshot");
                    Ok(None)
                }
            },
            Err(e) => {
                warn!(%date, error = %e, "snapshot read failed; treating as no prior snapshot");
                Ok(None)
            }
        }
    }

    /// Writes one day's snapshot. Overwrites an existing file for the same
    /// date (a re-run within the same day supersedes the earlier capture).
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let dir = self.snapshots_dir(snapshot.subscription_id);
        fs::create_dir_all(&dir).map_err(StoreError::DirCreation)?;
        let path = dir.join(format!("{}.json", snapshot.date.format("%Y-%m-%d")));
        self.write_json(&path, snapshot)
    }

    /// Deletes snapshots dated strictly before `today - retention_days`.
    ///
    /// Returns the number of files removed. Individual deletion failures are
    /// logged and skipped; pruning is housekeeping, not a run-critical step.
    pub fn prune_snapshots(
        &self,
        subscription_id: Uuid,
        today: NaiveDate,
        retention_days: i64,
    ) -> StoreResult<usize> {
        let dir = self.snapshots_dir(subscription_id);
        if !dir.is_dir() {
            return Ok(0);
        }
        let cutoff = today - Duration::days(retention_days);

        let mut removed = 0;
        for entry in fs::read_dir(&dir).map_err(StoreError::FileRead)? {
            let entry = entry.map_err(StoreError::FileRead)?;
            let path = entry.path();
            let Some(date) = snapshot_date_from_path(&path) else {
                continue;
            };
            if date < cutoff {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(%date, error = %e, "failed to prune snapshot"),
                }
            }
        }
        debug!(removed, %cutoff, "snapshot pruning complete");
        Ok(removed)
    }

    fn subscription_path(&self) -> PathBuf {
        self.data_dir.join(SUBSCRIPTION_FILENAME)
    }

    fn snapshots_dir(&self, subscription_id: Uuid) -> PathBuf {
        self.data_dir
            .join(SNAPSHOTS_DIR_NAME)
            .join(subscription_id.to_string())
    }

    /// Serializes to a temp file in the target directory, then renames into
    /// place.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(value).map_err(StoreError::Serialization)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(StoreError::FileWrite)?;
        fs::rename(&tmp, path).map_err(StoreError::FileWrite)?;
        Ok(())
    }
}

/// Extracts the snapshot date from a `<YYYY-MM-DD>.json` path.
fn snapshot_date_from_path(path: &Path) -> Option<NaiveDate> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
