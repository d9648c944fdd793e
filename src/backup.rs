//! Timestamped database backups with retention.
//!
//! Backups are `database-<YYYYmmdd-HHMMSS>.db` files in the configured
//! directory. The timestamp in the name orders them, so pruning and the
//! "is a backup due" check never look at filesystem times.

use crate::config::BackupConfig;
use crate::store::{RecordStore, StoreError};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const PREFIX: &str = "database-";
const SUFFIX: &str = ".db";
const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("{}{}{}", PREFIX, at.format(STAMP_FORMAT), SUFFIX)
}

fn parse_stamp(file_name: &str) -> Option<DateTime<Utc>> {
    let stamp = file_name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Existing backups in `dir`, oldest first. Unrelated files are ignored.
pub fn list_backups(dir: &Path) -> Vec<(DateTime<Utc>, PathBuf)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut backups: Vec<_> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let at = parse_stamp(entry.file_name().to_str()?)?;
            Some((at, entry.path()))
        })
        .collect();
    backups.sort();
    backups
}

/// Write a backup for `now`, then delete the oldest beyond `max_backups`.
///
/// Returns the new backup's path.
pub async fn create_backup(
    store: &RecordStore,
    config: &BackupConfig,
    now: DateTime<Utc>,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(&config.directory)?;
    let path = config.directory.join(backup_file_name(now));
    // VACUUM INTO refuses to overwrite; a same-second backup is simply replaced
    if path.exists() {
        fs::remove_file(&path)?;
    }
    store.backup_to(&path).await?;
    tracing::info!(path = %path.display(), "database backed up");

    let removed = prune(&config.directory, config.max_backups)?;
    if removed > 0 {
        tracing::debug!(removed, "pruned old backups");
    }
    Ok(path)
}

/// Delete the oldest backups so at most `keep` remain. Returns how many went.
pub fn prune(dir: &Path, keep: usize) -> std::io::Result<usize> {
    let backups = list_backups(dir);
    let excess = backups.len().saturating_sub(keep);
    for (_, path) in &backups[..excess] {
        fs::remove_file(path)?;
    }
    Ok(excess)
}

/// True when there is no backup yet or the newest is at least
/// `interval_hours` old.
pub fn is_due(dir: &Path, interval_hours: u64, now: DateTime<Utc>) -> bool {
    match list_backups(dir).last() {
        None => true,
        Some((newest, _)) => i64::try_from(interval_hours)
            .ok()
            .and_then(Duration::try_hours)
            .is_some_and(|interval| now - *newest >= interval),
    }
}
