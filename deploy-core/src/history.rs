//! History journal: an append-only NDJSON file recording every deployment
//! attempt, with atomic write-temp-then-rename semantics so a crash mid-write
//! never corrupts the journal.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("history directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Outcome of a single deployment run, as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentOutcome {
    Success,
    Partial,
    Failed,
    Cancelled,
}

/// One entry in the deployment history journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentHistoryEntry {
    pub id: String,
    pub profile_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: DeploymentOutcome,
    pub files_uploaded: usize,
    pub files_failed: usize,
    pub error_summary: Option<String>,
}

impl DeploymentHistoryEntry {
    #[must_use]
    pub fn new(profile_name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            profile_name: profile_name.into(),
            started_at,
            finished_at: started_at,
            outcome: DeploymentOutcome::Cancelled,
            files_uploaded: 0,
            files_failed: 0,
            error_summary: None,
        }
    }
}

/// NDJSON-backed, append-only deployment history.
pub struct HistoryJournal {
    path: PathBuf,
}

impl HistoryJournal {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Builds a journal at the default location
    /// (`~/.config/deploy-tool/history.ndjson`).
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::DirUnavailable`] if no config directory can be
    /// determined.
    pub fn default_location() -> Result<Self, HistoryError> {
        let base = dirs::config_dir().ok_or_else(|| {
            HistoryError::DirUnavailable("no user config directory available".to_string())
        })?;
        Ok(Self::new(
            base.join("deploy-tool").join("history.ndjson"),
        ))
    }

    /// Appends `entry` to the journal.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the journal file cannot be opened or
    /// written to.
    pub fn append(&self, entry: &DeploymentHistoryEntry) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Reads every entry currently in the journal, in append order.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the journal cannot be read, or contains a
    /// malformed line.
    pub fn read_all(&self) -> Result<Vec<DeploymentHistoryEntry>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    /// Returns the `limit` most recent entries, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the journal cannot be read.
    pub fn recent(&self, limit: usize) -> Result<Vec<DeploymentHistoryEntry>, HistoryError> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Returns entries for a given profile, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the journal cannot be read.
    pub fn by_profile(&self, profile_name: &str) -> Result<Vec<DeploymentHistoryEntry>, HistoryError> {
        let mut entries: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|entry| entry.profile_name == profile_name)
            .collect();
        entries.reverse();
        Ok(entries)
    }

    /// Returns entries with `started_at` in `[from, to]`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the journal cannot be read.
    pub fn by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DeploymentHistoryEntry>, HistoryError> {
        let mut entries: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|entry| entry.started_at >= from && entry.started_at <= to)
            .collect();
        entries.reverse();
        Ok(entries)
    }

    /// Clears the journal by atomically replacing it with an empty file:
    /// write to a temp file in the same directory, then rename over the
    /// journal, so a crash mid-clear never leaves a half-written file.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the temp file cannot be written or renamed.
    pub fn clear(&self) -> Result<(), HistoryError> {
        atomic_replace(&self.path, b"")
    }
}

fn atomic_replace(path: &Path, contents: &[u8]) -> Result<(), HistoryError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    let temp_path = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("history"),
        Uuid::new_v4()
    ));
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample_entry() -> DeploymentHistoryEntry {
        let mut entry = DeploymentHistoryEntry::new("staging", Utc::now());
        entry.outcome = DeploymentOutcome::Success;
        entry.files_uploaded = 12;
        entry
    }

    #[test]
    fn test_append_then_read_all_round_trips() {
        let dir = TempDir::new().unwrap();
        let journal = HistoryJournal::new(dir.path().join("history.ndjson"));
        journal.append(&sample_entry()).unwrap();

        let entries = journal.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].profile_name, "staging");
    }

    #[test]
    fn test_recent_returns_most_recent_first_bounded_by_limit() {
        let dir = TempDir::new().unwrap();
        let journal = HistoryJournal::new(dir.path().join("history.ndjson"));
        for i in 0..5 {
            let mut entry = sample_entry();
            entry.id = i.to_string();
            journal.append(&entry).unwrap();
        }

        let recent = journal.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "4");
        assert_eq!(recent[1].id, "3");
    }

    #[test]
    fn test_by_profile_filters_other_profiles() {
        let dir = TempDir::new().unwrap();
        let journal = HistoryJournal::new(dir.path().join("history.ndjson"));
        journal.append(&sample_entry()).unwrap();
        let mut other = sample_entry();
        other.profile_name = "production".to_string();
        journal.append(&other).unwrap();

        let staging_only = journal.by_profile("staging").unwrap();
        assert_eq!(staging_only.len(), 1);
        assert_eq!(staging_only[0].profile_name, "staging");
    }

    #[test]
    fn test_clear_empties_the_journal_atomically() {
        let dir = TempDir::new().unwrap();
        let journal = HistoryJournal::new(dir.path().join("history.ndjson"));
        journal.append(&sample_entry()).unwrap();
        journal.clear().unwrap();

        assert!(journal.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_all_on_missing_file_returns_empty() {
        let dir = TempDir::new().unwrap();
        let journal = HistoryJournal::new(dir.path().join("missing.ndjson"));
        assert!(journal.read_all().unwrap().is_empty());
    }
}
