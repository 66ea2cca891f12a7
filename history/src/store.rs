use crate::change_detector::{self, ReferenceSnapshot};
use crate::error::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ChangeEvent, ExtractionResult, HistoryStatistics, Snapshot};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MAX_SNAPSHOTS: usize = 50;
pub const MAX_CHANGES: usize = 100;

/// What `open` does with a history file that is not valid JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorruptFilePolicy {
    /// Return `StorageError::Parse` and leave the file untouched
    #[default]
    Surface,
    /// Log a warning and start from an empty history; the file is overwritten
    /// on the next save
    Discard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryOptions {
    pub max_snapshots: usize,
    pub max_changes: usize,
    pub reference: ReferenceSnapshot,
    pub on_corrupt: CorruptFilePolicy,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_snapshots: MAX_SNAPSHOTS,
            max_changes: MAX_CHANGES,
            reference: ReferenceSnapshot::default(),
            on_corrupt: CorruptFilePolicy::default(),
        }
    }
}

/// On-disk layout of one student's history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryData {
    #[serde(default, deserialize_with = "shared_types::timestamp::deserialize_option")]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
    #[serde(default)]
    pub changes_detected: Vec<ChangeEvent>,
}

/// Capped history of grade snapshots and the changes found between them.
///
/// Everything lives in memory; `save` rewrites the whole file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    options: HistoryOptions,
    data: HistoryData,
    /// Set by `add_snapshot` to the snapshot that was newest before it ran;
    /// the inner `None` means the history was empty. Consumed by detection.
    reference_before_add: Option<Option<Snapshot>>,
}

impl HistoryStore {
    /// Empty store backed by `path`; nothing is read
    pub fn new(path: impl Into<PathBuf>, options: HistoryOptions) -> Self {
        Self {
            path: path.into(),
            options,
            data: HistoryData::default(),
            reference_before_add: None,
        }
    }

    /// Store backed by `path`, loaded from it when the file exists
    pub fn open(path: impl Into<PathBuf>, options: HistoryOptions) -> Result<Self, StorageError> {
        let mut store = Self::new(path, options);
        store.load()?;
        Ok(store)
    }

    /// Replace the in-memory state with the file's contents. A missing file
    /// yields an empty history.
    pub fn load(&mut self) -> Result<(), StorageError> {
        self.reference_before_add = None;

        if !self.path.exists() {
            tracing::info!("No history at {}, starting empty", self.path.display());
            self.data = HistoryData::default();
            return Ok(());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;

        match serde_json::from_str::<HistoryData>(&content) {
            Ok(data) => {
                tracing::info!(
                    "Loaded {} snapshots from {}",
                    data.snapshots.len(),
                    self.path.display()
                );
                self.data = data;
                Ok(())
            }
            Err(source) => match self.options.on_corrupt {
                CorruptFilePolicy::Surface => Err(StorageError::Parse {
                    path: self.path.clone(),
                    source,
                }),
                CorruptFilePolicy::Discard => {
                    tracing::warn!(
                        "Discarding malformed history {}: {}",
                        self.path.display(),
                        source
                    );
                    self.data = HistoryData::default();
                    Ok(())
                }
            },
        }
    }

    /// Write the whole history to the backing file.
    ///
    /// The data goes to a temporary file in the same directory which is then
    /// renamed over the target, so readers never see a partial file.
    pub fn save(&self) -> Result<(), StorageError> {
        write_atomically(&self.path, &self.data)?;
        tracing::info!("History saved to {}", self.path.display());
        Ok(())
    }

    /// Write the whole history to another file
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        write_atomically(path, &self.data)?;
        tracing::info!("History exported to {}", path.display());
        Ok(())
    }

    /// Append a snapshot stamped now and evict the oldest beyond the cap
    pub fn add_snapshot(&mut self, result: ExtractionResult) -> DateTime<Utc> {
        let timestamp = Utc::now();

        self.reference_before_add = Some(self.data.snapshots.last().cloned());
        self.data.snapshots.push(Snapshot {
            timestamp,
            data: result,
        });
        self.data.last_check = Some(timestamp);

        truncate_front(&mut self.data.snapshots, self.options.max_snapshots);

        tracing::info!("Snapshot added: {}", timestamp.to_rfc3339());
        timestamp
    }

    /// Snapshot a new extraction is diffed against under the configured mode
    pub fn reference_snapshot(&self) -> Option<&Snapshot> {
        match (self.options.reference, &self.reference_before_add) {
            (ReferenceSnapshot::Previous, Some(before)) => before.as_ref(),
            _ => self.data.snapshots.last(),
        }
    }

    /// Compare `new` with the reference snapshot and append what changed to
    /// the change history
    pub fn detect_changes(&mut self, new: &ExtractionResult) -> Vec<ChangeEvent> {
        let reference = self.reference_snapshot().cloned();
        self.reference_before_add = None;
        self.append_changes(reference.as_ref(), new)
    }

    /// Add `result` as a snapshot and return its changes against the snapshot
    /// that preceded it, whatever the reference mode
    pub fn record(&mut self, result: ExtractionResult) -> Vec<ChangeEvent> {
        let reference = self.data.snapshots.last().cloned();
        self.add_snapshot(result.clone());
        self.reference_before_add = None;
        self.append_changes(reference.as_ref(), &result)
    }

    fn append_changes(
        &mut self,
        reference: Option<&Snapshot>,
        new: &ExtractionResult,
    ) -> Vec<ChangeEvent> {
        let Some(reference) = reference else {
            tracing::info!("No previous snapshot, nothing to compare");
            return Vec::new();
        };

        let changes = change_detector::diff(&reference.data, new, Utc::now());
        if !changes.is_empty() {
            tracing::info!("Detected {} changes", changes.len());
            self.data.changes_detected.extend(changes.iter().cloned());
            truncate_front(&mut self.data.changes_detected, self.options.max_changes);
        }

        changes
    }

    pub fn get_statistics(&self) -> HistoryStatistics {
        HistoryStatistics {
            total_snapshots: self.data.snapshots.len(),
            total_changes: self.data.changes_detected.len(),
            last_check: self.data.last_check,
            first_snapshot: self.data.snapshots.first().map(|s| s.timestamp),
        }
    }

    /// Forget every snapshot and change, then save the empty history
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.data = HistoryData::default();
        self.reference_before_add = None;
        self.save()?;
        tracing::info!("History cleared");
        Ok(())
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.data.snapshots.last()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.data.snapshots
    }

    pub fn all_changes(&self) -> &[ChangeEvent] {
        &self.data.changes_detected
    }

    /// Up to `limit` most recent changes, oldest first
    pub fn recent_changes(&self, limit: usize) -> &[ChangeEvent] {
        let changes = &self.data.changes_detected;
        &changes[changes.len().saturating_sub(limit)..]
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.data.last_check
    }

    pub fn data(&self) -> &HistoryData {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// History file of one identity inside `dir`
pub fn store_path(dir: impl AsRef<Path>, identity: &str) -> PathBuf {
    let stem: String = identity
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = if stem.is_empty() {
        "default".to_string()
    } else {
        stem
    };

    dir.as_ref().join(format!("{}.json", stem))
}

fn truncate_front<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}

fn write_atomically(path: &Path, data: &HistoryData) -> Result<(), StorageError> {
    let write_error = |source: std::io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_error)?;

    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(write_error)?;
    serde_json::to_writer_pretty(&mut file, data)
        .map_err(|e| write_error(std::io::Error::from(e)))?;
    file.write_all(b"\n").map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}
