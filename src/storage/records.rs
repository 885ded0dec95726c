//! Indexed store of per-URL summary records.
//!
//! Record `i` lives in the file `{prefix}{i}{suffix}`. The visible record
//! set is the contiguous run starting at index 0; anything past the first
//! gap is invisible to readers but still removed by [`SummaryStore::truncate`].

use super::{SequentialFiles, Workspace};
use crate::error::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

/// Ordered collection of summary records backed by numbered files.
#[derive(Debug, Clone)]
pub struct SummaryStore {
    workspace: Workspace,
    prefix: String,
    suffix: String,
}

impl SummaryStore {
    pub fn new(workspace: Workspace, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            workspace,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// File name of the record at `index`.
    pub fn record_name(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, index, self.suffix)
    }

    pub fn exists(&self, index: usize) -> bool {
        self.workspace.exists(&self.record_name(index))
    }

    /// True if no record is visible, i.e. record 0 is missing.
    pub fn is_empty(&self) -> bool {
        !self.exists(0)
    }

    #[allow(dead_code)] // Single-record access; the pipeline reads the whole run
    pub fn read(&self, index: usize) -> Result<String, StorageError> {
        self.workspace.read_all(&self.record_name(index))
    }

    /// Write the record at `index`, replacing any previous content.
    pub fn write(&self, index: usize, text: &str) -> Result<(), StorageError> {
        self.workspace.write(&self.record_name(index), text)
    }

    /// Number of contiguous records starting at index 0.
    pub fn count(&self) -> usize {
        let mut index = 0;
        while self.exists(index) {
            index += 1;
        }
        index
    }

    /// Lazily read the visible records in increasing index order.
    pub fn records(&self) -> SequentialFiles {
        self.workspace.enumerate_sequential(&self.prefix, &self.suffix)
    }

    /// Read every visible record in increasing index order.
    pub fn read_all(&self) -> Result<Vec<String>, StorageError> {
        self.records().collect()
    }

    /// Number of record files on disk with an index of `len` or higher,
    /// counting records beyond a gap.
    pub fn count_from(&self, len: usize) -> Result<usize, StorageError> {
        Ok(self
            .indexed_files()?
            .into_iter()
            .filter(|(index, _)| *index >= len)
            .count())
    }

    /// Delete every record with an index of `len` or higher, including
    /// records stranded beyond a gap. Returns the number removed.
    pub fn truncate(&self, len: usize) -> Result<usize, StorageError> {
        let mut removed = 0;

        for (index, path) in self.indexed_files()? {
            if index < len {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed stale record {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(StorageError::Io { path, source }),
            }
        }

        if removed > 0 {
            info!("Removed {} summary record(s) at index {} and above", removed, len);
        }

        Ok(removed)
    }

    /// Delete every record.
    pub fn clear(&self) -> Result<usize, StorageError> {
        self.truncate(0)
    }

    /// List all record files on disk with their indices, sorted by index.
    fn indexed_files(&self) -> Result<Vec<(usize, PathBuf)>, StorageError> {
        let (dir, name_prefix) = match self.prefix.rfind('/') {
            Some(pos) => (
                self.workspace.path(&self.prefix[..=pos]),
                &self.prefix[pos + 1..],
            ),
            None => (self.workspace.root().to_path_buf(), self.prefix.as_str()),
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::Io { path: dir, source }),
        };

        let mut files: Vec<(usize, PathBuf)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let index = parse_index(&name, name_prefix, &self.suffix)?;
                Some((index, entry.path()))
            })
            .collect();

        files.sort_by_key(|(index, _)| *index);
        Ok(files)
    }
}

/// Extract the index from `{prefix}{index}{suffix}`, accepting only the
/// canonical decimal form that [`SummaryStore::record_name`] produces.
fn parse_index(name: &str, prefix: &str, suffix: &str) -> Option<usize> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SummaryStore) {
        let dir = TempDir::new().unwrap();
        let store = SummaryStore::new(Workspace::new(dir.path()), "summary_", ".txt");
        (dir, store)
    }

    #[test]
    fn test_record_name() {
        let (_dir, store) = store();
        assert_eq!(store.record_name(0), "summary_0.txt");
        assert_eq!(store.record_name(12), "summary_12.txt");
    }

    #[test]
    fn test_read_all_in_index_order() {
        let (_dir, store) = store();
        store.write(2, "C").unwrap();
        store.write(0, "A").unwrap();
        store.write(1, "B").unwrap();

        assert_eq!(store.read_all().unwrap(), vec!["A", "B", "C"]);
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_gap_truncates_visible_set() {
        let (_dir, store) = store();
        store.write(0, "A").unwrap();
        store.write(1, "B").unwrap();
        store.write(3, "D").unwrap();

        assert_eq!(store.count(), 2);
        assert_eq!(store.read_all().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_is_empty_tracks_record_zero() {
        let (_dir, store) = store();
        assert!(store.is_empty());
        store.write(1, "B").unwrap();
        assert!(store.is_empty());
        store.write(0, "A").unwrap();
        assert!(!store.is_empty());
        assert_eq!(store.read(1).unwrap(), "B");
    }

    #[test]
    fn test_truncate_removes_records_beyond_gap() {
        let (dir, store) = store();
        for index in [0, 1, 2, 5] {
            store.write(index, "x").unwrap();
        }
        std::fs::write(dir.path().join("summary_notes.txt"), "keep").unwrap();
        std::fs::write(dir.path().join("summary_03.txt"), "keep").unwrap();

        assert_eq!(store.truncate(1).unwrap(), 3);
        assert!(store.exists(0));
        assert!(!store.exists(1));
        assert!(!store.exists(5));
        assert!(dir.path().join("summary_notes.txt").exists());
        assert!(dir.path().join("summary_03.txt").exists());
    }

    #[test]
    fn test_count_from_sees_past_gaps() {
        let (_dir, store) = store();
        for index in [1, 2, 6] {
            store.write(index, "x").unwrap();
        }

        assert_eq!(store.count(), 0);
        assert_eq!(store.count_from(0).unwrap(), 3);
        assert_eq!(store.count_from(2).unwrap(), 2);
        assert_eq!(store.count_from(7).unwrap(), 0);
    }

    #[test]
    fn test_clear_with_subdirectory_prefix() {
        let dir = TempDir::new().unwrap();
        let store = SummaryStore::new(Workspace::new(dir.path()), "summaries/spr_", ".md");
        store.write(0, "A").unwrap();
        store.write(1, "B").unwrap();
        assert!(dir.path().join("summaries/spr_1.md").exists());

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_without_directory() {
        let dir = TempDir::new().unwrap();
        let store = SummaryStore::new(Workspace::new(dir.path()), "missing/s_", ".txt");
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("summary_7.txt", "summary_", ".txt"), Some(7));
        assert_eq!(parse_index("summary_.txt", "summary_", ".txt"), None);
        assert_eq!(parse_index("summary_+1.txt", "summary_", ".txt"), None);
        assert_eq!(parse_index("summary_01.txt", "summary_", ".txt"), None);
        assert_eq!(parse_index("other_1.txt", "summary_", ".txt"), None);
    }
}
