//! File-backed storage for pipeline inputs and outputs.
//!
//! Every input (URL list, prompts, credential) and output (summaries,
//! final documents) is a whole text file named relative to a working
//! directory. [`Workspace`] is the shim over those files and
//! [`SummaryStore`] layers an indexed record store on top of it.

mod records;

pub use records::SummaryStore;

use crate::error::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A directory holding the pipeline's text files.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a name to a path inside the workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// True if a regular file with this name is present.
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Read the whole file as a string.
    pub fn read_all(&self, name: &str) -> Result<String, StorageError> {
        read_file(&self.path(name))
    }

    /// Read the file and split it into lines, without line terminators.
    pub fn read_lines(&self, name: &str) -> Result<Vec<String>, StorageError> {
        let content = self.read_all(name)?;
        Ok(content.lines().map(|line| line.trim_end().to_string()).collect())
    }

    /// Create or truncate the file and write `text` to it.
    pub fn write(&self, name: &str, text: &str) -> Result<(), StorageError> {
        let path = self.path(name);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Writing {} bytes to {}", text.len(), path.display());
        fs::write(&path, text).map_err(|source| StorageError::Io { path, source })
    }

    /// Lazily read `{prefix}0{suffix}`, `{prefix}1{suffix}`, ... until the
    /// first missing index.
    ///
    /// Each call rescans from index 0.
    pub fn enumerate_sequential(&self, prefix: &str, suffix: &str) -> SequentialFiles {
        SequentialFiles {
            root: self.root.clone(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            index: 0,
            done: false,
        }
    }
}

/// Iterator returned by [`Workspace::enumerate_sequential`].
///
/// Stops at the first `NotFound`. Any other I/O error is yielded once and
/// ends the sequence.
#[derive(Debug)]
pub struct SequentialFiles {
    root: PathBuf,
    prefix: String,
    suffix: String,
    index: usize,
    done: bool,
}

impl Iterator for SequentialFiles {
    type Item = Result<String, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let name = format!("{}{}{}", self.prefix, self.index, self.suffix);
        match read_file(&self.root.join(&name)) {
            Ok(content) => {
                self.index += 1;
                Some(Ok(content))
            }
            Err(e) if e.is_not_found() => {
                debug!("Sequence ends at {}", name);
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, StorageError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            StorageError::NotFound(path.to_path_buf())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
