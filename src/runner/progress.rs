//! Durable set of already-finalized addresses, enabling resume after
//! interruption.
//!
//! One normalized address per line, stored next to the input file under a
//! fixed naming convention. `mark` is memory-only; `flush` appends the
//! pending lines and syncs, so the last completed flush is the recovery
//! point and work since then is safely re-done on restart.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::core::error::Result;

struct Inner {
    finalized: HashSet<String>,
    pending: Vec<String>,
    file: File,
}

/// Persistent progress set associated 1:1 with an input file.
pub struct ProgressStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl ProgressStore {
    /// Progress file path derived from the input path.
    pub fn path_for(input: &Path) -> PathBuf {
        let mut os = input.as_os_str().to_owned();
        os.push(".progress");
        PathBuf::from(os)
    }

    /// Opens the store for `input`. Existing entries are loaded only when
    /// `resume` is set; the file itself is never deleted, and new progress
    /// is appended either way.
    pub fn open(input: &Path, resume: bool) -> Result<Self> {
        let path = Self::path_for(input);
        let mut finalized = HashSet::new();

        if resume && path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                let address = line.trim();
                if !address.is_empty() {
                    finalized.insert(address.to_string());
                }
            }
            tracing::info!(target: "progress",
                "Resuming: {} addresses already finalized in {}",
                finalized.len(), path.display());
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                finalized,
                pending: Vec::new(),
                file,
            }),
        })
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.lock().finalized.contains(address)
    }

    /// Records `address` as finalized. Returns false if it was already
    /// present (nothing is queued twice).
    pub fn mark(&self, address: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.finalized.insert(address.to_string()) {
            return false;
        }
        inner.pending.push(address.to_string());
        true
    }

    /// Appends all pending entries to the progress file and syncs it.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.pending.is_empty() {
            return Ok(());
        }
        let mut chunk = String::new();
        for address in &inner.pending {
            chunk.push_str(address);
            chunk.push('\n');
        }
        inner.file.write_all(chunk.as_bytes())?;
        inner.file.sync_data()?;
        let flushed = inner.pending.len();
        inner.pending.clear();
        tracing::debug!(target: "progress",
            "Flushed {} addresses to {}", flushed, self.path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().finalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().finalized.is_empty()
    }
}
