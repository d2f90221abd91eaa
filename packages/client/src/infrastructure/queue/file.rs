//! File-backed offline queue.
//!
//! The whole list is stored as one JSON array. Every mutation rewrites it
//! through a temporary file and a rename so a crash never leaves a truncated
//! queue behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::{OutboundQueue, QueueEntry, QueueError, queue::partition_entries};

#[derive(Debug)]
pub struct FileOutboundQueue {
    path: PathBuf,
    entries: Vec<QueueEntry>,
}

impl FileOutboundQueue {
    /// Load the queue stored at `path`.
    ///
    /// A missing file is an empty queue. A corrupt file is logged and replaced
    /// by an empty queue on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(
                    "Offline queue at {} is unreadable, starting empty: {}",
                    path.display(),
                    e
                );
                Vec::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(
            "Loaded {} queued message(s) from {}",
            entries.len(),
            path.display()
        );
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), QueueError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl OutboundQueue for FileOutboundQueue {
    fn enqueue(&mut self, entry: QueueEntry) -> Result<(), QueueError> {
        self.entries.push(entry);
        self.persist()
    }

    fn flush(
        &mut self,
        predicate: &dyn Fn(&QueueEntry) -> bool,
    ) -> Result<Vec<QueueEntry>, QueueError> {
        let (flushed, remaining) = partition_entries(self.entries.clone(), predicate);
        if flushed.is_empty() {
            return Ok(flushed);
        }
        let previous = std::mem::replace(&mut self.entries, remaining);
        if let Err(e) = self.persist() {
            // Nothing leaves the queue unless the file agrees
            self.entries = previous;
            return Err(e);
        }
        Ok(flushed)
    }

    fn requeue_front(&mut self, entries: Vec<QueueEntry>) -> Result<(), QueueError> {
        let later = std::mem::replace(&mut self.entries, entries);
        self.entries.extend(later);
        self.persist()
    }

    fn entries(&self) -> Vec<QueueEntry> {
        self.entries.clone()
    }
}
