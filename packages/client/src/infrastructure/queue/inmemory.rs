//! InMemory OutboundQueue 実装
//!
//! ドメイン層が定義する `OutboundQueue` trait の具体的な実装。
//! `Arc<Mutex<Vec<_>>>` を共有するため、clone した側からも同じキューが見えます
//! （テストで ConnectionManager に渡した後も中身を確認できる）。

use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{OutboundQueue, QueueEntry, QueueError, queue::partition_entries};

/// インメモリのオフライン送信キュー
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutboundQueue {
    entries: Arc<Mutex<Vec<QueueEntry>>>,
}

impl InMemoryOutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のエントリで初期化
    pub fn with_entries(entries: Vec<QueueEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueueEntry>> {
        // 中断されたロックでも Vec 自体は壊れていない
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutboundQueue for InMemoryOutboundQueue {
    fn enqueue(&mut self, entry: QueueEntry) -> Result<(), QueueError> {
        self.lock().push(entry);
        Ok(())
    }

    fn flush(
        &mut self,
        predicate: &dyn Fn(&QueueEntry) -> bool,
    ) -> Result<Vec<QueueEntry>, QueueError> {
        let mut entries = self.lock();
        let (flushed, remaining) = partition_entries(std::mem::take(&mut *entries), predicate);
        *entries = remaining;
        Ok(flushed)
    }

    fn requeue_front(&mut self, entries: Vec<QueueEntry>) -> Result<(), QueueError> {
        let mut queued = self.lock();
        let later = std::mem::replace(&mut *queued, entries);
        queued.extend(later);
        Ok(())
    }

    fn entries(&self) -> Vec<QueueEntry> {
        self.lock().clone()
    }
}
