//! Offline outbound queue interface.
//!
//! A single ordered list, not partitioned by room. The session layer depends on
//! this trait; implementations live in `infrastructure::queue`.

use serde::{Deserialize, Serialize};

use super::error::QueueError;
use super::message::OutboundPayload;
use super::value_object::RoomId;

/// An outbound payload waiting for its room's connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub room: RoomId,
    pub payload: OutboundPayload,
}

impl QueueEntry {
    pub fn new(room: RoomId, payload: OutboundPayload) -> Self {
        Self { room, payload }
    }
}

/// What happens to entries for other rooms when a room's connection opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Leave them queued until their room is active again
    #[default]
    RetainOtherRooms,
    /// Discard them
    DropOtherRooms,
}

/// Storage for not-yet-sent payloads
pub trait OutboundQueue: Send {
    /// Append an entry at the end
    fn enqueue(&mut self, entry: QueueEntry) -> Result<(), QueueError>;

    /// Remove and return, in original order, the entries matching `predicate`.
    ///
    /// The remaining entries keep their relative order.
    fn flush(
        &mut self,
        predicate: &dyn Fn(&QueueEntry) -> bool,
    ) -> Result<Vec<QueueEntry>, QueueError>;

    /// Put entries taken by [`OutboundQueue::flush`] back ahead of everything
    /// else, keeping their order
    fn requeue_front(&mut self, entries: Vec<QueueEntry>) -> Result<(), QueueError>;

    /// Snapshot of the queued entries in order
    fn entries(&self) -> Vec<QueueEntry>;

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `entries` into (matching, remaining), both in original order
pub(crate) fn partition_entries(
    entries: Vec<QueueEntry>,
    predicate: &dyn Fn(&QueueEntry) -> bool,
) -> (Vec<QueueEntry>, Vec<QueueEntry>) {
    entries.into_iter().partition(|entry| predicate(entry))
}
