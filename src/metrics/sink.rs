//! Outbound item sinks
//!
//! The probe never blocks on its sink: `enqueue` either accepts the item
//! immediately or reports why it could not.

use std::collections::VecDeque;
use std::sync::mpsc::{SyncSender, TrySendError};

use parking_lot::Mutex;

use super::item::Item;
use crate::utils::SinkError;

/// Non-blocking destination for built items
pub trait ItemSink {
    fn enqueue(&mut self, item: Item) -> Result<(), SinkError>;
}

impl ItemSink for Vec<Item> {
    fn enqueue(&mut self, item: Item) -> Result<(), SinkError> {
        self.push(item);
        Ok(())
    }
}

impl ItemSink for SyncSender<Item> {
    fn enqueue(&mut self, item: Item) -> Result<(), SinkError> {
        self.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Closed,
        })
    }
}

/// Bounded, thread-safe item queue
///
/// Producers push through a shared reference; a consumer drains in FIFO order.
pub struct ItemQueue {
    items: Mutex<VecDeque<Item>>,
    capacity: usize,
}

impl ItemQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
        }
    }

    /// Push without blocking. Fails when the queue already holds `capacity` items.
    pub fn try_push(&self, item: Item) -> Result<(), SinkError> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(SinkError::Full);
        }
        items.push_back(item);
        Ok(())
    }

    /// Take every queued item, oldest first
    pub fn drain(&self) -> Vec<Item> {
        self.items.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl ItemSink for ItemQueue {
    fn enqueue(&mut self, item: Item) -> Result<(), SinkError> {
        self.try_push(item)
    }
}

/// Shared handle, e.g. through an `Arc<ItemQueue>`
impl ItemSink for &ItemQueue {
    fn enqueue(&mut self, item: Item) -> Result<(), SinkError> {
        self.try_push(item)
    }
}
