use super::{DecisionLogEntry, DecisionLogSink};
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

pub type LogBuffer = Arc<RwLock<VecDeque<DecisionLogEntry>>>;

/// Ring buffer of recent decisions, shared with the API.
pub struct MemoryLogSink {
    buffer: LogBuffer,
    capacity: usize,
}

impl MemoryLogSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    // Allow sharing the buffer with API handlers
    pub fn clone_buffer(&self) -> LogBuffer {
        self.buffer.clone()
    }
}

/// Newest-first copy of up to `limit` entries.
pub fn recent(buffer: &LogBuffer, limit: usize) -> Vec<DecisionLogEntry> {
    let buffer = buffer.read().unwrap_or_else(PoisonError::into_inner);
    buffer.iter().rev().take(limit).cloned().collect()
}

impl DecisionLogSink for MemoryLogSink {
    fn log(&self, entry: &DecisionLogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut buffer = self.buffer.write().unwrap_or_else(PoisonError::into_inner);
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(entry.clone());
    }
}
