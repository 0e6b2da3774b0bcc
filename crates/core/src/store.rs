use rustc_hash::FxHashMap;

use crate::error::StoreError;

/// Interned id of a processed source file; resolved through the run's
/// source archive.
pub type SourceKey = u32;

/// Where a frame id was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    pub source: SourceKey,
    pub index: usize,
}

/// Mapping from frame id to its most recent occurrence. Last writer wins;
/// a single forward pass with greedy extension only ever needs the closest
/// prior occurrence, so history is never replayed.
///
/// Operations return `Result` so that I/O-bound backends can fail; they are
/// also the only places a backend may block. `close` releases resources and
/// is idempotent.
pub trait FrameStore {
    fn get(&mut self, id: u64) -> Result<Option<FrameRecord>, StoreError>;
    fn set(&mut self, id: u64, record: FrameRecord) -> Result<(), StoreError>;
    fn close(&mut self) -> Result<(), StoreError>;
}

/// Default in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: FxHashMap<u64, FrameRecord>,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FrameStore for MemoryStore {
    fn get(&mut self, id: u64) -> Result<Option<FrameRecord>, StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(self.records.get(&id).copied())
    }

    fn set(&mut self, id: u64, record: FrameRecord) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        self.records.insert(id, record);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.records = FxHashMap::default();
        self.closed = true;
        Ok(())
    }
}
