//! Injected cache for ingested tables, keyed by content digest.

use super::{ingest, reader::content_digest, IngestError};
use crate::domain::RawTable;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Storage for already-ingested tables.
pub trait TableCache: Send + Sync {
    fn get(&self, digest: &str) -> Option<RawTable>;
    fn put(&self, digest: String, table: RawTable);
    /// Drop the oldest entry, returning its key.
    fn evict_oldest(&self) -> Option<String>;
}

/// Bounded FIFO cache held in process memory.
#[derive(Debug)]
pub struct InMemoryTableCache {
    capacity: usize,
    inner: Mutex<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    order: VecDeque<String>,
    tables: HashMap<String, RawTable>,
}

impl InMemoryTableCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|s| s.tables.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TableCache for InMemoryTableCache {
    fn get(&self, digest: &str) -> Option<RawTable> {
        self.inner.lock().ok()?.tables.get(digest).cloned()
    }

    fn put(&self, digest: String, table: RawTable) {
        let over_capacity = {
            let Ok(mut state) = self.inner.lock() else {
                return;
            };
            if state.tables.insert(digest.clone(), table).is_none() {
                state.order.push_back(digest);
            }
            state.tables.len() > self.capacity
        };
        if over_capacity {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&self) -> Option<String> {
        let mut state = self.inner.lock().ok()?;
        let key = state.order.pop_front()?;
        state.tables.remove(&key);
        Some(key)
    }
}

/// [`ingest`] with a cache lookup on the content digest.
pub fn ingest_cached(bytes: &[u8], cache: &dyn TableCache) -> Result<RawTable, IngestError> {
    let digest = content_digest(bytes);
    if let Some(table) = cache.get(&digest) {
        return Ok(table);
    }
    let table = ingest(bytes)?;
    cache.put(digest, table.clone());
    Ok(table)
}
