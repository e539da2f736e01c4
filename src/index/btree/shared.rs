//! Thread-shareable handle around a [`BTreeIndex`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{Key, RecordId, Result};
use crate::storage::{DiskManager, PageStore};

use super::btree_index::BTreeIndex;
use super::cursor::{Cursor, LocateResult};

/// A [`BTreeIndex`] behind a `parking_lot::Mutex`.
///
/// # Thread Safety
/// Every call takes the lock for its full duration, so operations are
/// serialized: one insert or one lookup at a time. Cursors stay valid
/// across calls only while no other handle inserts.
///
/// Clones share the same index.
pub struct SharedIndex<S: PageStore = DiskManager> {
    inner: Arc<Mutex<BTreeIndex<S>>>,
}

impl<S: PageStore> Clone for SharedIndex<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PageStore> SharedIndex<S> {
    pub fn new(index: BTreeIndex<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(index)),
        }
    }

    pub fn insert(&self, key: Key, rid: RecordId) -> Result<()> {
        self.inner.lock().insert(key, rid)
    }

    pub fn locate(&self, key: Key) -> Result<LocateResult> {
        self.inner.lock().locate(key)
    }

    pub fn read_forward(&self, cursor: &mut Cursor) -> Result<(Key, RecordId)> {
        self.inner.lock().read_forward(cursor)
    }

    /// All entries with `min <= key <= max`, collected under one lock.
    pub fn collect_range(&self, min: Key, max: Key) -> Result<Vec<(Key, RecordId)>> {
        let mut index = self.inner.lock();
        let entries = index.range(min, max)?.collect();
        entries
    }

    /// Run `f` with exclusive access to the index.
    pub fn with<R>(&self, f: impl FnOnce(&mut BTreeIndex<S>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Unwrap the index if this is the last handle; otherwise return `self`.
    pub fn into_inner(self) -> std::result::Result<BTreeIndex<S>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
