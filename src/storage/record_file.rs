//! Record heap - a sequential file of `(key, value)` tuples.
//!
//! Tuples are appended in arrival order and addressed by [`RecordId`]. The
//! B+tree index stores these ids as its leaf payload.

use std::path::Path;

use crate::common::config::{MAX_VALUE_LEN, PAGE_SIZE};
use crate::common::{Error, Key, PageId, RecordId, Result};
use crate::storage::page::{HeapPageHeader, Page};
use crate::storage::page_store::{OpenMode, PageStore};
use crate::storage::DiskManager;

/// A heap tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub key: Key,
    pub value: String,
}

/// Append-only tuple storage over a [`PageStore`].
///
/// # Page Layout
/// ```text
/// ┌────────────┬──────────┬──────────┬─────┬──────────────┐
/// │ header (8) │ slot 0   │ slot 1   │ ... │ slot 37      │
/// └────────────┴──────────┴──────────┴─────┴──────────────┘
/// slot = key (i32) | value length (u16) | value bytes (MAX_VALUE_LEN)
/// ```
///
/// Slots fill from 0 upward; only the last page may be partially full.
pub struct RecordFile<S: PageStore = DiskManager> {
    store: S,
    /// One past the last stored record.
    end_rid: RecordId,
}

impl RecordFile<DiskManager> {
    /// Open the heap file at `path`.
    ///
    /// `OpenMode::Write` creates the file when it does not exist.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::from_store(DiskManager::open_with_mode(path, mode)?)
    }
}

impl<S: PageStore> RecordFile<S> {
    /// Bytes per record slot.
    pub const SLOT_SIZE: usize = 4 + 2 + MAX_VALUE_LEN;

    /// Record slots per heap page.
    pub const SLOTS_PER_PAGE: usize = (PAGE_SIZE - HeapPageHeader::SIZE) / Self::SLOT_SIZE;

    /// Wrap a page store, recovering the end-of-file record id from its last page.
    pub fn from_store(mut store: S) -> Result<Self> {
        let page_count = store.page_count();
        let end_rid = if page_count == 0 {
            RecordId::new(PageId::new(0), 0)
        } else {
            let last = PageId::new(page_count - 1);
            let page = Self::read_checked(&mut store, last)?;
            let count = page.heap_header().record_count as usize;
            if count > Self::SLOTS_PER_PAGE {
                return Err(Error::corrupted(last.0, format!("record count {count}")));
            }
            Self::position(last, count)
        };

        Ok(Self { store, end_rid })
    }

    /// Id the next appended record will receive.
    #[inline]
    pub fn end_rid(&self) -> RecordId {
        self.end_rid
    }

    /// The record id following `rid` in heap order.
    pub fn next_rid(rid: RecordId) -> RecordId {
        Self::position(rid.page_id, rid.slot as usize + 1)
    }

    fn position(page_id: PageId, slot: usize) -> RecordId {
        if slot >= Self::SLOTS_PER_PAGE {
            RecordId::new(PageId::new(page_id.0 + 1), 0)
        } else {
            RecordId::new(page_id, slot as u32)
        }
    }

    fn slot_offset(slot: u32) -> usize {
        HeapPageHeader::SIZE + slot as usize * Self::SLOT_SIZE
    }

    fn read_checked(store: &mut S, page_id: PageId) -> Result<Page> {
        let page = store.read_page(page_id)?;
        if !page.verify_checksum() {
            return Err(Error::ChecksumMismatch(page_id.0));
        }
        Ok(page)
    }

    /// Append a tuple and return its record id.
    ///
    /// # Errors
    /// - `Error::ValueTooLong` if `value` exceeds `MAX_VALUE_LEN` bytes
    /// - `Error::ReadOnly` if the heap was opened for reading
    pub fn append(&mut self, key: Key, value: &str) -> Result<RecordId> {
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::ValueTooLong {
                len: value.len(),
                max: MAX_VALUE_LEN,
            });
        }

        let rid = self.end_rid;
        let mut page = if rid.page_id.0 == self.store.page_count() {
            let page_id = self.store.allocate_page()?;
            debug_assert_eq!(page_id, rid.page_id);
            Page::new()
        } else {
            Self::read_checked(&mut self.store, rid.page_id)?
        };

        let offset = Self::slot_offset(rid.slot);
        page.write_i32(offset, key);
        page.write_u16(offset + 4, value.len() as u16);
        let bytes = &mut page.as_mut_slice()[offset + 6..offset + Self::SLOT_SIZE];
        bytes.fill(0);
        bytes[..value.len()].copy_from_slice(value.as_bytes());

        page.set_heap_header(&HeapPageHeader::new(rid.slot as u16 + 1));
        page.update_checksum();
        self.store.write_page(rid.page_id, &page)?;

        self.end_rid = Self::next_rid(rid);
        Ok(rid)
    }

    /// Read the tuple stored at `rid`.
    ///
    /// # Errors
    /// - `Error::NoSuchRecord` if `rid` is at or past [`RecordFile::end_rid`]
    /// - `Error::ChecksumMismatch` if the page fails verification
    pub fn read(&mut self, rid: RecordId) -> Result<Tuple> {
        if rid >= self.end_rid || rid.slot as usize >= Self::SLOTS_PER_PAGE {
            return Err(Error::NoSuchRecord);
        }
        let page = Self::read_checked(&mut self.store, rid.page_id)?;
        Self::decode(&page, rid)
    }

    fn decode(page: &Page, rid: RecordId) -> Result<Tuple> {
        let offset = Self::slot_offset(rid.slot);
        let key = page.read_i32(offset);
        let len = page.read_u16(offset + 4) as usize;
        if len > MAX_VALUE_LEN {
            return Err(Error::corrupted(
                rid.page_id.0,
                format!("slot {} value length {len}", rid.slot),
            ));
        }
        let bytes = &page.as_slice()[offset + 6..offset + 6 + len];
        let value = String::from_utf8(bytes.to_vec()).map_err(|_| {
            Error::corrupted(rid.page_id.0, format!("slot {} is not UTF-8", rid.slot))
        })?;
        Ok(Tuple { key, value })
    }

    /// Iterate over every tuple in heap order.
    pub fn scan(&mut self) -> RecordScan<'_, S> {
        RecordScan {
            file: self,
            next: RecordId::new(PageId::new(0), 0),
            page: None,
        }
    }

    /// Flush all writes and release the file.
    pub fn close(mut self) -> Result<()> {
        self.store.sync()
    }
}

/// Sequential heap iterator returned by [`RecordFile::scan`].
///
/// Keeps the current page buffered so each page is read once.
pub struct RecordScan<'a, S: PageStore> {
    file: &'a mut RecordFile<S>,
    next: RecordId,
    page: Option<(PageId, Page)>,
}

impl<S: PageStore> Iterator for RecordScan<'_, S> {
    type Item = Result<(RecordId, Tuple)>;

    fn next(&mut self) -> Option<Self::Item> {
        let rid = self.next;
        if rid >= self.file.end_rid {
            return None;
        }

        let cached = matches!(&self.page, Some((pid, _)) if *pid == rid.page_id);
        if !cached {
            match RecordFile::<S>::read_checked(&mut self.file.store, rid.page_id) {
                Ok(page) => self.page = Some((rid.page_id, page)),
                Err(e) => {
                    self.next = self.file.end_rid;
                    return Some(Err(e));
                }
            }
        }

        self.next = RecordFile::<S>::next_rid(rid);
        let (_, page) = self.page.as_ref()?;
        Some(RecordFile::<S>::decode(page, rid).map(|tuple| (rid, tuple)))
    }
}
