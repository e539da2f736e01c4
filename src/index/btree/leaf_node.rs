//! B+tree leaf node.
//!
//! A leaf holds a sorted run of `(RecordId, Key)` entries plus a forward
//! pointer to the next leaf in key order. Nodes are decoded from a page,
//! modified in memory and encoded back; nothing is cached between calls.

use crate::common::config::{COUNT_SIZE, LEAF_CAPACITY, LEAF_ENTRY_SIZE, PAGE_SIZE, RECORD_ID_SIZE};
use crate::common::{Error, Key, PageId, RecordId, Result};
use crate::storage::page::Page;
use crate::storage::PageStore;

/// One leaf entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafEntry {
    pub key: Key,
    pub rid: RecordId,
}

/// In-memory form of a leaf page.
///
/// # Page Layout
/// ```text
/// ┌────────────────────┬────────────────────┬─────┬───────────┬──────┬───────┐
/// │ entry 0            │ entry 1            │ ... │ next leaf │ .... │ count │
/// │ pid | slot | key   │ pid | slot | key   │     │ (u32)     │      │ (u32) │
/// └────────────────────┴────────────────────┴─────┴───────────┴──────┴───────┘
///   offset 0             12                        count × 12         PAGE_SIZE-4
/// ```
///
/// The forward pointer sits immediately after the last live entry, so it
/// moves whenever the entry count changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    entries: Vec<LeafEntry>,
    next_leaf: PageId,
}

impl LeafNode {
    /// Maximum entries a leaf page can hold.
    pub const CAPACITY: usize = LEAF_CAPACITY;

    const OFFSET_COUNT: usize = PAGE_SIZE - COUNT_SIZE;

    /// Create an empty leaf with no successor.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_leaf: PageId::INVALID,
        }
    }

    /// Read and decode the leaf stored at `page_id`.
    pub fn read<S: PageStore + ?Sized>(store: &mut S, page_id: PageId) -> Result<Self> {
        let page = store.read_page(page_id)?;
        Self::from_page(&page, page_id)
    }

    /// Encode this leaf and write it to `page_id`.
    pub fn write<S: PageStore + ?Sized>(&self, store: &mut S, page_id: PageId) -> Result<()> {
        store.write_page(page_id, &self.to_page())
    }

    /// Decode a leaf from raw page bytes.
    ///
    /// # Errors
    /// `Error::CorruptedPage` if the stored count exceeds [`LeafNode::CAPACITY`].
    pub fn from_page(page: &Page, page_id: PageId) -> Result<Self> {
        let count = page.read_u32(Self::OFFSET_COUNT) as usize;
        if count > Self::CAPACITY {
            return Err(Error::corrupted(
                page_id.0,
                format!("leaf entry count {count} exceeds capacity {}", Self::CAPACITY),
            ));
        }

        let entries = (0..count)
            .map(|i| {
                let offset = i * LEAF_ENTRY_SIZE;
                LeafEntry {
                    rid: RecordId::new(PageId::new(page.read_u32(offset)), page.read_u32(offset + 4)),
                    key: page.read_i32(offset + RECORD_ID_SIZE),
                }
            })
            .collect();
        let next_leaf = PageId::new(page.read_u32(count * LEAF_ENTRY_SIZE));

        Ok(Self { entries, next_leaf })
    }

    /// Encode this leaf into a fresh page.
    pub fn to_page(&self) -> Page {
        let mut page = Page::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let offset = i * LEAF_ENTRY_SIZE;
            page.write_u32(offset, entry.rid.page_id.0);
            page.write_u32(offset + 4, entry.rid.slot);
            page.write_i32(offset + RECORD_ID_SIZE, entry.key);
        }
        page.write_u32(self.entries.len() * LEAF_ENTRY_SIZE, self.next_leaf.0);
        page.write_u32(Self::OFFSET_COUNT, self.entries.len() as u32);
        page
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live entries in key order.
    #[inline]
    pub fn entries(&self) -> &[LeafEntry] {
        &self.entries
    }

    /// Insert an entry, keeping keys non-decreasing.
    ///
    /// Equal keys keep insertion order: the new entry lands after every
    /// existing entry with the same key.
    ///
    /// # Errors
    /// `Error::NodeFull` if the page has no room for another entry.
    pub fn insert(&mut self, key: Key, rid: RecordId) -> Result<()> {
        if self.entries.len() + 1 > Self::CAPACITY {
            return Err(Error::NodeFull);
        }
        let pos = self.entries.partition_point(|e| e.key <= key);
        self.entries.insert(pos, LeafEntry { key, rid });
        Ok(())
    }

    /// Insert an entry, then move the upper half into a new sibling.
    ///
    /// The split point is `len / 2` after insertion, so the left half keeps
    /// the smaller share when the total is odd. The sibling inherits this
    /// leaf's forward pointer; the caller must point this leaf at the
    /// sibling once the sibling has a page id.
    ///
    /// Returns the sibling's first key (the separator to promote) and the sibling.
    pub fn insert_and_split(&mut self, key: Key, rid: RecordId) -> Result<(Key, LeafNode)> {
        self.insert(key, rid)?;

        let mid = self.entries.len() / 2;
        let sibling = LeafNode {
            entries: self.entries.split_off(mid),
            next_leaf: self.next_leaf,
        };
        let separator = sibling.entries[0].key;

        Ok((separator, sibling))
    }

    /// Find the first entry with key `>= search_key`.
    ///
    /// `Ok(index)` on an exact match. `Err(index)` otherwise, where `index`
    /// is still the first entry with a greater key (or `len()` if every key
    /// is smaller), so range scans can start from a miss.
    pub fn locate(&self, search_key: Key) -> std::result::Result<usize, usize> {
        let pos = self.entries.partition_point(|e| e.key < search_key);
        match self.entries.get(pos) {
            Some(entry) if entry.key == search_key => Ok(pos),
            _ => Err(pos),
        }
    }

    /// Read entry `index`.
    ///
    /// # Errors
    /// `Error::InvalidCursor` if `index` is not in `0..len()`.
    pub fn read_entry(&self, index: usize) -> Result<LeafEntry> {
        self.entries.get(index).copied().ok_or(Error::InvalidCursor)
    }

    /// Page id of the next leaf in key order, or `PageId::INVALID` for the last leaf.
    #[inline]
    pub fn next_leaf(&self) -> PageId {
        self.next_leaf
    }

    #[inline]
    pub fn set_next_leaf(&mut self, page_id: PageId) {
        self.next_leaf = page_id;
    }
}

impl Default for LeafNode {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rid(n: u32) -> RecordId {
        RecordId::new(PageId::new(n), n % 7)
    }

    fn leaf_with(keys: &[Key]) -> LeafNode {
        let mut leaf = LeafNode::new();
        for (i, &k) in keys.iter().enumerate() {
            leaf.insert(k, rid(i as u32)).unwrap();
        }
        leaf
    }

    fn keys(leaf: &LeafNode) -> Vec<Key> {
        leaf.entries().iter().map(|e| e.key).collect()
    }

    #[test]
    fn test_insert_keeps_order() {
        let leaf = leaf_with(&[30, 10, 20, 40, 5]);
        assert_eq!(keys(&leaf), vec![5, 10, 20, 30, 40]);
    }

    #[test]
    fn test_duplicates_keep_insertion_order() {
        let mut leaf = LeafNode::new();
        leaf.insert(7, rid(1)).unwrap();
        leaf.insert(3, rid(2)).unwrap();
        leaf.insert(7, rid(3)).unwrap();
        leaf.insert(7, rid(4)).unwrap();

        let rids: Vec<_> = leaf.entries().iter().map(|e| e.rid).collect();
        assert_eq!(rids, vec![rid(2), rid(1), rid(3), rid(4)]);
        assert_eq!(leaf.locate(7), Ok(1));
    }

    #[test]
    fn test_insert_full_node() {
        let mut leaf = LeafNode::new();
        for k in 0..LeafNode::CAPACITY as Key {
            leaf.insert(k, rid(k as u32)).unwrap();
        }
        assert!(matches!(leaf.insert(-1, rid(0)), Err(Error::NodeFull)));
        assert_eq!(leaf.len(), LeafNode::CAPACITY);
    }

    #[test]
    fn test_locate_hit_and_miss() {
        let leaf = leaf_with(&[10, 20, 30]);
        assert_eq!(leaf.locate(20), Ok(1));
        assert_eq!(leaf.locate(5), Err(0));
        assert_eq!(leaf.locate(25), Err(2));
        assert_eq!(leaf.locate(31), Err(3));
        assert_eq!(LeafNode::new().locate(1), Err(0));
    }

    #[test]
    fn test_read_entry_bounds() {
        let leaf = leaf_with(&[1, 2]);
        assert_eq!(leaf.read_entry(1).unwrap().key, 2);
        assert!(matches!(leaf.read_entry(2), Err(Error::InvalidCursor)));
    }

    #[test]
    fn test_split_moves_upper_half() {
        let mut leaf = leaf_with(&[1, 2, 3, 4]);
        leaf.set_next_leaf(PageId::new(99));

        let (separator, sibling) = leaf.insert_and_split(5, rid(5)).unwrap();

        assert_eq!(keys(&leaf), vec![1, 2]);
        assert_eq!(keys(&sibling), vec![3, 4, 5]);
        assert_eq!(separator, 3);
        assert_eq!(sibling.next_leaf(), PageId::new(99));
    }

    #[test]
    fn test_split_new_key_at_midpoint() {
        // [10, 20, 30, 40] + 25 -> [10, 20, 25, 30, 40], split at 2
        let mut leaf = leaf_with(&[10, 20, 30, 40]);
        let (separator, sibling) = leaf.insert_and_split(25, rid(9)).unwrap();

        assert_eq!(keys(&leaf), vec![10, 20]);
        assert_eq!(keys(&sibling), vec![25, 30, 40]);
        assert_eq!(separator, 25);
    }

    #[test]
    fn test_page_roundtrip_and_layout() {
        let mut leaf = leaf_with(&[-5, 17]);
        leaf.set_next_leaf(PageId::new(12));
        let page = leaf.to_page();

        // entry 1: pid, slot, key
        assert_eq!(page.read_u32(LEAF_ENTRY_SIZE), 1);
        assert_eq!(page.read_u32(LEAF_ENTRY_SIZE + 4), 1);
        assert_eq!(page.read_i32(LEAF_ENTRY_SIZE + 8), 17);
        assert_eq!(page.read_i32(8), -5);
        // forward pointer right after entry 1
        assert_eq!(page.read_u32(2 * LEAF_ENTRY_SIZE), 12);
        assert_eq!(page.read_u32(PAGE_SIZE - 4), 2);

        let decoded = LeafNode::from_page(&page, PageId::new(3)).unwrap();
        assert_eq!(decoded, leaf);
    }

    #[test]
    fn test_from_page_rejects_bad_count() {
        let mut page = Page::new();
        page.write_u32(PAGE_SIZE - 4, LeafNode::CAPACITY as u32 + 1);
        assert!(matches!(
            LeafNode::from_page(&page, PageId::new(4)),
            Err(Error::CorruptedPage { page_id: 4, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_split_conserves_entries(
            keys_in in proptest::collection::vec(-1000i32..1000, 1..64),
            extra in -1000i32..1000,
        ) {
            let mut leaf = leaf_with(&keys_in);
            let before = leaf.len();

            let (separator, sibling) = leaf.insert_and_split(extra, rid(0)).unwrap();

            prop_assert_eq!(before + 1, leaf.len() + sibling.len());
            prop_assert_eq!(leaf.len(), (before + 1) / 2);
            prop_assert_eq!(separator, sibling.entries()[0].key);
            prop_assert!(leaf.entries().iter().all(|e| e.key <= separator));

            let mut merged = keys(&leaf);
            merged.extend(keys(&sibling));
            let mut expected = keys_in.clone();
            expected.push(extra);
            expected.sort();
            prop_assert_eq!(merged, expected);
        }
    }
}
