//! B+tree internal (routing) node.

use crate::common::config::{COUNT_SIZE, INTERNAL_CAPACITY, KEY_SIZE, PAGE_ID_SIZE, PAGE_SIZE};
use crate::common::{Error, Key, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PageStore;

/// In-memory form of an internal page: `p0, k0, p1, k1, ..., k(n-1), p(n)`.
///
/// Child `p(i)` covers keys `k(i-1) <= x < k(i)`; a key equal to a
/// separator routes to the child on the separator's right.
///
/// # Page Layout
/// ```text
/// ┌──────┬──────┬──────┬──────┬─────┬────────┬──────┬──────┬───────┐
/// │ pid0 │ key0 │ pid1 │ key1 │ ... │ key n-1│ pid n│ .... │ count │
/// └──────┴──────┴──────┴──────┴─────┴────────┴──────┴──────┴───────┘
///   0      4      8      12                                PAGE_SIZE-4
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    keys: Vec<Key>,
    /// Always `keys.len() + 1` entries.
    children: Vec<PageId>,
}

impl InternalNode {
    /// Maximum separator keys an internal page can hold.
    pub const CAPACITY: usize = INTERNAL_CAPACITY;

    const PAIR_SIZE: usize = KEY_SIZE + PAGE_ID_SIZE;
    const OFFSET_COUNT: usize = PAGE_SIZE - COUNT_SIZE;

    /// Create a node with no keys and an unset first child.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            children: vec![PageId::INVALID],
        }
    }

    /// Read and decode the internal node stored at `page_id`.
    pub fn read<S: PageStore + ?Sized>(store: &mut S, page_id: PageId) -> Result<Self> {
        let page = store.read_page(page_id)?;
        Self::from_page(&page, page_id)
    }

    /// Encode this node and write it to `page_id`.
    pub fn write<S: PageStore + ?Sized>(&self, store: &mut S, page_id: PageId) -> Result<()> {
        store.write_page(page_id, &self.to_page())
    }

    fn key_offset(i: usize) -> usize {
        PAGE_ID_SIZE + i * Self::PAIR_SIZE
    }

    fn child_offset(i: usize) -> usize {
        i * Self::PAIR_SIZE
    }

    /// Decode a node from raw page bytes.
    ///
    /// # Errors
    /// `Error::CorruptedPage` if the stored key count exceeds [`InternalNode::CAPACITY`].
    pub fn from_page(page: &Page, page_id: PageId) -> Result<Self> {
        let count = page.read_u32(Self::OFFSET_COUNT) as usize;
        if count > Self::CAPACITY {
            return Err(Error::corrupted(
                page_id.0,
                format!("internal key count {count} exceeds capacity {}", Self::CAPACITY),
            ));
        }

        let keys = (0..count).map(|i| page.read_i32(Self::key_offset(i))).collect();
        let children = (0..=count)
            .map(|i| PageId::new(page.read_u32(Self::child_offset(i))))
            .collect();

        Ok(Self { keys, children })
    }

    /// Encode this node into a fresh page.
    pub fn to_page(&self) -> Page {
        let mut page = Page::new();
        for (i, child) in self.children.iter().enumerate() {
            page.write_u32(Self::child_offset(i), child.0);
        }
        for (i, &key) in self.keys.iter().enumerate() {
            page.write_i32(Self::key_offset(i), key);
        }
        page.write_u32(Self::OFFSET_COUNT, self.keys.len() as u32);
        page
    }

    /// Number of separator keys.
    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[inline]
    pub fn children(&self) -> &[PageId] {
        &self.children
    }

    /// Insert a separator and the child to its right, placed by key.
    ///
    /// # Errors
    /// `Error::NodeFull` if the page has no room for another key.
    pub fn insert(&mut self, key: Key, child: PageId) -> Result<()> {
        self.insert_after(self.locate_child_index(key), key, child)
    }

    /// Insert `key` and `child` directly to the right of child `index`.
    ///
    /// Used when child `index` has split and `child` is its new right
    /// sibling. Placing by position keeps the children in leaf-chain order
    /// even when `key` equals separators already in the node.
    ///
    /// # Errors
    /// - `Error::NodeFull` if the page has no room for another key
    /// - `Error::InvalidCursor` if `index` is not a child position
    pub fn insert_after(&mut self, index: usize, key: Key, child: PageId) -> Result<()> {
        if self.keys.len() + 1 > Self::CAPACITY {
            return Err(Error::NodeFull);
        }
        if index > self.keys.len() {
            return Err(Error::InvalidCursor);
        }
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
        Ok(())
    }

    /// Insert a separator by key, then split around the middle key.
    ///
    /// See [`InternalNode::insert_after_and_split`].
    pub fn insert_and_split(&mut self, key: Key, child: PageId) -> Result<(Key, InternalNode)> {
        self.insert_after_and_split(self.locate_child_index(key), key, child)
    }

    /// Insert to the right of child `index`, then split around the middle key.
    ///
    /// With `n` keys after the insertion and `m = n / 2`, key `m` is
    /// promoted and kept in neither half. This node keeps keys `0..m` and
    /// children `0..=m`; the sibling gets child `m + 1` as its first child
    /// followed by the remaining keys and children.
    ///
    /// Returns the promoted key and the sibling.
    pub fn insert_after_and_split(
        &mut self,
        index: usize,
        key: Key,
        child: PageId,
    ) -> Result<(Key, InternalNode)> {
        self.insert_after(index, key, child)?;

        // At least one key after the insert, so `mid` is in range.
        let mid = self.keys.len() / 2;
        let mid_key = self.keys[mid];
        let sibling = InternalNode {
            keys: self.keys.split_off(mid + 1),
            children: self.children.split_off(mid + 1),
        };
        self.keys.truncate(mid);

        Ok((mid_key, sibling))
    }

    /// Position of the child to follow when inserting `search_key`.
    ///
    /// A key equal to a separator goes right, so new duplicates land after
    /// the ones already stored.
    pub fn locate_child_index(&self, search_key: Key) -> usize {
        self.keys.partition_point(|&k| k <= search_key)
    }

    /// Child to follow when inserting `search_key`.
    pub fn locate_child_ptr(&self, search_key: Key) -> PageId {
        self.children[self.locate_child_index(search_key)]
    }

    /// Leftmost child whose subtree may hold `search_key`.
    ///
    /// A split can leave copies of the separator key on both sides of it,
    /// so lookups take the left child on a tie and scan forward from there.
    pub fn locate_first_child_ptr(&self, search_key: Key) -> PageId {
        let index = self.keys.partition_point(|&k| k < search_key);
        self.children[index]
    }

    /// Make this node a fresh root over two children.
    pub fn initialize_root(&mut self, left: PageId, key: Key, right: PageId) {
        self.keys.clear();
        self.keys.push(key);
        self.children.clear();
        self.children.extend([left, right]);
    }

    /// Overwrite the leftmost child pointer.
    #[inline]
    pub fn set_first_child(&mut self, page_id: PageId) {
        self.children[0] = page_id;
    }
}

impl Default for InternalNode {
    fn default() -> Self {
        Self::new()
    }
}
