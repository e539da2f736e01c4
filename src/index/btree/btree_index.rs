//! B+tree index orchestration: open/close, insert with split propagation,
//! locate, and forward scans over the leaf chain.

use std::path::Path;

use tracing::{debug, trace, warn};

use crate::common::config::DEFAULT_BRANCHING_FACTOR;
use crate::common::{Error, Key, PageId, RecordId, Result};
use crate::storage::{DiskManager, OpenMode, PageStore};

use super::cursor::{Cursor, LocateResult};
use super::internal_node::InternalNode;
use super::leaf_node::LeafNode;
use super::metadata::IndexMetadata;

/// Options applied when a new index is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Maximum entries per leaf and keys per internal node.
    pub branching_factor: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            branching_factor: DEFAULT_BRANCHING_FACTOR,
        }
    }
}

/// Result of inserting into a subtree.
enum InsertOutcome {
    Done,
    /// The subtree root split; the parent must absorb `(key, page_id)`.
    Split { key: Key, page_id: PageId },
}

/// Shape summary returned by [`BTreeIndex::validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub height: u32,
    pub internal_nodes: usize,
    pub leaf_nodes: usize,
    pub entries: usize,
}

/// A B+tree over `i32` keys whose leaves point into a record heap.
///
/// # Architecture
/// ```text
///                    page 0: IndexMetadata
///                    ┌────────────────────┐
///                    │ root │ height │ bf  │
///                    └──┬─────────────────┘
///                       ▼
///                 ┌───────────┐
///                 │ internal  │        level 1
///                 └─┬───────┬─┘
///                   ▼       ▼
///             ┌──────┐   ┌──────┐
///             │ leaf │──▶│ leaf │──▶ INVALID   level = height
///             └──────┘   └──────┘
/// ```
///
/// Every operation re-reads the nodes it needs from the page store; no node
/// outlives the call that decoded it. New pages are always appended, so the
/// tree only grows taller when the root splits.
///
/// # Thread Safety
/// None. All operations take `&mut self` and assume a single writer with no
/// concurrent readers. Wrap the index in a
/// [`SharedIndex`](super::SharedIndex) to share it between threads.
///
/// # Example
/// ```no_run
/// use pagetree::index::btree::BTreeIndex;
/// use pagetree::storage::OpenMode;
/// use pagetree::{PageId, RecordId};
///
/// let mut index = BTreeIndex::open("movie.idx", OpenMode::Write).unwrap();
/// index.insert(42, RecordId::new(PageId::new(0), 3)).unwrap();
///
/// let mut cursor = index.locate(42).unwrap().into_exact().unwrap();
/// let (key, rid) = index.read_forward(&mut cursor).unwrap();
/// assert_eq!(key, 42);
/// index.close().unwrap();
/// ```
pub struct BTreeIndex<S: PageStore = DiskManager> {
    store: S,
    root: PageId,
    height: u32,
    branching_factor: usize,
    writable: bool,
    /// Root or height changed since page 0 was last written.
    metadata_dirty: bool,
}

impl BTreeIndex<DiskManager> {
    /// Open the index file at `path` with default options.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::open_with(path, mode, IndexOptions::default())
    }

    /// Open the index file at `path`, creating it with `options` when empty.
    ///
    /// # Errors
    /// Propagates the page store's open error; `Error::CorruptedPage` if
    /// page 0 does not hold valid metadata.
    pub fn open_with<P: AsRef<Path>>(path: P, mode: OpenMode, options: IndexOptions) -> Result<Self> {
        let store = DiskManager::open_with_mode(path, mode)?;
        Self::from_store(store, mode, options)
    }
}

impl<S: PageStore> BTreeIndex<S> {
    /// Open an index over `store`.
    ///
    /// A non-empty store must carry metadata in page 0. An empty store
    /// opened for writing is initialized: page 0 is allocated and written
    /// immediately, so the first leaf becomes page 1.
    pub fn from_store(mut store: S, mode: OpenMode, options: IndexOptions) -> Result<Self> {
        let metadata = if store.page_count() > 0 {
            let page = store.read_page(IndexMetadata::PAGE_ID)?;
            IndexMetadata::from_page(&page)?
        } else {
            IndexMetadata::check_branching_factor(options.branching_factor)?;
            let metadata = IndexMetadata::empty(options.branching_factor);
            if mode.is_writable() {
                let page_id = store.allocate_page()?;
                debug_assert_eq!(page_id, IndexMetadata::PAGE_ID);
                store.write_page(page_id, &metadata.to_page())?;
            }
            metadata
        };

        debug!(
            root = %metadata.root,
            height = metadata.height,
            branching_factor = metadata.branching_factor,
            pages = store.page_count(),
            "opened index"
        );

        Ok(Self {
            store,
            root: metadata.root,
            height: metadata.height,
            branching_factor: metadata.branching_factor,
            writable: mode.is_writable(),
            metadata_dirty: false,
        })
    }

    /// Persist metadata, flush, and release the store.
    ///
    /// A subsequent open recovers the same root, height and branching factor.
    pub fn close(mut self) -> Result<()> {
        if self.writable {
            self.persist_metadata()?;
            self.store.sync()?;
        }
        debug!(root = %self.root, height = self.height, "closed index");
        Ok(())
    }

    fn persist_metadata(&mut self) -> Result<()> {
        self.store
            .write_page(IndexMetadata::PAGE_ID, &self.metadata().to_page())?;
        self.metadata_dirty = false;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current in-memory metadata.
    pub fn metadata(&self) -> IndexMetadata {
        IndexMetadata {
            root: self.root,
            height: self.height,
            branching_factor: self.branching_factor,
        }
    }

    #[inline]
    pub fn root_page_id(&self) -> PageId {
        self.root
    }

    /// Number of levels including the leaves; 0 when empty.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn branching_factor(&self) -> usize {
        self.branching_factor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.root.is_valid()
    }

    /// One past the last allocated page of the index file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.store.page_count()
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert `(key, rid)`.
    ///
    /// Duplicate keys are allowed. Splits propagate upward; a root split
    /// allocates a new root and increases the height by one.
    ///
    /// # Errors
    /// `Error::ReadOnly` for read-mode indexes; page store errors propagate
    /// unchanged and may leave a partially applied split behind.
    pub fn insert(&mut self, key: Key, rid: RecordId) -> Result<()> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }

        if !self.root.is_valid() {
            let page_id = self.store.allocate_page()?;
            let mut leaf = LeafNode::new();
            leaf.insert(key, rid)?;
            leaf.write(&mut self.store, page_id)?;

            self.root = page_id;
            self.height = 1;
            self.metadata_dirty = true;
            debug!(root = %page_id, "created root leaf");
            return Ok(());
        }

        if let InsertOutcome::Split { key: separator, page_id: right } =
            self.insert_into(self.root, 1, key, rid)?
        {
            let new_root = self.store.allocate_page()?;
            let mut root = InternalNode::new();
            root.initialize_root(self.root, separator, right);
            root.write(&mut self.store, new_root)?;

            debug!(
                old_root = %self.root,
                new_root = %new_root,
                separator,
                height = self.height + 1,
                "root split"
            );
            self.root = new_root;
            self.height += 1;
            self.metadata_dirty = true;
        }

        Ok(())
    }

    /// Insert into the subtree rooted at `page_id`, which sits at `level`
    /// (1 = root, `height` = leaves).
    fn insert_into(&mut self, page_id: PageId, level: u32, key: Key, rid: RecordId) -> Result<InsertOutcome> {
        if level >= self.height {
            return self.insert_into_leaf(page_id, key, rid);
        }

        let mut node = InternalNode::read(&mut self.store, page_id)?;
        let index = node.locate_child_index(key);
        let child = node.children()[index];
        trace!(page = %page_id, level, child = %child, "descend for insert");

        let (separator, right) = match self.insert_into(child, level + 1, key, rid)? {
            InsertOutcome::Done => return Ok(InsertOutcome::Done),
            InsertOutcome::Split { key, page_id } => (key, page_id),
        };

        if node.key_count() < self.branching_factor {
            node.insert_after(index, separator, right)?;
            node.write(&mut self.store, page_id)?;
            return Ok(InsertOutcome::Done);
        }

        let (mid_key, sibling) = node.insert_after_and_split(index, separator, right)?;
        let sibling_id = self.store.allocate_page()?;
        node.write(&mut self.store, page_id)?;
        sibling.write(&mut self.store, sibling_id)?;

        debug!(
            page = %page_id,
            sibling = %sibling_id,
            promoted = mid_key,
            "internal split"
        );
        Ok(InsertOutcome::Split {
            key: mid_key,
            page_id: sibling_id,
        })
    }

    fn insert_into_leaf(&mut self, page_id: PageId, key: Key, rid: RecordId) -> Result<InsertOutcome> {
        let mut leaf = LeafNode::read(&mut self.store, page_id)?;

        if leaf.len() < self.branching_factor {
            leaf.insert(key, rid)?;
            leaf.write(&mut self.store, page_id)?;
            return Ok(InsertOutcome::Done);
        }

        let (separator, sibling) = leaf.insert_and_split(key, rid)?;
        let sibling_id = self.store.allocate_page()?;
        leaf.set_next_leaf(sibling_id);
        leaf.write(&mut self.store, page_id)?;
        sibling.write(&mut self.store, sibling_id)?;

        debug!(
            page = %page_id,
            sibling = %sibling_id,
            separator,
            left = leaf.len(),
            right = sibling.len(),
            "leaf split"
        );
        Ok(InsertOutcome::Split {
            key: separator,
            page_id: sibling_id,
        })
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Position of the first entry with key `>= search_key`.
    ///
    /// Descends to the leftmost subtree that may hold `search_key`, since a
    /// leaf split can leave equal keys on both sides of a separator. A miss
    /// whose position falls past the end of a leaf moves to `(next_leaf, 0)`,
    /// which is [`Cursor::END`] after the last leaf or on an empty tree.
    ///
    /// Among duplicates, the cursor lands on the earliest inserted entry, and
    /// a forward scan visits every copy in insertion order.
    pub fn locate(&mut self, search_key: Key) -> Result<LocateResult> {
        if !self.root.is_valid() {
            return Ok(LocateResult::Missing(Cursor::END));
        }

        let mut page_id = self.root;
        for level in 1..self.height {
            let node = InternalNode::read(&mut self.store, page_id)?;
            let child = node.locate_first_child_ptr(search_key);
            trace!(page = %page_id, level, child = %child, "descend for locate");
            page_id = child;
        }

        let leaf = LeafNode::read(&mut self.store, page_id)?;
        match leaf.locate(search_key) {
            Ok(entry) => Ok(LocateResult::Found(Cursor::new(page_id, entry))),
            Err(entry) if entry < leaf.len() => {
                Ok(LocateResult::Missing(Cursor::new(page_id, entry)))
            }
            Err(_) => {
                // Every key here is smaller; the successor opens the next leaf.
                let next = Cursor::new(leaf.next_leaf(), 0);
                if next.is_end() {
                    return Ok(LocateResult::Missing(next));
                }
                let first = LeafNode::read(&mut self.store, next.page_id)?.read_entry(0)?;
                if first.key == search_key {
                    Ok(LocateResult::Found(next))
                } else {
                    Ok(LocateResult::Missing(next))
                }
            }
        }
    }

    /// Read the entry under `cursor` and advance it.
    ///
    /// After the last entry of a leaf the cursor moves to `(next_leaf, 0)`.
    ///
    /// # Errors
    /// `Error::InvalidCursor` at end-of-index or for an entry index outside
    /// the leaf's live range.
    pub fn read_forward(&mut self, cursor: &mut Cursor) -> Result<(Key, RecordId)> {
        if cursor.is_end() {
            return Err(Error::InvalidCursor);
        }

        let leaf = LeafNode::read(&mut self.store, cursor.page_id)?;
        let entry = leaf.read_entry(cursor.entry)?;

        if cursor.entry + 1 >= leaf.len() {
            *cursor = Cursor::new(leaf.next_leaf(), 0);
        } else {
            cursor.entry += 1;
        }

        Ok((entry.key, entry.rid))
    }

    /// Entries from `start` up to (not including) `end`, in key order.
    pub fn scan(&mut self, start: Cursor, end: Cursor) -> IndexScan<'_, S> {
        IndexScan {
            index: self,
            cursor: start,
            end,
        }
    }

    /// Entries with `min <= key <= max`.
    ///
    /// The end position is `locate(max + 1)`, or end-of-index when `max`
    /// is `i32::MAX`.
    pub fn range(&mut self, min: Key, max: Key) -> Result<IndexScan<'_, S>> {
        if max < min {
            return Err(Error::InvalidKeyRange { min, max });
        }
        let start = self.locate(min)?.cursor();
        let end = match max.checked_add(1) {
            Some(bound) => self.locate(bound)?.cursor(),
            None => Cursor::END,
        };
        Ok(self.scan(start, end))
    }

    // ========================================================================
    // Structural checks
    // ========================================================================

    /// Walk the whole tree and verify its invariants.
    ///
    /// Checks that every leaf sits at depth `height`, keys are sorted within
    /// nodes and respect the separators above them, node sizes respect the
    /// branching factor, and the leaf chain visits leaves left to right.
    ///
    /// # Errors
    /// `Error::CorruptedPage` naming the first offending page.
    pub fn validate(&mut self) -> Result<TreeStats> {
        let mut stats = TreeStats {
            height: self.height,
            ..TreeStats::default()
        };
        if !self.root.is_valid() {
            return Ok(stats);
        }

        let mut leaves = Vec::new();
        self.validate_node(self.root, 1, None, None, &mut stats, &mut leaves)?;

        let mut last_key: Option<Key> = None;
        for (i, &(page_id, first, last)) in leaves.iter().enumerate() {
            let leaf = LeafNode::read(&mut self.store, page_id)?;
            let expected_next = leaves.get(i + 1).map_or(PageId::INVALID, |l| l.0);
            if leaf.next_leaf() != expected_next {
                return Err(Error::corrupted(
                    page_id.0,
                    format!("next leaf {} but expected {}", leaf.next_leaf(), expected_next),
                ));
            }
            if matches!(last_key, Some(prev) if prev > first) {
                return Err(Error::corrupted(page_id.0, "leaf chain out of order"));
            }
            last_key = Some(last);
        }

        Ok(stats)
    }

    fn validate_node(
        &mut self,
        page_id: PageId,
        level: u32,
        lower: Option<Key>,
        upper: Option<Key>,
        stats: &mut TreeStats,
        leaves: &mut Vec<(PageId, Key, Key)>,
    ) -> Result<()> {
        let in_bounds = |k: Key| lower.map_or(true, |lo| lo <= k) && upper.map_or(true, |hi| k <= hi);

        if level == self.height {
            let leaf = LeafNode::read(&mut self.store, page_id)?;
            let keys: Vec<Key> = leaf.entries().iter().map(|e| e.key).collect();
            let (Some(&first), Some(&last)) = (keys.first(), keys.last()) else {
                return Err(Error::corrupted(page_id.0, "empty leaf"));
            };
            if keys.len() > self.branching_factor {
                return Err(Error::corrupted(page_id.0, "leaf exceeds branching factor"));
            }
            if keys.windows(2).any(|w| w[0] > w[1]) || !keys.iter().all(|&k| in_bounds(k)) {
                return Err(Error::corrupted(page_id.0, "leaf keys out of order or bounds"));
            }
            stats.leaf_nodes += 1;
            stats.entries += keys.len();
            leaves.push((page_id, first, last));
            return Ok(());
        }

        let node = InternalNode::read(&mut self.store, page_id)?;
        let keys = node.keys();
        if keys.len() > self.branching_factor {
            return Err(Error::corrupted(page_id.0, "internal node exceeds branching factor"));
        }
        if keys.windows(2).any(|w| w[0] > w[1]) || !keys.iter().all(|&k| in_bounds(k)) {
            return Err(Error::corrupted(page_id.0, "separators out of order or bounds"));
        }
        stats.internal_nodes += 1;

        let children = node.children().to_vec();
        let keys = keys.to_vec();
        for (i, child) in children.into_iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(keys[i - 1]) };
            let child_upper = if i == keys.len() { upper } else { Some(keys[i]) };
            self.validate_node(child, level + 1, child_lower, child_upper, stats, leaves)?;
        }
        Ok(())
    }
}

impl<S: PageStore> Drop for BTreeIndex<S> {
    fn drop(&mut self) {
        if self.writable && self.metadata_dirty {
            if let Err(e) = self.persist_metadata() {
                warn!(error = %e, "failed to persist index metadata on drop");
            }
        }
    }
}

/// Forward iterator returned by [`BTreeIndex::scan`] and [`BTreeIndex::range`].
///
/// Stops at the end cursor or end-of-index. After an error it yields `None`.
pub struct IndexScan<'a, S: PageStore> {
    index: &'a mut BTreeIndex<S>,
    cursor: Cursor,
    end: Cursor,
}

impl<S: PageStore> IndexScan<'_, S> {
    /// Position of the next entry to be yielded.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl<S: PageStore> Iterator for IndexScan<'_, S> {
    type Item = Result<(Key, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == self.end || self.cursor.is_end() {
            return None;
        }
        let item = self.index.read_forward(&mut self.cursor);
        if item.is_err() {
            self.cursor = self.end;
        }
        Some(item)
    }
}
