//! Configuration constants for pagetree.
//!
//! Node capacities are derived from the declared field sizes rather than
//! hardcoded offsets, so changing `PAGE_SIZE` or a field width keeps every
//! layout consistent.

/// Size of a page in bytes (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Width of a serialized `PageId`.
pub const PAGE_ID_SIZE: usize = 4;

/// Width of a serialized index key.
pub const KEY_SIZE: usize = 4;

/// Width of a serialized `RecordId` (page id + slot).
pub const RECORD_ID_SIZE: usize = PAGE_ID_SIZE + 4;

/// Width of the live-entry counter stored in the last bytes of a node page.
pub const COUNT_SIZE: usize = 4;

/// Bytes per leaf entry: record locator followed by the key.
pub const LEAF_ENTRY_SIZE: usize = RECORD_ID_SIZE + KEY_SIZE;

/// Largest `n` with `n * LEAF_ENTRY_SIZE + PAGE_ID_SIZE + COUNT_SIZE <= PAGE_SIZE`.
pub const LEAF_CAPACITY: usize = (PAGE_SIZE - PAGE_ID_SIZE - COUNT_SIZE) / LEAF_ENTRY_SIZE;

/// Largest key count `n` with `n` keys, `n + 1` child ids and the counter in one page.
pub const INTERNAL_CAPACITY: usize =
    (PAGE_SIZE - PAGE_ID_SIZE - COUNT_SIZE) / (KEY_SIZE + PAGE_ID_SIZE);

/// Smallest branching factor an index may be created with.
pub const MIN_BRANCHING_FACTOR: usize = 2;

/// Largest branching factor: a node must be able to hold one entry past the
/// bound while it is being split.
pub const MAX_BRANCHING_FACTOR: usize = if LEAF_CAPACITY < INTERNAL_CAPACITY {
    LEAF_CAPACITY - 1
} else {
    INTERNAL_CAPACITY - 1
};

/// Branching factor used when a new index is created without options.
pub const DEFAULT_BRANCHING_FACTOR: usize = MAX_BRANCHING_FACTOR;

/// Longest value a record heap tuple may carry.
pub const MAX_VALUE_LEN: usize = 100;
