//! Scan positions within the leaf chain.

use crate::common::{Error, PageId, Result};

/// A `(leaf page, entry index)` position.
///
/// A cursor never points one past a leaf's last entry: that position is
/// written as `(next_leaf, 0)`. A cursor on `PageId::INVALID` is the end of
/// the index. Cursors are only meaningful until the next insert, which may
/// move entries between leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub page_id: PageId,
    pub entry: usize,
}

impl Cursor {
    /// Past the last entry of the index.
    pub const END: Cursor = Cursor {
        page_id: PageId::INVALID,
        entry: 0,
    };

    #[inline]
    pub fn new(page_id: PageId, entry: usize) -> Self {
        Cursor { page_id, entry }
    }

    /// Whether the cursor is past the last entry.
    #[inline]
    pub fn is_end(&self) -> bool {
        !self.page_id.is_valid()
    }
}

/// Outcome of [`BTreeIndex::locate`](super::BTreeIndex::locate).
///
/// Both variants carry the position of the first entry with key `>=` the
/// search key, so a miss is still a valid range-scan start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateResult {
    /// An entry with exactly the search key.
    Found(Cursor),
    /// No exact match.
    Missing(Cursor),
}

impl LocateResult {
    #[inline]
    pub fn cursor(&self) -> Cursor {
        match *self {
            LocateResult::Found(c) | LocateResult::Missing(c) => c,
        }
    }

    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, LocateResult::Found(_))
    }

    /// The cursor of an exact match, or `Error::NoSuchRecord`.
    pub fn into_exact(self) -> Result<Cursor> {
        match self {
            LocateResult::Found(c) => Ok(c),
            LocateResult::Missing(_) => Err(Error::NoSuchRecord),
        }
    }
}
