//! Record identifier type.

use std::fmt;

use super::PageId;

/// Index key type. Keys are signed 32-bit integers.
pub type Key = i32;

/// Identifies a tuple in the record heap: a heap page plus a slot within it.
///
/// The index treats it as an opaque locator; ordering is by page, then slot,
/// which matches the heap's append order.
///
/// # Example
/// ```
/// use pagetree::{PageId, RecordId};
///
/// let rid = RecordId::new(PageId::new(3), 7);
/// assert!(RecordId::new(PageId::new(3), 8) > rid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Heap page holding the tuple.
    pub page_id: PageId,
    /// Slot within the page.
    pub slot: u32,
}

impl RecordId {
    /// Create a new RecordId.
    #[inline]
    pub fn new(page_id: PageId, slot: u32) -> Self {
        RecordId { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id.0, self.slot)
    }
}
