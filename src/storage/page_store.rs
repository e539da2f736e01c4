//! The page store contract consumed by the index and the record heap.

use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// How a file-backed store is opened.
///
/// `Write` creates the file when it does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, reads only.
    Read,
    /// Read and write, creating the file if needed.
    Write,
}

impl OpenMode {
    /// Whether mutations are permitted.
    #[inline]
    pub fn is_writable(self) -> bool {
        matches!(self, OpenMode::Write)
    }
}

/// Fixed-size block storage addressed by a monotonically increasing [`PageId`].
///
/// Implementations are **single-threaded**: every method takes `&mut self`
/// and callers that share a store across threads must serialize access
/// themselves (see [`SharedIndex`](crate::index::btree::SharedIndex)).
pub trait PageStore {
    /// Read page `page_id`.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page has not been allocated.
    fn read_page(&mut self, page_id: PageId) -> Result<Page>;

    /// Overwrite page `page_id`, which must already be allocated.
    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()>;

    /// Append a zeroed page and return its id (always `page_count()` before the call).
    fn allocate_page(&mut self) -> Result<PageId>;

    /// One past the last allocated page id.
    fn page_count(&self) -> u32;

    /// Make all previous writes durable.
    fn sync(&mut self) -> Result<()>;
}
