//! Index metadata persisted in page 0.

use crate::common::config::{MAX_BRANCHING_FACTOR, MIN_BRANCHING_FACTOR, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Root pointer, height and fan-out bound of a B+tree.
///
/// # Layout (page 0)
/// ```text
/// Offset        Size  Field
/// ------        ----  -----
/// 0             4     root_pid (i32, -1 when empty)
/// 4             4     tree_height (i32)
/// 8             4     branching_factor (i32)
/// PAGE_SIZE-4   4     CRC32 of bytes 0..12
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMetadata {
    /// Root page, `PageId::INVALID` for an empty tree.
    pub root: PageId,
    /// Number of levels, leaf level included; 0 for an empty tree.
    pub height: u32,
    /// Maximum entries per leaf and keys per internal node.
    pub branching_factor: usize,
}

impl IndexMetadata {
    /// Page holding the metadata.
    pub const PAGE_ID: PageId = PageId(0);

    const OFFSET_ROOT: usize = 0;
    const OFFSET_HEIGHT: usize = 4;
    const OFFSET_BRANCHING_FACTOR: usize = 8;
    const FIELDS_END: usize = 12;
    const OFFSET_CHECKSUM: usize = PAGE_SIZE - 4;

    /// Metadata of an empty tree.
    pub fn empty(branching_factor: usize) -> Self {
        Self {
            root: PageId::INVALID,
            height: 0,
            branching_factor,
        }
    }

    /// Check that `branching_factor` fits the page layout.
    pub fn check_branching_factor(branching_factor: usize) -> Result<()> {
        if (MIN_BRANCHING_FACTOR..=MAX_BRANCHING_FACTOR).contains(&branching_factor) {
            Ok(())
        } else {
            Err(Error::InvalidBranchingFactor {
                requested: branching_factor,
                min: MIN_BRANCHING_FACTOR,
                max: MAX_BRANCHING_FACTOR,
            })
        }
    }

    /// Decode and validate the metadata page.
    ///
    /// # Errors
    /// `Error::CorruptedPage` on a checksum mismatch or inconsistent fields.
    pub fn from_page(page: &Page) -> Result<Self> {
        let stored = page.read_u32(Self::OFFSET_CHECKSUM);
        if stored != Self::checksum(page) {
            return Err(Error::corrupted(Self::PAGE_ID.0, "metadata checksum mismatch"));
        }

        let root = PageId::from_signed(page.read_i32(Self::OFFSET_ROOT));
        let height = page.read_i32(Self::OFFSET_HEIGHT);
        let branching_factor = page.read_i32(Self::OFFSET_BRANCHING_FACTOR);

        if height < 0 || root.is_valid() != (height > 0) {
            return Err(Error::corrupted(
                Self::PAGE_ID.0,
                format!("root {root} inconsistent with height {height}"),
            ));
        }
        let branching_factor = usize::try_from(branching_factor).map_err(|_| {
            Error::corrupted(Self::PAGE_ID.0, "negative branching factor")
        })?;
        Self::check_branching_factor(branching_factor)?;

        Ok(Self {
            root,
            height: height as u32,
            branching_factor,
        })
    }

    /// Encode into a fresh page.
    pub fn to_page(&self) -> Page {
        let mut page = Page::new();
        page.write_i32(Self::OFFSET_ROOT, self.root.to_signed());
        page.write_i32(Self::OFFSET_HEIGHT, self.height as i32);
        page.write_i32(Self::OFFSET_BRANCHING_FACTOR, self.branching_factor as i32);
        let checksum = Self::checksum(&page);
        page.write_u32(Self::OFFSET_CHECKSUM, checksum);
        page
    }

    fn checksum(page: &Page) -> u32 {
        crc32fast::hash(&page.as_slice()[..Self::FIELDS_END])
    }
}
