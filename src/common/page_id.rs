//! Page identifier type.

use std::fmt;

/// Identifies a fixed-size page in a page store.
///
/// Allocation is append-only, so ids grow monotonically. Page 0 of an index
/// file is reserved for the index metadata.
///
/// # Example
/// ```
/// use pagetree::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Marks the end of the leaf chain and an empty tree's root.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Signed on-disk form used by the metadata page (`-1` for INVALID).
    #[inline]
    pub fn to_signed(self) -> i32 {
        if self.is_valid() {
            self.0 as i32
        } else {
            -1
        }
    }

    /// Inverse of [`PageId::to_signed`]; any negative value maps to INVALID.
    #[inline]
    pub fn from_signed(raw: i32) -> Self {
        if raw < 0 {
            Self::INVALID
        } else {
            PageId(raw as u32)
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
        assert!(pid.is_valid());
    }

    #[test]
    fn test_page_id_invalid() {
        assert!(!PageId::INVALID.is_valid());
        assert_eq!(PageId::INVALID.0, u32::MAX);
    }

    #[test]
    fn test_page_id_signed_form() {
        assert_eq!(PageId::INVALID.to_signed(), -1);
        assert_eq!(PageId::new(7).to_signed(), 7);
        assert_eq!(PageId::from_signed(-1), PageId::INVALID);
        assert_eq!(PageId::from_signed(-42), PageId::INVALID);
        assert_eq!(PageId::from_signed(9), PageId::new(9));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
        assert_eq!(format!("{}", PageId::INVALID), "Page(INVALID)");
    }
}
