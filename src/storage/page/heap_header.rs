//! Record heap page header.
//!
//! Every heap page starts with a [`HeapPageHeader`]:
//! - CRC32 checksum for integrity
//! - Number of occupied record slots
//!
//! Index node pages do not carry this header; their layout is fixed by the
//! node codecs in `index::btree`.

/// Metadata stored at the beginning of every record heap page.
///
/// # Layout (8 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     checksum (CRC32, little-endian)
/// 4       2     record_count (little-endian)
/// 6       2     reserved (zero)
/// ```
///
/// # Checksum
/// The checksum is computed over the entire page with the checksum field
/// itself set to zero. This allows verification without special handling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapPageHeader {
    /// CRC32 checksum of the page contents.
    pub checksum: u32,
    /// Number of occupied slots, packed from slot 0.
    pub record_count: u16,
}

impl HeapPageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 8;

    /// Offset of each field within the header.
    pub const OFFSET_CHECKSUM: usize = 0;
    pub const OFFSET_RECORD_COUNT: usize = 4;

    /// Create a header for a page holding `record_count` records.
    ///
    /// The checksum is filled in by `Page::update_checksum`.
    pub fn new(record_count: u16) -> Self {
        Self {
            checksum: 0,
            record_count,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < HeapPageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for HeapPageHeader");

        let checksum = u32::from_le_bytes([
            data[Self::OFFSET_CHECKSUM],
            data[Self::OFFSET_CHECKSUM + 1],
            data[Self::OFFSET_CHECKSUM + 2],
            data[Self::OFFSET_CHECKSUM + 3],
        ]);

        let record_count = u16::from_le_bytes([
            data[Self::OFFSET_RECORD_COUNT],
            data[Self::OFFSET_RECORD_COUNT + 1],
        ]);

        Self {
            checksum,
            record_count,
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < HeapPageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for HeapPageHeader");

        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_RECORD_COUNT..Self::OFFSET_RECORD_COUNT + 2]
            .copy_from_slice(&self.record_count.to_le_bytes());
        data[Self::OFFSET_RECORD_COUNT + 2..Self::SIZE].fill(0);
    }

    /// Compute CRC32 checksum of a page.
    ///
    /// The checksum field (bytes 0-3) is hashed as zeros so the checksum
    /// doesn't include itself.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// Verify that the stored checksum matches the computed checksum.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;

    #[test]
    fn test_header_new() {
        let header = HeapPageHeader::new(5);
        assert_eq!(header.checksum, 0);
        assert_eq!(header.record_count, 5);
    }

    #[test]
    fn test_header_roundtrip() {
        let original = HeapPageHeader {
            checksum: 0xDEADBEEF,
            record_count: 37,
        };

        let mut buffer = [0xFFu8; HeapPageHeader::SIZE];
        original.write_to(&mut buffer);

        assert_eq!(HeapPageHeader::from_bytes(&buffer), original);
        // reserved bytes are cleared
        assert_eq!(&buffer[6..8], &[0, 0]);
    }

    #[test]
    fn test_header_byte_layout() {
        let header = HeapPageHeader {
            checksum: 0x04030201,
            record_count: 0x0605,
        };

        let mut buffer = [0u8; HeapPageHeader::SIZE];
        header.write_to(&mut buffer);

        assert_eq!(&buffer[..6], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn test_checksum_changes_with_data() {
        let mut page1 = [0u8; PAGE_SIZE];
        let mut page2 = [0u8; PAGE_SIZE];

        page1[500] = 0xFF;
        page2[500] = 0xFE;

        assert_ne!(
            HeapPageHeader::compute_checksum(&page1),
            HeapPageHeader::compute_checksum(&page2)
        );
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let mut page_data = [0u8; PAGE_SIZE];
        page_data[100] = 0xAB;

        let checksum1 = HeapPageHeader::compute_checksum(&page_data);
        page_data[..4].fill(0xFF);
        let checksum2 = HeapPageHeader::compute_checksum(&page_data);

        assert_eq!(checksum1, checksum2);
    }

    #[test]
    fn test_checksum_verify() {
        let mut page_data = [0u8; PAGE_SIZE];
        page_data[100] = 0xAB;

        let header = HeapPageHeader {
            checksum: HeapPageHeader::compute_checksum(&page_data),
            record_count: 0,
        };
        assert!(header.verify_checksum(&page_data));

        page_data[100] = 0xFF;
        assert!(!header.verify_checksum(&page_data));
    }
}
