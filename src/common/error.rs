//! Error types for pagetree.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagetree.
///
/// I/O failures are fatal to the operation that hit them and propagate
/// unchanged. `NodeFull` and `NoSuchRecord` are signals rather than faults:
/// the first triggers a split inside the index, the second reports a lookup
/// miss that still carries a usable scan position.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in the page store.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// A node has no room for another entry.
    ///
    /// Only surfaces from direct node inserts; the index turns it into a split.
    #[error("Node is full")]
    NodeFull,

    /// No entry or tuple matches the requested key or record id.
    #[error("No such record")]
    NoSuchRecord,

    /// Entry index outside a node's live range, or a cursor past the end.
    #[error("Invalid cursor")]
    InvalidCursor,

    /// Malformed bulk-load input.
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    /// Branching factor outside the range the page layout supports.
    #[error("Invalid branching factor {requested} (must be in {min}..={max})")]
    InvalidBranchingFactor {
        requested: usize,
        min: usize,
        max: usize,
    },

    /// Page contents violate the expected layout.
    #[error("Page {page_id} is corrupted: {reason}")]
    CorruptedPage { page_id: u32, reason: String },

    /// Stored checksum does not match the page contents.
    #[error("Checksum mismatch on page {0}")]
    ChecksumMismatch(u32),

    /// Mutation attempted on a file opened in read mode.
    #[error("File is opened read-only")]
    ReadOnly,

    /// Tuple value longer than a heap slot.
    #[error("Value of {len} bytes exceeds the {max} byte limit")]
    ValueTooLong { len: usize, max: usize },

    /// Key predicates describe an empty interval.
    #[error("Invalid key range [{min}, {max}]")]
    InvalidKeyRange { min: i32, max: i32 },
}

impl Error {
    /// Shorthand for building a [`Error::CorruptedPage`].
    pub(crate) fn corrupted(page_id: u32, reason: impl Into<String>) -> Self {
        Error::CorruptedPage {
            page_id,
            reason: reason.into(),
        }
    }
}
