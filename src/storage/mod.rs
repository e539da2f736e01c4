//! Storage layer - disk I/O, page formats and the record heap.
//!
//! - [`PageStore`] - Page-granular storage contract
//! - [`DiskManager`] - File-backed [`PageStore`]
//! - [`RecordFile`] - Append-only heap of `(key, value)` tuples
//! - [`page`] - Page buffer and heap page header

mod disk_manager;
pub mod page;
mod page_store;
mod record_file;

pub use disk_manager::DiskManager;
pub use page_store::{OpenMode, PageStore};
pub use record_file::{RecordFile, RecordScan, Tuple};
