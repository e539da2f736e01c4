//! pagetree - a disk-resident B+tree secondary index over a record heap.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            pagetree                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Query Layer (execution/)                    │   │
//! │  │     Condition → KeyRange → index scan | heap scan        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓                             ↓                 │
//! │  ┌──────────────────────────────┐  ┌────────────────────────┐  │
//! │  │     Index Layer (index/)     │  │  Record heap           │  │
//! │  │  BTreeIndex + Leaf/Internal  │  │  (storage/RecordFile)  │  │
//! │  │  nodes + Cursor              │  │  key | value tuples    │  │
//! │  └──────────────────────────────┘  └────────────────────────┘  │
//! │                 ↓                             ↓                 │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │        PageStore trait + DiskManager + Page              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Index leaves hold `(key, RecordId)` pairs; a [`RecordId`] addresses a
//! tuple in the heap file of the same table.
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, Error, config)
//! - [`storage`] - Page stores, page formats and the record heap
//! - [`index`] - The B+tree index
//! - [`execution`] - Predicates, load and select
//!
//! # Quick Start
//! ```no_run
//! use pagetree::index::btree::BTreeIndex;
//! use pagetree::storage::{OpenMode, RecordFile};
//!
//! let mut heap = RecordFile::open("movie.tbl", OpenMode::Write).unwrap();
//! let mut index = BTreeIndex::open("movie.idx", OpenMode::Write).unwrap();
//!
//! let rid = heap.append(2244, "Die Hard").unwrap();
//! index.insert(2244, rid).unwrap();
//!
//! for entry in index.range(2000, 3000).unwrap() {
//!     let (key, rid) = entry.unwrap();
//!     println!("{key} -> {rid}");
//! }
//! ```

pub mod common;
pub mod execution;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, Key, PageId, RecordId, Result};

pub use execution::{Comparator, Condition, Projection, QueryEngine, QueryOutcome};
pub use index::btree::{BTreeIndex, Cursor, IndexOptions, LocateResult, SharedIndex};
pub use storage::page::Page;
pub use storage::{DiskManager, OpenMode, PageStore, RecordFile, Tuple};
