//! Disk-resident B+tree secondary index.
//!
//! Maps `i32` keys to [`RecordId`](crate::common::RecordId)s in a record
//! heap. One tree node occupies one page; page 0 of the index file holds
//! [`IndexMetadata`].
//!
//! - [`LeafNode`] - sorted `(key, rid)` entries plus a next-leaf link
//! - [`InternalNode`] - separator keys and child pointers
//! - [`BTreeIndex`] - open/close, insert, locate, forward scans
//! - [`Cursor`] - a position in the leaf chain
//! - [`SharedIndex`] - mutex-guarded handle for multi-threaded callers

mod btree_index;
mod cursor;
mod internal_node;
mod leaf_node;
mod metadata;
mod shared;

pub use btree_index::{BTreeIndex, IndexOptions, IndexScan, TreeStats};
pub use cursor::{Cursor, LocateResult};
pub use internal_node::InternalNode;
pub use leaf_node::{LeafEntry, LeafNode};
pub use metadata::IndexMetadata;
pub use shared::SharedIndex;
