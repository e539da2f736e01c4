//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container with fixed-width field accessors
//! - [`HeapPageHeader`] - Metadata at the start of every record heap page

mod heap_header;
#[allow(clippy::module_inception)]
mod page;

pub use heap_header::HeapPageHeader;
pub use page::Page;
