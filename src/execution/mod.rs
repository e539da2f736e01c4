//! Query front end: predicates, key-range planning, load and select.
//!
//! - [`Condition`] - a predicate on the key or value column
//! - [`KeyRange`] - key predicates folded into one inclusive interval
//! - [`QueryEngine`] - bulk load and select over record heaps and indexes

mod condition;
mod engine;
mod key_range;

pub use condition::{Comparator, Condition};
pub use engine::{parse_load_line, Projection, QueryEngine, QueryOutcome, Row};
pub use key_range::KeyRange;
