//! Load and select over `<table>.tbl` heaps with optional `<table>.idx` indexes.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::common::{Error, Key, RecordId, Result};
use crate::index::btree::BTreeIndex;
use crate::storage::{OpenMode, RecordFile};

use super::condition::Condition;
use super::key_range::KeyRange;

/// Columns requested by a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Key,
    Value,
    /// Key and value.
    All,
    /// Number of matching tuples.
    Count,
}

impl Projection {
    fn needs_value(self) -> bool {
        matches!(self, Projection::Value | Projection::All)
    }
}

/// One projected result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Key(Key),
    Value(String),
    All(Key, String),
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Row::Key(key) => write!(f, "{key}"),
            Row::Value(value) => f.write_str(value),
            Row::All(key, value) => write!(f, "{key} '{value}'"),
        }
    }
}

/// Result of [`QueryEngine::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Count(usize),
    /// Nothing matched a non-count query.
    NoSuchRecord,
    /// The key predicates admit no key.
    InvalidKeyRange,
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Rows(rows) => {
                for row in rows {
                    writeln!(f, "{row}")?;
                }
                Ok(())
            }
            QueryOutcome::Count(n) => writeln!(f, "{n}"),
            QueryOutcome::NoSuchRecord => writeln!(f, "NO SUCH RECORD"),
            QueryOutcome::InvalidKeyRange => writeln!(f, "INVALID KEY RANGE"),
        }
    }
}

/// Accumulates matches for one select.
struct Collector {
    projection: Projection,
    rows: Vec<Row>,
    count: usize,
}

impl Collector {
    fn new(projection: Projection) -> Self {
        Self {
            projection,
            rows: Vec::new(),
            count: 0,
        }
    }

    fn push(&mut self, key: Key, value: String) {
        self.count += 1;
        match self.projection {
            Projection::Key => self.rows.push(Row::Key(key)),
            Projection::Value => self.rows.push(Row::Value(value)),
            Projection::All => self.rows.push(Row::All(key, value)),
            Projection::Count => {}
        }
    }

    fn finish(self) -> QueryOutcome {
        match self.projection {
            Projection::Count => QueryOutcome::Count(self.count),
            _ if self.rows.is_empty() => QueryOutcome::NoSuchRecord,
            _ => QueryOutcome::Rows(self.rows),
        }
    }
}

/// Split a bulk-load line into `(key, value)`.
///
/// The key is the integer before the first comma. The value is the rest of
/// the line with leading blanks skipped; a value opening with `'` or `"`
/// ends at the matching quote.
///
/// # Errors
/// `Error::InvalidFileFormat` when there is no comma or the key is not an
/// integer.
pub fn parse_load_line(line: &str) -> Result<(Key, String)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (key_part, rest) = line
        .split_once(',')
        .ok_or_else(|| Error::InvalidFileFormat(format!("missing comma in {line:?}")))?;

    let key_part = key_part.trim_matches([' ', '\t']);
    let key = key_part
        .parse::<Key>()
        .map_err(|e| Error::InvalidFileFormat(format!("bad key {key_part:?}: {e}")))?;

    let rest = rest.trim_start_matches([' ', '\t']);
    let value = match rest.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let body = &rest[1..];
            match body.find(quote) {
                Some(end) => &body[..end],
                None => body,
            }
        }
        _ => rest,
    };

    Ok((key, value.to_string()))
}

/// Runs loads and selects against tables stored in one directory.
///
/// Table `t` lives in `t.tbl`; its index, if any, in `t.idx`.
///
/// # Example
/// ```no_run
/// use pagetree::execution::{Comparator, Condition, Projection, QueryEngine};
///
/// let engine = QueryEngine::new("data");
/// engine.load("movie", "movie.del", true).unwrap();
///
/// let outcome = engine
///     .select(Projection::All, "movie", &[Condition::Key(Comparator::Lt, 100)])
///     .unwrap();
/// print!("{outcome}");
/// ```
#[derive(Debug, Clone)]
pub struct QueryEngine {
    dir: PathBuf,
}

impl QueryEngine {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.tbl"))
    }

    pub fn index_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.idx"))
    }

    /// Append every line of `load_file` to `table`, and to its index when
    /// `build_index` is set or the index file already exists. Blank lines
    /// are skipped.
    ///
    /// An existing index is always kept in step with the heap, since
    /// `select` trusts it to cover every tuple.
    ///
    /// Returns the number of tuples loaded.
    pub fn load<P: AsRef<Path>>(&self, table: &str, load_file: P, build_index: bool) -> Result<usize> {
        let reader = BufReader::new(File::open(load_file.as_ref())?);
        let mut heap = RecordFile::open(self.table_path(table), OpenMode::Write)?;
        let index_path = self.index_path(table);
        let indexed = build_index || index_path.exists();
        if indexed && !build_index {
            debug!(table, "index exists, maintaining it during load");
        }
        let mut index = if indexed {
            Some(BTreeIndex::open(index_path, OpenMode::Write)?)
        } else {
            None
        };

        let mut loaded = 0;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = parse_load_line(&line)?;
            let rid = heap.append(key, &value)?;
            if let Some(index) = index.as_mut() {
                index.insert(key, rid)?;
            }
            loaded += 1;
        }

        heap.close()?;
        if let Some(index) = index {
            index.close()?;
        }
        info!(table, loaded, indexed, "loaded table");
        Ok(loaded)
    }

    /// Evaluate `projection` over the tuples of `table` matching every
    /// condition.
    ///
    /// The index drives the scan when it exists and either a key predicate
    /// bounds the range or only keys are projected; otherwise the heap is
    /// scanned in full.
    pub fn select(&self, projection: Projection, table: &str, conditions: &[Condition]) -> Result<QueryOutcome> {
        let mut heap = RecordFile::open(self.table_path(table), OpenMode::Read)?;

        let range = match KeyRange::from_conditions(conditions) {
            Ok(range) => range,
            Err(Error::InvalidKeyRange { min, max }) => {
                debug!(table, min, max, "empty key range");
                return Ok(match projection {
                    Projection::Count => QueryOutcome::Count(0),
                    _ => QueryOutcome::InvalidKeyRange,
                });
            }
            Err(e) => return Err(e),
        };

        let index_path = self.index_path(table);
        let use_index =
            index_path.exists() && (range.is_some() || projection == Projection::Key);

        let mut collector = Collector::new(projection);
        if use_index {
            let mut index = BTreeIndex::open(&index_path, OpenMode::Read)?;
            let range = range.unwrap_or_default();
            debug!(table, min = range.min, max = range.max, "index scan");

            // Key predicates other than `<>` are enforced by the range.
            let residual: Vec<&Condition> = conditions.iter().filter(|c| !c.bounds_key()).collect();
            let needs_value = projection.needs_value() || residual.iter().any(|c| c.needs_value());

            for entry in index.range(range.min, range.max)? {
                let (key, rid) = entry?;
                let value = if needs_value {
                    Self::read_value(&mut heap, rid)?
                } else {
                    String::new()
                };
                if residual.iter().all(|c| c.matches(key, &value)) {
                    collector.push(key, value);
                }
            }
            index.close()?;
        } else {
            debug!(table, "heap scan");
            for tuple in heap.scan() {
                let (_, tuple) = tuple?;
                if conditions.iter().all(|c| c.matches(tuple.key, &tuple.value)) {
                    collector.push(tuple.key, tuple.value);
                }
            }
        }

        heap.close()?;
        Ok(collector.finish())
    }

    fn read_value(heap: &mut RecordFile, rid: RecordId) -> Result<String> {
        Ok(heap.read(rid)?.value)
    }
}
