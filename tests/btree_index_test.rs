//! Integration tests for the B+tree index.
//!
//! These exercise the index through its public API against real files.

use pagetree::index::btree::{BTreeIndex, Cursor, IndexOptions, LeafNode, LocateResult};
use pagetree::storage::{DiskManager, OpenMode, PageStore};
use pagetree::{Error, Key, PageId, RecordId};
use proptest::prelude::*;
use tempfile::{tempdir, TempDir};

fn rid(page: u32, slot: u32) -> RecordId {
    RecordId::new(PageId::new(page), slot)
}

fn create_index(branching_factor: usize) -> (BTreeIndex, TempDir) {
    let dir = tempdir().unwrap();
    let index = BTreeIndex::open_with(
        dir.path().join("test.idx"),
        OpenMode::Write,
        IndexOptions { branching_factor },
    )
    .unwrap();
    (index, dir)
}

/// Read forward from `start` until `end`.
fn scan_keys(index: &mut BTreeIndex, start: Cursor, end: Cursor) -> Vec<Key> {
    let mut cursor = start;
    let mut keys = Vec::new();
    while cursor != end && !cursor.is_end() {
        keys.push(index.read_forward(&mut cursor).unwrap().0);
    }
    keys
}

#[test]
fn test_empty_index_then_first_insert() {
    let (mut index, _dir) = create_index(4);

    let result = index.locate(5).unwrap();
    assert!(!result.is_found());
    assert!(matches!(result.into_exact(), Err(Error::NoSuchRecord)));

    index.insert(5, rid(1, 0)).unwrap();
    let mut cursor = index.locate(5).unwrap().into_exact().unwrap();
    assert_eq!(index.read_forward(&mut cursor).unwrap(), (5, rid(1, 0)));
}

#[test]
fn test_forced_leaf_split() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("split.idx");
    let mut index = BTreeIndex::open_with(&path, OpenMode::Write, IndexOptions { branching_factor: 4 }).unwrap();
    for k in 1..=5 {
        index.insert(k, rid(0, k as u32)).unwrap();
    }
    assert_eq!(index.height(), 2);
    index.close().unwrap();

    // Inspect the leaves directly through the page store.
    let mut store = DiskManager::open_with_mode(&path, OpenMode::Read).unwrap();
    let original = LeafNode::read(&mut store, PageId::new(1)).unwrap();
    let sibling = LeafNode::read(&mut store, original.next_leaf()).unwrap();
    assert!((2..=3).contains(&original.len()));
    assert_eq!(original.len() + sibling.len(), 5);
    assert_eq!(sibling.next_leaf(), PageId::INVALID);
    drop(store);

    let mut index = BTreeIndex::open(&path, OpenMode::Read).unwrap();
    let start = index.locate(1).unwrap().into_exact().unwrap();
    assert_eq!(scan_keys(&mut index, start, Cursor::END), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_range_scan_between_located_cursors() {
    let (mut index, _dir) = create_index(4);
    for k in [10, 20, 30, 40] {
        index.insert(k, rid(0, k as u32)).unwrap();
    }

    let start = index.locate(15).unwrap().cursor();
    let end = index.locate(41).unwrap().cursor();
    assert_eq!(scan_keys(&mut index, start, end), vec![20, 30, 40]);
}

#[test]
fn test_miss_positions_at_next_key() {
    let (mut index, _dir) = create_index(4);
    index.insert(5, rid(0, 0)).unwrap();
    index.insert(10, rid(0, 1)).unwrap();

    let result = index.locate(7).unwrap();
    let LocateResult::Missing(cursor) = result else {
        panic!("expected a miss, got {result:?}");
    };
    assert_eq!(scan_keys(&mut index, cursor, Cursor::END), vec![10]);
}

#[test]
fn test_reload_preserves_metadata_and_results() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reload.idx");

    let (meta_before, keys_before, found_before) = {
        let mut index =
            BTreeIndex::open_with(&path, OpenMode::Write, IndexOptions { branching_factor: 5 }).unwrap();
        for k in (0..300).map(|i| (i * 37) % 300) {
            index.insert(k, rid(k as u32, 0)).unwrap();
        }
        let meta = index.metadata();
        let keys: Vec<Key> = index.range(Key::MIN, Key::MAX).unwrap().map(|r| r.unwrap().0).collect();
        let found = index.locate(123).unwrap();
        index.close().unwrap();
        (meta, keys, found)
    };

    let mut index = BTreeIndex::open(&path, OpenMode::Read).unwrap();
    assert_eq!(index.metadata(), meta_before);
    assert_eq!(index.branching_factor(), 5);
    assert_eq!(index.locate(123).unwrap(), found_before);
    let keys: Vec<Key> = index.range(Key::MIN, Key::MAX).unwrap().map(|r| r.unwrap().0).collect();
    assert_eq!(keys, keys_before);
    assert_eq!(keys, (0..300).collect::<Vec<_>>());
}

#[test]
fn test_reopen_for_write_continues_tree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("append.idx");

    {
        let mut index = BTreeIndex::open_with(&path, OpenMode::Write, IndexOptions { branching_factor: 4 }).unwrap();
        for k in 0..50 {
            index.insert(k * 2, rid(0, 0)).unwrap();
        }
        index.close().unwrap();
    }
    {
        // Options are ignored once the file exists.
        let mut index = BTreeIndex::open_with(&path, OpenMode::Write, IndexOptions { branching_factor: 100 }).unwrap();
        assert_eq!(index.branching_factor(), 4);
        for k in 0..50 {
            index.insert(k * 2 + 1, rid(0, 1)).unwrap();
        }
        index.close().unwrap();
    }

    let mut index = BTreeIndex::open(&path, OpenMode::Read).unwrap();
    let stats = index.validate().unwrap();
    assert_eq!(stats.entries, 100);
    let keys: Vec<Key> = index.range(0, 99).unwrap().map(|r| r.unwrap().0).collect();
    assert_eq!(keys, (0..100).collect::<Vec<_>>());
}

#[test]
fn test_corrupted_metadata_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.idx");
    {
        let mut index = BTreeIndex::open(&path, OpenMode::Write).unwrap();
        index.insert(1, rid(0, 0)).unwrap();
        index.close().unwrap();
    }
    {
        let mut store = DiskManager::open_with_mode(&path, OpenMode::Write).unwrap();
        let mut page = store.read_page(PageId::new(0)).unwrap();
        page.as_mut_slice()[4] ^= 0xFF;
        store.write_page(PageId::new(0), &page).unwrap();
        store.sync().unwrap();
    }

    assert!(matches!(
        BTreeIndex::open(&path, OpenMode::Read),
        Err(Error::CorruptedPage { page_id: 0, .. })
    ));
}

#[test]
fn test_duplicate_keys_within_one_leaf() {
    let (mut index, _dir) = create_index(16);
    for slot in 0..6 {
        index.insert(50, rid(3, slot)).unwrap();
    }
    index.insert(40, rid(0, 0)).unwrap();
    index.insert(60, rid(0, 0)).unwrap();

    let mut cursor = index.locate(50).unwrap().into_exact().unwrap();
    let mut slots = Vec::new();
    loop {
        let (key, rid) = index.read_forward(&mut cursor).unwrap();
        if key != 50 {
            break;
        }
        slots.push(rid.slot);
    }
    assert_eq!(slots, vec![0, 1, 2, 3, 4, 5]);
}

/// Copies of one key split across leaves are all reachable from `locate`.
#[test]
fn test_duplicate_keys_across_leaf_split() {
    let (mut index, _dir) = create_index(4);
    for slot in 0..5 {
        index.insert(7, rid(3, slot)).unwrap();
    }
    assert_eq!(index.height(), 2);

    let slots: Vec<u32> = index.range(7, 7).unwrap().map(|r| r.unwrap().1.slot).collect();
    assert_eq!(slots, vec![0, 1, 2, 3, 4]);
    assert_eq!(index.range(6, 7).unwrap().count(), 5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_range_counts_every_duplicate(
        keys in proptest::collection::vec(0i32..12, 1..300),
        branching_factor in 2usize..8,
        search_key in 0i32..12,
    ) {
        let (mut index, _dir) = create_index(branching_factor);
        for (i, &k) in keys.iter().enumerate() {
            index.insert(k, rid(0, i as u32)).unwrap();
        }
        index.validate().unwrap();

        // equal keys come back in insertion order
        let slots: Vec<u32> = index
            .range(search_key, search_key)
            .unwrap()
            .map(|r| r.unwrap().1.slot)
            .collect();
        let expected: Vec<u32> = keys
            .iter()
            .enumerate()
            .filter(|(_, &k)| k == search_key)
            .map(|(i, _)| i as u32)
            .collect();
        prop_assert_eq!(slots, expected);
        prop_assert_eq!(index.locate(search_key).unwrap().is_found(), keys.contains(&search_key));
    }

    #[test]
    fn prop_scan_yields_sorted_multiset(
        keys in proptest::collection::vec(-1000i32..1000, 1..400),
        branching_factor in 3usize..12,
    ) {
        let (mut index, _dir) = create_index(branching_factor);
        for (i, &k) in keys.iter().enumerate() {
            index.insert(k, rid(0, i as u32)).unwrap();
        }

        let stats = index.validate().unwrap();
        prop_assert_eq!(stats.entries, keys.len());
        prop_assert_eq!(stats.height, index.height());

        let scanned: Vec<Key> = index
            .range(Key::MIN, Key::MAX)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        let mut expected = keys.clone();
        expected.sort_unstable();
        prop_assert_eq!(scanned, expected);
    }

    #[test]
    fn prop_locate_finds_every_distinct_key(
        keys in proptest::collection::btree_set(-5000i32..5000, 1..300),
        search_key in -5100i32..5100,
    ) {
        let (mut index, _dir) = create_index(4);
        for &k in &keys {
            index.insert(k, rid(k as u32, 0)).unwrap();
        }

        for &k in &keys {
            let mut cursor = index.locate(k).unwrap().into_exact().unwrap();
            prop_assert_eq!(index.read_forward(&mut cursor).unwrap(), (k, rid(k as u32, 0)));
        }

        // A miss lands on the smallest greater key.
        let result = index.locate(search_key).unwrap();
        prop_assert_eq!(result.is_found(), keys.contains(&search_key));
        let mut cursor = result.cursor();
        match keys.range(search_key..).next() {
            Some(&next) => prop_assert_eq!(index.read_forward(&mut cursor).unwrap().0, next),
            None => prop_assert!(cursor.is_end()),
        }
    }
}
