use std::collections::{BTreeMap, BTreeSet};

use import_id_set::{
    BigEndianIdCodec, EntryId, FlushMode, ImportBuffer, ImportIdSetConfig, IndexEntryLimit, MemoryPostingStore,
    PostingStore, StoredPosting, StoredPostingDecoder, UndefinedSize,
};
use rayon::prelude::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Info).try_init();
}

/// Index keys matched by one mock entry: an equality key on its department
/// and, for every tenth entry, a shared "manager" key.
fn keys_of(entry_id: EntryId) -> Vec<Vec<u8>> {
    let mut keys = vec![format!("ou=dept{}", entry_id % 5).into_bytes()];
    if entry_id % 10 == 0 {
        keys.push(b"title=manager".to_vec());
    }
    keys.push(b"objectclass=person".to_vec());
    keys
}

fn run_batch(config: ImportIdSetConfig, entry_ids: std::ops::Range<EntryId>, workers: u64) -> ImportBuffer {
    let buffers: Vec<ImportBuffer> = (0..workers)
        .into_par_iter()
        .map(|worker| {
            let mut buffer = ImportBuffer::new(config);
            for entry_id in entry_ids.clone().filter(|id| id % workers == worker) {
                for key in keys_of(entry_id) {
                    buffer.add(&key, entry_id);
                }
            }
            buffer
        })
        .collect();
    ImportBuffer::merge_partitions(buffers).expect("workers share one config").expect("at least one worker")
}

fn expected_ids(entry_ids: std::ops::Range<EntryId>) -> BTreeMap<Vec<u8>, BTreeSet<EntryId>> {
    let mut expected: BTreeMap<Vec<u8>, BTreeSet<EntryId>> = BTreeMap::new();
    for entry_id in entry_ids {
        for key in keys_of(entry_id) {
            expected.entry(key).or_default().insert(entry_id);
        }
    }
    expected
}

fn stored(store: &MemoryPostingStore, key: &[u8]) -> StoredPosting {
    let bytes = store.get(key).expect("store read").expect("key was flushed");
    BigEndianIdCodec.decode(&bytes).expect("valid posting")
}

#[test]
fn test_parallel_import_with_counted_limit() {
    init_logger();
    let config = ImportIdSetConfig::new(16, IndexEntryLimit::Limited(150), true).expect("valid config");
    let mut store = MemoryPostingStore::new();

    let mut first = run_batch(config, 0..500, 4);
    let flushed = first.flush(&mut store, &BigEndianIdCodec, FlushMode::Insert).expect("first flush");
    assert_eq!(flushed.keys_flushed, 7);
    assert_eq!(flushed.limit_exceeded_count, 0);

    let mut second = run_batch(config, 500..700, 3);
    second.flush(&mut store, &BigEndianIdCodec, FlushMode::Insert).expect("second flush");

    let expected = expected_ids(0..700);
    for (key, ids) in expected {
        let posting = stored(&store, &key);
        if ids.len() > 150 {
            assert!(!posting.is_defined(), "{:?} should be undefined", String::from_utf8_lossy(&key));
        } else {
            assert_eq!(posting, StoredPosting::Defined(ids.into_iter().collect()));
        }
    }
    // 500 ids in the first batch, 200 more in the second.
    assert_eq!(
        stored(&store, b"objectclass=person"),
        StoredPosting::Undefined(UndefinedSize::Counted(700))
    );
    // 50 + 20 manager entries stay under the limit.
    assert_eq!(stored(&store, b"title=manager"), StoredPosting::Defined((0..700).step_by(10).collect()));
}

#[test]
fn test_parallel_import_without_count_reports_exceeded_keys() {
    init_logger();
    let config = ImportIdSetConfig::new(0, IndexEntryLimit::Limited(120), false).expect("valid config");
    let mut store = MemoryPostingStore::new();

    let mut first = run_batch(config, 0..500, 4);
    let flushed = first.flush(&mut store, &BigEndianIdCodec, FlushMode::Insert).expect("first flush");
    // only objectclass=person (500 ids) is over 120; each department has 100.
    assert_eq!(flushed.limit_exceeded_count, 1);

    let mut second = run_batch(config, 500..600, 2);
    let flushed = second.flush(&mut store, &BigEndianIdCodec, FlushMode::Insert).expect("second flush");
    // the five departments now reach 120 each and still fit; person is already
    // undefined in storage and merged with a defined batch.
    assert_eq!(flushed.limit_exceeded_count, 1);
    assert_eq!(stored(&store, b"objectclass=person"), StoredPosting::Undefined(UndefinedSize::Unknown));
    assert!(stored(&store, b"ou=dept0").is_defined());
}

#[test]
fn test_delete_after_import() {
    init_logger();
    let config = ImportIdSetConfig::new(0, IndexEntryLimit::Unlimited, true).expect("valid config");
    let mut store = MemoryPostingStore::new();
    let mut inserts = run_batch(config, 0..100, 2);
    inserts.flush(&mut store, &BigEndianIdCodec, FlushMode::Insert).expect("insert flush");

    let mut deletes = ImportBuffer::new(config);
    deletes.add_all(b"title=manager", [0, 20, 40]);
    deletes.flush(&mut store, &BigEndianIdCodec, FlushMode::Delete).expect("delete flush");

    assert_eq!(
        stored(&store, b"title=manager"),
        StoredPosting::Defined(vec![10, 30, 50, 60, 70, 80, 90])
    );
    assert_eq!(
        stored(&store, b"objectclass=person"),
        StoredPosting::Defined((0..100).collect())
    );
}
