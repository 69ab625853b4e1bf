//! Integration tests for the engine layer.
//!
//! These cover the classic embedded-store session: open, write, read back,
//! snapshot to a file, and reload in a fresh "session".

use std::fs::File;

use branchdb::engine::KvStore;
use branchdb::index::SharedBPlusTree;
use tempfile::tempdir;

/// The canonical demo flow: one record in, same record out.
#[test]
fn test_put_one_record_and_read_it_back() {
    let mut store = KvStore::new();

    store.put("JimZuoLin", "Hello Jim!");
    assert_eq!(store.get("JimZuoLin"), Some(&b"Hello Jim!"[..]));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_snapshot_and_reload_across_sessions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.snap");

    // First session: populate and snapshot.
    {
        let mut store = KvStore::new();
        for i in 0..500u32 {
            store.put(format!("key{:04}", i), format!("value{}", i));
        }
        store.delete("key0123");

        let mut file = File::create(&path).unwrap();
        store.snapshot_to(&mut file).unwrap();
    }

    // Second session: reload and verify.
    {
        let mut file = File::open(&path).unwrap();
        let store = KvStore::load_from(&mut file).unwrap();

        assert_eq!(store.len(), 499);
        assert_eq!(store.get("key0007"), Some(&b"value7"[..]));
        assert_eq!(store.get("key0123"), None);

        // The snapshot traversal preserved global key order.
        let keys: Vec<Vec<u8>> = store.scan(..).map(|(k, _)| k.clone()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}

#[test]
fn test_tampered_snapshot_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.snap");

    {
        let mut store = KvStore::new();
        store.put("a", "1");
        let mut file = File::create(&path).unwrap();
        store.snapshot_to(&mut file).unwrap();
    }

    // Flip one byte in the middle of the file.
    let mut raw = std::fs::read(&path).unwrap();
    let mid = raw.len() / 2;
    raw[mid] ^= 0x01;
    std::fs::write(&path, &raw).unwrap();

    let mut file = File::open(&path).unwrap();
    assert!(KvStore::load_from(&mut file).is_err());
}

#[test]
fn test_scan_subrange() {
    let mut store = KvStore::new();
    for key in ["ant", "bee", "cat", "dog", "eel"] {
        store.put(key, "x");
    }

    let keys: Vec<Vec<u8>> = store
        .scan(b"bee".to_vec()..b"dog".to_vec())
        .map(|(k, _)| k.clone())
        .collect();
    assert_eq!(keys, vec![b"bee".to_vec(), b"cat".to_vec()]);
}

/// Cross-thread use of the shared tree from the public API.
#[test]
fn test_shared_tree_concurrent_sessions() {
    use std::thread;

    let tree: SharedBPlusTree<u64, u64> = SharedBPlusTree::new(16).unwrap();

    let mut handles = vec![];
    for t in 0..4u64 {
        let handle = tree.clone();
        handles.push(thread::spawn(move || {
            for i in 0..250u64 {
                handle.insert(t * 1000 + i, i);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(tree.len(), 1000);
    tree.check_invariants().unwrap();

    // A fresh cursor after the writes sees a consistent ordered view.
    let all = tree.range(..).collect_remaining().unwrap();
    assert_eq!(all.len(), 1000);
    assert!(all.windows(2).all(|w| w[0].0 < w[1].0));
}
