use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use as_siblings::{Error, SiblingEdge, SiblingGraphBuilder, SiblingGraphStore, SnapshotId};

/// Store holding the January/April example snapshots
fn create_test_store() -> (SiblingGraphStore, SnapshotId, SnapshotId) {
    let store = SiblingGraphStore::new();
    let january = SnapshotId::from("20240101");
    let april = SnapshotId::from("20240401");

    store
        .put(
            january.clone(),
            SiblingGraphBuilder::build(vec![(1, "OrgA"), (2, "OrgA"), (3, "OrgB")]).unwrap(),
        )
        .unwrap();
    // AS 3 moves from OrgB to OrgA
    store
        .put(
            april.clone(),
            SiblingGraphBuilder::build(vec![(1, "OrgA"), (2, "OrgA"), (3, "OrgA")]).unwrap(),
        )
        .unwrap();

    (store, january, april)
}

fn edges(pairs: &[(u32, u32)]) -> BTreeSet<SiblingEdge> {
    pairs
        .iter()
        .filter_map(|&(a, b)| SiblingEdge::new(a, b))
        .collect()
}

#[test]
fn test_siblings_of() {
    let (store, january, _) = create_test_store();

    assert_eq!(store.siblings_of(&january, 1).unwrap(), BTreeSet::from([2]));
    assert_eq!(store.siblings_of(&january, 3).unwrap(), BTreeSet::new());
    // Unknown ASN is an empty set, not an error
    assert_eq!(store.siblings_of(&january, 64512).unwrap(), BTreeSet::new());
}

#[test]
fn test_siblings_of_is_idempotent() {
    let (store, _, april) = create_test_store();

    let first = store.siblings_of(&april, 3).unwrap();
    let second = store.siblings_of(&april, 3).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, BTreeSet::from([1, 2]));
}

#[test]
fn test_are_siblings_is_symmetric() {
    let (store, january, april) = create_test_store();

    for snapshot in [&january, &april] {
        for a in 0..5 {
            for b in 0..5 {
                assert_eq!(
                    store.are_siblings(snapshot, a, b).unwrap(),
                    store.are_siblings(snapshot, b, a).unwrap()
                );
            }
        }
    }
    assert!(store.are_siblings(&january, 1, 2).unwrap());
    assert!(!store.are_siblings(&january, 1, 3).unwrap());
}

#[test]
fn test_duplicate_snapshot_is_rejected() {
    let (store, january, _) = create_test_store();

    let err = store
        .put(january.clone(), SiblingGraphBuilder::build(vec![(9, "Z")]).unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateSnapshot(ref id) if *id == january));

    // Original snapshot is untouched
    assert_eq!(store.siblings_of(&january, 1).unwrap(), BTreeSet::from([2]));
    assert!(store.get(&january).unwrap().get(&9).is_none());
}

#[test]
fn test_unknown_snapshot() {
    let (store, january, _) = create_test_store();
    let missing = SnapshotId::from("19990101");

    assert!(matches!(
        store.siblings_of(&missing, 1),
        Err(Error::UnknownSnapshot(ref id)) if *id == missing
    ));
    assert!(matches!(
        store.are_siblings(&missing, 1, 2),
        Err(Error::UnknownSnapshot(_))
    ));
    assert!(matches!(
        store.diff(&january, &missing),
        Err(Error::UnknownSnapshot(ref id)) if *id == missing
    ));
    assert!(matches!(
        store.diff(&missing, &january),
        Err(Error::UnknownSnapshot(ref id)) if *id == missing
    ));
}

#[test]
fn test_diff_reassignment() {
    let (store, january, april) = create_test_store();

    let diff = store.diff(&january, &april).unwrap();
    assert_eq!(diff.added, edges(&[(1, 3), (2, 3)]));
    assert!(diff.removed.is_empty());

    // Reverse direction swaps added and removed
    let reverse = store.diff(&april, &january).unwrap();
    assert_eq!(reverse.added, diff.removed);
    assert_eq!(reverse.removed, diff.added);
}

#[test]
fn test_diff_with_itself_is_empty() {
    let (store, january, april) = create_test_store();

    assert!(store.diff(&january, &january).unwrap().is_empty());
    assert!(store.diff(&april, &april).unwrap().is_empty());
}

#[test]
fn test_diff_split_organization() {
    let store = SiblingGraphStore::new();
    let old = SnapshotId::from("old");
    let new = SnapshotId::from("new");
    store
        .put(
            old.clone(),
            SiblingGraphBuilder::build(vec![(1, "A"), (2, "A"), (3, "A")]).unwrap(),
        )
        .unwrap();
    store
        .put(
            new.clone(),
            SiblingGraphBuilder::build(vec![(1, "A"), (2, "A"), (3, "C"), (4, "C")]).unwrap(),
        )
        .unwrap();

    let diff = store.diff(&old, &new).unwrap();
    assert_eq!(diff.added, edges(&[(3, 4)]));
    assert_eq!(diff.removed, edges(&[(1, 3), (2, 3)]));
}

#[test]
fn test_stats_and_listing() {
    let (store, january, april) = create_test_store();

    assert_eq!(store.snapshot_ids(), vec![january.clone(), april.clone()]);
    assert!(store.contains(&january));
    assert!(!store.is_empty());

    let stats = store.stats(&january).unwrap();
    assert_eq!(stats.nodes, 3);
    assert_eq!(stats.edges, 1);
    assert_eq!(stats.organizations, 2);
    assert_eq!(stats.sibling_organizations, 1);
    assert_eq!(stats.largest_organization, Some(("OrgA".to_string(), 2)));

    assert_eq!(store.members(&april, "OrgA").unwrap(), BTreeSet::from([1, 2, 3]));
    assert_eq!(store.members(&april, "OrgB").unwrap(), BTreeSet::new());
    assert_eq!(
        store.organization_of(&january, 3).unwrap(),
        Some("OrgB".to_string())
    );
}

#[test]
fn test_concurrent_puts_store_each_id_once() {
    let store = Arc::new(SiblingGraphStore::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                // Every thread races on "shared" and owns one private id
                let shared = store.put(
                    SnapshotId::from("shared"),
                    SiblingGraphBuilder::build(vec![(i, "X")]).unwrap(),
                );
                let own = store.put(
                    SnapshotId::from(format!("own-{}", i)),
                    SiblingGraphBuilder::build(vec![(i, "X"), (i + 100, "X")]).unwrap(),
                );
                (shared.is_ok(), own.is_ok())
            })
        })
        .collect();

    let results: Vec<(bool, bool)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|(shared, _)| *shared).count(), 1);
    assert!(results.iter().all(|(_, own)| *own));
    assert_eq!(store.len(), 9);
}

#[test]
fn test_concurrent_reads() {
    let (store, january, april) = create_test_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let january = january.clone();
            let april = april.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    assert!(store.are_siblings(&april, 1, 3).unwrap());
                    assert_eq!(store.diff(&january, &april).unwrap().added.len(), 2);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
