use as_siblings::{SiblingGraphBuilder, SiblingGraphStore, SnapshotId};

fn main() -> as_siblings::Result<()> {
    let store = SiblingGraphStore::new();

    // Two versions of the mapping: AS 3 moves from OrgB to OrgA
    let january = SnapshotId::from("20240101");
    let april = SnapshotId::from("20240401");
    store.put(
        january.clone(),
        SiblingGraphBuilder::build(vec![(1, "OrgA"), (2, "OrgA"), (3, "OrgB")])?,
    )?;
    store.put(
        april.clone(),
        SiblingGraphBuilder::build(vec![(1, "OrgA"), (2, "OrgA"), (3, "OrgA")])?,
    )?;

    for snapshot in store.snapshot_ids() {
        let stats = store.stats(&snapshot)?;
        println!("{}: {} ASes, {} sibling edges", snapshot, stats.nodes, stats.edges);
        println!("  siblings of AS1: {:?}", store.siblings_of(&snapshot, 1)?);
    }

    let diff = store.diff(&january, &april)?;
    for edge in &diff.added {
        println!("+ {}", edge);
    }
    for edge in &diff.removed {
        println!("- {}", edge);
    }
    Ok(())
}
